// Mock interviews: quiz generation, grading, explanations and assessment history.

pub mod assessments;
pub mod explain;
pub mod grading;
pub mod handlers;
pub mod prompts;
pub mod quiz;
