// Dashboard insights: per-industry snapshots, the global aggregate and
// the shared tech-stack listing. All AI calls go through llm_client.

pub mod aggregator;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod tech_stacks;
