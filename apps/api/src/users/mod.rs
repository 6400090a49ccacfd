// Profile and onboarding.

pub mod handlers;
pub mod profile;
