// AI cover letters: generation and owner-scoped CRUD.

pub mod handlers;
pub mod letters;
pub mod prompts;
