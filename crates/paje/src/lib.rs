pub mod document;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod presenter;
pub mod prompt_template;
pub mod providers;
pub mod systems;
