mod document;
mod executor;
mod system;

pub use document::{DocumentSystem, SEARCH_TOOL_NAME};
pub use executor::{ToolExecutor, ToolResult};
pub use system::System;
