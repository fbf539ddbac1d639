pub mod schema;

pub use schema::{PromptSchema, SchemaHandle};
