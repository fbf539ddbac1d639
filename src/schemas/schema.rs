use schemars::JsonSchema;
use serde_json::Value;
use std::sync::Arc;

/// Cached JSON schema handle for a documented response shape.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    pub fn for_type<T: JsonSchema + 'static>(schema_name: &'static str) -> Self {
        let root = schemars::schema_for!(T);
        let schema_json = serde_json::to_value(root).unwrap_or_default();

        Self {
            schema_name,
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }

    /// Compact single-line rendering suitable for embedding in a prompt
    pub fn to_prompt_string(&self) -> String {
        self.schema_json.to_string()
    }
}

/// Types that document a shape providers are asked to produce
pub trait PromptSchema: JsonSchema + 'static {
    fn schema() -> &'static SchemaHandle;
}
