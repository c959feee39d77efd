use crate::EngineConfig;

/// Generates a JSON Schema for the spacegrid configuration.
///
/// The schema includes all configuration options with their types,
/// descriptions, and default values.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(EngineConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert(
            "$id".to_string(),
            serde_json::json!(
                "https://raw.githubusercontent.com/spacegrid/spacegrid/main/spacegrid.schema.json"
            ),
        );
    }

    schema
}

/// Generates a JSON Schema string for the spacegrid configuration.
#[must_use]
pub fn generate_schema_json() -> String {
    let schema = generate_schema();
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Prints the configuration schema to stdout.
pub fn print_schema() {
    println!("{}", generate_schema_json());
}
