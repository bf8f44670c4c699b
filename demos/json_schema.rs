use formrules::{CompiledSchema, FieldValues};
use tracing_subscriber::prelude::*;

const SCHEMA: &str = r#"{
    "fields": [
        {"path": "country", "required": true},
        {"path": "state",
         "hiddenWhen": {"field": "country", "operator": "notIn", "value": ["US", "AU"]},
         "requiredWhen": "country in ['US', 'AU']"},
        {"path": "quantity"},
        {"path": "pricePerUnit"},
        {"path": "totalPrice", "readOnlyWhen": "quantity is not empty"}
    ],
    "calculated": [
        {"target": "totalPrice",
         "dependsOn": ["quantity", "pricePerUnit"],
         "formula": "quantity * pricePerUnit"}
    ]
}"#;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let schema = match std::env::args().nth(1) {
        Some(path) => CompiledSchema::from_file(&path),
        None => CompiledSchema::from_json(SCHEMA),
    }
    .expect("failed to load schema");

    for warning in schema.warnings() {
        tracing::warn!(%warning, "schema warning");
    }

    let values = FieldValues::new()
        .set("country", "NZ")
        .set("quantity", 2_i64)
        .set("pricePerUnit", 12.5_f64);

    let states = schema.evaluate(&values);
    println!(
        "{}",
        serde_json::to_string_pretty(&states).expect("field states serialize")
    );

    for write in schema.recomputer().on_change(["quantity"], &values) {
        println!("{write}");
    }
}
