use formrules::{FieldValues, FormSchema};
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let schema = FormSchema::builder()
        .field("hours", |f| f)
        .field("people", |f| f)
        .field("rate", |f| f)
        .calculated("hoursPerPerson", ["hours", "people"], "hours / people")
        .calculated("cost", ["hours", "rate"], "hours * rate")
        .calculated("costPerPerson", ["cost", "people"], "cost / people")
        .compile()
        .expect("failed to compile schema");

    // `people` is zero, so the per-person formulas fail and are skipped.
    let values = FieldValues::new()
        .set("hours", 40_i64)
        .set("people", 0_i64)
        .set("rate", 85.5_f64);

    let report = schema.recomputer().recompute_detailed(&values);

    println!("{report}");
    println!();
    println!("Evaluation order: {:?}", report.evaluated());
    for failure in report.failures() {
        println!("Skipped: {failure}");
    }
    println!("Clean: {}", report.is_clean());
    println!("Duration: {:?}", report.duration());
}
