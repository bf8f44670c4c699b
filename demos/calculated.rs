use formrules::{FieldValues, FormSchema};
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let schema = FormSchema::builder()
        .field("quantity", |f| f.required())
        .field("pricePerUnit", |f| f.required())
        .field("subtotal", |f| f.read_only_when("quantity is not empty"))
        .field("discount", |f| f)
        .field("total", |f| f)
        .calculated("total", ["subtotal", "discount"], "subtotal - discount")
        .calculated(
            "discount",
            ["subtotal"],
            "subtotal >= 1000 ? round(subtotal * 0.1 * 100) / 100 : 0",
        )
        .calculated("subtotal", ["quantity", "pricePerUnit"], "quantity * pricePerUnit")
        .compile()
        .expect("failed to compile schema");

    println!("Evaluation order: {:?}", schema.evaluation_order());
    println!("Watched paths: {:?}", schema.watched_paths());

    let recomputer = schema.recomputer();
    let mut values = FieldValues::new()
        .set("quantity", 3_i64)
        .set("pricePerUnit", 250_i64);

    // The host applies system writes without treating them as user edits.
    for (changed, quantity) in [("quantity", 3_i64), ("quantity", 5), ("notes", 5)] {
        values.insert("quantity", quantity.into());
        let writes = recomputer.on_change([changed], &values);
        println!("{changed} -> {quantity}: {} write(s)", writes.len());
        for write in &writes {
            println!("  {write}");
            values.apply(write);
        }
    }
}
