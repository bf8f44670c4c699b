use formrules::{field, FieldValues, FormSchema};
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Define the form
    let schema = FormSchema::builder()
        .field("hasOtherIncome", |f| f.required())
        .field("otherIncomeAmount", |f| {
            f.hidden_when(field("hasOtherIncome").eq(false))
                .required_when("hasOtherIncome == true")
        })
        .field("maritalStatus", |f| f.required())
        .field("spouseName", |f| {
            f.hidden_when("maritalStatus not in ['married', 'partnered']")
                .required_when("maritalStatus in ['married', 'partnered']")
        })
        .compile()
        .expect("failed to compile schema");

    println!("{schema}");

    // Evaluate against two snapshots
    for values in [
        FieldValues::new()
            .set("hasOtherIncome", false)
            .set("maritalStatus", "single"),
        FieldValues::new()
            .set("hasOtherIncome", true)
            .set("maritalStatus", "married"),
    ] {
        let states = schema.evaluate(&values);
        println!("{states}");
        println!(
            "  all required: {:?}",
            states.merged_required(schema.base_required())
        );
    }
}
