use std::sync::Arc;
use std::thread;

use formrules::{field, FieldValues, FormSchema};

fn main() {
    tracing_subscriber::fmt::init();

    let schema = Arc::new(
        FormSchema::builder()
            .field("user.age", |f| f.required())
            .field("guardianName", |f| {
                f.hidden_when(field("user.age").gte(18_i64))
                    .required_when("user.age < 18")
            })
            .field("tickets", |f| f)
            .calculated("price", ["user.age", "tickets"], "user.age < 18 ? tickets * 5 : tickets * 12")
            .compile()
            .expect("failed to compile schema"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let values = FieldValues::new()
                    .set("user.age", 16_i64 + i64::from(i))
                    .set("tickets", 2_i64);

                let states = schema.evaluate(&values);
                let writes = schema.recomputer().recompute(&values);
                println!("Thread {i}: {states}; {writes:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
