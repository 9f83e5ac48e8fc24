//! Synthetic task generation and trivial consumption.
//!
//! The orchestrator treats tasks as opaque identifiers; these helpers exist
//! so the CLI can exercise a full round without a real workload.

/// Generate `n` synthetic task identifiers (`task1` through `taskN`).
pub fn generate_tasks(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("task{}", i)).collect()
}

/// Print each claimed task followed by a completion marker.
pub fn consume_tasks(tasks: &[String]) {
    for task in tasks {
        println!("{}", task);
    }
    println!("done");
}
