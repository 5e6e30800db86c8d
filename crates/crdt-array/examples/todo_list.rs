//! Example: Collaborative offline todo list kept in a replicated array.

use crdt_array::clock::ManualClock;
use crdt_array::prelude::*;

fn show(name: &str, doc: &Document<String>) {
    println!("{name}'s list:");
    for (i, task) in doc.to_vec("todo").iter().enumerate() {
        println!("  {}. {task}", i + 1);
    }
}

fn main() {
    println!("=== Collaborative Todo List (replicated array) ===\n");

    // Both replicas run on the same simulated clock.
    let clock = ManualClock::new(0);
    let mut alice: Document<String> = Document::builder("alice").clock(clock.clone()).build();
    let mut bob: Document<String> = Document::builder("bob").clock(clock.clone()).build();

    // Alice adds tasks while offline
    alice.insert("todo", 0, "Buy groceries".into());
    alice.insert("todo", 1, "Walk the dog".into());
    alice.insert("todo", 2, "Write report".into());
    show("Alice", &alice);

    // Bob adds tasks while offline
    bob.insert("todo", 0, "Fix bike".into());
    bob.insert("todo", 1, "Call mom".into());
    show("\nBob", &bob);

    // They sync up
    alice.sync(&mut bob);
    println!("\n--- After sync ---");
    show("Shared", &alice);

    // Alice completes the first task, Bob adds one at the top concurrently
    let done = alice.delete("todo", 0);
    println!(
        "\nAlice completed {:?}",
        done.as_ref().map(|item| item.content())
    );
    bob.insert("todo", 0, "Pay rent".into());

    alice.sync(&mut bob);
    println!("\n--- After second sync ---");
    show("Alice", &alice);
    show("Bob", &bob);

    // An hour later the tombstone of the completed task is collected.
    clock.advance(60 * 60 * 1000);
    let removed = alice.collect_garbage();
    let stats = alice.stats();
    println!(
        "\nGC removed {removed} tombstone(s); {} items in {} container(s)",
        stats.item_count, stats.container_count
    );

    println!("\nSnapshot: {}", alice.to_json().unwrap_or_default());
}
