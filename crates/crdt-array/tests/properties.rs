//! Property-based tests for replica convergence.
//!
//! Random edit histories are played against several documents; whatever the
//! interleaving of local edits and synchronization, a final round of syncs
//! must leave every replica identical.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crdt_array::clock::ManualClock;
use crdt_array::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert { replica: usize, index: usize, value: u8 },
    Delete { replica: usize, index: usize },
    Sync { left: usize, right: usize },
}

const REPLICAS: usize = 3;

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..REPLICAS, 0..8usize, any::<u8>())
            .prop_map(|(replica, index, value)| Op::Insert { replica, index, value }),
        2 => (0..REPLICAS, 0..8usize).prop_map(|(replica, index)| Op::Delete { replica, index }),
        1 => (0..REPLICAS, 0..REPLICAS).prop_map(|(left, right)| Op::Sync { left, right }),
    ]
}

fn replicas(clock: &ManualClock) -> Vec<Document<u8>> {
    (0..REPLICAS)
        .map(|i| Document::builder(format!("site-{i}")).clock(clock.clone()).build())
        .collect()
}

fn pair(docs: &mut [Document<u8>], left: usize, right: usize) -> (&mut Document<u8>, &mut Document<u8>) {
    if left < right {
        let (head, tail) = docs.split_at_mut(right);
        (&mut head[left], &mut tail[0])
    } else {
        let (head, tail) = docs.split_at_mut(left);
        (&mut tail[0], &mut head[right])
    }
}

fn play(docs: &mut [Document<u8>], ops: &[Op]) {
    for op in ops {
        match *op {
            Op::Insert { replica, index, value } => {
                docs[replica].insert("list", index, value);
            }
            Op::Delete { replica, index } => {
                docs[replica].delete("list", index);
            }
            Op::Sync { left, right } if left != right => {
                let (a, b) = pair(docs, left, right);
                a.sync(b);
            }
            Op::Sync { .. } => {}
        }
    }
}

fn sync_all(docs: &mut [Document<u8>]) {
    for (left, right) in [(0, 1), (1, 2), (0, 1)] {
        let (a, b) = pair(docs, left, right);
        a.sync(b);
    }
}

proptest! {
    /// Any history converges once every replica has synced.
    #[test]
    fn prop_replicas_converge(ops in prop::collection::vec(arb_op(), 0..40)) {
        let clock = ManualClock::new(0);
        let mut docs = replicas(&clock);
        play(&mut docs, &ops);
        sync_all(&mut docs);

        let expected = docs[0].to_vec("list");
        for doc in &docs[1..] {
            prop_assert_eq!(doc.to_vec("list"), expected.clone());
            prop_assert_eq!(doc.version(), docs[0].version());
        }
    }

    /// Visible length equals inserts minus effective deletes.
    #[test]
    fn prop_tombstones_are_preserved(ops in prop::collection::vec(arb_op(), 0..40)) {
        let clock = ManualClock::new(0);
        let mut docs = replicas(&clock);
        play(&mut docs, &ops);
        sync_all(&mut docs);

        let inserts = ops.iter().filter(|op| matches!(op, Op::Insert { .. })).count();
        let list = docs[0].container("list");
        let raw = list.map_or(0, Sequence::raw_len);
        let deleted = list.map_or(0, |l| l.items().filter(|i| i.is_deleted()).count());
        prop_assert_eq!(raw, inserts);
        prop_assert_eq!(docs[0].to_vec("list").len(), inserts - deleted);
    }

    /// Delivering every update twice is the same as delivering it once.
    #[test]
    fn prop_receive_is_idempotent(ops in prop::collection::vec(arb_op(), 0..30)) {
        let clock = ManualClock::new(0);
        let mut source: Document<u8> = Document::builder("src").clock(clock.clone()).build();
        let sent = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sent);
        source.observe(move |u: &Update<u8>| {
            if u.origin == "src" && u.kind != crdt_array::UpdateKind::Batch {
                sink.borrow_mut().push(u.clone());
            }
        });

        for op in &ops {
            match *op {
                Op::Insert { index, value, .. } => { source.insert("list", index, value); }
                Op::Delete { index, .. } => { source.delete("list", index); }
                Op::Sync { .. } => { source.flush(); }
            }
        }
        source.flush();

        let updates = sent.borrow().clone();
        let mut once: Document<u8> = Document::builder("once").clock(clock.clone()).build();
        let mut twice: Document<u8> = Document::builder("twice").clock(clock.clone()).build();
        for update in &updates {
            once.receive_update(update);
            twice.receive_update(update);
            twice.receive_update(update);
        }

        prop_assert_eq!(once.to_vec("list"), twice.to_vec("list"));
        prop_assert_eq!(once.version(), twice.version());
        prop_assert_eq!(once.to_vec("list"), source.to_vec("list"));
    }

    /// Whatever order updates arrive in, and whichever get lost, one sync
    /// with the source leaves the receiver holding exactly the source's items.
    #[test]
    fn prop_shuffled_delivery_then_sync(
        ops in prop::collection::vec(arb_op(), 0..30),
        keys in prop::collection::vec(any::<u32>(), 30),
        lost in prop::collection::vec(prop::bool::weighted(0.2), 30),
    ) {
        let clock = ManualClock::new(0);
        let mut source: Document<u8> = Document::builder("src").clock(clock.clone()).build();
        let sent = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&sent);
        source.observe(move |u: &Update<u8>| {
            if u.origin == "src" && u.kind != crdt_array::UpdateKind::Batch {
                sink.borrow_mut().push(u.clone());
            }
        });

        for op in &ops {
            match *op {
                Op::Insert { index, value, .. } => { source.insert("list", index, value); }
                Op::Delete { index, .. } => { source.delete("list", index); }
                Op::Sync { .. } => { source.flush(); }
            }
        }
        source.flush();

        let mut stream: Vec<(usize, Update<u8>)> = sent.borrow().iter().cloned().enumerate().collect();
        stream.sort_by_key(|(n, _)| keys[*n]);
        let mut receiver: Document<u8> = Document::builder("dst").clock(clock.clone()).build();
        for (n, update) in &stream {
            if !lost[*n] {
                receiver.receive_update(update);
            }
        }
        receiver.sync(&mut source);

        let ids = |doc: &Document<u8>| {
            doc.container("list")
                .map(|l| l.items().map(|i| i.id().clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        };
        prop_assert_eq!(ids(&receiver), ids(&source));
        prop_assert_eq!(receiver.to_vec("list"), source.to_vec("list"));
        prop_assert_eq!(receiver.version(), source.version());
    }

    /// Collection never changes what a document shows.
    #[test]
    fn prop_gc_preserves_visible_content(
        ops in prop::collection::vec(arb_op(), 0..40),
        elapsed in 0u64..10_000,
    ) {
        let clock = ManualClock::new(0);
        let mut docs = replicas(&clock);
        play(&mut docs, &ops);
        let before: Vec<_> = docs.iter().map(|d| d.to_vec("list")).collect();

        clock.advance(elapsed);
        for doc in &mut docs {
            doc.collect_garbage();
        }
        let after: Vec<_> = docs.iter().map(|d| d.to_vec("list")).collect();
        prop_assert_eq!(before, after);
    }

    /// Integration order does not affect the resulting sequence.
    #[test]
    fn prop_integrate_commutes(
        items in prop::collection::btree_map((0u8..4, 1u64..20), any::<u8>(), 0..24)
            .prop_map(|m| m.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
    ) {
        let build = |items: &[((u8, u64), u8)]| {
            let mut seq = Sequence::new();
            for ((site, counter), value) in items {
                seq.integrate(Item::new(Timestamp::new(format!("s{site}"), *counter), *value));
            }
            seq
        };
        let forward = build(&items);
        let mut reversed = items.clone();
        reversed.reverse();
        let backward = build(&reversed);

        prop_assert_eq!(forward.to_vec(), backward.to_vec());
        prop_assert!(forward == backward);
    }

    /// Version vector merge is commutative and idempotent.
    #[test]
    fn prop_version_merge_laws(
        a in prop::collection::btree_map("[a-d]", 1u64..50, 0..4),
        b in prop::collection::btree_map("[a-d]", 1u64..50, 0..4),
    ) {
        let a = VersionVector::from(a);
        let b = VersionVector::from(b);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        prop_assert_eq!(&ab, &ba);

        let mut again = ab.clone();
        again.merge(&ab);
        prop_assert_eq!(&again, &ab);

        prop_assert!(ab >= a);
        prop_assert!(ab >= b);
        let entries: BTreeMap<String, u64> = ab.into();
        prop_assert!(entries.values().all(|c| *c > 0));
    }
}
