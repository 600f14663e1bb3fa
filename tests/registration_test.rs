use assert2::{check, let_assert};
use rstest::rstest;
use rustdoc_implementors::{
    Delivery, ImplementorMap, MergePolicy, RegisterImplementors, Registry, RegistryError,
    Snapshot, implementor_map,
};

/// Capability that records every mapping it receives.
#[derive(Debug, Default)]
struct CallLog {
    calls: Vec<ImplementorMap>,
}

impl RegisterImplementors for CallLog {
    fn register(&mut self, implementors: ImplementorMap) {
        self.calls.push(implementors);
    }
}

fn two_groups() -> ImplementorMap {
    implementor_map([("A", vec!["x"]), ("B", vec!["y", "z"])])
}

/// Test: Without a capability the mapping lands unchanged in the pending slot.
#[test]
fn mapping_waits_in_pending_slot_without_capability() {
    let mut registry: Registry<CallLog> = Registry::new();

    let delivery = registry.submit(two_groups());

    check!(delivery == Delivery::Deferred);
    check!(registry.pending() == [two_groups()]);
    check!(!registry.is_initialized());
}

/// Test: With a capability exactly one call happens and the pending slot stays empty.
#[test]
fn mapping_is_delivered_once_with_capability() {
    let mut registry = Registry::new();
    check!(registry.initialize(CallLog::default()) == Ok(0));

    let delivery = registry.submit(two_groups());

    check!(delivery == Delivery::Registered);
    check!(registry.pending().is_empty());
    let_assert!(Some(log) = registry.capability());
    check!(log.calls == [two_groups()]);
}

/// Test: Mappings submitted before and after initialization are each delivered exactly once.
#[test]
fn early_and_late_fragments_are_both_delivered() {
    let early = implementor_map([("early", vec!["e"])]);
    let late = implementor_map([("late", vec!["l"])]);

    let mut registry = Registry::new();
    registry.submit(early.clone());
    check!(registry.initialize(CallLog::default()) == Ok(1));
    registry.submit(late.clone());
    check!(registry.flush_pending() == 0);

    let (log, pending) = registry.into_parts();
    check!(pending.is_empty());
    check!(log.unwrap().calls == [early, late]);
}

/// Test: A second initialization is refused and keeps the first capability.
#[test]
fn second_initialization_is_refused() {
    let mut registry = Registry::new();
    registry.initialize(CallLog::default()).unwrap();
    registry.submit(two_groups());

    check!(registry.initialize(CallLog::default()) == Err(RegistryError::AlreadyInitialized));
    check!(registry.capability().unwrap().calls.len() == 1);
}

/// Test: The snapshot capability merges according to its policy.
#[rstest]
#[case(MergePolicy::Replace, vec!["y2", "y"])]
#[case(MergePolicy::Append, vec!["y", "z", "y2"])]
fn snapshot_merges_by_policy(#[case] policy: MergePolicy, #[case] expected_b: Vec<&str>) {
    let mut registry = Registry::new();
    registry.submit(two_groups());
    registry.submit(implementor_map([("B", vec!["y2", "y"])]));
    registry.initialize(Snapshot::new(policy)).unwrap();

    let snapshot = registry.capability().unwrap();
    let b: Vec<&str> = snapshot.get("B").unwrap().iter().map(String::as_str).collect();
    check!(b == expected_b);
    check!(snapshot.get("A") == Some(&["x".to_string()][..]));
}
