//! Property-based tests for core naming and ordering rules.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;

use mfsim::core::files::{relocate_external, relocate_filename};
use mfsim::core::loader::order_records;
use mfsim::core::namefile::NameRecord;
use mfsim::core::registry::PathRegistry;
use mfsim::core::types::{Address, ContainerName, PackageType};

/// Strategy for package type tags.
fn package_tag() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "dis", "disv", "disu", "ic", "npf", "wel", "chd", "rch", "oc", "obs",
    ])
    .prop_map(str::to_string)
}

/// Strategy for plain file names (`abc.xyz`).
fn file_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}\\.[a-z]{1,4}"
}

/// Strategy for relative directories (`.` or `a/b`).
fn directory() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(".".to_string()),
        prop::collection::vec("[a-z]{1,6}", 1..3).prop_map(|parts| parts.join("/")),
    ]
}

proptest! {
    /// Every assigned address is unique while held.
    #[test]
    fn assigned_addresses_are_unique(tags in prop::collection::vec(package_tag(), 1..40)) {
        let container = ContainerName::new("m").unwrap();
        let mut registry = PathRegistry::new();
        let mut seen = HashSet::new();

        for tag in &tags {
            let package_type = PackageType::new(tag.as_str()).unwrap();
            let address = registry.assign(Address::top_level(&container, &package_type));
            prop_assert!(seen.insert(address.clone()), "duplicate address {}", address);
            prop_assert_eq!(address.root(), "m");
        }
        prop_assert_eq!(registry.len(), tags.len());
    }

    /// Released addresses are handed out again before new perturbations.
    #[test]
    fn released_address_is_reused(count in 1usize..10) {
        let container = ContainerName::new("m").unwrap();
        let wel = PackageType::new("wel").unwrap();
        let mut registry = PathRegistry::new();

        let assigned: Vec<Address> = (0..count)
            .map(|_| registry.assign(Address::top_level(&container, &wel)))
            .collect();
        let victim = &assigned[count / 2];
        prop_assert!(registry.release(victim));
        let again = registry.assign(Address::top_level(&container, &wel));
        prop_assert_eq!(&again, victim);
    }

    /// Priority records come first; both groups keep their relative order.
    #[test]
    fn priority_ordering_is_a_stable_partition(tags in prop::collection::vec(package_tag(), 0..20)) {
        let records: Vec<NameRecord> = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| NameRecord::new(format!("{}6", tag), format!("f{i}.{tag}"), None))
            .collect();
        let priority = vec!["DIS6".to_string(), "DISV6".to_string(), "DISU6".to_string()];
        let is_priority = |r: &NameRecord| priority.contains(&r.code);

        let ordered = order_records(&records, &priority);
        prop_assert_eq!(ordered.len(), records.len());

        let first_other = ordered.iter().position(|r| !is_priority(r)).unwrap_or(ordered.len());
        prop_assert!(ordered[first_other..].iter().all(|r| !is_priority(r)));

        let expected: Vec<&NameRecord> = records
            .iter()
            .filter(|r| is_priority(r))
            .chain(records.iter().filter(|r| !is_priority(r)))
            .collect();
        let actual: Vec<&NameRecord> = ordered.iter().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Relocating twice into the same directory is the same as once.
    #[test]
    fn relocation_is_idempotent(dir in directory(), start in directory(), name in file_name()) {
        let original = if start == "." { name.clone() } else { format!("{start}/{name}") };
        let once = relocate_filename(&dir, &original);
        let twice = relocate_filename(&dir, &once);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.ends_with(&name));
    }

    /// Relocation keeps the file name and only changes its directory.
    #[test]
    fn relocation_never_renames(dir in directory(), name in file_name()) {
        let moved = relocate_filename(&dir, &name);
        let expected = if dir == "." { name.clone() } else { format!("{dir}/{name}") };
        prop_assert_eq!(moved, expected);
    }

    /// External files keep their path below the model directory, and
    /// moving back restores the original name.
    #[test]
    fn external_relocation_round_trips(
        dir in directory(),
        sub in prop::collection::vec("[a-z]{1,6}", 0..3),
        name in file_name(),
    ) {
        let original = sub.iter().cloned().chain([name.clone()]).collect::<Vec<_>>().join("/");
        let moved = relocate_external(".", &dir, &original);
        prop_assert!(moved.ends_with(&original));
        prop_assert_eq!(relocate_external(&dir, &dir, &moved), moved.clone());
        prop_assert_eq!(relocate_external(&dir, ".", &moved), original);
    }

    /// Array-layout alternates share the record code of their list type.
    #[test]
    fn alternate_shares_record_code(tag in prop::sample::select(vec!["rch", "evt"])) {
        let list = PackageType::new(tag).unwrap();
        let array = list.alternate();
        prop_assert_eq!(list.record_code("6"), array.record_code("6"));
        let parsed = PackageType::from_record_code(&array.record_code("6"), "6").unwrap();
        prop_assert_eq!(parsed, list);
    }
}
