//! core::registry
//!
//! Path Registry and discriminator counters.
//!
//! # Architecture
//!
//! Every package registered into a container receives an [`Address`]. The
//! registry records which addresses are held and resolves collisions by
//! walking a [`PathIter`] from the requested candidate until a free address
//! is found.
//!
//! # Invariants
//!
//! - `assign` never returns an address that is already held
//! - Given the same held set and the same candidate, `assign` returns the
//!   same address
//! - An address stays held until explicitly released

use std::collections::{BTreeSet, HashMap};

use super::naming::PathIter;
use super::types::Address;

/// The set of addresses held by live packages in one container tree.
#[derive(Debug, Default, Clone)]
pub struct PathRegistry {
    held: BTreeSet<Address>,
}

impl PathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the first free address starting at `candidate`.
    ///
    /// # Example
    ///
    /// ```
    /// use mfsim::core::registry::PathRegistry;
    /// use mfsim::core::types::Address;
    ///
    /// let mut registry = PathRegistry::new();
    /// let wel = Address::new(["m", "wel"]).unwrap();
    ///
    /// assert_eq!(registry.assign(wel.clone()).to_string(), "m/wel");
    /// assert_eq!(registry.assign(wel.clone()).to_string(), "m/wel_1");
    /// assert_eq!(registry.assign(wel).to_string(), "m/wel_2");
    /// ```
    pub fn assign(&mut self, candidate: Address) -> Address {
        let assigned = PathIter::new(candidate.clone())
            .find(|path| !self.held.contains(path))
            // PathIter only ends after u32::MAX candidates
            .unwrap_or(candidate);
        self.held.insert(assigned.clone());
        assigned
    }

    /// Whether an address is currently held.
    pub fn contains(&self, address: &Address) -> bool {
        self.held.contains(address)
    }

    /// Free an address so it may be assigned again.
    ///
    /// Returns `true` if the address was held.
    pub fn release(&mut self, address: &Address) -> bool {
        self.held.remove(address)
    }

    /// Number of held addresses.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether no addresses are held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Held addresses in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.held.iter()
    }
}

/// Per-key monotonic counters used to discriminate loaded instance names.
///
/// Counters start at 0 and never hand out the same value twice for a key,
/// even if the package that used a value is later removed.
#[derive(Debug, Default, Clone)]
pub struct DiscriminatorCounters {
    counters: HashMap<String, u32>,
}

impl DiscriminatorCounters {
    /// Create an empty counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next value for `key` and advance its counter.
    ///
    /// # Example
    ///
    /// ```
    /// use mfsim::core::registry::DiscriminatorCounters;
    ///
    /// let mut counters = DiscriminatorCounters::new();
    /// assert_eq!(counters.next("wel"), 0);
    /// assert_eq!(counters.next("wel"), 1);
    /// assert_eq!(counters.next("chd"), 0);
    /// ```
    pub fn next(&mut self, key: &str) -> u32 {
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(segments: &[&str]) -> Address {
        Address::new(segments.iter().copied()).unwrap()
    }

    #[test]
    fn free_candidate_is_returned_unchanged() {
        let mut registry = PathRegistry::new();
        let a = registry.assign(addr(&["m", "dis"]));
        assert_eq!(a, addr(&["m", "dis"]));
        assert!(registry.contains(&a));
    }

    #[test]
    fn collisions_perturb_trailing_segment() {
        let mut registry = PathRegistry::new();
        registry.assign(addr(&["m", "wel"]));
        let second = registry.assign(addr(&["m", "wel"]));
        assert_eq!(second, addr(&["m", "wel_1"]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn perturbation_skips_held_suffixes() {
        let mut registry = PathRegistry::new();
        registry.assign(addr(&["m", "wel"]));
        registry.assign(addr(&["m", "wel_1"]));
        let next = registry.assign(addr(&["m", "wel"]));
        assert_eq!(next, addr(&["m", "wel_2"]));
    }

    #[test]
    fn release_frees_the_address() {
        let mut registry = PathRegistry::new();
        let a = registry.assign(addr(&["m", "rch"]));
        assert!(registry.release(&a));
        assert!(!registry.release(&a));
        assert_eq!(registry.assign(addr(&["m", "rch"])), a);
    }

    #[test]
    fn assignment_is_deterministic() {
        let run = || {
            let mut registry = PathRegistry::new();
            (0..4)
                .map(|_| registry.assign(addr(&["m", "chd"])))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn counters_do_not_reuse_values() {
        let mut counters = DiscriminatorCounters::new();
        assert_eq!(counters.next("wel"), 0);
        assert_eq!(counters.next("wel"), 1);
        assert_eq!(counters.next("chd"), 0);
        assert_eq!(counters.next("wel"), 2);
    }
}
