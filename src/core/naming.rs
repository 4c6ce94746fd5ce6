//! core::naming
//!
//! Deterministic naming rules for packages and addresses.
//!
//! # Features
//!
//! - Perturb a colliding address by suffixing its trailing segment
//! - Generate numbered default instance names (`wel_0`, `wel_1`, ...)
//! - Derive child package names from their parent's address
//! - Reduce a model type to its model family (`gwf6` -> `gwf`)

use super::types::{Address, PackageType};

/// Iterator over candidate addresses for a registration.
///
/// Yields the starting address first, then the same address with the
/// trailing segment suffixed `_1`, `_2`, and so on. The sequence depends
/// only on the starting address, so registrations replay identically.
///
/// # Example
///
/// ```
/// use mfsim::core::naming::PathIter;
/// use mfsim::core::types::Address;
///
/// let start = Address::new(["m", "wel"]).unwrap();
/// let candidates: Vec<String> = PathIter::new(start).take(3).map(|a| a.to_string()).collect();
/// assert_eq!(candidates, vec!["m/wel", "m/wel_1", "m/wel_2"]);
/// ```
#[derive(Debug, Clone)]
pub struct PathIter {
    start: Address,
    next: u32,
}

impl PathIter {
    /// Start iterating from `start`.
    pub fn new(start: Address) -> Self {
        Self { start, next: 0 }
    }
}

impl Iterator for PathIter {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        let n = self.next;
        self.next = self.next.checked_add(1)?;
        if n == 0 {
            Some(self.start.clone())
        } else {
            Some(self.start.with_last(format!("{}_{}", self.start.last(), n)))
        }
    }
}

/// Iterator over numbered instance names: `<base>_0`, `<base>_1`, ...
///
/// # Example
///
/// ```
/// use mfsim::core::naming::NameIter;
///
/// let names: Vec<String> = NameIter::new("wel").take(2).collect();
/// assert_eq!(names, vec!["wel_0", "wel_1"]);
/// ```
#[derive(Debug, Clone)]
pub struct NameIter {
    base: String,
    next: u32,
}

impl NameIter {
    /// Start iterating names for `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            next: 0,
        }
    }
}

impl Iterator for NameIter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let n = self.next;
        self.next = self.next.checked_add(1)?;
        Some(format!("{}_{}", self.base, n))
    }
}

/// Base of the instance names for packages that are children of another package.
///
/// The base is the parent's trailing address segment joined to the child
/// type. Children are then numbered like multi-instance packages: the `obs`
/// children of `m/wel_1` are `wel_1_obs_0`, `wel_1_obs_1`, ...
pub fn child_package_name(parent: &Address, package_type: &PackageType) -> String {
    format!("{}_{}", parent.last(), package_type)
}

/// Reduce a model type to its family by dropping trailing digits.
///
/// # Example
///
/// ```
/// use mfsim::core::naming::model_family;
///
/// assert_eq!(model_family("gwf6"), "gwf");
/// assert_eq!(model_family("GWT6"), "gwt");
/// assert_eq!(model_family("sim"), "sim");
/// ```
pub fn model_family(model_type: &str) -> String {
    model_type
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_iter_starts_with_candidate() {
        let start = Address::new(["m", "obs"]).unwrap();
        let mut iter = PathIter::new(start.clone());
        assert_eq!(iter.next(), Some(start));
        assert_eq!(iter.next().unwrap().to_string(), "m/obs_1");
    }

    #[test]
    fn path_iter_only_touches_trailing_segment() {
        let start = Address::new(["m", "wel", "obs"]).unwrap();
        let third = PathIter::new(start).nth(2).unwrap();
        assert_eq!(third.segments(), &["m", "wel", "obs_2"]);
    }

    #[test]
    fn name_iter_is_zero_based() {
        let mut iter = NameIter::new("chd");
        assert_eq!(iter.next().as_deref(), Some("chd_0"));
        assert_eq!(iter.next().as_deref(), Some("chd_1"));
    }

    #[test]
    fn child_name_uses_parent_trailing_segment() {
        let parent = Address::new(["m", "wel_1"]).unwrap();
        let obs = PackageType::new("obs").unwrap();
        assert_eq!(child_package_name(&parent, &obs), "wel_1_obs");
    }

    #[test]
    fn model_family_strips_digits_only_at_end() {
        assert_eq!(model_family("gwf6"), "gwf");
        assert_eq!(model_family("gw6f"), "gw6f");
        assert_eq!(model_family(""), "");
    }
}
