//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PackageType`] - Validated package type tag (`dis`, `wel`, `rcha`, ...)
//! - [`ContainerName`] - Validated model or simulation name
//! - [`PackageName`] - Validated package instance name
//! - [`Address`] - Hierarchical package address within a container tree
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use mfsim::core::types::{Address, ContainerName, PackageType};
//!
//! // Valid constructions
//! let model = ContainerName::new("flow").unwrap();
//! let wel = PackageType::new("WEL").unwrap();
//! let address = Address::top_level(&model, &wel);
//! assert_eq!(address.to_string(), "flow/wel");
//!
//! // Invalid constructions fail at creation time
//! assert!(PackageType::new("we l").is_err());
//! assert!(ContainerName::new("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MODFLOW 6 limit on model and package instance name length.
pub const MAX_NAME_LEN: usize = 16;

/// Type tag of the name file package.
pub const NAME_FILE_TYPE: &str = "nam";

/// Container name of the simulation.
pub const SIMULATION_NAME: &str = "sim";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package type: {0}")]
    InvalidPackageType(String),

    #[error("invalid container name: {0}")]
    InvalidContainerName(String),

    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// A validated package type tag.
///
/// Type tags are normalized to lowercase and must be ASCII alphanumeric.
/// The tag identifies the schema structure and the package constructor.
///
/// # Example
///
/// ```
/// use mfsim::core::types::PackageType;
///
/// let rch = PackageType::new("RCH").unwrap();
/// assert_eq!(rch.as_str(), "rch");
///
/// // Array-layout variants share the record code of their list counterpart
/// assert_eq!(rch.alternate().as_str(), "rcha");
/// assert_eq!(rch.alternate().record_code("6"), "RCH6");
///
/// // Record codes parse back into type tags
/// let parsed = PackageType::from_record_code("DISV6", "6").unwrap();
/// assert_eq!(parsed.as_str(), "disv");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageType(String);

impl PackageType {
    /// Create a new validated package type.
    ///
    /// The tag is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPackageType` if the tag is empty, too long,
    /// or contains anything other than ASCII letters and digits.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into().trim().to_ascii_lowercase();
        Self::validate(&tag)?;
        Ok(Self(tag))
    }

    /// Parse a name-file record code (`WEL6`) into a type tag (`wel`).
    ///
    /// The trailing version suffix is removed when present.
    pub fn from_record_code(code: &str, version: &str) -> Result<Self, TypeError> {
        let code = code.trim();
        let upper = code.to_ascii_uppercase();
        let stripped = if !version.is_empty() && upper.ends_with(&version.to_ascii_uppercase()) {
            &code[..code.len() - version.len()]
        } else {
            code
        };
        Self::new(stripped)
    }

    fn validate(tag: &str) -> Result<(), TypeError> {
        if tag.is_empty() {
            return Err(TypeError::InvalidPackageType(
                "package type cannot be empty".into(),
            ));
        }
        if tag.len() > MAX_NAME_LEN {
            return Err(TypeError::InvalidPackageType(format!(
                "package type '{tag}' exceeds {MAX_NAME_LEN} characters"
            )));
        }
        if !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypeError::InvalidPackageType(format!(
                "package type '{tag}' must be alphanumeric"
            )));
        }
        Ok(())
    }

    /// The name-file record code for this type.
    ///
    /// Upper-cased, with a trailing `A` dropped from tags longer than three
    /// characters so array-layout variants share their canonical record slot,
    /// and the schema version appended.
    pub fn record_code(&self, version: &str) -> String {
        let mut code = self.0.to_ascii_uppercase();
        if code.len() > 3 && code.ends_with('A') {
            code.pop();
        }
        format!("{code}{version}")
    }

    /// The alternate (array-layout) type for this tag.
    pub fn alternate(&self) -> PackageType {
        Self(format!("{}a", self.0))
    }

    /// The name file type (`nam`).
    pub fn name_file() -> PackageType {
        Self(NAME_FILE_TYPE.to_string())
    }

    /// Whether this is the name file type.
    pub fn is_name_file(&self) -> bool {
        self.0 == NAME_FILE_TYPE
    }

    /// Get the type tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageType {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PackageType> for String {
    fn from(t: PackageType) -> Self {
        t.0
    }
}

impl AsRef<str> for PackageType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check the rules shared by container and package names.
fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("'{name}' exceeds {MAX_NAME_LEN} characters"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
        return Err(format!("'{name}' cannot contain whitespace"));
    }
    Ok(())
}

/// A validated model or simulation name.
///
/// Names are case-preserving, at most 16 characters, and may not contain
/// whitespace or path separators (they become file names and address roots).
///
/// # Example
///
/// ```
/// use mfsim::core::types::ContainerName;
///
/// assert!(ContainerName::new("flow").is_ok());
/// assert!(ContainerName::new("a/b").is_err());
/// assert!(ContainerName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName(String);

impl ContainerName {
    /// Create a new validated container name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_name(&name).map_err(TypeError::InvalidContainerName)?;
        if name.contains('/') || name.contains('\\') {
            return Err(TypeError::InvalidContainerName(format!(
                "'{name}' cannot contain path separators"
            )));
        }
        Ok(Self(name))
    }

    /// Container name of the simulation itself (`sim`).
    pub fn simulation() -> Self {
        Self(SIMULATION_NAME.to_string())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContainerName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContainerName> for String {
    fn from(name: ContainerName) -> Self {
        name.0
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated package instance name.
///
/// Instance names are compared case-insensitively by containers, but the
/// original spelling is preserved for writing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new validated package name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_name(&name).map_err(TypeError::InvalidPackageName)?;
        Ok(Self(name))
    }

    /// Lookup key used by containers (lowercase).
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&PackageType> for PackageName {
    fn from(t: &PackageType) -> Self {
        // Package types satisfy every package name rule.
        Self(t.as_str().to_string())
    }
}

impl TryFrom<String> for PackageName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hierarchical address of a package within a container tree.
///
/// The first segment is the container name; the remaining segments are a
/// chain of package-type segments, possibly perturbed with a numeric
/// discriminator (`wel_1`) to keep addresses unique.
///
/// # Example
///
/// ```
/// use mfsim::core::types::{Address, ContainerName, PackageType};
///
/// let model = ContainerName::new("flow").unwrap();
/// let wel = Address::top_level(&model, &PackageType::new("wel").unwrap());
/// let obs = wel.child(&PackageType::new("obs").unwrap());
///
/// assert_eq!(obs.to_string(), "flow/wel/obs");
/// assert_eq!(obs.parent(), Some(wel.clone()));
/// assert_eq!(wel.with_last("wel_1").to_string(), "flow/wel_1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(Vec<String>);

impl Address {
    /// Create an address from raw segments.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAddress` if there are no segments or any
    /// segment is empty, contains whitespace, or contains `/`.
    pub fn new<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TypeError::InvalidAddress(
                "address needs at least one segment".into(),
            ));
        }
        for segment in &segments {
            if segment.is_empty() || segment.contains('/') || segment.contains(char::is_whitespace)
            {
                return Err(TypeError::InvalidAddress(format!(
                    "invalid address segment '{segment}'"
                )));
            }
        }
        Ok(Self(segments))
    }

    /// Address of a top-level package: `(container, type)`.
    pub fn top_level(container: &ContainerName, package_type: &PackageType) -> Self {
        Self(vec![
            container.as_str().to_string(),
            package_type.as_str().to_string(),
        ])
    }

    /// Address of a package nested under this one: `(..self, type)`.
    pub fn child(&self, package_type: &PackageType) -> Self {
        let mut segments = self.0.clone();
        segments.push(package_type.as_str().to_string());
        Self(segments)
    }

    /// This address with the trailing segment replaced.
    pub fn with_last(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        if let Some(last) = segments.last_mut() {
            *last = segment.into();
        }
        Self(segments)
    }

    /// The trailing segment.
    pub fn last(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// The container name segment.
    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    /// The enclosing address, or `None` for a single-segment address.
    pub fn parent(&self) -> Option<Address> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Whether `self` is `other` or nested beneath it.
    pub fn starts_with(&self, other: &Address) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; addresses have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod package_type {
        use super::*;

        #[test]
        fn normalizes_to_lowercase() {
            assert_eq!(PackageType::new("DISV").unwrap().as_str(), "disv");
            assert_eq!(PackageType::new(" wel ").unwrap().as_str(), "wel");
        }

        #[test]
        fn invalid_tags_rejected() {
            assert!(PackageType::new("").is_err());
            assert!(PackageType::new("we-l").is_err());
            assert!(PackageType::new("a".repeat(17)).is_err());
        }

        #[test]
        fn record_code_strips_array_suffix() {
            let v = "6";
            assert_eq!(PackageType::new("wel").unwrap().record_code(v), "WEL6");
            assert_eq!(PackageType::new("rcha").unwrap().record_code(v), "RCH6");
            assert_eq!(PackageType::new("evta").unwrap().record_code(v), "EVT6");
            assert_eq!(PackageType::new("disv").unwrap().record_code(v), "DISV6");
            // Three-character tags are never stripped
            assert_eq!(PackageType::new("lak").unwrap().record_code(v), "LAK6");
        }

        #[test]
        fn from_record_code() {
            let t = PackageType::from_record_code("DIS6", "6").unwrap();
            assert_eq!(t.as_str(), "dis");
            let t = PackageType::from_record_code("gwf6", "6").unwrap();
            assert_eq!(t.as_str(), "gwf");
            // Codes without the version suffix are taken as-is
            let t = PackageType::from_record_code("OBS", "6").unwrap();
            assert_eq!(t.as_str(), "obs");
        }

        #[test]
        fn alternate_appends_suffix() {
            let rch = PackageType::new("rch").unwrap();
            assert_eq!(rch.alternate().as_str(), "rcha");
        }

        #[test]
        fn name_file_detection() {
            assert!(PackageType::new("NAM").unwrap().is_name_file());
            assert!(!PackageType::new("dis").unwrap().is_name_file());
        }

        #[test]
        fn serde_roundtrip() {
            let t = PackageType::new("npf").unwrap();
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, "\"npf\"");
            let parsed: PackageType = serde_json::from_str(&json).unwrap();
            assert_eq!(t, parsed);
        }
    }

    mod names {
        use super::*;

        #[test]
        fn container_name_rules() {
            assert!(ContainerName::new("gwf_model").is_ok());
            assert!(ContainerName::new("").is_err());
            assert!(ContainerName::new("a\\b").is_err());
            assert!(ContainerName::new("x".repeat(17)).is_err());
        }

        #[test]
        fn package_name_rules() {
            assert!(PackageName::new("wel_0").is_ok());
            assert!(PackageName::new("wel 0").is_err());
            assert!(PackageName::new("").is_err());
        }

        #[test]
        fn package_name_key_is_case_insensitive() {
            let a = PackageName::new("WEL_0").unwrap();
            let b = PackageName::new("wel_0").unwrap();
            assert_ne!(a, b);
            assert_eq!(a.key(), b.key());
        }
    }

    mod address {
        use super::*;

        fn model() -> ContainerName {
            ContainerName::new("m").unwrap()
        }

        #[test]
        fn top_level_and_child() {
            let wel = PackageType::new("wel").unwrap();
            let obs = PackageType::new("obs").unwrap();
            let a = Address::top_level(&model(), &wel);
            let c = a.child(&obs);
            assert_eq!(c.segments(), &["m", "wel", "obs"]);
            assert_eq!(c.root(), "m");
            assert_eq!(c.last(), "obs");
            assert!(c.starts_with(&a));
            assert!(!a.starts_with(&c));
        }

        #[test]
        fn parent_of_root_is_none() {
            let a = Address::new(["m"]).unwrap();
            assert!(a.parent().is_none());
        }

        #[test]
        fn invalid_segments_rejected() {
            assert!(Address::new(Vec::<String>::new()).is_err());
            assert!(Address::new(["m", ""]).is_err());
            assert!(Address::new(["m", "a/b"]).is_err());
        }

        #[test]
        fn ordering_is_lexicographic_by_segment() {
            let a = Address::new(["m", "dis"]).unwrap();
            let b = Address::new(["m", "wel"]).unwrap();
            assert!(a < b);
        }
    }
}
