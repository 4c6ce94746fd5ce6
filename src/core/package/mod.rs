//! core::package
//!
//! Package instances and the representation seam behind them.
//!
//! # Modules
//!
//! - [`blocks`] - BEGIN/END block framing and the generic block-backed package
//! - [`factory`] - Package Factory: resolve a constructor by type and model family
//!
//! # Design
//!
//! A [`Package`] carries everything its container needs to know about it
//! (type, instance name, file name, address, parent and children). The
//! package-specific content sits behind the [`PackageData`] trait so the
//! containers and the loader never depend on a concrete representation.
//!
//! Parsing returns a typed [`LoadOutcome`]: a file written in the other
//! layout is an ordinary outcome the loader branches on, not an error.

pub mod blocks;
pub mod factory;

pub use blocks::{Block, BlockFile, BlockPackage};
pub use factory::{DefaultPackageFactory, PackageConstructor, PackageFactory};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::files::{is_movable, relocate_external, relocate_filename};
use crate::core::types::{Address, PackageName, PackageType};

/// Fatal errors from parsing a package file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackageError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: content outside of a block")]
    ContentOutsideBlock { line: usize },

    #[error("line {line}: END {found} does not close block '{expected}'")]
    MismatchedEnd {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("block '{name}' opened on line {line} is never closed")]
    UnterminatedBlock { name: String, line: usize },
}

/// Result of a parse attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file matched the expected layout and was loaded
    Loaded,
    /// The file is written in the alternate layout of the same package type
    LayoutMismatch { reason: String },
}

/// A file mentioned inside a package but not listed in the name file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Type of the referenced package
    pub package_type: PackageType,
    /// File name as written in the referencing package
    pub filename: String,
}

/// A concrete package representation.
pub trait PackageData: std::fmt::Debug {
    /// Load file content, replacing any current content on success.
    fn parse(&mut self, text: &str, strict: bool) -> Result<LoadOutcome, PackageError>;

    /// Render the content back to file text.
    fn render(&self) -> String;

    /// Whether the content is complete enough to write.
    fn is_valid(&self) -> bool;

    /// Files this package refers to that should be loaded as its children.
    fn referenced_files(&self) -> Vec<FileReference>;

    /// Move internal file references from directory `from` into `to`.
    ///
    /// Package file references keep their file names; external data files
    /// keep their path below the model directory.
    fn relocate(&mut self, from: &str, to: &str);

    /// Refer to a child package file so a reload finds it.
    fn add_reference(&mut self, _package_type: &PackageType, _filename: &str) {}

    /// Drop the reference to a child package file.
    fn remove_reference(&mut self, _filename: &str) {}

    /// External data files (not packages) read by this package.
    fn external_files(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Lifecycle state of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageState {
    /// Created in memory, no file content loaded
    #[default]
    Unloaded,
    /// Content loaded from a file
    Loaded,
}

/// A package instance owned by a container.
#[derive(Debug)]
pub struct Package {
    package_type: PackageType,
    name: PackageName,
    filename: String,
    address: Option<Address>,
    parent: Option<Address>,
    children: Vec<Address>,
    state: PackageState,
    external_sources: BTreeMap<String, PathBuf>,
    data: Box<dyn PackageData>,
}

impl Package {
    /// Create an unregistered package. Its name defaults to the type tag and
    /// its file name is empty until a container assigns one.
    pub fn new(package_type: PackageType, data: Box<dyn PackageData>) -> Self {
        Self {
            name: PackageName::from(&package_type),
            package_type,
            filename: String::new(),
            address: None,
            parent: None,
            children: Vec::new(),
            state: PackageState::Unloaded,
            external_sources: BTreeMap::new(),
            data,
        }
    }

    /// Set the instance name.
    pub fn with_name(mut self, name: PackageName) -> Self {
        self.name = name;
        self
    }

    /// Set the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Declare a parent package.
    pub fn with_parent(mut self, parent: Address) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn package_type(&self) -> &PackageType {
        &self.package_type
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    pub fn set_name(&mut self, name: PackageName) {
        self.name = name;
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Address assigned at registration, `None` before.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub(crate) fn set_address(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn parent(&self) -> Option<&Address> {
        self.parent.as_ref()
    }

    /// Whether the package hangs directly off its container.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    pub fn children(&self) -> &[Address] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: Address) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: &Address) {
        self.children.retain(|c| c != child);
    }

    pub fn state(&self) -> PackageState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == PackageState::Loaded
    }

    /// Load file content. The state becomes `Loaded` only on success.
    pub fn load(&mut self, text: &str, strict: bool) -> Result<LoadOutcome, PackageError> {
        let outcome = self.data.parse(text, strict)?;
        if outcome == LoadOutcome::Loaded {
            self.state = PackageState::Loaded;
        }
        Ok(outcome)
    }

    pub fn render(&self) -> String {
        self.data.render()
    }

    pub fn is_valid(&self) -> bool {
        self.data.is_valid()
    }

    pub fn referenced_files(&self) -> Vec<FileReference> {
        self.data.referenced_files()
    }

    /// Relocation hook: move this package's file from directory `from`
    /// into `to`, along with its internal file references.
    pub fn relocate(&mut self, from: &str, to: &str) {
        if !self.filename.is_empty() {
            self.filename = relocate_filename(to, &self.filename);
        }
        self.data.relocate(from, to);
        self.external_sources = std::mem::take(&mut self.external_sources)
            .into_iter()
            .map(|(name, source)| (relocate_external(from, to, &name), source))
            .collect();
    }

    /// Reference a child package file from this package's content.
    pub fn add_reference(&mut self, package_type: &PackageType, filename: &str) {
        self.data.add_reference(package_type, filename);
    }

    pub fn remove_reference(&mut self, filename: &str) {
        self.data.remove_reference(filename);
    }

    /// Remember where the external files named in the content live now,
    /// so a later write can copy them next to their new references.
    pub fn track_external_files(&mut self, sim_path: &Path) {
        for name in self.data.external_files() {
            if is_movable(&name) {
                let source = sim_path.join(&name);
                self.external_sources.insert(name, source);
            }
        }
    }

    /// External files as currently referenced, with the file each one was
    /// read from.
    pub fn external_sources(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.external_sources
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::PackageStructure;

    fn package(tag: &str) -> Package {
        let package_type = PackageType::new(tag).unwrap();
        let data = BlockPackage::new(&PackageStructure::new(package_type.clone()), "6");
        Package::new(package_type, Box::new(data))
    }

    #[test]
    fn defaults() {
        let pkg = package("dis");
        assert_eq!(pkg.name().as_str(), "dis");
        assert_eq!(pkg.filename(), "");
        assert!(pkg.address().is_none());
        assert!(pkg.is_top_level());
        assert_eq!(pkg.state(), PackageState::Unloaded);
    }

    #[test]
    fn load_flips_state_only_on_success() {
        let mut pkg = package("rch");
        let outcome = pkg
            .load("BEGIN options\n READASARRAYS\nEND options\n", false)
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::LayoutMismatch { .. }));
        assert!(!pkg.is_loaded());

        assert!(pkg.load("BEGIN options\n", false).is_err());
        assert!(!pkg.is_loaded());

        pkg.load("BEGIN options\nEND options\n", false).unwrap();
        assert!(pkg.is_loaded());
    }

    #[test]
    fn relocate_moves_filename() {
        let mut pkg = package("oc").with_filename("m.oc");
        pkg.relocate(".", "out");
        assert_eq!(pkg.filename(), "out/m.oc");
        pkg.relocate("out", ".");
        assert_eq!(pkg.filename(), "m.oc");
    }

    #[test]
    fn external_sources_follow_relocation() {
        let mut pkg = package("npf").with_filename("m.npf");
        pkg.load(
            "BEGIN griddata\n  k\n    OPEN/CLOSE arrays/k.dat\n  k33\n    OPEN/CLOSE ../shared/k33.dat\nEND griddata\n",
            false,
        )
        .unwrap();
        pkg.track_external_files(Path::new("/sim"));
        pkg.relocate(".", "sub");

        let sources: Vec<(&str, &Path)> = pkg.external_sources().collect();
        assert_eq!(sources, vec![("sub/arrays/k.dat", Path::new("/sim/arrays/k.dat"))]);
        assert!(pkg.render().contains("OPEN/CLOSE sub/arrays/k.dat"));
        assert!(pkg.render().contains("OPEN/CLOSE ../shared/k33.dat"));
    }

    #[test]
    fn children_are_unique() {
        let mut pkg = package("wel");
        let child = Address::new(["m", "wel", "obs"]).unwrap();
        pkg.add_child(child.clone());
        pkg.add_child(child.clone());
        assert_eq!(pkg.children().len(), 1);
        pkg.remove_child(&child);
        assert!(pkg.children().is_empty());
    }
}
