//! core::files
//!
//! File Location Map: where each container's files live relative to the
//! simulation working directory.
//!
//! # Architecture
//!
//! MODFLOW 6 resolves every file name relative to the simulation working
//! directory. A model placed in a subdirectory therefore carries that
//! directory as a prefix on every file name it records. `FileLocations`
//! tracks the prefix per container so the loader can strip it before
//! re-resolving, and writers can place files under the right directory.
//!
//! # Example
//!
//! ```
//! use mfsim::core::files::FileLocations;
//! use std::path::PathBuf;
//!
//! let mut files = FileLocations::new("/work/sim");
//! files.set_model_relative_path("flow", "models/flow");
//!
//! assert_eq!(files.strip_model_relative_path("flow", "models/flow/flow.dis"), "flow.dis");
//! assert_eq!(
//!     files.resolve("flow", "models/flow/flow.dis"),
//!     PathBuf::from("/work/sim/models/flow/flow.dis")
//! );
//! assert_eq!(files.last_accessed(), Some("flow"));
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Relative path meaning "the simulation working directory itself".
pub const CURRENT_DIR: &str = ".";

/// Normalize a relative directory: forward slashes, no trailing separator,
/// empty becomes `.`.
pub fn normalize_dir(dir: &str) -> String {
    let dir = dir.trim().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    let dir = dir.strip_prefix("./").unwrap_or(dir);
    if dir.is_empty() {
        CURRENT_DIR.to_string()
    } else {
        dir.to_string()
    }
}

/// The file name with any directory components removed.
pub fn file_basename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

/// The directory part of a recorded file name, or `.` when there is none.
pub fn file_dirname(filename: &str) -> String {
    let filename = filename.replace('\\', "/");
    match filename.rsplit_once('/') {
        Some((dir, _)) => normalize_dir(dir),
        None => CURRENT_DIR.to_string(),
    }
}

/// Move a recorded file name into `dir`, keeping its base name.
///
/// Relocating into `.` strips every directory component. Applying the same
/// relocation twice yields the same name.
///
/// # Example
///
/// ```
/// use mfsim::core::files::relocate_filename;
///
/// assert_eq!(relocate_filename("sub/dir", "m.wel"), "sub/dir/m.wel");
/// assert_eq!(relocate_filename("sub/dir", "old/m.wel"), "sub/dir/m.wel");
/// assert_eq!(relocate_filename(".", "old/m.wel"), "m.wel");
/// ```
pub fn relocate_filename(dir: &str, filename: &str) -> String {
    let dir = normalize_dir(dir);
    let base = file_basename(filename);
    if dir == CURRENT_DIR {
        base.to_string()
    } else {
        format!("{dir}/{base}")
    }
}

/// Whether a recorded file name can be moved with its model.
///
/// Absolute names and names that climb out with `..` point outside the
/// model directory and are never rewritten.
pub fn is_movable(filename: &str) -> bool {
    let filename = filename.replace('\\', "/");
    let absolute = filename.starts_with('/') || filename.get(1..2) == Some(":");
    !absolute && !filename.split('/').any(|part| part == "..")
}

/// Remove a leading `dir/` from a recorded file name, matching whole segments.
fn strip_dir(dir: &str, filename: &str) -> String {
    let filename = filename.replace('\\', "/");
    if dir == CURRENT_DIR {
        return filename;
    }
    filename
        .strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_string)
        .unwrap_or(filename)
}

/// Move an external data file reference from directory `from` to `to`.
///
/// Unlike [`relocate_filename`], the path below the model directory is
/// kept, so `arrays/k.dat` in a model moved from `.` to `sub` becomes
/// `sub/arrays/k.dat`. Names that are not [movable](is_movable) are
/// returned unchanged.
///
/// # Example
///
/// ```
/// use mfsim::core::files::relocate_external;
///
/// assert_eq!(relocate_external(".", "sub", "arrays/k.dat"), "sub/arrays/k.dat");
/// assert_eq!(relocate_external("sub", "sub", "sub/arrays/k.dat"), "sub/arrays/k.dat");
/// assert_eq!(relocate_external("sub", ".", "sub/arrays/k.dat"), "arrays/k.dat");
/// assert_eq!(relocate_external(".", "sub", "/data/k.dat"), "/data/k.dat");
/// ```
pub fn relocate_external(from: &str, to: &str, filename: &str) -> String {
    if !is_movable(filename) {
        return filename.to_string();
    }
    let rest = strip_dir(&normalize_dir(from), filename);
    let to = normalize_dir(to);
    if to == CURRENT_DIR {
        rest
    } else {
        format!("{to}/{rest}")
    }
}

/// Per-container relative paths within one simulation working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocations {
    sim_path: PathBuf,
    model_relative_path: BTreeMap<String, String>,
    last_accessed: Option<String>,
}

impl FileLocations {
    /// Create a map rooted at the simulation working directory.
    pub fn new(sim_path: impl Into<PathBuf>) -> Self {
        Self {
            sim_path: sim_path.into(),
            model_relative_path: BTreeMap::new(),
            last_accessed: None,
        }
    }

    /// The simulation working directory.
    pub fn sim_path(&self) -> &Path {
        &self.sim_path
    }

    /// Move the simulation working directory. Relative paths are kept.
    pub fn set_sim_path(&mut self, sim_path: impl Into<PathBuf>) {
        self.sim_path = sim_path.into();
    }

    /// Record a container's relative path and mark it most recently touched.
    pub fn set_model_relative_path(&mut self, container: &str, relative_path: &str) {
        self.model_relative_path
            .insert(container.to_string(), normalize_dir(relative_path));
        self.touch(container);
    }

    /// A container's relative path (`.` when never set).
    pub fn model_relative_path(&self, container: &str) -> &str {
        self.model_relative_path
            .get(container)
            .map(String::as_str)
            .unwrap_or(CURRENT_DIR)
    }

    /// Mark a container as most recently touched.
    pub fn touch(&mut self, container: &str) {
        self.last_accessed = Some(container.to_string());
    }

    /// The most recently touched container.
    pub fn last_accessed(&self) -> Option<&str> {
        self.last_accessed.as_deref()
    }

    /// Remove an already-applied container prefix from a recorded file name.
    ///
    /// Names without the prefix are returned unchanged.
    pub fn strip_model_relative_path(&self, container: &str, filename: &str) -> String {
        strip_dir(self.model_relative_path(container), filename)
    }

    /// Absolute location of a file recorded by a container.
    pub fn resolve(&self, container: &str, filename: &str) -> PathBuf {
        let relative = self.model_relative_path(container);
        let stripped = self.strip_model_relative_path(container, filename);
        if relative == CURRENT_DIR {
            self.sim_path.join(stripped)
        } else {
            self.sim_path.join(relative).join(stripped)
        }
    }

    /// Absolute location of a file recorded by the simulation itself.
    pub fn resolve_sim(&self, filename: &str) -> PathBuf {
        self.sim_path.join(filename.replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_dir_forms() {
        assert_eq!(normalize_dir(""), ".");
        assert_eq!(normalize_dir("./"), ".");
        assert_eq!(normalize_dir("sub/dir/"), "sub/dir");
        assert_eq!(normalize_dir("./sub"), "sub");
        assert_eq!(normalize_dir("sub\\dir"), "sub/dir");
    }

    #[test]
    fn basename_and_dirname() {
        assert_eq!(file_basename("a/b/c.dis"), "c.dis");
        assert_eq!(file_basename("a\\c.dis"), "c.dis");
        assert_eq!(file_basename("c.dis"), "c.dis");
        assert_eq!(file_dirname("a/b/c.nam"), "a/b");
        assert_eq!(file_dirname("c.nam"), ".");
    }

    #[test]
    fn relocation_is_idempotent() {
        let once = relocate_filename("sub/dir", "m.oc");
        let twice = relocate_filename("sub/dir", &once);
        assert_eq!(once, twice);
        assert_eq!(twice, "sub/dir/m.oc");
    }

    #[test]
    fn external_relocation_keeps_sub_paths() {
        assert_eq!(relocate_external(".", "sub", "arrays/k.dat"), "sub/arrays/k.dat");
        let once = relocate_external(".", "sub", "arrays/k.dat");
        assert_eq!(relocate_external("sub", "sub", &once), once);
        assert_eq!(relocate_external("sub", "other/dir", &once), "other/dir/arrays/k.dat");
        assert_eq!(relocate_external("sub", ".", &once), "arrays/k.dat");
    }

    #[test]
    fn escaping_and_absolute_names_are_not_moved() {
        assert!(!is_movable("../shared/k.dat"));
        assert!(!is_movable("/data/k.dat"));
        assert!(!is_movable("C:\\data\\k.dat"));
        assert!(is_movable("arrays/k.dat"));
        assert_eq!(relocate_external(".", "sub", "../shared/k.dat"), "../shared/k.dat");
    }

    #[test]
    fn default_relative_path_is_current_dir() {
        let files = FileLocations::new("/sim");
        assert_eq!(files.model_relative_path("m"), ".");
        assert_eq!(files.last_accessed(), None);
        assert_eq!(files.strip_model_relative_path("m", "x/m.dis"), "x/m.dis");
        assert_eq!(files.resolve("m", "m.dis"), PathBuf::from("/sim/m.dis"));
    }

    #[test]
    fn strip_requires_whole_segment_prefix() {
        let mut files = FileLocations::new("/sim");
        files.set_model_relative_path("m", "sub");
        assert_eq!(files.strip_model_relative_path("m", "sub/m.dis"), "m.dis");
        assert_eq!(files.strip_model_relative_path("m", "subway/m.dis"), "subway/m.dis");
    }

    #[test]
    fn resolve_without_prefix_still_lands_in_model_dir() {
        let mut files = FileLocations::new("/sim");
        files.set_model_relative_path("m", "sub");
        assert_eq!(files.resolve("m", "m.dis"), PathBuf::from("/sim/sub/m.dis"));
        assert_eq!(files.resolve_sim("sub/m.nam"), PathBuf::from("/sim/sub/m.nam"));
    }

    #[test]
    fn touch_tracks_latest_container() {
        let mut files = FileLocations::new("/sim");
        files.set_model_relative_path("a", ".");
        files.set_model_relative_path("b", "b");
        assert_eq!(files.last_accessed(), Some("b"));
        files.touch("a");
        assert_eq!(files.last_accessed(), Some("a"));
    }
}
