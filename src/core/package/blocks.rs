//! core::package::blocks
//!
//! Coarse MODFLOW 6 block framing and the generic block-backed package.
//!
//! # Format
//!
//! ```text
//! # comment
//! BEGIN options
//!   READASARRAYS
//!   OBS6 FILEIN flow.rch.obs
//! END options
//!
//! BEGIN period 1
//!   ...
//! END period
//! ```
//!
//! Only the framing is interpreted. Block content lines are kept opaque and
//! written back verbatim (trimmed). `BEGIN`/`END` keywords and block names
//! are matched case-insensitively; comment lines start with `#`, `!` or `//`.

use super::{FileReference, LoadOutcome, PackageData, PackageError};
use crate::core::files::{relocate_external, relocate_filename};
use crate::core::schema::{Layout, PackageStructure};
use crate::core::types::PackageType;

/// Option keyword that marks an array-layout package file.
pub const READ_AS_ARRAYS: &str = "READASARRAYS";

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with('!') || line.starts_with("//")
}

/// One `BEGIN name [suffix]` / `END name` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block name, lowercase
    pub name: String,
    /// Anything after the block name on the BEGIN line (e.g. a period number)
    pub suffix: Option<String>,
    /// Content lines, trimmed
    pub lines: Vec<String>,
}

impl Block {
    /// Create an empty block.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            suffix: None,
            lines: Vec::new(),
        }
    }

    /// Whether any content line starts with `keyword` (case-insensitive).
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(keyword))
        })
    }
}

/// A package file split into blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFile {
    /// Comment lines preceding the first block
    pub header: Vec<String>,
    /// Blocks in file order
    pub blocks: Vec<Block>,
}

impl BlockFile {
    /// Split text into blocks.
    ///
    /// In strict mode any non-comment content outside a block is an error;
    /// otherwise it is ignored.
    pub fn parse(text: &str, strict: bool) -> Result<Self, PackageError> {
        let mut file = BlockFile::default();
        let mut current: Option<(Block, usize)> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let keyword = tokens.next().unwrap_or_default();

            if keyword.eq_ignore_ascii_case("BEGIN") {
                if let Some((open, _)) = &current {
                    return Err(PackageError::Syntax {
                        line: line_no,
                        message: format!("BEGIN inside open block '{}'", open.name),
                    });
                }
                let name = tokens.next().ok_or_else(|| PackageError::Syntax {
                    line: line_no,
                    message: "BEGIN without a block name".into(),
                })?;
                let rest: Vec<&str> = tokens.collect();
                let mut block = Block::new(name);
                if !rest.is_empty() {
                    block.suffix = Some(rest.join(" "));
                }
                current = Some((block, line_no));
                continue;
            }

            if keyword.eq_ignore_ascii_case("END") {
                let Some((block, _)) = current.take() else {
                    if strict {
                        return Err(PackageError::ContentOutsideBlock { line: line_no });
                    }
                    continue;
                };
                let found = tokens.next().unwrap_or_default();
                if !found.eq_ignore_ascii_case(&block.name) {
                    return Err(PackageError::MismatchedEnd {
                        line: line_no,
                        expected: block.name,
                        found: found.to_string(),
                    });
                }
                file.blocks.push(block);
                continue;
            }

            match current.as_mut() {
                Some((block, _)) => block.lines.push(line.to_string()),
                None if is_comment(line) => {
                    if file.blocks.is_empty() {
                        file.header.push(line.to_string());
                    }
                }
                None if strict => {
                    return Err(PackageError::ContentOutsideBlock { line: line_no });
                }
                None => {
                    tracing::debug!(line = line_no, "ignoring content outside of a block");
                }
            }
        }

        if let Some((block, line)) = current {
            return Err(PackageError::UnterminatedBlock {
                name: block.name,
                line,
            });
        }

        Ok(file)
    }

    /// Write the blocks back out.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        if !self.header.is_empty() {
            out.push('\n');
        }
        for block in &self.blocks {
            let name = block.name.to_ascii_uppercase();
            match &block.suffix {
                Some(suffix) => out.push_str(&format!("BEGIN {name} {suffix}\n")),
                None => out.push_str(&format!("BEGIN {name}\n")),
            }
            for line in &block.lines {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&format!("END {name}\n\n"));
        }
        out
    }

    /// First block with the given name.
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    /// Whether a block with the given name exists.
    pub fn has_block(&self, name: &str) -> bool {
        self.block(name).is_some()
    }

    /// The options block, created as the first block if missing.
    pub fn options_mut(&mut self) -> &mut Block {
        if !self.has_block("options") {
            self.blocks.insert(0, Block::new("options"));
        }
        self.block_mut_or_insert("options")
    }

    /// First block with the given name, created at the end if missing.
    pub fn block_mut_or_insert(&mut self, name: &str) -> &mut Block {
        let position = self
            .blocks
            .iter()
            .position(|b| b.name.eq_ignore_ascii_case(name));
        let index = match position {
            Some(i) => i,
            None => {
                self.blocks.push(Block::new(name));
                self.blocks.len() - 1
            }
        };
        &mut self.blocks[index]
    }
}

/// Strip matching single or double quotes from a file token.
fn unquote(token: &str) -> (&str, Option<char>) {
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return (&token[1..token.len() - 1], Some(quote));
        }
    }
    (token, None)
}

/// Keyword that introduces an external data file.
const OPEN_CLOSE: &str = "OPEN/CLOSE";

/// Rewrite the file operands of a content line for a move from `from` to `to`.
///
/// `FILEIN`/`FILEOUT` targets go straight into `to`; `OPEN/CLOSE` targets
/// keep their path below the model directory. Returns `None` when the line
/// has no file operand.
fn relocate_line(line: &str, from: &str, to: &str) -> Option<String> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    let mut changed = false;
    for i in 0..tokens.len().saturating_sub(1) {
        let keyword = tokens[i].to_ascii_uppercase();
        let (name, quote) = unquote(&tokens[i + 1]);
        let moved = match keyword.as_str() {
            "FILEIN" | "FILEOUT" => relocate_filename(to, name),
            OPEN_CLOSE => relocate_external(from, to, name),
            _ => continue,
        };
        tokens[i + 1] = match quote {
            Some(q) => format!("{q}{moved}{q}"),
            None => moved,
        };
        changed = true;
    }
    changed.then(|| tokens.join(" "))
}

/// The `FILEIN` target of an options line, if it has one.
fn filein_target(line: &str) -> Option<(&str, &str)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 || !tokens[1].eq_ignore_ascii_case("FILEIN") {
        return None;
    }
    Some((tokens[0], unquote(tokens[2]).0))
}

/// A package whose data is a [`BlockFile`].
///
/// This is the representation every schema-declared type gets from the
/// default factory. It checks the expected layout, reports referenced
/// files and required blocks, and rewrites file operands on relocation.
#[derive(Debug, Clone)]
pub struct BlockPackage {
    structure: PackageStructure,
    version: String,
    file: BlockFile,
}

impl BlockPackage {
    /// Create an empty package for a structure.
    ///
    /// Array-layout packages start with `READASARRAYS` in their options.
    pub fn new(structure: &PackageStructure, version: &str) -> Self {
        let mut file = BlockFile::default();
        if structure.layout == Layout::Array {
            file.block_mut_or_insert("options")
                .lines
                .push(READ_AS_ARRAYS.to_string());
        }
        Self {
            structure: structure.clone(),
            version: version.to_string(),
            file,
        }
    }

    /// The parsed blocks.
    pub fn file(&self) -> &BlockFile {
        &self.file
    }

    fn reads_as_arrays(file: &BlockFile) -> bool {
        file.block("options")
            .is_some_and(|options| options.has_keyword(READ_AS_ARRAYS))
    }
}

impl PackageData for BlockPackage {
    fn parse(&mut self, text: &str, strict: bool) -> Result<LoadOutcome, PackageError> {
        let file = BlockFile::parse(text, strict)?;
        let arrays = Self::reads_as_arrays(&file);
        match (self.structure.layout, arrays) {
            (Layout::List, true) => {
                return Ok(LoadOutcome::LayoutMismatch {
                    reason: format!("{READ_AS_ARRAYS} found in options"),
                })
            }
            (Layout::Array, false) => {
                return Ok(LoadOutcome::LayoutMismatch {
                    reason: format!("{READ_AS_ARRAYS} missing from options"),
                })
            }
            _ => {}
        }
        self.file = file;
        Ok(LoadOutcome::Loaded)
    }

    fn render(&self) -> String {
        self.file.render()
    }

    fn is_valid(&self) -> bool {
        self.structure
            .required_blocks
            .iter()
            .all(|name| self.file.has_block(name))
    }

    fn referenced_files(&self) -> Vec<FileReference> {
        let Some(options) = self.file.block("options") else {
            return Vec::new();
        };
        options
            .lines
            .iter()
            .filter_map(|line| {
                let (code, filename) = filein_target(line)?;
                let package_type = PackageType::from_record_code(code, &self.version).ok()?;
                Some(FileReference {
                    package_type,
                    filename: filename.to_string(),
                })
            })
            .collect()
    }

    fn relocate(&mut self, from: &str, to: &str) {
        for block in &mut self.file.blocks {
            if let Some(moved) = block
                .suffix
                .as_deref()
                .and_then(|s| relocate_line(s, from, to))
            {
                block.suffix = Some(moved);
            }
            for line in &mut block.lines {
                if let Some(moved) = relocate_line(line, from, to) {
                    *line = moved;
                }
            }
        }
    }

    /// Appends `<TYPE>6 FILEIN <file>` to the options block unless the file
    /// is already referenced.
    fn add_reference(&mut self, package_type: &PackageType, filename: &str) {
        let options = self.file.options_mut();
        let present = options
            .lines
            .iter()
            .filter_map(|line| filein_target(line))
            .any(|(_, target)| target == filename);
        if !present {
            let code = package_type.record_code(&self.version);
            options.lines.push(format!("{code} FILEIN {filename}"));
        }
    }

    fn remove_reference(&mut self, filename: &str) {
        if let Some(options) = self.file.blocks.iter_mut().find(|b| b.name == "options") {
            options
                .lines
                .retain(|line| filein_target(line).map_or(true, |(_, target)| target != filename));
        }
    }

    fn external_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        for block in &self.file.blocks {
            for line in &block.lines {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                for pair in tokens.windows(2) {
                    if pair[0].eq_ignore_ascii_case(OPEN_CLOSE) {
                        files.push(unquote(pair[1]).0.to_string());
                    }
                }
            }
        }
        files
    }
}
