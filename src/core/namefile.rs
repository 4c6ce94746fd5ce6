//! core::namefile
//!
//! Model and simulation name files.
//!
//! # Model name file
//!
//! ```text
//! BEGIN options
//!   LIST flow.lst
//! END options
//!
//! BEGIN packages
//!   DIS6  flow.dis  dis
//!   WEL6  flow.wel  wel_0
//! END packages
//! ```
//!
//! # Simulation name file
//!
//! ```text
//! BEGIN timing
//!   TDIS6 sim.tdis
//! END timing
//!
//! BEGIN models
//!   gwf6 flow.nam flow
//! END models
//!
//! BEGIN exchanges
//! END exchanges
//!
//! BEGIN solutiongroup 1
//!   IMS6 sim.ims flow
//! END solutiongroup
//! ```
//!
//! The name file is the serialized projection of a container's membership:
//! containers keep it in sync as packages are registered, removed and
//! relocated.

use thiserror::Error;

use super::files::{file_basename, relocate_filename};
use super::package::{Block, BlockFile, PackageError};
use super::types::{PackageType, TypeError};

/// Errors from reading a name file.
#[derive(Debug, Error)]
pub enum NameFileError {
    #[error(transparent)]
    Framing(#[from] PackageError),

    #[error("malformed record in {block} block: '{line}'")]
    MalformedRecord { block: String, line: String },
}

fn malformed(block: &str, line: &str) -> NameFileError {
    NameFileError::MalformedRecord {
        block: block.to_string(),
        line: line.to_string(),
    }
}

/// One `CODE filename [name]` record of a model name file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    /// Upper-case record code with version suffix (`WEL6`)
    pub code: String,
    /// File name relative to the simulation working directory
    pub filename: String,
    /// Instance name, if written
    pub name: Option<String>,
}

impl NameRecord {
    pub fn new(code: impl Into<String>, filename: impl Into<String>, name: Option<String>) -> Self {
        Self {
            code: code.into().to_ascii_uppercase(),
            filename: filename.into(),
            name,
        }
    }

    /// The package type the record code names.
    pub fn package_type(&self, version: &str) -> Result<PackageType, TypeError> {
        PackageType::from_record_code(&self.code, version)
    }

    fn name_matches(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [code, filename] => Some(Self::new(*code, *filename, None)),
            [code, filename, name, ..] => Some(Self::new(*code, *filename, Some(name.to_string()))),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match &self.name {
            Some(name) => format!("{}  {}  {}", self.code, self.filename, name),
            None => format!("{}  {}", self.code, self.filename),
        }
    }
}

/// Name file of a model: options, listing file and package records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelNameFile {
    /// Option lines other than `LIST`
    pub options: Vec<String>,
    /// Listing output file
    pub list_file: Option<String>,
    /// Package records in file order
    pub records: Vec<NameRecord>,
}

impl ModelNameFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse model name file text.
    pub fn parse(text: &str, strict: bool) -> Result<Self, NameFileError> {
        let file = BlockFile::parse(text, strict)?;
        let mut name_file = Self::new();

        if let Some(options) = file.block("options") {
            for line in &options.lines {
                let mut tokens = line.split_whitespace();
                match tokens.next() {
                    Some(keyword) if keyword.eq_ignore_ascii_case("LIST") => {
                        let list = tokens.next().ok_or_else(|| malformed("options", line))?;
                        name_file.list_file = Some(list.to_string());
                    }
                    _ => name_file.options.push(line.clone()),
                }
            }
        }

        if let Some(packages) = file.block("packages") {
            for line in &packages.lines {
                let record = NameRecord::parse(line).ok_or_else(|| malformed("packages", line))?;
                name_file.records.push(record);
            }
        }

        Ok(name_file)
    }

    /// Render as name file text.
    pub fn render(&self) -> String {
        let mut file = BlockFile::default();
        let options = file.block_mut_or_insert("options");
        if let Some(list) = &self.list_file {
            options.lines.push(format!("LIST  {list}"));
        }
        options.lines.extend(self.options.iter().cloned());
        file.block_mut_or_insert("packages")
            .lines
            .extend(self.records.iter().map(NameRecord::render));
        file.render()
    }

    /// Record with the given instance name (case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Option<&NameRecord> {
        self.records.iter().find(|r| r.name_matches(name))
    }

    /// Record for the given file name.
    pub fn find_by_filename(&self, filename: &str) -> Option<&NameRecord> {
        self.records.iter().find(|r| r.filename == filename)
    }

    /// Insert or replace a record.
    ///
    /// A record with the same instance name is replaced first; failing that,
    /// one with the same file name; otherwise the record is appended.
    pub fn update_record(&mut self, record: NameRecord) {
        let by_name = record
            .name
            .as_deref()
            .and_then(|name| self.records.iter().position(|r| r.name_matches(name)));
        let position =
            by_name.or_else(|| self.records.iter().position(|r| r.filename == record.filename));
        match position {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
    }

    /// Remove the record for an instance name, or failing that a file name.
    pub fn remove_record(&mut self, name: &str, filename: &str) -> bool {
        let position = self
            .records
            .iter()
            .position(|r| r.name_matches(name))
            .or_else(|| self.records.iter().position(|r| r.filename == filename));
        match position {
            Some(i) => {
                self.records.remove(i);
                true
            }
            None => false,
        }
    }

    /// Move the listing file and every record into `dir`, keeping file names.
    pub fn relocate(&mut self, dir: &str) {
        if let Some(list) = &self.list_file {
            self.list_file = Some(relocate_filename(dir, list));
        }
        for record in &mut self.records {
            record.filename = relocate_filename(dir, &record.filename);
        }
    }
}

/// A `gwf6 flow.nam flow` entry in the simulation name file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    /// Model type, lowercase (`gwf6`)
    pub model_type: String,
    /// Model name file, relative to the simulation working directory
    pub filename: String,
    /// Model name
    pub name: String,
}

impl ModelRecord {
    /// Whether this record belongs to the named model: the name file's
    /// base name (case-insensitive) or the recorded name (exact) match.
    pub fn matches(&self, model_name: &str) -> bool {
        let base = file_basename(&self.filename);
        let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
        stem.eq_ignore_ascii_case(model_name) || self.name == model_name
    }
}

/// An exchange entry: `GWF6-GWF6 flow.gwfgwf flow1 flow2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub exchange_type: String,
    pub filename: String,
    pub model_a: String,
    pub model_b: String,
}

/// A solution entry: `IMS6 sim.ims flow transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionRecord {
    /// Upper-case record code (`IMS6`)
    pub code: String,
    pub filename: String,
    /// Models the solution applies to
    pub models: Vec<String>,
}

/// A `BEGIN solutiongroup N` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionGroup {
    pub number: u32,
    pub mxiter: Option<u32>,
    pub solutions: Vec<SolutionRecord>,
}

impl SolutionGroup {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            mxiter: None,
            solutions: Vec::new(),
        }
    }
}

/// The simulation name file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationNameFile {
    /// Option lines, verbatim
    pub options: Vec<String>,
    /// Time discretization file
    pub tdis: Option<String>,
    pub models: Vec<ModelRecord>,
    pub exchanges: Vec<ExchangeRecord>,
    pub solution_groups: Vec<SolutionGroup>,
}

impl SimulationNameFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse simulation name file text.
    pub fn parse(text: &str, strict: bool) -> Result<Self, NameFileError> {
        let file = BlockFile::parse(text, strict)?;
        let mut name_file = Self::new();

        for block in &file.blocks {
            match block.name.as_str() {
                "options" => name_file.options.extend(block.lines.iter().cloned()),
                "timing" => name_file.tdis = parse_timing(block)?,
                "models" => {
                    for line in &block.lines {
                        let tokens: Vec<&str> = line.split_whitespace().collect();
                        let [model_type, filename, name, ..] = tokens.as_slice() else {
                            return Err(malformed("models", line));
                        };
                        name_file.models.push(ModelRecord {
                            model_type: model_type.to_ascii_lowercase(),
                            filename: filename.to_string(),
                            name: name.to_string(),
                        });
                    }
                }
                "exchanges" => {
                    for line in &block.lines {
                        let tokens: Vec<&str> = line.split_whitespace().collect();
                        let [exchange_type, filename, model_a, model_b, ..] = tokens.as_slice()
                        else {
                            return Err(malformed("exchanges", line));
                        };
                        name_file.exchanges.push(ExchangeRecord {
                            exchange_type: exchange_type.to_ascii_uppercase(),
                            filename: filename.to_string(),
                            model_a: model_a.to_string(),
                            model_b: model_b.to_string(),
                        });
                    }
                }
                "solutiongroup" => name_file.solution_groups.push(parse_solution_group(block)?),
                other => {
                    tracing::debug!(block = other, "ignoring unknown simulation name file block");
                }
            }
        }

        Ok(name_file)
    }

    /// Render as name file text.
    pub fn render(&self) -> String {
        let mut file = BlockFile::default();
        file.block_mut_or_insert("options")
            .lines
            .extend(self.options.iter().cloned());

        let timing = file.block_mut_or_insert("timing");
        if let Some(tdis) = &self.tdis {
            timing.lines.push(format!("TDIS6  {tdis}"));
        }

        file.block_mut_or_insert("models").lines.extend(
            self.models
                .iter()
                .map(|m| format!("{}  {}  {}", m.model_type, m.filename, m.name)),
        );

        file.block_mut_or_insert("exchanges").lines.extend(
            self.exchanges.iter().map(|e| {
                format!(
                    "{}  {}  {}  {}",
                    e.exchange_type, e.filename, e.model_a, e.model_b
                )
            }),
        );

        for group in &self.solution_groups {
            let mut block = Block::new("solutiongroup");
            block.suffix = Some(group.number.to_string());
            if let Some(mxiter) = group.mxiter {
                block.lines.push(format!("MXITER  {mxiter}"));
            }
            for solution in &group.solutions {
                let mut line = format!("{}  {}", solution.code, solution.filename);
                for model in &solution.models {
                    line.push_str("  ");
                    line.push_str(model);
                }
                block.lines.push(line);
            }
            file.blocks.push(block);
        }

        file.render()
    }

    /// Record for the named model.
    pub fn model_record(&self, model_name: &str) -> Option<&ModelRecord> {
        self.models.iter().find(|m| m.matches(model_name))
    }

    /// Add a model record, replacing one with the same name.
    pub fn add_model(&mut self, record: ModelRecord) {
        match self.models.iter().position(|m| m.name == record.name) {
            Some(i) => self.models[i] = record,
            None => self.models.push(record),
        }
    }

    /// Move the named model's name file into `dir`, keeping its file name.
    ///
    /// Returns `false` if no record matches the model.
    pub fn relocate_model(&mut self, model_name: &str, dir: &str) -> bool {
        match self.models.iter_mut().find(|m| m.matches(model_name)) {
            Some(record) => {
                record.filename = relocate_filename(dir, &record.filename);
                true
            }
            None => false,
        }
    }

    /// Set the time discretization file.
    pub fn set_timing(&mut self, filename: impl Into<String>) {
        self.tdis = Some(filename.into());
    }

    /// Insert or replace a solution in a solution group, creating the group
    /// if needed. Solutions are matched by file name.
    pub fn update_solution(&mut self, group: u32, solution: SolutionRecord) {
        let index = match self
            .solution_groups
            .iter()
            .position(|g| g.number == group)
        {
            Some(i) => i,
            None => {
                self.solution_groups.push(SolutionGroup::new(group));
                self.solution_groups.len() - 1
            }
        };
        let solutions = &mut self.solution_groups[index].solutions;
        match solutions.iter().position(|s| s.filename == solution.filename) {
            Some(i) => solutions[i] = solution,
            None => solutions.push(solution),
        }
    }

    /// Remove a solution by file name from every group.
    pub fn remove_solution(&mut self, filename: &str) -> bool {
        let mut removed = false;
        for group in &mut self.solution_groups {
            let before = group.solutions.len();
            group.solutions.retain(|s| s.filename != filename);
            removed |= before != group.solutions.len();
        }
        removed
    }

    /// Every solution record, in group order.
    pub fn solutions(&self) -> impl Iterator<Item = &SolutionRecord> {
        self.solution_groups.iter().flat_map(|g| g.solutions.iter())
    }
}

fn parse_timing(block: &Block) -> Result<Option<String>, NameFileError> {
    let mut tdis = None;
    for line in &block.lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [code, filename, ..] if code.to_ascii_uppercase().starts_with("TDIS") => {
                tdis = Some(filename.to_string());
            }
            _ => return Err(malformed("timing", line)),
        }
    }
    Ok(tdis)
}

fn parse_solution_group(block: &Block) -> Result<SolutionGroup, NameFileError> {
    let number = match &block.suffix {
        Some(suffix) => suffix
            .trim()
            .parse::<u32>()
            .map_err(|_| malformed("solutiongroup", suffix))?,
        None => 1,
    };
    let mut group = SolutionGroup::new(number);
    for line in &block.lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [keyword, value] if keyword.eq_ignore_ascii_case("MXITER") => {
                let mxiter = value
                    .parse::<u32>()
                    .map_err(|_| malformed("solutiongroup", line))?;
                group.mxiter = Some(mxiter);
            }
            [code, filename, models @ ..] => group.solutions.push(SolutionRecord {
                code: code.to_ascii_uppercase(),
                filename: filename.to_string(),
                models: models.iter().map(|m| m.to_string()).collect(),
            }),
            _ => return Err(malformed("solutiongroup", line)),
        }
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL_NAM: &str = "\
BEGIN options
  LIST flow.lst
  SAVE_FLOWS
END options

BEGIN packages
  WEL6 flow.wel wel_0
  DIS6 flow.dis dis
  OC6  flow.oc
END packages
";

    const SIM_NAM: &str = "\
BEGIN options
END options
BEGIN timing
  TDIS6 sim.tdis
END timing
BEGIN models
  GWF6 models/flow/flow.nam flow
  gwt6 trans.nam trans
END models
BEGIN exchanges
  GWF6-GWT6 sim.gwfgwt flow trans
END exchanges
BEGIN solutiongroup 1
  MXITER 5
  IMS6 flow.ims flow
  IMS6 trans.ims trans
END solutiongroup
";

    mod model_name_file {
        use super::*;

        #[test]
        fn parse_reads_list_options_and_records() {
            let nam = ModelNameFile::parse(MODEL_NAM, true).unwrap();
            assert_eq!(nam.list_file.as_deref(), Some("flow.lst"));
            assert_eq!(nam.options, vec!["SAVE_FLOWS"]);
            assert_eq!(nam.records.len(), 3);
            assert_eq!(nam.records[0].name.as_deref(), Some("wel_0"));
            assert_eq!(nam.records[2].name, None);
            assert_eq!(nam.records[1].package_type("6").unwrap().as_str(), "dis");
        }

        #[test]
        fn render_then_parse_is_stable() {
            let nam = ModelNameFile::parse(MODEL_NAM, true).unwrap();
            let again = ModelNameFile::parse(&nam.render(), true).unwrap();
            assert_eq!(nam, again);
        }

        #[test]
        fn malformed_record_is_fatal() {
            let text = "BEGIN packages\n  DIS6\nEND packages\n";
            assert!(matches!(
                ModelNameFile::parse(text, false),
                Err(NameFileError::MalformedRecord { .. })
            ));
        }

        #[test]
        fn update_replaces_by_name_then_filename() {
            let mut nam = ModelNameFile::parse(MODEL_NAM, true).unwrap();
            nam.update_record(NameRecord::new("WEL6", "other.wel", Some("WEL_0".into())));
            assert_eq!(nam.records.len(), 3);
            assert_eq!(nam.records[0].filename, "other.wel");

            nam.update_record(NameRecord::new("OC6", "flow.oc", Some("oc".into())));
            assert_eq!(nam.records.len(), 3);
            assert_eq!(nam.records[2].name.as_deref(), Some("oc"));

            nam.update_record(NameRecord::new("NPF6", "flow.npf", Some("npf".into())));
            assert_eq!(nam.records.len(), 4);
        }

        #[test]
        fn remove_record() {
            let mut nam = ModelNameFile::parse(MODEL_NAM, true).unwrap();
            assert!(nam.remove_record("wel_0", "x"));
            assert!(nam.remove_record("oc", "flow.oc"));
            assert!(!nam.remove_record("npf", "flow.npf"));
            assert_eq!(nam.records.len(), 1);
        }

        #[test]
        fn relocate_moves_list_and_records() {
            let mut nam = ModelNameFile::parse(MODEL_NAM, true).unwrap();
            nam.relocate("sub/dir");
            nam.relocate("sub/dir");
            assert_eq!(nam.list_file.as_deref(), Some("sub/dir/flow.lst"));
            assert!(nam
                .records
                .iter()
                .all(|r| r.filename.starts_with("sub/dir/") && !r.filename.contains("sub/dir/sub")));
        }
    }

    mod simulation_name_file {
        use super::*;

        #[test]
        fn parse_all_blocks() {
            let nam = SimulationNameFile::parse(SIM_NAM, true).unwrap();
            assert_eq!(nam.tdis.as_deref(), Some("sim.tdis"));
            assert_eq!(nam.models.len(), 2);
            assert_eq!(nam.models[0].model_type, "gwf6");
            assert_eq!(nam.exchanges[0].model_b, "trans");
            assert_eq!(nam.solution_groups[0].mxiter, Some(5));
            assert_eq!(nam.solutions().count(), 2);
        }

        #[test]
        fn render_then_parse_is_stable() {
            let nam = SimulationNameFile::parse(SIM_NAM, true).unwrap();
            let again = SimulationNameFile::parse(&nam.render(), true).unwrap();
            assert_eq!(nam, again);
        }

        #[test]
        fn model_matching_by_base_name_or_exact_name() {
            let record = ModelRecord {
                model_type: "gwf6".into(),
                filename: "a/FLOW.nam".into(),
                name: "Model1".into(),
            };
            assert!(record.matches("flow"));
            assert!(record.matches("Model1"));
            assert!(!record.matches("model1"));
        }

        #[test]
        fn relocate_model_preserves_file_name() {
            let mut nam = SimulationNameFile::parse(SIM_NAM, true).unwrap();
            assert!(nam.relocate_model("flow", "."));
            assert_eq!(nam.models[0].filename, "flow.nam");
            assert!(nam.relocate_model("trans", "t"));
            assert_eq!(nam.models[1].filename, "t/trans.nam");
            assert!(!nam.relocate_model("missing", "t"));
        }

        #[test]
        fn solutions_update_by_filename() {
            let mut nam = SimulationNameFile::new();
            nam.update_solution(
                1,
                SolutionRecord {
                    code: "IMS6".into(),
                    filename: "sim.ims".into(),
                    models: vec!["a".into()],
                },
            );
            nam.update_solution(
                1,
                SolutionRecord {
                    code: "IMS6".into(),
                    filename: "sim.ims".into(),
                    models: vec!["a".into(), "b".into()],
                },
            );
            assert_eq!(nam.solution_groups.len(), 1);
            assert_eq!(nam.solution_groups[0].solutions[0].models.len(), 2);
            assert!(nam.remove_solution("sim.ims"));
            assert_eq!(nam.solutions().count(), 0);
        }

        #[test]
        fn bad_solution_group_number() {
            let text = "BEGIN solutiongroup x\nEND solutiongroup\n";
            assert!(SimulationNameFile::parse(text, false).is_err());
        }
    }
}
