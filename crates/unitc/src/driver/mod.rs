//! Driver: file loading, analysis pipeline and exit status

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::ast::Program;
use crate::common::{DiagnosticReporter, SemaError, StderrSink, UnitsError};
use crate::sema::{Analysis, SemanticAnalyzer};
use crate::units::{load_units_file, UnitCatalog};

/// Options mapped from the command line
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub dump_units: bool,
    pub dump_results: bool,
    pub verbose: bool,
}

/// Process exit status of a `unitc` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    UnitsNotFound,
    UnitsUnreadable,
    UnitsInvalid,
    ProgramInvalid,
    ProgramUnreadable,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::UnitsNotFound => 1,
            ExitStatus::UnitsUnreadable => 2,
            ExitStatus::UnitsInvalid => 3,
            ExitStatus::ProgramInvalid => 4,
            ExitStatus::ProgramUnreadable => 5,
        }
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Units(#[from] UnitsError),

    #[error("program tree '{}' could not be read: {source}", path.display())]
    ProgramUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program tree '{}' is malformed: {source}", path.display())]
    ProgramMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sema(#[from] SemaError),
}

impl DriverError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            DriverError::Units(UnitsError::NotFound { .. }) => ExitStatus::UnitsNotFound,
            DriverError::Units(UnitsError::Unreadable { .. }) => ExitStatus::UnitsUnreadable,
            DriverError::Units(_) => ExitStatus::UnitsInvalid,
            DriverError::ProgramUnreadable { .. } | DriverError::ProgramMalformed { .. } => {
                ExitStatus::ProgramUnreadable
            }
            DriverError::Sema(_) => ExitStatus::ProgramInvalid,
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Loads inputs, runs the analyzer and renders everything it finds
pub struct Pipeline {
    config: DriverConfig,
    reporter: DiagnosticReporter,
    units_file: Option<usize>,
    source_file: Option<usize>,
}

impl Pipeline {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            reporter: DiagnosticReporter::new(),
            units_file: None,
            source_file: None,
        }
    }

    pub fn load_catalog(&mut self, path: &Path) -> DriverResult<UnitCatalog> {
        let (source, description) = match load_units_file(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                // syntax errors still get rendered against the file
                if let Ok(text) = std::fs::read_to_string(path) {
                    self.units_file = Some(self.reporter.add_file(path.display().to_string(), text));
                }
                return Err(err.into());
            }
        };
        self.units_file = Some(self.reporter.add_file(path.display().to_string(), source));

        let catalog = UnitCatalog::from_description(&description)?;
        info!(path = %path.display(), units = catalog.units().count(), "loaded units");
        Ok(catalog)
    }

    pub fn load_program(&self, path: &Path) -> DriverResult<Program> {
        let text = std::fs::read_to_string(path).map_err(|source| DriverError::ProgramUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Program::from_json(&text).map_err(|source| DriverError::ProgramMalformed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), items = program.items.len(), "loaded program tree");
        Ok(program)
    }

    /// Register the program's source text so diagnostics can quote it
    pub fn attach_source(&mut self, path: &Path) -> io::Result<()> {
        let text = std::fs::read_to_string(path)?;
        self.source_file = Some(self.reporter.add_file(path.display().to_string(), text));
        Ok(())
    }

    pub fn analyze(&self, catalog: &UnitCatalog, program: &Program) -> DriverResult<Analysis> {
        Ok(SemanticAnalyzer::new(catalog).analyze(program)?)
    }

    /// Run the whole check and report; never panics on bad input
    pub fn check(&mut self, units: &Path, program: &Path) -> ExitStatus {
        match self.run(units, program) {
            Ok(status) => status,
            Err(err) => {
                self.report_error(&err);
                err.exit_status()
            }
        }
    }

    fn run(&mut self, units: &Path, program: &Path) -> DriverResult<ExitStatus> {
        let catalog = self.load_catalog(units)?;
        if self.config.dump_units {
            eprintln!("=== Units ===");
            eprint!("{}", describe_catalog(&catalog));
            eprintln!("=== End Units ===\n");
        }

        let program = self.load_program(program)?;
        let analysis = self.analyze(&catalog, &program)?;

        match self.source_file {
            Some(file_id) => analysis.report(&mut self.reporter.sink(file_id)),
            None => analysis.report(&mut StderrSink),
        }

        if self.config.dump_results {
            eprintln!("=== Results ===");
            for (id, value) in analysis.results.sorted() {
                eprintln!("{id}: {value}");
            }
            eprintln!("=== End Results ===\n");
        }

        if self.config.verbose {
            eprintln!(
                "{} error(s), {} warning(s)",
                analysis.error_count(),
                analysis.diagnostics.len() - analysis.error_count()
            );
        }

        Ok(if analysis.valid {
            ExitStatus::Success
        } else {
            ExitStatus::ProgramInvalid
        })
    }

    fn report_error(&self, err: &DriverError) {
        match err {
            DriverError::Units(units) => self.reporter.report_units_error(self.units_file, units),
            DriverError::Sema(sema) => self.reporter.report_fatal(self.source_file, sema),
            other => eprintln!("error: {other}"),
        }
    }
}

/// Units, their dimensions and every conversion reachable from each
pub fn describe_catalog(catalog: &UnitCatalog) -> String {
    let symbols = catalog.base_symbols();
    let mut out = String::new();
    for unit in catalog.units() {
        let _ = writeln!(out, "{unit}: {}", unit.dimension.display_with(symbols));
        for (other, factor) in catalog.table().connected(&unit.name) {
            if other != unit.name {
                let _ = writeln!(out, "    -> {other} x {factor}");
            }
        }
    }
    out
}
