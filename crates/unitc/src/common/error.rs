//! Error types and diagnostic reporting

use std::path::PathBuf;

use codespan_reporting::diagnostic::{Diagnostic as Report, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use super::diagnostic::{Diagnostic, DiagnosticSink, Severity};
use super::Span;

/// Fatal problems with the units description. Any of these aborts catalog
/// construction, so no program analysis can take place.
#[derive(Error, Debug)]
pub enum UnitsError {
    #[error("units file '{}' could not be found", path.display())]
    NotFound { path: PathBuf },

    #[error("units file '{}' could not be read: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at {span}: {message}")]
    Syntax { message: String, span: Span },

    #[error("unit name or symbol '{name}' is declared more than once")]
    DuplicateUnit { name: String, span: Span },

    #[error("unknown unit '{name}'")]
    UnknownUnit { name: String, span: Span },

    #[error("compound unit '{unit}' uses scaled unit '{term}'; compound terms must be base or compound units")]
    IncoherentCompound { unit: String, term: String, span: Span },

    #[error("cannot convert between '{from}' and '{to}': their dimensions differ")]
    DimensionMismatch { from: String, to: String, span: Span },

    #[error("conversion factor {factor} must be finite and greater than zero")]
    InvalidFactor { factor: f64, span: Span },

    #[error("inconsistent conversion cycle between '{from}' and '{to}': factor {expected} vs {found}")]
    InconsistentCycle {
        from: String,
        to: String,
        expected: f64,
        found: f64,
    },
}

impl UnitsError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn unknown_unit(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownUnit {
            name: name.into(),
            span,
        }
    }

    pub fn duplicate(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateUnit {
            name: name.into(),
            span,
        }
    }

    /// Location inside the units file, when the error has one
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::DuplicateUnit { span, .. }
            | Self::UnknownUnit { span, .. }
            | Self::IncoherentCompound { span, .. }
            | Self::DimensionMismatch { span, .. }
            | Self::InvalidFactor { span, .. } => Some(*span),
            Self::NotFound { .. } | Self::Unreadable { .. } | Self::InconsistentCycle { .. } => None,
        }
    }
}

pub type UnitsResult<T> = Result<T, UnitsError>;

/// Conditions that stop program analysis before or during the pre-pass
#[derive(Error, Debug)]
pub enum SemaError {
    #[error("function '{second}' is tagged as entry point, but '{first}' already is")]
    DuplicateEntryPoint {
        first: String,
        second: String,
        span: Span,
    },

    #[error("program has no entry point")]
    MissingEntryPoint,
}

impl SemaError {
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::DuplicateEntryPoint { span, .. } => Some(*span),
            Self::MissingEntryPoint => None,
        }
    }
}

pub type SemaResult<T> = Result<T, SemaError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report(&self, file_id: usize, diagnostic: &Diagnostic) {
        let report = match diagnostic.severity {
            Severity::Error => Report::error(),
            Severity::Warning => Report::warning(),
        };
        let report = report
            .with_message(diagnostic.kind.title())
            .with_code(diagnostic.kind.code())
            .with_labels(vec![
                Label::primary(file_id, diagnostic.span.start..diagnostic.span.end)
                    .with_message(&diagnostic.message),
            ]);

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &report);
    }

    pub fn report_units_error(&self, file_id: Option<usize>, error: &UnitsError) {
        let mut report = Report::error().with_message(error.to_string());
        if let (Some(file_id), Some(span)) = (file_id, error.span()) {
            report = report.with_labels(vec![Label::primary(file_id, span.start..span.end)]);
        }

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &report);
    }

    pub fn report_fatal(&self, file_id: Option<usize>, error: &SemaError) {
        let mut report = Report::error().with_message(error.to_string());
        if let (Some(file_id), Some(span)) = (file_id, error.span()) {
            report = report.with_labels(vec![Label::primary(file_id, span.start..span.end)]);
        }

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &report);
    }

    /// Sink that renders every diagnostic against `file_id`
    pub fn sink(&self, file_id: usize) -> FileSink<'_> {
        FileSink {
            reporter: self,
            file_id,
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders diagnostics through a [`DiagnosticReporter`]
pub struct FileSink<'r> {
    reporter: &'r DiagnosticReporter,
    file_id: usize,
}

impl DiagnosticSink for FileSink<'_> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.reporter.report(self.file_id, diagnostic);
    }
}
