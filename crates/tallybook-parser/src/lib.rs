//! Parser for the tallybook ledger language.
//!
//! Turns source text into a stream of [`Directive`]s plus the undated
//! bookkeeping (`option` / `include` / `plugin` records and the pushed-tag
//! context), accumulating every error along the way instead of stopping at
//! the first one.
//!
//! # Pipeline
//!
//! ```text
//! source → lexer (logos DFA + indent pass) → grammar engine → Builder
//! ```
//!
//! The grammar engine is a recursive-descent parser that constructs nothing
//! itself: every reduction calls the matching method on a [`Builder`], and
//! a refused reduction is recorded and recovered at the next end of line.
//! [`parse`] and [`parse_with`] drive the reference [`LedgerBuilder`];
//! embedders with their own sink implement [`Builder`] and call
//! [`run_parser`].
//!
//! # Example
//!
//! ```
//! let source = r#"
//! 2024-01-15 * "Coffee Shop" "Morning coffee"
//!   Expenses:Food:Coffee  5.00 USD
//!   Assets:Cash
//! "#;
//!
//! let result = tallybook_parser::parse(source);
//! assert!(result.success());
//! assert_eq!(result.directives.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod error;
mod expr;
mod grammar;
pub mod lexer;
mod location;

pub use builder::{
    BuildError, Builder, CompoundAmount, CostComp, LedgerBuilder, TagContext, TxnFields,
};
pub use error::{ParseError, ParseErrorKind, Severity};
pub use expr::EvalOptions;
pub use location::{LineIndex, SourceLoc, Span, Spanned};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tallybook_core::{Directive, Options};
use thiserror::Error;

/// A cooperative cancellation handle.
///
/// The driver polls it at line boundaries; a cancelled parse returns the
/// partial result with [`ParseResult::incomplete`] set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A new, un-cancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Driver configuration.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Name reported in locations and errors; defaults to `<string>`.
    pub filename: Option<String>,
    /// Arithmetic evaluator settings.
    pub eval: EvalOptions,
    /// Cooperative cancellation, polled at line boundaries.
    pub cancel: Option<CancelFlag>,
    /// Include the set of acceptable tokens in grammar error messages.
    pub verbose_errors: bool,
}

impl ParseOptions {
    /// Defaults with verbose error reporting on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            verbose_errors: true,
            ..Self::default()
        }
    }

    /// Set the reported filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the cancellation handle.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Failure to even start a parse.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Everything one parse produced.
#[derive(Debug)]
pub struct ParseResult {
    /// Dated directives, in source order.
    pub directives: Vec<Spanned<Directive>>,
    /// The typed option table.
    pub options: Options,
    /// `include` records, in source order. Never resolved here.
    pub includes: Vec<(String, Span)>,
    /// `plugin` records: name and optional configuration string.
    pub plugins: Vec<(String, Option<String>, Span)>,
    /// Accumulated errors, in detection order.
    pub errors: Vec<ParseError>,
    /// Whether the parse stopped early (cancellation).
    pub incomplete: bool,
}

impl ParseResult {
    /// Whether the parse completed without any error-severity record.
    /// Warnings and deprecations do not fail a parse.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.incomplete && self.errors.iter().all(|e| e.severity != Severity::Error)
    }

    /// Whether the error list is completely empty.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && !self.incomplete
    }

    /// The directives stripped of their spans.
    #[must_use]
    pub fn into_directives(self) -> Vec<Directive> {
        self.directives.into_iter().map(Spanned::into_inner).collect()
    }
}

/// Parse source text with default options.
#[must_use]
pub fn parse(source: &str) -> ParseResult {
    parse_with(source, ParseOptions::new())
}

/// Parse source text with explicit options.
#[must_use]
pub fn parse_with(source: &str, options: ParseOptions) -> ParseResult {
    let filename = options.filename.clone().unwrap_or_else(|| "<string>".to_string());
    let mut builder = LedgerBuilder::new(&filename);
    let completed = run_parser(source, &options, &mut builder);
    builder.finalize(!completed)
}

/// Read and parse a file. The only I/O in this crate; a read failure is
/// the one error that surfaces as `Err` instead of accumulating.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParseResult, LoadError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = ParseOptions::new().with_filename(path.to_string_lossy());
    Ok(parse_with(&source, options))
}

/// Run the grammar over `source`, driving a caller-supplied [`Builder`].
///
/// Returns `true` when end of input was reached, `false` when the parse
/// was cancelled. All output, including errors, flows through the builder.
pub fn run_parser<B: Builder>(source: &str, options: &ParseOptions, builder: &mut B) -> bool {
    grammar::parse_source(source, options, builder)
}
