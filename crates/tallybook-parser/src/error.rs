//! Parse error types.
//!
//! Errors never abort a parse; they accumulate in source order on the
//! builder and come back on the result. Each record knows its severity:
//! deprecated-but-accepted syntax and option-validation problems are kept
//! distinct from real errors so tools can warn without failing.

use std::fmt;

use crate::location::{SourceLoc, Span};

/// How serious an error record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A real problem: the construct was dropped or mangled.
    Error,
    /// Accepted input that is probably not what the author meant.
    Warning,
    /// Accepted legacy syntax.
    Deprecation,
}

/// Kinds of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The lexer could not tokenize the input; carries the bad lexeme.
    Lex(String),
    /// The grammar met a token it could not shift. `expected` is filled in
    /// when verbose error reporting is on.
    UnexpectedToken {
        /// Name of the offending token.
        found: String,
        /// What would have been accepted, if known.
        expected: Option<String>,
    },
    /// Input ended inside a construct.
    UnexpectedEof,
    /// A date literal with impossible components.
    InvalidDate(String),
    /// A number literal the decimal type rejected.
    InvalidNumber(String),
    /// Division by zero inside an arithmetic expression.
    DivisionByZero,
    /// A builder callback refused the reduction.
    Builder(String),
    /// An `option` directive with a bad name or value.
    InvalidOption(String),
    /// Legacy syntax that was accepted anyway.
    Deprecated(String),
    /// A cost annotation repeated a component kind; the last one won.
    DuplicateCostComponent(String),
    /// The backing reader failed mid-parse.
    Io(String),
}

impl ParseErrorKind {
    /// The default severity for this kind.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Deprecated(_) => Severity::Deprecation,
            Self::InvalidOption(_) | Self::DuplicateCostComponent(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(lexeme) => write!(f, "cannot tokenize input '{lexeme}'"),
            Self::UnexpectedToken {
                found,
                expected: Some(expected),
            } => write!(f, "unexpected {found}, expected {expected}"),
            Self::UnexpectedToken {
                found,
                expected: None,
            } => write!(f, "unexpected {found}"),
            Self::UnexpectedEof => write!(f, "unexpected end of file"),
            Self::InvalidDate(s) => write!(f, "invalid date '{s}'"),
            Self::InvalidNumber(s) => write!(f, "invalid number '{s}'"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Builder(msg) => write!(f, "{msg}"),
            Self::InvalidOption(msg) => write!(f, "{msg}"),
            Self::Deprecated(msg) => write!(f, "deprecated syntax: {msg}"),
            Self::DuplicateCostComponent(what) => {
                write!(f, "duplicate {what} in cost specification, keeping the last")
            }
            Self::Io(msg) => write!(f, "read error: {msg}"),
        }
    }
}

/// One accumulated error record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// How serious it is.
    pub severity: Severity,
    /// Where it happened.
    pub loc: SourceLoc,
    /// The byte range of the offending input.
    pub span: Span,
    /// Optional surrounding context, e.g. the directive being parsed.
    pub context: Option<String>,
}

impl ParseError {
    /// Create a record with the kind's default severity.
    #[must_use]
    pub fn new(kind: ParseErrorKind, loc: SourceLoc, span: Span) -> Self {
        let severity = kind.severity();
        Self {
            kind,
            severity,
            loc,
            span,
            context: None,
        }
    }

    /// Attach context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The record's message without the location prefix.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// 1-based line of the offending input.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.loc.line
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, " (in {ctx})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32) -> SourceLoc {
        SourceLoc::new("<string>", line)
    }

    #[test]
    fn default_severities() {
        assert_eq!(
            ParseErrorKind::Lex("~~~".into()).severity(),
            Severity::Error
        );
        assert_eq!(
            ParseErrorKind::Deprecated("pipe".into()).severity(),
            Severity::Deprecation
        );
        assert_eq!(
            ParseErrorKind::DuplicateCostComponent("date".into()).severity(),
            Severity::Warning
        );
    }

    #[test]
    fn display_includes_location() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: "'{'".into(),
                expected: Some("end of line".into()),
            },
            loc(12),
            Span::new(5, 6),
        )
        .with_context("balance directive");
        let text = err.to_string();
        assert!(text.starts_with("<string>:12:"));
        assert!(text.contains("unexpected '{'"));
        assert!(text.contains("balance directive"));
    }
}
