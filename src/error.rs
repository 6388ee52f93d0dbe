use std::fmt;

use logos::Span;
use miette::{Diagnostic, NamedSource};
use thiserror::Error;

use crate::parse::MAX_NESTING_DEPTH;

/// An error that may occur while parsing a schema source file.
///
/// Parsing stops at the first error, so each failed parse produces exactly one of these.
#[derive(Error, Diagnostic)]
#[error("line {line}: {kind}")]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: Box<ParseErrorKind>,
    line: usize,
    file: String,
    #[source_code]
    source_code: NamedSource,
}

/// The broad category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input ended where a token was required, including inside a string or block comment.
    Eof,
    /// A token did not match any production valid at that point.
    UnexpectedToken,
    /// A `package`, `import` or file option statement appeared after the first definition, or the
    /// package was declared twice.
    IllegalOrder,
    /// A field number, enum value number, extension bound or numeric option value was malformed
    /// or out of range.
    IllegalNumber,
    /// A group name did not start with a capital letter.
    InvalidGroupName,
    /// Messages, groups, enums or extend blocks were nested more deeply than the parser allows.
    NestingTooDeep,
}

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("expected {expected} in {context}, but reached end of input")]
    UnexpectedEof { expected: String, context: String },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("unterminated block comment")]
    UnterminatedComment {
        #[label("comment starts here")]
        span: Span,
    },
    #[error("unexpected '{found}' in {context}, expected {expected}")]
    UnexpectedToken {
        found: String,
        context: String,
        expected: String,
        #[label("found here")]
        span: Span,
    },
    #[error("unexpected '{statement}' after the first definition")]
    #[diagnostic(help(
        "package, import and file option statements must come before any message, enum, service or extend"
    ))]
    IllegalOrder {
        statement: String,
        #[label("found here")]
        span: Span,
    },
    #[error("multiple package names specified")]
    DuplicatePackage {
        #[label("defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("illegal number '{value}' in {context}: {reason}")]
    IllegalNumber {
        value: String,
        context: String,
        reason: &'static str,
        #[label("found here")]
        span: Span,
    },
    #[error("illegal id '{value}' in {context}: {reason}")]
    IllegalId {
        value: String,
        context: String,
        reason: &'static str,
        #[label("found here")]
        span: Span,
    },
    #[error("invalid group name '{name}'")]
    #[diagnostic(help(
        "group names must consist of a capital letter followed by letters, numbers and underscores"
    ))]
    InvalidGroupName {
        name: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("definitions are nested more than {} levels deep", MAX_NESTING_DEPTH)]
    NestingTooDeep {
        #[label("nested too deeply here")]
        span: Span,
    },
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, line: usize, file: &str, source: &str) -> Self {
        ParseError {
            kind: Box::new(kind),
            line,
            file: file.to_owned(),
            source_code: NamedSource::new(file, source.to_owned()),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> ParseErrorKind {
        *self.kind
    }

    /// The 1-based line number at which the error was detected.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Gets the name of the file in which this error occurred, if one was given.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match &*self.kind {
            ParseErrorKind::UnexpectedEof { .. }
            | ParseErrorKind::UnterminatedString { .. }
            | ParseErrorKind::UnterminatedComment { .. } => ErrorKind::Eof,
            ParseErrorKind::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            ParseErrorKind::IllegalOrder { .. } | ParseErrorKind::DuplicatePackage { .. } => {
                ErrorKind::IllegalOrder
            }
            ParseErrorKind::IllegalNumber { .. } | ParseErrorKind::IllegalId { .. } => {
                ErrorKind::IllegalNumber
            }
            ParseErrorKind::InvalidGroupName { .. } => ErrorKind::InvalidGroupName,
            ParseErrorKind::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
        }
    }

    /// Gets the primary source code span associated with this error, if any.
    pub fn span(&self) -> Option<Span> {
        match &*self.kind {
            ParseErrorKind::UnexpectedEof { .. } => None,
            ParseErrorKind::UnterminatedString { span } => Some(span.clone()),
            ParseErrorKind::UnterminatedComment { span } => Some(span.clone()),
            ParseErrorKind::UnexpectedToken { span, .. } => Some(span.clone()),
            ParseErrorKind::IllegalOrder { span, .. } => Some(span.clone()),
            ParseErrorKind::DuplicatePackage { second, .. } => Some(second.clone()),
            ParseErrorKind::IllegalNumber { span, .. } => Some(span.clone()),
            ParseErrorKind::IllegalId { span, .. } => Some(span.clone()),
            ParseErrorKind::InvalidGroupName { span, .. } => Some(span.clone()),
            ParseErrorKind::NestingTooDeep { span } => Some(span.clone()),
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.file.is_empty() {
            write!(f, "{}:", self.file)?;
        }
        write!(f, "{}: {}", self.line, self.kind)
    }
}
