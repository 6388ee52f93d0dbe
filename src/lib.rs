//! Parsing of protocol buffers schema files into a plain syntax tree.
//!
//! See the documentation for [`parse()`] for details.
//!
//! # Examples
//!
//! ```
//! use proto_idl::ast::{OptionValue, Rule};
//!
//! let schema = proto_idl::parse(r#"
//!     package shop;
//!     import "common.proto";
//!
//!     message Order {
//!         required uint64 id = 1;
//!         repeated common.Item items = 2 [packed = true];
//!     }
//! "#).unwrap();
//!
//! assert_eq!(schema.package.as_deref(), Some("shop"));
//! assert_eq!(schema.imports[0].path, "common.proto");
//!
//! let items = &schema.messages[0].fields[1];
//! assert_eq!(items.rule, Rule::Repeated);
//! assert_eq!(items.ty, "common.Item");
//! assert_eq!(items.options.get("packed"), Some(&OptionValue::Bool(true)));
//! ```
//!
//! ### Error messages
//!
//! Errors implement [`miette::Diagnostic`], so they render with source snippets when returned
//! from a function using [`miette::Result`] with miette's `fancy` feature enabled. Their
//! [`Display`](std::fmt::Display) form is a single line naming the line number:
//!
//! ```
//! let err = proto_idl::parse("message Foo {\n  optional int32 x = -1;\n}").unwrap_err();
//! assert_eq!(err.line(), 2);
//! assert_eq!(err.kind(), proto_idl::ErrorKind::IllegalNumber);
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/proto-idl/0.1.0/")]

pub mod ast;
mod error;
mod grammar;
mod parse;

pub use self::error::{ErrorKind, ParseError};

/// Parses a schema source file.
///
/// Parsing stops at the first error. Type references, option names and option values are
/// recorded as written; nothing is resolved or validated beyond the grammar itself.
///
/// # Examples
///
/// ```
/// let schema = proto_idl::parse("enum Color { RED = 0; BLUE = -1; }").unwrap();
/// assert_eq!(schema.enums[0].values[1].id, -1);
///
/// let err = proto_idl::parse("message A {} package a;").unwrap_err();
/// assert_eq!(err.to_string(), "line 1: unexpected 'package' after the first definition");
/// ```
pub fn parse(source: &str) -> Result<ast::Schema, ParseError> {
    parse::parse("", source)
}

/// Parses a schema source file, using `name` to identify it in error messages and diagnostics.
///
/// # Examples
///
/// ```
/// let err = proto_idl::parse_named("foo.proto", "message").unwrap_err();
/// assert_eq!(err.file(), "foo.proto");
/// assert_eq!(
///     format!("{:?}", err),
///     "foo.proto:1: expected a message name in file, but reached end of input"
/// );
/// ```
pub fn parse_named(name: &str, source: &str) -> Result<ast::Schema, ParseError> {
    parse::parse(name, source)
}
