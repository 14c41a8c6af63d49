//! Langfile XML handling: parsing into a mutable tree, schema conformance,
//! loading into `LanguageDocument`s, whitespace formatting and serialization.

use thiserror::Error;

pub mod document;
pub mod dom;
pub mod format;
pub mod loader;
pub mod schema;
pub mod serialize;

pub use document::{EntryKey, LanguageDocument, StringEntry, ValueEntry};
pub use dom::{NodeId, NodeKind, XmlTree};
pub use format::{reformat, Indentation};
pub use loader::{load_language, read_language};
pub use schema::{LangFileSchema, SchemaValidator, SchemaViolation};
pub use serialize::{to_bytes, XML_DECLARATION};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("invalid indentation spec: `{0}`")]
    IndentSpec(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}
