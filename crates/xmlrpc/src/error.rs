//! XML-RPC codec error types.

use thiserror::Error;

/// Errors raised while decoding an XML-RPC document.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An entity or character reference could not be resolved.
    #[error("malformed XML escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// Text content is not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// An element appeared where the XML-RPC grammar does not allow it.
    #[error("unexpected element <{found}>, expected {expected}")]
    UnexpectedElement { found: String, expected: String },

    /// Text or a closing tag appeared where an element was expected.
    #[error("unexpected content, expected {0}")]
    UnexpectedContent(String),

    /// The document ended before the XML-RPC structure was complete.
    #[error("unexpected end of document")]
    UnexpectedEof,

    /// A scalar element holds text that does not parse as its type.
    #[error("invalid <{kind}> value: {text:?}")]
    InvalidScalar { kind: &'static str, text: String },

    /// A `<fault>` does not carry `faultCode` and `faultString`.
    #[error("invalid fault: {0}")]
    InvalidFault(String),
}

pub type Result<T> = std::result::Result<T, Error>;
