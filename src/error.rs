//! Error types for level scene construction.
//!
//! Every variant is a load-time failure: a level that hits any of them is not
//! rendered at all.

use thiserror::Error;

/// Result type alias using [`LevelError`].
pub type Result<T> = std::result::Result<T, LevelError>;

#[derive(Error, Debug)]
pub enum LevelError {
    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("trile set not found: {0}")]
    UnknownTrileset(String),

    #[error("trile {id} not found in trile set {trileset}")]
    UnknownTrile { trileset: String, id: i32 },

    #[error("sky not found: {0}")]
    UnknownSky(String),

    #[error("art object not found: {0}")]
    UnknownArtObject(String),

    #[error("background plane texture not found: {0}")]
    UnknownBackgroundPlane(String),

    /// Boolean attributes are serialized as the literal strings `True` and `False`.
    #[error("invalid boolean {value:?} (expected \"True\" or \"False\")")]
    InvalidBoolean { value: String },

    #[error("invalid number {value:?} in attribute {attribute}")]
    InvalidNumber { attribute: String, value: String },

    #[error("invalid trile orientation {0} (expected 0..=3)")]
    InvalidOrientation(i64),

    #[error("<{element}> is missing attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },

    #[error("<{parent}> has no {path} child")]
    MissingElement { parent: String, path: String },
}
