//! Error types for tree loading, path predicates and rule files.

use thiserror::Error;

/// Error type for loading the structure tree and compiling path predicates.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Attribute value could not be decoded.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Invalid path predicate.
    #[error("invalid path '{path}': {message}")]
    InvalidPath {
        /// Path source text.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid regular expression inside a path predicate.
    #[error("invalid regular expression in path '{path}': {source}")]
    InvalidRegex {
        /// Path source text.
        path: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Invalid tree structure.
    #[error("invalid tree structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Error type for loading exception rule files.
#[derive(Debug, Error)]
pub enum RulesError {
    /// Rule file is not valid TOML or does not match the rule layout.
    #[error("invalid rules file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A rule carries a path that does not compile.
    #[error("rule error: {0}")]
    Path(#[from] ParseError),

    /// Unsupported option value.
    #[error("invalid option '{option}': {message}")]
    InvalidOption {
        /// Option name.
        option: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}
