//! Catalog error types.

/// Errors that can occur while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A type string could not be parsed.
    #[error("invalid type: {detail}")]
    InvalidType { detail: String },

    /// The catalog is structurally malformed.
    #[error("invalid catalog: {detail}")]
    InvalidCatalog { detail: String },

    /// Two arguments of one function share a name.
    #[error("function '{function}' declares argument '{argument}' more than once")]
    DuplicateArgument { function: String, argument: String },

    /// Two catalog entries share a function name.
    #[error("function '{function}' is declared more than once")]
    DuplicateFunction { function: String },

    /// A `return_as_result` tag that no convention recognises.
    #[error("function '{function}': unknown result convention '{tag}'")]
    UnknownConvention { function: String, tag: String },

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
