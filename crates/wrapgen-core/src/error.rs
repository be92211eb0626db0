//! Generation error types.
//!
//! Every error is detected while deriving a unit and aborts the run before
//! any output is written.

use wrapgen_catalog::CatalogError;

/// Errors that can occur while generating bindings.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// An argument is both mapped and an output, listed as an output twice,
    /// or maps from another mapped argument.
    #[error("{function}: argument '{argument}' has conflicting roles: {detail}")]
    ArgumentRoleConflict {
        function: String,
        argument: String,
        detail: String,
    },

    /// A mapping or output names an argument that does not exist or has not
    /// been processed yet.
    #[error("{function}: unknown argument '{argument}': {detail}")]
    UnknownArgument {
        function: String,
        argument: String,
        detail: String,
    },

    /// Implicit mapping between arguments with different pointee types.
    #[error("{function}: argument '{argument}' points to '{expected}' but maps from '{from}' which points to '{found}'")]
    TypeMismatch {
        function: String,
        argument: String,
        from: String,
        expected: String,
        found: String,
    },

    /// `return_as_result` on a function without a raw return value.
    #[error("{function}: result convention '{convention}' requires a return value")]
    MissingReturnForResult { function: String, convention: String },

    /// A raw return value and outputs without a result convention: the call's
    /// outcome would be dropped while the outputs are assumed initialised.
    #[error("{function}: wrapper '{wrapper}' returns outputs but has no result convention for the raw return value")]
    UnhandledReturn { function: String, wrapper: String },

    /// A result convention the emitter does not know.
    #[error("{function}: unknown result convention '{tag}'")]
    UnknownConvention { function: String, tag: String },

    /// Output and mapped arguments must be pointers.
    #[error("{function}: argument '{argument}' must be a pointer to be used as {usage}")]
    NotAPointer {
        function: String,
        argument: String,
        usage: &'static str,
    },

    /// A mutable mapped pointer would alias a shared reference.
    #[error("{function}: mutable argument '{argument}' cannot alias shared argument '{from}'")]
    AliasMutability {
        function: String,
        argument: String,
        from: String,
    },

    /// Two wrappings of one function derive different raw declarations.
    #[error("{function}: wrapper '{wrapper}' needs a raw declaration that differs from the function's first wrapping")]
    DeclarationConflict { function: String, wrapper: String },

    /// Two wrappers in one unit share a name.
    #[error("{unit}: wrapper '{wrapper}' is defined more than once")]
    DuplicateWrapper { unit: String, wrapper: String },

    /// A reference header lacks a constant.
    #[error("{unit}: constant '{name}' not found in reference header")]
    MissingConstant { unit: String, name: String },

    /// A reference header defines a constant that is not an integer literal.
    #[error("{unit}: constant '{name}' has non-integer value '{value}' in reference header")]
    InvalidConstant {
        unit: String,
        name: String,
        value: String,
    },

    /// A generated constant disagrees with the reference header.
    #[error("{unit}: constant '{name}' is {generated} but reference header says {reference}")]
    ConstantMismatch {
        unit: String,
        name: String,
        generated: usize,
        reference: usize,
    },

    /// Catalog loading error.
    #[error("catalog error: {0}")]
    Catalog(#[source] CatalogError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for GenerateError {
    fn from(err: CatalogError) -> Self {
        // convention tags are checked while loading but reported as a
        // generation error
        match err {
            CatalogError::UnknownConvention { function, tag } => {
                GenerateError::UnknownConvention { function, tag }
            }
            other => GenerateError::Catalog(other),
        }
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
