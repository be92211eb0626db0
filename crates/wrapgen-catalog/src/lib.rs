//! Catalog loading for the wrapgen binding generator.
//!
//! Parses the foreign function catalog and the parameter-set catalog into
//! immutable, validated in-memory structures.
//!
//! ## Modules
//!
//! - [`types`]: Closed type model for argument and return types
//! - [`function`]: Function catalog (`FunctionSpec`, `WrappingConfig`)
//! - [`params`]: Parameter sets and implementation variants

pub mod error;
pub mod function;
pub mod params;
pub mod types;

pub use error::CatalogError;
pub use function::{Argument, FunctionCatalog, FunctionSpec, MapTypes, ResultConvention, WrappingConfig};
pub use params::{Implementation, ParameterCatalog, ParameterSet, Variant};
pub use types::{BaseType, ParamType};
