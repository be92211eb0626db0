//! Catalog loading for a generation run.
//!
//! Catalog errors come back as [`GenerateError`], so a convention tag the
//! body emitter cannot handle is reported like any other generation error.

use std::path::Path;

use wrapgen_catalog::{FunctionCatalog, ParameterCatalog};

use crate::error::{GenerateError, Result};

/// Load the function catalog at `path`.
pub fn load_functions(path: &Path) -> Result<FunctionCatalog> {
    Ok(FunctionCatalog::load(path)?)
}

/// Load the parameter catalog at `path`.
pub fn load_parameters(path: &Path) -> Result<ParameterCatalog> {
    let params = ParameterCatalog::load(path)?;
    log::debug!("{}: {} variants", path.display(), params.variants().len());
    Ok(params)
}
