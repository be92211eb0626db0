//! `wrapgen check-constants`: compare byte lengths with reference headers.

use std::path::Path;

use anyhow::{bail, Context, Result};
use wrapgen_catalog::ParameterCatalog;

use crate::manifest::WrapgenManifest;

/// Check every variant's constants against `{extern_dir}/{scheme}{level}/{impl}/api.h`.
///
/// `extern_dir` overrides the manifest's `[check]` section and is taken
/// relative to `project_dir`.
pub fn run(project_dir: &Path, manifest: &WrapgenManifest, extern_dir: Option<&str>) -> Result<()> {
    let params_path = manifest.parameters_path(project_dir);
    let params = ParameterCatalog::load(&params_path)
        .with_context(|| format!("loading {}", params_path.display()))?;

    let extern_dir = match extern_dir {
        Some(dir) => project_dir.join(dir),
        None => manifest.extern_dir(project_dir),
    };
    if !extern_dir.is_dir() {
        bail!("reference directory not found: {}", extern_dir.display());
    }

    let checked = wrapgen_core::check_all(&params, &extern_dir)?;
    println!(
        "Constants of {checked} variants match the headers in {}",
        extern_dir.display()
    );
    Ok(())
}
