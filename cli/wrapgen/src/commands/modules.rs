//! `wrapgen modules`: emit the cfg-gated module index.

use std::path::Path;

use anyhow::{Context, Result};

use crate::manifest::WrapgenManifest;

/// Print the module index, or write it to `output` below `project_dir`.
///
/// `#[path]` attributes are relative to `[output] dir`, so a written index
/// belongs in that directory.
pub fn run(project_dir: &Path, manifest: &WrapgenManifest, output: Option<&str>) -> Result<()> {
    let params_path = manifest.parameters_path(project_dir);
    let params = wrapgen_core::load_parameters(&params_path)
        .with_context(|| format!("loading {}", params_path.display()))?;

    let options = manifest.generate_options();
    let count = wrapgen_core::selected_variants(&params, &options).len();
    let index = wrapgen_core::render_module_index(&params, &options, |variant| {
        manifest.variant_file(variant)
    });
    match output {
        Some(path) => {
            let path = project_dir.join(path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &index).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote module index ({count} modules) → {}", path.display());
        }
        None => print!("{index}"),
    }
    Ok(())
}
