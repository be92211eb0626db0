//! `wrapgen generate`: derive and write one source unit per variant.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::manifest::WrapgenManifest;

/// Derive every unit and write it, or with `check` compare it against the
/// file on disk.
///
/// Every unit is derived and rendered before anything is written, so a
/// catalog error leaves the output directory untouched.
pub fn run(project_dir: &Path, manifest: &WrapgenManifest, check: bool) -> Result<()> {
    let rendered = render_all(project_dir, manifest)?;

    if check {
        let stale: Vec<&PathBuf> = rendered
            .iter()
            .filter(|(path, text)| {
                std::fs::read_to_string(path).ok().as_deref() != Some(text.as_str())
            })
            .map(|(path, _)| path)
            .collect();
        for path in &stale {
            log::error!("out of date: {}", path.display());
        }
        if !stale.is_empty() {
            bail!("{} of {} generated files are out of date", stale.len(), rendered.len());
        }
        println!("All {} generated files are up to date", rendered.len());
        return Ok(());
    }

    for (path, text) in &rendered {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        log::debug!("wrote {}", path.display());
    }
    println!(
        "Generated {} units → {}",
        rendered.len(),
        project_dir.join(&manifest.output.dir).display()
    );
    Ok(())
}

/// Load both catalogs, derive every unit and render it with its target path.
pub(crate) fn render_all(
    project_dir: &Path,
    manifest: &WrapgenManifest,
) -> Result<Vec<(PathBuf, String)>> {
    let functions_path = manifest.functions_path(project_dir);
    let catalog = wrapgen_core::load_functions(&functions_path)
        .with_context(|| format!("loading {}", functions_path.display()))?;
    let params_path = manifest.parameters_path(project_dir);
    let params = wrapgen_core::load_parameters(&params_path)
        .with_context(|| format!("loading {}", params_path.display()))?;

    let units = wrapgen_core::assemble_all(&catalog, &params, &manifest.generate_options())?;
    Ok(units
        .iter()
        .map(|unit| {
            (
                manifest.unit_path(project_dir, unit),
                wrapgen_core::render_unit(unit),
            )
        })
        .collect())
}
