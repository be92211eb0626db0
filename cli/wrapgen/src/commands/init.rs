//! `wrapgen init`: binding project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{WrapgenManifest, MANIFEST_NAME};

/// Starter function catalog: the three signature entry points.
const API_TEMPLATE: &str = r#"{
  "api": [
    {
      "name": "crypto_sign_keypair",
      "args": [["pk", "*mut u8"], ["sk", "*mut u8"]],
      "return": "c_int"
    },
    {
      "name": "crypto_sign_signature",
      "args": [["sig", "*mut u8"], ["siglen", "*mut size_t"], ["m", "*const u8"], ["mlen", "size_t"], ["sk", "*const u8"]],
      "return": "c_int"
    },
    {
      "name": "crypto_sign_verify",
      "args": [["sig", "*const u8"], ["siglen", "size_t"], ["m", "*const u8"], ["mlen", "size_t"], ["pk", "*const u8"]],
      "return": "c_int"
    }
  ]
}
"#;

/// Starter parameter catalog with the Dilithium security levels.
const PARAMS_TEMPLATE: &str = r#"{
  "scheme": "dilithium",
  "namespace": "PQCLEAN",
  "parameter_sets": [
    { "security_level": 2, "publickey_bytes": 1312, "secretkey_bytes": 2528, "signature_bytes": 2420,
      "implementations": ["clean", "avx2", "aarch64"] },
    { "security_level": 3, "publickey_bytes": 1952, "secretkey_bytes": 4000, "signature_bytes": 3293,
      "implementations": ["clean", "avx2", "aarch64"] },
    { "security_level": 5, "publickey_bytes": 2592, "secretkey_bytes": 4864, "signature_bytes": 4595,
      "implementations": ["clean", "avx2", "aarch64"] }
  ]
}
"#;

/// Write a manifest and starter catalogs into `project_dir`.
pub fn run(project_dir: &Path) -> Result<()> {
    let manifest_path = project_dir.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("{} already exists", manifest_path.display());
    }

    fs::create_dir_all(project_dir).with_context(|| format!("creating {}", project_dir.display()))?;
    let manifest = WrapgenManifest::from_str(&WrapgenManifest::template())?;
    fs::write(&manifest_path, WrapgenManifest::template())
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    for (path, content) in [
        (manifest.functions_path(project_dir), API_TEMPLATE),
        (manifest.parameters_path(project_dir), PARAMS_TEMPLATE),
    ] {
        if path.exists() {
            log::info!("keeping existing {}", path.display());
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    }

    println!("Created {}", manifest_path.display());
    println!("  {}", manifest.catalog.functions);
    println!("  {}", manifest.catalog.parameters);

    Ok(())
}
