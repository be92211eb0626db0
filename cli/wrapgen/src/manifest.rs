//! `wrapgen.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wrapgen_catalog::{Implementation, Variant};
use wrapgen_core::{GenerateOptions, GeneratedUnit};

/// The manifest file name looked up from the working directory upward.
pub const MANIFEST_NAME: &str = "wrapgen.toml";

/// The top-level manifest structure of a binding project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapgenManifest {
    /// Catalog locations (required).
    pub catalog: CatalogConfig,
    /// Where and how generated units are written.
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub self_test: SelfTestConfig,
    /// Reference header location for constant checks.
    #[serde(default)]
    pub check: CheckConfig,
}

/// Catalog section. Paths are relative to the manifest directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Function catalog (JSON).
    pub functions: String,
    /// Parameter catalog (JSON).
    pub parameters: String,
}

/// Output section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated units are written to.
    #[serde(default = "default_dir")]
    pub dir: String,
    /// File name template below `dir`. Placeholders: `{module}`, `{scheme}`,
    /// `{level}`, `{impl}`.
    #[serde(default = "default_path")]
    pub path: String,
    /// Implementations for which nothing is generated.
    #[serde(default)]
    pub skip: Vec<Implementation>,
    /// `use` lines at the top of every unit.
    #[serde(default = "default_uses")]
    pub uses: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            path: default_path(),
            skip: Vec::new(),
            uses: default_uses(),
        }
    }
}

fn default_dir() -> String {
    "src/ffi".to_string()
}

fn default_path() -> String {
    "{module}.rs".to_string()
}

fn default_uses() -> Vec<String> {
    GenerateOptions::default().uses
}

/// Self-test section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Message signed by the self-test.
    #[serde(default)]
    pub message: Option<String>,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            message: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Check section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Root of the reference implementation tree.
    #[serde(default = "default_extern_dir")]
    pub extern_dir: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            extern_dir: default_extern_dir(),
        }
    }
}

fn default_extern_dir() -> String {
    "extern".to_string()
}

impl WrapgenManifest {
    /// Search upward from `start_dir` for a `wrapgen.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest = Self::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                log::debug!("using manifest {}", candidate.display());
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Parse a manifest from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(s)?;
        Ok(manifest)
    }

    /// Generation options derived from the `[output]` and `[self_test]`
    /// sections.
    pub fn generate_options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            skip: self.output.skip.clone(),
            uses: self.output.uses.clone(),
            self_test: self.self_test.enabled,
            message: self
                .self_test
                .message
                .clone()
                .unwrap_or(defaults.message),
        }
    }

    /// Where a generated unit is written below `project_dir`.
    pub fn unit_path(&self, project_dir: &Path, unit: &GeneratedUnit) -> PathBuf {
        let file = self.unit_file(&unit.module, &unit.scheme, unit.level, unit.implementation);
        project_dir.join(&self.output.dir).join(file)
    }

    /// A unit's file below `[output] dir`, from the path template.
    pub fn unit_file(
        &self,
        module: &str,
        scheme: &str,
        level: u32,
        implementation: Implementation,
    ) -> String {
        self.output
            .path
            .replace("{module}", module)
            .replace("{scheme}", scheme)
            .replace("{level}", &level.to_string())
            .replace("{impl}", implementation.as_str())
    }

    /// The file of a variant's unit, relative to `[output] dir`.
    pub fn variant_file(&self, variant: &Variant<'_>) -> String {
        self.unit_file(
            &variant.module_name(),
            variant.scheme,
            variant.level(),
            variant.implementation,
        )
    }

    pub fn functions_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.catalog.functions)
    }

    pub fn parameters_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.catalog.parameters)
    }

    pub fn extern_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.check.extern_dir)
    }

    /// A starter manifest for a new binding project.
    pub fn template() -> String {
        r#"[catalog]
functions = "scripts/ffi_api.json"
parameters = "scripts/parameter_sets.json"

[output]
dir = "src/ffi"
path = "{module}.rs"
skip = []
uses = ["use super::*;"]

[self_test]
enabled = true
message = "hello world"

[check]
extern_dir = "extern"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml = r#"
[catalog]
functions = "api.json"
parameters = "params.json"

[output]
dir = "src/internals"
path = "{scheme}{level}/ffi_{impl}.rs"
skip = ["aarch64"]
uses = ["use super::*;", "use cty::c_int;"]

[self_test]
enabled = false
message = "abc"

[check]
extern_dir = "pqclean/crypto_sign"
"#;
        let m = WrapgenManifest::from_str(toml).unwrap();
        assert_eq!(m.catalog.functions, "api.json");
        assert_eq!(m.output.skip, vec![Implementation::Aarch64]);
        assert_eq!(m.output.uses.len(), 2);
        assert!(!m.self_test.enabled);
        assert_eq!(m.check.extern_dir, "pqclean/crypto_sign");

        let options = m.generate_options();
        assert_eq!(options.message, "abc");
        assert!(!options.self_test);
        assert_eq!(options.skip, vec![Implementation::Aarch64]);
    }

    #[test]
    fn parse_minimal_manifest() {
        let toml = r#"
[catalog]
functions = "api.json"
parameters = "params.json"
"#;
        let m = WrapgenManifest::from_str(toml).unwrap();
        assert_eq!(m.output.dir, "src/ffi");
        assert_eq!(m.output.path, "{module}.rs");
        assert_eq!(m.output.uses, ["use super::*;"]);
        assert!(m.self_test.enabled);
        assert_eq!(m.check.extern_dir, "extern");
        assert_eq!(m.generate_options(), GenerateOptions::default());
    }

    #[test]
    fn reject_unknown_implementation() {
        let toml = r#"
[catalog]
functions = "api.json"
parameters = "params.json"

[output]
skip = ["neon"]
"#;
        assert!(WrapgenManifest::from_str(toml).is_err());
    }

    #[test]
    fn reject_missing_catalog() {
        assert!(WrapgenManifest::from_str("[output]\ndir = \"x\"\n").is_err());
    }

    #[test]
    fn template_is_valid_toml() {
        let m = WrapgenManifest::from_str(&WrapgenManifest::template()).unwrap();
        assert_eq!(m.catalog.parameters, "scripts/parameter_sets.json");
    }

    #[test]
    fn unit_file_fills_placeholders() {
        let mut m = WrapgenManifest::from_str(&WrapgenManifest::template()).unwrap();
        assert_eq!(
            m.unit_file("dilithium3_avx2", "dilithium", 3, Implementation::Avx2),
            "dilithium3_avx2.rs"
        );
        m.output.path = "{scheme}{level}/ffi_{impl}.rs".to_string();
        assert_eq!(
            m.unit_file("dilithium3_avx2", "dilithium", 3, Implementation::Avx2),
            "dilithium3/ffi_avx2.rs"
        );
    }

    #[test]
    fn find_and_load_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), WrapgenManifest::template()).unwrap();

        let (m, found) = WrapgenManifest::find_and_load(dir.path()).unwrap().unwrap();
        assert_eq!(m.output.dir, "src/ffi");
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), WrapgenManifest::template()).unwrap();
        let sub = dir.path().join("src").join("ffi");
        std::fs::create_dir_all(&sub).unwrap();

        let (_, found) = WrapgenManifest::find_and_load(&sub).unwrap().unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn find_and_load_returns_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WrapgenManifest::find_and_load(dir.path()).unwrap().is_none());
    }
}
