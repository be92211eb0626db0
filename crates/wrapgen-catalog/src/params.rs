//! Parameter-set catalog parsing.
//!
//! Each parameter set names a security level, its three byte-length
//! constants and the implementations compiled for it:
//!
//! ```json
//! { "scheme": "dilithium",
//!   "parameter_sets": [
//!     { "security_level": 2, "publickey_bytes": 1312, "secretkey_bytes": 2528,
//!       "signature_bytes": 2420, "implementations": ["clean", "avx2", "aarch64"] }
//!   ] }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A compiled backend of the foreign library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
    /// Portable reference code.
    Clean,
    /// x86-64 with AVX2.
    Avx2,
    /// AArch64 with NEON.
    Aarch64,
}

impl Implementation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Implementation::Clean => "clean",
            Implementation::Avx2 => "avx2",
            Implementation::Aarch64 => "aarch64",
        }
    }

    /// Target predicates that must hold for this implementation to be built.
    pub fn target_cfgs(&self) -> &'static [&'static str] {
        match self {
            Implementation::Clean => &[],
            Implementation::Avx2 => &["target_arch = \"x86_64\"", "target_feature = \"avx2\""],
            // all aarch64 targets have NEON
            Implementation::Aarch64 => &["target_arch = \"aarch64\""],
        }
    }

    /// Extra predicates for running tests of this implementation on the host.
    pub fn test_cfgs(&self) -> &'static [&'static str] {
        match self {
            Implementation::Avx2 => &["target_feature = \"avx2\""],
            _ => &[],
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One security level and its constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub security_level: u32,
    pub publickey_bytes: usize,
    pub secretkey_bytes: usize,
    pub signature_bytes: usize,
    pub implementations: Vec<Implementation>,
}

/// The parameter-set catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCatalog {
    /// Scheme name used in symbol prefixes, link names and features.
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Symbol namespace of the foreign library.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub parameter_sets: Vec<ParameterSet>,
}

fn default_scheme() -> String {
    "dilithium".to_string()
}

fn default_namespace() -> String {
    "PQCLEAN".to_string()
}

impl ParameterCatalog {
    /// Parse a parameter catalog from a JSON string.
    pub fn parse(input: &str) -> Result<Self> {
        let catalog: ParameterCatalog = serde_json::from_str(input)?;

        if catalog.scheme.is_empty() {
            return Err(CatalogError::InvalidCatalog {
                detail: "scheme must not be empty".to_string(),
            });
        }
        let mut levels = std::collections::HashSet::new();
        for set in &catalog.parameter_sets {
            if !levels.insert(set.security_level) {
                return Err(CatalogError::InvalidCatalog {
                    detail: format!("security level {} listed twice", set.security_level),
                });
            }
        }

        Ok(catalog)
    }

    /// Parse a parameter catalog from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Every (parameter set, implementation) pair in catalog order.
    pub fn variants(&self) -> Vec<Variant<'_>> {
        self.parameter_sets
            .iter()
            .flat_map(move |set| {
                set.implementations.iter().map(move |&implementation| Variant {
                    scheme: &self.scheme,
                    namespace: &self.namespace,
                    params: set,
                    implementation,
                })
            })
            .collect()
    }
}

/// A (parameter set, implementation) pair: one generated source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant<'a> {
    pub scheme: &'a str,
    pub namespace: &'a str,
    pub params: &'a ParameterSet,
    pub implementation: Implementation,
}

impl Variant<'_> {
    pub fn level(&self) -> u32 {
        self.params.security_level
    }

    /// Prefix of every foreign symbol, e.g. `PQCLEAN_DILITHIUM2_CLEAN_`.
    pub fn symbol_prefix(&self) -> String {
        format!(
            "{}_{}{}_{}_",
            self.namespace.to_uppercase(),
            self.scheme.to_uppercase(),
            self.level(),
            self.implementation.as_str().to_uppercase()
        )
    }

    /// Static library name, e.g. `dilithium2_clean`.
    pub fn link_name(&self) -> String {
        format!("{}{}_{}", self.scheme, self.level(), self.implementation)
    }

    /// Rust module name of the generated unit.
    pub fn module_name(&self) -> String {
        self.link_name()
    }

    /// Cargo feature gating this security level.
    pub fn feature(&self) -> String {
        format!("{}{}", self.scheme, self.level())
    }

    /// All cfg predicates gating the generated module.
    pub fn cfgs(&self) -> Vec<String> {
        let mut cfgs = vec![format!("feature = \"{}\"", self.feature())];
        cfgs.extend(self.implementation.target_cfgs().iter().map(|c| c.to_string()));
        cfgs
    }
}

impl fmt::Display for Variant<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", self.scheme, self.level(), self.implementation)
    }
}
