//! Byte-length constants and their cross-check against reference headers.
//!
//! Every unit declares the public key, secret key and signature lengths of
//! its parameter set. The reference C header of each implementation defines
//! the same constants; [`check_header`] fails when the two disagree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wrapgen_catalog::{ParameterCatalog, Variant};

use crate::error::{GenerateError, Result};

/// A `usize` constant emitted into a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub value: usize,
}

/// The three byte-length constants of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConstants {
    pub publickey: Constant,
    pub secretkey: Constant,
    pub signature: Constant,
}

impl UnitConstants {
    /// The constants in emission order.
    pub fn all(&self) -> [&Constant; 3] {
        [&self.publickey, &self.secretkey, &self.signature]
    }
}

/// Constants for a variant, named with its symbol prefix.
pub fn unit_constants(variant: &Variant<'_>) -> UnitConstants {
    let prefix = variant.symbol_prefix();
    let params = variant.params;
    UnitConstants {
        publickey: Constant {
            name: format!("{prefix}CRYPTO_PUBLICKEYBYTES"),
            value: params.publickey_bytes,
        },
        secretkey: Constant {
            name: format!("{prefix}CRYPTO_SECRETKEYBYTES"),
            value: params.secretkey_bytes,
        },
        signature: Constant {
            name: format!("{prefix}CRYPTO_BYTES"),
            value: params.signature_bytes,
        },
    }
}

/// Location of a variant's reference header below `extern_dir`.
pub fn header_path(extern_dir: &Path, variant: &Variant<'_>) -> PathBuf {
    extern_dir
        .join(format!("{}{}", variant.scheme, variant.level()))
        .join(variant.implementation.as_str())
        .join("api.h")
}

/// Collect `#define NAME VALUE` lines of a C header.
///
/// Only object-like macros on a single line are recognised; function-like
/// macros and continuation lines are skipped.
pub fn parse_defines(header: &str) -> HashMap<String, String> {
    let mut defines = HashMap::new();
    for line in header.lines() {
        let line = strip_comments(line).trim();
        let Some(rest) = line.strip_prefix('#') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix("define") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) || line.ends_with('\\') {
            continue;
        }
        let rest = rest.trim_start();
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, value) = rest.split_at(name_end);
        if name.is_empty() || value.starts_with('(') {
            continue;
        }
        defines.insert(name.to_string(), value.trim().to_string());
    }
    defines
}

/// Interpret a macro value as an unsigned integer literal.
///
/// Accepts surrounding parentheses and `u`/`l` suffixes.
fn parse_integer(value: &str) -> Option<usize> {
    let mut v = value.trim();
    while let Some(inner) = v.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        v = inner.trim();
    }
    let v = v.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else {
        v.parse().ok()
    }
}

fn strip_comments(line: &str) -> &str {
    let end = [line.find("//"), line.find("/*")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}

/// Check a variant's constants against the text of its reference header.
pub fn check_header(variant: &Variant<'_>, header: &str) -> Result<()> {
    let defines = parse_defines(header);
    let unit = variant.to_string();

    for constant in unit_constants(variant).all() {
        let raw = defines
            .get(&constant.name)
            .ok_or_else(|| GenerateError::MissingConstant {
                unit: unit.clone(),
                name: constant.name.clone(),
            })?;
        let reference = parse_integer(raw).ok_or_else(|| GenerateError::InvalidConstant {
            unit: unit.clone(),
            name: constant.name.clone(),
            value: raw.clone(),
        })?;
        if reference != constant.value {
            return Err(GenerateError::ConstantMismatch {
                unit,
                name: constant.name.clone(),
                generated: constant.value,
                reference,
            });
        }
    }

    Ok(())
}

/// Check every (level, implementation) pair against headers below
/// `extern_dir`. Returns the number of headers checked.
pub fn check_all(params: &ParameterCatalog, extern_dir: &Path) -> Result<usize> {
    let variants = params.variants();
    for variant in &variants {
        let path = header_path(extern_dir, variant);
        let header = std::fs::read_to_string(&path).map_err(|e| {
            GenerateError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {e}", path.display()),
            ))
        })?;
        check_header(variant, &header)?;
        log::debug!("{variant}: constants match {}", path.display());
    }
    Ok(variants.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapgen_catalog::{Implementation, ParameterSet};

    const HEADER: &str = r#"
#ifndef PQCLEAN_DILITHIUM2_CLEAN_API_H
#define PQCLEAN_DILITHIUM2_CLEAN_API_H

#include <stddef.h>
#include <stdint.h>

#define PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_PUBLICKEYBYTES 1312
#define PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_SECRETKEYBYTES 2528 // secret key
#define PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_BYTES (2420u)
#define PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_ALGNAME "Dilithium2"
#define MAX(a, b) ((a) > (b) ? (a) : (b))

int PQCLEAN_DILITHIUM2_CLEAN_crypto_sign_keypair(uint8_t *pk, uint8_t *sk);
#endif
"#;

    fn params(signature_bytes: usize) -> ParameterSet {
        ParameterSet {
            security_level: 2,
            publickey_bytes: 1312,
            secretkey_bytes: 2528,
            signature_bytes,
            implementations: vec![Implementation::Clean],
        }
    }

    fn variant(set: &ParameterSet) -> Variant<'_> {
        Variant {
            scheme: "dilithium",
            namespace: "PQCLEAN",
            params: set,
            implementation: Implementation::Clean,
        }
    }

    #[test]
    fn parse_object_like_defines() {
        let defines = parse_defines(HEADER);
        assert_eq!(
            defines.get("PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_PUBLICKEYBYTES").map(String::as_str),
            Some("1312")
        );
        assert_eq!(
            defines.get("PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_SECRETKEYBYTES").map(String::as_str),
            Some("2528")
        );
        assert!(defines.contains_key("PQCLEAN_DILITHIUM2_CLEAN_API_H"));
        assert!(!defines.contains_key("MAX"));
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_integer("1312"), Some(1312));
        assert_eq!(parse_integer("(2420u)"), Some(2420));
        assert_eq!(parse_integer("0x10UL"), Some(16));
        assert_eq!(parse_integer("\"Dilithium2\""), None);
    }

    #[test]
    fn unit_constant_names() {
        let set = params(2420);
        let constants = unit_constants(&variant(&set));
        let names: Vec<_> = constants.all().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_PUBLICKEYBYTES",
                "PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_SECRETKEYBYTES",
                "PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_BYTES"
            ]
        );
        assert_eq!(constants.signature.value, 2420);
    }

    #[test]
    fn matching_header_passes() {
        let set = params(2420);
        check_header(&variant(&set), HEADER).unwrap();
    }

    #[test]
    fn mismatch_detected() {
        let set = params(2421);
        match check_header(&variant(&set), HEADER) {
            Err(GenerateError::ConstantMismatch {
                name,
                generated,
                reference,
                ..
            }) => {
                assert_eq!(name, "PQCLEAN_DILITHIUM2_CLEAN_CRYPTO_BYTES");
                assert_eq!(generated, 2421);
                assert_eq!(reference, 2420);
            }
            other => panic!("expected ConstantMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_define_detected() {
        let set = params(2420);
        let header = HEADER.replace("CRYPTO_BYTES", "CRYPTO_SIGBYTES");
        assert!(matches!(
            check_header(&variant(&set), &header),
            Err(GenerateError::MissingConstant { .. })
        ));
    }

    #[test]
    fn header_path_layout() {
        let set = params(2420);
        let path = header_path(Path::new("extern"), &variant(&set));
        assert_eq!(path, Path::new("extern/dilithium2/clean/api.h"));
    }

    #[test]
    fn check_all_reads_headers() {
        let dir = tempfile::tempdir().unwrap();
        let header_dir = dir.path().join("dilithium2").join("clean");
        std::fs::create_dir_all(&header_dir).unwrap();
        std::fs::write(header_dir.join("api.h"), HEADER).unwrap();

        let catalog = ParameterCatalog {
            scheme: "dilithium".into(),
            namespace: "PQCLEAN".into(),
            parameter_sets: vec![params(2420)],
        };
        assert_eq!(check_all(&catalog, dir.path()).unwrap(), 1);

        std::fs::remove_file(header_dir.join("api.h")).unwrap();
        assert!(matches!(check_all(&catalog, dir.path()), Err(GenerateError::Io(_))));
    }
}
