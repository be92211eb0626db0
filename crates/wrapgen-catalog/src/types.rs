//! Closed type model for catalog argument and return types.
//!
//! Catalog types are Rust type expressions (`u16`, `*const [u8; SEEDBYTES]`,
//! `*mut PolyVecK`). They are parsed once at load time; only the outermost
//! pointer layer is interpreted, the pointee stays opaque text.

use std::fmt;

use crate::error::{CatalogError, Result};

/// The base type of a foreign argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// A non-pointer type passed by value.
    Value(String),
    /// `*const T`.
    PointerConst(String),
    /// `*mut T`.
    PointerMut(String),
}

impl BaseType {
    /// Parse a type expression.
    ///
    /// Examples:
    /// - `"u16"`
    /// - `"*const [u8; SEEDBYTES]"`
    /// - `"*mut PolyVecK"`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CatalogError::InvalidType {
                detail: "empty type".to_string(),
            });
        }

        if let Some(rest) = strip_keyword(input, "*const") {
            return Ok(BaseType::PointerConst(pointee_text(rest, input)?));
        }
        if let Some(rest) = strip_keyword(input, "*mut") {
            return Ok(BaseType::PointerMut(pointee_text(rest, input)?));
        }
        if input.starts_with('*') {
            return Err(CatalogError::InvalidType {
                detail: format!("'{input}': raw pointer needs 'const' or 'mut'"),
            });
        }

        Ok(BaseType::Value(normalize(input)))
    }

    /// The pointee type, if this is a pointer.
    pub fn pointee(&self) -> Option<&str> {
        match self {
            BaseType::Value(_) => None,
            BaseType::PointerConst(t) | BaseType::PointerMut(t) => Some(t),
        }
    }

    pub fn is_mut_pointer(&self) -> bool {
        matches!(self, BaseType::PointerMut(_))
    }

    /// A pointer of the same constness to a different pointee.
    ///
    /// Returns `None` for value types.
    pub fn with_pointee(&self, pointee: &str) -> Option<BaseType> {
        match self {
            BaseType::Value(_) => None,
            BaseType::PointerConst(_) => Some(BaseType::PointerConst(pointee.to_string())),
            BaseType::PointerMut(_) => Some(BaseType::PointerMut(pointee.to_string())),
        }
    }

    /// The safe parameter type callers see: pointers become references of
    /// matching constness, values stay values.
    pub fn to_param_type(&self) -> ParamType {
        match self {
            BaseType::Value(t) => ParamType::Value(t.clone()),
            BaseType::PointerConst(t) => ParamType::Shared(t.clone()),
            BaseType::PointerMut(t) => ParamType::Exclusive(t.clone()),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Value(t) => write!(f, "{t}"),
            BaseType::PointerConst(t) => write!(f, "*const {t}"),
            BaseType::PointerMut(t) => write!(f, "*mut {t}"),
        }
    }
}

/// The type of a safe wrapper parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Passed by value.
    Value(String),
    /// `&T`.
    Shared(String),
    /// `&mut T`.
    Exclusive(String),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Value(t) => write!(f, "{t}"),
            ParamType::Shared(t) => write!(f, "&{t}"),
            ParamType::Exclusive(t) => write!(f, "&mut {t}"),
        }
    }
}

/// Strip a leading keyword that must be followed by whitespace.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(keyword)?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

fn pointee_text(rest: &str, whole: &str) -> Result<String> {
    let pointee = normalize(rest);
    if pointee.is_empty() {
        return Err(CatalogError::InvalidType {
            detail: format!("'{whole}': missing pointee type"),
        });
    }
    Ok(pointee)
}

/// Collapse whitespace runs so that equal types compare equal as text.
fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_type() {
        assert_eq!(BaseType::parse("u16").unwrap(), BaseType::Value("u16".into()));
        assert_eq!(
            BaseType::parse(" cty::c_int ").unwrap(),
            BaseType::Value("cty::c_int".into())
        );
    }

    #[test]
    fn parse_pointer_types() {
        assert_eq!(
            BaseType::parse("*const [u8; SEEDBYTES]").unwrap(),
            BaseType::PointerConst("[u8; SEEDBYTES]".into())
        );
        assert_eq!(
            BaseType::parse("*mut PolyVecK").unwrap(),
            BaseType::PointerMut("PolyVecK".into())
        );
    }

    #[test]
    fn parse_normalizes_whitespace() {
        let a = BaseType::parse("*mut   [PolyVecL;  params::K]").unwrap();
        let b = BaseType::parse("*mut [PolyVecL; params::K]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pointee(), Some("[PolyVecL; params::K]"));
    }

    #[test]
    fn parse_nested_pointer_keeps_inner_text() {
        let ty = BaseType::parse("*const *mut u8").unwrap();
        assert_eq!(ty, BaseType::PointerConst("*mut u8".into()));
    }

    #[test]
    fn parse_rejects_bad_types() {
        assert!(BaseType::parse("").is_err());
        assert!(BaseType::parse("*const").is_err());
        assert!(BaseType::parse("*u8").is_err());
    }

    #[test]
    fn keyword_prefix_requires_separator() {
        // `*constant` is not `*const ant`
        assert!(BaseType::parse("*constant").is_err());
    }

    #[test]
    fn display_round_trips_text() {
        let ty = BaseType::parse("*const [u8; CRHBYTES]").unwrap();
        assert_eq!(ty.to_string(), "*const [u8; CRHBYTES]");
    }

    #[test]
    fn with_pointee_keeps_constness() {
        let ty = BaseType::PointerConst("u8".into());
        assert_eq!(
            ty.with_pointee("PolyVecK"),
            Some(BaseType::PointerConst("PolyVecK".into()))
        );
        assert_eq!(BaseType::Value("u8".into()).with_pointee("u16"), None);
    }

    #[test]
    fn param_types_follow_constness() {
        let shared = BaseType::parse("*const Poly").unwrap().to_param_type();
        let exclusive = BaseType::parse("*mut Poly").unwrap().to_param_type();
        let value = BaseType::parse("i32").unwrap().to_param_type();
        assert_eq!(shared.to_string(), "&Poly");
        assert_eq!(exclusive.to_string(), "&mut Poly");
        assert_eq!(value.to_string(), "i32");
    }
}
