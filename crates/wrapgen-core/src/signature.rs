//! Raw declaration and safe wrapper signature derivation.

use wrapgen_catalog::{BaseType, FunctionSpec, ParamType, ResultConvention, WrappingConfig};

use crate::analyze::ArgumentTable;
use crate::error::{GenerateError, Result};

/// A foreign function declaration inside the `extern "C"` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    /// Prefixed link symbol.
    pub symbol: String,
    /// Every argument in declaration order, with its binding type.
    pub params: Vec<(String, BaseType)>,
    pub return_type: Option<BaseType>,
}

/// What a wrapper returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// Nothing.
    Unit,
    /// The raw foreign return value, unchanged.
    Raw(BaseType),
    /// Output values: a single value, or a tuple in listed order.
    Outputs(Vec<String>),
    /// `Result<payload, ()>` where the payload is unit, a single output or a
    /// tuple of outputs.
    Result {
        ok: Vec<String>,
        convention: ResultConvention,
    },
}

/// Signature of a safe wrapper function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSignature {
    pub name: String,
    pub doc: Option<String>,
    /// Plain arguments only, in declaration order.
    pub params: Vec<(String, ParamType)>,
    pub returns: ReturnShape,
}

/// Derive the raw declaration of `function` as linked under `symbol_prefix`.
pub fn raw_declaration(
    symbol_prefix: &str,
    function: &FunctionSpec,
    table: &ArgumentTable,
) -> RawDeclaration {
    RawDeclaration {
        symbol: format!("{symbol_prefix}{}", function.name),
        params: table
            .args()
            .iter()
            .map(|a| (a.name.clone(), a.binding_type.clone()))
            .collect(),
        return_type: function.return_type.clone(),
    }
}

/// Derive the wrapper signature of `function` under `wrapping`.
pub fn wrapper_signature(
    function: &FunctionSpec,
    wrapping: &WrappingConfig,
    table: &ArgumentTable,
) -> Result<WrapperSignature> {
    let name = wrapping.wrapper_name(&function.name);

    let params = table
        .plain()
        .filter_map(|a| a.wrapping_type.clone().map(|t| (a.name.clone(), t)))
        .collect();

    let outputs: Vec<String> = table
        .outputs()
        .filter_map(|a| a.return_type.clone())
        .collect();

    let returns = match (wrapping.return_as_result, &function.return_type) {
        (Some(convention), Some(_)) => ReturnShape::Result {
            ok: outputs,
            convention,
        },
        (Some(convention), None) => {
            return Err(GenerateError::MissingReturnForResult {
                function: function.name.clone(),
                convention: convention.to_string(),
            });
        }
        (None, Some(raw)) if outputs.is_empty() => ReturnShape::Raw(raw.clone()),
        (None, Some(_)) => {
            return Err(GenerateError::UnhandledReturn {
                function: function.name.clone(),
                wrapper: name,
            });
        }
        (None, None) if outputs.is_empty() => ReturnShape::Unit,
        (None, None) => ReturnShape::Outputs(outputs),
    };

    Ok(WrapperSignature {
        name,
        doc: wrapping.description.clone(),
        params,
        returns,
    })
}
