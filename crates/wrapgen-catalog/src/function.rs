//! Function catalog parsing.
//!
//! The catalog is a JSON document listing foreign functions, in the order
//! they are to be emitted, together with one or more wrapping
//! configurations per function:
//!
//! ```json
//! { "api": [
//!   { "name": "poly_challenge",
//!     "args": [["c", "*mut Poly"], ["seed", "*const [u8; SEEDBYTES]"]],
//!     "wrapping": { "uninit_mutate_init_return": ["c"] } }
//! ] }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::params::Implementation;
use crate::types::BaseType;

/// One argument of a foreign function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub ty: BaseType,
}

/// Declarative description of one foreign function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    /// Unprefixed function name.
    pub name: String,
    /// Arguments in declaration order; names are unique.
    pub args: Vec<Argument>,
    /// Raw return type, if the function returns a value.
    pub return_type: Option<BaseType>,
    /// Implementations this function exists in; `None` means all of them.
    pub implementations: Option<Vec<Implementation>>,
    /// Wrapping configurations, in catalog order. Never empty.
    pub wrappings: Vec<WrappingConfig>,
}

impl FunctionSpec {
    /// Look up an argument and its position by name.
    pub fn argument(&self, name: &str) -> Option<(usize, &Argument)> {
        self.args.iter().enumerate().find(|(_, a)| a.name == name)
    }

    /// Whether this function is emitted for the given implementation.
    pub fn applies_to(&self, implementation: Implementation) -> bool {
        match &self.implementations {
            Some(list) => list.contains(&implementation),
            None => true,
        }
    }
}

/// How the pointee types of a mapped argument and its source are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTypes {
    /// Pointee types must be identical.
    #[default]
    Implicit,
    /// The catalog asserts compatibility; a cast is emitted.
    Explicit,
}

/// Policy turning a raw integer outcome into success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultConvention {
    /// Zero is success, anything else is failure.
    ZeroIsOk,
}

impl ResultConvention {
    /// Recognise a catalog tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "0 is Ok" => Some(ResultConvention::ZeroIsOk),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ResultConvention::ZeroIsOk => "0 is Ok",
        }
    }
}

impl fmt::Display for ResultConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One named adaptation of a foreign function into a safe wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappingConfig {
    /// Appended to the function name to form the wrapper name.
    pub name_postfix: String,
    /// Argument name → name of the argument whose storage it reuses.
    pub arg_mapping_from: BTreeMap<String, String>,
    /// Uninitialised output buffers, in return order.
    pub uninit_mutate_init_return: Vec<String>,
    pub return_as_result: Option<ResultConvention>,
    pub map_types: MapTypes,
    pub description: Option<String>,
}

impl WrappingConfig {
    pub fn wrapper_name(&self, function: &str) -> String {
        format!("{function}{}", self.name_postfix)
    }

    pub fn is_output(&self, argument: &str) -> bool {
        self.uninit_mutate_init_return.iter().any(|a| a == argument)
    }

    pub fn mapped_from(&self, argument: &str) -> Option<&str> {
        self.arg_mapping_from.get(argument).map(String::as_str)
    }
}

/// The validated function catalog, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionCatalog {
    functions: Vec<FunctionSpec>,
}

impl FunctionCatalog {
    /// Parse a catalog from a JSON string.
    pub fn parse(input: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(input)?;

        let mut seen = HashSet::new();
        let mut functions = Vec::with_capacity(raw.api.len());
        for raw_fn in raw.api {
            if !seen.insert(raw_fn.name.clone()) {
                return Err(CatalogError::DuplicateFunction {
                    function: raw_fn.name,
                });
            }
            functions.push(raw_fn.into_function()?);
        }

        log::debug!("loaded {} catalog functions", functions.len());
        Ok(FunctionCatalog { functions })
    }

    /// Parse a catalog from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn functions(&self) -> &[FunctionSpec] {
        &self.functions
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Functions emitted for one implementation, in catalog order.
    pub fn for_implementation(
        &self,
        implementation: Implementation,
    ) -> impl Iterator<Item = &FunctionSpec> {
        self.functions
            .iter()
            .filter(move |f| f.applies_to(implementation))
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    api: Vec<RawFunction>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFunction {
    name: String,
    args: Vec<(String, String)>,
    #[serde(default, rename = "return")]
    return_type: Option<String>,
    #[serde(default)]
    implementations: Option<Vec<Implementation>>,
    #[serde(default)]
    wrapping: Option<RawWrapping>,
    #[serde(default)]
    wrappings: Option<Vec<RawWrapping>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWrapping {
    #[serde(default)]
    name_postfix: String,
    #[serde(default)]
    arg_mapping_from: BTreeMap<String, String>,
    #[serde(default)]
    uninit_mutate_init_return: Vec<String>,
    #[serde(default)]
    return_as_result: Option<String>,
    #[serde(default)]
    map_types: MapTypes,
    #[serde(default)]
    description: Option<String>,
}

impl RawFunction {
    fn into_function(self) -> Result<FunctionSpec> {
        if self.name.is_empty() {
            return Err(CatalogError::InvalidCatalog {
                detail: "function name is required".to_string(),
            });
        }

        let mut names = HashSet::new();
        let mut args = Vec::with_capacity(self.args.len());
        for (arg_name, arg_type) in self.args {
            if !names.insert(arg_name.clone()) {
                return Err(CatalogError::DuplicateArgument {
                    function: self.name,
                    argument: arg_name,
                });
            }
            let ty = BaseType::parse(&arg_type).map_err(|e| CatalogError::InvalidType {
                detail: format!("{}::{arg_name}: {e}", self.name),
            })?;
            args.push(Argument { name: arg_name, ty });
        }

        let return_type = match self.return_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(ty) => Some(BaseType::parse(ty).map_err(|e| CatalogError::InvalidType {
                detail: format!("{} return: {e}", self.name),
            })?),
        };

        let raw_wrappings = match (self.wrapping, self.wrappings) {
            (Some(_), Some(_)) => {
                return Err(CatalogError::InvalidCatalog {
                    detail: format!(
                        "function '{}' has both 'wrapping' and 'wrappings'",
                        self.name
                    ),
                });
            }
            (Some(single), None) => vec![single],
            (None, Some(list)) if !list.is_empty() => list,
            _ => vec![RawWrapping::default()],
        };

        let wrappings = raw_wrappings
            .into_iter()
            .map(|w| w.into_config(&self.name))
            .collect::<Result<Vec<_>>>()?;

        Ok(FunctionSpec {
            name: self.name,
            args,
            return_type,
            implementations: self.implementations,
            wrappings,
        })
    }
}

impl RawWrapping {
    fn into_config(self, function: &str) -> Result<WrappingConfig> {
        let return_as_result = match self.return_as_result {
            None => None,
            Some(tag) => Some(ResultConvention::from_tag(&tag).ok_or_else(|| {
                CatalogError::UnknownConvention {
                    function: function.to_string(),
                    tag,
                }
            })?),
        };

        Ok(WrappingConfig {
            name_postfix: self.name_postfix,
            arg_mapping_from: self.arg_mapping_from,
            uninit_mutate_init_return: self.uninit_mutate_init_return,
            return_as_result,
            map_types: self.map_types,
            description: self.description,
        })
    }
}
