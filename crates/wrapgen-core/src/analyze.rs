//! Argument role analysis.
//!
//! Classifies every argument of a function under one wrapping configuration
//! as `plain` (visible to wrapper callers), `mapped` (reuses the storage of an
//! earlier argument) or `output` (uninitialised buffer returned by the
//! wrapper), and derives the types each role needs.

use std::collections::{HashMap, HashSet};

use wrapgen_catalog::{BaseType, FunctionSpec, MapTypes, ParamType, WrappingConfig};

use crate::error::{GenerateError, Result};

/// The role of an argument under one wrapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRole {
    /// A wrapper parameter passed through to the foreign call.
    Plain,
    /// Reuses the storage of the argument at position `from`.
    Mapped {
        from: usize,
        /// The pointer is cast to the binding type at the call site.
        cast: bool,
    },
    /// Caller-invisible buffer, uninitialised before the call and part of
    /// the wrapper's return value after it.
    Output,
}

/// Derived facts about one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentInfo {
    pub name: String,
    /// Position in the foreign declaration.
    pub position: usize,
    pub base_type: BaseType,
    pub role: ArgRole,
    /// Type used in the raw declaration.
    pub binding_type: BaseType,
    /// Wrapper parameter type; only for `Plain`.
    pub wrapping_type: Option<ParamType>,
    /// Pointee type returned by the wrapper; only for `Output`.
    pub return_type: Option<String>,
}

/// The ordered argument table of one (function, wrapping) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentTable {
    args: Vec<ArgumentInfo>,
    lookup: HashMap<String, usize>,
    /// Output positions in return order.
    outputs: Vec<usize>,
}

impl ArgumentTable {
    /// All arguments in declaration order.
    pub fn args(&self) -> &[ArgumentInfo] {
        &self.args
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentInfo> {
        self.lookup.get(name).map(|&i| &self.args[i])
    }

    pub fn at(&self, position: usize) -> &ArgumentInfo {
        &self.args[position]
    }

    /// Plain arguments in declaration order.
    pub fn plain(&self) -> impl Iterator<Item = &ArgumentInfo> {
        self.args.iter().filter(|a| a.role == ArgRole::Plain)
    }

    /// Output arguments in the order the wrapping lists them.
    pub fn outputs(&self) -> impl Iterator<Item = &ArgumentInfo> {
        self.outputs.iter().map(|&i| &self.args[i])
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

/// Analyze the arguments of `function` under `wrapping`.
///
/// Arguments are scanned left to right and a mapping may only reference an
/// argument that has already been scanned.
pub fn analyze(function: &FunctionSpec, wrapping: &WrappingConfig) -> Result<ArgumentTable> {
    check_references(function, wrapping)?;

    let mut args: Vec<ArgumentInfo> = Vec::with_capacity(function.args.len());
    let mut lookup: HashMap<String, usize> = HashMap::new();

    for (position, arg) in function.args.iter().enumerate() {
        let info = if wrapping.is_output(&arg.name) {
            let pointee = arg.ty.pointee().ok_or_else(|| GenerateError::NotAPointer {
                function: function.name.clone(),
                argument: arg.name.clone(),
                usage: "an output",
            })?;
            ArgumentInfo {
                name: arg.name.clone(),
                position,
                base_type: arg.ty.clone(),
                role: ArgRole::Output,
                binding_type: arg.ty.clone(),
                wrapping_type: None,
                return_type: Some(pointee.to_string()),
            }
        } else if let Some(from) = wrapping.mapped_from(&arg.name) {
            let (from_position, cast, binding_type) =
                resolve_mapping(function, wrapping, &args, &lookup, &arg.name, &arg.ty, from)?;
            ArgumentInfo {
                name: arg.name.clone(),
                position,
                base_type: arg.ty.clone(),
                role: ArgRole::Mapped {
                    from: from_position,
                    cast,
                },
                binding_type,
                wrapping_type: None,
                return_type: None,
            }
        } else {
            ArgumentInfo {
                name: arg.name.clone(),
                position,
                base_type: arg.ty.clone(),
                role: ArgRole::Plain,
                binding_type: arg.ty.clone(),
                wrapping_type: Some(arg.ty.to_param_type()),
                return_type: None,
            }
        };

        lookup.insert(arg.name.clone(), position);
        args.push(info);
    }

    // every listed output was checked to exist above
    let outputs = wrapping
        .uninit_mutate_init_return
        .iter()
        .filter_map(|name| lookup.get(name).copied())
        .collect();

    Ok(ArgumentTable {
        args,
        lookup,
        outputs,
    })
}

/// Validate the names a wrapping refers to before any argument is scanned.
fn check_references(function: &FunctionSpec, wrapping: &WrappingConfig) -> Result<()> {
    if let Some(convention) = wrapping.return_as_result {
        if function.return_type.is_none() {
            return Err(GenerateError::MissingReturnForResult {
                function: function.name.clone(),
                convention: convention.to_string(),
            });
        }
    }

    let mut listed = HashSet::new();
    for name in &wrapping.uninit_mutate_init_return {
        if function.argument(name).is_none() {
            return Err(GenerateError::UnknownArgument {
                function: function.name.clone(),
                argument: name.clone(),
                detail: "listed as an output but not declared".to_string(),
            });
        }
        if !listed.insert(name.as_str()) {
            return Err(GenerateError::ArgumentRoleConflict {
                function: function.name.clone(),
                argument: name.clone(),
                detail: "listed as an output more than once".to_string(),
            });
        }
        if wrapping.arg_mapping_from.contains_key(name) {
            return Err(GenerateError::ArgumentRoleConflict {
                function: function.name.clone(),
                argument: name.clone(),
                detail: "both mapped and listed as an output".to_string(),
            });
        }
    }

    for name in wrapping.arg_mapping_from.keys() {
        if function.argument(name).is_none() {
            return Err(GenerateError::UnknownArgument {
                function: function.name.clone(),
                argument: name.clone(),
                detail: "mapped but not declared".to_string(),
            });
        }
    }

    Ok(())
}

/// Resolve the source of a mapped argument, returning its position, whether a
/// cast is needed, and the binding type of the mapped argument.
fn resolve_mapping(
    function: &FunctionSpec,
    wrapping: &WrappingConfig,
    args: &[ArgumentInfo],
    lookup: &HashMap<String, usize>,
    name: &str,
    ty: &BaseType,
    from: &str,
) -> Result<(usize, bool, BaseType)> {
    let from_position = match lookup.get(from) {
        Some(&p) => p,
        None => {
            let detail = if function.argument(from).is_some() {
                format!("'{name}' maps from an argument declared after it")
            } else {
                format!("'{name}' maps from an argument that is not declared")
            };
            return Err(GenerateError::UnknownArgument {
                function: function.name.clone(),
                argument: from.to_string(),
                detail,
            });
        }
    };
    let source = &args[from_position];

    if matches!(source.role, ArgRole::Mapped { .. }) {
        return Err(GenerateError::ArgumentRoleConflict {
            function: function.name.clone(),
            argument: name.to_string(),
            detail: format!("maps from '{from}' which is itself mapped"),
        });
    }

    let pointee = ty.pointee().ok_or_else(|| GenerateError::NotAPointer {
        function: function.name.clone(),
        argument: name.to_string(),
        usage: "a mapped argument",
    })?;
    let source_pointee = source
        .base_type
        .pointee()
        .ok_or_else(|| GenerateError::NotAPointer {
            function: function.name.clone(),
            argument: from.to_string(),
            usage: "a mapping source",
        })?;

    let cast = match wrapping.map_types {
        MapTypes::Implicit => {
            if pointee != source_pointee {
                return Err(GenerateError::TypeMismatch {
                    function: function.name.clone(),
                    argument: name.to_string(),
                    from: from.to_string(),
                    expected: pointee.to_string(),
                    found: source_pointee.to_string(),
                });
            }
            false
        }
        MapTypes::Explicit => true,
    };

    if ty.is_mut_pointer() && source.role == ArgRole::Plain && !source.base_type.is_mut_pointer() {
        return Err(GenerateError::AliasMutability {
            function: function.name.clone(),
            argument: name.to_string(),
            from: from.to_string(),
        });
    }

    // an output's storage is typed by its pointee, so the mapped pointer
    // must point at that type
    let binding_type = match source.role {
        ArgRole::Output => ty
            .with_pointee(source_pointee)
            .unwrap_or_else(|| ty.clone()),
        _ => ty.clone(),
    };

    Ok((from_position, cast, binding_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use wrapgen_catalog::{Argument, ResultConvention};

    fn function(name: &str, args: &[(&str, &str)], ret: Option<&str>) -> FunctionSpec {
        FunctionSpec {
            name: name.to_string(),
            args: args
                .iter()
                .map(|(n, t)| Argument {
                    name: n.to_string(),
                    ty: BaseType::parse(t).unwrap(),
                })
                .collect(),
            return_type: ret.map(|r| BaseType::parse(r).unwrap()),
            implementations: None,
            wrappings: vec![WrappingConfig::default()],
        }
    }

    fn outputs(names: &[&str]) -> WrappingConfig {
        WrappingConfig {
            uninit_mutate_init_return: names.iter().map(|n| n.to_string()).collect(),
            ..WrappingConfig::default()
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn keypair() -> FunctionSpec {
        function(
            "crypto_sign_keypair",
            &[
                ("pk", "*mut PK"),
                ("sk", "*mut SK"),
                ("random", "*mut Random128"),
            ],
            Some("c_int"),
        )
    }

    #[test]
    fn default_wrapping_is_all_plain() {
        let f = keypair();
        let table = analyze(&f, &WrappingConfig::default()).unwrap();
        assert_eq!(table.plain().count(), 3);
        assert_eq!(table.output_count(), 0);
        assert_eq!(
            table.get("pk").unwrap().wrapping_type,
            Some(ParamType::Exclusive("PK".into()))
        );
    }

    #[test]
    fn outputs_get_pointee_return_types() {
        let f = keypair();
        let table = analyze(&f, &outputs(&["pk", "sk"])).unwrap();
        let pk = table.get("pk").unwrap();
        assert_eq!(pk.role, ArgRole::Output);
        assert_eq!(pk.return_type.as_deref(), Some("PK"));
        assert!(pk.wrapping_type.is_none());
        let plain: Vec<_> = table.plain().map(|a| a.name.as_str()).collect();
        assert_eq!(plain, ["random"]);
    }

    #[test]
    fn outputs_keep_listed_order() {
        let f = keypair();
        let table = analyze(&f, &outputs(&["sk", "pk"])).unwrap();
        let order: Vec<_> = table.outputs().map(|a| a.name.as_str()).collect();
        assert_eq!(order, ["sk", "pk"]);
    }

    #[test]
    fn mapped_from_plain_keeps_binding_type() {
        let f = function(
            "polyveck_add",
            &[("w", "*mut PolyVecK"), ("u", "*const PolyVecK"), ("v", "*const PolyVecK")],
            None,
        );
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("u", "w")]),
            ..WrappingConfig::default()
        };
        let table = analyze(&f, &wrapping).unwrap();
        let u = table.get("u").unwrap();
        assert_eq!(u.role, ArgRole::Mapped { from: 0, cast: false });
        assert_eq!(u.binding_type, BaseType::PointerConst("PolyVecK".into()));
        let plain: Vec<_> = table.plain().map(|a| a.name.as_str()).collect();
        assert_eq!(plain, ["w", "v"]);
    }

    #[test]
    fn mapped_from_output_substitutes_pointee() {
        let f = function(
            "pack",
            &[("out", "*mut [u8; N]"), ("seed", "*const [u8; 32]")],
            None,
        );
        let wrapping = WrappingConfig {
            uninit_mutate_init_return: vec!["out".into()],
            arg_mapping_from: mapping(&[("seed", "out")]),
            map_types: MapTypes::Explicit,
            ..WrappingConfig::default()
        };
        let table = analyze(&f, &wrapping).unwrap();
        let seed = table.get("seed").unwrap();
        assert_eq!(seed.role, ArgRole::Mapped { from: 0, cast: true });
        assert_eq!(seed.binding_type, BaseType::PointerConst("[u8; N]".into()));
    }

    #[test]
    fn implicit_mapping_type_mismatch() {
        let f = function(
            "crypto_sign",
            &[("sig", "*mut [u8; N]"), ("siglen_out", "*mut usize")],
            Some("c_int"),
        );
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("siglen_out", "sig")]),
            ..WrappingConfig::default()
        };
        match analyze(&f, &wrapping) {
            Err(GenerateError::TypeMismatch {
                argument,
                expected,
                found,
                ..
            }) => {
                assert_eq!(argument, "siglen_out");
                assert_eq!(expected, "usize");
                assert_eq!(found, "[u8; N]");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }

        let explicit = WrappingConfig {
            map_types: MapTypes::Explicit,
            ..wrapping
        };
        let table = analyze(&f, &explicit).unwrap();
        assert_eq!(
            table.get("siglen_out").unwrap().role,
            ArgRole::Mapped { from: 0, cast: true }
        );
    }

    #[test]
    fn mapped_and_output_conflict() {
        let f = keypair();
        let wrapping = WrappingConfig {
            uninit_mutate_init_return: vec!["sk".into()],
            arg_mapping_from: mapping(&[("sk", "pk")]),
            ..WrappingConfig::default()
        };
        assert!(matches!(
            analyze(&f, &wrapping),
            Err(GenerateError::ArgumentRoleConflict { .. })
        ));
    }

    #[test]
    fn duplicate_output_conflict() {
        let f = keypair();
        assert!(matches!(
            analyze(&f, &outputs(&["pk", "pk"])),
            Err(GenerateError::ArgumentRoleConflict { .. })
        ));
    }

    #[test]
    fn unknown_output_rejected() {
        let f = keypair();
        assert!(matches!(
            analyze(&f, &outputs(&["seed"])),
            Err(GenerateError::UnknownArgument { .. })
        ));
    }

    #[test]
    fn unknown_mapping_target_rejected() {
        let f = keypair();
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("sk", "nope")]),
            ..WrappingConfig::default()
        };
        assert!(matches!(
            analyze(&f, &wrapping),
            Err(GenerateError::UnknownArgument { .. })
        ));
    }

    #[test]
    fn forward_reference_rejected() {
        let f = keypair();
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("pk", "sk")]),
            map_types: MapTypes::Explicit,
            ..WrappingConfig::default()
        };
        match analyze(&f, &wrapping) {
            Err(GenerateError::UnknownArgument { argument, detail, .. }) => {
                assert_eq!(argument, "sk");
                assert!(detail.contains("declared after"));
            }
            other => panic!("expected UnknownArgument, got {other:?}"),
        }
    }

    #[test]
    fn chained_mapping_rejected() {
        let f = function(
            "f",
            &[("a", "*mut T"), ("b", "*const T"), ("c", "*const T")],
            None,
        );
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("b", "a"), ("c", "b")]),
            ..WrappingConfig::default()
        };
        assert!(matches!(
            analyze(&f, &wrapping),
            Err(GenerateError::ArgumentRoleConflict { .. })
        ));
    }

    #[test]
    fn result_requires_return() {
        let f = function("poly_ntt", &[("a", "*mut Poly")], None);
        let wrapping = WrappingConfig {
            return_as_result: Some(ResultConvention::ZeroIsOk),
            ..WrappingConfig::default()
        };
        assert!(matches!(
            analyze(&f, &wrapping),
            Err(GenerateError::MissingReturnForResult { .. })
        ));
    }

    #[test]
    fn output_must_be_pointer() {
        let f = function("f", &[("n", "u16")], None);
        assert!(matches!(
            analyze(&f, &outputs(&["n"])),
            Err(GenerateError::NotAPointer { .. })
        ));
    }

    #[test]
    fn mutable_alias_of_shared_rejected() {
        let f = function("f", &[("src", "*const T"), ("dst", "*mut T")], None);
        let wrapping = WrappingConfig {
            arg_mapping_from: mapping(&[("dst", "src")]),
            ..WrappingConfig::default()
        };
        assert!(matches!(
            analyze(&f, &wrapping),
            Err(GenerateError::AliasMutability { .. })
        ));
    }

    #[test]
    fn value_arguments_stay_values() {
        let f = function(
            "polyvecl_uniform_eta",
            &[("v", "*mut PolyVecL"), ("seed", "*const [u8; CRHBYTES]"), ("nonce", "u16")],
            None,
        );
        let table = analyze(&f, &outputs(&["v"])).unwrap();
        assert_eq!(
            table.get("nonce").unwrap().wrapping_type,
            Some(ParamType::Value("u16".into()))
        );
        assert_eq!(
            table.get("seed").unwrap().wrapping_type,
            Some(ParamType::Shared("[u8; CRHBYTES]".into()))
        );
    }
}
