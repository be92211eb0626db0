//! Source unit assembly.
//!
//! One [`GeneratedUnit`] is derived per implementation variant: constants,
//! the raw declaration block, every wrapper in catalog order and the
//! optional self-test. Units are independent, so they are derived in
//! parallel and collected back in variant order.

use std::collections::HashSet;

use rayon::prelude::*;
use wrapgen_catalog::{FunctionCatalog, Implementation, ParameterCatalog, Variant};

use crate::analyze::analyze;
use crate::body::{emit_body, Stmt};
use crate::constants::{unit_constants, UnitConstants};
use crate::error::{GenerateError, Result};
use crate::selftest::{self, SelfTest};
use crate::signature::{raw_declaration, wrapper_signature, RawDeclaration, WrapperSignature};

/// Options shared by every unit of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Implementations for which no unit is generated.
    pub skip: Vec<Implementation>,
    /// `use` lines placed after the file header.
    pub uses: Vec<String>,
    pub self_test: bool,
    /// Message signed by the self-test.
    pub message: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            skip: Vec::new(),
            uses: vec!["use super::*;".to_string()],
            self_test: true,
            message: selftest::DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// A safe wrapper: its signature and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub signature: WrapperSignature,
    pub body: Vec<Stmt>,
}

impl Wrapper {
    /// Whether the body allocates uninitialised output storage.
    pub fn uses_uninit(&self) -> bool {
        self.body.iter().any(|s| matches!(s, Stmt::Allocate { .. }))
    }
}

/// Everything one generated source file contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub scheme: String,
    pub level: u32,
    pub implementation: Implementation,
    /// Module name, e.g. `dilithium2_clean`.
    pub module: String,
    pub link_name: String,
    pub uses: Vec<String>,
    pub constants: UnitConstants,
    /// One declaration per function, in catalog order.
    pub declarations: Vec<RawDeclaration>,
    /// Every wrapper of every function, in catalog order.
    pub wrappers: Vec<Wrapper>,
    pub self_test: Option<SelfTest>,
}

/// Check every (function, wrapping) pair of the catalog once, independent
/// of any variant.
pub fn validate(catalog: &FunctionCatalog) -> Result<()> {
    for function in catalog.functions() {
        for wrapping in &function.wrappings {
            let table = analyze(function, wrapping)?;
            wrapper_signature(function, wrapping, &table)?;
        }
    }
    Ok(())
}

/// Derive the unit of one variant.
pub fn assemble_unit(
    catalog: &FunctionCatalog,
    variant: &Variant<'_>,
    options: &GenerateOptions,
) -> Result<GeneratedUnit> {
    let prefix = variant.symbol_prefix();
    let mut declarations = Vec::new();
    let mut wrappers = Vec::new();
    let mut names = HashSet::new();

    for function in catalog.for_implementation(variant.implementation) {
        let mut shared: Option<RawDeclaration> = None;
        for wrapping in &function.wrappings {
            let table = analyze(function, wrapping)?;
            let declaration = raw_declaration(&prefix, function, &table);
            let signature = wrapper_signature(function, wrapping, &table)?;

            // one extern item per symbol: every wrapping must bind it alike
            if let Some(first) = &shared {
                if *first != declaration {
                    return Err(GenerateError::DeclarationConflict {
                        function: function.name.clone(),
                        wrapper: signature.name,
                    });
                }
            }

            if !names.insert(signature.name.clone()) {
                return Err(GenerateError::DuplicateWrapper {
                    unit: variant.to_string(),
                    wrapper: signature.name,
                });
            }

            let body = emit_body(&declaration.symbol, &table, &signature);
            log::debug!(
                "{variant}: {} ({} params, {} outputs)",
                signature.name,
                signature.params.len(),
                table.output_count()
            );
            wrappers.push(Wrapper { signature, body });
            shared.get_or_insert(declaration);
        }
        declarations.extend(shared);
    }

    let constants = unit_constants(variant);
    let self_test = if options.self_test {
        selftest::plan(variant, &declarations, &constants, &options.message)
    } else {
        None
    };

    let mut uses = options.uses.clone();
    let maybe_uninit = "use core::mem::MaybeUninit;".to_string();
    if wrappers.iter().any(Wrapper::uses_uninit) && !uses.contains(&maybe_uninit) {
        uses.push(maybe_uninit);
    }

    Ok(GeneratedUnit {
        scheme: variant.scheme.to_string(),
        level: variant.level(),
        implementation: variant.implementation,
        module: variant.module_name(),
        link_name: variant.link_name(),
        uses,
        constants,
        declarations,
        wrappers,
        self_test,
    })
}

/// Variants not skipped by `options`, in catalog order.
pub fn selected_variants<'a>(
    params: &'a ParameterCatalog,
    options: &GenerateOptions,
) -> Vec<Variant<'a>> {
    params
        .variants()
        .into_iter()
        .filter(|v| !options.skip.contains(&v.implementation))
        .collect()
}

/// Derive the units of every variant not skipped by `options`.
///
/// Units are returned in variant order whatever order they finish in. The
/// first error in variant order is returned and no unit is produced.
pub fn assemble_all(
    catalog: &FunctionCatalog,
    params: &ParameterCatalog,
    options: &GenerateOptions,
) -> Result<Vec<GeneratedUnit>> {
    validate(catalog)?;

    let units = selected_variants(params, options)
        .par_iter()
        .map(|variant| assemble_unit(catalog, variant, options))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "derived {} units from {} catalog functions",
        units.len(),
        catalog.functions().len()
    );
    Ok(units)
}
