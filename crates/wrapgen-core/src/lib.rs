//! Binding generation engine for wrapgen.
//!
//! Turns a function catalog and a parameter catalog into one Rust source
//! unit per (security level, implementation) variant: raw `extern "C"`
//! declarations plus safe wrappers that hide pointer plumbing.
//!
//! ## Modules
//!
//! - [`analyze`]: Argument roles (plain, mapped, output) per wrapping
//! - [`signature`]: Raw declarations and wrapper signatures
//! - [`body`]: Wrapper body statements
//! - [`selftest`]: Key generation, signing and verification self-test plan
//! - [`constants`]: Byte-length constants and reference header checks
//! - [`load`]: Catalog loading with generation errors
//! - [`assemble`]: Per-variant unit assembly
//! - [`render`]: Source text rendering
//! - [`modules`]: cfg-gated module index

pub mod analyze;
pub mod assemble;
pub mod body;
pub mod constants;
pub mod error;
pub mod load;
pub mod modules;
pub mod render;
pub mod selftest;
pub mod signature;

// Re-export key types for convenience
pub use analyze::{analyze, ArgRole, ArgumentInfo, ArgumentTable};
pub use assemble::{
    assemble_all, assemble_unit, selected_variants, validate, GenerateOptions, GeneratedUnit, Wrapper,
};
pub use body::{emit_body, Stmt};
pub use constants::{check_all, check_header, unit_constants};
pub use error::{GenerateError, Result};
pub use load::{load_functions, load_parameters};
pub use modules::render_module_index;
pub use render::render_unit;
pub use signature::{raw_declaration, wrapper_signature, RawDeclaration, ReturnShape, WrapperSignature};
