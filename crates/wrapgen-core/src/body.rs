//! Wrapper body emission.
//!
//! A wrapper body is an ordered list of statements: allocate output storage,
//! call the foreign function, check the outcome, mark outputs initialised,
//! and build the return value. Rendering to text happens in [`crate::render`].

use wrapgen_catalog::{BaseType, ResultConvention};

use crate::analyze::{ArgRole, ArgumentInfo, ArgumentTable};
use crate::signature::{ReturnShape, WrapperSignature};

/// How a call argument reaches its storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Passed by value.
    Value,
    /// A reference converted to a raw pointer of the given mutability.
    Borrow { mutable: bool },
    /// Pointer into uninitialised output storage.
    Uninit,
}

/// One argument of the foreign call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    /// Name of the variable whose storage is passed.
    pub storage: String,
    pub access: Access,
    /// Explicit pointer cast for mappings the catalog declares compatible.
    pub cast: Option<BaseType>,
}

/// The value a wrapper body ends with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnValue {
    /// The captured raw outcome.
    Raw,
    /// A single output or a tuple of outputs.
    Outputs(Vec<String>),
    /// `Ok` of unit, a single output or a tuple of outputs.
    Ok(Vec<String>),
}

/// A wrapper body statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Uninitialised storage for an output.
    Allocate { name: String, ty: String },
    /// The foreign call; `capture` binds the raw outcome.
    Call {
        symbol: String,
        args: Vec<CallArg>,
        capture: bool,
    },
    /// Return the failure payload when the raw outcome is not zero.
    FailUnlessZero,
    /// The output has been written and may be read.
    AssumeInit { name: String },
    Return(ReturnValue),
}

/// Emit the body of a wrapper whose signature is `signature`.
pub fn emit_body(symbol: &str, table: &ArgumentTable, signature: &WrapperSignature) -> Vec<Stmt> {
    let outputs: Vec<String> = table.outputs().map(|a| a.name.clone()).collect();
    let mut stmts = Vec::new();

    for arg in table.outputs() {
        if let Some(ty) = &arg.return_type {
            stmts.push(Stmt::Allocate {
                name: arg.name.clone(),
                ty: ty.clone(),
            });
        }
    }

    let capture = matches!(
        signature.returns,
        ReturnShape::Raw(_) | ReturnShape::Result { .. }
    );
    stmts.push(Stmt::Call {
        symbol: symbol.to_string(),
        args: table.args().iter().map(|a| call_arg(table, a)).collect(),
        capture,
    });

    if let ReturnShape::Result { convention, .. } = &signature.returns {
        match convention {
            ResultConvention::ZeroIsOk => stmts.push(Stmt::FailUnlessZero),
        }
    }

    for name in &outputs {
        stmts.push(Stmt::AssumeInit { name: name.clone() });
    }

    match &signature.returns {
        ReturnShape::Unit => {}
        ReturnShape::Raw(_) => stmts.push(Stmt::Return(ReturnValue::Raw)),
        ReturnShape::Outputs(_) => stmts.push(Stmt::Return(ReturnValue::Outputs(outputs))),
        ReturnShape::Result { .. } => stmts.push(Stmt::Return(ReturnValue::Ok(outputs))),
    }

    stmts
}

fn call_arg(table: &ArgumentTable, arg: &ArgumentInfo) -> CallArg {
    match arg.role {
        ArgRole::Plain => CallArg {
            storage: arg.name.clone(),
            access: borrow_of(&arg.binding_type),
            cast: None,
        },
        ArgRole::Output => CallArg {
            storage: arg.name.clone(),
            access: Access::Uninit,
            cast: None,
        },
        ArgRole::Mapped { from, cast } => {
            let source = table.at(from);
            let access = if source.role == ArgRole::Output {
                Access::Uninit
            } else {
                borrow_of(&arg.binding_type)
            };
            CallArg {
                storage: source.name.clone(),
                access,
                cast: cast.then(|| arg.binding_type.clone()),
            }
        }
    }
}

fn borrow_of(ty: &BaseType) -> Access {
    match ty {
        BaseType::Value(_) => Access::Value,
        BaseType::PointerConst(_) => Access::Borrow { mutable: false },
        BaseType::PointerMut(_) => Access::Borrow { mutable: true },
    }
}
