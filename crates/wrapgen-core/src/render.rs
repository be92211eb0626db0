//! Text rendering of generated units.
//!
//! Rendering is a pure function of a [`GeneratedUnit`]: the same unit always
//! produces byte-identical source text.

use wrapgen_catalog::BaseType;

use crate::assemble::{GeneratedUnit, Wrapper};
use crate::body::{Access, CallArg, ReturnValue, Stmt};
use crate::selftest::{Fixture, FixtureArg, SelfTest, TestCall, FILLER_BYTE};
use crate::signature::{RawDeclaration, ReturnShape};

/// Calls longer than this are split one argument per line.
const MAX_WIDTH: usize = 100;

const INDENT: &str = "    ";

/// `cfg(p)` for a single predicate, `cfg(all(p, q))` for several.
pub fn cfg_attr<S: AsRef<str>>(predicates: &[S]) -> String {
    match predicates {
        [single] => format!("cfg({})", single.as_ref()),
        many => {
            let joined: Vec<&str> = many.iter().map(AsRef::as_ref).collect();
            format!("cfg(all({}))", joined.join(", "))
        }
    }
}

/// Render the full source text of a unit.
pub fn render_unit(unit: &GeneratedUnit) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "//! FFI bindings and safe wrappers for {}{} ({}).",
        unit.scheme, unit.level, unit.implementation
    ));
    lines.push("//!".to_string());
    lines.push("//! Generated by wrapgen. Do not edit manually.".to_string());
    lines.push(String::new());

    if !unit.uses.is_empty() {
        lines.extend(unit.uses.iter().cloned());
        lines.push(String::new());
    }

    for constant in unit.constants.all() {
        lines.push(format!(
            "pub const {}: usize = {};",
            constant.name, constant.value
        ));
    }
    lines.push(String::new());

    lines.push(format!("#[link(name = \"{}\")]", unit.link_name));
    lines.push("extern \"C\" {".to_string());
    for (i, decl) in unit.declarations.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        render_declaration(decl, &mut lines);
    }
    lines.push("}".to_string());

    for wrapper in &unit.wrappers {
        lines.push(String::new());
        render_wrapper(wrapper, &mut lines);
    }

    if let Some(test) = &unit.self_test {
        lines.push(String::new());
        render_self_test(test, &mut lines);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn render_declaration(decl: &RawDeclaration, lines: &mut Vec<String>) {
    let params: Vec<String> = decl
        .params
        .iter()
        .map(|(name, ty)| format!("{name}: {ty}"))
        .collect();
    let ret = decl
        .return_type
        .as_ref()
        .map(|t| format!(" -> {t}"))
        .unwrap_or_default();

    let single = format!("{INDENT}pub fn {}({}){ret};", decl.symbol, params.join(", "));
    if single.len() <= MAX_WIDTH {
        lines.push(single);
        return;
    }
    lines.push(format!("{INDENT}pub fn {}(", decl.symbol));
    for param in params {
        lines.push(format!("{INDENT}{INDENT}{param},"));
    }
    lines.push(format!("{INDENT}){ret};"));
}

fn render_wrapper(wrapper: &Wrapper, lines: &mut Vec<String>) {
    let sig = &wrapper.signature;
    if let Some(doc) = &sig.doc {
        for line in doc.lines() {
            if line.is_empty() {
                lines.push("///".to_string());
            } else {
                lines.push(format!("/// {line}"));
            }
        }
    }

    let params: Vec<String> = sig
        .params
        .iter()
        .map(|(name, ty)| format!("{name}: {ty}"))
        .collect();
    let ret = return_type(&sig.returns)
        .map(|t| format!(" -> {t}"))
        .unwrap_or_default();

    let single = format!("pub fn {}({}){ret} {{", sig.name, params.join(", "));
    if single.len() <= MAX_WIDTH {
        lines.push(single);
    } else {
        lines.push(format!("pub fn {}(", sig.name));
        for param in &params {
            lines.push(format!("{INDENT}{param},"));
        }
        lines.push(format!("){ret} {{"));
    }

    let capture = capture_name(wrapper);
    for stmt in &wrapper.body {
        render_stmt(stmt, &capture, lines);
    }
    lines.push("}".to_string());
}

fn return_type(shape: &ReturnShape) -> Option<String> {
    match shape {
        ReturnShape::Unit => None,
        ReturnShape::Raw(ty) => Some(ty.to_string()),
        ReturnShape::Outputs(types) => Some(tuple(types)),
        ReturnShape::Result { ok, .. } => Some(format!("Result<{}, ()>", tuple(ok))),
    }
}

/// `()` for nothing, the item itself for one, a tuple for several.
fn tuple(items: &[String]) -> String {
    match items {
        [single] => single.clone(),
        many => format!("({})", many.join(", ")),
    }
}

/// Name binding the raw outcome, distinct from every argument.
fn capture_name(wrapper: &Wrapper) -> String {
    let taken = |name: &str| {
        wrapper.body.iter().any(|s| match s {
            Stmt::Call { args, .. } => args.iter().any(|a| a.storage == name),
            _ => false,
        }) || wrapper.signature.params.iter().any(|(n, _)| n == name)
    };
    let mut name = "res".to_string();
    while taken(&name) {
        name.push('_');
    }
    name
}

fn render_stmt(stmt: &Stmt, capture: &str, lines: &mut Vec<String>) {
    match stmt {
        Stmt::Allocate { name, ty } => {
            lines.push(format!(
                "{INDENT}let mut {name} = MaybeUninit::<{ty}>::uninit();"
            ));
        }
        Stmt::Call {
            symbol,
            args,
            capture: captured,
        } => {
            let args: Vec<String> = args.iter().map(call_arg).collect();
            let binding = if *captured {
                format!("let {capture} = ")
            } else {
                String::new()
            };
            render_unsafe_call(INDENT, &binding, symbol, &args, lines);
        }
        Stmt::FailUnlessZero => {
            lines.push(format!("{INDENT}if {capture} != 0 {{"));
            lines.push(format!("{INDENT}{INDENT}return Err(());"));
            lines.push(format!("{INDENT}}}"));
        }
        Stmt::AssumeInit { name } => {
            lines.push(format!(
                "{INDENT}let {name} = unsafe {{ {name}.assume_init() }};"
            ));
        }
        Stmt::Return(value) => {
            let expr = match value {
                ReturnValue::Raw => capture.to_string(),
                ReturnValue::Outputs(names) => tuple(names),
                ReturnValue::Ok(names) => format!("Ok({})", tuple(names)),
            };
            lines.push(format!("{INDENT}{expr}"));
        }
    }
}

fn call_arg(arg: &CallArg) -> String {
    let storage = &arg.storage;
    let base = match arg.access {
        Access::Value => storage.clone(),
        Access::Borrow { mutable: false } => format!("{storage} as *const _"),
        Access::Borrow { mutable: true } => format!("{storage} as *mut _"),
        Access::Uninit => format!("{storage}.as_mut_ptr()"),
    };
    match &arg.cast {
        Some(ty) => format!("{base} as {ty}"),
        None => base,
    }
}

/// `[let x = ]unsafe { symbol(args) };`, split over lines when too wide.
fn render_unsafe_call(
    indent: &str,
    binding: &str,
    symbol: &str,
    args: &[String],
    lines: &mut Vec<String>,
) {
    let single = format!("{indent}{binding}unsafe {{ {symbol}({}) }};", args.join(", "));
    if single.len() <= MAX_WIDTH {
        lines.push(single);
        return;
    }
    lines.push(format!("{indent}{binding}unsafe {{"));
    lines.push(format!("{indent}{INDENT}{symbol}("));
    for arg in args {
        lines.push(format!("{indent}{INDENT}{INDENT}{arg},"));
    }
    lines.push(format!("{indent}{INDENT})"));
    lines.push(format!("{indent}}};"));
}

fn render_self_test(test: &SelfTest, lines: &mut Vec<String>) {
    let body = format!("{INDENT}{INDENT}");
    lines.push(format!("#[{}]", cfg_attr(&test.cfgs)));
    lines.push("mod tests {".to_string());
    lines.push(format!("{INDENT}use super::*;"));
    lines.push(String::new());
    lines.push(format!("{INDENT}#[test]"));
    lines.push(format!("{INDENT}fn test_sign_verify() {{"));
    lines.push(format!("{body}let msg = b\"{}\";", byte_string(&test.message)));
    lines.push(String::new());
    lines.push(format!("{body}let mut pk = [0u8; {}];", test.publickey_bytes));
    lines.push(format!("{body}let mut sk = [0u8; {}];", test.secretkey_bytes));
    lines.push(format!("{body}let mut sig = [0u8; {}];", test.signature_bytes));
    lines.push(format!("{body}let mut siglen: usize = 0;"));

    for (call, failure) in [
        (&test.keypair, "key generation failed"),
        (&test.sign, "signing failed"),
        (&test.verify, "signature rejected"),
    ] {
        lines.push(String::new());
        render_test_call(call, failure, lines);
    }

    lines.push(format!("{INDENT}}}"));
    lines.push("}".to_string());
}

fn render_test_call(call: &TestCall, failure: &str, lines: &mut Vec<String>) {
    let body = format!("{INDENT}{INDENT}");
    for arg in &call.args {
        if let Fixture::Filler { pointee } = &arg.fixture {
            lines.push(format!(
                "{body}let mut {} = core::mem::MaybeUninit::<{pointee}>::uninit();",
                arg.name
            ));
            lines.push(format!(
                "{body}unsafe {{ core::ptr::write_bytes({}.as_mut_ptr(), {FILLER_BYTE:#04X}, 1) }};",
                arg.name
            ));
        }
    }

    let args: Vec<String> = call.args.iter().map(fixture_arg).collect();
    render_unsafe_call(&body, "let res = ", &call.symbol, &args, lines);
    lines.push(format!(
        "{body}assert_eq!(res, 0, \"{}: {failure}\");",
        call.function
    ));
}

fn fixture_arg(arg: &FixtureArg) -> String {
    let pointer = |storage: &str| match &arg.ty {
        BaseType::PointerMut(_) => format!("{storage}.as_mut_ptr() as *mut _"),
        _ => format!("{storage}.as_ptr() as *const _"),
    };
    match &arg.fixture {
        Fixture::PublicKey => pointer("pk"),
        Fixture::SecretKey => pointer("sk"),
        Fixture::Signature => pointer("sig"),
        Fixture::SignatureLen => match &arg.ty {
            BaseType::Value(_) => "siglen as _".to_string(),
            BaseType::PointerMut(_) => "core::ptr::addr_of_mut!(siglen) as *mut _".to_string(),
            BaseType::PointerConst(_) => "core::ptr::addr_of!(siglen) as *const _".to_string(),
        },
        Fixture::Message => match &arg.ty {
            BaseType::PointerMut(_) => "msg.as_ptr() as *mut _".to_string(),
            _ => "msg.as_ptr() as *const _".to_string(),
        },
        Fixture::MessageLen => "msg.len() as _".to_string(),
        Fixture::Filler { .. } => pointer(&arg.name),
        Fixture::Zero => "Default::default()".to_string(),
    }
}

/// Contents of a byte string literal holding `message`.
fn byte_string(message: &str) -> String {
    message
        .bytes()
        .flat_map(std::ascii::escape_default)
        .map(char::from)
        .collect()
}
