//! Generated key-generation → signing → verification self-test.
//!
//! The test calls the raw declarations of a unit directly. Arguments are
//! bound to fixtures by name; anything unrecognised that is a pointer gets a
//! buffer of its pointee type filled with a fixed byte pattern.

use wrapgen_catalog::{BaseType, Variant};

use crate::constants::UnitConstants;
use crate::signature::RawDeclaration;

/// Byte written into every filler buffer. Not random; the test must be
/// reproducible.
pub const FILLER_BYTE: u8 = 0xA5;

/// Message signed by the self-test unless configured otherwise.
pub const DEFAULT_MESSAGE: &str = "hello world";

const KEYPAIR: &str = "crypto_sign_keypair";
const SIGN: &str = "crypto_sign_signature";
const VERIFY: &str = "crypto_sign_verify";

/// What a self-test call passes for one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixture {
    PublicKey,
    SecretKey,
    Signature,
    SignatureLen,
    Message,
    MessageLen,
    /// A pattern-filled value of the pointee type.
    Filler { pointee: String },
    /// `Default::default()` for value arguments nothing else matches.
    Zero,
}

/// One argument of a self-test call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureArg {
    pub name: String,
    pub fixture: Fixture,
    /// Binding type of the raw declaration parameter.
    pub ty: BaseType,
}

/// One raw call of the self-test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCall {
    /// Unprefixed function name, used in assertion messages.
    pub function: String,
    pub symbol: String,
    pub args: Vec<FixtureArg>,
}

/// The self-test of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTest {
    /// Predicates for the test module's `cfg`, including `test`.
    pub cfgs: Vec<String>,
    pub message: String,
    pub publickey_bytes: String,
    pub secretkey_bytes: String,
    pub signature_bytes: String,
    pub keypair: TestCall,
    pub sign: TestCall,
    pub verify: TestCall,
}

/// Plan the self-test for a unit, or `None` when the unit does not declare
/// all three signature functions with return values.
pub fn plan(
    variant: &Variant<'_>,
    declarations: &[RawDeclaration],
    constants: &UnitConstants,
    message: &str,
) -> Option<SelfTest> {
    let prefix = variant.symbol_prefix();
    let call = |function: &str| -> Option<TestCall> {
        let symbol = format!("{prefix}{function}");
        let decl = declarations.iter().find(|d| d.symbol == symbol)?;
        decl.return_type.as_ref()?;
        Some(TestCall {
            function: function.to_string(),
            symbol,
            args: decl
                .params
                .iter()
                .map(|(name, ty)| FixtureArg {
                    name: name.clone(),
                    fixture: fixture_for(name, ty),
                    ty: ty.clone(),
                })
                .collect(),
        })
    };

    let (Some(keypair), Some(sign), Some(verify)) = (call(KEYPAIR), call(SIGN), call(VERIFY))
    else {
        log::warn!("{variant}: signature functions missing from catalog, no self-test emitted");
        return None;
    };

    let mut cfgs = vec!["test".to_string()];
    cfgs.extend(variant.implementation.test_cfgs().iter().map(|c| c.to_string()));

    Some(SelfTest {
        cfgs,
        message: message.to_string(),
        publickey_bytes: constants.publickey.name.clone(),
        secretkey_bytes: constants.secretkey.name.clone(),
        signature_bytes: constants.signature.name.clone(),
        keypair,
        sign,
        verify,
    })
}

fn fixture_for(name: &str, ty: &BaseType) -> Fixture {
    match (name, ty.pointee()) {
        ("pk", Some(_)) => Fixture::PublicKey,
        ("sk", Some(_)) => Fixture::SecretKey,
        ("sig", Some(_)) => Fixture::Signature,
        ("siglen", _) => Fixture::SignatureLen,
        ("m" | "msg", Some(_)) => Fixture::Message,
        ("mlen" | "msglen", None) => Fixture::MessageLen,
        (_, Some(pointee)) => Fixture::Filler {
            pointee: pointee.to_string(),
        },
        (_, None) => Fixture::Zero,
    }
}
