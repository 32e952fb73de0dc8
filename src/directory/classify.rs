use bitcoin::blockdata::opcodes::{
    self,
    all::{OP_2DROP, OP_DROP, OP_RETURN},
};
use bitcoin::blockdata::script::Builder;

use crate::chain::{Address, Network, Script};
use crate::directory::cursor::{ScriptCursor, Token};
use crate::directory::opcodes::{OperationCode, MARKER, OPCODE_BASE, UNKNOWN_OPERATION};

/// What the first two tokens of a locking script say about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "operation", rename_all = "snake_case")]
pub enum Classification {
    NotTagged,
    /// The marker is present but the operation token is missing or out of range.
    Malformed,
    Operation(OperationCode),
}

impl Classification {
    pub fn operation(self) -> Option<OperationCode> {
        match self {
            Classification::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_operation(self) -> bool {
        self.operation().is_some()
    }

    pub fn name(self) -> &'static str {
        self.operation().map_or(UNKNOWN_OPERATION, OperationCode::name)
    }

    /// Integer form used by legacy callers: the operation offset, `0` when
    /// untagged and `-1` when malformed.
    pub fn code(self) -> i32 {
        match self {
            Classification::NotTagged => 0,
            Classification::Malformed => -1,
            Classification::Operation(op) => i32::from(op.offset()),
        }
    }
}

fn offset(opcode: u8) -> i32 {
    i32::from(opcode) - i32::from(OPCODE_BASE)
}

fn is_drop(opcode: u8) -> bool {
    opcode == OP_DROP.into_u8() || opcode == OP_2DROP.into_u8()
}

fn classify_prefix(cursor: &mut ScriptCursor) -> Classification {
    match cursor.next_token() {
        Token::Opcode(op) if offset(op) == i32::from(MARKER) => (),
        _ => return Classification::NotTagged,
    }
    match cursor.next_token() {
        Token::Opcode(op) => OperationCode::from_offset(offset(op))
            .map_or(Classification::Malformed, Classification::Operation),
        _ => Classification::Malformed,
    }
}

/// Classify a locking script by its two-token prefix only.
pub fn classify(script: &Script) -> Classification {
    classify_prefix(&mut ScriptCursor::new(script))
}

/// A fully decoded operation script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOperation {
    pub code: OperationCode,
    /// Positional operation arguments, in script order.
    pub params: Vec<Vec<u8>>,
    /// The ordinary locking script following the dropped operation data.
    pub destination: Script,
}

/// Decode `MARKER CODE <param>* (OP_2DROP|OP_DROP)+ <destination>`.
pub fn decode_operation(script: &Script) -> Option<DecodedOperation> {
    let mut cursor = ScriptCursor::new(script);
    let code = classify_prefix(&mut cursor).operation()?;

    let mut params = vec![];
    loop {
        match cursor.next_token() {
            Token::PushData(data) => params.push(data.to_vec()),
            Token::Opcode(op) if is_drop(op) => break,
            _ => return None,
        }
    }
    loop {
        let mut ahead = cursor.clone();
        match ahead.next_token() {
            Token::Opcode(op) if is_drop(op) => cursor = ahead,
            _ => break,
        }
    }

    Some(DecodedOperation {
        code,
        params,
        destination: cursor.remaining(),
    })
}

/// Wrap `destination` with an operation prefix carrying `params`.
///
/// Enough drops are emitted to clear the marker, the code and every
/// parameter, so the result spends exactly like `destination`.
pub fn build_operation_script<P: AsRef<[u8]>>(
    code: OperationCode,
    params: &[P],
    destination: &Script,
) -> Script {
    let mut builder = Builder::new()
        .push_opcode(opcodes::All::from(OPCODE_BASE + MARKER))
        .push_opcode(opcodes::All::from(code.opcode()));
    for param in params {
        builder = builder.push_slice(param.as_ref());
    }
    let mut stacked = params.len() + 2;
    while stacked >= 2 {
        builder = builder.push_opcode(OP_2DROP);
        stacked -= 2;
    }
    if stacked == 1 {
        builder = builder.push_opcode(OP_DROP);
    }

    let mut bytes = builder.into_script().to_bytes();
    bytes.extend_from_slice(destination.as_bytes());
    Script::from(bytes)
}

/// The destination part of an operation script, or the script itself when
/// it does not decode as one.
pub fn strip_operation(script: &Script) -> Script {
    match decode_operation(script) {
        Some(decoded) => decoded.destination,
        None => script.clone(),
    }
}

/// `OP_RETURN <payload>`
pub fn build_data_script(payload: &[u8]) -> Script {
    Builder::new()
        .push_opcode(OP_RETURN)
        .push_slice(payload)
        .into_script()
}

/// Display address of the script's destination, used for audit output only.
pub fn script_address(script: &Script, network: Network) -> Option<Address> {
    Address::from_script(&strip_operation(script), network.into())
}
