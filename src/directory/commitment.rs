use bitcoin::blockdata::opcodes::all::{OP_PUSHNUM_16, OP_RETURN};
use bitcoin::hashes::{sha256d, Hash};
use itertools::Itertools;

use crate::chain::{Script, Transaction, TxOut};
use crate::directory::cursor::{ScriptCursor, Token};

/// Consensus limit on the size of a script that can be executed.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Payload of a data output together with its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment {
    pub payload: Vec<u8>,
    /// Hex text of the payload's double-SHA256, in display byte order.
    pub digest: Vec<u8>,
}

/// Digest that operation outputs reference to bind a payload.
pub fn commitment_digest(payload: &[u8]) -> Vec<u8> {
    let mut hash = sha256d::Hash::hash(payload).into_inner();
    hash.reverse();
    hex::encode(hash).into_bytes()
}

/// `OP_RETURN` followed by pushes only.
pub fn is_data_output(out: &TxOut) -> bool {
    let mut cursor = ScriptCursor::new(&out.script_pubkey);
    if cursor.next_token() != Token::Opcode(OP_RETURN.into_u8()) {
        return false;
    }
    loop {
        match cursor.next_token() {
            Token::End => return true,
            Token::PushData(_) => (),
            Token::Opcode(op) if op <= OP_PUSHNUM_16.into_u8() => (),
            Token::Opcode(_) | Token::Malformed => return false,
        }
    }
}

/// Payload of `OP_RETURN <payload> ...` and its digest.
///
/// Trailing pushes are ignored; `fee_recipient` appends the digest after the
/// payload. Whether the digest matches the one referenced by the operation
/// output is not checked here.
pub fn extract_commitment(script: &Script) -> Option<Commitment> {
    let mut cursor = ScriptCursor::new(script);
    if cursor.next_token() != Token::Opcode(OP_RETURN.into_u8()) {
        return None;
    }
    match cursor.next_token() {
        Token::PushData(payload) => Some(Commitment {
            payload: payload.to_vec(),
            digest: commitment_digest(payload),
        }),
        _ => None,
    }
}

/// Index of the first data output. Later ones are ignored.
pub fn data_output_index(tx: &Transaction) -> Option<usize> {
    tx.output
        .iter()
        .find_position(|out| is_data_output(out))
        .map(|(index, _)| index)
}

/// Commitment carried by the first data output of `tx`.
pub fn extract_transaction_commitment(tx: &Transaction) -> Option<(usize, Commitment)> {
    let index = data_output_index(tx)?;
    let commitment = extract_commitment(&tx.output[index].script_pubkey)?;
    Some((index, commitment))
}

/// `OP_RETURN` scripts and scripts too large to ever execute.
pub fn is_unspendable(script: &Script) -> bool {
    script.is_op_return() || script.len() > MAX_SCRIPT_SIZE
}

/// First unspendable script of `tx`.
///
/// An unrelated unspendable output placed before the real data output is
/// returned instead of it.
pub fn data_script(tx: &Transaction) -> Option<&Script> {
    tx.output
        .iter()
        .map(|out| &out.script_pubkey)
        .find(|script| is_unspendable(script))
}
