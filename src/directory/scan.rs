use crate::chain::{find_transaction, ChainState, Script, Transaction, TxOut, Txid, UtxoView};
use crate::directory::classify::{classify, decode_operation, Classification};
use crate::directory::opcodes::OperationCode;

/// The operation output found in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutput<'a> {
    pub index: usize,
    pub code: OperationCode,
    pub params: Vec<Vec<u8>>,
    pub script: &'a Script,
}

pub fn operation_code_of(out: &TxOut) -> Classification {
    classify(&out.script_pubkey)
}

pub fn operation_name_of(out: &TxOut) -> &'static str {
    operation_code_of(out).name()
}

pub fn is_operation_output(out: &TxOut) -> bool {
    operation_code_of(out).is_operation()
}

/// First output of `tx` that decodes as a complete operation script.
///
/// Later operation outputs are ignored.
pub fn find_operation(tx: &Transaction) -> Option<OperationOutput<'_>> {
    let found = tx.output.iter().enumerate().find_map(|(index, out)| {
        let decoded = decode_operation(&out.script_pubkey)?;
        Some(OperationOutput {
            index,
            code: decoded.code,
            params: decoded.params,
            script: &out.script_pubkey,
        })
    });
    if let Some(ref op) = found {
        debug!(
            "tx {} carries {} at output {} ({} params)",
            tx.txid(),
            op.code,
            op.index,
            op.params.len()
        );
    }
    found
}

/// Index of the first output whose prefix classifies as an operation.
pub fn operation_output_index(tx: &Transaction) -> Option<usize> {
    tx.output.iter().position(is_operation_output)
}

/// Same as `operation_output_index`, for a transaction looked up in the block
/// at `height`.
pub fn operation_output_index_at<C>(chain: &C, height: i64, txid: &Txid) -> Option<usize>
where
    C: ChainState + ?Sized,
{
    operation_output_index(&find_transaction(chain, height, txid)?)
}

/// Whether any input of `tx` spends an unspent operation output.
///
/// Inputs whose previous output is spent or unknown are skipped.
pub fn spends_operation_output<U>(utxos: &U, tx: &Transaction) -> bool
where
    U: UtxoView + ?Sized,
{
    tx.input.iter().any(|txin| match utxos.lookup(&txin.previous_output) {
        Some(prevout) => is_operation_output(&prevout),
        None => {
            trace!("prevout {} spent or missing", txin.previous_output);
            false
        }
    })
}
