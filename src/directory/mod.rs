//! Directory operations carried in ledger outputs.
//!
//! An operation output starts with two small-integer opcodes: the marker
//! `OP_1` and the operation code (`OP_2`..`OP_14`). Pushed parameters follow,
//! then enough drops to clear them, then an ordinary locking script. The
//! payload of an operation lives in a separate `OP_RETURN` output, bound to
//! the operation by its digest.

pub mod classify;
pub mod commitment;
pub mod cursor;
pub mod fees;
pub mod opcodes;
pub mod scan;

pub use self::classify::{
    build_data_script, build_operation_script, classify, decode_operation, script_address,
    strip_operation, Classification, DecodedOperation,
};
pub use self::commitment::{
    commitment_digest, data_output_index, data_script, extract_commitment,
    extract_transaction_commitment, is_data_output, is_unspendable, Commitment,
};
pub use self::cursor::{ScriptCursor, Token};
pub use self::fees::{fee_recipient, FeeCalculator, FeePolicy, Recipient, RelayFeeRate};
pub use self::opcodes::{object_type_label, operation_name, ObjectType, OperationCode};
pub use self::scan::{
    find_operation, is_operation_output, operation_code_of, operation_name_of,
    operation_output_index, operation_output_index_at, spends_operation_output, OperationOutput,
};
