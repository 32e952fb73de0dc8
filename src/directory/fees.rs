use bitcoin::blockdata::script::Builder;
use bitcoin::consensus::encode::serialize;

use crate::chain::{Script, TxOut, Value};
use crate::directory::commitment::commitment_digest;

/// Serialized size of a typical spending input, added to every estimate.
pub const INPUT_OVERHEAD: usize = 148;

/// Scale applied to the relay fee when funding an operation recipient.
pub const RECIPIENT_FEE_MULTIPLIER: u64 = 3;

pub const DEFAULT_CONFIRMATION_TARGET: u32 = 6;

/// Base units per 1000 bytes.
pub const DEFAULT_RELAY_FEE_RATE: Value = 1_000;

/// Source of minimum fees, usually backed by the node's fee estimator.
pub trait FeePolicy {
    /// Minimum fee for `size` bytes confirming within `confirmation_target` blocks.
    fn minimum_fee(&self, size: usize, confirmation_target: u32) -> Value;

    /// Minimum fee for `size` bytes to be relayed at all.
    fn relay_fee(&self, size: usize) -> Value;
}

/// A flat rate, in base units per 1000 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFeeRate {
    per_kb: Value,
}

impl RelayFeeRate {
    pub fn per_kb(per_kb: Value) -> Self {
        RelayFeeRate { per_kb }
    }

    /// Never rounds a positive rate down to zero for a non-empty size.
    pub fn fee(&self, size: usize) -> Value {
        let fee = self.per_kb.saturating_mul(size as Value) / 1000;
        if fee == 0 && size != 0 && self.per_kb > 0 {
            return 1;
        }
        fee
    }
}

impl Default for RelayFeeRate {
    fn default() -> Self {
        RelayFeeRate::per_kb(DEFAULT_RELAY_FEE_RATE)
    }
}

impl FeePolicy for RelayFeeRate {
    fn minimum_fee(&self, size: usize, _confirmation_target: u32) -> Value {
        self.fee(size)
    }

    fn relay_fee(&self, size: usize) -> Value {
        self.fee(size)
    }
}

/// An output to be added to a transaction being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub script_pubkey: Script,
    pub amount: Value,
    pub subtract_fee: bool,
}

/// Recipient for a data script, with the payload digest appended.
///
/// The digest must match the one the operation output references.
pub fn fee_recipient(script: &Script, payload: &[u8]) -> Recipient {
    let digest = Builder::new()
        .push_slice(&commitment_digest(payload))
        .into_script();
    let mut bytes = script.to_bytes();
    bytes.extend_from_slice(digest.as_bytes());
    Recipient {
        script_pubkey: Script::from(bytes),
        amount: 0,
        subtract_fee: false,
    }
}

pub struct FeeCalculator<'a, P: FeePolicy + ?Sized> {
    policy: &'a P,
    confirmation_target: u32,
    input_overhead: usize,
    recipient_multiplier: u64,
}

impl<'a, P: FeePolicy + ?Sized> FeeCalculator<'a, P> {
    pub fn new(policy: &'a P) -> Self {
        FeeCalculator {
            policy,
            confirmation_target: DEFAULT_CONFIRMATION_TARGET,
            input_overhead: INPUT_OVERHEAD,
            recipient_multiplier: RECIPIENT_FEE_MULTIPLIER,
        }
    }

    pub fn with_confirmation_target(mut self, confirmation_target: u32) -> Self {
        self.confirmation_target = confirmation_target;
        self
    }

    pub fn with_input_overhead(mut self, input_overhead: usize) -> Self {
        self.input_overhead = input_overhead;
        self
    }

    pub fn with_recipient_multiplier(mut self, recipient_multiplier: u64) -> Self {
        self.recipient_multiplier = recipient_multiplier;
        self
    }

    pub fn recipient_multiplier(&self) -> u64 {
        self.recipient_multiplier
    }

    /// Size of a zero-value output locked by `script`, plus one input.
    pub fn estimated_size(&self, script: &Script) -> usize {
        let txout = TxOut {
            value: 0,
            script_pubkey: script.clone(),
        };
        serialize(&txout).len() + self.input_overhead
    }

    /// Anti-spam fee for an operation output.
    pub fn operation_fee(&self, script: &Script) -> Value {
        self.minimum_fee(script)
    }

    /// Anti-spam fee for a data output.
    pub fn data_fee(&self, script: &Script) -> Value {
        self.minimum_fee(script)
    }

    /// Recipient locked by `script`, funded with `recipient_multiplier` times
    /// the relay fee.
    pub fn recipient(&self, script: &Script) -> Recipient {
        let size = self.estimated_size(script);
        Recipient {
            script_pubkey: script.clone(),
            amount: self
                .recipient_multiplier
                .saturating_mul(self.policy.relay_fee(size)),
            subtract_fee: false,
        }
    }

    fn minimum_fee(&self, script: &Script) -> Value {
        let size = self.estimated_size(script);
        self.policy.minimum_fee(size, self.confirmation_target)
    }
}
