use std::collections::HashMap;
use std::str::FromStr;

pub use bitcoin::{
    blockdata::{opcodes, script},
    consensus::deserialize,
    hashes,
    util::address,
    Address, Block, BlockHash, BlockHeader, OutPoint, Script, Transaction, TxIn, TxOut, Txid,
};

pub use bitcoin::network::constants::Network as BNetwork;

use crate::errors::*;

pub type Value = u64;

#[derive(Debug, Copy, Clone, PartialEq, Hash, Serialize, Ord, PartialOrd, Eq)]
pub enum Network {
    Bitcoin,
    Testnet,
    Regtest,
    Signet,
}

impl Network {
    pub fn names() -> Vec<String> {
        vec![
            "mainnet".to_string(),
            "testnet".to_string(),
            "regtest".to_string(),
            "signet".to_string(),
        ]
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(network_name: &str) -> Result<Self> {
        Ok(match network_name {
            "mainnet" => Network::Bitcoin,
            "testnet" => Network::Testnet,
            "regtest" => Network::Regtest,
            "signet" => Network::Signet,
            _ => bail!(ErrorKind::UnknownNetwork(network_name.to_string())),
        })
    }
}

impl From<Network> for BNetwork {
    fn from(network: Network) -> Self {
        match network {
            Network::Bitcoin => BNetwork::Bitcoin,
            Network::Testnet => BNetwork::Testnet,
            Network::Regtest => BNetwork::Regtest,
            Network::Signet => BNetwork::Signet,
        }
    }
}

/// Read access to the unspent output set.
///
/// `None` means the output is spent or was never created; it is not an error.
pub trait UtxoView {
    fn lookup(&self, outpoint: &OutPoint) -> Option<TxOut>;
}

impl UtxoView for HashMap<OutPoint, TxOut> {
    fn lookup(&self, outpoint: &OutPoint) -> Option<TxOut> {
        self.get(outpoint).cloned()
    }
}

/// A read-consistent view of the active chain.
///
/// Implementations are expected to be snapshots (or read guards held by the
/// caller) so that `tip_height` and `block_at` agree with each other for the
/// duration of a lookup.
pub trait ChainState {
    fn tip_height(&self) -> u32;

    fn block_at(&self, height: u32) -> Result<Block>;
}

/// Locate `txid` inside the block at `height`.
///
/// Negative and above-tip heights fail fast, before any block is read. A block
/// that cannot be read is reported the same way as a missing transaction.
pub fn find_transaction<C>(chain: &C, height: i64, txid: &Txid) -> Option<Transaction>
where
    C: ChainState + ?Sized,
{
    if height < 0 || height > i64::from(chain.tip_height()) {
        debug!("height {} outside of active chain", height);
        return None;
    }
    let height = height as u32;
    let block = match chain.block_at(height) {
        Ok(block) => block,
        Err(e) => {
            warn!("failed to read block at height {}: {}", height, e);
            return None;
        }
    };
    block.txdata.into_iter().find(|tx| tx.txid() == *txid)
}
