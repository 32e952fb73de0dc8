extern crate dirop;

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use std::process;

use error_chain::ChainedError;

use dirop::chain::{deserialize, Transaction};
use dirop::config::Config;
use dirop::directory::{
    extract_transaction_commitment, find_operation, script_address, Classification, FeePolicy,
};
use dirop::errors::*;
use dirop::identity;

#[derive(Serialize)]
struct OperationReport {
    index: usize,
    operation: Classification,
    name: &'static str,
    params: Vec<String>,
    address: Option<String>,
    fee: u64,
    recipient_amount: u64,
}

#[derive(Serialize)]
struct CommitmentReport {
    index: usize,
    payload: String,
    digest: String,
    fee: u64,
}

#[derive(Serialize)]
struct TxReport {
    txid: String,
    operation: Option<OperationReport>,
    commitment: Option<CommitmentReport>,
}

fn inspect<P: FeePolicy>(config: &Config, policy: &P, tx: &Transaction) -> TxReport {
    let fees = config.fee_calculator(policy);

    let operation = find_operation(tx).map(|op| OperationReport {
        index: op.index,
        operation: Classification::Operation(op.code),
        name: op.code.name(),
        params: op.params.iter().map(hex::encode).collect(),
        address: script_address(op.script, config.network_type).map(|a| a.to_string()),
        fee: fees.operation_fee(op.script),
        recipient_amount: fees.recipient(op.script).amount,
    });

    let commitment = extract_transaction_commitment(tx).map(|(index, commitment)| {
        CommitmentReport {
            index,
            payload: hex::encode(&commitment.payload),
            digest: String::from_utf8_lossy(&commitment.digest).into_owned(),
            fee: fees.data_fee(&tx.output[index].script_pubkey),
        }
    });

    TxReport {
        txid: tx.txid().to_string(),
        operation,
        commitment,
    }
}

fn run(config: Config) -> Result<()> {
    if !identity::sanity_check() {
        bail!("identity key self-test failed");
    }
    let policy = config.relay_fee_rate();
    for raw in &config.transactions {
        let bytes = hex::decode(raw.trim()).chain_err(|| "transaction is not valid hex")?;
        let tx: Transaction = deserialize(&bytes).chain_err(|| "failed to decode transaction")?;
        let report = inspect(&config, &policy, &tx);
        if report.operation.is_none() {
            info!("{}: no directory operation", report.txid);
        }
        let json = serde_json::to_string_pretty(&report).chain_err(|| "failed to render report")?;
        println!("{}", json);
    }
    Ok(())
}

fn main() {
    let result = Config::from_args().and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e.display_chain());
        process::exit(1);
    }
}
