use clap::{App, Arg, ArgMatches};
use std::str::FromStr;

use crate::chain::{Network, Value};
use crate::directory::fees::{
    FeeCalculator, FeePolicy, RelayFeeRate, DEFAULT_CONFIRMATION_TARGET, DEFAULT_RELAY_FEE_RATE,
    INPUT_OVERHEAD, RECIPIENT_FEE_MULTIPLIER,
};
use crate::errors::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub network_type: Network,
    pub confirmation_target: u32,
    /// Base units per 1000 bytes.
    pub relay_fee_per_kb: Value,
    pub input_overhead: usize,
    pub recipient_fee_multiplier: u64,
    /// Raw transactions (hex) to inspect.
    pub transactions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            network_type: Network::Bitcoin,
            confirmation_target: DEFAULT_CONFIRMATION_TARGET,
            relay_fee_per_kb: DEFAULT_RELAY_FEE_RATE,
            input_overhead: INPUT_OVERHEAD,
            recipient_fee_multiplier: RECIPIENT_FEE_MULTIPLIER,
            transactions: vec![],
        }
    }
}

fn parse_arg<T: FromStr>(m: &ArgMatches, name: &str, default: T) -> Result<T> {
    match m.value_of(name) {
        Some(value) => value
            .parse()
            .map_err(|_| format!("invalid value for --{}: {:?}", name, value).into()),
        None => Ok(default),
    }
}

lazy_static! {
    static ref NETWORK_HELP: String = format!(
        "Select network type ({})",
        Network::names().join(", ")
    );
}

impl Config {
    pub fn app<'a, 'b>() -> App<'a, 'b> {
        App::new("dirop-inspect")
            .version(crate_version!())
            .about("Decode directory operations carried by raw transactions")
            .arg(
                Arg::with_name("verbosity")
                    .short("v")
                    .multiple(true)
                    .help("Increase logging verbosity"),
            )
            .arg(
                Arg::with_name("timestamp")
                    .long("timestamp")
                    .help("Prepend log lines with a timestamp"),
            )
            .arg(
                Arg::with_name("network")
                    .long("network")
                    .help(NETWORK_HELP.as_str())
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("confirmation_target")
                    .long("confirmation-target")
                    .help("Blocks within which fee estimates aim to confirm")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("relay_fee")
                    .long("relay-fee")
                    .help("Minimum relay fee rate, in base units per 1000 bytes")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("input_overhead")
                    .long("input-overhead")
                    .help("Bytes added to every output size estimate for the spending input")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("recipient_fee_multiplier")
                    .long("recipient-fee-multiplier")
                    .help("Multiple of the relay fee used to fund operation outputs")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("transactions")
                    .help("Raw transactions, hex encoded")
                    .multiple(true),
            )
    }

    pub fn from_matches(m: &ArgMatches) -> Result<Config> {
        let defaults = Config::default();
        let network_type = match m.value_of("network") {
            Some(name) => name.parse()?,
            None => defaults.network_type,
        };
        Ok(Config {
            network_type,
            confirmation_target: parse_arg(m, "confirmation_target", defaults.confirmation_target)?,
            relay_fee_per_kb: parse_arg(m, "relay_fee", defaults.relay_fee_per_kb)?,
            input_overhead: parse_arg(m, "input_overhead", defaults.input_overhead)?,
            recipient_fee_multiplier: parse_arg(
                m,
                "recipient_fee_multiplier",
                defaults.recipient_fee_multiplier,
            )?,
            transactions: m
                .values_of("transactions")
                .map_or_else(Vec::new, |values| values.map(String::from).collect()),
        })
    }

    /// Parse the command line and set up logging.
    pub fn from_args() -> Result<Config> {
        let m = Config::app().get_matches();

        let mut log = stderrlog::new();
        log.verbosity(m.occurrences_of("verbosity") as usize);
        log.timestamp(if m.is_present("timestamp") {
            stderrlog::Timestamp::Millisecond
        } else {
            stderrlog::Timestamp::Off
        });
        log.init().chain_err(|| "logging initialization failed")?;

        let config = Config::from_matches(&m)?;
        debug!("{:?}", config);
        Ok(config)
    }

    pub fn relay_fee_rate(&self) -> RelayFeeRate {
        RelayFeeRate::per_kb(self.relay_fee_per_kb)
    }

    pub fn fee_calculator<'a, P: FeePolicy + ?Sized>(&self, policy: &'a P) -> FeeCalculator<'a, P> {
        FeeCalculator::new(policy)
            .with_confirmation_target(self.confirmation_target)
            .with_input_overhead(self.input_overhead)
            .with_recipient_multiplier(self.recipient_fee_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chain::Script;

    fn parse(args: &[&str]) -> Result<Config> {
        let m = Config::app().get_matches_from(args.iter().cloned());
        Config::from_matches(&m)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["dirop-inspect"]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.recipient_fee_multiplier, 3);
        assert_eq!(config.input_overhead, 148);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "dirop-inspect",
            "--network",
            "regtest",
            "--confirmation-target",
            "2",
            "--relay-fee",
            "5000",
            "--recipient-fee-multiplier",
            "1",
            "0200",
            "0100",
        ])
        .unwrap();
        assert_eq!(config.network_type, Network::Regtest);
        assert_eq!(config.confirmation_target, 2);
        assert_eq!(config.relay_fee_rate(), RelayFeeRate::per_kb(5000));
        assert_eq!(config.recipient_fee_multiplier, 1);
        assert_eq!(config.transactions, vec!["0200", "0100"]);
    }

    #[test]
    fn test_every_network_name_accepted() {
        for name in Network::names() {
            let config = parse(&["dirop-inspect", "--network", &name]).unwrap();
            assert_eq!(config.network_type, name.parse::<Network>().unwrap());
            assert!(NETWORK_HELP.contains(&name));
        }
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse(&["dirop-inspect", "--network", "nowhere"]).is_err());
        assert!(parse(&["dirop-inspect", "--relay-fee", "cheap"]).is_err());
    }

    #[test]
    fn test_fee_calculator_uses_config() {
        let config = Config {
            recipient_fee_multiplier: 5,
            input_overhead: 0,
            ..Config::default()
        };
        let rate = RelayFeeRate::per_kb(1000);
        let calc = config.fee_calculator(&rate);
        let script = Script::from(vec![0x51; 11]);
        assert_eq!(calc.estimated_size(&script), 20);
        assert_eq!(calc.recipient(&script).amount, 100);
    }
}
