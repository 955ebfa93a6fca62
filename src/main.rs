use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hsm_tx_signer::tx::{canonicalize_signature, encode_signing_payload, signing_hash};
use hsm_tx_signer::utils::json::{parse_hex_array, parse_hex_bytes, u256_to_hex};
use hsm_tx_signer::utils::logging;
use hsm_tx_signer::{
    address_from_public_key, assemble, parse_address, recover_address, transaction_hash,
    DecodedTransaction, ErrorCode, ErrorReport, JsonRpcClient, NetworkClient, RawSignature,
    SignerConfig, TransactionBuilder, TransactionRequest, TxError, UnsignedTransaction,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "hsm-tx-signer",
    version,
    about = "Build, assemble and inspect legacy EIP-155 transactions signed by an external device"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the account address of a raw 64-byte public key
    Address {
        /// Uncompressed public key X ‖ Y as hex, without the 04 prefix
        #[arg(long, value_name = "HEX")]
        public_key: String,
    },

    /// Print the EIP-55 checksum form of an address
    Checksum {
        address: String,
    },

    /// Print the signing payload and digest for a transaction request
    SigningHash {
        #[arg(long, value_name = "FILE")]
        request: PathBuf,

        /// Fetch a missing nonce and gas limit from the configured node
        #[arg(long)]
        network: bool,

        /// Sender used for the nonce lookup and gas estimate
        #[arg(long, value_name = "ADDRESS")]
        from: Option<String>,
    },

    /// Combine a request with an externally produced raw signature
    Assemble {
        #[arg(long, value_name = "FILE")]
        request: PathBuf,

        /// 32-byte r as hex
        #[arg(long, value_name = "HEX")]
        r: String,

        /// 32-byte s as hex
        #[arg(long, value_name = "HEX")]
        s: String,

        #[arg(long, value_name = "0|1")]
        recovery_id: u8,
    },

    /// Decode a raw transaction and recover its sender
    Decode {
        raw: String,
    },

    /// Verify a raw transaction and submit it to the configured node
    Broadcast {
        raw: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let report = match err.downcast_ref::<TxError>() {
                Some(tx_err) => ErrorReport {
                    code: tx_err.code(),
                    message: format!("{:#}", err),
                },
                None => ErrorReport {
                    code: ErrorCode::InvalidInput,
                    message: format!("{:#}", err),
                },
            };
            println!("{}", json!({ "error": report }));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value> {
    let config = load_config(cli.config.as_deref())?;
    if cli.debug || config.debug {
        logging::enable_debug();
    }

    match cli.command {
        Command::Address { public_key } => {
            let bytes = parse_hex_bytes(&public_key)?;
            let address = address_from_public_key(&bytes)?;
            Ok(json!({
                "address": address.to_hex(),
                "checksumAddress": address.to_checksum(),
            }))
        }

        Command::Checksum { address } => {
            let parsed = parse_address(&address)?;
            Ok(json!({ "address": parsed.to_checksum() }))
        }

        Command::SigningHash {
            request,
            network,
            from,
        } => {
            let tx = build_request(&config, &request, network, from.as_deref())?;
            Ok(json!({
                "payload": format!("0x{}", hex::encode(encode_signing_payload(&tx))),
                "digest": format!("0x{}", hex::encode(signing_hash(&tx))),
                "transaction": tx,
            }))
        }

        Command::Assemble {
            request,
            r,
            s,
            recovery_id,
        } => {
            let tx = TransactionBuilder::from_config(&config).build(&read_request(&request)?)?;
            let raw_signature = RawSignature::new(
                parse_hex_array::<32>(&r, "r")?,
                parse_hex_array::<32>(&s, "s")?,
                recovery_id,
            );

            let (signature, normalized) = canonicalize_signature(&raw_signature)?;
            let v = signature.v(tx.chain_id)?;
            let from = recover_address(&signing_hash(&tx), &signature)?;
            let raw = assemble(&tx, v, &signature.r, &signature.s);

            Ok(json!({
                "raw": format!("0x{}", hex::encode(&raw)),
                "hash": format!("0x{}", hex::encode(transaction_hash(&raw))),
                "from": from,
                "v": v,
                "r": u256_to_hex(&signature.r),
                "s": u256_to_hex(&signature.s),
                "normalized": normalized,
            }))
        }

        Command::Decode { raw } => {
            let bytes = parse_hex_bytes(&raw)?;
            let report = DecodedTransaction::from_raw(&bytes)?;
            Ok(serde_json::to_value(report)?)
        }

        Command::Broadcast { raw } => {
            let bytes = parse_hex_bytes(&raw)?;
            let report = DecodedTransaction::from_raw(&bytes)?;
            if report.chain_id != config.chain_id {
                return Err(TxError::invalid_input(format!(
                    "transaction is bound to chain {}, configured chain is {}",
                    report.chain_id, config.chain_id
                ))
                .into());
            }

            let client = JsonRpcClient::from_config(&config)?;
            let reported = client.send_raw_transaction(&bytes)?;
            Ok(json!({
                "hash": report.hash,
                "broadcastHash": format!("0x{}", hex::encode(reported)),
                "from": report.from,
                "chainId": report.chain_id,
            }))
        }
    }
}

fn build_request(
    config: &SignerConfig,
    path: &Path,
    network: bool,
    from: Option<&str>,
) -> Result<UnsignedTransaction> {
    let request = read_request(path)?;
    let builder = TransactionBuilder::from_config(config);

    let tx = match (network, from) {
        (true, Some(from)) => {
            let sender = parse_address(from)?;
            let client = JsonRpcClient::from_config(config)?;
            builder.build_with_network(&request, &client, &sender)?
        }
        (true, None) => {
            return Err(TxError::invalid_input("--network needs a --from address").into());
        }
        (false, _) => builder.build(&request)?,
    };
    Ok(tx)
}

fn load_config(path: Option<&Path>) -> Result<SignerConfig> {
    let config = match path {
        Some(path) => SignerConfig::from_file(path)?,
        None => SignerConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn read_request(path: &Path) -> Result<TransactionRequest> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| TxError::invalid_input(format!("Cannot read request {}: {}", path.display(), e)))?;
    let request = serde_json::from_str(&text)
        .map_err(TxError::from)
        .with_context(|| format!("parsing request {}", path.display()))?;
    Ok(request)
}
