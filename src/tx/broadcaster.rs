//! Network Client
//!
//! The pipeline reaches the network only through [`NetworkClient`], passed in
//! explicitly by the caller. [`JsonRpcClient`] is the blocking JSON-RPC 2.0
//! implementation used in production.

use crate::address::Address;
use crate::error::{TxError, TxResult};
use crate::types::UnsignedTransaction;
use crate::utils::config::SignerConfig;
use crate::utils::json::{parse_hex_array, parse_hex_u64, u256_to_hex};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Node operations the pipeline depends on
pub trait NetworkClient {
    /// Gas the node expects `tx` to use when sent from `from`
    fn estimate_gas(&self, tx: &UnsignedTransaction, from: &Address) -> TxResult<u64>;

    /// Next nonce for `address`, counting pending transactions
    fn get_transaction_count(&self, address: &Address) -> TxResult<u64>;

    /// Submit broadcast bytes; returns the node-reported transaction hash
    fn send_raw_transaction(&self, raw: &[u8]) -> TxResult<[u8; 32]>;
}

impl<N: NetworkClient + ?Sized> NetworkClient for &N {
    fn estimate_gas(&self, tx: &UnsignedTransaction, from: &Address) -> TxResult<u64> {
        (**self).estimate_gas(tx, from)
    }

    fn get_transaction_count(&self, address: &Address) -> TxResult<u64> {
        (**self).get_transaction_count(address)
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> TxResult<[u8; 32]> {
        (**self).send_raw_transaction(raw)
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Blocking JSON-RPC 2.0 client over HTTP(S)
#[derive(Debug)]
pub struct JsonRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> TxResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hsm-tx-signer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TxError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &SignerConfig) -> TxResult<Self> {
        Self::new(config.rpc_url.clone(), config.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one JSON-RPC call and return its `result`
    pub fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> TxResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        crate::log_debug!("rpc", "Sending request", method = method, id = id);

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                method,
                params,
                id,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            crate::log_warn!("rpc", "Node returned error status", method = method, status = status);
            return Err(TxError::network(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse<T> = response
            .json()
            .map_err(|e| TxError::network(format!("Malformed {} response: {}", method, e)))?;
        unwrap_rpc_result(method, body)
    }
}

fn unwrap_rpc_result<T>(method: &str, body: RpcResponse<T>) -> TxResult<T> {
    if let Some(error) = body.error {
        crate::log_warn!("rpc", "Node rejected request", method = method, code = error.code);
        return Err(TxError::network(format!(
            "{} failed ({}): {}",
            method, error.code, error.message
        )));
    }
    body.result
        .ok_or_else(|| TxError::network(format!("{} returned no result", method)))
}

/// Call object for `eth_estimateGas`
fn call_object(tx: &UnsignedTransaction, from: &Address) -> Value {
    let mut call = json!({
        "from": from.to_hex(),
        "gasPrice": u256_to_hex(&tx.gas_price),
        "value": u256_to_hex(&tx.value),
        "data": format!("0x{}", hex::encode(&tx.data)),
    });
    if let Some(to) = &tx.to {
        call["to"] = Value::String(to.to_hex());
    }
    call
}

impl NetworkClient for JsonRpcClient {
    fn estimate_gas(&self, tx: &UnsignedTransaction, from: &Address) -> TxResult<u64> {
        let quantity: String = self.call("eth_estimateGas", json!([call_object(tx, from)]))?;
        parse_hex_u64(&quantity)
    }

    fn get_transaction_count(&self, address: &Address) -> TxResult<u64> {
        let quantity: String =
            self.call("eth_getTransactionCount", json!([address.to_hex(), "pending"]))?;
        parse_hex_u64(&quantity)
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> TxResult<[u8; 32]> {
        let hash: String =
            self.call("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))?;
        crate::log_info!("rpc", "Transaction accepted", tx_hash = hash);
        parse_hex_array::<32>(&hash, "transaction hash")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Answer one connection per canned result; yields the request bodies
    fn canned_node(results: Vec<Value>) -> (String, thread::JoinHandle<Vec<Value>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            results
                .into_iter()
                .map(|result| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let request: Value = serde_json::from_slice(&read_body(&mut stream)).unwrap();
                    let reply = json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }).to_string();
                    write!(
                        stream,
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.len(),
                        reply
                    )
                    .unwrap();
                    request
                })
                .collect()
        });
        (url, handle)
    }

    fn read_body(stream: &mut TcpStream) -> Vec<u8> {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        body
    }

    #[test]
    fn test_rpc_round_trips() {
        let tx_hash = format!("0x{}", "ab".repeat(32));
        let (url, node) = canned_node(vec![
            json!("0xc"),
            json!("0x5208"),
            json!(tx_hash.clone()),
        ]);
        let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();
        let sender = Address([0xaa; 20]);
        let tx = UnsignedTransaction::new(3)
            .with_gas_price(5_000_000u64)
            .with_to(Address([0x15; 20]))
            .with_value(1u64);

        assert_eq!(client.get_transaction_count(&sender).unwrap(), 12);
        assert_eq!(client.estimate_gas(&tx, &sender).unwrap(), 21_000);
        assert_eq!(client.send_raw_transaction(&[0xf8, 0x62]).unwrap(), [0xab; 32]);

        let requests = node.join().unwrap();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_eq!(request["jsonrpc"], "2.0");
        }
        assert_ne!(requests[0]["id"], requests[1]["id"]);

        assert_eq!(requests[0]["method"], "eth_getTransactionCount");
        assert_eq!(requests[0]["params"], json!([sender.to_hex(), "pending"]));

        assert_eq!(requests[1]["method"], "eth_estimateGas");
        assert_eq!(requests[1]["params"][0]["to"], "0x1515151515151515151515151515151515151515");
        assert_eq!(requests[1]["params"][0]["from"], sender.to_hex());

        assert_eq!(requests[2]["method"], "eth_sendRawTransaction");
        assert_eq!(requests[2]["params"], json!(["0xf862"]));
    }

    #[test]
    fn test_short_transaction_hash_rejected() {
        let (url, node) = canned_node(vec![json!("0x1234")]);
        let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.send_raw_transaction(&[0xf8]).unwrap_err();
        assert!(matches!(
            err,
            TxError::InvalidFieldLength { field: "transaction hash", expected: 32, actual: 2 }
        ));
        node.join().unwrap();
    }

    #[test]
    fn test_malformed_quantity_rejected() {
        let (url, node) = canned_node(vec![json!("0xzz")]);
        let client = JsonRpcClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.get_transaction_count(&Address([0; 20])).unwrap_err();
        assert!(matches!(err, TxError::InvalidInput(_)));
        node.join().unwrap();
    }

    #[test]
    fn test_call_object_for_transfer() {
        let tx = UnsignedTransaction::new(3)
            .with_gas_price(5_000_000u64)
            .with_to(Address([0x15; 20]))
            .with_value(1u64);
        let call = call_object(&tx, &Address([0xaa; 20]));

        assert_eq!(call["to"], "0x1515151515151515151515151515151515151515");
        assert_eq!(call["from"], "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(call["value"], "0x1");
        assert_eq!(call["gasPrice"], "0x4c4b40");
        assert_eq!(call["data"], "0x");
    }

    #[test]
    fn test_call_object_for_creation_has_no_to() {
        let tx = UnsignedTransaction::new(1).with_data(vec![0x60, 0x80]);
        let call = call_object(&tx, &Address([0xaa; 20]));
        assert!(call.get("to").is_none());
        assert_eq!(call["data"], "0x6080");
    }

    #[test]
    fn test_unwrap_rpc_result() {
        let ok: RpcResponse<String> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x5208"}"#).unwrap();
        assert_eq!(unwrap_rpc_result("eth_estimateGas", ok).unwrap(), "0x5208");

        let err: RpcResponse<String> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#,
        )
        .unwrap();
        let err = unwrap_rpc_result("eth_sendRawTransaction", err).unwrap_err();
        assert!(matches!(err, TxError::Network(ref m) if m.contains("nonce too low")));

        let empty: RpcResponse<String> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(unwrap_rpc_result("eth_getTransactionCount", empty).is_err());
    }

    #[test]
    fn test_unreachable_node_is_network_error() {
        let client = JsonRpcClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = client.get_transaction_count(&Address([0; 20])).unwrap_err();
        assert!(matches!(err, TxError::Network(_)));
    }
}
