use ethers_core::types::U256;
use hsm_tx_signer::rlp::{encode_bytes, encode_list, encode_u64};
use hsm_tx_signer::tx::{signing_hash, NoNetwork};
use hsm_tx_signer::utils::json::{parse_hex_array, parse_hex_bytes, parse_u256};
use hsm_tx_signer::{
    decode_broadcast_transaction, transaction_hash, Address, DecodedTransaction, ExclusiveSigner,
    FixedSigner, KeyHandle, LocalKeySigner, RawSignature, SigningCoordinator, TransactionBuilder,
    TransactionPipeline, TransactionRequest, TxError, UnsignedTransaction,
};

const SLOT: KeyHandle = KeyHandle(16);
const SECRET: [u8; 32] = [0x46; 32];
const SENDER: &str = "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F";
const RECIPIENT: &str = "0x15C25E6EB5dE729d7e310d059e59659cCB86E6f6";

const PUBLIC_KEY: &str = "4bc2a31265153f07e70e0bab08724e6b85e217f8cd628ceb62974247bb493382ce28cab79ad7119ee1ad3ebcdb98a16805211530ecc6cfefa1b88e6dff99232a";

// Transfer of 1 wei on chain 3: digest and the high-s form of a signature over it
const SCENARIO_DIGEST: &str = "c82a7a6dec843f490ea5c4897b608c97bce4aa0542f76ca04ecc503bae9fd65f";
const SCENARIO_R: &str = "2f6e0e1ebef11b37f3f4393127b20c9783cd8bcc095ee6210dc1bbde872a020c";
const SCENARIO_S_HIGH: &str = "b340e1a8c30bfa1b47bcd565acff47b0b228585b2c587b65e28fee9d53ed126b";
const SCENARIO_S_LOW: &str = "4cbf1e573cf405e4b8432a9a5300b84e0886848b82f024d5dd426fef7c492ed6";
const SCENARIO_RAW: &str = "f86280834c4b408252089415c25e6eb5de729d7e310d059e59659ccb86e6f601802aa02f6e0e1ebef11b37f3f4393127b20c9783cd8bcc095ee6210dc1bbde872a020ca04cbf1e573cf405e4b8432a9a5300b84e0886848b82f024d5dd426fef7c492ed6";
const SCENARIO_HASH: &str = "45366398a20fede7838fcf664d0e5f7c6414dfed6667544eab8cdbbaf3211dbb";

// Same transfer signed by the software signer (RFC 6979 nonce)
const LOCAL_RAW: &str = "f86280834c4b408252089415c25e6eb5de729d7e310d059e59659ccb86e6f6018029a0014c8adea97e145b2d3dce2286af0045ba950676afb589e957cbd3218c9c6553a05926ef9e0d863a79b3470b3bf06c16dcfe89a8e62badbb8e0efd8f86e31824b7";
const LOCAL_HASH: &str = "8a45fdd2e482d58f621f9de15f2a34bf17b3963c6d3a60a21fdf37a4a99e80fd";

// Published EIP-155 example transaction
const EIP155_RAW: &str = "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";
const EIP155_HASH: &str = "33469b22e9f636356c4160a87eb19df52b7412e8eac32a4a55ffe88ea8350788";

fn scenario_request() -> TransactionRequest {
    TransactionRequest {
        to: Some(RECIPIENT.into()),
        value: Some("1".into()),
        data: None,
        gas: Some(21_000),
        gas_price: Some("5000000".into()),
        nonce: Some(0),
        chain_id: Some(3),
    }
}

fn scenario_tx() -> UnsignedTransaction {
    TransactionBuilder::new().build(&scenario_request()).unwrap()
}

fn fixed_signer() -> FixedSigner {
    let public_key = parse_hex_array::<64>(PUBLIC_KEY, "public key").unwrap();
    let raw = RawSignature::new(
        parse_hex_array(SCENARIO_R, "r").unwrap(),
        parse_hex_array(SCENARIO_S_HIGH, "s").unwrap(),
        0,
    );
    FixedSigner::new(public_key).with_signature(parse_hex_array(SCENARIO_DIGEST, "digest").unwrap(), raw)
}

#[test]
fn scenario_digest_matches() {
    assert_eq!(hex::encode(signing_hash(&scenario_tx())), SCENARIO_DIGEST);
}

#[test]
fn scenario_with_fixed_signer_matches_golden_bytes() {
    let pipeline = TransactionPipeline::offline(
        SigningCoordinator::new(fixed_signer(), SLOT),
        TransactionBuilder::new(),
    );
    let outcome = pipeline.prepare(&scenario_request()).unwrap();

    assert_eq!(hex::encode(&outcome.raw), SCENARIO_RAW);
    assert_eq!(hex::encode(outcome.hash), SCENARIO_HASH);
    assert_eq!(outcome.transaction.v, 42);
    assert_eq!(outcome.transaction.s, parse_u256(&format!("0x{}", SCENARIO_S_LOW)).unwrap());
    assert_eq!(outcome.from.to_checksum(), SENDER);

    let (decoded, from) = decode_broadcast_transaction(&outcome.raw).unwrap();
    assert_eq!(decoded.tx, scenario_tx());
    assert_eq!(from.to_checksum(), SENDER);
}

#[test]
fn scenario_with_local_signer_matches_golden_bytes() {
    let signer = LocalKeySigner::new().with_key(SLOT, &SECRET).unwrap();
    let pipeline = TransactionPipeline::new(
        SigningCoordinator::new(ExclusiveSigner::new(signer), SLOT),
        TransactionBuilder::new(),
        NoNetwork,
    );
    let outcome = pipeline.prepare(&scenario_request()).unwrap();

    assert_eq!(hex::encode(&outcome.raw), LOCAL_RAW);
    assert_eq!(hex::encode(outcome.hash), LOCAL_HASH);
    assert_eq!(outcome.transaction.v, 41);
}

#[test]
fn eip155_example_decodes() {
    let raw = parse_hex_bytes(EIP155_RAW).unwrap();
    let report = DecodedTransaction::from_raw(&raw).unwrap();

    assert_eq!(report.from.to_checksum(), SENDER);
    assert_eq!(report.to, Some(Address([0x35; 20])));
    assert_eq!(report.nonce, 9);
    assert_eq!(report.gas, 21_000);
    assert_eq!(report.chain_id, 1);
    assert_eq!(report.v, 37);
    assert_eq!(report.hash, format!("0x{}", EIP155_HASH));
    assert_eq!(hex::encode(transaction_hash(&raw)), EIP155_HASH);
}

#[test]
fn eip155_example_resigned_with_local_signer() {
    let tx = UnsignedTransaction::new(1)
        .with_nonce(9)
        .with_gas_price(20_000_000_000u64)
        .with_gas_limit(21_000)
        .with_to(Address([0x35; 20]))
        .with_value(U256::exp10(18));

    let signer = LocalKeySigner::new().with_key(SLOT, &SECRET).unwrap();
    let pipeline = TransactionPipeline::offline(SigningCoordinator::new(signer, SLOT), TransactionBuilder::new());
    let outcome = pipeline.prepare_unsigned(tx).unwrap();

    assert_eq!(hex::encode(&outcome.raw), EIP155_RAW);
}

#[test]
fn rejects_eight_and_ten_fields() {
    let raw = parse_hex_bytes(EIP155_RAW).unwrap();
    let (signed, _) = decode_broadcast_transaction(&raw).unwrap();

    let mut fields = vec![
        encode_u64(signed.tx.nonce),
        encode_u64(20_000_000_000),
        encode_u64(signed.tx.gas_limit),
        encode_bytes(&[0x35; 20]),
        encode_u64(1),
        encode_bytes(&[]),
        encode_u64(signed.v),
        encode_u64(1),
    ];
    let eight = encode_list(&fields);
    assert!(matches!(decode_broadcast_transaction(&eight), Err(TxError::RlpDecode(_))));

    fields.push(encode_u64(1));
    fields.push(encode_u64(1));
    let ten = encode_list(&fields);
    assert!(matches!(decode_broadcast_transaction(&ten), Err(TxError::RlpDecode(_))));
}

#[test]
fn rejects_zero_s_from_signer() {
    let tx = scenario_tx();
    let public_key = parse_hex_array::<64>(PUBLIC_KEY, "public key").unwrap();
    let signer = FixedSigner::new(public_key).with_signature(
        signing_hash(&tx),
        RawSignature::new(parse_hex_array(SCENARIO_R, "r").unwrap(), [0; 32], 0),
    );

    let err = SigningCoordinator::new(signer, SLOT).sign_transaction(tx).unwrap_err();
    assert!(matches!(err, TxError::SignatureInvalid(_)));
}

#[test]
fn rejects_21_byte_recipient() {
    let mut fields = vec![
        encode_u64(0),
        encode_u64(5_000_000),
        encode_u64(21_000),
        encode_bytes(&[0x15; 21]),
        encode_u64(1),
        encode_bytes(&[]),
        encode_u64(42),
        encode_u64(1),
        encode_u64(1),
    ];
    let err = decode_broadcast_transaction(&encode_list(&fields)).unwrap_err();
    assert!(matches!(err, TxError::InvalidFieldLength { field: "to", expected: 20, actual: 21 }));

    fields[3] = encode_bytes(&[0x15; 19]);
    let err = decode_broadcast_transaction(&encode_list(&fields)).unwrap_err();
    assert!(matches!(err, TxError::InvalidFieldLength { actual: 19, .. }));

    let err = UnsignedTransaction::new(3).with_to_bytes(&[0x15; 21]).unwrap_err();
    assert!(matches!(err, TxError::InvalidFieldLength { .. }));
}

#[test]
fn truncated_and_padded_payloads_rejected() {
    let raw = parse_hex_bytes(SCENARIO_RAW).unwrap();

    let truncated = &raw[..raw.len() - 1];
    assert!(matches!(decode_broadcast_transaction(truncated), Err(TxError::RlpDecode(_))));

    let mut padded = raw.clone();
    padded.push(0x00);
    assert!(matches!(decode_broadcast_transaction(&padded), Err(TxError::RlpDecode(_))));
}

#[test]
fn signer_rejection_emits_nothing() {
    let public_key = parse_hex_array::<64>(PUBLIC_KEY, "public key").unwrap();
    let pipeline = TransactionPipeline::offline(
        SigningCoordinator::new(FixedSigner::new(public_key), SLOT),
        TransactionBuilder::new(),
    );
    assert!(matches!(pipeline.prepare(&scenario_request()), Err(TxError::Signer(_))));
}
