use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use serde_json::json;
use url::Url;
use vaultfund::chain::rpc::parse_hex_quantity;
use vaultfund::chain::{
    campaign_created_address, CampaignVault, Erc20, ICampaignFactory, ICampaignVault, RpcClient,
    RpcLog, TransactionReceipt, IERC20,
};
use vaultfund::error::AppError;
use vaultfund::units::to_idrx_wei;

// The canonical ERC-20 selectors; a mismatch here means the calldata the
// wallet signs would target the wrong function.
#[test]
fn test_erc20_selectors() {
    assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
    assert_eq!(IERC20::allowanceCall::SELECTOR, [0xdd, 0x62, 0xed, 0x3e]);
    assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    assert_eq!(IERC20::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
}

#[test]
fn test_create_campaign_calldata_round_trip() {
    let call = ICampaignFactory::createCampaignCall {
        targetAmount: to_idrx_wei(50_000_000.0),
        duration: U256::from(45u64 * 24 * 60 * 60),
    };
    let encoded = call.abi_encode();
    assert_eq!(&encoded[..4], ICampaignFactory::createCampaignCall::SELECTOR);

    let decoded = ICampaignFactory::createCampaignCall::abi_decode(&encoded, true).unwrap();
    assert_eq!(decoded.targetAmount, call.targetAmount);
    assert_eq!(decoded.duration, call.duration);
}

#[test]
fn test_invest_calldata_round_trip() {
    let call = ICampaignVault::investCall {
        amount: to_idrx_wei(250_000.0),
    };
    let encoded = call.abi_encode();
    let decoded = ICampaignVault::investCall::abi_decode(&encoded, true).unwrap();
    assert_eq!(decoded.amount, to_idrx_wei(250_000.0));
}

fn receipt_with_logs(logs: Vec<RpcLog>) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: B256::repeat_byte(0xaa),
        status: Some("0x1".to_string()),
        block_number: Some("0x10".to_string()),
        contract_address: None,
        logs,
    }
}

#[test]
fn test_campaign_created_address_from_receipt() {
    let campaign = Address::repeat_byte(0x42);
    let owner = Address::repeat_byte(0x07);
    let event = ICampaignFactory::CampaignCreated {
        campaign,
        owner,
        targetAmount: to_idrx_wei(50_000_000.0),
        duration: U256::from(3_888_000u64),
        deadline: U256::from(1_760_000_000u64),
    };
    let log_data = event.encode_log_data();

    let receipt = receipt_with_logs(vec![
        // Unrelated log first; the parser must skip it.
        RpcLog {
            address: Address::repeat_byte(0x99),
            topics: vec![B256::repeat_byte(0x01)],
            data: Default::default(),
        },
        RpcLog {
            address: Address::repeat_byte(0xfa),
            topics: log_data.topics().to_vec(),
            data: log_data.data.clone(),
        },
    ]);

    let parsed = campaign_created_address(&receipt).unwrap();
    assert_eq!(parsed, campaign);
}

#[test]
fn test_missing_campaign_created_log_is_an_error() {
    let receipt = receipt_with_logs(vec![]);
    let err = campaign_created_address(&receipt).unwrap_err();
    assert!(matches!(err, AppError::MissingEvent(_)));
}

#[test]
fn test_receipt_deserialization_and_status() {
    let raw = json!({
        "transactionHash": format!("0x{}", "ab".repeat(32)),
        "status": "0x1",
        "blockNumber": "0x1a4",
        "logs": [{
            "address": format!("0x{}", "11".repeat(20)),
            "topics": [format!("0x{}", "22".repeat(32))],
            "data": "0x"
        }]
    });
    let receipt: TransactionReceipt = serde_json::from_value(raw).unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.logs.len(), 1);

    let reverted = json!({
        "transactionHash": format!("0x{}", "ab".repeat(32)),
        "status": "0x0",
        "logs": []
    });
    let receipt: TransactionReceipt = serde_json::from_value(reverted).unwrap();
    assert!(!receipt.is_success());
}

#[test]
fn test_parse_hex_quantity() {
    assert_eq!(parse_hex_quantity("0x14a34").unwrap(), 84532);
    assert_eq!(parse_hex_quantity("0x1").unwrap(), 1);
    assert!(parse_hex_quantity("0xzz").is_err());
}

#[tokio::test]
async fn test_allowance_read_decodes_u256() {
    let mut server = mockito::Server::new_async().await;
    let value = to_idrx_wei(250_000.0);
    server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({ "method": "eth_call" })))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
            })
            .to_string(),
        )
        .create_async()
        .await;

    let rpc = RpcClient::new(Url::parse(&server.url()).unwrap());
    let token = Erc20::new(&rpc, Address::repeat_byte(0x01));
    let allowance = token
        .allowance(Address::repeat_byte(0x02), Address::repeat_byte(0x03))
        .await
        .unwrap();
    assert_eq!(allowance, value);
}

#[tokio::test]
async fn test_rpc_error_message_is_surfaced_verbatim() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "execution reverted: Campaign ended" }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let rpc = RpcClient::new(Url::parse(&server.url()).unwrap());
    let token = Erc20::new(&rpc, Address::repeat_byte(0x01));
    let err = token.balance_of(Address::repeat_byte(0x02)).await.unwrap_err();
    match err {
        AppError::RpcError(msg) => assert_eq!(msg, "execution reverted: Campaign ended"),
        other => panic!("expected RpcError, got {}", other),
    }
}

#[tokio::test]
async fn test_receipt_poll_survives_transport_hiccup() {
    let mut server = mockito::Server::new_async().await;
    let hash = B256::repeat_byte(0xcc);

    // A fresh client numbers its requests from 1, so the two polls can be
    // told apart by id. The first hits a proxy error page, the second the
    // mined receipt; the wait must ride out the first.
    let bad_gateway = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(
            json!({ "method": "eth_getTransactionReceipt", "id": 1 }),
        ))
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;
    let mined = server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(
            json!({ "method": "eth_getTransactionReceipt", "id": 2 }),
        ))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {
                    "transactionHash": hash.to_string(),
                    "status": "0x1",
                    "logs": []
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let rpc = RpcClient::new(Url::parse(&server.url()).unwrap());
    let receipt = rpc.wait_for_receipt(hash).await.unwrap();

    bad_gateway.assert_async().await;
    mined.assert_async().await;
    assert_eq!(receipt.transaction_hash, hash);
}

#[tokio::test]
async fn test_vault_state_reads_decode_bools() {
    let mut server = mockito::Server::new_async().await;
    let word_true = format!("0x{}", hex::encode(U256::from(1u64).to_be_bytes::<32>()));
    let word_false = format!("0x{}", hex::encode(U256::ZERO.to_be_bytes::<32>()));

    server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({
            "method": "eth_call",
            "params": [{ "data": format!("0x{}", hex::encode(ICampaignVault::isActiveCall {}.abi_encode())) }]
        })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": word_true }).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({
            "method": "eth_call",
            "params": [{ "data": format!("0x{}", hex::encode(ICampaignVault::isSuccessfulCall {}.abi_encode())) }]
        })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": word_false }).to_string())
        .create_async()
        .await;

    let rpc = RpcClient::new(Url::parse(&server.url()).unwrap());
    let vault = CampaignVault::new(&rpc, Address::repeat_byte(0x42));
    assert!(vault.is_active().await.unwrap());
    assert!(!vault.is_successful().await.unwrap());
}

#[tokio::test]
async fn test_chain_id() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .match_body(mockito::Matcher::PartialJson(json!({ "method": "eth_chainId" })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x14a34" }).to_string())
        .create_async()
        .await;

    let rpc = RpcClient::new(Url::parse(&server.url()).unwrap());
    assert_eq!(rpc.chain_id().await.unwrap(), 84532);
}
