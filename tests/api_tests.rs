use mockito::Matcher;
use serde_json::json;
use url::Url;
use vaultfund::api::{ApiClient, ProfileUpdate};
use vaultfund::error::AppError;
use vaultfund::types::{
    FundingDraft, FundingQuery, InvestmentStatus, NewInvestment, RiskLevel, TransactionType,
};

fn funding_json(id: &str, contract: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "userId": "u1",
        "name": "Warung Kopi Expansion",
        "description": "Second location for a busy coffee stall",
        "industry": "F&B",
        "location": "Bandung",
        "riskLevel": "MEDIUM",
        "fundingTarget": 50000000.0,
        "currentFunding": 12500000.0,
        "minimumInvestment": 100000.0,
        "roiPercentage": 12.0,
        "durationMonths": 6,
        "startDate": "2025-01-01T00:00:00Z",
        "endDate": "2025-07-01T00:00:00Z",
        "remainingDays": 45,
        "imageUrl": "https://example.com/warung.jpg",
        "isActive": true,
        "isFunded": false,
        "contractAddress": contract,
        "financialDetails": {
            "monthlyRevenue": 30000000.0,
            "monthlyExpenses": 22000000.0,
            "netProfit": 8000000.0,
            "profitMargin": 26.7,
            "businessAge": 28
        }
    })
}

fn client_for(server: &mockito::ServerGuard, token: Option<&str>) -> ApiClient {
    ApiClient::with_token(
        Url::parse(&server.url()).unwrap(),
        token.map(|t| t.to_string()),
    )
}

#[tokio::test]
async fn test_list_fundings_builds_query_params() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/fundings")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("industry".into(), "F&B".into()),
            Matcher::UrlEncoded("riskLevel".into(), "MEDIUM".into()),
            Matcher::UrlEncoded("search".into(), "kopi".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "fundings": [funding_json("f1", None)],
                "pagination": { "page": 2, "limit": 10, "total": 11, "totalPages": 2 }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, None);
    let query = FundingQuery {
        page: Some(2),
        limit: Some(10),
        industry: Some("F&B".to_string()),
        risk_level: Some(RiskLevel::Medium),
        search: Some("kopi".to_string()),
    };
    let page = client.list_fundings(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.fundings.len(), 1);
    assert_eq!(page.fundings[0].risk_level, RiskLevel::Medium);
    assert_eq!(page.pagination.total, 11);
}

#[tokio::test]
async fn test_get_funding_unwraps_envelope() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/fundings/f1")
        .with_header("content-type", "application/json")
        .with_body(json!({ "funding": funding_json("f1", Some("0x86dE4584E46c52A6f7bB910a924C419c9A5F346f")) }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, None);
    let funding = client.get_funding("f1").await.unwrap();
    assert_eq!(funding.id, "f1");
    assert_eq!(
        funding.contract_address.as_deref(),
        Some("0x86dE4584E46c52A6f7bB910a924C419c9A5F346f")
    );
}

#[tokio::test]
async fn test_authenticated_request_carries_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/investments")
        .match_header("authorization", "Bearer test-token")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "investments": [{
                    "id": "i1",
                    "fundingId": "f1",
                    "projectName": "Warung Kopi Expansion",
                    "amount": 250000.0,
                    "status": "PROFIT_GENERATING",
                    "expectedReturn": 280000.0,
                    "actualReturn": null,
                    "investedAt": "2025-02-01T08:00:00Z",
                    "completedAt": null
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let investments = client.investments().await.unwrap();

    mock.assert_async().await;
    assert_eq!(investments.len(), 1);
    assert_eq!(investments[0].status, InvestmentStatus::ProfitGenerating);
    assert!(investments[0].profit_claimable());
    assert!(!investments[0].refund_available());
}

#[tokio::test]
async fn test_create_investment_posts_camel_case_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/investments")
        .match_body(Matcher::Json(json!({
            "fundingId": "f1",
            "amount": 250000.0,
            "txHash": "0xdeadbeef"
        })))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "investment": {
                    "id": "i2",
                    "fundingId": "f1",
                    "projectName": "Warung Kopi Expansion",
                    "amount": 250000.0,
                    "status": "LOCKED",
                    "expectedReturn": 280000.0,
                    "actualReturn": null,
                    "investedAt": "2025-02-01T08:00:00Z",
                    "completedAt": null
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let investment = client
        .create_investment(&NewInvestment {
            funding_id: "f1".to_string(),
            amount: 250000.0,
            tx_hash: Some("0xdeadbeef".to_string()),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(investment.status, InvestmentStatus::Locked);
}

#[tokio::test]
async fn test_update_funding_contract_puts_address() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/fundings/f1/contract")
        .match_body(Matcher::Json(json!({
            "contractAddress": "0x86dE4584E46c52A6f7bB910a924C419c9A5F346f"
        })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "funding": funding_json("f1", Some("0x86dE4584E46c52A6f7bB910a924C419c9A5F346f")) }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let funding = client
        .update_funding_contract("f1", "0x86dE4584E46c52A6f7bB910a924C419c9A5F346f")
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(funding.contract_address.is_some());
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/fundings/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "Funding not found" }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, None);
    let err = client.get_funding("missing").await.unwrap_err();
    match err {
        AppError::ApiError(msg) => assert_eq!(msg, "Funding not found"),
        other => panic!("expected ApiError, got {}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body_falls_back_to_request_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/dashboard/stats")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let client = client_for(&server, None);
    let err = client.dashboard_stats().await.unwrap_err();
    match err {
        AppError::ApiError(msg) => assert_eq!(msg, "Request failed"),
        other => panic!("expected ApiError, got {}", other),
    }
}

#[tokio::test]
async fn test_json_error_body_without_message_falls_back_to_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/dashboard/stats")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "ok": false }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, None);
    let err = client.dashboard_stats().await.unwrap_err();
    match err {
        AppError::ApiError(msg) => assert_eq!(msg, "HTTP error 500"),
        other => panic!("expected ApiError, got {}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/users/me")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(json!({ "error": "Unauthorized" }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("stale-token"));
    let err = client.me().await.unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));
}

#[tokio::test]
async fn test_update_funding_sends_only_set_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/fundings/f1")
        .match_body(Matcher::Json(json!({
            "roiPercentage": 14.0,
            "minimumInvestment": 150000.0
        })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "funding": funding_json("f1", None) }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let draft = FundingDraft {
        roi_percentage: Some(14.0),
        minimum_investment: Some(150000.0),
        ..Default::default()
    };
    let funding = client.update_funding("f1", &draft).await.unwrap();

    mock.assert_async().await;
    assert_eq!(funding.id, "f1");
}

#[tokio::test]
async fn test_delete_funding_unwraps_success_flag() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/api/fundings/f1")
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    assert!(client.delete_funding("f1").await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_investment_unwraps_envelope() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/investments/i1")
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "investment": {
                    "id": "i1",
                    "fundingId": "f1",
                    "projectName": "Warung Kopi Expansion",
                    "amount": 250000.0,
                    "status": "FAILED",
                    "expectedReturn": 280000.0,
                    "actualReturn": null,
                    "investedAt": "2025-02-01T08:00:00Z",
                    "completedAt": null
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let investment = client.get_investment("i1").await.unwrap();
    assert_eq!(investment.status, InvestmentStatus::Failed);
    assert!(investment.refund_available());
}

#[tokio::test]
async fn test_update_profile_puts_partial_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/users/me")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({ "name": "Putri" })))
        .with_header("content-type", "application/json")
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let update = ProfileUpdate {
        name: Some("Putri".to_string()),
        ..Default::default()
    };
    client.update_profile(&update).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transactions_page_and_enum_decoding() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/dashboard/transactions")
        .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "transactions": [{
                    "id": "t1",
                    "type": "DEPOSIT",
                    "amount": 1000000.0,
                    "status": "COMPLETED",
                    "txHash": "0xabc",
                    "timestamp": "2025-03-01T10:00:00Z"
                }],
                "total": 1
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let page = client.transactions(Some(20), None).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.transactions[0].kind, TransactionType::Deposit);
}
