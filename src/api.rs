use crate::error::AppError;
use crate::types::{
    DashboardStats, EarningsPoint, Funding, FundingDraft, FundingPage, FundingQuery, Investment,
    NewInvestment, Transaction, User, UserStats, WalletStats,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// REST client for the marketplace backend. Authenticated endpoints carry the
/// wallet provider's access token as a bearer header.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FundingEnvelope {
    funding: Funding,
}

#[derive(Debug, Deserialize)]
struct FundingListEnvelope {
    fundings: Vec<Funding>,
}

#[derive(Debug, Deserialize)]
struct InvestmentEnvelope {
    investment: Investment,
}

#[derive(Debug, Deserialize)]
struct InvestmentListEnvelope {
    investments: Vec<Investment>,
}

#[derive(Debug, Deserialize)]
struct StatsEnvelope {
    stats: DashboardStats,
}

#[derive(Debug, Deserialize)]
struct EarningsEnvelope {
    earnings: Vec<EarningsPoint>,
}

#[derive(Debug, Deserialize)]
struct WalletEnvelope {
    wallet: WalletStats,
}

#[derive(Debug, Deserialize)]
struct DeleteEnvelope {
    success: bool,
}

/// `GET /api/users/me` response: the backend user plus aggregated stats.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub user: User,
    pub stats: UserStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContractBinding<'a> {
    contract_address: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn with_token(base_url: Url, token: Option<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn builder(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let url = self.base_url.join(path)?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AppError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body
                    .error
                    .unwrap_or_else(|| format!("HTTP error {}", status.as_u16())),
                // Non-JSON error bodies (proxies, crash pages) carry nothing
                // worth echoing.
                Err(_) => "Request failed".to_string(),
            };
            tracing::warn!(status = status.as_u16(), "backend request failed: {}", message);
            if status == StatusCode::UNAUTHORIZED {
                return Err(AppError::AuthError(message));
            }
            return Err(AppError::ApiError(message));
        }

        Ok(response.json::<T>().await?)
    }

    // ---- Fundings (public) ----

    pub async fn list_fundings(&self, query: &FundingQuery) -> Result<FundingPage, AppError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(industry) = &query.industry {
            params.push(("industry", industry.clone()));
        }
        if let Some(risk) = query.risk_level {
            params.push(("riskLevel", risk.as_str().to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        let builder = self.builder(Method::GET, "/api/fundings")?.query(&params);
        self.execute(builder).await
    }

    pub async fn get_funding(&self, id: &str) -> Result<Funding, AppError> {
        let envelope: FundingEnvelope = self
            .execute(self.builder(Method::GET, &format!("/api/fundings/{}", id))?)
            .await?;
        Ok(envelope.funding)
    }

    // ---- Fundings (authenticated) ----

    pub async fn my_fundings(&self) -> Result<Vec<Funding>, AppError> {
        let envelope: FundingListEnvelope = self
            .execute(self.builder(Method::GET, "/api/fundings/my/list")?)
            .await?;
        Ok(envelope.fundings)
    }

    pub async fn create_funding(&self, draft: &FundingDraft) -> Result<Funding, AppError> {
        let envelope: FundingEnvelope = self
            .execute(self.builder(Method::POST, "/api/fundings")?.json(draft))
            .await?;
        Ok(envelope.funding)
    }

    pub async fn update_funding(&self, id: &str, draft: &FundingDraft) -> Result<Funding, AppError> {
        let envelope: FundingEnvelope = self
            .execute(
                self.builder(Method::PUT, &format!("/api/fundings/{}", id))?
                    .json(draft),
            )
            .await?;
        Ok(envelope.funding)
    }

    pub async fn delete_funding(&self, id: &str) -> Result<bool, AppError> {
        let envelope: DeleteEnvelope = self
            .execute(self.builder(Method::DELETE, &format!("/api/fundings/{}", id))?)
            .await?;
        Ok(envelope.success)
    }

    /// Bind a deployed vault address to its funding record.
    pub async fn update_funding_contract(
        &self,
        id: &str,
        contract_address: &str,
    ) -> Result<Funding, AppError> {
        let envelope: FundingEnvelope = self
            .execute(
                self.builder(Method::PUT, &format!("/api/fundings/{}/contract", id))?
                    .json(&ContractBinding { contract_address }),
            )
            .await?;
        Ok(envelope.funding)
    }

    // ---- Investments ----

    pub async fn investments(&self) -> Result<Vec<Investment>, AppError> {
        let envelope: InvestmentListEnvelope = self
            .execute(self.builder(Method::GET, "/api/investments")?)
            .await?;
        Ok(envelope.investments)
    }

    pub async fn get_investment(&self, id: &str) -> Result<Investment, AppError> {
        let envelope: InvestmentEnvelope = self
            .execute(self.builder(Method::GET, &format!("/api/investments/{}", id))?)
            .await?;
        Ok(envelope.investment)
    }

    pub async fn create_investment(&self, new: &NewInvestment) -> Result<Investment, AppError> {
        let envelope: InvestmentEnvelope = self
            .execute(self.builder(Method::POST, "/api/investments")?.json(new))
            .await?;
        Ok(envelope.investment)
    }

    // ---- Dashboard ----

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let envelope: StatsEnvelope = self
            .execute(self.builder(Method::GET, "/api/dashboard/stats")?)
            .await?;
        Ok(envelope.stats)
    }

    pub async fn earnings(&self) -> Result<Vec<EarningsPoint>, AppError> {
        let envelope: EarningsEnvelope = self
            .execute(self.builder(Method::GET, "/api/dashboard/earnings")?)
            .await?;
        Ok(envelope.earnings)
    }

    pub async fn transactions(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<TransactionsPage, AppError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        let builder = self
            .builder(Method::GET, "/api/dashboard/transactions")?
            .query(&params);
        self.execute(builder).await
    }

    pub async fn wallet_stats(&self) -> Result<WalletStats, AppError> {
        let envelope: WalletEnvelope = self
            .execute(self.builder(Method::GET, "/api/dashboard/wallet")?)
            .await?;
        Ok(envelope.wallet)
    }

    // ---- Users ----

    pub async fn me(&self) -> Result<Profile, AppError> {
        self.execute(self.builder(Method::GET, "/api/users/me")?)
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<serde_json::Value, AppError> {
        self.execute(self.builder(Method::PUT, "/api/users/me")?.json(update))
            .await
    }
}
