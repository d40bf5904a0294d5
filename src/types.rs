use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    Locked,
    Running,
    ProfitGenerating,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Investment,
    Profit,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDetails {
    pub monthly_revenue: f64,
    pub monthly_expenses: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    /// Business age in months
    pub business_age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingUpdate {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String,
}

/// A crowdfunding campaign record as served by the backend. Amounts are in
/// IDRX; `contract_address` is set once the on-chain vault is deployed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Funding {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub risk_level: RiskLevel,
    pub funding_target: f64,
    pub current_funding: f64,
    pub minimum_investment: f64,
    pub roi_percentage: f64,
    pub duration_months: u32,
    pub start_date: String,
    pub end_date: String,
    pub remaining_days: i64,
    pub image_url: String,
    pub is_active: bool,
    pub is_funded: bool,
    pub contract_address: Option<String>,
    pub financial_details: FinancialDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<Vec<FundingUpdate>>,
}

/// Payload for creating or updating a funding record. All fields optional so
/// partial updates serialize without nulls.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_investment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub funding_id: String,
    pub project_name: String,
    pub amount: f64,
    pub status: InvestmentStatus,
    pub expected_return: f64,
    pub actual_return: Option<f64>,
    pub invested_at: String,
    pub completed_at: Option<String>,
}

impl Investment {
    /// Profit can be claimed once the position has started generating or
    /// completed.
    pub fn profit_claimable(&self) -> bool {
        matches!(
            self.status,
            InvestmentStatus::ProfitGenerating | InvestmentStatus::Completed
        )
    }

    /// Refunds only apply to failed campaigns.
    pub fn refund_available(&self) -> bool {
        self.status == InvestmentStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    pub funding_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_invested: f64,
    pub total_earnings: f64,
    pub active_investments: u32,
    pub completed_investments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_value: f64,
    pub total_invested: f64,
    pub total_earnings: f64,
    pub active_investments: u32,
    pub completed_investments: u32,
    #[serde(rename = "averageROI")]
    pub average_roi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsPoint {
    pub month: String,
    pub earnings: f64,
    pub invested: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub balance: f64,
    pub total_deposited: f64,
    pub total_withdrawn: f64,
    pub pending_transactions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Query parameters for the public funding list.
#[derive(Debug, Clone, Default)]
pub struct FundingQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub industry: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FundingPage {
    pub fundings: Vec<Funding>,
    pub pagination: Pagination,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}
