use crate::error::AppError;
use alloy_primitives::Address;
use std::env;
use std::str::FromStr;
use url::Url;

/// Deployed CampaignFactory on Base Sepolia.
pub const DEFAULT_CAMPAIGN_FACTORY: &str = "0x86dE4584E46c52A6f7bB910a924C419c9A5F346f";

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_CHAIN_ID: u64 = 84532;

/// Runtime configuration, loaded from the environment (and `.env` when
/// present). The RPC endpoint is expected to be wallet-enabled: transaction
/// signing stays with the wallet provider, not this client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub rpc_url: Url,
    pub idrx_token: Address,
    pub campaign_factory: Address,
    pub chain_id: u64,
    pub wallet_address: Option<Address>,
    pub api_token: Option<String>,
    /// Fixed wait between an approve submission and the allowance re-read.
    pub approval_settle_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let api_url = env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let rpc_url = env::var("RPC_URL")
            .map_err(|_| AppError::ConfigError("RPC_URL is not set".to_string()))?;

        let idrx_token = parse_address_var("IDRX_TOKEN_ADDRESS")?
            .unwrap_or(Address::ZERO);
        let campaign_factory = parse_address_var("CAMPAIGN_FACTORY_ADDRESS")?
            .unwrap_or_else(|| Address::from_str(DEFAULT_CAMPAIGN_FACTORY).unwrap());
        let wallet_address = parse_address_var("WALLET_ADDRESS")?;

        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| AppError::ConfigError(format!("invalid CHAIN_ID: {}", e)))?,
            Err(_) => DEFAULT_CHAIN_ID,
        };

        let approval_settle_ms = match env::var("APPROVAL_SETTLE_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| AppError::ConfigError(format!("invalid APPROVAL_SETTLE_MS: {}", e)))?,
            Err(_) => 3000,
        };

        Ok(AppConfig {
            api_url: Url::parse(&api_url)?,
            rpc_url: Url::parse(&rpc_url)?,
            idrx_token,
            campaign_factory,
            chain_id,
            wallet_address,
            api_token: env::var("API_TOKEN").ok(),
            approval_settle_ms,
        })
    }

    /// The connected wallet, required for any flow that submits transactions.
    pub fn require_wallet(&self) -> Result<Address, AppError> {
        self.wallet_address
            .ok_or_else(|| AppError::AuthError("Wallet not connected (WALLET_ADDRESS unset)".to_string()))
    }

    pub fn explorer_url(&self, kind: ExplorerEntity, hash: &str) -> String {
        let base = if self.chain_id == 8453 {
            "https://basescan.org"
        } else {
            "https://sepolia.basescan.org"
        };
        let path = match kind {
            ExplorerEntity::Tx => "tx",
            ExplorerEntity::Address => "address",
        };
        format!("{}/{}/{}", base, path, hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerEntity {
    Tx,
    Address,
}

fn parse_address_var(name: &str) -> Result<Option<Address>, AppError> {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => Address::from_str(raw.trim())
            .map(Some)
            .map_err(|e| AppError::ConfigError(format!("invalid {}: {}", name, e))),
        _ => Ok(None),
    }
}
