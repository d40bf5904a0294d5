//! Two-phase on-chain transaction orchestration: the approve-then-invest
//! token flow and the deploy-then-record flow that binds a funding record to
//! its vault contract address.

use crate::api::ApiClient;
use crate::chain::{campaign_created_address, CampaignFactory, CampaignVault, Erc20, RpcClient};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::types::{Funding, Investment, NewInvestment};
use crate::units::{from_idrx_wei, to_idrx_wei, validate_investment};
use alloy_primitives::{Address, B256, U256};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Where deposited IDRX is held until the backend credits the account.
pub const PLATFORM_ESCROW: Address = Address::with_last_byte(1);

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Progress of the combined approve + invest sequence, reported for UI
/// feedback only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvestStep {
    Idle,
    Approving,
    Investing,
    Success,
    Error,
}

impl fmt::Display for InvestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvestStep::Idle => "idle",
            InvestStep::Approving => "approving",
            InvestStep::Investing => "investing",
            InvestStep::Success => "success",
            InvestStep::Error => "error",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone)]
pub struct InvestOutcome {
    /// Set when an approval transaction was needed.
    pub approve_tx: Option<B256>,
    pub invest_tx: B256,
}

/// Approve-then-invest. Reads the current allowance; if it is below the
/// requested amount, submits an ERC-20 approve, waits the fixed settle delay
/// and re-reads the allowance before submitting the vault invest call.
///
/// Failure at any step halts the sequence with the underlying chain error.
/// There is no rollback or idempotency guard; a manual resubmission can
/// double invest.
#[tracing::instrument(skip(rpc, cfg, on_step), fields(campaign = %campaign, amount))]
pub async fn invest_with_approval(
    rpc: &RpcClient,
    cfg: &AppConfig,
    campaign: Address,
    investor: Address,
    amount: f64,
    mut on_step: impl FnMut(InvestStep),
) -> Result<InvestOutcome, AppError> {
    match run_invest(rpc, cfg, campaign, investor, amount, &mut on_step).await {
        Ok(outcome) => {
            on_step(InvestStep::Success);
            Ok(outcome)
        }
        Err(err) => {
            on_step(InvestStep::Error);
            Err(err)
        }
    }
}

async fn run_invest(
    rpc: &RpcClient,
    cfg: &AppConfig,
    campaign: Address,
    investor: Address,
    amount: f64,
    on_step: &mut impl FnMut(InvestStep),
) -> Result<InvestOutcome, AppError> {
    let token = Erc20::new(rpc, cfg.idrx_token);
    let vault = CampaignVault::new(rpc, campaign);
    let amount_wei = to_idrx_wei(amount);

    let allowance = token.allowance(investor, campaign).await?;

    let approve_tx = if allowance < amount_wei {
        on_step(InvestStep::Approving);
        let hash = token.approve(investor, campaign, amount_wei).await?;
        tracing::info!(tx = %hash, "approval submitted");

        // Give the approval time to be mined before re-querying.
        tokio::time::sleep(Duration::from_millis(cfg.approval_settle_ms)).await;
        let refreshed = token.allowance(investor, campaign).await?;
        if refreshed < amount_wei {
            tracing::warn!(
                "allowance still below requested amount after approval ({} < {})",
                from_idrx_wei(refreshed),
                amount
            );
        }
        Some(hash)
    } else {
        None
    };

    on_step(InvestStep::Investing);
    let invest_tx = vault.invest(investor, amount_wei).await?;
    tracing::info!(tx = %invest_tx, "investment submitted");

    Ok(InvestOutcome {
        approve_tx,
        invest_tx,
    })
}

/// Validate, run approve-then-invest against the funding's vault, then record
/// the position on the backend with the invest transaction hash.
#[tracing::instrument(skip(rpc, api, cfg, funding, on_step), fields(funding = %funding.id, amount))]
pub async fn invest_and_record(
    rpc: &RpcClient,
    api: &ApiClient,
    cfg: &AppConfig,
    funding: &Funding,
    investor: Address,
    amount: f64,
    on_step: impl FnMut(InvestStep),
) -> Result<Investment, AppError> {
    let campaign = funding
        .contract_address
        .as_deref()
        .ok_or_else(|| {
            AppError::Unavailable("this campaign has no deployed vault contract".to_string())
        })
        .and_then(|raw| {
            Address::from_str(raw)
                .map_err(|e| AppError::ContractError(format!("invalid vault address: {}", e)))
        })?;

    let token = Erc20::new(rpc, cfg.idrx_token);
    let balance = from_idrx_wei(token.balance_of(investor).await?);
    validate_investment(amount, funding.minimum_investment, balance)?;

    let outcome = invest_with_approval(rpc, cfg, campaign, investor, amount, on_step).await?;

    let record = api
        .create_investment(&NewInvestment {
            funding_id: funding.id.clone(),
            amount,
            tx_hash: Some(outcome.invest_tx.to_string()),
        })
        .await
        .map_err(|err| {
            // The tokens are already in the vault at this point; keep the
            // hash visible so the position can be recorded manually.
            tracing::error!(
                tx = %outcome.invest_tx,
                "investment confirmed on-chain but backend record failed: {}",
                err
            );
            err
        })?;

    Ok(record)
}

/// Submit the factory deploy, wait for the receipt and recover the new vault
/// address from the CampaignCreated event log.
#[tracing::instrument(skip(rpc, cfg), fields(target_idrx, duration_days))]
pub async fn deploy_campaign(
    rpc: &RpcClient,
    cfg: &AppConfig,
    owner: Address,
    target_idrx: f64,
    duration_days: u64,
) -> Result<(Address, B256), AppError> {
    let factory = CampaignFactory::new(rpc, cfg.campaign_factory);
    let target_wei = to_idrx_wei(target_idrx);
    let duration_seconds = U256::from(duration_days * SECONDS_PER_DAY);

    let tx_hash = factory
        .create_campaign(owner, target_wei, duration_seconds)
        .await?;
    tracing::info!(tx = %tx_hash, "deploy transaction submitted");

    let receipt = rpc.wait_for_receipt(tx_hash).await?;
    let campaign = campaign_created_address(&receipt)?;
    tracing::info!(campaign = %campaign, "vault deployed");

    Ok((campaign, tx_hash))
}

/// Campaign duration in days: the funding's remaining days when positive,
/// otherwise an estimate from its duration in months.
pub fn campaign_duration_days(funding: &Funding) -> u64 {
    if funding.remaining_days > 0 {
        funding.remaining_days as u64
    } else {
        funding.duration_months as u64 * 30
    }
}

/// Deploy-then-bind: deploy the vault for a funding record and persist the
/// resulting contract address on the backend. If the bind fails after a
/// successful deployment the address is logged and the error surfaced; there
/// is no automatic reconciliation.
#[tracing::instrument(skip(rpc, api, cfg, funding), fields(funding = %funding.id))]
pub async fn deploy_and_bind(
    rpc: &RpcClient,
    api: &ApiClient,
    cfg: &AppConfig,
    funding: &Funding,
    owner: Address,
) -> Result<Address, AppError> {
    let duration_days = campaign_duration_days(funding);
    let (campaign, _tx_hash) =
        deploy_campaign(rpc, cfg, owner, funding.funding_target, duration_days).await?;

    match api
        .update_funding_contract(&funding.id, &campaign.to_string())
        .await
    {
        Ok(_) => Ok(campaign),
        Err(err) => {
            tracing::error!(
                campaign = %campaign,
                "vault deployed but backend bind failed: {}",
                err
            );
            Err(err)
        }
    }
}

/// Owner withdrawal of raised funds, confirmed before returning.
pub async fn withdraw_raised(
    rpc: &RpcClient,
    campaign: Address,
    owner: Address,
) -> Result<B256, AppError> {
    let vault = CampaignVault::new(rpc, campaign);
    let tx_hash = vault.withdraw_by_owner(owner).await?;
    tracing::info!(tx = %tx_hash, "withdrawal submitted");
    rpc.wait_for_receipt(tx_hash).await?;
    Ok(tx_hash)
}

/// Claim a refund for a failed campaign. The backend position must be in the
/// FAILED state before the vault call is attempted.
pub async fn claim_refund(
    rpc: &RpcClient,
    api: &ApiClient,
    funding_id: &str,
    investor: Address,
) -> Result<B256, AppError> {
    let investment = find_investment(api, funding_id).await?;
    if !investment.refund_available() {
        return Err(AppError::Unavailable(
            "refund not available for this investment".to_string(),
        ));
    }

    let funding = api.get_funding(funding_id).await?;
    let campaign = funding
        .contract_address
        .as_deref()
        .ok_or_else(|| {
            AppError::Unavailable("this campaign has no deployed vault contract".to_string())
        })
        .and_then(|raw| {
            Address::from_str(raw)
                .map_err(|e| AppError::ContractError(format!("invalid vault address: {}", e)))
        })?;

    let vault = CampaignVault::new(rpc, campaign);
    let tx_hash = vault.claim_refund(investor).await?;
    tracing::info!(tx = %tx_hash, "refund claim submitted");
    rpc.wait_for_receipt(tx_hash).await?;
    Ok(tx_hash)
}

/// Guard for profit claims: the position must be generating or completed.
/// Payout itself is settled by the backend ledger.
pub async fn claimable_profit(api: &ApiClient, funding_id: &str) -> Result<Investment, AppError> {
    let investment = find_investment(api, funding_id).await?;
    if !investment.profit_claimable() {
        return Err(AppError::Unavailable("profit not available yet".to_string()));
    }
    Ok(investment)
}

async fn find_investment(api: &ApiClient, funding_id: &str) -> Result<Investment, AppError> {
    let investments = api.investments().await?;
    investments
        .into_iter()
        .find(|inv| inv.funding_id == funding_id)
        .ok_or_else(|| AppError::NotFound("investment not found".to_string()))
}

/// Deposit IDRX from the wallet into the platform escrow.
pub async fn deposit(
    rpc: &RpcClient,
    cfg: &AppConfig,
    from: Address,
    amount: f64,
) -> Result<B256, AppError> {
    if amount <= 0.0 {
        return Err(AppError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }

    let token = Erc20::new(rpc, cfg.idrx_token);
    let amount_wei = to_idrx_wei(amount);
    let balance = token.balance_of(from).await?;
    if balance < amount_wei {
        return Err(AppError::InsufficientBalance(
            "insufficient IDRX balance in wallet".to_string(),
        ));
    }

    let tx_hash = token.transfer(from, PLATFORM_ESCROW, amount_wei).await?;
    tracing::info!(tx = %tx_hash, amount, "deposit submitted");
    Ok(tx_hash)
}

/// Request a platform withdrawal back to the wallet. The platform ledger
/// balance is the spendable amount, not the on-chain one.
pub async fn withdraw_to_wallet(
    rpc: &RpcClient,
    api: &ApiClient,
    cfg: &AppConfig,
    from: Address,
    amount: f64,
) -> Result<B256, AppError> {
    if amount <= 0.0 {
        return Err(AppError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }

    let stats = api.wallet_stats().await?;
    if amount > stats.balance {
        return Err(AppError::InsufficientBalance(
            "insufficient platform balance".to_string(),
        ));
    }

    let token = Erc20::new(rpc, cfg.idrx_token);
    let tx_hash = token
        .transfer(from, PLATFORM_ESCROW, to_idrx_wei(amount))
        .await?;
    tracing::info!(tx = %tx_hash, amount, to = %from, "withdrawal request submitted");
    Ok(tx_hash)
}
