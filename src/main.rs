use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::str::FromStr;
use vaultfund::api::ApiClient;
use vaultfund::auth::fetch_profile_with_retry;
use vaultfund::chain::{CampaignFactory, CampaignVault, Erc20, RpcClient};
use vaultfund::config::{AppConfig, ExplorerEntity};
use vaultfund::error::AppError;
use vaultfund::flows;
use vaultfund::types::{FundingDraft, FundingQuery, RiskLevel};
use vaultfund::units::{
    calculate_estimated_profit, calculate_progress, expected_return, format_idrx, from_idrx_wei,
    shorten_address,
};

#[derive(Parser)]
#[command(
    name = "vaultfund",
    version,
    about = "IDRX crowdfunding marketplace client"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Browse and manage crowdfunding campaigns
    Campaigns {
        #[command(subcommand)]
        action: CampaignCommand,
    },
    /// Invest IDRX into a campaign (approve + invest)
    Invest {
        funding_id: String,
        #[arg(long)]
        amount: f64,
    },
    /// Claim a refund for a failed campaign
    Refund { funding_id: String },
    /// Check whether a position's profit is claimable
    Profit { funding_id: String },
    /// List your investment positions
    Portfolio,
    /// Portfolio stats and monthly earnings
    Dashboard,
    /// Recent ledger transactions
    Transactions {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Wallet balance, deposits and withdrawals
    Wallet {
        #[command(subcommand)]
        action: WalletCommand,
    },
    /// Show the authenticated backend profile
    Whoami,
}

#[derive(Subcommand)]
enum CampaignCommand {
    /// List public campaigns
    List {
        #[arg(long)]
        industry: Option<String>,
        /// LOW, MEDIUM or HIGH
        #[arg(long, value_parser = parse_risk)]
        risk: Option<RiskLevel>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one campaign, including on-chain vault state when deployed
    Show { id: String },
    /// List campaigns you own
    Mine,
    /// Create a new funding record on the backend
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        industry: String,
        #[arg(long)]
        location: String,
        #[arg(long, value_parser = parse_risk)]
        risk: RiskLevel,
        /// Funding target in IDRX
        #[arg(long)]
        target: f64,
        /// Minimum investment in IDRX
        #[arg(long)]
        minimum: f64,
        /// ROI percentage per annum
        #[arg(long)]
        roi: f64,
        #[arg(long)]
        months: u32,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Deploy the on-chain vault and bind its address to the record
    Deploy { id: String },
    /// Withdraw raised funds from the vault (campaign owner)
    Withdraw { id: String },
    /// List vault addresses registered in the factory
    Registry {
        /// Only campaigns deployed by this owner address
        #[arg(long)]
        owner: Option<String>,
    },
    /// Check that an address is a factory-deployed vault
    Verify { address: String },
}

#[derive(Subcommand)]
enum WalletCommand {
    /// On-chain balance plus platform ledger stats
    Stats,
    /// Move IDRX from the wallet into the platform escrow
    Deposit { amount: f64 },
    /// Request IDRX back from the platform ledger
    Withdraw { amount: f64 },
}

fn parse_risk(raw: &str) -> Result<RiskLevel, String> {
    match raw.to_ascii_uppercase().as_str() {
        "LOW" => Ok(RiskLevel::Low),
        "MEDIUM" => Ok(RiskLevel::Medium),
        "HIGH" => Ok(RiskLevel::High),
        other => Err(format!("unknown risk level: {}", other)),
    }
}

fn parse_addr(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw.trim())
        .map_err(|e| AppError::ConfigError(format!("invalid address {}: {}", raw, e)))
}

#[tokio::main]
async fn main() {
    let _ = dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Warn when the node's chain does not match the configured one; writes to
/// the wrong chain are the user's own funds at stake.
async fn check_chain(rpc: &RpcClient, cfg: &AppConfig) {
    match rpc.chain_id().await {
        Ok(id) if id != cfg.chain_id => {
            tracing::warn!(
                "RPC endpoint is on chain {} but CHAIN_ID is {}",
                id,
                cfg.chain_id
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("could not verify chain id: {}", e),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    let api = ApiClient::with_token(cfg.api_url.clone(), cfg.api_token.clone());

    match cli.command {
        Command::Campaigns { action } => run_campaigns(action, &cfg, &api).await,
        Command::Invest { funding_id, amount } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            check_chain(&rpc, &cfg).await;
            let investor = cfg.require_wallet()?;
            let funding = api.get_funding(&funding_id).await?;

            println!("Investing Rp {} in {}", format_idrx(amount), funding.name);
            let investment = flows::invest_and_record(
                &rpc,
                &api,
                &cfg,
                &funding,
                investor,
                amount,
                |step| println!("  [{}]", step),
            )
            .await?;

            println!(
                "Invested Rp {}, expected return Rp {}",
                format_idrx(investment.amount),
                format_idrx(expected_return(investment.amount, funding.roi_percentage)),
            );
            Ok(())
        }
        Command::Refund { funding_id } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            check_chain(&rpc, &cfg).await;
            let investor = cfg.require_wallet()?;
            let tx = flows::claim_refund(&rpc, &api, &funding_id, investor).await?;
            println!("Refund claimed: {}", cfg.explorer_url(ExplorerEntity::Tx, &tx.to_string()));
            Ok(())
        }
        Command::Profit { funding_id } => {
            let investment = flows::claimable_profit(&api, &funding_id).await?;
            println!(
                "{}: Rp {} invested, expected return Rp {} ({:?})",
                investment.project_name,
                format_idrx(investment.amount),
                format_idrx(investment.expected_return),
                investment.status,
            );
            Ok(())
        }
        Command::Portfolio => {
            let investments = api.investments().await?;
            if investments.is_empty() {
                println!("No investments yet.");
                return Ok(());
            }
            for inv in investments {
                println!(
                    "{}  {:<28} Rp {:>16}  {:?}",
                    inv.invested_at,
                    inv.project_name,
                    format_idrx(inv.amount),
                    inv.status,
                );
            }
            Ok(())
        }
        Command::Dashboard => {
            let (stats, earnings) =
                futures::future::try_join(api.dashboard_stats(), api.earnings()).await?;
            println!("Total value:      Rp {}", format_idrx(stats.total_value));
            println!("Total invested:   Rp {}", format_idrx(stats.total_invested));
            println!("Total earnings:   Rp {}", format_idrx(stats.total_earnings));
            println!(
                "Positions:        {} active, {} completed",
                stats.active_investments, stats.completed_investments
            );
            println!("Average ROI:      {:.1}%", stats.average_roi);
            if !earnings.is_empty() {
                println!("\nMonthly earnings:");
                for point in earnings {
                    println!(
                        "  {}  earned Rp {:>14}  invested Rp {:>14}",
                        point.month,
                        format_idrx(point.earnings),
                        format_idrx(point.invested)
                    );
                }
            }
            Ok(())
        }
        Command::Transactions { limit, offset } => {
            let page = api.transactions(limit, offset).await?;
            println!("{} transactions total", page.total);
            for tx in page.transactions {
                println!(
                    "{}  {:<10?} Rp {:>16}  {:?}{}",
                    tx.timestamp,
                    tx.kind,
                    format_idrx(tx.amount),
                    tx.status,
                    tx.tx_hash
                        .map(|h| format!("  {}", shorten_address(&h)))
                        .unwrap_or_default(),
                );
            }
            Ok(())
        }
        Command::Wallet { action } => run_wallet(action, &cfg, &api).await,
        Command::Whoami => {
            let profile = fetch_profile_with_retry(&api).await?;
            println!(
                "{} <{}>",
                profile.user.name.as_deref().unwrap_or("(unnamed)"),
                profile.user.email.as_deref().unwrap_or("no email"),
            );
            if let Some(wallet) = &profile.user.wallet_address {
                println!("Wallet: {}", wallet);
            }
            println!(
                "Invested Rp {} across {} active positions, earned Rp {}",
                format_idrx(profile.stats.total_invested),
                profile.stats.active_investments,
                format_idrx(profile.stats.total_earnings),
            );
            Ok(())
        }
    }
}

async fn run_campaigns(
    action: CampaignCommand,
    cfg: &AppConfig,
    api: &ApiClient,
) -> Result<(), AppError> {
    match action {
        CampaignCommand::List {
            industry,
            risk,
            search,
            page,
            limit,
        } => {
            let query = FundingQuery {
                page,
                limit,
                industry,
                risk_level: risk,
                search,
            };
            let result = api.list_fundings(&query).await?;
            println!(
                "Page {}/{} ({} campaigns)",
                result.pagination.page, result.pagination.total_pages, result.pagination.total
            );
            for funding in result.fundings {
                println!(
                    "{:<12} {:<28} {:<12} {:>6} {:>5.1}%  Rp {:>16} / Rp {:>16}",
                    funding.id,
                    funding.name,
                    funding.industry,
                    funding.risk_level.as_str(),
                    calculate_progress(funding.current_funding, funding.funding_target),
                    format_idrx(funding.current_funding),
                    format_idrx(funding.funding_target),
                );
            }
            Ok(())
        }
        CampaignCommand::Show { id } => {
            let funding = api.get_funding(&id).await?;
            println!("{} ({})", funding.name, funding.location);
            println!("{}", funding.description);
            println!(
                "Risk {} | ROI {}% p.a. | {} months | min Rp {}",
                funding.risk_level.as_str(),
                funding.roi_percentage,
                funding.duration_months,
                format_idrx(funding.minimum_investment),
            );
            println!(
                "Raised Rp {} of Rp {} ({:.1}%), {} days remaining",
                format_idrx(funding.current_funding),
                format_idrx(funding.funding_target),
                calculate_progress(funding.current_funding, funding.funding_target),
                funding.remaining_days,
            );
            println!(
                "Estimated profit on minimum: Rp {}",
                format_idrx(calculate_estimated_profit(
                    funding.minimum_investment,
                    funding.roi_percentage,
                    funding.duration_months
                ))
            );

            if let Some(raw) = &funding.contract_address {
                let campaign = parse_addr(raw)?;
                let rpc = RpcClient::new(cfg.rpc_url.clone());
                check_chain(&rpc, cfg).await;
                let vault = CampaignVault::new(&rpc, campaign);
                let info = vault.info().await?;
                println!("\nVault {} ({})", shorten_address(raw), cfg.explorer_url(ExplorerEntity::Address, raw));
                println!(
                    "  On-chain: Rp {} raised from {} investors, deadline {}",
                    format_idrx(info.total_raised),
                    info.investor_count,
                    info.deadline.format("%Y-%m-%d %H:%M UTC"),
                );
                println!(
                    "  Progress {:.1}%, withdrawn: {}",
                    vault.progress().await?,
                    info.withdrawn
                );
                if let Some(wallet) = cfg.wallet_address {
                    let contribution = vault.contribution(wallet).await?;
                    if contribution > 0.0 {
                        println!("  Your contribution: Rp {}", format_idrx(contribution));
                    }
                }
            } else {
                println!("\nNo vault deployed yet.");
            }
            Ok(())
        }
        CampaignCommand::Mine => {
            let fundings = api.my_fundings().await?;
            for funding in fundings {
                println!(
                    "{:<12} {:<28} Rp {:>16} / Rp {:>16}  {}",
                    funding.id,
                    funding.name,
                    format_idrx(funding.current_funding),
                    format_idrx(funding.funding_target),
                    funding
                        .contract_address
                        .as_deref()
                        .map(shorten_address)
                        .unwrap_or_else(|| "not deployed".to_string()),
                );
            }
            Ok(())
        }
        CampaignCommand::Create {
            name,
            description,
            industry,
            location,
            risk,
            target,
            minimum,
            roi,
            months,
            image_url,
        } => {
            let draft = FundingDraft {
                name: Some(name),
                description: Some(description),
                industry: Some(industry),
                location: Some(location),
                risk_level: Some(risk),
                funding_target: Some(target),
                minimum_investment: Some(minimum),
                roi_percentage: Some(roi),
                duration_months: Some(months),
                image_url,
            };
            let funding = api.create_funding(&draft).await?;
            println!("Created funding {} ({})", funding.id, funding.name);
            println!("Deploy its vault with: vaultfund campaigns deploy {}", funding.id);
            Ok(())
        }
        CampaignCommand::Deploy { id } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            check_chain(&rpc, cfg).await;
            let owner = cfg.require_wallet()?;
            let funding = api.get_funding(&id).await?;
            if funding.contract_address.is_some() {
                return Err(AppError::Unavailable(
                    "this campaign already has a deployed vault".to_string(),
                ));
            }

            println!(
                "Deploying vault for {} (target Rp {}, {} days)...",
                funding.name,
                format_idrx(funding.funding_target),
                flows::campaign_duration_days(&funding),
            );
            let campaign = flows::deploy_and_bind(&rpc, api, cfg, &funding, owner).await?;
            println!(
                "Vault deployed at {} ({})",
                campaign,
                cfg.explorer_url(ExplorerEntity::Address, &campaign.to_string())
            );
            Ok(())
        }
        CampaignCommand::Withdraw { id } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            check_chain(&rpc, cfg).await;
            let owner = cfg.require_wallet()?;
            let funding = api.get_funding(&id).await?;
            let raw = funding.contract_address.as_deref().ok_or_else(|| {
                AppError::Unavailable("this campaign has no deployed vault contract".to_string())
            })?;
            let tx = flows::withdraw_raised(&rpc, parse_addr(raw)?, owner).await?;
            println!(
                "Withdrawal confirmed: {}",
                cfg.explorer_url(ExplorerEntity::Tx, &tx.to_string())
            );
            Ok(())
        }
        CampaignCommand::Registry { owner } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            check_chain(&rpc, cfg).await;
            let factory = CampaignFactory::new(&rpc, cfg.campaign_factory);
            let campaigns = match owner {
                Some(raw) => factory.campaigns_by_owner(parse_addr(&raw)?).await?,
                None => factory.campaigns().await?,
            };
            println!(
                "{} of {} registered vaults:",
                campaigns.len(),
                factory.campaign_count().await?
            );
            for campaign in campaigns {
                println!("  {}", campaign);
            }
            Ok(())
        }
        CampaignCommand::Verify { address } => {
            let rpc = RpcClient::new(cfg.rpc_url.clone());
            let factory = CampaignFactory::new(&rpc, cfg.campaign_factory);
            let valid = factory.is_valid_campaign(parse_addr(&address)?).await?;
            println!(
                "{} is {}a factory-deployed vault",
                address,
                if valid { "" } else { "NOT " }
            );
            Ok(())
        }
    }
}

async fn run_wallet(
    action: WalletCommand,
    cfg: &AppConfig,
    api: &ApiClient,
) -> Result<(), AppError> {
    let rpc = RpcClient::new(cfg.rpc_url.clone());
    match action {
        WalletCommand::Stats => {
            let stats = api.wallet_stats().await?;
            if let Some(wallet) = cfg.wallet_address {
                let token = Erc20::new(&rpc, cfg.idrx_token);
                let (balance, symbol) =
                    futures::future::try_join(token.balance_of(wallet), token.symbol()).await?;
                println!(
                    "On-chain balance: Rp {} {}",
                    format_idrx(from_idrx_wei(balance)),
                    symbol
                );
            }
            println!("Platform balance: Rp {}", format_idrx(stats.balance));
            println!("Total deposited:  Rp {}", format_idrx(stats.total_deposited));
            println!("Total withdrawn:  Rp {}", format_idrx(stats.total_withdrawn));
            println!("Pending:          {}", stats.pending_transactions);
            Ok(())
        }
        WalletCommand::Deposit { amount } => {
            check_chain(&rpc, cfg).await;
            let from = cfg.require_wallet()?;
            let tx = flows::deposit(&rpc, cfg, from, amount).await?;
            println!(
                "Deposit submitted: {}",
                cfg.explorer_url(ExplorerEntity::Tx, &tx.to_string())
            );
            Ok(())
        }
        WalletCommand::Withdraw { amount } => {
            check_chain(&rpc, cfg).await;
            let from = cfg.require_wallet()?;
            let tx = flows::withdraw_to_wallet(&rpc, api, cfg, from, amount).await?;
            println!(
                "Withdrawal request submitted: {}",
                cfg.explorer_url(ExplorerEntity::Tx, &tx.to_string())
            );
            Ok(())
        }
    }
}
