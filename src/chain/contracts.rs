use crate::chain::rpc::{RpcClient, TransactionReceipt, TransactionRequest};
use crate::error::AppError;
use crate::units::from_idrx_wei;
use alloy_primitives::{Address, LogData, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use chrono::{DateTime, TimeZone, Utc};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    interface ICampaignFactory {
        function createCampaign(uint256 targetAmount, uint256 duration) external returns (address campaign);
        function getCampaignCount() external view returns (uint256);
        function getCampaigns() external view returns (address[]);
        function getCampaignsByOwner(address owner) external view returns (address[]);
        function isValidCampaign(address campaign) external view returns (bool);

        event CampaignCreated(
            address indexed campaign,
            address indexed owner,
            uint256 targetAmount,
            uint256 duration,
            uint256 deadline
        );
    }

    interface ICampaignVault {
        function owner() external view returns (address);
        function targetAmount() external view returns (uint256);
        function deadline() external view returns (uint256);
        function totalRaised() external view returns (uint256);
        function withdrawn() external view returns (bool);
        function invest(uint256 amount) external;
        function withdrawByOwner() external;
        function claimRefund() external;
        function isActive() external view returns (bool);
        function isSuccessful() external view returns (bool);
        function getProgress() external view returns (uint256);
        function getContribution(address investor) external view returns (uint256);
        function getCampaignInfo() external view returns (
            address _owner,
            uint256 _targetAmount,
            uint256 _deadline,
            uint256 _totalRaised,
            bool _withdrawn,
            uint256 _investorCount
        );

        event Invested(address indexed investor, uint256 amount, uint256 totalRaised);
        event Withdrawn(address indexed owner, uint256 amount);
        event Refunded(address indexed investor, uint256 amount);
    }
}

/// Snapshot of a campaign vault's state, in display units.
#[derive(Debug, Clone)]
pub struct CampaignInfo {
    pub owner: Address,
    pub target_amount: f64,
    pub deadline: DateTime<Utc>,
    pub total_raised: f64,
    pub withdrawn: bool,
    pub investor_count: u64,
}

fn decode_err(err: alloy_sol_types::Error) -> AppError {
    AppError::ContractError(err.to_string())
}

fn u256_to_datetime(value: U256) -> DateTime<Utc> {
    let secs = i64::try_from(value).unwrap_or(i64::MAX);
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// The IDRX ERC-20 token.
pub struct Erc20<'a> {
    rpc: &'a RpcClient,
    pub address: Address,
}

impl<'a> Erc20<'a> {
    pub fn new(rpc: &'a RpcClient, address: Address) -> Self {
        Erc20 { rpc, address }
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AppError> {
        let data = IERC20::allowanceCall { owner, spender }.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = IERC20::allowanceCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, AppError> {
        let data = IERC20::balanceOfCall { account }.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = IERC20::balanceOfCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn symbol(&self) -> Result<String, AppError> {
        let data = IERC20::symbolCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = IERC20::symbolCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn approve(
        &self,
        from: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, AppError> {
        let data = IERC20::approveCall { spender, amount }.abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }

    pub async fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<B256, AppError> {
        let data = IERC20::transferCall { to, amount }.abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }
}

/// The campaign factory that deploys one vault per funding round.
pub struct CampaignFactory<'a> {
    rpc: &'a RpcClient,
    pub address: Address,
}

impl<'a> CampaignFactory<'a> {
    pub fn new(rpc: &'a RpcClient, address: Address) -> Self {
        CampaignFactory { rpc, address }
    }

    pub async fn campaign_count(&self) -> Result<u64, AppError> {
        let data = ICampaignFactory::getCampaignCountCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = ICampaignFactory::getCampaignCountCall::abi_decode_returns(&out, true)
            .map_err(decode_err)?;
        Ok(u64::try_from(ret._0).unwrap_or(u64::MAX))
    }

    pub async fn campaigns(&self) -> Result<Vec<Address>, AppError> {
        let data = ICampaignFactory::getCampaignsCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret =
            ICampaignFactory::getCampaignsCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn campaigns_by_owner(&self, owner: Address) -> Result<Vec<Address>, AppError> {
        let data = ICampaignFactory::getCampaignsByOwnerCall { owner }.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = ICampaignFactory::getCampaignsByOwnerCall::abi_decode_returns(&out, true)
            .map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn is_valid_campaign(&self, campaign: Address) -> Result<bool, AppError> {
        let data = ICampaignFactory::isValidCampaignCall { campaign }.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = ICampaignFactory::isValidCampaignCall::abi_decode_returns(&out, true)
            .map_err(decode_err)?;
        Ok(ret._0)
    }

    /// Submit the deploy transaction. The vault address is recovered later
    /// from the CampaignCreated log in the receipt.
    pub async fn create_campaign(
        &self,
        from: Address,
        target_amount: U256,
        duration_seconds: U256,
    ) -> Result<B256, AppError> {
        let data = ICampaignFactory::createCampaignCall {
            targetAmount: target_amount,
            duration: duration_seconds,
        }
        .abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }
}

/// Extract the deployed vault address from a deploy receipt's logs.
pub fn campaign_created_address(receipt: &TransactionReceipt) -> Result<Address, AppError> {
    for log in &receipt.logs {
        if log.topics.first() != Some(&ICampaignFactory::CampaignCreated::SIGNATURE_HASH) {
            continue;
        }
        let data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
        let event = ICampaignFactory::CampaignCreated::decode_log_data(&data, true)
            .map_err(decode_err)?;
        return Ok(event.campaign);
    }
    Err(AppError::MissingEvent(
        "could not find campaign address in transaction logs".to_string(),
    ))
}

/// A single per-campaign vault holding investor contributions.
pub struct CampaignVault<'a> {
    rpc: &'a RpcClient,
    pub address: Address,
}

impl<'a> CampaignVault<'a> {
    pub fn new(rpc: &'a RpcClient, address: Address) -> Self {
        CampaignVault { rpc, address }
    }

    pub async fn info(&self) -> Result<CampaignInfo, AppError> {
        let data = ICampaignVault::getCampaignInfoCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = ICampaignVault::getCampaignInfoCall::abi_decode_returns(&out, true)
            .map_err(decode_err)?;
        Ok(CampaignInfo {
            owner: ret._owner,
            target_amount: from_idrx_wei(ret._targetAmount),
            deadline: u256_to_datetime(ret._deadline),
            total_raised: from_idrx_wei(ret._totalRaised),
            withdrawn: ret._withdrawn,
            investor_count: u64::try_from(ret._investorCount).unwrap_or(u64::MAX),
        })
    }

    pub async fn is_active(&self) -> Result<bool, AppError> {
        let data = ICampaignVault::isActiveCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret =
            ICampaignVault::isActiveCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    pub async fn is_successful(&self) -> Result<bool, AppError> {
        let data = ICampaignVault::isSuccessfulCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret =
            ICampaignVault::isSuccessfulCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(ret._0)
    }

    /// Funding progress in percent. The contract reports basis points.
    pub async fn progress(&self) -> Result<f64, AppError> {
        let data = ICampaignVault::getProgressCall {}.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret =
            ICampaignVault::getProgressCall::abi_decode_returns(&out, true).map_err(decode_err)?;
        Ok(u64::try_from(ret._0).unwrap_or(u64::MAX) as f64 / 100.0)
    }

    pub async fn contribution(&self, investor: Address) -> Result<f64, AppError> {
        let data = ICampaignVault::getContributionCall { investor }.abi_encode();
        let out = self.rpc.call(self.address, data.into()).await?;
        let ret = ICampaignVault::getContributionCall::abi_decode_returns(&out, true)
            .map_err(decode_err)?;
        Ok(from_idrx_wei(ret._0))
    }

    pub async fn invest(&self, from: Address, amount: U256) -> Result<B256, AppError> {
        let data = ICampaignVault::investCall { amount }.abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }

    pub async fn withdraw_by_owner(&self, from: Address) -> Result<B256, AppError> {
        let data = ICampaignVault::withdrawByOwnerCall {}.abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }

    pub async fn claim_refund(&self, from: Address) -> Result<B256, AppError> {
        let data = ICampaignVault::claimRefundCall {}.abi_encode();
        self.rpc
            .send_transaction(&TransactionRequest {
                from,
                to: self.address,
                value: None,
                data: data.into(),
            })
            .await
    }
}
