pub mod contracts;
pub mod rpc;

pub use contracts::{
    campaign_created_address, CampaignFactory, CampaignInfo, CampaignVault, Erc20,
    ICampaignFactory, ICampaignVault, IERC20,
};
pub use rpc::{RpcClient, RpcLog, TransactionReceipt, TransactionRequest};
