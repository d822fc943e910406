use anchor_lang::prelude::*;

use crate::state::{AuctionKind, PaymentAsset};

#[event]
pub struct AuctionCreated {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub kind: AuctionKind,
    pub token_mint: Pubkey,
    pub payment_asset: PaymentAsset,
    pub start_price: u64,
    pub floor_price: u64,
    pub total_supply: u64,
    pub start_time: i64,
    pub end_time: i64,
}

#[event]
pub struct BidPlaced {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub quantity: u64,
    pub price: u64,
    pub payment: u64,
}

#[event]
pub struct AuctionFinalized {
    pub auction: Pubkey,
    pub clearing_price: u64,
    pub total_committed: u64,
    pub total_contributed: u64,
}

#[event]
pub struct TokensClaimed {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    pub tokens_received: u64,
    pub refund: u64,
}

#[event]
pub struct AuctionCancelled {
    pub auction: Pubkey,
    pub authority: Pubkey,
}

#[event]
pub struct ProceedsWithdrawn {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
}

#[event]
pub struct UnsoldTokensWithdrawn {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
}

#[event]
pub struct EmergencyWithdrawn {
    pub auction: Pubkey,
    pub authority: Pubkey,
    pub amount: u64,
}

#[event]
pub struct WhitelistUpdated {
    pub auction: Pubkey,
    pub added: u32,
    pub removed: u32,
    pub size: u32,
}

#[event]
pub struct WhitelistToggled {
    pub auction: Pubkey,
    pub enabled: bool,
}

#[event]
pub struct ProRataToggled {
    pub auction: Pubkey,
    pub enabled: bool,
}
