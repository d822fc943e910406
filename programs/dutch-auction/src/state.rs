use anchor_lang::prelude::*;

use crate::constants::MAX_WHITELIST_LEN;
use crate::errors::DutchAuctionError;

/// Lifecycle of an auction.
///
/// `NotStarted` is kept for completeness: creation moves an auction straight to
/// `Active`, so nothing transitions out of it today.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum AuctionStatus {
    NotStarted,
    Active,
    Finalized,
    Cancelled,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum AuctionKind {
    /// Hard supply cap, no whitelist, no pro-rata.
    Standard,
    /// Optional whitelist, per-participant cap and pro-rata oversubscription.
    Advanced,
}

/// What bidders pay with. Resolved once at creation.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum PaymentAsset {
    /// Lamports held by the auction's native vault.
    Native,
    /// An SPL token held by the auction's currency vault.
    Token { mint: Pubkey },
}

/// Immutable configuration passed to `initialize_auction*`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct AuctionParams {
    /// Price units are payment-asset atomic units per ONE auctioned token (10^decimals).
    pub start_price: u64,
    pub floor_price: u64,
    pub price_decrement: u64,
    /// Seconds between two price steps.
    pub price_interval: u64,
    /// Auctioned-asset atomic units.
    pub total_supply: u64,
    /// Seconds.
    pub duration: u64,
    pub kind: AuctionKind,
    pub whitelist_enabled: bool,
    pub pro_rata_enabled: bool,
    /// 0 = unlimited.
    pub max_allocation: u64,
}

#[account]
pub struct AuctionState {
    pub authority: Pubkey,
    pub kind: AuctionKind,
    pub payment_asset: PaymentAsset,

    // Auctioned asset and vaults
    pub token_mint: Pubkey,
    pub token_vault: Pubkey,
    // Currency vault token account, or the native vault PDA
    pub payment_vault: Pubkey,
    pub vault_authority_bump: u8,
    pub token_decimals: u8,
    // 10^token_decimals
    pub one_token: u64,

    // Config
    pub start_price: u64,
    pub floor_price: u64,
    pub price_decrement: u64,
    pub price_interval: u64,
    pub total_supply: u64,
    pub duration: u64,
    pub whitelist_enabled: bool,
    pub pro_rata_enabled: bool,
    pub max_allocation: u64,

    // Lifecycle
    pub status: AuctionStatus,
    pub start_time: i64,
    pub end_time: i64,

    // Bid ledger totals (frozen once not Active)
    pub total_committed: u64,
    pub total_contributed: u64,
    pub bidder_count: u64,

    // 0 until finalize, immutable afterwards
    pub clearing_price: u64,

    // Settlement bookkeeping
    pub claimed_count: u64,
    pub claimed_quantity: u64,
    pub claimed_tokens: u64,
    pub claimed_cost: u64,
    pub proceeds_withdrawn: u64,
    pub unsold_withdrawn: u64,

    // Reentrancy lock
    pub locked: bool,
}

impl AuctionState {
    pub const LEN: usize = 8 // discriminator
        + 32 // authority
        + AuctionKind::INIT_SPACE
        + PaymentAsset::INIT_SPACE
        + 32 // token_mint
        + 32 // token_vault
        + 32 // payment_vault
        + 1 // vault_authority_bump
        + 1 // token_decimals
        + 8 // one_token
        + 8 // start_price
        + 8 // floor_price
        + 8 // price_decrement
        + 8 // price_interval
        + 8 // total_supply
        + 8 // duration
        + 1 // whitelist_enabled
        + 1 // pro_rata_enabled
        + 8 // max_allocation
        + AuctionStatus::INIT_SPACE
        + 8 // start_time
        + 8 // end_time
        + 8 // total_committed
        + 8 // total_contributed
        + 8 // bidder_count
        + 8 // clearing_price
        + 8 // claimed_count
        + 8 // claimed_quantity
        + 8 // claimed_tokens
        + 8 // claimed_cost
        + 8 // proceeds_withdrawn
        + 8 // unsold_withdrawn
        + 1; // locked

    pub fn is_native(&self) -> bool {
        self.payment_asset == PaymentAsset::Native
    }

    pub fn is_advanced(&self) -> bool {
        self.kind == AuctionKind::Advanced
    }

    /// Demand exceeds supply and the shortfall is settled pro-rata.
    pub fn is_oversubscribed(&self) -> bool {
        self.total_committed > self.total_supply
    }

    pub fn require_owner(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.authority, DutchAuctionError::Unauthorized);
        Ok(())
    }

    pub fn require_advanced(&self) -> Result<()> {
        require!(self.is_advanced(), DutchAuctionError::AdvancedFeatureDisabled);
        Ok(())
    }
}

/// Per-bidder ledger entry. Created on first bid, never closed.
#[account]
#[derive(InitSpace)]
pub struct BidderState {
    pub auction: Pubkey,
    pub bidder: Pubkey,
    /// Cumulative committed quantity.
    pub quantity: u64,
    /// Cumulative payment, at the price of each individual bid.
    pub amount_paid: u64,

    // Settlement
    pub tokens_received: u64,
    pub refund: u64,
    pub claimed: bool,

    pub bump: u8,
}

impl BidderState {
    /// A record that has never been written by a bid (fresh `init_if_needed`).
    pub fn is_new(&self) -> bool {
        self.auction == Pubkey::default()
    }
}

#[account]
#[derive(InitSpace)]
pub struct Whitelist {
    pub auction: Pubkey,
    #[max_len(MAX_WHITELIST_LEN)]
    pub addresses: Vec<Pubkey>,
    pub bump: u8,
}

impl Whitelist {
    pub fn contains(&self, address: &Pubkey) -> bool {
        self.addresses.contains(address)
    }

    /// Adds addresses that are not present yet. Returns how many were added.
    pub fn add(&mut self, addresses: &[Pubkey]) -> Result<usize> {
        let mut added = 0;
        for address in addresses {
            if self.contains(address) {
                continue;
            }
            require!(
                self.addresses.len() < MAX_WHITELIST_LEN,
                DutchAuctionError::WhitelistFull
            );
            self.addresses.push(*address);
            added += 1;
        }
        Ok(added)
    }

    /// Removes the given addresses. Returns how many were present.
    pub fn remove(&mut self, addresses: &[Pubkey]) -> usize {
        let before = self.addresses.len();
        self.addresses.retain(|a| !addresses.contains(a));
        before - self.addresses.len()
    }
}

/// Program-owned account holding native payments.
#[account]
#[derive(InitSpace)]
pub struct NativeVault {
    pub auction: Pubkey,
    pub bump: u8,
}
