//! Auction state machine, bid ledger and settlement.
//!
//! Every state-mutating operation runs under the auction's reentrancy lock and either
//! applies all of its ledger effects or none of them. Asset movements go through a
//! [`TokenGateway`], so the same code serves the native and SPL payment rails.
use anchor_lang::prelude::*;

use crate::constants::MAX_TOKEN_DECIMALS;
use crate::errors::DutchAuctionError;
use crate::gateway::TokenGateway;
use crate::guard::{non_reentrant, rollback_on_error};
use crate::pricing::{self, allocation, bid_payment, clearing_cost};
use crate::state::{
    AuctionKind, AuctionParams, AuctionState, AuctionStatus, BidderState, PaymentAsset, Whitelist,
};

/// Accounts resolved by the creating instruction.
pub struct AuctionSetup {
    pub authority: Pubkey,
    pub payment_asset: PaymentAsset,
    pub token_mint: Pubkey,
    pub token_decimals: u8,
    pub token_vault: Pubkey,
    pub payment_vault: Pubkey,
    pub vault_authority_bump: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidReceipt {
    pub quantity: u64,
    pub price: u64,
    pub payment: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalization {
    pub clearing_price: u64,
    pub total_committed: u64,
    pub total_contributed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub tokens_received: u64,
    pub clearing_cost: u64,
    pub refund: u64,
}

fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))
}

pub fn validate_params(params: &AuctionParams) -> Result<()> {
    require!(
        params.start_price > params.floor_price,
        DutchAuctionError::InvalidPriceRange
    );
    require!(params.price_decrement > 0, DutchAuctionError::InvalidPriceDecrement);
    require!(params.price_interval > 0, DutchAuctionError::InvalidPriceInterval);
    require!(params.duration > 0, DutchAuctionError::InvalidDuration);
    require!(
        i64::try_from(params.duration).is_ok(),
        DutchAuctionError::InvalidDuration
    );
    require!(params.total_supply > 0, DutchAuctionError::InvalidTotalSupply);
    require!(
        params.max_allocation <= params.total_supply,
        DutchAuctionError::InvalidAllocationCap
    );
    if params.kind == AuctionKind::Standard {
        require!(
            !params.whitelist_enabled && !params.pro_rata_enabled && params.max_allocation == 0,
            DutchAuctionError::AdvancedFeatureDisabled
        );
    }
    Ok(())
}

/// Writes the immutable configuration and opens the auction at `now`.
///
/// There is no deferred start: the auction is `Active` from the moment it exists.
pub fn open_auction(
    auction: &mut AuctionState,
    setup: AuctionSetup,
    params: &AuctionParams,
    now: i64,
) -> Result<()> {
    validate_params(params)?;
    require!(
        setup.token_mint != Pubkey::default(),
        DutchAuctionError::InvalidMint
    );
    if let PaymentAsset::Token { mint } = setup.payment_asset {
        require!(mint != Pubkey::default(), DutchAuctionError::InvalidMint);
    }
    require!(
        setup.token_decimals <= MAX_TOKEN_DECIMALS,
        DutchAuctionError::InvalidTokenDecimals
    );
    let one_token = 10u64
        .checked_pow(setup.token_decimals as u32)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    let end_time = now
        .checked_add(params.duration as i64)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;

    auction.authority = setup.authority;
    auction.kind = params.kind;
    auction.payment_asset = setup.payment_asset;
    auction.token_mint = setup.token_mint;
    auction.token_vault = setup.token_vault;
    auction.payment_vault = setup.payment_vault;
    auction.vault_authority_bump = setup.vault_authority_bump;
    auction.token_decimals = setup.token_decimals;
    auction.one_token = one_token;

    auction.start_price = params.start_price;
    auction.floor_price = params.floor_price;
    auction.price_decrement = params.price_decrement;
    auction.price_interval = params.price_interval;
    auction.total_supply = params.total_supply;
    auction.duration = params.duration;
    auction.whitelist_enabled = params.whitelist_enabled;
    auction.pro_rata_enabled = params.pro_rata_enabled;
    auction.max_allocation = params.max_allocation;

    auction.status = AuctionStatus::Active;
    auction.start_time = now;
    auction.end_time = end_time;

    auction.total_committed = 0;
    auction.total_contributed = 0;
    auction.bidder_count = 0;
    auction.clearing_price = 0;
    auction.claimed_count = 0;
    auction.claimed_quantity = 0;
    auction.claimed_tokens = 0;
    auction.claimed_cost = 0;
    auction.proceeds_withdrawn = 0;
    auction.unsold_withdrawn = 0;
    auction.locked = false;

    Ok(())
}

/// Price and payment a bid of `quantity` would face at `now`.
pub fn quote_bid(auction: &AuctionState, quantity: u64, now: i64) -> Result<BidReceipt> {
    let price = pricing::effective_price(auction, now);
    let payment = bid_payment(price, quantity, auction.one_token)?;
    Ok(BidReceipt {
        quantity,
        price,
        payment,
    })
}

/// Accepts a bid of `quantity` units at the current schedule price.
///
/// `attached_value` is the native value sent along with the bid. It must equal the
/// computed payment on the native rail and be zero on the token rail. Payment is
/// pulled before the ledger is touched.
pub fn place_bid<G: TokenGateway>(
    auction: &mut AuctionState,
    bidder: &mut BidderState,
    whitelist: Option<&Whitelist>,
    gateway: &mut G,
    quantity: u64,
    attached_value: u64,
    now: i64,
) -> Result<BidReceipt> {
    non_reentrant(auction, |auction| {
        rollback_on_error(bidder, |bidder| {
            accept_bid(auction, bidder, whitelist, gateway, quantity, attached_value, now)
        })
    })
}

fn accept_bid<G: TokenGateway>(
    auction: &mut AuctionState,
    bidder: &mut BidderState,
    whitelist: Option<&Whitelist>,
    gateway: &mut G,
    quantity: u64,
    attached_value: u64,
    now: i64,
) -> Result<BidReceipt> {
    require!(
        auction.status == AuctionStatus::Active,
        DutchAuctionError::AuctionNotActive
    );
    require!(now >= auction.start_time, DutchAuctionError::AuctionNotStarted);
    require!(now <= auction.end_time, DutchAuctionError::AuctionEnded);
    require!(quantity > 0, DutchAuctionError::InvalidQuantity);

    if auction.whitelist_enabled {
        let listed = whitelist.is_some_and(|w| w.contains(&bidder.bidder));
        require!(listed, DutchAuctionError::NotWhitelisted);
    }

    let new_quantity = checked_add(bidder.quantity, quantity)?;
    if auction.max_allocation > 0 {
        require!(
            new_quantity <= auction.max_allocation,
            DutchAuctionError::ExceedsAllocationCap
        );
    }

    let total_committed = checked_add(auction.total_committed, quantity)?;
    let oversubscription_allowed = auction.is_advanced() && auction.pro_rata_enabled;
    if !oversubscription_allowed {
        require!(
            total_committed <= auction.total_supply,
            DutchAuctionError::ExceedsSupply
        );
    }

    let price = pricing::current_price(auction, now);
    let payment = bid_payment(price, quantity, auction.one_token)?;
    let expected_value = if auction.is_native() { payment } else { 0 };
    require!(
        attached_value == expected_value,
        DutchAuctionError::PaymentMismatch
    );

    let amount_paid = checked_add(bidder.amount_paid, payment)?;
    let total_contributed = checked_add(auction.total_contributed, payment)?;
    let bidder_count = if bidder.quantity == 0 {
        checked_add(auction.bidder_count, 1)?
    } else {
        auction.bidder_count
    };

    if payment > 0 {
        gateway.checkpoint(auction, Some(&*bidder))?;
        gateway.collect_payment(payment)?;
    }

    bidder.quantity = new_quantity;
    bidder.amount_paid = amount_paid;
    auction.total_committed = total_committed;
    auction.total_contributed = total_contributed;
    auction.bidder_count = bidder_count;

    msg!(
        "Bid: quantity={}, price={}, payment={}, total_committed={}",
        quantity,
        price,
        payment,
        total_committed
    );

    Ok(BidReceipt {
        quantity,
        price,
        payment,
    })
}

/// Freezes the clearing price at the schedule price of `now`. Anyone may call it once
/// the bidding window is over.
pub fn finalize(auction: &mut AuctionState, now: i64) -> Result<Finalization> {
    non_reentrant(auction, |auction| {
        match auction.status {
            AuctionStatus::Active => {}
            AuctionStatus::Finalized => return err!(DutchAuctionError::AlreadyFinalized),
            AuctionStatus::NotStarted | AuctionStatus::Cancelled => {
                return err!(DutchAuctionError::AuctionNotActive)
            }
        }
        require!(now >= auction.end_time, DutchAuctionError::AuctionStillActive);

        auction.clearing_price = pricing::current_price(auction, now);
        auction.status = AuctionStatus::Finalized;

        msg!(
            "Finalized: clearing_price={}, total_committed={}, total_contributed={}",
            auction.clearing_price,
            auction.total_committed,
            auction.total_contributed
        );

        Ok(Finalization {
            clearing_price: auction.clearing_price,
            total_committed: auction.total_committed,
            total_contributed: auction.total_contributed,
        })
    })
}

/// Owner-only, and only before any capital has been committed.
pub fn cancel(auction: &mut AuctionState, caller: &Pubkey) -> Result<()> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        require!(
            auction.status == AuctionStatus::Active,
            DutchAuctionError::AuctionNotActive
        );
        require!(
            auction.total_committed == 0,
            DutchAuctionError::BidsAlreadyPlaced
        );
        auction.status = AuctionStatus::Cancelled;
        Ok(())
    })
}

/// Allocation, clearing cost and refund for `bidder`, without side effects.
pub fn compute_claim(auction: &AuctionState, bidder: &BidderState) -> Result<ClaimOutcome> {
    require!(
        auction.status == AuctionStatus::Finalized,
        DutchAuctionError::AuctionNotFinalized
    );
    require!(!bidder.claimed, DutchAuctionError::AlreadyClaimed);
    require!(bidder.quantity > 0, DutchAuctionError::NothingToClaim);

    let tokens_received = allocation(
        bidder.quantity,
        auction.total_supply,
        auction.total_committed,
    )?;
    let cost = clearing_cost(auction.clearing_price, tokens_received, auction.one_token)?;
    let refund = bidder
        .amount_paid
        .checked_sub(cost)
        .ok_or_else(|| error!(DutchAuctionError::SettlementInvariantViolated))?;

    Ok(ClaimOutcome {
        tokens_received,
        clearing_cost: cost,
        refund,
    })
}

/// Delivers a participant's tokens and refund, exactly once.
///
/// The record is marked claimed and checkpointed before any value leaves the vaults.
pub fn claim<G: TokenGateway>(
    auction: &mut AuctionState,
    bidder: &mut BidderState,
    gateway: &mut G,
) -> Result<ClaimOutcome> {
    non_reentrant(auction, |auction| {
        rollback_on_error(bidder, |bidder| settle_claim(auction, bidder, gateway))
    })
}

fn settle_claim<G: TokenGateway>(
    auction: &mut AuctionState,
    bidder: &mut BidderState,
    gateway: &mut G,
) -> Result<ClaimOutcome> {
    let outcome = compute_claim(auction, bidder)?;

    let claimed_count = checked_add(auction.claimed_count, 1)?;
    let claimed_quantity = checked_add(auction.claimed_quantity, bidder.quantity)?;
    let claimed_tokens = checked_add(auction.claimed_tokens, outcome.tokens_received)?;
    let claimed_cost = checked_add(auction.claimed_cost, outcome.clearing_cost)?;

    bidder.claimed = true;
    bidder.tokens_received = outcome.tokens_received;
    bidder.refund = outcome.refund;
    auction.claimed_count = claimed_count;
    auction.claimed_quantity = claimed_quantity;
    auction.claimed_tokens = claimed_tokens;
    auction.claimed_cost = claimed_cost;

    gateway.checkpoint(auction, Some(&*bidder))?;

    if outcome.tokens_received > 0 {
        gateway.send_tokens(outcome.tokens_received)?;
    }
    if outcome.refund > 0 {
        gateway.send_payment(outcome.refund)?;
    }

    msg!(
        "Claimed: Tokens={}, Refund={}",
        outcome.tokens_received,
        outcome.refund
    );

    Ok(outcome)
}

/// Sends the owner whatever part of the sale proceeds has become withdrawable.
/// Returns 0, and moves nothing, when there is nothing new.
pub fn withdraw_proceeds<G: TokenGateway>(
    auction: &mut AuctionState,
    caller: &Pubkey,
    gateway: &mut G,
) -> Result<u64> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        require!(
            auction.status == AuctionStatus::Finalized,
            DutchAuctionError::AuctionNotFinalized
        );

        let entitlement = pricing::proceeds_entitlement(auction)?;
        let amount = entitlement.saturating_sub(auction.proceeds_withdrawn);
        if amount == 0 {
            msg!("No proceeds to withdraw");
            return Ok(0);
        }

        auction.proceeds_withdrawn = checked_add(auction.proceeds_withdrawn, amount)?;
        gateway.checkpoint(auction, None)?;
        gateway.send_payment(amount)?;

        msg!("Proceeds withdrawn: amount={}", amount);
        Ok(amount)
    })
}

/// Sends the owner auctioned tokens that no participant will receive.
pub fn withdraw_unsold_tokens<G: TokenGateway>(
    auction: &mut AuctionState,
    caller: &Pubkey,
    gateway: &mut G,
) -> Result<u64> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        require!(
            auction.status == AuctionStatus::Finalized,
            DutchAuctionError::AuctionNotFinalized
        );

        let entitlement = pricing::unsold_entitlement(auction)?;
        let amount = entitlement.saturating_sub(auction.unsold_withdrawn);
        if amount == 0 {
            msg!("No unsold tokens to withdraw");
            return Ok(0);
        }

        auction.unsold_withdrawn = checked_add(auction.unsold_withdrawn, amount)?;
        gateway.checkpoint(auction, None)?;
        gateway.send_tokens(amount)?;

        msg!("Unsold tokens withdrawn: amount={}", amount);
        Ok(amount)
    })
}

/// Recovers the whole token vault of a cancelled auction.
pub fn emergency_withdraw<G: TokenGateway>(
    auction: &mut AuctionState,
    caller: &Pubkey,
    gateway: &mut G,
) -> Result<u64> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        require!(
            auction.status == AuctionStatus::Cancelled,
            DutchAuctionError::AuctionNotCancelled
        );

        let amount = gateway.token_balance()?;
        if amount == 0 {
            return Ok(0);
        }
        gateway.checkpoint(auction, None)?;
        gateway.send_tokens(amount)?;

        msg!("Emergency withdraw: amount={}", amount);
        Ok(amount)
    })
}

/// Returns how many addresses were actually added.
pub fn add_to_whitelist(
    auction: &mut AuctionState,
    whitelist: &mut Whitelist,
    caller: &Pubkey,
    addresses: &[Pubkey],
) -> Result<usize> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        auction.require_advanced()?;
        rollback_on_error(whitelist, |whitelist| whitelist.add(addresses))
    })
}

/// Returns how many addresses were actually removed.
pub fn remove_from_whitelist(
    auction: &mut AuctionState,
    whitelist: &mut Whitelist,
    caller: &Pubkey,
    addresses: &[Pubkey],
) -> Result<usize> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        auction.require_advanced()?;
        Ok(whitelist.remove(addresses))
    })
}

pub fn set_whitelist_enabled(
    auction: &mut AuctionState,
    caller: &Pubkey,
    enabled: bool,
) -> Result<()> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        auction.require_advanced()?;
        auction.whitelist_enabled = enabled;
        Ok(())
    })
}

/// The oversubscription rule can only change while nothing has been committed.
pub fn set_pro_rata_enabled(
    auction: &mut AuctionState,
    caller: &Pubkey,
    enabled: bool,
) -> Result<()> {
    non_reentrant(auction, |auction| {
        auction.require_owner(caller)?;
        auction.require_advanced()?;
        require!(
            auction.status == AuctionStatus::Active,
            DutchAuctionError::AuctionNotActive
        );
        require!(
            auction.total_committed == 0,
            DutchAuctionError::BidsAlreadyPlaced
        );
        auction.pro_rata_enabled = enabled;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_WHITELIST_LEN;

    const ONE: u64 = 1_000_000; // 6 decimals
    const START: i64 = 1_000;
    const END: i64 = START + 3_000;

    /// In-memory vaults. Can fail transfers and re-enter `claim` from a token transfer.
    #[derive(Default)]
    struct MockGateway {
        token_vault: u64,
        payment_vault: u64,
        tokens_out: u64,
        payment_out: u64,
        fail_collect: bool,
        fail_send_payment: bool,
        reenter_on_send: bool,
        locked_at_collect: Option<bool>,
        snapshot: Option<(AuctionState, Option<BidderState>)>,
        reentry: Option<Result<ClaimOutcome>>,
    }

    impl MockGateway {
        fn funded(supply: u64) -> Self {
            Self {
                token_vault: supply,
                ..Default::default()
            }
        }
    }

    impl TokenGateway for MockGateway {
        fn collect_payment(&mut self, amount: u64) -> Result<()> {
            if self.fail_collect {
                return Err(ProgramError::InsufficientFunds.into());
            }
            self.locked_at_collect = self.snapshot.as_ref().map(|(auction, _)| auction.locked);
            self.payment_vault += amount;
            Ok(())
        }

        fn send_tokens(&mut self, amount: u64) -> Result<()> {
            if self.reenter_on_send {
                self.reenter_on_send = false;
                if let Some((mut auction, Some(mut bidder))) = self.snapshot.clone() {
                    let mut inner = MockGateway::funded(u64::MAX);
                    self.reentry = Some(claim(&mut auction, &mut bidder, &mut inner));
                }
            }
            self.token_vault = self
                .token_vault
                .checked_sub(amount)
                .ok_or(ProgramError::InsufficientFunds)?;
            self.tokens_out += amount;
            Ok(())
        }

        fn send_payment(&mut self, amount: u64) -> Result<()> {
            if self.fail_send_payment {
                return Err(ProgramError::InsufficientFunds.into());
            }
            self.payment_vault = self
                .payment_vault
                .checked_sub(amount)
                .ok_or(ProgramError::InsufficientFunds)?;
            self.payment_out += amount;
            Ok(())
        }

        fn token_balance(&self) -> Result<u64> {
            Ok(self.token_vault)
        }

        fn checkpoint(
            &mut self,
            auction: &AuctionState,
            bidder: Option<&BidderState>,
        ) -> Result<()> {
            self.snapshot = Some((auction.clone(), bidder.cloned()));
            Ok(())
        }
    }

    fn owner() -> Pubkey {
        Pubkey::new_from_array([7u8; 32])
    }

    fn get_blank_auction() -> AuctionState {
        AuctionState {
            authority: Pubkey::default(),
            kind: AuctionKind::Standard,
            payment_asset: PaymentAsset::Native,
            token_mint: Pubkey::default(),
            token_vault: Pubkey::default(),
            payment_vault: Pubkey::default(),
            vault_authority_bump: 0,
            token_decimals: 0,
            one_token: 0,
            start_price: 0,
            floor_price: 0,
            price_decrement: 0,
            price_interval: 0,
            total_supply: 0,
            duration: 0,
            whitelist_enabled: false,
            pro_rata_enabled: false,
            max_allocation: 0,
            status: AuctionStatus::NotStarted,
            start_time: 0,
            end_time: 0,
            total_committed: 0,
            total_contributed: 0,
            bidder_count: 0,
            clearing_price: 0,
            claimed_count: 0,
            claimed_quantity: 0,
            claimed_tokens: 0,
            claimed_cost: 0,
            proceeds_withdrawn: 0,
            unsold_withdrawn: 0,
            locked: false,
        }
    }

    // 1.00 -> 0.10, 0.01 per minute, 1000 tokens, 50 minutes
    fn get_test_params(kind: AuctionKind) -> AuctionParams {
        AuctionParams {
            start_price: ONE,
            floor_price: ONE / 10,
            price_decrement: ONE / 100,
            price_interval: 60,
            total_supply: 1_000 * ONE,
            duration: 3_000,
            kind,
            whitelist_enabled: false,
            pro_rata_enabled: false,
            max_allocation: 0,
        }
    }

    fn token_rail() -> PaymentAsset {
        PaymentAsset::Token {
            mint: Pubkey::new_unique(),
        }
    }

    fn open_with(
        params: &AuctionParams,
        payment_asset: PaymentAsset,
        decimals: u8,
    ) -> Result<AuctionState> {
        let mut auction = get_blank_auction();
        open_auction(
            &mut auction,
            AuctionSetup {
                authority: owner(),
                payment_asset,
                token_mint: Pubkey::new_unique(),
                token_decimals: decimals,
                token_vault: Pubkey::new_unique(),
                payment_vault: Pubkey::new_unique(),
                vault_authority_bump: 254,
            },
            params,
            START,
        )?;
        Ok(auction)
    }

    fn get_test_auction(params: &AuctionParams) -> AuctionState {
        open_with(params, token_rail(), 6).unwrap()
    }

    fn get_test_bidder() -> BidderState {
        BidderState {
            auction: Pubkey::new_unique(),
            bidder: Pubkey::new_unique(),
            quantity: 0,
            amount_paid: 0,
            tokens_received: 0,
            refund: 0,
            claimed: false,
            bump: 255,
        }
    }

    fn get_test_whitelist() -> Whitelist {
        Whitelist {
            auction: Pubkey::new_unique(),
            addresses: vec![],
            bump: 255,
        }
    }

    fn bid(
        auction: &mut AuctionState,
        bidder: &mut BidderState,
        gateway: &mut MockGateway,
        quantity: u64,
        now: i64,
    ) -> Result<BidReceipt> {
        let value = if auction.is_native() {
            quote_bid(auction, quantity, now)?.payment
        } else {
            0
        };
        place_bid(auction, bidder, None, gateway, quantity, value, now)
    }

    fn assert_error<T>(result: Result<T>, expected: DutchAuctionError) {
        match result {
            Ok(_) => panic!("expected {:?}", expected),
            Err(err) => assert_eq!(err, anchor_lang::error::Error::from(expected)),
        }
    }

    #[test]
    fn test_open_auction_starts_active() {
        let auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        assert_eq!(auction.status, AuctionStatus::Active);
        assert_eq!(auction.start_time, START);
        assert_eq!(auction.end_time, END);
        assert_eq!(auction.one_token, ONE);
        assert_eq!(auction.clearing_price, 0);
        assert_eq!(pricing::current_price(&auction, START), ONE);
    }

    #[test]
    fn test_open_auction_rejects_invalid_config() {
        let base = get_test_params(AuctionKind::Standard);
        let cases: Vec<(AuctionParams, DutchAuctionError)> = vec![
            (
                AuctionParams {
                    floor_price: ONE,
                    ..base.clone()
                },
                DutchAuctionError::InvalidPriceRange,
            ),
            (
                AuctionParams {
                    price_decrement: 0,
                    ..base.clone()
                },
                DutchAuctionError::InvalidPriceDecrement,
            ),
            (
                AuctionParams {
                    price_interval: 0,
                    ..base.clone()
                },
                DutchAuctionError::InvalidPriceInterval,
            ),
            (
                AuctionParams {
                    duration: 0,
                    ..base.clone()
                },
                DutchAuctionError::InvalidDuration,
            ),
            (
                AuctionParams {
                    total_supply: 0,
                    ..base.clone()
                },
                DutchAuctionError::InvalidTotalSupply,
            ),
            (
                AuctionParams {
                    pro_rata_enabled: true,
                    ..base.clone()
                },
                DutchAuctionError::AdvancedFeatureDisabled,
            ),
            (
                AuctionParams {
                    kind: AuctionKind::Advanced,
                    max_allocation: base.total_supply + 1,
                    ..base.clone()
                },
                DutchAuctionError::InvalidAllocationCap,
            ),
        ];
        for (params, expected) in cases {
            assert_error(open_with(&params, token_rail(), 6), expected);
        }

        assert_error(
            open_with(&base, PaymentAsset::Token { mint: Pubkey::default() }, 6),
            DutchAuctionError::InvalidMint,
        );
        assert_error(
            open_with(&base, token_rail(), MAX_TOKEN_DECIMALS + 1),
            DutchAuctionError::InvalidTokenDecimals,
        );
    }

    #[test]
    fn test_straight_allocation_flow() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        let mut bob = get_test_bidder();

        // Alice buys 100 at 1.00
        let receipt = bid(&mut auction, &mut alice, &mut gateway, 100 * ONE, START).unwrap();
        assert_eq!(receipt.price, ONE);
        assert_eq!(receipt.payment, 100 * ONE);

        // Two minutes later Bob buys 200 at 0.98
        let receipt = bid(&mut auction, &mut bob, &mut gateway, 200 * ONE, START + 120).unwrap();
        assert_eq!(receipt.price, 980_000);
        assert_eq!(receipt.payment, 196 * ONE);

        assert_eq!(auction.total_committed, 300 * ONE);
        assert_eq!(auction.total_contributed, 296 * ONE);
        assert_eq!(auction.bidder_count, 2);
        assert_eq!(gateway.payment_vault, 296 * ONE);

        // 50 steps after start the schedule sits at 0.50
        let finalization = finalize(&mut auction, END).unwrap();
        assert_eq!(finalization.clearing_price, 500_000);
        assert_eq!(finalization.total_committed, 300 * ONE);
        assert_eq!(finalization.total_contributed, 296 * ONE);

        let outcome = claim(&mut auction, &mut alice, &mut gateway).unwrap();
        assert_eq!(outcome.tokens_received, 100 * ONE);
        assert_eq!(outcome.refund, 50 * ONE);

        let outcome = claim(&mut auction, &mut bob, &mut gateway).unwrap();
        assert_eq!(outcome.tokens_received, 200 * ONE);
        assert_eq!(outcome.refund, 96 * ONE);
        assert!(bob.claimed);
        assert_eq!(bob.tokens_received, 200 * ONE);
        assert_eq!(bob.refund, 96 * ONE);

        let proceeds = withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap();
        assert_eq!(proceeds, 150 * ONE);
        let unsold = withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap();
        assert_eq!(unsold, 700 * ONE);

        // Everything reconciles
        assert_eq!(gateway.payment_vault, 0);
        assert_eq!(gateway.token_vault, 0);
        assert_eq!(gateway.tokens_out, auction.total_supply);
        assert_eq!(gateway.payment_out, auction.total_contributed);
    }

    #[test]
    fn test_owner_can_withdraw_before_claims() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 100 * ONE, START).unwrap();
        finalize(&mut auction, END).unwrap();

        // clearing price x min(committed, supply)
        assert_eq!(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(),
            50 * ONE
        );
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            900 * ONE
        );
        // Repeated calls are no-ops
        assert_eq!(withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(), 0);
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            0
        );

        // The refund is still fully covered
        let outcome = claim(&mut auction, &mut alice, &mut gateway).unwrap();
        assert_eq!(outcome.refund, 50 * ONE);
        assert_eq!(gateway.payment_vault, 0);
        assert_eq!(gateway.token_vault, 0);
        assert_eq!(withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(), 0);
    }

    #[test]
    fn test_ledger_totals_track_participants() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut bidders: Vec<BidderState> = (0..4).map(|_| get_test_bidder()).collect();

        let mut now = START;
        for round in 0..3u64 {
            for (i, bidder) in bidders.iter_mut().enumerate() {
                let quantity = (i as u64 + 1) * 10 * ONE + round * 3;
                bid(&mut auction, bidder, &mut gateway, quantity, now).unwrap();
                now += 97;
            }
            let committed: u64 = bidders.iter().map(|b| b.quantity).sum();
            let contributed: u64 = bidders.iter().map(|b| b.amount_paid).sum();
            assert_eq!(auction.total_committed, committed);
            assert_eq!(auction.total_contributed, contributed);
            assert_eq!(gateway.payment_vault, contributed);
            assert!(auction.total_committed <= auction.total_supply);
        }
        assert_eq!(auction.bidder_count, 4);
    }

    #[test]
    fn test_standard_auction_rejects_oversubscription() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        let mut bob = get_test_bidder();

        bid(&mut auction, &mut alice, &mut gateway, 900 * ONE, START).unwrap();
        assert_error(
            bid(&mut auction, &mut bob, &mut gateway, 100 * ONE + 1, START),
            DutchAuctionError::ExceedsSupply,
        );
        assert_eq!(bob.quantity, 0);
        assert_eq!(auction.total_committed, 900 * ONE);
        assert_eq!(auction.bidder_count, 1);

        // Exactly the remainder is fine
        bid(&mut auction, &mut bob, &mut gateway, 100 * ONE, START).unwrap();
        assert_eq!(auction.total_committed, auction.total_supply);
    }

    #[test]
    fn test_pro_rata_allocation_flow() {
        let params = AuctionParams {
            pro_rata_enabled: true,
            ..get_test_params(AuctionKind::Advanced)
        };
        let mut auction = get_test_auction(&params);
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut small = get_test_bidder();
        let mut large = get_test_bidder();

        bid(&mut auction, &mut small, &mut gateway, 150 * ONE, START).unwrap();
        bid(&mut auction, &mut large, &mut gateway, 1_350 * ONE, START + 600).unwrap();
        assert_eq!(auction.total_committed, 1_500 * ONE);
        assert!(auction.is_oversubscribed());

        let finalization = finalize(&mut auction, END).unwrap();
        assert_eq!(finalization.clearing_price, 500_000);

        // floor(150 * 1000 / 1500) = 100, refund against the 100 received
        let outcome = claim(&mut auction, &mut small, &mut gateway).unwrap();
        assert_eq!(outcome.tokens_received, 100 * ONE);
        assert_eq!(outcome.clearing_cost, 50 * ONE);
        assert_eq!(outcome.refund, small.amount_paid - 50 * ONE);
        assert_eq!(outcome.refund, 100 * ONE);

        let outcome = claim(&mut auction, &mut large, &mut gateway).unwrap();
        assert_eq!(outcome.tokens_received, 900 * ONE);
        assert!(outcome.tokens_received <= large.quantity);
        assert_eq!(auction.claimed_tokens, auction.total_supply);

        // Nothing unsold, proceeds are price x supply
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            0
        );
        assert_eq!(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(),
            500 * ONE
        );
        assert_eq!(gateway.payment_vault, 0);
        assert_eq!(gateway.token_vault, 0);
    }

    #[test]
    fn test_pro_rata_dust_goes_to_owner() {
        let params = AuctionParams {
            start_price: 100,
            floor_price: 10,
            price_decrement: 1,
            price_interval: 60,
            total_supply: 10,
            duration: 3_000,
            kind: AuctionKind::Advanced,
            whitelist_enabled: false,
            pro_rata_enabled: true,
            max_allocation: 0,
        };
        let mut auction = open_with(&params, PaymentAsset::Native, 0).unwrap();
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut bidders: Vec<BidderState> = (0..3).map(|_| get_test_bidder()).collect();
        for bidder in bidders.iter_mut() {
            let receipt = bid(&mut auction, bidder, &mut gateway, 7, START).unwrap();
            assert_eq!(receipt.payment, 700);
        }
        finalize(&mut auction, END).unwrap();
        assert_eq!(auction.clearing_price, 50);

        // Before any claim the owner only gets what is certainly owed
        assert_eq!(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(),
            350
        );
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            0
        );

        let mut allocated = 0;
        for bidder in bidders.iter_mut() {
            let outcome = claim(&mut auction, bidder, &mut gateway).unwrap();
            assert_eq!(outcome.tokens_received, 3);
            assert_eq!(outcome.refund, 550);
            allocated += outcome.tokens_received;
        }
        assert!(allocated <= auction.total_supply);

        // Rounding dust is released once every share is known
        assert_eq!(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(),
            100
        );
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            1
        );
        assert_eq!(gateway.payment_vault, 0);
        assert_eq!(gateway.token_vault, 0);
    }

    #[test]
    fn test_cancel_before_bids() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();

        assert_error(
            cancel(&mut auction, &Pubkey::new_unique()),
            DutchAuctionError::Unauthorized,
        );
        assert_error(
            emergency_withdraw(&mut auction, &owner(), &mut gateway),
            DutchAuctionError::AuctionNotCancelled,
        );

        cancel(&mut auction, &owner()).unwrap();
        assert_eq!(auction.status, AuctionStatus::Cancelled);

        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, ONE, START + 1),
            DutchAuctionError::AuctionNotActive,
        );
        assert_error(
            cancel(&mut auction, &owner()),
            DutchAuctionError::AuctionNotActive,
        );
        assert_error(finalize(&mut auction, END), DutchAuctionError::AuctionNotActive);
        assert_eq!(pricing::effective_price(&auction, END), auction.floor_price);

        assert_error(
            emergency_withdraw(&mut auction, &Pubkey::new_unique(), &mut gateway),
            DutchAuctionError::Unauthorized,
        );
        assert_eq!(
            emergency_withdraw(&mut auction, &owner(), &mut gateway).unwrap(),
            1_000 * ONE
        );
        assert_eq!(gateway.token_vault, 0);
        assert_eq!(
            emergency_withdraw(&mut auction, &owner(), &mut gateway).unwrap(),
            0
        );
    }

    #[test]
    fn test_cancel_rejected_once_bids_exist() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, ONE, START).unwrap();

        assert_error(
            cancel(&mut auction, &owner()),
            DutchAuctionError::BidsAlreadyPlaced,
        );
        assert_eq!(auction.status, AuctionStatus::Active);
    }

    #[test]
    fn test_finalize_lifecycle() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 10 * ONE, START).unwrap();

        assert_error(
            finalize(&mut auction, END - 1),
            DutchAuctionError::AuctionStillActive,
        );
        assert_eq!(auction.status, AuctionStatus::Active);

        // Finalized well after the end: the price is taken at the finalize instant
        let late = END + 20 * 60;
        let finalization = finalize(&mut auction, late).unwrap();
        assert_eq!(finalization.clearing_price, 300_000);
        assert_eq!(auction.status, AuctionStatus::Finalized);

        assert_error(
            finalize(&mut auction, late + 600),
            DutchAuctionError::AlreadyFinalized,
        );
        assert_eq!(auction.clearing_price, 300_000);
        assert_eq!(pricing::effective_price(&auction, late + 6_000), 300_000);
        assert_eq!(quote_bid(&auction, ONE, late + 6_000).unwrap().price, 300_000);

        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, ONE, late),
            DutchAuctionError::AuctionNotActive,
        );
        assert_error(
            set_pro_rata_enabled(&mut auction, &owner(), true),
            DutchAuctionError::AdvancedFeatureDisabled,
        );
    }

    #[test]
    fn test_bid_window_and_quantity() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();

        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, ONE, START - 1),
            DutchAuctionError::AuctionNotStarted,
        );
        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, ONE, END + 1),
            DutchAuctionError::AuctionEnded,
        );
        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, 0, START),
            DutchAuctionError::InvalidQuantity,
        );
        // Both ends of the window are inclusive
        bid(&mut auction, &mut alice, &mut gateway, ONE, START).unwrap();
        let receipt = bid(&mut auction, &mut alice, &mut gateway, ONE, END).unwrap();
        assert_eq!(receipt.price, 500_000);
        assert_eq!(alice.quantity, 2 * ONE);
        assert_eq!(alice.amount_paid, ONE + 500_000);
        assert_eq!(auction.bidder_count, 1);
    }

    #[test]
    fn test_claim_preconditions_and_exactly_once() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        let mut idle = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 10 * ONE, START).unwrap();

        assert_error(
            claim(&mut auction, &mut alice, &mut gateway),
            DutchAuctionError::AuctionNotFinalized,
        );
        finalize(&mut auction, END).unwrap();

        assert_error(
            claim(&mut auction, &mut idle, &mut gateway),
            DutchAuctionError::NothingToClaim,
        );

        let first = claim(&mut auction, &mut alice, &mut gateway).unwrap();
        let tokens_out = gateway.tokens_out;
        let payment_out = gateway.payment_out;

        assert_error(
            claim(&mut auction, &mut alice, &mut gateway),
            DutchAuctionError::AlreadyClaimed,
        );
        assert_eq!(gateway.tokens_out, tokens_out);
        assert_eq!(gateway.payment_out, payment_out);
        assert_eq!(auction.claimed_count, 1);
        assert_eq!(alice.tokens_received, first.tokens_received);
        assert!(!auction.locked);
    }

    #[test]
    fn test_reentrant_claim_is_rejected() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 10 * ONE, START).unwrap();
        finalize(&mut auction, END).unwrap();

        gateway.reenter_on_send = true;
        let outcome = claim(&mut auction, &mut alice, &mut gateway).unwrap();

        let reentry = gateway.reentry.take().expect("claim was re-entered");
        assert_error(reentry, DutchAuctionError::Reentrancy);

        // The outer claim completed exactly once
        assert_eq!(outcome.tokens_received, 10 * ONE);
        assert_eq!(gateway.tokens_out, 10 * ONE);
        assert_eq!(gateway.payment_out, outcome.refund);
        assert_eq!(auction.claimed_count, 1);
        assert!(alice.claimed);
        assert!(!auction.locked);
    }

    #[test]
    fn test_locked_auction_rejects_every_entry_point() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Advanced));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        let mut whitelist = get_test_whitelist();
        auction.locked = true;

        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, ONE, START),
            DutchAuctionError::Reentrancy,
        );
        assert_error(finalize(&mut auction, END), DutchAuctionError::Reentrancy);
        assert_error(cancel(&mut auction, &owner()), DutchAuctionError::Reentrancy);
        assert_error(
            claim(&mut auction, &mut alice, &mut gateway),
            DutchAuctionError::Reentrancy,
        );
        assert_error(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway),
            DutchAuctionError::Reentrancy,
        );
        assert_error(
            add_to_whitelist(&mut auction, &mut whitelist, &owner(), &[alice.bidder]),
            DutchAuctionError::Reentrancy,
        );
        assert!(auction.locked);
        assert_eq!(alice.quantity, 0);
    }

    #[test]
    fn test_failed_payment_leaves_ledger_untouched() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, ONE, START).unwrap();

        gateway.fail_collect = true;
        assert!(bid(&mut auction, &mut alice, &mut gateway, ONE, START + 60).is_err());

        assert_eq!(alice.quantity, ONE);
        assert_eq!(alice.amount_paid, ONE);
        assert_eq!(auction.total_committed, ONE);
        assert_eq!(auction.total_contributed, ONE);
        assert_eq!(auction.bidder_count, 1);
        assert!(!auction.locked);
    }

    #[test]
    fn test_failed_refund_rolls_back_claim() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, ONE, START).unwrap();
        finalize(&mut auction, END).unwrap();

        gateway.fail_send_payment = true;
        assert!(claim(&mut auction, &mut alice, &mut gateway).is_err());
        assert!(!alice.claimed);
        assert_eq!(alice.refund, 0);
        assert_eq!(auction.claimed_count, 0);
        assert_eq!(auction.claimed_tokens, 0);
        assert!(!auction.locked);

        gateway.fail_send_payment = false;
        let outcome = claim(&mut auction, &mut alice, &mut gateway).unwrap();
        assert_eq!(outcome.refund, 500_000);
    }

    #[test]
    fn test_native_rail_requires_exact_value() {
        let params = get_test_params(AuctionKind::Standard);
        let mut auction = open_with(&params, PaymentAsset::Native, 6).unwrap();
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();

        let payment = quote_bid(&auction, 3 * ONE, START).unwrap().payment;
        assert_error(
            place_bid(&mut auction, &mut alice, None, &mut gateway, 3 * ONE, payment + 1, START),
            DutchAuctionError::PaymentMismatch,
        );
        assert_error(
            place_bid(&mut auction, &mut alice, None, &mut gateway, 3 * ONE, payment - 1, START),
            DutchAuctionError::PaymentMismatch,
        );
        place_bid(&mut auction, &mut alice, None, &mut gateway, 3 * ONE, payment, START).unwrap();
        assert_eq!(gateway.payment_vault, payment);

        let mut token_auction = get_test_auction(&params);
        let mut bob = get_test_bidder();
        assert_error(
            place_bid(&mut token_auction, &mut bob, None, &mut gateway, ONE, 1, START),
            DutchAuctionError::PaymentMismatch,
        );
    }

    #[test]
    fn test_whitelist_gate() {
        let params = AuctionParams {
            whitelist_enabled: true,
            ..get_test_params(AuctionKind::Advanced)
        };
        let mut auction = get_test_auction(&params);
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut whitelist = get_test_whitelist();
        let mut alice = get_test_bidder();

        assert_error(
            place_bid(&mut auction, &mut alice, None, &mut gateway, ONE, 0, START),
            DutchAuctionError::NotWhitelisted,
        );
        assert_error(
            place_bid(&mut auction, &mut alice, Some(&whitelist), &mut gateway, ONE, 0, START),
            DutchAuctionError::NotWhitelisted,
        );

        assert_error(
            add_to_whitelist(&mut auction, &mut whitelist, &Pubkey::new_unique(), &[alice.bidder]),
            DutchAuctionError::Unauthorized,
        );
        let added = add_to_whitelist(
            &mut auction,
            &mut whitelist,
            &owner(),
            &[alice.bidder, alice.bidder, Pubkey::new_unique()],
        )
        .unwrap();
        assert_eq!(added, 2);
        place_bid(&mut auction, &mut alice, Some(&whitelist), &mut gateway, ONE, 0, START).unwrap();

        let removed =
            remove_from_whitelist(&mut auction, &mut whitelist, &owner(), &[alice.bidder]).unwrap();
        assert_eq!(removed, 1);
        assert_error(
            place_bid(&mut auction, &mut alice, Some(&whitelist), &mut gateway, ONE, 0, START),
            DutchAuctionError::NotWhitelisted,
        );

        set_whitelist_enabled(&mut auction, &owner(), false).unwrap();
        place_bid(&mut auction, &mut alice, None, &mut gateway, ONE, 0, START).unwrap();
        assert_eq!(alice.quantity, 2 * ONE);
    }

    #[test]
    fn test_whitelist_capacity_is_all_or_nothing() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Advanced));
        let mut whitelist = get_test_whitelist();
        let almost_full: Vec<Pubkey> = (0..MAX_WHITELIST_LEN - 1)
            .map(|_| Pubkey::new_unique())
            .collect();
        add_to_whitelist(&mut auction, &mut whitelist, &owner(), &almost_full).unwrap();

        let overflow = [Pubkey::new_unique(), Pubkey::new_unique()];
        assert_error(
            add_to_whitelist(&mut auction, &mut whitelist, &owner(), &overflow),
            DutchAuctionError::WhitelistFull,
        );
        assert_eq!(whitelist.addresses.len(), MAX_WHITELIST_LEN - 1);
    }

    #[test]
    fn test_advanced_admin_rejected_on_standard_auction() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut whitelist = get_test_whitelist();
        assert_error(
            add_to_whitelist(&mut auction, &mut whitelist, &owner(), &[Pubkey::new_unique()]),
            DutchAuctionError::AdvancedFeatureDisabled,
        );
        assert_error(
            set_whitelist_enabled(&mut auction, &owner(), true),
            DutchAuctionError::AdvancedFeatureDisabled,
        );
        assert_error(
            set_pro_rata_enabled(&mut auction, &owner(), true),
            DutchAuctionError::AdvancedFeatureDisabled,
        );
    }

    #[test]
    fn test_allocation_cap() {
        let params = AuctionParams {
            max_allocation: 50 * ONE,
            ..get_test_params(AuctionKind::Advanced)
        };
        let mut auction = get_test_auction(&params);
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();

        bid(&mut auction, &mut alice, &mut gateway, 30 * ONE, START).unwrap();
        assert_error(
            bid(&mut auction, &mut alice, &mut gateway, 30 * ONE, START),
            DutchAuctionError::ExceedsAllocationCap,
        );
        bid(&mut auction, &mut alice, &mut gateway, 20 * ONE, START).unwrap();
        assert_eq!(alice.quantity, 50 * ONE);
    }

    #[test]
    fn test_pro_rata_toggle_frozen_after_bids() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Advanced));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();

        assert_error(
            set_pro_rata_enabled(&mut auction, &Pubkey::new_unique(), true),
            DutchAuctionError::Unauthorized,
        );
        set_pro_rata_enabled(&mut auction, &owner(), true).unwrap();
        assert!(auction.pro_rata_enabled);

        bid(&mut auction, &mut alice, &mut gateway, 1_200 * ONE, START).unwrap();
        assert_error(
            set_pro_rata_enabled(&mut auction, &owner(), false),
            DutchAuctionError::BidsAlreadyPlaced,
        );
        assert!(auction.pro_rata_enabled);
    }

    #[test]
    fn test_withdrawals_require_owner_and_finalize() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);

        assert_error(
            withdraw_proceeds(&mut auction, &owner(), &mut gateway),
            DutchAuctionError::AuctionNotFinalized,
        );
        assert_error(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway),
            DutchAuctionError::AuctionNotFinalized,
        );
        finalize(&mut auction, END).unwrap();
        assert_error(
            withdraw_proceeds(&mut auction, &Pubkey::new_unique(), &mut gateway),
            DutchAuctionError::Unauthorized,
        );
        assert_error(
            withdraw_unsold_tokens(&mut auction, &Pubkey::new_unique(), &mut gateway),
            DutchAuctionError::Unauthorized,
        );

        // No bids: everything is unsold, nothing was raised
        assert_eq!(withdraw_proceeds(&mut auction, &owner(), &mut gateway).unwrap(), 0);
        assert_eq!(
            withdraw_unsold_tokens(&mut auction, &owner(), &mut gateway).unwrap(),
            1_000 * ONE
        );
    }

    #[test]
    fn test_compute_claim_matches_claim() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 7 * ONE + 3, START + 61).unwrap();
        bid(&mut auction, &mut alice, &mut gateway, 5 * ONE + 1, START + 1_999).unwrap();
        finalize(&mut auction, END + 1).unwrap();

        let preview = compute_claim(&auction, &alice).unwrap();
        let outcome = claim(&mut auction, &mut alice, &mut gateway).unwrap();
        assert_eq!(preview, outcome);
        assert_eq!(outcome.clearing_cost + outcome.refund, alice.amount_paid);
    }

    #[test]
    fn test_bid_persists_lock_before_collecting_payment() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::funded(auction.total_supply);
        let mut alice = get_test_bidder();
        bid(&mut auction, &mut alice, &mut gateway, 5 * ONE, START).unwrap();

        // The stored auction was locked while the payment transfer ran
        assert_eq!(gateway.locked_at_collect, Some(true));
        let (stored, stored_bidder) = gateway.snapshot.clone().unwrap();
        assert_eq!(stored.total_committed, 0);
        assert_eq!(stored_bidder.map(|b| b.quantity), Some(0));
        assert!(!auction.locked);
        assert_eq!(auction.total_committed, 5 * ONE);
    }

    #[test]
    fn test_emergency_withdraw_on_empty_vault_moves_nothing() {
        let mut auction = get_test_auction(&get_test_params(AuctionKind::Standard));
        let mut gateway = MockGateway::default();
        cancel(&mut auction, &owner()).unwrap();

        assert_eq!(
            emergency_withdraw(&mut auction, &owner(), &mut gateway).unwrap(),
            0
        );
        assert_eq!(gateway.tokens_out, 0);
        assert!(gateway.snapshot.is_none());
        assert!(!auction.locked);
    }
}
