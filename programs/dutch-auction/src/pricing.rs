//! Price schedule and settlement arithmetic.
//!
//! Prices are payment-asset atomic units per ONE auctioned token (`one_token = 10^decimals`).
//! Quantities are auctioned-asset atomic units.
use anchor_lang::prelude::*;

use crate::errors::DutchAuctionError;
use crate::state::{AuctionState, AuctionStatus};

pub(crate) fn ceil_div(n: u128, d: u128) -> Result<u128> {
    require!(d != 0, DutchAuctionError::MathOverflow);
    let n = n
        .checked_add(d - 1)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    Ok(n / d)
}

fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| error!(DutchAuctionError::MathOverflow))
}

/// Step-wise descending price.
///
/// The reduction is clamped against `start_price - floor_price` before it is subtracted,
/// so any elapsed time lands on the floor instead of underflowing.
pub fn price_at(
    start_price: u64,
    floor_price: u64,
    price_decrement: u64,
    price_interval: u64,
    start_time: i64,
    now: i64,
) -> u64 {
    if now <= start_time || price_interval == 0 {
        return start_price;
    }
    let elapsed = now.abs_diff(start_time);
    let steps = (elapsed / price_interval) as u128;
    let reduction = steps.saturating_mul(price_decrement as u128);
    let range = start_price.saturating_sub(floor_price) as u128;
    if reduction >= range {
        floor_price
    } else {
        // reduction < range <= u64::MAX
        start_price - reduction as u64
    }
}

/// Schedule price for an auction, regardless of its status.
pub fn current_price(auction: &AuctionState, now: i64) -> u64 {
    price_at(
        auction.start_price,
        auction.floor_price,
        auction.price_decrement,
        auction.price_interval,
        auction.start_time,
        now,
    )
}

/// The price that governs the auction right now: the live schedule while active,
/// the frozen clearing price once finalized, the floor otherwise.
pub fn effective_price(auction: &AuctionState, now: i64) -> u64 {
    match auction.status {
        AuctionStatus::Active => current_price(auction, now),
        AuctionStatus::Finalized => auction.clearing_price,
        AuctionStatus::NotStarted | AuctionStatus::Cancelled => auction.floor_price,
    }
}

/// Payment owed for `quantity` at `price`, rounded up.
///
/// Rounding the payment up and the clearing cost up keeps `amount_paid >= clearing_cost`
/// for every participant, however many bids they split their quantity across.
pub fn bid_payment(price: u64, quantity: u64, one_token: u64) -> Result<u64> {
    let gross = (price as u128)
        .checked_mul(quantity as u128)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    to_u64(ceil_div(gross, one_token as u128)?)
}

/// What `tokens` cost at the uniform clearing price.
pub fn clearing_cost(clearing_price: u64, tokens: u64, one_token: u64) -> Result<u64> {
    bid_payment(clearing_price, tokens, one_token)
}

/// Tokens a participant receives: everything they committed, or their pro-rata share
/// (rounded down) when demand exceeded supply.
pub fn allocation(quantity: u64, total_supply: u64, total_committed: u64) -> Result<u64> {
    if total_committed <= total_supply {
        return Ok(quantity);
    }
    let scaled = (quantity as u128)
        .checked_mul(total_supply as u128)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    to_u64(scaled / total_committed as u128)
}

/// Bounds on the tokens still owed to participants who have not claimed yet.
///
/// Without oversubscription the unclaimed allocation is exact. With it, each unclaimed
/// share is floored individually, so their sum lies within `unclaimed_count` of the
/// pooled share.
pub fn unclaimed_allocation_bounds(auction: &AuctionState) -> Result<(u64, u64)> {
    let unclaimed_quantity = auction
        .total_committed
        .checked_sub(auction.claimed_quantity)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    if !auction.is_oversubscribed() {
        return Ok((unclaimed_quantity, unclaimed_quantity));
    }
    let upper = allocation(
        unclaimed_quantity,
        auction.total_supply,
        auction.total_committed,
    )?;
    let unclaimed_count = auction
        .bidder_count
        .checked_sub(auction.claimed_count)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    let lower = if unclaimed_count == 0 {
        upper
    } else {
        upper.saturating_sub(unclaimed_count)
    };
    Ok((lower, upper))
}

/// Payment-asset amount the owner may have taken so far: the exact cost of what has been
/// claimed plus a lower bound for what is still unclaimed.
pub fn proceeds_entitlement(auction: &AuctionState) -> Result<u64> {
    let (lower, _) = unclaimed_allocation_bounds(auction)?;
    let unclaimed_cost = clearing_cost(auction.clearing_price, lower, auction.one_token)?;
    auction
        .claimed_cost
        .checked_add(unclaimed_cost)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))
}

/// Auctioned tokens that will never be delivered to a participant.
pub fn unsold_entitlement(auction: &AuctionState) -> Result<u64> {
    let (_, upper) = unclaimed_allocation_bounds(auction)?;
    let owed = auction
        .claimed_tokens
        .checked_add(upper)
        .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
    Ok(auction.total_supply.saturating_sub(owed))
}
