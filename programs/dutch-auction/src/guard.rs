use anchor_lang::prelude::*;

use crate::errors::DutchAuctionError;
use crate::state::AuctionState;

/// Runs `op` while holding the auction's reentrancy lock.
///
/// Nested entry fails with `Reentrancy`. The lock is released on every exit path; on
/// failure the auction is restored to its state before the call, so a failed operation
/// leaves nothing staged behind.
pub fn non_reentrant<T>(
    auction: &mut AuctionState,
    op: impl FnOnce(&mut AuctionState) -> Result<T>,
) -> Result<T> {
    require!(!auction.locked, DutchAuctionError::Reentrancy);
    let snapshot = auction.clone();
    auction.locked = true;

    let result = op(auction);
    match result {
        Ok(_) => auction.locked = false,
        Err(_) => *auction = snapshot,
    }
    result
}

/// Restores `record` if `op` fails.
pub fn rollback_on_error<R: Clone, T>(
    record: &mut R,
    op: impl FnOnce(&mut R) -> Result<T>,
) -> Result<T> {
    let snapshot = record.clone();
    let result = op(record);
    if result.is_err() {
        *record = snapshot;
    }
    result
}
