use anchor_lang::prelude::*;

#[error_code]
pub enum DutchAuctionError {
    // Authorization
    #[msg("Caller is not the auction owner")]
    Unauthorized,
    #[msg("Bidder is not on the whitelist")]
    NotWhitelisted,

    // Configuration
    #[msg("Start price must be greater than floor price")]
    InvalidPriceRange,
    #[msg("Price decrement must be greater than zero")]
    InvalidPriceDecrement,
    #[msg("Price interval must be greater than zero")]
    InvalidPriceInterval,
    #[msg("Invalid auction duration")]
    InvalidDuration,
    #[msg("Total supply must be greater than zero")]
    InvalidTotalSupply,
    #[msg("Invalid token decimals")]
    InvalidTokenDecimals,
    #[msg("Asset mint must not be the default pubkey")]
    InvalidMint,
    #[msg("Per-participant allocation cap exceeds total supply")]
    InvalidAllocationCap,
    #[msg("Feature is only available on advanced auctions")]
    AdvancedFeatureDisabled,

    // Lifecycle
    #[msg("Auction is not active")]
    AuctionNotActive,
    #[msg("Auction has not started yet")]
    AuctionNotStarted,
    #[msg("Auction has already ended")]
    AuctionEnded,
    #[msg("Auction is still active")]
    AuctionStillActive,
    #[msg("Auction is already finalized")]
    AlreadyFinalized,
    #[msg("Auction is not finalized")]
    AuctionNotFinalized,
    #[msg("Auction is not cancelled")]
    AuctionNotCancelled,
    #[msg("Bids have already been placed")]
    BidsAlreadyPlaced,

    // Capacity
    #[msg("Bid quantity must be greater than zero")]
    InvalidQuantity,
    #[msg("Bid exceeds remaining supply")]
    ExceedsSupply,
    #[msg("Bid exceeds per-participant allocation cap")]
    ExceedsAllocationCap,

    // Payment
    #[msg("Attached value does not match the required payment")]
    PaymentMismatch,
    #[msg("Instruction does not match the auction payment asset")]
    PaymentRailMismatch,

    // Settlement
    #[msg("Participant has already claimed")]
    AlreadyClaimed,
    #[msg("Participant has nothing to claim")]
    NothingToClaim,
    #[msg("Clearing cost exceeds amount paid")]
    SettlementInvariantViolated,

    // Concurrency
    #[msg("Reentrant call detected")]
    Reentrancy,

    #[msg("Whitelist is full")]
    WhitelistFull,

    #[msg("Required account was not provided")]
    MissingAccount,

    #[msg("Math overflow")]
    MathOverflow,
}
