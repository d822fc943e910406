//! # Dutch Auction
//!
//! A descending-price token sale. The price steps down from `start_price` towards
//! `floor_price` while participants commit quantities, each paying the price of the moment.
//! At finalize a single clearing price is frozen; at claim every participant receives their
//! tokens (pro-rata when an advanced auction is oversubscribed) and is refunded the difference
//! between what they paid and the clearing cost.
//!
//! Payments use either lamports (native rail) or an SPL token (token rail), fixed per auction.
use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token_interface::{self, Mint, TokenAccount, TokenInterface, TransferChecked};

pub mod engine;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod guard;
pub mod pricing;
pub mod state;

use engine::AuctionSetup;
use errors::*;
use events::*;
use gateway::{PaymentLeg, SplLeg, VaultGateway};
use state::*;

declare_id!("dcvcvQyGbKvK9RnMeXD19bYDfFq4TW6XUbK7ENa9sB3");

pub mod constants {
    /// `one_token = 10^decimals` must fit in a u64.
    pub const MAX_TOKEN_DECIMALS: u8 = 19;
    pub const MAX_WHITELIST_LEN: usize = 200;
}

pub mod seeds {
    pub const VAULT_AUTHORITY: &[u8] = b"vault_authority";
    pub const TOKEN_VAULT: &[u8] = b"token_vault";
    pub const CURRENCY_VAULT: &[u8] = b"currency_vault";
    pub const NATIVE_VAULT: &[u8] = b"native_vault";
    pub const BIDDER: &[u8] = b"bidder";
    pub const WHITELIST: &[u8] = b"whitelist";
}

#[program]
pub mod dutch_auction {
    use super::*;

    /// Create an auction paid in an SPL token and fund its token vault with `total_supply`.
    pub fn initialize_auction(
        ctx: Context<InitializeAuction>,
        params: AuctionParams,
    ) -> Result<()> {
        let vault_authority_bump = ctx.bumps.vault_authority;
        let accounts = &mut *ctx.accounts;
        let setup = AuctionSetup {
            authority: accounts.authority.key(),
            payment_asset: PaymentAsset::Token {
                mint: accounts.currency_mint.key(),
            },
            token_mint: accounts.token_mint.key(),
            token_decimals: accounts.token_mint.decimals,
            token_vault: accounts.token_vault.key(),
            payment_vault: accounts.currency_vault.key(),
            vault_authority_bump,
        };

        let now = Clock::get()?.unix_timestamp;
        engine::open_auction(&mut accounts.auction, setup, &params, now)?;
        fund_token_vault(
            &accounts.token_program,
            &accounts.token_mint,
            &accounts.creator_token,
            &accounts.token_vault,
            &accounts.authority,
            params.total_supply,
        )?;

        emit!(auction_created(accounts.auction.key(), &accounts.auction));
        Ok(())
    }

    /// Create an auction paid in lamports and fund its token vault with `total_supply`.
    pub fn initialize_auction_native(
        ctx: Context<InitializeAuctionNative>,
        params: AuctionParams,
    ) -> Result<()> {
        let vault_authority_bump = ctx.bumps.vault_authority;
        let native_vault_bump = ctx.bumps.native_vault;
        let accounts = &mut *ctx.accounts;

        let native_vault = &mut accounts.native_vault;
        native_vault.auction = accounts.auction.key();
        native_vault.bump = native_vault_bump;

        let setup = AuctionSetup {
            authority: accounts.authority.key(),
            payment_asset: PaymentAsset::Native,
            token_mint: accounts.token_mint.key(),
            token_decimals: accounts.token_mint.decimals,
            token_vault: accounts.token_vault.key(),
            payment_vault: accounts.native_vault.key(),
            vault_authority_bump,
        };

        let now = Clock::get()?.unix_timestamp;
        engine::open_auction(&mut accounts.auction, setup, &params, now)?;
        fund_token_vault(
            &accounts.token_program,
            &accounts.token_mint,
            &accounts.creator_token,
            &accounts.token_vault,
            &accounts.authority,
            params.total_supply,
        )?;

        emit!(auction_created(accounts.auction.key(), &accounts.auction));
        Ok(())
    }

    /// Commit `quantity` at the current price, paying in the auction's SPL currency.
    /// `attached_value` must be 0 on this rail.
    pub fn place_bid(ctx: Context<PlaceBid>, quantity: u64, attached_value: u64) -> Result<()> {
        let bump = ctx.bumps.bidder_state;
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        register_bidder(&mut accounts.bidder_state, auction_key, accounts.bidder.key(), bump);

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_token_program(accounts.token_program.to_account_info())
        .with_payer(accounts.bidder.to_account_info())
        .with_payment(PaymentLeg::Spl(spl_leg(
            &accounts.currency_mint,
            &accounts.currency_vault,
            accounts.bidder_currency.to_account_info(),
        )))
        .with_checkpoint(
            accounts.auction.to_account_info(),
            Some(accounts.bidder_state.to_account_info()),
        );

        let now = Clock::get()?.unix_timestamp;
        let receipt = engine::place_bid(
            &mut accounts.auction,
            &mut accounts.bidder_state,
            accounts.whitelist.as_deref(),
            &mut gateway,
            quantity,
            attached_value,
            now,
        )?;

        emit!(BidPlaced {
            auction: auction_key,
            bidder: accounts.bidder.key(),
            quantity: receipt.quantity,
            price: receipt.price,
            payment: receipt.payment,
        });
        Ok(())
    }

    /// Commit `quantity` at the current price, paying in lamports.
    /// `attached_value` must equal the computed payment exactly.
    pub fn place_bid_native(
        ctx: Context<PlaceBidNative>,
        quantity: u64,
        attached_value: u64,
    ) -> Result<()> {
        let bump = ctx.bumps.bidder_state;
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        register_bidder(&mut accounts.bidder_state, auction_key, accounts.bidder.key(), bump);

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_payer(accounts.bidder.to_account_info())
        .with_payment(PaymentLeg::Native {
            vault: accounts.native_vault.to_account_info(),
            counterparty: accounts.bidder.to_account_info(),
            system: accounts.system_program.to_account_info(),
        })
        .with_checkpoint(
            accounts.auction.to_account_info(),
            Some(accounts.bidder_state.to_account_info()),
        );

        let now = Clock::get()?.unix_timestamp;
        let receipt = engine::place_bid(
            &mut accounts.auction,
            &mut accounts.bidder_state,
            accounts.whitelist.as_deref(),
            &mut gateway,
            quantity,
            attached_value,
            now,
        )?;

        emit!(BidPlaced {
            auction: auction_key,
            bidder: accounts.bidder.key(),
            quantity: receipt.quantity,
            price: receipt.price,
            payment: receipt.payment,
        });
        Ok(())
    }

    /// Freeze the clearing price. Permissionless once the bidding window has closed.
    pub fn finalize_auction(ctx: Context<FinalizeAuction>) -> Result<()> {
        let auction_key = ctx.accounts.auction.key();
        let now = Clock::get()?.unix_timestamp;
        let finalization = engine::finalize(&mut ctx.accounts.auction, now)?;

        emit!(AuctionFinalized {
            auction: auction_key,
            clearing_price: finalization.clearing_price,
            total_committed: finalization.total_committed,
            total_contributed: finalization.total_contributed,
        });
        Ok(())
    }

    pub fn cancel_auction(ctx: Context<ConfigureAuction>) -> Result<()> {
        let auction_key = ctx.accounts.auction.key();
        let authority = ctx.accounts.authority.key();
        engine::cancel(&mut ctx.accounts.auction, &authority)?;

        msg!("Auction cancelled");
        emit!(AuctionCancelled {
            auction: auction_key,
            authority,
        });
        Ok(())
    }

    /// Receive the allocated tokens and the SPL currency refund.
    pub fn claim(ctx: Context<Claim>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_token_program(accounts.token_program.to_account_info())
        .with_tokens(spl_leg(
            &accounts.token_mint,
            &accounts.token_vault,
            accounts.bidder_token.to_account_info(),
        ))
        .with_payment(PaymentLeg::Spl(spl_leg(
            &accounts.currency_mint,
            &accounts.currency_vault,
            accounts.bidder_currency.to_account_info(),
        )))
        .with_checkpoint(
            accounts.auction.to_account_info(),
            Some(accounts.bidder_state.to_account_info()),
        );

        let outcome = engine::claim(
            &mut accounts.auction,
            &mut accounts.bidder_state,
            &mut gateway,
        )?;

        emit!(TokensClaimed {
            auction: auction_key,
            bidder: accounts.bidder.key(),
            tokens_received: outcome.tokens_received,
            refund: outcome.refund,
        });
        Ok(())
    }

    /// Receive the allocated tokens and the lamport refund.
    pub fn claim_native(ctx: Context<ClaimNative>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_token_program(accounts.token_program.to_account_info())
        .with_tokens(spl_leg(
            &accounts.token_mint,
            &accounts.token_vault,
            accounts.bidder_token.to_account_info(),
        ))
        .with_payment(PaymentLeg::Native {
            vault: accounts.native_vault.to_account_info(),
            counterparty: accounts.bidder.to_account_info(),
            system: accounts.system_program.to_account_info(),
        })
        .with_checkpoint(
            accounts.auction.to_account_info(),
            Some(accounts.bidder_state.to_account_info()),
        );

        let outcome = engine::claim(
            &mut accounts.auction,
            &mut accounts.bidder_state,
            &mut gateway,
        )?;

        emit!(TokensClaimed {
            auction: auction_key,
            bidder: accounts.bidder.key(),
            tokens_received: outcome.tokens_received,
            refund: outcome.refund,
        });
        Ok(())
    }

    pub fn withdraw_proceeds(ctx: Context<WithdrawProceeds>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        let authority = accounts.authority.key();

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_token_program(accounts.token_program.to_account_info())
        .with_payment(PaymentLeg::Spl(spl_leg(
            &accounts.currency_mint,
            &accounts.currency_vault,
            accounts.authority_currency.to_account_info(),
        )))
        .with_checkpoint(accounts.auction.to_account_info(), None);

        let amount = engine::withdraw_proceeds(&mut accounts.auction, &authority, &mut gateway)?;
        if amount > 0 {
            emit!(ProceedsWithdrawn {
                auction: auction_key,
                authority,
                amount,
            });
        }
        Ok(())
    }

    pub fn withdraw_proceeds_native(ctx: Context<WithdrawProceedsNative>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        let authority = accounts.authority.key();

        let mut gateway = VaultGateway::new(
            &accounts.auction,
            auction_key,
            accounts.vault_authority.to_account_info(),
        )
        .with_payment(PaymentLeg::Native {
            vault: accounts.native_vault.to_account_info(),
            counterparty: accounts.authority.to_account_info(),
            system: accounts.system_program.to_account_info(),
        })
        .with_checkpoint(accounts.auction.to_account_info(), None);

        let amount = engine::withdraw_proceeds(&mut accounts.auction, &authority, &mut gateway)?;
        if amount > 0 {
            emit!(ProceedsWithdrawn {
                auction: auction_key,
                authority,
                amount,
            });
        }
        Ok(())
    }

    pub fn withdraw_unsold_tokens(ctx: Context<WithdrawTokens>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        let authority = accounts.authority.key();
        let mut gateway = accounts.gateway(auction_key);

        let amount =
            engine::withdraw_unsold_tokens(&mut accounts.auction, &authority, &mut gateway)?;
        if amount > 0 {
            emit!(UnsoldTokensWithdrawn {
                auction: auction_key,
                authority,
                amount,
            });
        }
        Ok(())
    }

    /// Recover the full token vault of a cancelled auction.
    pub fn emergency_withdraw(ctx: Context<WithdrawTokens>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let auction_key = accounts.auction.key();
        let authority = accounts.authority.key();
        let mut gateway = accounts.gateway(auction_key);

        let amount = engine::emergency_withdraw(&mut accounts.auction, &authority, &mut gateway)?;
        if amount > 0 {
            emit!(EmergencyWithdrawn {
                auction: auction_key,
                authority,
                amount,
            });
        }
        Ok(())
    }

    pub fn create_whitelist(ctx: Context<CreateWhitelist>) -> Result<()> {
        let auction = &ctx.accounts.auction;
        auction.require_owner(&ctx.accounts.authority.key())?;
        auction.require_advanced()?;

        let whitelist = &mut ctx.accounts.whitelist;
        whitelist.auction = auction.key();
        whitelist.addresses = Vec::new();
        whitelist.bump = ctx.bumps.whitelist;
        Ok(())
    }

    pub fn add_to_whitelist(ctx: Context<UpdateWhitelist>, addresses: Vec<Pubkey>) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let added = engine::add_to_whitelist(
            &mut accounts.auction,
            &mut accounts.whitelist,
            &accounts.authority.key(),
            &addresses,
        )?;

        msg!("Whitelist: added={}, size={}", added, accounts.whitelist.addresses.len());
        emit!(WhitelistUpdated {
            auction: accounts.auction.key(),
            added: added as u32,
            removed: 0,
            size: accounts.whitelist.addresses.len() as u32,
        });
        Ok(())
    }

    pub fn remove_from_whitelist(
        ctx: Context<UpdateWhitelist>,
        addresses: Vec<Pubkey>,
    ) -> Result<()> {
        let accounts = &mut *ctx.accounts;
        let removed = engine::remove_from_whitelist(
            &mut accounts.auction,
            &mut accounts.whitelist,
            &accounts.authority.key(),
            &addresses,
        )?;

        msg!("Whitelist: removed={}, size={}", removed, accounts.whitelist.addresses.len());
        emit!(WhitelistUpdated {
            auction: accounts.auction.key(),
            added: 0,
            removed: removed as u32,
            size: accounts.whitelist.addresses.len() as u32,
        });
        Ok(())
    }

    pub fn set_whitelist_enabled(ctx: Context<ConfigureAuction>, enabled: bool) -> Result<()> {
        let auction_key = ctx.accounts.auction.key();
        let authority = ctx.accounts.authority.key();
        engine::set_whitelist_enabled(&mut ctx.accounts.auction, &authority, enabled)?;

        emit!(WhitelistToggled {
            auction: auction_key,
            enabled,
        });
        Ok(())
    }

    /// Only while nothing has been committed.
    pub fn set_pro_rata_enabled(ctx: Context<ConfigureAuction>, enabled: bool) -> Result<()> {
        let auction_key = ctx.accounts.auction.key();
        let authority = ctx.accounts.authority.key();
        engine::set_pro_rata_enabled(&mut ctx.accounts.auction, &authority, enabled)?;

        emit!(ProRataToggled {
            auction: auction_key,
            enabled,
        });
        Ok(())
    }

    /// Price and payment for a bid of `quantity` right now.
    ///
    /// This instruction does not mutate on-chain state. Clients should call it via simulation
    /// and parse logs.
    pub fn quote_bid(ctx: Context<QuoteBid>, quantity: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let quote = engine::quote_bid(&ctx.accounts.auction, quantity, now)?;

        msg!(
            "quote_bid: quantity={}, price={}, payment={}",
            quote.quantity,
            quote.price,
            quote.payment
        );
        Ok(())
    }

    /// Allocation and refund the bidder would receive by claiming now. Read-only.
    pub fn quote_claim(ctx: Context<QuoteClaim>) -> Result<()> {
        let outcome = engine::compute_claim(&ctx.accounts.auction, &ctx.accounts.bidder_state)?;

        msg!(
            "quote_claim: tokens={}, clearing_cost={}, refund={}",
            outcome.tokens_received,
            outcome.clearing_cost,
            outcome.refund
        );
        Ok(())
    }
}

fn spl_leg<'info>(
    mint: &InterfaceAccount<'info, Mint>,
    vault: &InterfaceAccount<'info, TokenAccount>,
    counterparty: AccountInfo<'info>,
) -> SplLeg<'info> {
    SplLeg {
        mint: mint.to_account_info(),
        decimals: mint.decimals,
        vault: vault.to_account_info(),
        vault_amount: vault.amount,
        counterparty,
    }
}

fn fund_token_vault<'info>(
    token_program: &Interface<'info, TokenInterface>,
    mint: &InterfaceAccount<'info, Mint>,
    from: &InterfaceAccount<'info, TokenAccount>,
    to: &InterfaceAccount<'info, TokenAccount>,
    authority: &Signer<'info>,
    amount: u64,
) -> Result<()> {
    token_interface::transfer_checked(
        CpiContext::new(
            token_program.to_account_info(),
            TransferChecked {
                from: from.to_account_info(),
                mint: mint.to_account_info(),
                to: to.to_account_info(),
                authority: authority.to_account_info(),
            },
        ),
        amount,
        mint.decimals,
    )
}

/// First bid on a fresh record: bind it to the auction and the bidder.
fn register_bidder(record: &mut BidderState, auction: Pubkey, bidder: Pubkey, bump: u8) {
    if record.is_new() {
        record.auction = auction;
        record.bidder = bidder;
        record.bump = bump;
    }
}

fn auction_created(auction_key: Pubkey, auction: &AuctionState) -> AuctionCreated {
    AuctionCreated {
        auction: auction_key,
        authority: auction.authority,
        kind: auction.kind,
        token_mint: auction.token_mint,
        payment_asset: auction.payment_asset,
        start_price: auction.start_price,
        floor_price: auction.floor_price,
        total_supply: auction.total_supply,
        start_time: auction.start_time,
        end_time: auction.end_time,
    }
}

#[derive(Accounts)]
pub struct InitializeAuction<'info> {
    #[account(init, payer = authority, space = AuctionState::LEN)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(mint::token_program = token_program)]
    pub token_mint: InterfaceAccount<'info, Mint>,
    #[account(mint::token_program = token_program)]
    pub currency_mint: InterfaceAccount<'info, Mint>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        seeds = [seeds::TOKEN_VAULT, auction.key().as_ref()],
        bump,
        token::mint = token_mint,
        token::authority = vault_authority,
        token::token_program = token_program
    )]
    pub token_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        seeds = [seeds::CURRENCY_VAULT, auction.key().as_ref()],
        bump,
        token::mint = currency_mint,
        token::authority = vault_authority,
        token::token_program = token_program
    )]
    pub currency_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Source of the auctioned supply.
    #[account(
        mut,
        constraint = creator_token.owner == authority.key(),
        constraint = creator_token.mint == token_mint.key()
    )]
    pub creator_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct InitializeAuctionNative<'info> {
    #[account(init, payer = authority, space = AuctionState::LEN)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(mint::token_program = token_program)]
    pub token_mint: InterfaceAccount<'info, Mint>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        init,
        payer = authority,
        seeds = [seeds::TOKEN_VAULT, auction.key().as_ref()],
        bump,
        token::mint = token_mint,
        token::authority = vault_authority,
        token::token_program = token_program
    )]
    pub token_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        space = 8 + NativeVault::INIT_SPACE,
        seeds = [seeds::NATIVE_VAULT, auction.key().as_ref()],
        bump
    )]
    pub native_vault: Account<'info, NativeVault>,

    #[account(
        mut,
        constraint = creator_token.owner == authority.key(),
        constraint = creator_token.mint == token_mint.key()
    )]
    pub creator_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct PlaceBid<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        init_if_needed,
        payer = bidder,
        space = 8 + BidderState::INIT_SPACE,
        seeds = [seeds::BIDDER, auction.key().as_ref(), bidder.key().as_ref()],
        bump
    )]
    pub bidder_state: Box<Account<'info, BidderState>>,
    #[account(mut)]
    pub bidder: Signer<'info>,

    /// Required while the whitelist is enabled.
    #[account(
        seeds = [seeds::WHITELIST, auction.key().as_ref()],
        bump = whitelist.bump
    )]
    pub whitelist: Option<Account<'info, Whitelist>>,

    #[account(
        constraint = auction.payment_asset == PaymentAsset::Token { mint: currency_mint.key() }
            @ DutchAuctionError::PaymentRailMismatch,
        mint::token_program = token_program
    )]
    pub currency_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = bidder_currency.owner == bidder.key(),
        constraint = bidder_currency.mint == currency_mint.key()
    )]
    pub bidder_currency: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::CURRENCY_VAULT, auction.key().as_ref()],
        bump,
        constraint = currency_vault.key() == auction.payment_vault,
        constraint = currency_vault.owner == vault_authority.key()
    )]
    pub currency_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct PlaceBidNative<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        init_if_needed,
        payer = bidder,
        space = 8 + BidderState::INIT_SPACE,
        seeds = [seeds::BIDDER, auction.key().as_ref(), bidder.key().as_ref()],
        bump
    )]
    pub bidder_state: Box<Account<'info, BidderState>>,
    #[account(mut)]
    pub bidder: Signer<'info>,

    /// Required while the whitelist is enabled.
    #[account(
        seeds = [seeds::WHITELIST, auction.key().as_ref()],
        bump = whitelist.bump
    )]
    pub whitelist: Option<Account<'info, Whitelist>>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::NATIVE_VAULT, auction.key().as_ref()],
        bump = native_vault.bump,
        constraint = auction.is_native() @ DutchAuctionError::PaymentRailMismatch
    )]
    pub native_vault: Account<'info, NativeVault>,

    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct FinalizeAuction<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
}

/// Owner-gated changes that touch no vault.
#[derive(Accounts)]
pub struct ConfigureAuction<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct Claim<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        mut,
        seeds = [seeds::BIDDER, auction.key().as_ref(), bidder.key().as_ref()],
        bump = bidder_state.bump
    )]
    pub bidder_state: Box<Account<'info, BidderState>>,
    #[account(mut)]
    pub bidder: Signer<'info>,

    #[account(
        constraint = token_mint.key() == auction.token_mint,
        mint::token_program = token_program
    )]
    pub token_mint: InterfaceAccount<'info, Mint>,
    #[account(
        constraint = auction.payment_asset == PaymentAsset::Token { mint: currency_mint.key() }
            @ DutchAuctionError::PaymentRailMismatch,
        mint::token_program = token_program
    )]
    pub currency_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init_if_needed,
        payer = bidder,
        associated_token::mint = token_mint,
        associated_token::authority = bidder,
        associated_token::token_program = token_program
    )]
    pub bidder_token: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = bidder_currency.owner == bidder.key(),
        constraint = bidder_currency.mint == currency_mint.key()
    )]
    pub bidder_currency: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::TOKEN_VAULT, auction.key().as_ref()],
        bump,
        constraint = token_vault.key() == auction.token_vault,
        constraint = token_vault.owner == vault_authority.key()
    )]
    pub token_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [seeds::CURRENCY_VAULT, auction.key().as_ref()],
        bump,
        constraint = currency_vault.key() == auction.payment_vault,
        constraint = currency_vault.owner == vault_authority.key()
    )]
    pub currency_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct ClaimNative<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        mut,
        seeds = [seeds::BIDDER, auction.key().as_ref(), bidder.key().as_ref()],
        bump = bidder_state.bump
    )]
    pub bidder_state: Box<Account<'info, BidderState>>,
    #[account(mut)]
    pub bidder: Signer<'info>,

    #[account(
        constraint = token_mint.key() == auction.token_mint,
        mint::token_program = token_program
    )]
    pub token_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init_if_needed,
        payer = bidder,
        associated_token::mint = token_mint,
        associated_token::authority = bidder,
        associated_token::token_program = token_program
    )]
    pub bidder_token: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::TOKEN_VAULT, auction.key().as_ref()],
        bump,
        constraint = token_vault.key() == auction.token_vault,
        constraint = token_vault.owner == vault_authority.key()
    )]
    pub token_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [seeds::NATIVE_VAULT, auction.key().as_ref()],
        bump = native_vault.bump,
        constraint = auction.is_native() @ DutchAuctionError::PaymentRailMismatch
    )]
    pub native_vault: Account<'info, NativeVault>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct WithdrawProceeds<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    pub authority: Signer<'info>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::CURRENCY_VAULT, auction.key().as_ref()],
        bump,
        constraint = currency_vault.key() == auction.payment_vault,
        constraint = currency_vault.owner == vault_authority.key()
    )]
    pub currency_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        constraint = auction.payment_asset == PaymentAsset::Token { mint: currency_mint.key() }
            @ DutchAuctionError::PaymentRailMismatch,
        mint::token_program = token_program
    )]
    pub currency_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = authority_currency.mint == currency_mint.key()
    )]
    pub authority_currency: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

#[derive(Accounts)]
pub struct WithdrawProceedsNative<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::NATIVE_VAULT, auction.key().as_ref()],
        bump = native_vault.bump,
        constraint = auction.is_native() @ DutchAuctionError::PaymentRailMismatch
    )]
    pub native_vault: Account<'info, NativeVault>,

    pub system_program: Program<'info, System>,
}

/// Sweeps of the auctioned token vault back to the owner.
#[derive(Accounts)]
pub struct WithdrawTokens<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    pub authority: Signer<'info>,

    /// CHECK: PDA that owns the vault token accounts
    #[account(
        seeds = [seeds::VAULT_AUTHORITY, auction.key().as_ref()],
        bump = auction.vault_authority_bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [seeds::TOKEN_VAULT, auction.key().as_ref()],
        bump,
        constraint = token_vault.key() == auction.token_vault,
        constraint = token_vault.owner == vault_authority.key()
    )]
    pub token_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        constraint = token_mint.key() == auction.token_mint,
        mint::token_program = token_program
    )]
    pub token_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = authority_token.mint == auction.token_mint
    )]
    pub authority_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

impl<'info> WithdrawTokens<'info> {
    fn gateway(&self, auction_key: Pubkey) -> VaultGateway<'info> {
        VaultGateway::new(&self.auction, auction_key, self.vault_authority.to_account_info())
            .with_token_program(self.token_program.to_account_info())
            .with_tokens(spl_leg(
                &self.token_mint,
                &self.token_vault,
                self.authority_token.to_account_info(),
            ))
            .with_checkpoint(self.auction.to_account_info(), None)
    }
}

#[derive(Accounts)]
pub struct CreateWhitelist<'info> {
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        init,
        payer = authority,
        space = 8 + Whitelist::INIT_SPACE,
        seeds = [seeds::WHITELIST, auction.key().as_ref()],
        bump
    )]
    pub whitelist: Account<'info, Whitelist>,
    #[account(mut)]
    pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct UpdateWhitelist<'info> {
    #[account(mut)]
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        mut,
        seeds = [seeds::WHITELIST, auction.key().as_ref()],
        bump = whitelist.bump
    )]
    pub whitelist: Account<'info, Whitelist>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct QuoteBid<'info> {
    pub auction: Box<Account<'info, AuctionState>>,
}

#[derive(Accounts)]
pub struct QuoteClaim<'info> {
    pub auction: Box<Account<'info, AuctionState>>,
    #[account(
        constraint = bidder_state.auction == auction.key()
    )]
    pub bidder_state: Box<Account<'info, BidderState>>,
}
