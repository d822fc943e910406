use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token_interface::{self, TransferChecked};

use crate::errors::DutchAuctionError;
use crate::seeds;
use crate::state::{AuctionState, BidderState};

/// Everything the engine needs from the asset rails.
///
/// The engine never knows whether the payment asset is lamports or an SPL token, nor
/// which accounts sit on the other side of a transfer: the counterparty is fixed when
/// the gateway is built for an instruction.
pub trait TokenGateway {
    /// Pull `amount` of the payment asset from the counterparty into the payment vault.
    fn collect_payment(&mut self, amount: u64) -> Result<()>;

    /// Push `amount` of the auctioned asset from the token vault to the counterparty.
    fn send_tokens(&mut self, amount: u64) -> Result<()>;

    /// Push `amount` of the payment asset from the payment vault to the counterparty.
    fn send_payment(&mut self, amount: u64) -> Result<()>;

    /// Auctioned-asset balance held by the token vault.
    fn token_balance(&self) -> Result<u64>;

    /// Persist ledger state before any transfer runs, so that a nested invocation
    /// observes the lock and the records as they stand.
    fn checkpoint(&mut self, auction: &AuctionState, bidder: Option<&BidderState>) -> Result<()>;
}

pub struct SplLeg<'info> {
    pub mint: AccountInfo<'info>,
    pub decimals: u8,
    pub vault: AccountInfo<'info>,
    pub vault_amount: u64,
    pub counterparty: AccountInfo<'info>,
}

pub enum PaymentLeg<'info> {
    Spl(SplLeg<'info>),
    Native {
        vault: AccountInfo<'info>,
        counterparty: AccountInfo<'info>,
        system: AccountInfo<'info>,
    },
}

/// On-chain gateway: SPL `transfer_checked` CPIs signed by the vault authority PDA, and
/// lamport moves for the native vault.
pub struct VaultGateway<'info> {
    auction_key: Pubkey,
    vault_authority_bump: u8,
    vault_authority: AccountInfo<'info>,
    token_program: Option<AccountInfo<'info>>,
    payer: Option<AccountInfo<'info>>,
    tokens: Option<SplLeg<'info>>,
    payment: Option<PaymentLeg<'info>>,
    auction_account: Option<AccountInfo<'info>>,
    bidder_account: Option<AccountInfo<'info>>,
}

impl<'info> VaultGateway<'info> {
    pub fn new(
        auction: &AuctionState,
        auction_key: Pubkey,
        vault_authority: AccountInfo<'info>,
    ) -> Self {
        Self {
            auction_key,
            vault_authority_bump: auction.vault_authority_bump,
            vault_authority,
            token_program: None,
            payer: None,
            tokens: None,
            payment: None,
            auction_account: None,
            bidder_account: None,
        }
    }

    pub fn with_token_program(mut self, token_program: AccountInfo<'info>) -> Self {
        self.token_program = Some(token_program);
        self
    }

    /// Signer authorizing incoming transfers.
    pub fn with_payer(mut self, payer: AccountInfo<'info>) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_tokens(mut self, leg: SplLeg<'info>) -> Self {
        self.tokens = Some(leg);
        self
    }

    pub fn with_payment(mut self, leg: PaymentLeg<'info>) -> Self {
        self.payment = Some(leg);
        self
    }

    pub fn with_checkpoint(
        mut self,
        auction_account: AccountInfo<'info>,
        bidder_account: Option<AccountInfo<'info>>,
    ) -> Self {
        self.auction_account = Some(auction_account);
        self.bidder_account = bidder_account;
        self
    }

    fn token_program(&self) -> Result<&AccountInfo<'info>> {
        self.token_program
            .as_ref()
            .ok_or_else(|| error!(DutchAuctionError::MissingAccount))
    }

    fn payer(&self) -> Result<&AccountInfo<'info>> {
        self.payer
            .as_ref()
            .ok_or_else(|| error!(DutchAuctionError::MissingAccount))
    }

    fn send_spl(&self, leg: &SplLeg<'info>, amount: u64) -> Result<()> {
        let auction_key = self.auction_key;
        let signer_seeds: &[&[u8]] = &[
            seeds::VAULT_AUTHORITY,
            auction_key.as_ref(),
            &[self.vault_authority_bump],
        ];

        token_interface::transfer_checked(
            CpiContext::new_with_signer(
                self.token_program()?.clone(),
                TransferChecked {
                    from: leg.vault.clone(),
                    mint: leg.mint.clone(),
                    to: leg.counterparty.clone(),
                    authority: self.vault_authority.clone(),
                },
                &[signer_seeds],
            ),
            amount,
            leg.decimals,
        )
    }
}

fn write_account<T: AccountSerialize>(info: &AccountInfo, value: &T) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    let mut dst: &mut [u8] = &mut data;
    value.try_serialize(&mut dst)
}

impl<'info> TokenGateway for VaultGateway<'info> {
    fn collect_payment(&mut self, amount: u64) -> Result<()> {
        let payer = self.payer()?.clone();
        match self.payment.as_ref() {
            Some(PaymentLeg::Spl(leg)) => token_interface::transfer_checked(
                CpiContext::new(
                    self.token_program()?.clone(),
                    TransferChecked {
                        from: leg.counterparty.clone(),
                        mint: leg.mint.clone(),
                        to: leg.vault.clone(),
                        authority: payer,
                    },
                ),
                amount,
                leg.decimals,
            ),
            Some(PaymentLeg::Native { vault, system, .. }) => system_program::transfer(
                CpiContext::new(
                    system.clone(),
                    system_program::Transfer {
                        from: payer,
                        to: vault.clone(),
                    },
                ),
                amount,
            ),
            None => err!(DutchAuctionError::MissingAccount),
        }
    }

    fn send_tokens(&mut self, amount: u64) -> Result<()> {
        let leg = self
            .tokens
            .as_ref()
            .ok_or_else(|| error!(DutchAuctionError::MissingAccount))?;
        self.send_spl(leg, amount)?;
        if let Some(leg) = self.tokens.as_mut() {
            leg.vault_amount = leg.vault_amount.saturating_sub(amount);
        }
        Ok(())
    }

    fn send_payment(&mut self, amount: u64) -> Result<()> {
        match self.payment.as_ref() {
            Some(PaymentLeg::Spl(leg)) => self.send_spl(leg, amount),
            Some(PaymentLeg::Native {
                vault,
                counterparty,
                ..
            }) => {
                // Program-owned vault: move lamports directly, keeping it rent-exempt.
                let rent_exempt = Rent::get()?.minimum_balance(vault.data_len());
                let vault_lamports = vault.lamports();
                let available = vault_lamports.saturating_sub(rent_exempt);
                require!(
                    available >= amount,
                    DutchAuctionError::SettlementInvariantViolated
                );

                **vault.try_borrow_mut_lamports()? = vault_lamports
                    .checked_sub(amount)
                    .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
                let counterparty_lamports = counterparty.lamports();
                **counterparty.try_borrow_mut_lamports()? = counterparty_lamports
                    .checked_add(amount)
                    .ok_or_else(|| error!(DutchAuctionError::MathOverflow))?;
                Ok(())
            }
            None => err!(DutchAuctionError::MissingAccount),
        }
    }

    fn token_balance(&self) -> Result<u64> {
        self.tokens
            .as_ref()
            .map(|leg| leg.vault_amount)
            .ok_or_else(|| error!(DutchAuctionError::MissingAccount))
    }

    fn checkpoint(&mut self, auction: &AuctionState, bidder: Option<&BidderState>) -> Result<()> {
        if let Some(info) = self.auction_account.as_ref() {
            write_account(info, auction)?;
        }
        if let (Some(info), Some(bidder)) = (self.bidder_account.as_ref(), bidder) {
            write_account(info, bidder)?;
        }
        Ok(())
    }
}
