//! Funding records and per-pool funding state.

use crate::{Config, Error};
use frame::deps::sp_runtime::FixedU128;
use frame::prelude::*;
use primitives::{AssetBag, AssetKind, Balance, PoolId};

/// Funding of a single funder in a single pool.
///
/// Records are never removed: a funder whose `balance` reaches zero stays on chain with
/// its `lifetime_charged` history and simply drops out of the pool's active set.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct Funding<AccountId> {
  pub funder: AccountId,
  pub pool_id: PoolId,
  /// What is left to be charged.
  pub balance: AssetBag,
  /// Deducted from `balance` on every charge round.
  pub charge_per_round: AssetBag,
  /// Everything ever charged. Never decreases.
  pub lifetime_charged: AssetBag,
}

impl<AccountId> Funding<AccountId> {
  pub fn new(funder: AccountId, pool_id: PoolId) -> Self {
    Self {
      funder,
      pool_id,
      balance: AssetBag::new(),
      charge_per_round: AssetBag::new(),
      lifetime_charged: AssetBag::new(),
    }
  }

  pub fn is_active(&self) -> bool {
    !self.balance.is_zero()
  }

  /// Charges one round and returns the amount taken.
  ///
  /// Per asset the charge is `min(charge_per_round, balance)`, so a funder that cannot
  /// afford a full round pays whatever it has left.
  pub fn charge_one_round(&mut self) -> AssetBag {
    let charge = self.charge_per_round.min(&self.balance);
    self.balance = self.balance.sub_saturating(&charge);
    self.lifetime_charged = self.lifetime_charged.add(&charge);
    charge
  }

  /// Empties the balance and returns what it held.
  pub fn take_balance(&mut self) -> AssetBag {
    core::mem::take(&mut self.balance)
  }
}

/// Funding record of a runtime account
pub type FundingOf<T> = Funding<<T as frame_system::Config>::AccountId>;

/// Aggregate funding of a pool.
#[derive(CloneNoBound, Decode, Encode, EqNoBound, PartialEqNoBound, RuntimeDebugNoBound, TypeInfo)]
#[scale_info(skip_type_params(T))]
pub struct FundingState<T: Config> {
  pub pool_id: PoolId,
  /// Funders with a non-zero balance, in activation order.
  pub active_funders: BoundedVec<T::AccountId, T::MaxFunders>,
  /// Sum of the balances of all active funders.
  pub total_balance: AssetBag,
}

impl<T: Config> FundingState<T> {
  pub fn new(pool_id: PoolId) -> Self {
    Self {
      pool_id,
      active_funders: BoundedVec::default(),
      total_balance: AssetBag::new(),
    }
  }

  pub fn is_active(&self, funder: &T::AccountId) -> bool {
    self.active_funders.contains(funder)
  }

  /// Appends `funder` to the active set. Already active funders keep their position.
  pub fn set_active(&mut self, funder: T::AccountId) -> Result<(), Error<T>> {
    if self.is_active(&funder) {
      return Ok(());
    }
    self
      .active_funders
      .try_push(funder)
      .map_err(|_| Error::<T>::TooManyFunders)
  }

  /// Removes `funder` from the active set, preserving the order of the others.
  pub fn set_inactive(&mut self, funder: &T::AccountId) {
    self.active_funders.retain(|active| active != funder);
  }
}

/// Per-asset funding limits, owned by governance.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WhitelistEntry {
  /// Smallest amount of the asset accepted in a single deposit.
  pub min_funding_amount: Balance,
  /// Smallest per-round charge a funder may set for the asset.
  pub min_funding_amount_per_round: Balance,
  /// Value of one unit of the asset when fundings of different assets are compared.
  pub coin_weight: FixedU128,
}

/// Returns the funding holding the least of `primary`.
///
/// Ties go to the earliest funding in `fundings`.
pub fn lowest_funding<'a, AccountId>(
  fundings: &'a [Funding<AccountId>],
  primary: &AssetKind,
) -> Option<&'a Funding<AccountId>> {
  fundings
    .iter()
    .min_by_key(|funding| funding.balance.amount_of(primary))
}
