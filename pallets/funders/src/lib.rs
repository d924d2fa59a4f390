//! Funders Pallet
//!
//! Multi-asset funding accounting for data-collection pools.
//!
//! Funders deposit assets into a pool together with a per-round charge. Every charge round
//! deducts that amount (or whatever is left) from each active funder, accumulates the
//! deductions into a single payout and drops funders whose balance runs out. Defunding a
//! pool refunds every remaining balance. Deposited assets sit in the pallet's holding
//! account until they are charged or refunded.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
pub mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod adapters;
pub use adapters::{FundsTransfer, NativeAndAssets};

pub mod migrations;

pub mod types;
pub use types::*;

pub mod weights;
pub use weights::WeightInfo;

use frame::deps::sp_runtime::{DispatchError, DispatchResult, FixedU128};
use primitives::{AssetBag, AssetKind, PoolId};

const LOG_TARGET: &str = "runtime::funders";

/// Governance-owned funding parameters.
pub trait FundingParameters {
  /// Limits for `asset`, `None` when the asset is not accepted as funding.
  fn whitelist_entry(asset: &AssetKind) -> Option<WhitelistEntry>;

  /// Number of rounds a funding must cover at its per-round charge.
  fn min_funding_multiple() -> u32;

  /// Weight of `asset` in a funding's score. Zero for assets that are not accepted.
  fn coin_weight(asset: &AssetKind) -> FixedU128 {
    Self::whitelist_entry(asset)
      .map(|entry| entry.coin_weight)
      .unwrap_or_default()
  }
}

/// Funding lifecycle as seen by the pallet that owns the pools.
pub trait PoolFunding<AccountId> {
  /// Creates an empty funding state for a new pool.
  fn create_funding_state(pool_id: PoolId) -> DispatchResult;

  /// Runs one charge round and returns the payout, which stays in the holding account.
  fn charge_pool(pool_id: PoolId) -> Result<AssetBag, DispatchError>;

  /// Runs one charge round and moves the payout to `beneficiary`.
  fn charge_pool_into(pool_id: PoolId, beneficiary: &AccountId) -> Result<AssetBag, DispatchError>;

  /// Refunds every active funder of the pool.
  fn defund_pool(pool_id: PoolId) -> DispatchResult;

  /// Account holding all deposited funding.
  fn holding_account() -> AccountId;
}

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// A deposit and per-round charge accepted by the runtime's funding parameters.
  fn funding_amounts() -> (AssetBag, AssetBag);

  /// Ensures `who` owns at least `amounts`.
  fn ensure_funded(who: &AccountId, amounts: &AssetBag) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::{
    Funding, FundingOf, FundingParameters, FundingState, FundsTransfer, LOG_TARGET, PoolFunding,
    WeightInfo,
  };
  use alloc::vec::Vec;
  use frame::deps::{
    frame_support::{PalletId, storage::with_storage_layer},
    sp_runtime::{FixedPointNumber, traits::AccountIdConversion},
  };
  use frame::prelude::*;
  use primitives::{AssetBag, AssetKind, Balance, PoolId};

  pub const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

  #[pallet::pallet]
  #[pallet::storage_version(STORAGE_VERSION)]
  #[pallet::without_storage_info]
  pub struct Pallet<T>(_);

  /// Configuration trait for the funders pallet
  #[pallet::config]
  pub trait Config: frame_system::Config<RuntimeEvent: From<Event<Self>>> {
    /// Moves funding between funders, the holding account and payout beneficiaries
    type Transfer: FundsTransfer<Self::AccountId>;

    /// Derives the holding account
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Creates funding states and force-defunds pools
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Asset whitelist and minimum funding multiple
    type FundingParams: FundingParameters;

    /// Asset compared when choosing which funder to evict
    #[pallet::constant]
    type FundingDenomination: Get<AssetKind>;

    /// Maximum number of active funders per pool
    #[pallet::constant]
    type MaxFunders: Get<u32>;

    /// Maximum number of distinct assets in a funding balance or per-round charge
    #[pallet::constant]
    type MaxAssetsPerFunding: Get<u32>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  /// Funding state of every pool
  #[pallet::storage]
  #[pallet::getter(fn funding_state)]
  pub type FundingStates<T: Config> = StorageMap<_, Twox64Concat, PoolId, FundingState<T>>;

  /// Funding records by pool and funder. Records outlive their balance.
  #[pallet::storage]
  pub type Fundings<T: Config> =
    StorageDoubleMap<_, Twox64Concat, PoolId, Blake2_128Concat, T::AccountId, FundingOf<T>>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// An empty funding state was created
    FundingStateCreated { pool_id: PoolId },
    /// A funder deposited into a pool
    PoolFunded {
      funder: T::AccountId,
      pool_id: PoolId,
      amounts: AssetBag,
      charge_per_round: AssetBag,
    },
    /// A funder took back part of its balance
    FundsWithdrawn {
      funder: T::AccountId,
      pool_id: PoolId,
      amounts: AssetBag,
    },
    /// The lowest funder was refunded to make room for a new one
    FunderEvicted {
      funder: T::AccountId,
      pool_id: PoolId,
      refunded: AssetBag,
    },
    /// The last active funder ran out during a charge round
    PoolOutOfFunds { pool_id: PoolId },
    /// Every active funder of the pool was refunded
    PoolDefunded { pool_id: PoolId, refunded: AssetBag },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// No funding state exists for the pool
    FundingStateNotFound,
    /// The pool already has a funding state
    FundingStateAlreadyExists,
    /// The caller has no funding in the pool
    FundingNotFound,
    /// Lowest-funding selection over an empty set
    NoFundingsToCompare,
    /// Nothing to deposit or withdraw
    ZeroAmount,
    /// Funding holds more distinct assets than allowed
    TooManyAssets,
    /// Asset is not accepted as funding
    AssetNotWhitelisted,
    /// Deposit is below the asset's minimum funding amount
    FundingAmountTooLow,
    /// Per-round charge is below the asset's minimum
    ChargePerRoundTooLow,
    /// A funded asset has no per-round charge
    MissingChargePerRound,
    /// Balance does not cover the minimum number of rounds
    MinFundingMultipleNotReached,
    /// Active funder limit reached
    TooManyFunders,
    /// Pool is full and the funding does not exceed the lowest active one
    FundingTooLowToReplace,
  }

  #[pallet::hooks]
  impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
    #[cfg(feature = "try-runtime")]
    fn try_state(_n: BlockNumberFor<T>) -> Result<(), frame::deps::sp_runtime::TryRuntimeError> {
      Self::do_try_state()
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create an empty funding state for `pool_id`.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_funding_state())]
    pub fn create_funding_state(origin: OriginFor<T>, pool_id: PoolId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::do_create_funding_state(pool_id)
    }

    /// Deposit `amounts` into `pool_id` and set the per-round charge for the assets in
    /// `charge_per_round`. Per-round entries for other assets are kept.
    ///
    /// When the pool is full, the active funding holding the least of the funding
    /// denomination is refunded and replaced, provided the new funding holds more.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::fund_pool())]
    pub fn fund_pool(
      origin: OriginFor<T>,
      pool_id: PoolId,
      amounts: AssetBag,
      charge_per_round: AssetBag,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut state =
        FundingStates::<T>::get(pool_id).ok_or(Error::<T>::FundingStateNotFound)?;
      ensure!(!amounts.is_zero(), Error::<T>::ZeroAmount);

      let mut funding =
        Fundings::<T>::get(pool_id, &who).unwrap_or_else(|| Funding::new(who.clone(), pool_id));
      funding.balance = funding.balance.add(&amounts);
      funding.charge_per_round = funding.charge_per_round.overlay(&charge_per_round);
      Self::ensure_valid_funding(&funding, &amounts)?;

      if !state.is_active(&who) {
        if state.active_funders.len() as u32 >= T::MaxFunders::get() {
          Self::evict_lowest_funding(&mut state, &funding)?;
        }
        state.set_active(who.clone())?;
      }

      T::Transfer::transfer(&who, &Self::account_id(), &amounts)?;
      state.total_balance = state.total_balance.add(&amounts);

      Fundings::<T>::insert(pool_id, &who, &funding);
      FundingStates::<T>::insert(pool_id, &state);

      Self::deposit_event(Event::PoolFunded {
        funder: who,
        pool_id,
        amounts,
        charge_per_round: funding.charge_per_round,
      });
      Ok(())
    }

    /// Withdraw up to `amounts` from the caller's remaining balance in `pool_id`.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::withdraw_funding())]
    pub fn withdraw_funding(
      origin: OriginFor<T>,
      pool_id: PoolId,
      amounts: AssetBag,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let mut state =
        FundingStates::<T>::get(pool_id).ok_or(Error::<T>::FundingStateNotFound)?;
      let mut funding = Fundings::<T>::get(pool_id, &who).ok_or(Error::<T>::FundingNotFound)?;

      let withdrawn = funding.balance.min(&amounts);
      ensure!(!withdrawn.is_zero(), Error::<T>::ZeroAmount);

      T::Transfer::transfer(&Self::account_id(), &who, &withdrawn)?;
      funding.balance = funding.balance.sub_saturating(&withdrawn);
      state.total_balance = state.total_balance.sub_saturating(&withdrawn);
      if !funding.is_active() {
        state.set_inactive(&who);
      }

      Fundings::<T>::insert(pool_id, &who, &funding);
      FundingStates::<T>::insert(pool_id, &state);

      Self::deposit_event(Event::FundsWithdrawn {
        funder: who,
        pool_id,
        amounts: withdrawn,
      });
      Ok(())
    }

    /// Refund every active funder of `pool_id`.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::force_defund_pool(T::MaxFunders::get()))]
    pub fn force_defund_pool(origin: OriginFor<T>, pool_id: PoolId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::defund_pool(pool_id)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Holding account for all deposited funding
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Funding record of `funder` in `pool_id`
    pub fn funding(funder: &T::AccountId, pool_id: PoolId) -> Option<FundingOf<T>> {
      Fundings::<T>::get(pool_id, funder)
    }

    /// Every funding record of `pool_id`, active or not, ordered by funder
    pub fn fundings_of_pool(pool_id: PoolId) -> Vec<FundingOf<T>> {
      let mut fundings: Vec<_> = Fundings::<T>::iter_prefix_values(pool_id).collect();
      fundings.sort_by(|a, b| a.funder.cmp(&b.funder));
      fundings
    }

    /// Funding records of the active funders, in activation order
    pub fn active_fundings(state: &FundingState<T>) -> Vec<FundingOf<T>> {
      state
        .active_funders
        .iter()
        .filter_map(|funder| Fundings::<T>::get(state.pool_id, funder))
        .collect()
    }

    pub fn do_create_funding_state(pool_id: PoolId) -> DispatchResult {
      ensure!(
        !FundingStates::<T>::contains_key(pool_id),
        Error::<T>::FundingStateAlreadyExists
      );
      FundingStates::<T>::insert(pool_id, FundingState::<T>::new(pool_id));
      Self::deposit_event(Event::FundingStateCreated { pool_id });
      Ok(())
    }

    /// Charges every active funder of `pool_id` for one round.
    ///
    /// Returns the per-asset sum of all charges. Funders whose balance reaches zero are
    /// removed from the active set. The payout stays in the holding account.
    pub fn charge_pool(pool_id: PoolId) -> Result<AssetBag, DispatchError> {
      let mut state =
        FundingStates::<T>::get(pool_id).ok_or(Error::<T>::FundingStateNotFound)?;
      if state.active_funders.is_empty() {
        return Ok(AssetBag::new());
      }

      let mut payout = AssetBag::new();
      for mut funding in Self::active_fundings(&state) {
        let charge = funding.charge_one_round();
        payout = payout.add(&charge);
        state.total_balance = state.total_balance.sub_saturating(&charge);
        if !funding.is_active() {
          log::debug!(
            target: LOG_TARGET,
            "pool {pool_id}: funder {:?} ran out of funds",
            funding.funder
          );
          state.set_inactive(&funding.funder);
        }
        Fundings::<T>::insert(pool_id, &funding.funder, &funding);
      }
      FundingStates::<T>::insert(pool_id, &state);

      log::debug!(target: LOG_TARGET, "pool {pool_id}: charged {payout:?}");
      if state.active_funders.is_empty() {
        log::info!(target: LOG_TARGET, "pool {pool_id}: out of funds");
        Self::deposit_event(Event::PoolOutOfFunds { pool_id });
      }
      Ok(payout)
    }

    /// Charges one round and transfers the payout to `beneficiary`.
    pub fn charge_pool_into(
      pool_id: PoolId,
      beneficiary: &T::AccountId,
    ) -> Result<AssetBag, DispatchError> {
      with_storage_layer(|| {
        let payout = Self::charge_pool(pool_id)?;
        if !payout.is_zero() {
          T::Transfer::transfer(&Self::account_id(), beneficiary, &payout)?;
        }
        Ok(payout)
      })
    }

    /// Refunds the remaining balance of every active funder of `pool_id`.
    ///
    /// A failed transfer aborts the whole defund and leaves storage untouched.
    pub fn defund_pool(pool_id: PoolId) -> DispatchResult {
      with_storage_layer(|| Self::do_defund_pool(pool_id)).inspect_err(|e| {
        log::warn!(target: LOG_TARGET, "pool {pool_id}: defund failed: {e:?}");
      })
    }

    fn do_defund_pool(pool_id: PoolId) -> DispatchResult {
      let mut state =
        FundingStates::<T>::get(pool_id).ok_or(Error::<T>::FundingStateNotFound)?;
      if state.active_funders.is_empty() {
        return Ok(());
      }

      let holding = Self::account_id();
      let mut refunded = AssetBag::new();
      for mut funding in Self::active_fundings(&state) {
        let amounts = funding.take_balance();
        T::Transfer::transfer(&holding, &funding.funder, &amounts)?;
        refunded = refunded.add(&amounts);
        Fundings::<T>::insert(pool_id, &funding.funder, &funding);
      }

      state.active_funders = BoundedVec::default();
      state.total_balance = AssetBag::new();
      FundingStates::<T>::insert(pool_id, &state);

      log::info!(target: LOG_TARGET, "pool {pool_id}: defunded {refunded:?}");
      Self::deposit_event(Event::PoolDefunded { pool_id, refunded });
      Ok(())
    }

    /// Value of a funding's balance across all of its assets, weighted per asset.
    pub fn funding_score(funding: &FundingOf<T>) -> Balance {
      funding.balance.iter().fold(0, |score: Balance, (asset, amount)| {
        score.saturating_add(T::FundingParams::coin_weight(asset).saturating_mul_int(*amount))
      })
    }

    /// Funding holding the least of the funding denomination. Ties go to the earliest.
    pub fn lowest_funding(fundings: &[FundingOf<T>]) -> Result<&FundingOf<T>, DispatchError> {
      crate::types::lowest_funding(fundings, &T::FundingDenomination::get())
        .ok_or_else(|| Error::<T>::NoFundingsToCompare.into())
    }

    fn ensure_valid_funding(funding: &FundingOf<T>, deposit: &AssetBag) -> DispatchResult {
      let max_assets = T::MaxAssetsPerFunding::get() as usize;
      ensure!(
        funding.balance.len() <= max_assets && funding.charge_per_round.len() <= max_assets,
        Error::<T>::TooManyAssets
      );

      for (asset, amount) in deposit {
        let entry =
          T::FundingParams::whitelist_entry(asset).ok_or(Error::<T>::AssetNotWhitelisted)?;
        ensure!(*amount >= entry.min_funding_amount, Error::<T>::FundingAmountTooLow);
      }
      for (asset, amount) in &funding.charge_per_round {
        let entry =
          T::FundingParams::whitelist_entry(asset).ok_or(Error::<T>::AssetNotWhitelisted)?;
        ensure!(
          *amount >= entry.min_funding_amount_per_round,
          Error::<T>::ChargePerRoundTooLow
        );
      }

      // Every held asset must deplete eventually.
      let charged = funding.charge_per_round.min(&funding.balance);
      ensure!(
        charged.len() == funding.balance.len(),
        Error::<T>::MissingChargePerRound
      );

      let held_per_round: AssetBag = funding
        .charge_per_round
        .iter()
        .filter(|(asset, _)| funding.balance.amount_of(asset) > 0)
        .map(|(asset, amount)| (*asset, *amount))
        .collect();
      let required = held_per_round.saturating_mul(T::FundingParams::min_funding_multiple());
      ensure!(
        funding.balance.covers(&required),
        Error::<T>::MinFundingMultipleNotReached
      );
      Ok(())
    }

    fn evict_lowest_funding(
      state: &mut FundingState<T>,
      newcomer: &FundingOf<T>,
    ) -> DispatchResult {
      let active = Self::active_fundings(state);
      let lowest = Self::lowest_funding(&active)?;
      let denomination = T::FundingDenomination::get();
      ensure!(
        newcomer.balance.amount_of(&denomination) > lowest.balance.amount_of(&denomination),
        Error::<T>::FundingTooLowToReplace
      );

      let mut evicted = lowest.clone();
      let refunded = evicted.take_balance();
      T::Transfer::transfer(&Self::account_id(), &evicted.funder, &refunded)?;
      state.total_balance = state.total_balance.sub_saturating(&refunded);
      state.set_inactive(&evicted.funder);
      Fundings::<T>::insert(state.pool_id, &evicted.funder, &evicted);

      log::info!(
        target: LOG_TARGET,
        "pool {}: evicted funder {:?} with score {}",
        state.pool_id,
        evicted.funder,
        Self::funding_score(lowest)
      );
      Self::deposit_event(Event::FunderEvicted {
        funder: evicted.funder,
        pool_id: state.pool_id,
        refunded,
      });
      Ok(())
    }

    /// Checks the bookkeeping invariants of every pool.
    #[cfg(any(feature = "try-runtime", test))]
    pub fn do_try_state() -> Result<(), DispatchError> {
      use alloc::collections::BTreeSet;

      for (pool_id, state) in FundingStates::<T>::iter() {
        ensure!(state.pool_id == pool_id, "funding state stored under foreign pool id");

        let mut active = BTreeSet::new();
        let mut total = AssetBag::new();
        for funder in state.active_funders.iter() {
          ensure!(active.insert(funder.clone()), "duplicate active funder");
          let funding =
            Fundings::<T>::get(pool_id, funder).ok_or("active funder without funding")?;
          ensure!(funding.is_active(), "active funder with empty balance");
          total = total.add(&funding.balance);
        }
        ensure!(
          total == state.total_balance,
          "total balance differs from active fundings"
        );

        for (funder, funding) in Fundings::<T>::iter_prefix(pool_id) {
          ensure!(funding.funder == funder, "funding stored under foreign funder");
          ensure!(
            active.contains(&funder) || !funding.is_active(),
            "inactive funder holds a balance"
          );
        }
      }
      Ok(())
    }
  }

  impl<T: Config> PoolFunding<T::AccountId> for Pallet<T> {
    fn create_funding_state(pool_id: PoolId) -> DispatchResult {
      Self::do_create_funding_state(pool_id)
    }

    fn charge_pool(pool_id: PoolId) -> Result<AssetBag, DispatchError> {
      Pallet::<T>::charge_pool(pool_id)
    }

    fn charge_pool_into(
      pool_id: PoolId,
      beneficiary: &T::AccountId,
    ) -> Result<AssetBag, DispatchError> {
      Pallet::<T>::charge_pool_into(pool_id, beneficiary)
    }

    fn defund_pool(pool_id: PoolId) -> DispatchResult {
      Pallet::<T>::defund_pool(pool_id)
    }

    fn holding_account() -> T::AccountId {
      Self::account_id()
    }
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    /// Pools that start with an empty funding state
    pub pool_ids: Vec<PoolId>,
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      // Holding account survives zero native balance via provider reference
      frame_system::Pallet::<T>::inc_providers(&Pallet::<T>::account_id());
      for pool_id in &self.pool_ids {
        FundingStates::<T>::insert(*pool_id, FundingState::<T>::new(*pool_id));
      }
    }
  }
}
