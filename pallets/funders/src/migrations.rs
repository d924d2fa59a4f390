//! Storage migrations.

pub mod v1 {
  //! Moves single-asset fundings to multi-asset bags.
  //!
  //! Before version 1 every funding held one amount of the funding denomination. Keys are
  //! unchanged, so values are translated in place.

  use crate::{
    Config, Event, Funding, FundingState, FundingStates, Fundings, FundsTransfer, LOG_TARGET,
    Pallet,
  };
  use alloc::vec::Vec;
  use frame::deps::frame_support::{
    migrations::VersionedMigration, traits::UncheckedOnRuntimeUpgrade,
  };
  use frame::prelude::*;
  use primitives::{AssetBag, AssetKind, Balance, PoolId};

  /// Funding layout of storage version 0.
  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct LegacyFunding<AccountId> {
    pub funder: AccountId,
    pub pool_id: PoolId,
    pub amount: Balance,
    pub amount_per_round: Balance,
    pub total_funded: Balance,
  }

  /// Funding state layout of storage version 0.
  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct LegacyFundingState<AccountId> {
    pub pool_id: PoolId,
    pub active_funders: Vec<AccountId>,
    pub total_amount: Balance,
  }

  pub fn migrate_funding<AccountId>(
    legacy: LegacyFunding<AccountId>,
    denomination: AssetKind,
  ) -> Funding<AccountId> {
    Funding {
      funder: legacy.funder,
      pool_id: legacy.pool_id,
      balance: AssetBag::single(denomination, legacy.amount),
      charge_per_round: AssetBag::single(denomination, legacy.amount_per_round),
      lifetime_charged: AssetBag::single(denomination, legacy.total_funded),
    }
  }

  /// Builds the v1 state and returns the active funders above `MaxFunders`.
  ///
  /// The returned funders are no longer part of the active set but still count towards
  /// `total_balance` until they are refunded.
  pub fn migrate_funding_state<T: Config>(
    legacy: LegacyFundingState<T::AccountId>,
    denomination: AssetKind,
  ) -> (FundingState<T>, Vec<T::AccountId>) {
    let mut active_funders = legacy.active_funders;
    let limit = T::MaxFunders::get() as usize;
    let overflow = if active_funders.len() > limit {
      active_funders.split_off(limit)
    } else {
      Vec::new()
    };
    let state = FundingState {
      pool_id: legacy.pool_id,
      active_funders: BoundedVec::truncate_from(active_funders),
      total_balance: AssetBag::single(denomination, legacy.total_amount),
    };
    (state, overflow)
  }

  /// Refunds funders dropped from the active set of `pool_id` and takes their balances
  /// out of the pool total. Returns the number of refunded funders.
  ///
  /// A failed refund leaves the balance in the funder's record, from where it can still be
  /// withdrawn.
  pub fn refund_overflow<T: Config>(pool_id: PoolId, overflow: Vec<T::AccountId>) -> u64 {
    let Some(mut state) = FundingStates::<T>::get(pool_id) else {
      return 0;
    };
    let holding = Pallet::<T>::account_id();
    let mut refunds: u64 = 0;

    for funder in overflow {
      let Some(mut funding) = Fundings::<T>::get(pool_id, &funder) else {
        continue;
      };
      let refunded = funding.take_balance();
      state.total_balance = state.total_balance.sub_saturating(&refunded);
      if refunded.is_zero() {
        continue;
      }

      if let Err(e) = T::Transfer::transfer(&holding, &funder, &refunded) {
        log::error!(
          target: LOG_TARGET,
          "pool {pool_id}: refund of dropped funder {funder:?} failed: {e:?}"
        );
        continue;
      }
      Fundings::<T>::insert(pool_id, &funder, &funding);
      refunds = refunds.saturating_add(1);
      Pallet::<T>::deposit_event(Event::FunderEvicted {
        funder,
        pool_id,
        refunded,
      });
    }

    log::warn!(
      target: LOG_TARGET,
      "pool {pool_id}: {refunds} funders above the funder limit refunded"
    );
    FundingStates::<T>::insert(pool_id, &state);
    refunds
  }

  pub struct UncheckedMigrateV0ToV1<T>(core::marker::PhantomData<T>);

  impl<T: Config> UncheckedOnRuntimeUpgrade for UncheckedMigrateV0ToV1<T> {
    fn on_runtime_upgrade() -> Weight {
      let denomination = T::FundingDenomination::get();
      let mut translated: u64 = 0;
      let mut overflows = Vec::new();

      Fundings::<T>::translate::<LegacyFunding<T::AccountId>, _>(|_, _, legacy| {
        translated = translated.saturating_add(1);
        Some(migrate_funding(legacy, denomination))
      });
      FundingStates::<T>::translate::<LegacyFundingState<T::AccountId>, _>(|_, legacy| {
        translated = translated.saturating_add(1);
        let (state, overflow) = migrate_funding_state::<T>(legacy, denomination);
        if !overflow.is_empty() {
          overflows.push((state.pool_id, overflow));
        }
        Some(state)
      });

      // Every refund touches the funding record and both transfer sides.
      let mut refunds: u64 = 0;
      for (pool_id, overflow) in overflows {
        refunds = refunds.saturating_add(refund_overflow::<T>(pool_id, overflow));
      }

      log::info!(target: LOG_TARGET, "migrated {translated} funding entries to v1");
      T::DbWeight::get().reads_writes(
        translated.saturating_add(refunds.saturating_mul(3)),
        translated.saturating_add(refunds.saturating_mul(3)),
      )
    }
  }

  /// Runs [`UncheckedMigrateV0ToV1`] only while the on-chain version is 0.
  pub type MigrateV0ToV1<T> = VersionedMigration<
    0,
    1,
    UncheckedMigrateV0ToV1<T>,
    Pallet<T>,
    <T as frame_system::Config>::DbWeight,
  >;
}
