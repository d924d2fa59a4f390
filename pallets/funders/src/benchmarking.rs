use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;

const POOL: PoolId = 7;

/// Fills `POOL` with `n` funders, each depositing the helper's funding amounts.
fn fill_pool<T: Config>(n: u32) -> Result<(), BenchmarkError> {
  let (amounts, charge_per_round) = T::BenchmarkHelper::funding_amounts();
  for i in 0..n {
    let funder: T::AccountId = account("funder", i, 0);
    T::BenchmarkHelper::ensure_funded(&funder, &amounts)?;
    Pallet::<T>::fund_pool(
      RawOrigin::Signed(funder).into(),
      POOL,
      amounts.clone(),
      charge_per_round.clone(),
    )?;
  }
  Ok(())
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn create_funding_state() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, POOL);

    assert!(FundingStates::<T>::contains_key(POOL));
    Ok(())
  }

  // Full pool: the caller outbids and evicts the lowest funder.
  #[benchmark]
  fn fund_pool() -> Result<(), BenchmarkError> {
    Pallet::<T>::do_create_funding_state(POOL)?;
    fill_pool::<T>(T::MaxFunders::get())?;

    let caller: T::AccountId = whitelisted_caller();
    let (amounts, charge_per_round) = T::BenchmarkHelper::funding_amounts();
    let deposit = amounts.saturating_mul(2);
    T::BenchmarkHelper::ensure_funded(&caller, &deposit)?;

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), POOL, deposit, charge_per_round);

    let state = FundingStates::<T>::get(POOL).ok_or(BenchmarkError::Weightless)?;
    assert!(state.is_active(&caller));
    Ok(())
  }

  #[benchmark]
  fn withdraw_funding() -> Result<(), BenchmarkError> {
    Pallet::<T>::do_create_funding_state(POOL)?;
    let caller: T::AccountId = whitelisted_caller();
    let (amounts, charge_per_round) = T::BenchmarkHelper::funding_amounts();
    T::BenchmarkHelper::ensure_funded(&caller, &amounts)?;
    Pallet::<T>::fund_pool(
      RawOrigin::Signed(caller.clone()).into(),
      POOL,
      amounts.clone(),
      charge_per_round,
    )?;

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), POOL, amounts);

    let state = FundingStates::<T>::get(POOL).ok_or(BenchmarkError::Weightless)?;
    assert!(!state.is_active(&caller));
    Ok(())
  }

  #[benchmark]
  fn force_defund_pool(n: Linear<1, { T::MaxFunders::get() }>) -> Result<(), BenchmarkError> {
    Pallet::<T>::do_create_funding_state(POOL)?;
    fill_pool::<T>(n)?;
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, POOL);

    let state = FundingStates::<T>::get(POOL).ok_or(BenchmarkError::Weightless)?;
    assert!(state.active_funders.is_empty());
    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
