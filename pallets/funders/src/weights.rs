#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn create_funding_state() -> Weight;
  fn fund_pool() -> Weight;
  fn withdraw_funding() -> Weight;
  fn force_defund_pool(n: u32) -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
  fn create_funding_state() -> Weight {
    Weight::from_parts(10_000_000, 1500)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  // Worst case evicts the lowest funder of a full pool before admitting the caller.
  fn fund_pool() -> Weight {
    let active_reads = u64::from(T::MaxFunders::get());
    Weight::from_parts(45_000_000, 4000)
      .saturating_add(T::DbWeight::get().reads(active_reads.saturating_add(2)))
      .saturating_add(T::DbWeight::get().writes(7))
  }

  fn withdraw_funding() -> Weight {
    Weight::from_parts(30_000_000, 3000)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn force_defund_pool(n: u32) -> Weight {
    Weight::from_parts(15_000_000, 1500)
      .saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().reads(u64::from(n)))
      .saturating_add(T::DbWeight::get().writes(1))
      .saturating_add(T::DbWeight::get().writes(u64::from(n).saturating_mul(3)))
  }
}

impl WeightInfo for () {
  fn create_funding_state() -> Weight {
    Weight::from_parts(10_000_000, 1500)
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().writes(1))
  }

  fn fund_pool() -> Weight {
    Weight::from_parts(45_000_000, 4000)
      .saturating_add(RocksDbWeight::get().reads(5))
      .saturating_add(RocksDbWeight::get().writes(7))
  }

  fn withdraw_funding() -> Weight {
    Weight::from_parts(30_000_000, 3000)
      .saturating_add(RocksDbWeight::get().reads(2))
      .saturating_add(RocksDbWeight::get().writes(4))
  }

  fn force_defund_pool(n: u32) -> Weight {
    Weight::from_parts(15_000_000, 1500)
      .saturating_add(Weight::from_parts(25_000_000, 2600).saturating_mul(n.into()))
      .saturating_add(RocksDbWeight::get().reads(1))
      .saturating_add(RocksDbWeight::get().reads(u64::from(n)))
      .saturating_add(RocksDbWeight::get().writes(1))
      .saturating_add(RocksDbWeight::get().writes(u64::from(n).saturating_mul(3)))
  }
}
