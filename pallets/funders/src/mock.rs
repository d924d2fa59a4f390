extern crate alloc;

use crate as pallet_funders;
use crate::{FundingParameters, FundsTransfer, NativeAndAssets, WhitelistEntry};
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl,
  traits::{ConstU32, ConstU128, Get},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult, FixedU128,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  AssetBag, AssetKind,
  ecosystem::{
    pallet_ids::FUNDERS_PALLET_ID,
    params::{MAX_ASSETS_PER_FUNDING, MIN_FUNDING_MULTIPLE},
  },
  well_known::{DOT, USDT},
};
use std::cell::RefCell;
use std::collections::BTreeSet;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const CHARLIE: u64 = 3;
pub const DAVE: u64 = 4;
/// Receives charge payouts
pub const TREASURY: u64 = 99;
pub const ASSET_OWNER: u64 = 100;

pub const INITIAL_BALANCE: u128 = 1_000_000;
pub const MAX_FUNDERS: u32 = 3;
/// Pool created at genesis
pub const POOL: u64 = 0;

pub const NATIVE: AssetKind = AssetKind::Native;
pub const DOT_ASSET: AssetKind = AssetKind::Local(DOT);
pub const USDT_ASSET: AssetKind = AssetKind::Local(USDT);
/// Exists in pallet-assets but is not accepted as funding
pub const UNLISTED_ASSET: AssetKind = AssetKind::Local(999);

thread_local! {
    // Recipients whose incoming transfers fail
    static REJECTED_RECIPIENTS: RefCell<BTreeSet<u64>> = const { RefCell::new(BTreeSet::new()) };
}

pub fn reject_transfers_to(who: u64) {
  REJECTED_RECIPIENTS.with(|r| r.borrow_mut().insert(who));
}

pub fn accept_transfers_to(who: u64) {
  REJECTED_RECIPIENTS.with(|r| r.borrow_mut().remove(&who));
}

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    Funders: pallet_funders,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type ReserveData = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = AssetBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct AssetBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl polkadot_sdk::pallet_assets::BenchmarkHelper<u32, ()> for AssetBenchmarkHelper {
  fn create_asset_id_parameter(id: u32) -> u32 {
    id
  }
  fn create_reserve_id_parameter(_id: u32) {}
}

/// Real balance movements, except towards recipients marked with [`reject_transfers_to`].
pub struct MockTransfer;
impl FundsTransfer<u64> for MockTransfer {
  fn transfer(from: &u64, to: &u64, amounts: &AssetBag) -> DispatchResult {
    if REJECTED_RECIPIENTS.with(|r| r.borrow().contains(to)) {
      return Err(DispatchError::Other("transfer rejected"));
    }
    NativeAndAssets::<Balances, Assets>::transfer(from, to, amounts)
  }
}

/// Native, DOT and USDT are accepted. USDT demands a larger per-round charge.
/// Scores weigh DOT at 5 and USDT at one half of the native token.
pub struct MockFundingParams;
impl FundingParameters for MockFundingParams {
  fn whitelist_entry(asset: &AssetKind) -> Option<WhitelistEntry> {
    match *asset {
      NATIVE => Some(WhitelistEntry {
        min_funding_amount: 10,
        min_funding_amount_per_round: 1,
        coin_weight: FixedU128::from_u32(1),
      }),
      DOT_ASSET => Some(WhitelistEntry {
        min_funding_amount: 10,
        min_funding_amount_per_round: 1,
        coin_weight: FixedU128::from_u32(5),
      }),
      USDT_ASSET => Some(WhitelistEntry {
        min_funding_amount: 10,
        min_funding_amount_per_round: 2,
        coin_weight: FixedU128::from_rational(1, 2),
      }),
      _ => None,
    }
  }

  fn min_funding_multiple() -> u32 {
    MIN_FUNDING_MULTIPLE
  }
}

pub struct PalletIdStub;
impl Get<PalletId> for PalletIdStub {
  fn get() -> PalletId {
    PalletId(*FUNDERS_PALLET_ID)
  }
}

pub struct FundingDenominationStub;
impl Get<AssetKind> for FundingDenominationStub {
  fn get() -> AssetKind {
    NATIVE
  }
}

impl pallet_funders::Config for Test {
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = FundersBenchmarkHelper;
  type Transfer = MockTransfer;
  type PalletId = PalletIdStub;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type FundingParams = MockFundingParams;
  type FundingDenomination = FundingDenominationStub;
  type MaxFunders = ConstU32<{ MAX_FUNDERS }>;
  type MaxAssetsPerFunding = ConstU32<{ MAX_ASSETS_PER_FUNDING }>;
  type WeightInfo = ();
}

#[cfg(feature = "runtime-benchmarks")]
pub struct FundersBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<u64> for FundersBenchmarkHelper {
  fn funding_amounts() -> (AssetBag, AssetBag) {
    (
      [(NATIVE, 1_000), (DOT_ASSET, 1_000)].into_iter().collect(),
      [(NATIVE, 10), (DOT_ASSET, 10)].into_iter().collect(),
    )
  }

  fn ensure_funded(who: &u64, amounts: &AssetBag) -> DispatchResult {
    use polkadot_sdk::frame_support::traits::{Currency, fungibles::Mutate};
    for (asset, amount) in amounts {
      match asset {
        AssetKind::Native => {
          let _ = Balances::deposit_creating(who, *amount);
        }
        AssetKind::Local(id) | AssetKind::Foreign(id) => {
          Assets::mint_into(*id, who, *amount)?;
        }
      }
    }
    Ok(())
  }
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let users = [ALICE, BOB, CHARLIE, DAVE];

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: users.iter().map(|who| (*who, INITIAL_BALANCE)).collect(),
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let asset_ids = [DOT, USDT, 999];
  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: asset_ids
      .iter()
      .map(|id| (*id, ASSET_OWNER, true, 1))
      .collect(),
    metadata: alloc::vec![],
    accounts: asset_ids
      .iter()
      .flat_map(|id| users.iter().map(move |who| (*id, *who, INITIAL_BALANCE)))
      .collect(),
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_funders::GenesisConfig::<Test> {
    pool_ids: alloc::vec![POOL],
    ..Default::default()
  }
  .assimilate_storage(&mut t)
  .unwrap();

  REJECTED_RECIPIENTS.with(|r| r.borrow_mut().clear());

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| System::set_block_number(1));
  ext
}

/// Native balance of `who`
pub fn native_balance(who: u64) -> u128 {
  Balances::free_balance(who)
}

/// pallet-assets balance of `who`
pub fn asset_balance(asset: u32, who: u64) -> u128 {
  Assets::balance(asset, who)
}
