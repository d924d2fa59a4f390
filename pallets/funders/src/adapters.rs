//! Transfer service for funding movements.
//!
//! The pallet never touches balances directly. Deposits, payouts and refunds all go
//! through [`FundsTransfer`], so a runtime can route assets to whatever ledger it uses.

use core::marker::PhantomData;
use frame::deps::frame_support::{
  storage::with_storage_layer,
  traits::{
    fungible::Mutate as NativeMutate, fungibles::Mutate as FungiblesMutate,
    tokens::Preservation,
  },
};
use frame::prelude::*;
use primitives::{AssetBag, AssetKind, Balance};

/// Moves multi-asset amounts between accounts.
pub trait FundsTransfer<AccountId> {
  /// Moves every asset in `amounts` from `from` to `to`.
  ///
  /// Either all assets move or none do.
  fn transfer(from: &AccountId, to: &AccountId, amounts: &AssetBag) -> DispatchResult;
}

/// Routes `AssetKind::Native` to a `fungible` ledger and every other asset to a
/// `fungibles` ledger keyed by the asset id.
pub struct NativeAndAssets<Currency, Assets>(PhantomData<(Currency, Assets)>);

impl<AccountId, Currency, Assets> FundsTransfer<AccountId> for NativeAndAssets<Currency, Assets>
where
  AccountId: Eq,
  Currency: NativeMutate<AccountId, Balance = Balance>,
  Assets: FungiblesMutate<AccountId, AssetId = u32, Balance = Balance>,
{
  fn transfer(from: &AccountId, to: &AccountId, amounts: &AssetBag) -> DispatchResult {
    with_storage_layer(|| {
      for (asset, amount) in amounts {
        match asset {
          AssetKind::Native => {
            Currency::transfer(from, to, *amount, Preservation::Expendable)?;
          }
          AssetKind::Local(id) | AssetKind::Foreign(id) => {
            Assets::transfer(*id, from, to, *amount, Preservation::Expendable)?;
          }
        }
      }
      Ok(())
    })
  }
}
