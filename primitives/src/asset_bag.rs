//! Multi-asset amounts.
//!
//! An [`AssetBag`] is a sparse vector over the asset universe. Entries are kept in the
//! total order of [`AssetKind`], so iteration, SCALE encoding and event payloads are
//! identical on every node regardless of the order in which amounts were inserted.

use crate::{AssetKind, Balance};
use codec::{Decode, DecodeWithMemTracking, Encode};
use scale_info::TypeInfo;
#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::collections::{BTreeMap, btree_map};
#[cfg(feature = "std")]
use std::collections::{BTreeMap, btree_map};

/// Ordered mapping from asset to a non-zero amount.
///
/// Zero entries never survive a public constructor or operation, so two bags holding
/// the same amounts always encode to the same bytes.
#[derive(Clone, Debug, Default, Encode, Eq, PartialEq, TypeInfo)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(from = "BTreeMap<AssetKind, Balance>"))]
pub struct AssetBag(BTreeMap<AssetKind, Balance>);

impl From<BTreeMap<AssetKind, Balance>> for AssetBag {
  fn from(amounts: BTreeMap<AssetKind, Balance>) -> Self {
    Self(amounts).pruned()
  }
}

// Zero entries are dropped on the way in.
impl Decode for AssetBag {
  fn decode<I: codec::Input>(input: &mut I) -> Result<Self, codec::Error> {
    BTreeMap::<AssetKind, Balance>::decode(input).map(Self::from)
  }
}

impl DecodeWithMemTracking for AssetBag {}

impl AssetBag {
  /// The empty bag.
  pub fn new() -> Self {
    Self(BTreeMap::new())
  }

  /// A bag holding a single asset.
  pub fn single(asset: AssetKind, amount: Balance) -> Self {
    Self::from_iter([(asset, amount)])
  }

  /// Amount held of `asset`, zero when absent.
  pub fn amount_of(&self, asset: &AssetKind) -> Balance {
    self.0.get(asset).copied().unwrap_or_default()
  }

  /// True iff no asset has a non-zero amount.
  pub fn is_zero(&self) -> bool {
    self.0.values().all(|amount| *amount == 0)
  }

  /// Number of assets with a non-zero amount.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Assets in canonical order.
  pub fn assets(&self) -> impl Iterator<Item = &AssetKind> {
    self.0.keys()
  }

  /// `(asset, amount)` pairs in canonical order.
  pub fn iter(&self) -> btree_map::Iter<'_, AssetKind, Balance> {
    self.0.iter()
  }

  /// Per-asset sum over the union of both bags. Saturates at `Balance::MAX`.
  pub fn add(&self, other: &Self) -> Self {
    let mut sum = self.0.clone();
    for (asset, amount) in other.iter() {
      let entry = sum.entry(*asset).or_default();
      *entry = entry.saturating_add(*amount);
    }
    Self(sum).pruned()
  }

  /// Per-asset difference, each amount floored at zero.
  pub fn sub_saturating(&self, other: &Self) -> Self {
    let difference = self
      .iter()
      .map(|(asset, amount)| (*asset, amount.saturating_sub(other.amount_of(asset))))
      .collect();
    Self(difference).pruned()
  }

  /// Per-asset minimum. Assets missing from either side contribute nothing.
  pub fn min(&self, other: &Self) -> Self {
    let minimum = self
      .iter()
      .map(|(asset, amount)| (*asset, (*amount).min(other.amount_of(asset))))
      .collect();
    Self(minimum).pruned()
  }

  /// Replaces the amount of every asset present in `other`, keeping the rest.
  pub fn overlay(&self, other: &Self) -> Self {
    let mut merged = self.0.clone();
    for (asset, amount) in other.iter() {
      merged.insert(*asset, *amount);
    }
    Self(merged).pruned()
  }

  /// Every amount multiplied by `factor`, saturating.
  pub fn saturating_mul(&self, factor: u32) -> Self {
    let scaled = self
      .iter()
      .map(|(asset, amount)| (*asset, amount.saturating_mul(Balance::from(factor))))
      .collect();
    Self(scaled).pruned()
  }

  /// True iff `self` holds at least `required` of every asset in `required`.
  pub fn covers(&self, required: &Self) -> bool {
    required
      .iter()
      .all(|(asset, amount)| self.amount_of(asset) >= *amount)
  }

  fn pruned(mut self) -> Self {
    self.0.retain(|_, amount| *amount > 0);
    self
  }
}

impl FromIterator<(AssetKind, Balance)> for AssetBag {
  /// Duplicate assets are summed, zero amounts dropped.
  fn from_iter<I: IntoIterator<Item = (AssetKind, Balance)>>(iter: I) -> Self {
    let mut amounts = BTreeMap::new();
    for (asset, amount) in iter {
      let entry: &mut Balance = amounts.entry(asset).or_default();
      *entry = entry.saturating_add(amount);
    }
    Self(amounts).pruned()
  }
}

impl<'a> IntoIterator for &'a AssetBag {
  type Item = (&'a AssetKind, &'a Balance);
  type IntoIter = btree_map::Iter<'a, AssetKind, Balance>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
