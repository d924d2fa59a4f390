//! Ecosystem Constants for pool funding
//!
//! Centralizes the pallet identifiers used to derive holding accounts and the default
//! funding parameters shared by runtime configurations.

/// Balance type alias for consistency across ecosystem
pub type Balance = u128;

/// Identifier of a funded pool.
pub type PoolId = u64;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// Used by `PalletId::into_account_truncating()` to derive the account that holds
/// deposited funding until it is charged or refunded.
pub mod pallet_ids {
  /// Funders pallet ID (holding account for all pool fundings)
  pub const FUNDERS_PALLET_ID: &[u8; 8] = b"py/fundr";
}

/// Default funding parameters.
pub mod params {
  /// A funding must hold at least this many rounds worth of its per-round charge.
  pub const MIN_FUNDING_MULTIPLE: u32 = 5;

  /// Maximum number of distinct assets a single funding may hold.
  pub const MAX_ASSETS_PER_FUNDING: u32 = 8;
}
