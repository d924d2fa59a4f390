#![cfg_attr(not(feature = "std"), no_std)]

pub mod asset_bag;
pub mod assets;
pub mod ecosystem;

pub use asset_bag::*;
pub use assets::*;
pub use ecosystem::*;
