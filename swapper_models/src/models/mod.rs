pub mod account;
pub mod amount;
pub mod asset;

pub use account::AccountId;
pub use amount::BaseUnits;
pub use asset::{Asset, AssetId};
