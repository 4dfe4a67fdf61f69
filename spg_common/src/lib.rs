//! Value types shared by the shop payment gateway crates.
mod helpers;
mod money;
pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Money, MoneyConversionError, CENTS_PER_UNIT};
pub use secret::Secret;
