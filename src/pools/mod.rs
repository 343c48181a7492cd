// src/pools/mod.rs
//! Known mining pools
//!
//! Presets that supply stratum connection details for a payout address,
//! so the driver config only needs a pool name and an address.

/// WoolyPooly preset
pub mod woolypooly;

pub use woolypooly::Woolypooly;

use crate::miner::BinaryArguments;
use crate::utils::error::MinerError;

/// Connection details and metadata of a mining pool
pub trait Pool: Send + Sync {
    /// Stable numeric identifier
    fn id(&self) -> u32;

    /// Display name
    fn name(&self) -> &str;

    /// Pool fee in percent
    fn fee(&self) -> f64;

    /// Stratum endpoint
    fn stratum_url(&self) -> String;

    /// Stratum username
    fn username(&self) -> String;

    /// Stratum password
    fn password(&self) -> String;

    /// Miner arguments for mining to this pool
    fn binary_arguments(&self, enable_integrated: bool) -> BinaryArguments {
        BinaryArguments {
            stratum_url: self.stratum_url(),
            stratum_username: self.username(),
            stratum_password: self.password(),
            enable_integrated,
        }
    }
}

/// Looks up a pool preset by name (case-insensitive)
///
/// # Errors
/// `InputError` if no preset has that name
pub fn pool_by_name(name: &str, address: &str) -> Result<Box<dyn Pool>, MinerError> {
    match name.to_lowercase().as_str() {
        "woolypooly" | "wolypooly" => Ok(Box::new(Woolypooly::new(address))),
        _ => Err(MinerError::InputError(format!("Unknown pool: {}", name))),
    }
}
