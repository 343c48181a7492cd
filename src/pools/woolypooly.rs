// src/pools/woolypooly.rs
use crate::pools::Pool;

/// WoolyPooly VTC pool
#[derive(Debug, Clone)]
pub struct Woolypooly {
    /// Payout address, also used as the stratum username
    address: String,
}

impl Woolypooly {
    /// Creates the preset for a payout address
    pub fn new(address: impl Into<String>) -> Self {
        Woolypooly {
            address: address.into(),
        }
    }
}

impl Pool for Woolypooly {
    fn id(&self) -> u32 {
        7
    }

    fn name(&self) -> &str {
        "WolyPooly.com"
    }

    fn fee(&self) -> f64 {
        0.90
    }

    fn stratum_url(&self) -> String {
        "stratum+tcp://pool.woolypooly.com:3102".to_string()
    }

    fn username(&self) -> String {
        self.address.clone()
    }

    fn password(&self) -> String {
        "x".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woolypooly_connection() {
        let pool = Woolypooly::new("Vaddr");
        assert_eq!(pool.stratum_url(), "stratum+tcp://pool.woolypooly.com:3102");
        assert_eq!(pool.username(), "Vaddr");
        assert_eq!(pool.password(), "x");
        assert!((pool.fee() - 0.90).abs() < f64::EPSILON);
    }
}
