//! Problem instance parameters.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Parameters shared by the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    /// Time horizon the VMs are paid for.
    #[serde(rename = "T")]
    pub horizon: u32,
    /// Total spot capacity of the provider.
    #[serde(rename = "N")]
    pub capacity: u32,
    /// Number of web services per application evaluated at their worst-case performance.
    pub gamma: u32,
    /// Maximum VM utilization.
    pub rho: f64,
    /// Bid increment.
    pub delta: f64,
    /// Relative worst-case degradation of the service rate.
    pub mu_dev: f64,
    /// Relative worst-case growth of the fixed delay.
    #[serde(rename = "D_dev")]
    pub d_dev: f64,
    /// Price normalization constant, equal to the on-demand VM price.
    pub omega: f64,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            horizon: 1,
            capacity: 1000,
            gamma: 0,
            rho: 1.,
            delta: 0.05,
            mu_dev: 0.,
            d_dev: 0.,
            omega: 1.,
        }
    }
}

impl GlobalParameters {
    pub fn validate(&self) -> GameResult<()> {
        if !(self.rho > 0.) {
            return Err(GameError::Config(format!("rho must be positive, got {}", self.rho)));
        }
        if !(self.delta > 0.) {
            return Err(GameError::Config(format!("delta must be positive, got {}", self.delta)));
        }
        if !(0. ..1.).contains(&self.mu_dev) {
            return Err(GameError::Config(format!("mu_dev must be in [0, 1), got {}", self.mu_dev)));
        }
        if !(self.d_dev >= 0. && self.d_dev.is_finite()) {
            return Err(GameError::Config(format!("D_dev must be non-negative, got {}", self.d_dev)));
        }
        if !(self.omega > 0. && self.omega.is_finite()) {
            return Err(GameError::Config(format!("omega must be positive, got {}", self.omega)));
        }
        Ok(())
    }
}

/// Parameters of a single tenant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaasParameters {
    /// Flat-rate VM price relative to `omega`.
    pub q: f64,
    /// Initial spot bid relative to `omega`.
    pub eta: f64,
    /// Number of flat-rate VMs the tenant may use.
    pub r: u32,
}

impl SaasParameters {
    pub fn validate(&self) -> GameResult<()> {
        for (name, value) in [("q", self.q), ("eta", self.eta)] {
            if !(value >= 0. && value.is_finite()) {
                return Err(GameError::Config(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        Ok(())
    }
}
