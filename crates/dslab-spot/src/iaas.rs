//! Infrastructure provider state.

use serde::{Deserialize, Serialize};

/// Infrastructure provider with a bounded pool of spot VMs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Iaas {
    capacity: u32,
    omega: f64,
}

impl Iaas {
    pub fn new(capacity: u32, omega: f64) -> Self {
        Self { capacity, omega }
    }

    /// Total number of spot VMs shared by all tenants.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }
}
