//! Spot market clearing.

use std::io::Write;

use log::trace;

use crate::iaas::Iaas;
use crate::saas_problem::SaasProblem;

/// Allocates the provider's spot VMs to tenants.
#[derive(Debug, Clone)]
pub struct IaasProblem {
    iaas: Iaas,
}

impl IaasProblem {
    pub fn new(iaas: Iaas) -> Self {
        Self { iaas }
    }

    pub fn iaas(&self) -> &Iaas {
        &self.iaas
    }

    /// Clears one round of the spot market.
    ///
    /// Tenants are served in descending order of their bids, tenants with equal bids in the order they were added.
    /// Each application of a served tenant gets `min(desired_on_spot, remaining capacity)` VMs, so once the capacity
    /// is exhausted all remaining tenants get nothing. Returns the number of granted VMs.
    pub fn solve_greedy(&self, tenants: &mut [SaasProblem]) -> f64 {
        let mut order: Vec<usize> = (0..tenants.len()).collect();
        order.sort_by(|&a, &b| tenants[b].cmp_by_bid(&tenants[a]));

        let capacity = self.iaas.capacity() as f64;
        let mut remaining = capacity;
        for idx in order {
            let tenant = &mut tenants[idx];
            let app_ids: Vec<_> = tenant.saas().app_ids().collect();
            for app_id in app_ids {
                let desired = tenant.saas().desired_on_spot(app_id);
                let given = desired.min(remaining).max(0.);
                tenant.saas_mut().set_given_on_spot(app_id, given);
                remaining -= given;
            }
            trace!(
                "tenant {} (bid {:.3}) served, {} spot VMs left",
                tenant.id(),
                tenant.cost_threshold(),
                remaining
            );
        }
        capacity - remaining
    }

    pub fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "IAAS")?;
        writeln!(out, "N = {}", self.iaas.capacity())?;
        writeln!(out, "omega = {}", self.iaas.omega())
    }
}
