//! Payloads of the messages exchanged while solving a game.
//!
//! Every payload names the tenant it belongs to, and allocation payloads also carry the number of applications, so
//! the receiver can detect a worker which got out of step instead of silently mixing up tenants.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Tenant allocation sent by a worker to the coordinator.
pub const REPORT: &str = "REPORT";
/// Run status broadcast by the coordinator after the admission check.
pub const STATUS: &str = "STATUS";
/// Spot VMs granted to a tenant, sent by the coordinator to the tenant's owner.
pub const GRANT: &str = "GRANT";

/// Stage of the game a report belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Unconstrained solution, the spot field holds `desired_on_spot`.
    Initial,
    /// Solution with committed spot VMs, the spot field holds `on_spot`.
    Final,
}

/// Allocation of a single application.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AppAllocation {
    pub on_flat: f64,
    pub on_demand: f64,
    pub spot: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ReportBody {
    Allocation(Vec<AppAllocation>),
    Infeasible { app: usize, service: usize },
    Saturated { app: usize, throughput: f64, capacity: f64 },
    Failed { reason: String },
}

impl ReportBody {
    pub fn from_error(err: &GameError) -> Self {
        match err {
            GameError::InfeasibleSla { app, service, .. } => ReportBody::Infeasible {
                app: *app,
                service: *service,
            },
            GameError::Saturated {
                app,
                throughput,
                capacity,
                ..
            } => ReportBody::Saturated {
                app: *app,
                throughput: *throughput,
                capacity: *capacity,
            },
            other => ReportBody::Failed {
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TenantReport {
    pub tenant: usize,
    pub phase: Phase,
    pub app_count: usize,
    pub body: ReportBody,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Continue,
    Abort,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpotGrant {
    pub tenant: usize,
    pub given_on_spot: Vec<f64>,
}
