//! Web service model.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Immutable queueing-delay descriptor of a single web service of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebService {
    /// Upper bound of the offered load (requests per second).
    pub max_arrival_rate: f64,
    /// Nominal arrival rate (requests per second).
    pub arrival_rate: f64,
    /// Fixed delay component in seconds.
    pub delay: f64,
    /// Service rate of a single VM (requests per second).
    pub service_rate: f64,
    /// Maximum tolerated response time in seconds.
    pub max_response_time: f64,
    /// Share of the headroom between nominal and maximum load which must be provisioned.
    pub demand_weight: f64,
}

impl WebService {
    pub fn new(
        max_arrival_rate: f64,
        arrival_rate: f64,
        delay: f64,
        service_rate: f64,
        max_response_time: f64,
        demand_weight: f64,
    ) -> Self {
        Self {
            max_arrival_rate,
            arrival_rate,
            delay,
            service_rate,
            max_response_time,
            demand_weight,
        }
    }

    /// Checks that all rates and times are finite, the service rate and response time bound are positive and the
    /// rest is non-negative.
    pub fn validate(&self) -> GameResult<()> {
        let fields = [
            ("LAMBDA", self.max_arrival_rate, false),
            ("lambda", self.arrival_rate, false),
            ("D", self.delay, false),
            ("mu", self.service_rate, true),
            ("R_bar", self.max_response_time, true),
            ("nu", self.demand_weight, false),
        ];
        for (name, value, positive) in fields {
            let valid = value.is_finite() && if positive { value > 0. } else { value >= 0. };
            if !valid {
                let bound = if positive { "positive" } else { "non-negative" };
                return Err(GameError::Config(format!("{} must be finite and {}, got {}", name, bound, value)));
            }
        }
        Ok(())
    }

    /// Returns the throughput the service must be provisioned for.
    pub fn throughput(&self) -> f64 {
        self.arrival_rate + self.demand_weight * (self.max_arrival_rate - self.arrival_rate).max(0.)
    }

    /// Returns the response time of the service when `throughput` requests per second are spread over `vms` VMs,
    /// or `None` if the VMs are saturated or the parameters yield no finite non-negative time.
    pub fn response_time(&self, throughput: f64, vms: f64) -> Option<f64> {
        let time = if throughput <= 0. {
            self.delay + 1. / self.service_rate
        } else if vms <= 0. || throughput >= self.service_rate * vms {
            return None;
        } else {
            self.delay + 1. / (self.service_rate - throughput / vms)
        };
        Some(time).filter(|time| time.is_finite() && *time >= 0.)
    }

    /// Returns the minimum number of VMs which keeps the response time within the bound and the VM utilization
    /// below `rho`, using the given service rate and delay instead of the nominal ones.
    ///
    /// Returns `None` if the bound can't be met by any number of VMs.
    pub fn required_vms(&self, throughput: f64, rho: f64, service_rate: f64, delay: f64) -> Option<f64> {
        let slack = self.max_response_time - delay;
        if slack <= 0. {
            return None;
        }
        let residual_rate = service_rate - 1. / slack;
        if residual_rate <= 0. || rho <= 0. {
            return None;
        }
        Some((throughput / residual_rate).max(throughput / (rho * service_rate)))
    }
}
