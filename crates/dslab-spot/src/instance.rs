//! Generation of random problem instances.

use log::debug;
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::config::{CountRange, GameConfig, ValueRange};
use crate::game::Game;
use crate::iaas::Iaas;
use crate::parameters::SaasParameters;
use crate::saas_problem::SaasProblem;
use crate::web_service::WebService;

/// Generates problem instances from a [`GameConfig`], reproducibly for a given seed.
///
/// Response time bounds are generated so that each web service is feasible even at its worst-case service rate and
/// delay: `R_bar = D * (1 + D_dev) + s / (mu * (1 - mu_dev))` with the slack `s > 1`.
pub struct InstanceGenerator {
    config: GameConfig,
    rand: Pcg64,
}

impl InstanceGenerator {
    pub fn new(seed: u64, config: GameConfig) -> Self {
        Self {
            config,
            rand: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn generate(&mut self) -> Game {
        let global = self.config.global;
        let iaas = Iaas::new(global.capacity, global.omega);
        let mut saass = Vec::with_capacity(self.config.saas_count);
        for j in 0..self.config.saas_count {
            let params = SaasParameters {
                q: self.sample(self.config.q),
                eta: self.sample(self.config.eta),
                r: self.sample_count(self.config.flat_vms),
            };
            let mut saas = SaasProblem::new(j, global, params);
            let app_count = self.sample_count(self.config.applications);
            for a in 0..app_count {
                let ws_count = self.sample_count(self.config.web_services);
                let web_services = (0..ws_count).map(|_| self.web_service()).collect();
                saas.add_application(&format!("app_{}", a), web_services);
            }
            debug!(
                "generated tenant {}: {:?}, {} applications",
                j,
                params,
                saas.saas().size()
            );
            saass.push(saas);
        }
        Game::new(iaas, saass)
    }

    fn web_service(&mut self) -> WebService {
        let global = self.config.global;
        let arrival_rate = self.sample(self.config.arrival_rate);
        let max_arrival_rate = arrival_rate * (1. + self.sample(self.config.load_margin));
        let delay = self.sample(self.config.delay);
        let service_rate = self.sample(self.config.service_rate);
        let slack = self.sample(self.config.response_time_slack);
        let max_response_time = delay * (1. + global.d_dev) + slack / (service_rate * (1. - global.mu_dev));
        let demand_weight = self.sample(self.config.demand_weight);
        WebService::new(
            max_arrival_rate,
            arrival_rate,
            delay,
            service_rate,
            max_response_time,
            demand_weight,
        )
    }

    fn sample(&mut self, range: ValueRange) -> f64 {
        if range.min >= range.max {
            return range.min;
        }
        self.rand.gen_range(range.min..=range.max)
    }

    fn sample_count(&mut self, range: CountRange) -> u32 {
        self.rand.gen_range(range.min..=range.max)
    }
}
