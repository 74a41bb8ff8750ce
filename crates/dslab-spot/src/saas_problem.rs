//! Tenant optimization problem.

use std::cmp::Ordering;
use std::io::Write;

use log::trace;

use crate::application::{AppId, Application};
use crate::error::{GameError, GameResult};
use crate::parameters::{GlobalParameters, SaasParameters};
use crate::saas::Saas;
use crate::web_service::WebService;

/// Tolerance used when comparing VM counts.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Flat,
    OnDemand,
    Spot,
}

/// Computes the cheapest VM mix of a tenant satisfying the SLAs of its applications.
///
/// Each application needs at least `n_min` VMs to keep the response time of every web service within its bound
/// (see [`SaasProblem::required_vms`]). The VMs are bought from three tiers: flat-rate VMs priced at
/// `q * omega` and limited to `R` per tenant, on-demand VMs priced at `omega`, and spot VMs priced at the tenant's
/// current bid (`cost_threshold`). Minimizing the linear cost under a single covering constraint is done exactly by
/// filling the tiers cheapest first. Before the spot allocation is committed, spot VMs are assumed to be available
/// in any quantity and the result is stored as `desired_on_spot`. After [`update`](SaasProblem::update) the
/// committed spot VMs are fixed and only the remainder is covered by flat-rate and on-demand VMs.
#[derive(Debug, Clone)]
pub struct SaasProblem {
    saas: Saas,
    global: GlobalParameters,
    params: SaasParameters,
    spot_committed: bool,
}

impl SaasProblem {
    pub fn new(id: usize, global: GlobalParameters, params: SaasParameters) -> Self {
        let initial = (params.eta * global.omega).min(global.omega);
        Self {
            saas: Saas::new(id, initial),
            global,
            params,
            spot_committed: false,
        }
    }

    pub fn add_application(&mut self, name: &str, web_services: Vec<WebService>) -> AppId {
        self.saas.add_application(name, web_services)
    }

    pub fn id(&self) -> usize {
        self.saas.id()
    }

    pub fn saas(&self) -> &Saas {
        &self.saas
    }

    pub fn saas_mut(&mut self) -> &mut Saas {
        &mut self.saas
    }

    pub fn global(&self) -> &GlobalParameters {
        &self.global
    }

    pub fn params(&self) -> &SaasParameters {
        &self.params
    }

    pub fn flat_price(&self) -> f64 {
        self.params.q * self.global.omega
    }

    pub fn on_demand_price(&self) -> f64 {
        self.global.omega
    }

    pub fn initial_cost_threshold(&self) -> f64 {
        (self.params.eta * self.global.omega).min(self.max_cost_threshold())
    }

    /// The bid never exceeds the on-demand price.
    pub fn max_cost_threshold(&self) -> f64 {
        self.global.omega
    }

    pub fn cost_threshold(&self) -> f64 {
        self.saas.cost_threshold()
    }

    pub fn is_spot_committed(&self) -> bool {
        self.spot_committed
    }

    /// Returns the minimum number of VMs the application needs, or the index of a web service whose SLA can't be
    /// met by any number of VMs.
    ///
    /// For a web service with service rate `mu` and delay `D` the response time bound gives
    /// `n >= X / (mu - 1 / (R_bar - D))` and the utilization bound gives `n >= X / (rho * mu)`, where `X` is the
    /// total throughput of the application. The `gamma` web services with the largest worst-case requirement are
    /// evaluated with `mu * (1 - mu_dev)` and `D * (1 + D_dev)`, the others with nominal values.
    pub fn required_vms(&self, app: &Application) -> Result<f64, usize> {
        let throughput = app.throughput();
        let rho = self.global.rho;
        let nominal: Vec<f64> = app
            .web_services()
            .iter()
            .map(|ws| {
                ws.required_vms(throughput, rho, ws.service_rate, ws.delay)
                    .unwrap_or(f64::INFINITY)
            })
            .collect();
        let robust: Vec<f64> = app
            .web_services()
            .iter()
            .map(|ws| {
                ws.required_vms(
                    throughput,
                    rho,
                    ws.service_rate * (1. - self.global.mu_dev),
                    ws.delay * (1. + self.global.d_dev),
                )
                .unwrap_or(f64::INFINITY)
            })
            .collect();

        let mut order: Vec<usize> = (0..app.size()).collect();
        order.sort_by(|&a, &b| robust[b].total_cmp(&robust[a]));
        let mut required = nominal;
        for &k in order.iter().take(self.global.gamma as usize) {
            required[k] = robust[k];
        }

        let mut n_min: f64 = 0.;
        for (k, n) in required.into_iter().enumerate() {
            if !n.is_finite() {
                return Err(k);
            }
            n_min = n_min.max(n);
        }
        Ok(n_min)
    }

    /// Computes the cheapest VM mix of every application.
    pub fn solve(&mut self) -> GameResult<()> {
        self.load_throughput();

        let mut flat_left = self.params.r as f64;
        let app_ids: Vec<AppId> = self.saas.app_ids().collect();
        for app_id in app_ids {
            let app = self.saas.application(app_id);
            let n_min = self.required_vms(app).map_err(|service| GameError::InfeasibleSla {
                tenant: self.id(),
                app: app_id.0,
                service,
            })?;

            let committed = if self.spot_committed {
                self.saas.on_spot(app_id)
            } else {
                0.
            };
            let mut tiers = vec![
                (Tier::Flat, self.flat_price(), flat_left),
                (Tier::OnDemand, self.on_demand_price(), f64::INFINITY),
            ];
            if !self.spot_committed {
                tiers.push((Tier::Spot, self.cost_threshold(), f64::INFINITY));
            }
            // stable sort keeps flat, on-demand, spot order for equal prices
            tiers.sort_by(|a, b| a.1.total_cmp(&b.1));

            let mut need = (n_min - committed).max(0.);
            let (mut flat, mut demand, mut spot) = (0., 0., 0.);
            for (tier, _, cap) in tiers {
                let take = need.min(cap);
                match tier {
                    Tier::Flat => flat = take,
                    Tier::OnDemand => demand = take,
                    Tier::Spot => spot = take,
                }
                need -= take;
            }
            flat_left -= flat;

            self.saas.set_on_flat(app_id, flat);
            self.saas.set_on_demand(app_id, demand);
            if !self.spot_committed {
                self.saas.set_desired_on_spot(app_id, spot);
            }
            self.verify_sla(app_id, flat + demand + spot + committed)?;
            trace!(
                "tenant {} app {}: n_min = {:.3}, flat = {:.3}, demand = {:.3}, spot = {:.3}, committed = {:.3}",
                self.id(),
                app_id,
                n_min,
                flat,
                demand,
                spot,
                committed
            );
        }
        Ok(())
    }

    fn verify_sla(&self, app_id: AppId, vms: f64) -> GameResult<()> {
        let app = self.saas.application(app_id);
        let throughput = app.throughput();
        for (k, ws) in app.web_services().iter().enumerate() {
            match ws.response_time(throughput, vms) {
                Some(time) => {
                    if time > ws.max_response_time * (1. + EPSILON) {
                        return Err(GameError::InfeasibleSla {
                            tenant: self.id(),
                            app: app_id.0,
                            service: k,
                        });
                    }
                }
                None => {
                    return Err(GameError::Saturated {
                        tenant: self.id(),
                        app: app_id.0,
                        throughput,
                        capacity: ws.service_rate * vms,
                    })
                }
            }
        }
        Ok(())
    }

    /// Rounds the solution up to whole VMs.
    ///
    /// Flat-rate VMs above the tenant's limit are moved to the cheapest other tier: spot if the bid is below the
    /// on-demand price and spot is not committed yet, on-demand otherwise.
    pub fn rounding(&mut self) {
        let overflow = self.overflow_tier();
        let mut flat_left = self.params.r as f64;
        let app_ids: Vec<AppId> = self.saas.app_ids().collect();
        for app_id in app_ids {
            let mut flat = round_up(self.saas.on_flat(app_id));
            let mut demand = self.saas.on_demand(app_id);
            let mut desired = self.saas.desired_on_spot(app_id);
            if flat > flat_left {
                match overflow {
                    Tier::Spot => desired += flat - flat_left,
                    _ => demand += flat - flat_left,
                }
                flat = flat_left;
            }
            flat_left -= flat;
            self.saas.set_on_flat(app_id, flat);
            self.saas.set_on_demand(app_id, round_up(demand));
            let spot = round_up(self.saas.on_spot(app_id));
            self.saas.set_on_spot(app_id, spot);
            self.saas.set_desired_on_spot(app_id, round_up(desired));
        }
    }

    fn overflow_tier(&self) -> Tier {
        if !self.spot_committed && self.cost_threshold() < self.on_demand_price() {
            Tier::Spot
        } else {
            Tier::OnDemand
        }
    }

    /// Returns true if the provider granted every requested spot VM.
    pub fn check(&self) -> bool {
        self.saas
            .app_ids()
            .all(|app| self.saas.given_on_spot(app) >= self.saas.desired_on_spot(app) - EPSILON)
    }

    /// Raises the bid of an unsatisfied tenant by `delta`, up to the maximum.
    pub fn set_cost_threshold(&mut self) {
        if self.check() {
            return;
        }
        let raised = (self.cost_threshold() + self.global.delta).min(self.max_cost_threshold());
        if raised > self.cost_threshold() {
            self.saas.set_cost_threshold(raised);
        }
    }

    /// Commits the granted spot VMs.
    pub fn update(&mut self) {
        let app_ids: Vec<AppId> = self.saas.app_ids().collect();
        for app_id in app_ids {
            let given = self.saas.given_on_spot(app_id);
            self.saas.set_on_spot(app_id, given);
        }
        self.spot_committed = true;
    }

    pub fn reset_given_on_spot(&mut self) {
        self.saas.reset_given_on_spot();
    }

    pub fn reset_desired(&mut self) {
        self.saas.reset_desired_on_spot();
    }

    /// Orders tenants by bid, ascending.
    pub fn cmp_by_bid(&self, other: &SaasProblem) -> Ordering {
        self.cost_threshold().total_cmp(&other.cost_threshold())
    }

    /// Total number of requested flat-rate and on-demand VMs.
    pub fn fixed_demand(&self) -> f64 {
        self.saas
            .app_ids()
            .map(|app| self.saas.on_flat(app) + self.saas.on_demand(app))
            .sum()
    }

    /// Cost of the current allocation over the time horizon, spot VMs being paid at the tenant's bid.
    pub fn cost(&self) -> f64 {
        let per_step: f64 = self
            .saas
            .app_ids()
            .map(|app| {
                self.saas.on_flat(app) * self.flat_price()
                    + self.saas.on_demand(app) * self.on_demand_price()
                    + self.saas.on_spot(app) * self.cost_threshold()
            })
            .sum();
        per_step * self.global.horizon as f64
    }

    /// Computes response times of all web services under the current allocation.
    pub fn response_times(&mut self) -> GameResult<Vec<f64>> {
        let count = self.load_throughput();
        self.saas.compute_response_time()?;
        Ok((0..count).map(|i| self.saas.response_time(i)).collect())
    }

    fn load_throughput(&mut self) -> usize {
        let values: Vec<f64> = self
            .saas
            .applications()
            .iter()
            .flat_map(|app| app.web_services().iter().map(|ws| ws.throughput()))
            .collect();
        self.saas.clear_throughput();
        for value in &values {
            self.saas.set_throughput(*value);
        }
        values.len()
    }

    pub fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        writeln!(out, "q = {}, eta = {}, R = {}", self.params.q, self.params.eta, self.params.r)?;
        writeln!(out, "cost_threshold = {}", self.cost_threshold())?;
        writeln!(out, "cost = {}", self.cost())?;
        for app in self.saas.applications() {
            let id = app.id();
            writeln!(
                out,
                "application {} ({}): on_flat = {}, on_demand = {}, on_spot = {}",
                id,
                app.name(),
                self.saas.on_flat(id),
                self.saas.on_demand(id),
                self.saas.on_spot(id)
            )?;
        }
        Ok(())
    }
}

fn round_up(value: f64) -> f64 {
    let rounded = (value - EPSILON).ceil();
    if rounded > 0. {
        rounded
    } else {
        0.
    }
}
