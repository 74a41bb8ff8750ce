//! Tenant (SaaS provider) state.

use crate::application::{AppId, Application};
use crate::error::{GameError, GameResult};
use crate::web_service::WebService;

/// Allocation state of a single tenant.
///
/// Holds the tenant's applications and five allocation vectors indexed by [`AppId`]:
///
/// * `on_flat` - flat-rate VMs,
/// * `on_demand` - on-demand VMs,
/// * `on_spot` - committed spot VMs,
/// * `desired_on_spot` - spot VMs requested in the current round,
/// * `given_on_spot` - spot VMs granted by the provider in the current round.
#[derive(Debug, Clone)]
pub struct Saas {
    id: usize,
    applications: Vec<Application>,
    on_flat: Vec<f64>,
    on_demand: Vec<f64>,
    on_spot: Vec<f64>,
    desired_on_spot: Vec<f64>,
    given_on_spot: Vec<f64>,
    cost_threshold: f64,
    throughput: Vec<f64>,
    response_time: Vec<f64>,
}

impl Saas {
    pub fn new(id: usize, cost_threshold: f64) -> Self {
        Self {
            id,
            applications: Vec::new(),
            on_flat: Vec::new(),
            on_demand: Vec::new(),
            on_spot: Vec::new(),
            desired_on_spot: Vec::new(),
            given_on_spot: Vec::new(),
            cost_threshold,
            throughput: Vec::new(),
            response_time: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Adds an application with zero allocation and returns its key.
    pub fn add_application(&mut self, name: &str, web_services: Vec<WebService>) -> AppId {
        let id = AppId(self.applications.len());
        self.applications.push(Application::new(id, name.to_string(), web_services));
        self.on_flat.push(0.);
        self.on_demand.push(0.);
        self.on_spot.push(0.);
        self.desired_on_spot.push(0.);
        self.given_on_spot.push(0.);
        id
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn application(&self, app: AppId) -> &Application {
        &self.applications[self.slot(app)]
    }

    pub fn app_ids(&self) -> impl Iterator<Item = AppId> {
        (0..self.applications.len()).map(AppId)
    }

    pub fn size(&self) -> usize {
        self.applications.len()
    }

    fn slot(&self, app: AppId) -> usize {
        if app.0 >= self.applications.len() {
            panic!("Application {} not found in tenant {}", app, self.id);
        }
        app.0
    }

    pub fn on_flat(&self, app: AppId) -> f64 {
        self.on_flat[self.slot(app)]
    }

    pub fn on_demand(&self, app: AppId) -> f64 {
        self.on_demand[self.slot(app)]
    }

    pub fn on_spot(&self, app: AppId) -> f64 {
        self.on_spot[self.slot(app)]
    }

    pub fn desired_on_spot(&self, app: AppId) -> f64 {
        self.desired_on_spot[self.slot(app)]
    }

    pub fn given_on_spot(&self, app: AppId) -> f64 {
        self.given_on_spot[self.slot(app)]
    }

    pub fn cost_threshold(&self) -> f64 {
        self.cost_threshold
    }

    /// Total number of VMs of all tiers serving the application.
    pub fn total_vms(&self, app: AppId) -> f64 {
        let idx = self.slot(app);
        self.on_flat[idx] + self.on_demand[idx] + self.on_spot[idx]
    }

    pub fn set_on_flat(&mut self, app: AppId, value: f64) {
        let idx = self.slot(app);
        self.on_flat[idx] = value;
    }

    pub fn set_on_demand(&mut self, app: AppId, value: f64) {
        let idx = self.slot(app);
        self.on_demand[idx] = value;
    }

    pub fn set_on_spot(&mut self, app: AppId, value: f64) {
        let idx = self.slot(app);
        self.on_spot[idx] = value;
    }

    pub fn set_desired_on_spot(&mut self, app: AppId, value: f64) {
        let idx = self.slot(app);
        self.desired_on_spot[idx] = value;
    }

    pub fn set_given_on_spot(&mut self, app: AppId, value: f64) {
        let idx = self.slot(app);
        self.given_on_spot[idx] = value;
    }

    pub fn set_cost_threshold(&mut self, cost: f64) {
        self.cost_threshold = cost;
    }

    pub(crate) fn reset_given_on_spot(&mut self) {
        self.given_on_spot.iter_mut().for_each(|v| *v = 0.);
    }

    pub(crate) fn reset_desired_on_spot(&mut self) {
        self.desired_on_spot.iter_mut().for_each(|v| *v = 0.);
    }

    /// Appends the throughput of the next web service (in application order).
    pub fn set_throughput(&mut self, value: f64) {
        self.throughput.push(value);
    }

    pub fn clear_throughput(&mut self) {
        self.throughput.clear();
    }

    pub fn throughput(&self, index: usize) -> f64 {
        self.throughput[index]
    }

    /// Response time of the `index`-th web service (in application order) from the last
    /// [`compute_response_time`](Saas::compute_response_time) call.
    pub fn response_time(&self, index: usize) -> f64 {
        self.response_time[index]
    }

    /// Computes response times of all web services from the accumulated throughputs and current allocation.
    ///
    /// The throughput list must hold one value per web service, in application order.
    pub fn compute_response_time(&mut self) -> GameResult<()> {
        let ws_count: usize = self.applications.iter().map(|app| app.size()).sum();
        assert_eq!(
            self.throughput.len(),
            ws_count,
            "tenant {}: throughput list doesn't match web services",
            self.id
        );
        self.response_time.clear();
        let mut offset = 0;
        for (idx, app) in self.applications.iter().enumerate() {
            let total_vms = self.on_flat[idx] + self.on_demand[idx] + self.on_spot[idx];
            let total_throughput: f64 = self.throughput[offset..offset + app.size()].iter().sum();
            for ws in app.web_services() {
                match ws.response_time(total_throughput, total_vms) {
                    Some(time) => self.response_time.push(time),
                    None => {
                        return Err(GameError::Saturated {
                            tenant: self.id,
                            app: idx,
                            throughput: total_throughput,
                            capacity: ws.service_rate * total_vms,
                        })
                    }
                }
            }
            offset += app.size();
        }
        Ok(())
    }
}
