//! Game configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::parameters::GlobalParameters;

/// Range of real values a parameter is sampled from.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn fixed(value: f64) -> Self {
        Self { min: value, max: value }
    }

    fn validate(&self, name: &str) -> GameResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(GameError::Config(format!(
                "{}: invalid range [{}, {}]",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Range of counts a parameter is sampled from.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn fixed(value: u32) -> Self {
        Self { min: value, max: value }
    }

    fn validate(&self, name: &str) -> GameResult<()> {
        if self.min > self.max {
            return Err(GameError::Config(format!(
                "{}: invalid range [{}, {}]",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Holds raw game config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawGameConfig {
    #[serde(rename = "T")]
    pub horizon: Option<u32>,
    #[serde(rename = "N")]
    pub capacity: Option<u32>,
    pub gamma: Option<u32>,
    pub rho: Option<f64>,
    pub delta: Option<f64>,
    pub mu_dev: Option<f64>,
    #[serde(rename = "D_dev")]
    pub d_dev: Option<f64>,
    pub omega: Option<f64>,
    pub workers: Option<usize>,
    pub saas_count: Option<usize>,
    pub applications: Option<CountRange>,
    pub web_services: Option<CountRange>,
    pub q: Option<ValueRange>,
    pub eta: Option<ValueRange>,
    pub flat_vms: Option<CountRange>,
    pub arrival_rate: Option<ValueRange>,
    pub load_margin: Option<ValueRange>,
    pub delay: Option<ValueRange>,
    pub service_rate: Option<ValueRange>,
    pub response_time_slack: Option<ValueRange>,
    pub demand_weight: Option<ValueRange>,
}

/// Represents game configuration: global parameters and the ranges problem instances are generated from.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct GameConfig {
    /// Parameters shared by the whole system.
    pub global: GlobalParameters,
    /// Number of workers solving the game.
    pub workers: usize,
    /// Number of tenants.
    pub saas_count: usize,
    /// Number of applications per tenant.
    pub applications: CountRange,
    /// Number of web services per application.
    pub web_services: CountRange,
    /// Flat-rate VM price relative to `omega`.
    pub q: ValueRange,
    /// Initial spot bid relative to `omega`.
    pub eta: ValueRange,
    /// Number of flat-rate VMs per tenant.
    pub flat_vms: CountRange,
    /// Nominal arrival rate of a web service.
    pub arrival_rate: ValueRange,
    /// Maximum arrival rate relative to the nominal one, minus one.
    pub load_margin: ValueRange,
    /// Fixed delay of a web service.
    pub delay: ValueRange,
    /// Service rate of a single VM.
    pub service_rate: ValueRange,
    /// Ratio of the response time bound to the worst-case queueing delay of an idle VM.
    /// Must be above 1 for the web service to be feasible.
    pub response_time_slack: ValueRange,
    /// Share of the load headroom which must be provisioned.
    pub demand_weight: ValueRange,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            global: GlobalParameters::default(),
            workers: 1,
            saas_count: 4,
            applications: CountRange::new(1, 3),
            web_services: CountRange::new(1, 3),
            q: ValueRange::new(0.4, 0.6),
            eta: ValueRange::new(0.2, 0.4),
            flat_vms: CountRange::new(5, 10),
            arrival_rate: ValueRange::new(10., 50.),
            load_margin: ValueRange::new(0.1, 0.5),
            delay: ValueRange::new(0.01, 0.05),
            service_rate: ValueRange::new(5., 20.),
            response_time_slack: ValueRange::new(1.5, 3.),
            demand_weight: ValueRange::new(0., 1.),
        }
    }
}

impl GameConfig {
    /// Creates game config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> GameResult<Self> {
        let content = std::fs::read_to_string(file_name)?;
        Self::from_yaml(&content)
    }

    /// Creates game config from YAML string.
    pub fn from_yaml(content: &str) -> GameResult<Self> {
        let raw: RawGameConfig = serde_yaml::from_str(content)?;
        let default = Self::default();
        let config = Self {
            global: GlobalParameters {
                horizon: raw.horizon.unwrap_or(default.global.horizon),
                capacity: raw.capacity.unwrap_or(default.global.capacity),
                gamma: raw.gamma.unwrap_or(default.global.gamma),
                rho: raw.rho.unwrap_or(default.global.rho),
                delta: raw.delta.unwrap_or(default.global.delta),
                mu_dev: raw.mu_dev.unwrap_or(default.global.mu_dev),
                d_dev: raw.d_dev.unwrap_or(default.global.d_dev),
                omega: raw.omega.unwrap_or(default.global.omega),
            },
            workers: raw.workers.unwrap_or(default.workers),
            saas_count: raw.saas_count.unwrap_or(default.saas_count),
            applications: raw.applications.unwrap_or(default.applications),
            web_services: raw.web_services.unwrap_or(default.web_services),
            q: raw.q.unwrap_or(default.q),
            eta: raw.eta.unwrap_or(default.eta),
            flat_vms: raw.flat_vms.unwrap_or(default.flat_vms),
            arrival_rate: raw.arrival_rate.unwrap_or(default.arrival_rate),
            load_margin: raw.load_margin.unwrap_or(default.load_margin),
            delay: raw.delay.unwrap_or(default.delay),
            service_rate: raw.service_rate.unwrap_or(default.service_rate),
            response_time_slack: raw.response_time_slack.unwrap_or(default.response_time_slack),
            demand_weight: raw.demand_weight.unwrap_or(default.demand_weight),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GameResult<()> {
        self.global.validate()?;
        if self.workers == 0 {
            return Err(GameError::Config("at least one worker is required".to_string()));
        }
        self.applications.validate("applications")?;
        self.web_services.validate("web_services")?;
        self.flat_vms.validate("flat_vms")?;
        if self.web_services.min == 0 {
            return Err(GameError::Config("applications need at least one web service".to_string()));
        }
        self.q.validate("q")?;
        self.eta.validate("eta")?;
        self.arrival_rate.validate("arrival_rate")?;
        self.load_margin.validate("load_margin")?;
        self.delay.validate("delay")?;
        self.service_rate.validate("service_rate")?;
        self.response_time_slack.validate("response_time_slack")?;
        self.demand_weight.validate("demand_weight")?;
        if self.service_rate.min <= 0. {
            return Err(GameError::Config("service_rate must be positive".to_string()));
        }
        if self.response_time_slack.min <= 1. {
            return Err(GameError::Config("response_time_slack must be above 1".to_string()));
        }
        if self.arrival_rate.min < 0. || self.load_margin.min < 0. || self.delay.min < 0. {
            return Err(GameError::Config(
                "arrival_rate, load_margin and delay must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
