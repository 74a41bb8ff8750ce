//! Spot VM market between an infrastructure provider and competing SaaS tenants.
//!
//! Each tenant computes the cheapest mix of flat-rate, on-demand and spot VMs that keeps the response times of its
//! web services within their SLA bounds. The provider's spot capacity is limited and is cleared greedily in the
//! order of tenant bids; unsatisfied tenants raise their bids until everyone is served or no bid can grow. The game
//! is solved by a group of workers which exchange messages with a coordinator, see [`game::Game::solve`].

pub mod application;
pub mod comm;
pub mod config;
pub mod error;
pub mod game;
pub mod iaas;
pub mod iaas_problem;
pub mod instance;
pub mod log;
pub mod message;
pub mod parameters;
pub mod protocol;
pub mod saas;
pub mod saas_problem;
pub mod tables;
pub mod web_service;

pub use colored;

pub use application::{AppId, Application};
pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use game::{ClearingStats, Game};
pub use iaas::Iaas;
pub use instance::InstanceGenerator;
pub use parameters::{GlobalParameters, SaasParameters};
pub use saas_problem::SaasProblem;
pub use web_service::WebService;
