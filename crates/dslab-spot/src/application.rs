//! Application model.

use serde::{Deserialize, Serialize};

use crate::web_service::WebService;

/// Key of an application inside its tenant, also the index of the application in the tenant's allocation vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub usize);

impl std::fmt::Display for AppId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bundle of web services which is the unit of VM allocation.
///
/// The order of web services is significant: response times are computed by walking them in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    id: AppId,
    name: String,
    web_services: Vec<WebService>,
}

impl Application {
    pub(crate) fn new(id: AppId, name: String, web_services: Vec<WebService>) -> Self {
        Self { id, name, web_services }
    }

    pub fn id(&self) -> AppId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn web_services(&self) -> &[WebService] {
        &self.web_services
    }

    pub fn size(&self) -> usize {
        self.web_services.len()
    }

    /// Total throughput of the application's web services.
    pub fn throughput(&self) -> f64 {
        self.web_services.iter().map(|ws| ws.throughput()).sum()
    }
}
