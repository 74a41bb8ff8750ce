#![allow(dead_code)]

use dslab_spot::{Game, GlobalParameters, Iaas, SaasParameters, SaasProblem, WebService};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {}", x, y);
}

/// Web service with constant load `rate`, service rate `mu`, delay 0.1 and response time bound 1.0.
///
/// Needs `rate / (mu - 1 / 0.9)` VMs.
pub fn web_service(rate: f64, mu: f64) -> WebService {
    WebService::new(rate, rate, 0.1, mu, 1.0, 0.)
}

pub fn global(capacity: u32) -> GlobalParameters {
    GlobalParameters {
        capacity,
        ..GlobalParameters::default()
    }
}

/// Tenant with one single-service application per entry of `rates`.
pub fn tenant(id: usize, global: GlobalParameters, q: f64, eta: f64, r: u32, rates: &[f64]) -> SaasProblem {
    let mut problem = SaasProblem::new(id, global, SaasParameters { q, eta, r });
    for (a, rate) in rates.iter().enumerate() {
        problem.add_application(&format!("app_{}", a), vec![web_service(*rate, 10.)]);
    }
    problem
}

/// Two identical tenants bidding 0.2 for 5 spot VMs each.
pub fn two_tenants(capacity: u32) -> Game {
    let global = global(capacity);
    let saass = (0..2).map(|id| tenant(id, global, 0.5, 0.2, 0, &[40.])).collect();
    Game::new(Iaas::new(capacity, global.omega), saass)
}

/// Solves every tenant without spot limits, as the workers do before clearing.
pub fn solve_tenants(game: &mut Game) {
    for saas in game.saass_mut() {
        saas.solve().unwrap();
        saas.rounding();
    }
}

pub fn print_to_string(game: &Game) -> String {
    let mut out = Vec::new();
    game.print(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}
