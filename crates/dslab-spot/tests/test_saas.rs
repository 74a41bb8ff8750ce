mod common;
use common::{assert_float_eq, global, tenant, web_service};

use dslab_spot::{AppId, GameError, GlobalParameters, SaasParameters, SaasProblem, WebService};

#[test]
// Delay 0.1 and bound 1.0 leave 0.9 s for queueing, so 40 req/s at mu = 10 need 40 / (10 - 1 / 0.9) = 4.5 VMs.
fn test_required_vms() {
    let problem = tenant(0, global(100), 0.5, 0.2, 0, &[40.]);
    let n_min = problem.required_vms(problem.saas().application(AppId(0))).unwrap();
    assert_float_eq(n_min, 4.5, 1e-9);
}

#[test]
// Utilization bound dominates when rho is low: 40 / (0.5 * 10) = 8 VMs.
fn test_required_vms_utilization() {
    let global = GlobalParameters {
        rho: 0.5,
        ..global(100)
    };
    let problem = tenant(0, global, 0.5, 0.2, 0, &[40.]);
    let n_min = problem.required_vms(problem.saas().application(AppId(0))).unwrap();
    assert_float_eq(n_min, 8., 1e-9);
}

#[test]
fn test_required_vms_robust() {
    let nominal = tenant(0, global(100), 0.5, 0.2, 0, &[40.]);
    let robust_global = GlobalParameters {
        gamma: 1,
        mu_dev: 0.1,
        d_dev: 0.1,
        ..global(100)
    };
    let robust = tenant(0, robust_global, 0.5, 0.2, 0, &[40.]);
    let app = AppId(0);
    let n_nominal = nominal.required_vms(nominal.saas().application(app)).unwrap();
    let n_robust = robust.required_vms(robust.saas().application(app)).unwrap();
    // 40 / (9 - 1 / 0.89)
    assert_float_eq(n_robust, 40. / (9. - 1. / 0.89), 1e-9);
    assert!(n_robust > n_nominal);
}

#[test]
fn test_only_gamma_services_are_robust() {
    let global = GlobalParameters {
        gamma: 1,
        mu_dev: 0.1,
        ..global(100)
    };
    let mut problem = SaasProblem::new(0, global, SaasParameters { q: 0.5, eta: 0.2, r: 0 });
    // the first service is much faster, so only the second one is evaluated at its worst case
    problem.add_application("app", vec![web_service(20., 100.), web_service(20., 10.)]);
    let n_min = problem.required_vms(problem.saas().application(AppId(0))).unwrap();
    assert_float_eq(n_min, 40. / (9. - 1. / 0.9), 1e-9);
}

#[test]
// Spot VMs are the cheapest tier: everything is requested on spot, rounded up to whole VMs.
fn test_solve_single_tenant() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40.]);
    problem.solve().unwrap();
    let app = AppId(0);
    assert_float_eq(problem.saas().desired_on_spot(app), 4.5, 1e-9);
    assert_eq!(problem.saas().on_flat(app), 0.);
    assert_eq!(problem.saas().on_demand(app), 0.);

    problem.rounding();
    assert_eq!(problem.saas().desired_on_spot(app), 5.);
}

#[test]
// Scenario with slow VMs (mu = 10): a feasible mix is found and the response time stays within the bound.
fn test_single_web_service_feasible() {
    let mut problem = SaasProblem::new(0, global(1000), SaasParameters { q: 0.5, eta: 0.2, r: 0 });
    problem.add_application("app", vec![WebService::new(10., 5., 0.1, 10., 1.0, 1.)]);
    problem.solve().unwrap();
    problem.rounding();

    let app = AppId(0);
    let saas = problem.saas();
    for value in [saas.on_flat(app), saas.on_demand(app), saas.desired_on_spot(app)] {
        assert!(value >= 0.);
        assert_eq!(value, value.round());
    }
    assert_eq!(saas.desired_on_spot(app), 2.);

    problem.saas_mut().set_given_on_spot(app, 2.);
    problem.update();
    problem.solve().unwrap();
    problem.rounding();
    let times = problem.response_times().unwrap();
    assert_eq!(times.len(), 1);
    assert!(times[0] <= 1.0);
    // 0.1 + 1 / (10 - 10 / 2)
    assert_float_eq(times[0], 0.3, 1e-9);
}

#[test]
// With mu = 1 a VM can't serve any load within 0.9 s of queueing, whatever the number of VMs.
fn test_single_web_service_infeasible() {
    let mut problem = SaasProblem::new(0, global(1000), SaasParameters { q: 0.5, eta: 0.2, r: 0 });
    problem.add_application("app", vec![WebService::new(10., 5., 0.1, 1.0, 1.0, 1.)]);
    let result = problem.solve();
    assert!(matches!(
        result,
        Err(GameError::InfeasibleSla {
            tenant: 0,
            app: 0,
            service: 0
        })
    ));
}

#[test]
// Flat-rate VMs are cheapest and limited to R = 2, the rest goes to spot.
fn test_flat_rate_limit() {
    let mut problem = tenant(0, global(1000), 0.1, 0.2, 2, &[40.]);
    problem.solve().unwrap();
    let app = AppId(0);
    assert_eq!(problem.saas().on_flat(app), 2.);
    assert_float_eq(problem.saas().desired_on_spot(app), 2.5, 1e-9);
    assert_eq!(problem.saas().on_demand(app), 0.);
    assert_float_eq(problem.fixed_demand(), 2., 1e-9);
}

#[test]
// A bid equal to the on-demand price gives no advantage to spot VMs.
fn test_bid_at_on_demand_price() {
    let mut problem = tenant(0, global(1000), 0.5, 1.0, 0, &[40.]);
    assert_eq!(problem.cost_threshold(), problem.max_cost_threshold());
    problem.solve().unwrap();
    let app = AppId(0);
    assert_float_eq(problem.saas().on_demand(app), 4.5, 1e-9);
    assert_eq!(problem.saas().desired_on_spot(app), 0.);
}

#[test]
fn test_initial_bid_is_capped() {
    let problem = tenant(0, global(1000), 0.5, 1.5, 0, &[40.]);
    assert_eq!(problem.initial_cost_threshold(), 1.0);
    assert_eq!(problem.cost_threshold(), 1.0);
}

#[test]
// Flat-rate limit is shared by the tenant's applications. After rounding up the first application, only one flat
// VM is left for the second one, its excess moves to on-demand.
fn test_rounding_respects_flat_limit() {
    let mut problem = tenant(0, global(1000), 0.1, 1.0, 6, &[40., 40.]);
    problem.solve().unwrap();
    let (first, second) = (AppId(0), AppId(1));
    assert_float_eq(problem.saas().on_flat(first), 4.5, 1e-9);
    assert_float_eq(problem.saas().on_flat(second), 1.5, 1e-9);
    assert_float_eq(problem.saas().on_demand(second), 3., 1e-9);

    problem.rounding();
    let saas = problem.saas();
    assert_eq!(saas.on_flat(first), 5.);
    assert_eq!(saas.on_demand(first), 0.);
    assert_eq!(saas.on_flat(second), 1.);
    assert_eq!(saas.on_demand(second), 4.);
    assert!(saas.on_flat(first) + saas.on_flat(second) <= problem.params().r as f64);
}

#[test]
// Spot at bid 0.2 is cheaper than on-demand, so the flat VM that doesn't fit into R = 6 is wanted on spot.
fn test_rounding_moves_flat_excess_to_spot() {
    let mut problem = tenant(0, global(1000), 0.1, 0.2, 6, &[40., 40.]);
    problem.solve().unwrap();
    let (first, second) = (AppId(0), AppId(1));
    assert_float_eq(problem.saas().desired_on_spot(second), 3., 1e-9);

    problem.rounding();
    let saas = problem.saas();
    assert_eq!(saas.on_flat(first), 5.);
    assert_eq!(saas.on_flat(second), 1.);
    assert_eq!(saas.on_demand(first), 0.);
    assert_eq!(saas.on_demand(second), 0.);
    assert_eq!(saas.desired_on_spot(second), 4.);
    assert_eq!(problem.fixed_demand(), 6.);
}

#[test]
// Once spot is committed the excess can only go to on-demand.
fn test_rounding_moves_flat_excess_to_demand_after_update() {
    let mut problem = tenant(0, global(1000), 0.1, 0.2, 6, &[40., 40.]);
    problem.solve().unwrap();
    problem.rounding();
    problem.update();

    problem.solve().unwrap();
    problem.reset_desired();
    problem.rounding();
    let saas = problem.saas();
    assert_eq!(saas.on_flat(AppId(1)), 1.);
    assert_eq!(saas.on_demand(AppId(1)), 4.);
    assert_eq!(saas.on_spot(AppId(1)), 0.);
    assert_eq!(saas.desired_on_spot(AppId(1)), 0.);
}

#[test]
fn test_rounding_gives_whole_vms() {
    let mut problem = tenant(0, global(1000), 0.3, 0.6, 3, &[12.5, 33.3, 7.1]);
    problem.solve().unwrap();
    problem.rounding();
    let saas = problem.saas();
    for app in saas.app_ids() {
        for value in [saas.on_flat(app), saas.on_demand(app), saas.on_spot(app), saas.desired_on_spot(app)] {
            assert!(value >= 0.);
            assert_eq!(value, value.round());
        }
        let n_min = problem.required_vms(saas.application(app)).unwrap();
        assert!(saas.on_flat(app) + saas.on_demand(app) + saas.desired_on_spot(app) >= n_min);
    }
}

#[test]
fn test_allocation_vectors_follow_applications() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[]);
    assert_eq!(problem.saas().size(), 0);
    let first = problem.add_application("first", vec![web_service(10., 10.)]);
    let second = problem.add_application("second", vec![web_service(10., 10.), web_service(5., 10.)]);
    assert_eq!(first, AppId(0));
    assert_eq!(second, AppId(1));

    let saas = problem.saas();
    assert_eq!(saas.size(), 2);
    assert_eq!(saas.application(second).name(), "second");
    assert_eq!(saas.application(second).size(), 2);
    for app in saas.app_ids() {
        assert_eq!(saas.on_flat(app), 0.);
        assert_eq!(saas.on_demand(app), 0.);
        assert_eq!(saas.on_spot(app), 0.);
        assert_eq!(saas.desired_on_spot(app), 0.);
        assert_eq!(saas.given_on_spot(app), 0.);
    }
}

#[test]
// Applications with equal parameters are still kept apart.
fn test_equal_applications() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40., 40.]);
    problem.saas_mut().set_given_on_spot(AppId(1), 3.);
    assert_eq!(problem.saas().given_on_spot(AppId(0)), 0.);
    assert_eq!(problem.saas().given_on_spot(AppId(1)), 3.);
}

#[test]
fn test_check() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40., 10.]);
    // nothing desired, nothing given
    assert!(problem.check());

    let saas = problem.saas_mut();
    saas.set_desired_on_spot(AppId(0), 5.);
    saas.set_desired_on_spot(AppId(1), 2.);
    saas.set_given_on_spot(AppId(0), 5.);
    saas.set_given_on_spot(AppId(1), 1.);
    assert!(!problem.check());

    problem.saas_mut().set_given_on_spot(AppId(1), 2.);
    assert!(problem.check());
}

#[test]
fn test_set_cost_threshold() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40.]);
    problem.saas_mut().set_desired_on_spot(AppId(0), 5.);

    problem.set_cost_threshold();
    assert_float_eq(problem.cost_threshold(), 0.25, 1e-9);

    // satisfied tenant keeps its bid
    problem.saas_mut().set_given_on_spot(AppId(0), 5.);
    problem.set_cost_threshold();
    assert_float_eq(problem.cost_threshold(), 0.25, 1e-9);

    problem.saas_mut().set_given_on_spot(AppId(0), 4.);
    for _ in 0..100 {
        problem.set_cost_threshold();
    }
    assert_eq!(problem.cost_threshold(), problem.max_cost_threshold());
}

#[test]
// Committed spot VMs are fixed, only the missing VMs are bought on flat-rate and on-demand tiers.
fn test_update_commits_granted_spot() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40.]);
    problem.solve().unwrap();
    problem.rounding();
    problem.saas_mut().set_given_on_spot(AppId(0), 3.);

    problem.update();
    assert!(problem.is_spot_committed());
    assert_eq!(problem.saas().on_spot(AppId(0)), 3.);

    problem.solve().unwrap();
    problem.reset_desired();
    problem.rounding();
    let saas = problem.saas();
    assert_eq!(saas.on_spot(AppId(0)), 3.);
    assert_eq!(saas.on_demand(AppId(0)), 2.);
    assert_eq!(saas.on_flat(AppId(0)), 0.);
    assert_eq!(saas.desired_on_spot(AppId(0)), 0.);
    assert_eq!(saas.total_vms(AppId(0)), 5.);
}

#[test]
fn test_cost() {
    let global = GlobalParameters {
        horizon: 2,
        ..global(1000)
    };
    let mut problem = tenant(0, global, 0.3, 0.4, 2, &[40.]);
    let saas = problem.saas_mut();
    saas.set_on_flat(AppId(0), 2.);
    saas.set_on_demand(AppId(0), 1.);
    saas.set_on_spot(AppId(0), 3.);
    // 2 * (2 * 0.3 + 1 * 1 + 3 * 0.4)
    assert_float_eq(problem.cost(), 5.6, 1e-9);
}

#[test]
fn test_saturated_allocation() {
    let mut problem = tenant(0, global(1000), 0.5, 0.2, 0, &[40.]);
    problem.saas_mut().set_on_demand(AppId(0), 3.);
    let result = problem.response_times();
    assert!(matches!(result, Err(GameError::Saturated { tenant: 0, app: 0, .. })));
}

#[test]
// A negative fixed delay gives negative response times, which are rejected both when solving and when evaluating.
fn test_negative_response_time_rejected() {
    // utilization bound asks for 8 VMs, where the response time is -5 + 1 / (10 - 5)
    let global = GlobalParameters {
        rho: 0.5,
        ..global(1000)
    };
    let mut problem = SaasProblem::new(0, global, SaasParameters { q: 0.5, eta: 0.2, r: 0 });
    problem.add_application("app", vec![WebService::new(40., 40., -5., 10., 1.0, 0.)]);
    assert!(matches!(problem.solve(), Err(GameError::Saturated { tenant: 0, app: 0, .. })));

    problem.saas_mut().set_on_demand(AppId(0), 10.);
    assert!(matches!(
        problem.response_times(),
        Err(GameError::Saturated { tenant: 0, app: 0, .. })
    ));
    assert!(WebService::new(40., 40., -5., 10., 1.0, 0.).validate().is_err());
    assert!(web_service(40., 10.).validate().is_ok());
}

#[test]
fn test_web_service_response_time() {
    let ws = web_service(40., 10.);
    assert_float_eq(ws.throughput(), 40., 1e-9);
    assert_float_eq(ws.response_time(40., 8.).unwrap(), 0.3, 1e-9);
    assert_float_eq(ws.response_time(0., 0.).unwrap(), 0.2, 1e-9);
    assert_eq!(ws.response_time(40., 4.), None);

    let peaky = WebService::new(20., 10., 0.1, 10., 1.0, 0.5);
    assert_float_eq(peaky.throughput(), 15., 1e-9);
}
