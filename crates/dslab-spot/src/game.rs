//! Game between tenants competing for the provider's spot VMs.

use std::io::Write;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::Serialize;

use crate::application::AppId;
use crate::comm::{run_workers, Communicator};
use crate::error::{GameError, GameResult};
use crate::iaas::Iaas;
use crate::iaas_problem::IaasProblem;
use crate::protocol::{AppAllocation, Phase, ReportBody, RunStatus, SpotGrant, TenantReport, GRANT, REPORT, STATUS};
use crate::saas_problem::SaasProblem;
use crate::{log_debug, log_error, log_info, log_warn};

/// Returns indices of the tenants owned by the worker with the given rank (round-robin partition).
pub fn owned_tenants(rank: usize, size: usize, count: usize) -> impl Iterator<Item = usize> {
    (rank..count).step_by(size.max(1))
}

/// Statistics of the market clearing phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearingStats {
    /// Wall-clock time spent in the clearing loop.
    pub duration: Duration,
    /// Number of executed clearing rounds.
    pub rounds: usize,
    /// Spot VMs granted in the last round.
    pub granted: f64,
}

/// Final allocation of a tenant, used in result summaries.
#[derive(Debug, Clone, Serialize)]
pub struct TenantSummary {
    pub cost_threshold: f64,
    pub cost: f64,
    pub on_flat: f64,
    pub on_demand: f64,
    pub on_spot: f64,
}

/// The game: tenants, the provider, and the protocol solving it across a group of workers.
#[derive(Debug, Clone)]
pub struct Game {
    saass: Vec<SaasProblem>,
    iaas: IaasProblem,
}

impl Game {
    pub fn new(iaas: Iaas, saass: Vec<SaasProblem>) -> Self {
        Self {
            saass,
            iaas: IaasProblem::new(iaas),
        }
    }

    pub fn saass(&self) -> &[SaasProblem] {
        &self.saass
    }

    pub fn saass_mut(&mut self) -> &mut [SaasProblem] {
        &mut self.saass
    }

    pub fn iaas(&self) -> &IaasProblem {
        &self.iaas
    }

    /// Total number of flat-rate and on-demand VMs requested by all tenants.
    pub fn compute_total_n(&self) -> f64 {
        self.saass.iter().map(|saas| saas.fixed_demand()).sum()
    }

    /// Checks that the aggregate demand fits into the provider's capacity.
    pub fn admission_check(&self) -> GameResult<()> {
        let demand = self.compute_total_n();
        let capacity = self.iaas.iaas().capacity();
        if demand > capacity as f64 {
            return Err(GameError::InsufficientResources { demand, capacity });
        }
        Ok(())
    }

    /// Returns true if every tenant got all requested spot VMs.
    pub fn check_system(&self) -> bool {
        self.saass.iter().all(|saas| saas.check())
    }

    /// Raises the bids of unsatisfied tenants.
    ///
    /// Returns whether some bid changed, and for each tenant whether its bid changed.
    pub fn check_changes(&mut self) -> (bool, Vec<bool>) {
        let changes: Vec<bool> = self
            .saass
            .iter_mut()
            .map(|saas| {
                let current_price = saas.cost_threshold();
                if !saas.check() {
                    saas.set_cost_threshold();
                }
                current_price != saas.cost_threshold()
            })
            .collect();
        (changes.iter().any(|&changed| changed), changes)
    }

    pub fn reset_saass_given_on_spot(&mut self) {
        for saas in self.saass.iter_mut() {
            saas.reset_given_on_spot();
        }
    }

    /// Clears the spot market, raising bids of unsatisfied tenants until all of them are satisfied or no bid can
    /// grow any more.
    pub fn clear_market(&mut self) -> ClearingStats {
        let start = Instant::now();
        let mut granted = self.iaas.solve_greedy(&mut self.saass);
        let mut rounds = 1;
        let mut unsatisfied = !self.check_system();
        let mut changed = self.check_changes().0;
        while unsatisfied && changed {
            self.reset_saass_given_on_spot();
            granted = self.iaas.solve_greedy(&mut self.saass);
            rounds += 1;
            unsatisfied = !self.check_system();
            changed = self.check_changes().0;
        }
        ClearingStats {
            duration: start.elapsed(),
            rounds,
            granted,
        }
    }

    /// Solves the game as one worker of a group.
    ///
    /// Every worker of the group must call this method on an identical copy of the game. Worker `r` solves the
    /// tenants with indices `r, r + size, r + 2 * size, ...`, the worker with rank 0 also coordinates the group and
    /// clears the market. On success the coordinator holds the final allocation of all tenants and returns the
    /// clearing statistics, other workers return `None`.
    pub fn solve<C: Communicator>(&mut self, comm: &C) -> GameResult<Option<ClearingStats>> {
        let rank = comm.rank();
        let size = comm.size();
        let count = self.saass.len();
        let mut failure: Option<GameError> = None;

        // solve own tenants without spot limits
        for i in owned_tenants(rank, size, count) {
            let result = self.saass[i].solve();
            if result.is_ok() {
                self.saass[i].rounding();
            }
            failure = self.report(comm, i, Phase::Initial, result, failure)?;
        }
        log_debug!(comm, "solved {} tenants", owned_tenants(rank, size, count).count());

        let mut stats = None;
        if rank == 0 {
            for r in 1..size {
                for i in owned_tenants(r, size, count) {
                    let report: TenantReport = comm.recv_json(r, REPORT)?;
                    let result = self.apply_report(comm, r, i, Phase::Initial, report)?;
                    failure = failure.or(result);
                }
            }

            let failure = failure.take().or_else(|| self.admission_check().err());
            let status = if failure.is_some() {
                RunStatus::Abort
            } else {
                RunStatus::Continue
            };
            for r in 1..size {
                comm.send_json(r, STATUS, &status)?;
            }
            if let Some(err) = failure {
                log_error!(comm, "aborting: {}", err);
                return Err(err);
            }

            let clearing = self.clear_market();
            log_info!(
                comm,
                "market cleared in {} rounds ({:.2?}), {} spot VMs granted",
                clearing.rounds,
                clearing.duration,
                clearing.granted
            );
            stats = Some(clearing);

            for r in 1..size {
                for i in owned_tenants(r, size, count) {
                    let saas = self.saass[i].saas();
                    let grant = SpotGrant {
                        tenant: i,
                        given_on_spot: saas.app_ids().map(|app| saas.given_on_spot(app)).collect(),
                    };
                    comm.send_json(r, GRANT, &grant)?;
                }
            }
        } else {
            let status: RunStatus = comm.recv_json(0, STATUS)?;
            if status == RunStatus::Abort {
                log_warn!(comm, "run aborted by coordinator");
                return Err(GameError::Aborted { rank });
            }
            for i in owned_tenants(rank, size, count) {
                let grant: SpotGrant = comm.recv_json(0, GRANT)?;
                self.apply_grant(comm, i, grant)?;
            }
        }

        // solve own tenants again with the granted spot VMs
        let mut failure: Option<GameError> = None;
        for i in owned_tenants(rank, size, count) {
            let saas = &mut self.saass[i];
            saas.update();
            let result = saas.solve();
            saas.reset_desired();
            saas.rounding();
            failure = self.report(comm, i, Phase::Final, result, failure)?;
        }

        if rank == 0 {
            for r in 1..size {
                for i in owned_tenants(r, size, count) {
                    let report: TenantReport = comm.recv_json(r, REPORT)?;
                    let result = self.apply_report(comm, r, i, Phase::Final, report)?;
                    failure = failure.or(result);
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }

    /// Sends the allocation of an own tenant to the coordinator, or keeps the failure if this is the coordinator.
    fn report<C: Communicator>(
        &self,
        comm: &C,
        tenant: usize,
        phase: Phase,
        result: GameResult<()>,
        failure: Option<GameError>,
    ) -> GameResult<Option<GameError>> {
        let saas = self.saass[tenant].saas();
        let body = match &result {
            Ok(()) => ReportBody::Allocation(
                saas.app_ids()
                    .map(|app| AppAllocation {
                        on_flat: saas.on_flat(app),
                        on_demand: saas.on_demand(app),
                        spot: match phase {
                            Phase::Initial => saas.desired_on_spot(app),
                            Phase::Final => saas.on_spot(app),
                        },
                    })
                    .collect(),
            ),
            Err(err) => {
                log_warn!(comm, "tenant {}: {}", tenant, err);
                ReportBody::from_error(err)
            }
        };
        if comm.rank() != 0 {
            let report = TenantReport {
                tenant,
                phase,
                app_count: saas.size(),
                body,
            };
            comm.send_json(0, REPORT, &report)?;
        }
        Ok(failure.or(result.err()))
    }

    /// Stores a tenant allocation received from worker `src`.
    ///
    /// Returns an error if the report doesn't match the expected tenant and phase, and the tenant's failure if the
    /// worker couldn't solve it.
    fn apply_report<C: Communicator>(
        &mut self,
        comm: &C,
        src: usize,
        tenant: usize,
        phase: Phase,
        report: TenantReport,
    ) -> GameResult<Option<GameError>> {
        let protocol_error = |reason: String| GameError::Protocol {
            rank: comm.rank(),
            reason: format!("report from worker {}: {}", src, reason),
        };
        if report.tenant != tenant || report.phase != phase {
            return Err(protocol_error(format!(
                "expected tenant {} ({:?}), got tenant {} ({:?})",
                tenant, phase, report.tenant, report.phase
            )));
        }
        let saas = self.saass[tenant].saas_mut();
        match report.body {
            ReportBody::Allocation(rows) => {
                if report.app_count != saas.size() || rows.len() != saas.size() {
                    return Err(protocol_error(format!(
                        "tenant {} has {} applications, got {} ({} declared)",
                        tenant,
                        saas.size(),
                        rows.len(),
                        report.app_count
                    )));
                }
                for (idx, row) in rows.into_iter().enumerate() {
                    let app = AppId(idx);
                    saas.set_on_flat(app, row.on_flat);
                    saas.set_on_demand(app, row.on_demand);
                    match phase {
                        Phase::Initial => saas.set_desired_on_spot(app, row.spot),
                        Phase::Final => {
                            saas.set_on_spot(app, row.spot);
                            saas.set_desired_on_spot(app, 0.);
                        }
                    }
                }
                Ok(None)
            }
            ReportBody::Infeasible { app, service } => Ok(Some(GameError::InfeasibleSla { tenant, app, service })),
            ReportBody::Saturated {
                app,
                throughput,
                capacity,
            } => Ok(Some(GameError::Saturated {
                tenant,
                app,
                throughput,
                capacity,
            })),
            ReportBody::Failed { reason } => Err(protocol_error(reason)),
        }
    }

    fn apply_grant<C: Communicator>(&mut self, comm: &C, tenant: usize, grant: SpotGrant) -> GameResult<()> {
        let saas = self.saass[tenant].saas_mut();
        if grant.tenant != tenant || grant.given_on_spot.len() != saas.size() {
            return Err(GameError::Protocol {
                rank: comm.rank(),
                reason: format!(
                    "expected grant for tenant {} with {} applications, got tenant {} with {}",
                    tenant,
                    saas.size(),
                    grant.tenant,
                    grant.given_on_spot.len()
                ),
            });
        }
        for (idx, given) in grant.given_on_spot.into_iter().enumerate() {
            saas.set_given_on_spot(AppId(idx), given);
        }
        Ok(())
    }

    /// Solves the game with a group of `workers` in-process workers.
    ///
    /// On success the game holds the final allocation computed by the coordinator.
    pub fn run(&mut self, workers: usize) -> GameResult<ClearingStats> {
        if workers == 0 {
            return Err(GameError::Config("at least one worker is required".to_string()));
        }
        let template = self.clone();
        let results = run_workers(workers, move |comm| {
            let mut game = template.clone();
            let stats = game.solve(&comm)?;
            Ok(stats.map(|stats| (stats, game)))
        });

        // errors of other workers only echo the first real failure
        let mut coordinator = None;
        let mut secondary = None;
        for result in results {
            match result {
                Ok(Some(outcome)) => coordinator = Some(outcome),
                Ok(None) => {}
                Err(err) if err.is_secondary() => {
                    secondary.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }
        match (coordinator, secondary) {
            (_, Some(err)) => Err(err),
            (Some((stats, game)), None) => {
                *self = game;
                Ok(stats)
            }
            (None, None) => Err(GameError::Protocol {
                rank: 0,
                reason: "coordinator returned no result".to_string(),
            }),
        }
    }

    /// Per-tenant totals of the current allocation.
    pub fn summary(&self) -> IndexMap<String, TenantSummary> {
        self.saass
            .iter()
            .map(|problem| {
                let saas = problem.saas();
                let mut summary = TenantSummary {
                    cost_threshold: problem.cost_threshold(),
                    cost: problem.cost(),
                    on_flat: 0.,
                    on_demand: 0.,
                    on_spot: 0.,
                };
                for app in saas.app_ids() {
                    summary.on_flat += saas.on_flat(app);
                    summary.on_demand += saas.on_demand(app);
                    summary.on_spot += saas.on_spot(app);
                }
                (format!("saas_{}", problem.id()), summary)
            })
            .collect()
    }

    /// Writes the provider summary followed by the allocation of every tenant.
    pub fn print(&self, out: &mut dyn Write) -> std::io::Result<()> {
        self.iaas.print(out)?;
        for (i, saas) in self.saass.iter().enumerate() {
            writeln!(out, "\nSAAS_PROBLEM {}", i)?;
            saas.print(out)?;
        }
        Ok(())
    }
}
