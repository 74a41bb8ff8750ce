//! Parameter tables.
//!
//! A problem instance can be stored as three CSV tables: global parameters (a single row), per-tenant parameters,
//! and per-web-service parameters. Rows of the last two tables carry tenant, application and web service indices,
//! which must be contiguous and appear in order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::game::Game;
use crate::iaas::Iaas;
use crate::parameters::{GlobalParameters, SaasParameters};
use crate::saas_problem::SaasProblem;
use crate::web_service::WebService;

pub const GLOBAL_FILE: &str = "global_parameters.csv";
pub const SAAS_FILE: &str = "SaaSs_parameters.csv";
pub const WS_FILE: &str = "WSs_parameters.csv";

#[derive(Debug, Serialize, Deserialize)]
struct SaasRow {
    q_j: f64,
    eta_j: f64,
    #[serde(rename = "R_j")]
    r_j: u32,
    #[serde(rename = "SaaS_index")]
    saas_index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct WsRow {
    #[serde(rename = "LAMBDA_a_w")]
    max_arrival_rate: f64,
    #[serde(rename = "lambda_a_w")]
    arrival_rate: f64,
    #[serde(rename = "D_a_w")]
    delay: f64,
    #[serde(rename = "mu_a_w")]
    service_rate: f64,
    #[serde(rename = "R_bar_a_w")]
    max_response_time: f64,
    #[serde(rename = "nu_a_w")]
    demand_weight: f64,
    #[serde(rename = "SaaS_index")]
    saas_index: usize,
    app_index: usize,
    #[serde(rename = "WS_index")]
    ws_index: usize,
}

/// Writes the parameters of the game into the three tables in the given directory.
pub fn write_tables(game: &Game, dir: &Path) -> GameResult<()> {
    std::fs::create_dir_all(dir)?;
    let global = game
        .saass()
        .first()
        .map(|saas| *saas.global())
        .unwrap_or_else(|| GlobalParameters {
            capacity: game.iaas().iaas().capacity(),
            omega: game.iaas().iaas().omega(),
            ..GlobalParameters::default()
        });

    let mut wtr = csv::Writer::from_path(dir.join(GLOBAL_FILE))?;
    wtr.serialize(global)?;
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(dir.join(SAAS_FILE))?;
    for (saas_index, saas) in game.saass().iter().enumerate() {
        let params = saas.params();
        wtr.serialize(SaasRow {
            q_j: params.q,
            eta_j: params.eta,
            r_j: params.r,
            saas_index,
        })?;
    }
    wtr.flush()?;

    let mut wtr = csv::Writer::from_path(dir.join(WS_FILE))?;
    for (saas_index, saas) in game.saass().iter().enumerate() {
        for (app_index, app) in saas.saas().applications().iter().enumerate() {
            for (ws_index, ws) in app.web_services().iter().enumerate() {
                wtr.serialize(WsRow {
                    max_arrival_rate: ws.max_arrival_rate,
                    arrival_rate: ws.arrival_rate,
                    delay: ws.delay,
                    service_rate: ws.service_rate,
                    max_response_time: ws.max_response_time,
                    demand_weight: ws.demand_weight,
                    saas_index,
                    app_index,
                    ws_index,
                })?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Loads a game from the three tables in the given directory.
pub fn read_tables_from_dir(dir: &Path) -> GameResult<Game> {
    read_tables(&dir.join(GLOBAL_FILE), &dir.join(SAAS_FILE), &dir.join(WS_FILE))
}

/// Loads a game from the three tables.
pub fn read_tables(global_file: &Path, saas_file: &Path, ws_file: &Path) -> GameResult<Game> {
    let mut rdr = reader(global_file)?;
    let global: GlobalParameters = match rdr.deserialize::<GlobalParameters>().next() {
        Some(row) => row?,
        None => return Err(table_error(global_file, "no global parameters")),
    };
    global.validate().map_err(|err| row_error(global_file, 0, err))?;

    let mut saass = Vec::new();
    for (line, row) in reader(saas_file)?.deserialize::<SaasRow>().enumerate() {
        let row = row?;
        if row.saas_index != line {
            return Err(table_error(
                saas_file,
                &format!("row {}: expected SaaS_index {}, got {}", line, line, row.saas_index),
            ));
        }
        let params = SaasParameters {
            q: row.q_j,
            eta: row.eta_j,
            r: row.r_j,
        };
        params.validate().map_err(|err| row_error(saas_file, line, err))?;
        saass.push(SaasProblem::new(line, global, params));
    }

    let mut apps: Vec<Vec<Vec<WebService>>> = vec![Vec::new(); saass.len()];
    let mut last_saas = 0;
    for (line, row) in reader(ws_file)?.deserialize::<WsRow>().enumerate() {
        let row = row?;
        if row.saas_index >= saass.len() || row.saas_index < last_saas {
            return Err(table_error(
                ws_file,
                &format!("row {}: unexpected SaaS_index {}", line, row.saas_index),
            ));
        }
        last_saas = row.saas_index;
        let tenant_apps = &mut apps[row.saas_index];
        if row.app_index == tenant_apps.len() && row.ws_index == 0 {
            tenant_apps.push(Vec::new());
        }
        let expected_ws = tenant_apps.get(row.app_index).map(|services| services.len());
        if row.app_index + 1 != tenant_apps.len() || expected_ws != Some(row.ws_index) {
            return Err(table_error(
                ws_file,
                &format!(
                    "row {}: unexpected app_index {} / WS_index {} for SaaS {}",
                    line, row.app_index, row.ws_index, row.saas_index
                ),
            ));
        }
        let ws = WebService::new(
            row.max_arrival_rate,
            row.arrival_rate,
            row.delay,
            row.service_rate,
            row.max_response_time,
            row.demand_weight,
        );
        ws.validate().map_err(|err| row_error(ws_file, line, err))?;
        tenant_apps[row.app_index].push(ws);
    }

    for (saas, tenant_apps) in saass.iter_mut().zip(apps) {
        for (a, web_services) in tenant_apps.into_iter().enumerate() {
            saas.add_application(&format!("app_{}", a), web_services);
        }
    }
    Ok(Game::new(Iaas::new(global.capacity, global.omega), saass))
}

fn reader(path: &Path) -> GameResult<csv::Reader<std::fs::File>> {
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?)
}

fn table_error(path: &Path, reason: &str) -> GameError {
    GameError::Config(format!("{}: {}", path.display(), reason))
}

fn row_error(path: &Path, line: usize, err: GameError) -> GameError {
    match err {
        GameError::Config(reason) => table_error(path, &format!("row {}: {}", line, reason)),
        other => other,
    }
}
