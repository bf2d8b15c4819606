use std::collections::{BTreeMap, HashMap, HashSet};

use good_lp::ProblemVariables;

use crate::api::request_dto::{OptimizeInSessionRequest, OptimizeRequest};
use crate::api::response_dto::{InitialAssignmentRow, OptimizeResponse, OptimizedResultRow, SessionInfo};
use crate::config::RosterEngineConfig;
use crate::domain::analyzer::{self, InfeasibilityClass};
use crate::domain::config_interval::ConfigurationInterval;
use crate::domain::constraints::{self, ModelContext};
use crate::domain::controller::{Controller, Role, ShiftCode};
use crate::domain::external::{DataSource, InitialScheduleRow};
use crate::domain::ids::ControllerId;
use crate::domain::input_staging::{self, StagingFilters};
use crate::domain::objective;
use crate::domain::required_sectors::RequiredSectorMap;
use crate::domain::run::{OptimizationRun, OptimizedCell, RunParameters, SolutionStatus, Statistics};
use crate::domain::session::SessionStore;
use crate::domain::shift_row::ShiftRow;
use crate::domain::solver::{self, AssignmentGrid, SolverParams};
use crate::domain::time_slot::{self, TimeSlot, MORNING_TAIL_TRIM_SLOTS};
use crate::error::{Error, Result};

fn validate(req: &OptimizeRequest) -> Result<()> {
    if req.date.trim().is_empty() {
        return Err(Error::Validation("date must not be empty".into()));
    }
    if req.shift.trim().is_empty() {
        return Err(Error::Validation("shift label must not be empty".into()));
    }
    if req.max_execution_seconds == 0 {
        return Err(Error::Validation("maxExecutionSeconds must be positive".into()));
    }
    Ok(())
}

fn rows_to_controllers_and_shift_rows(rows: &[InitialScheduleRow], licensed: &HashSet<ControllerId>) -> (Vec<Controller>, Vec<ShiftRow>) {
    let mut controllers: Vec<Controller> = Vec::new();
    let mut seen: HashSet<ControllerId> = HashSet::new();
    let mut shift_rows = Vec::with_capacity(rows.len());

    for row in rows {
        if seen.insert(row.controller_id.clone()) {
            controllers.push(Controller {
                id: row.controller_id.clone(),
                display_name: row.display_name.clone(),
                role: row.role,
                shift_code: row.shift_code,
                has_license: licensed.contains(&row.controller_id),
                shift_start: row.shift_start,
                shift_end: row.shift_end,
                vreme_start: row.vreme_start,
                ordering_index: row.ordering_index,
                partner_code: row.partner_code.clone(),
            });
        }

        shift_rows.push(ShiftRow {
            controller_id: row.controller_id.clone(),
            date: row.date.clone(),
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            shift_code: row.shift_code,
            pinned_sector: row.pinned_sector.clone(),
            release_window: row.release_window,
        });
    }

    (controllers, shift_rows)
}

/// Renders the "TX:<codes> | LU:<codes>" per-slot label (spec §6) from
/// whichever configuration intervals are active at that slot.
fn configuration_labels(required: &RequiredSectorMap, configs: &[ConfigurationInterval], slots: &[TimeSlot]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for slot in slots {
        if required.at(slot.index).is_empty() {
            continue;
        }
        let mut by_cluster: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (cluster, code) in RequiredSectorMap::labels_at(configs, slot.start) {
            by_cluster.entry(cluster.to_string()).or_default().push(code);
        }
        let label = by_cluster.iter().map(|(cluster, codes)| format!("{cluster}:{}", codes.join(","))).collect::<Vec<_>>().join(" | ");
        out.insert(format!("{}|{}", slot.start, slot.end), label);
    }
    out
}

fn is_trimmed_tail_slot(controller: &Controller, slot: &TimeSlot, total_slots: usize) -> bool {
    controller.shift_code == ShiftCode::Morning && total_slots >= MORNING_TAIL_TRIM_SLOTS && slot.index + MORNING_TAIL_TRIM_SLOTS >= total_slots
}

struct PreparedModel {
    controllers: Vec<Controller>,
    slots: Vec<TimeSlot>,
    required: RequiredSectorMap,
    staged: input_staging::StagedInput,
    shift_rows: Vec<ShiftRow>,
    config_intervals: Vec<ConfigurationInterval>,
    date_by_controller: HashMap<ControllerId, String>,
}

async fn prepare(data_source: &dyn DataSource, config: &RosterEngineConfig, req: &OptimizeRequest) -> Result<PreparedModel> {
    validate(req)?;

    let (start, end) = data_source
        .shift_duration(&req.date, &req.shift)
        .await?
        .ok_or_else(|| Error::Validation(format!("unknown shift '{}' on {}", req.shift, req.date)))?;

    let raw_rows = data_source.initial_schedule(start, end).await?;
    if raw_rows.is_empty() {
        return Err(Error::Validation("no controllers scheduled for this shift".into()));
    }

    let date_by_controller: HashMap<ControllerId, String> = raw_rows.iter().map(|r| (r.controller_id.clone(), r.date.clone())).collect();

    let licensed: HashSet<ControllerId> = data_source.licensed_controllers().await?.into_iter().collect();
    let (mut controllers, shift_rows) = rows_to_controllers_and_shift_rows(&raw_rows, &licensed);

    let config_intervals = data_source.configuration_timeline(start, end).await?;
    let slots = time_slot::build_slots(start, end, config.slot_width_seconds);
    let required = RequiredSectorMap::build(&slots, &config_intervals);

    let role_map: HashMap<ControllerId, Role> = controllers.iter().map(|c| (c.id.clone(), c.role)).collect();
    let filters = StagingFilters {
        role_whitelist: req.workplace_whitelist.clone(),
        controller_whitelist: req.controller_whitelist.clone(),
        use_manual_assignments: req.use_manual_assignments,
    };
    let staged = input_staging::stage_input(shift_rows.clone(), &role_map, &filters, &slots, &required);

    let staged_ids: HashSet<ControllerId> = staged.rows.iter().map(|r| r.controller_id.clone()).collect();
    controllers.retain(|c| staged_ids.contains(&c.id));
    if controllers.is_empty() {
        return Err(Error::Validation("no controllers remain after applying the selected filters".into()));
    }

    Ok(PreparedModel { controllers, slots, required, staged, shift_rows, config_intervals, date_by_controller })
}

/// Walks the solved grid into one `OptimizedCell` per `(controller,
/// in-shift slot)`, tagging a non-pinned trimmed-tail slot so the caller
/// can render it distinctly from a genuine on-duty break (spec §4.7).
fn build_result_cells(model: &PreparedModel, assignment: &AssignmentGrid) -> Vec<OptimizedCell> {
    let total_slots = model.slots.len();
    let mut cells = Vec::new();

    for (controller_idx, controller) in model.controllers.iter().enumerate() {
        let date = model.date_by_controller.get(&controller.id).cloned().unwrap_or_default();

        for slot in &model.slots {
            if slot.start < controller.shift_start || slot.start >= controller.shift_end {
                continue;
            }

            let pin = model.staged.pin_at(&controller.id, slot.index);
            let sector = assignment.sector_at(controller_idx, slot.index).cloned();
            let trimmed_tail_marker = sector.is_none() && pin.is_none() && is_trimmed_tail_slot(controller, slot, total_slots);

            cells.push(OptimizedCell {
                controller_id: controller.id.clone(),
                display_name: controller.display_name.clone(),
                shift_code: controller.shift_code,
                date: date.clone(),
                slot_from: slot.start,
                slot_to: slot.end,
                sector,
                role: controller.role,
                flag: model.staged.is_released(&controller.id, slot).then(|| "S".to_string()),
                ordering_index: controller.ordering_index,
                partner_code: controller.partner_code.clone(),
                vreme_start: controller.vreme_start,
                trimmed_tail_marker,
            });
        }
    }

    cells
}

fn build_initial_assignments(model: &PreparedModel) -> Vec<InitialAssignmentRow> {
    model
        .shift_rows
        .iter()
        .filter_map(|row| {
            let controller = model.controllers.iter().find(|c| c.id == row.controller_id)?;
            Some(InitialAssignmentRow {
                controller_id: row.controller_id.clone(),
                display_name: controller.display_name.clone(),
                shift_code: row.shift_code,
                date: row.date.clone(),
                slot_from: row.shift_start,
                slot_to: row.shift_end,
                sector: row.pinned_sector.as_ref().and_then(|p| p.sector().cloned()),
                role: controller.role,
                flag: row.release_window.map(|_| "S".to_string()),
                ordering_index: controller.ordering_index,
                partner_code: controller.partner_code.clone(),
            })
        })
        .collect()
}

fn degraded_statistics(model: &PreparedModel, status: SolutionStatus) -> Statistics {
    let max_required = model.slots.iter().map(|s| model.required.at(s.index).len()).max().unwrap_or(0);
    Statistics {
        success_rate: 0.0,
        slots_with_shortage: model.slots.len() as u32,
        slots_with_excess: 0,
        missing_executors: max_required as u32,
        max_work_hour_difference: 0.0,
        break_compliance: 0.0,
        rotation_compliance: 0.0,
        employees_with_shortage: model.controllers.len() as u32,
        solution_status: status,
    }
}

fn classification_label(class: &InfeasibilityClass) -> String {
    match class {
        InfeasibilityClass::GlobalCapacity { max_required, total_controllers } => format!("fundamental under-capacity: {total_controllers} controllers, {max_required} required at peak"),
        InfeasibilityClass::PerSlotCapacity { slots } => format!("per-slot capacity deficit at {} slot(s)", slots.len()),
        InfeasibilityClass::FlagSExcess { slots } => format!("flag-S releases drive the deficit at {} slot(s)", slots.len()),
        InfeasibilityClass::TimeLimitExhausted => "time budget exhausted before a verdict was reached".to_string(),
    }
}

/// Resolves the seed actually handed to the solver: an explicit `seed`
/// always wins; otherwise `use_randomization` draws a fresh one so each
/// call into the same session explores a different region of the
/// search space (spec §6 "use-randomization flag", §4.9 multi-run
/// exploration), and its absence falls back to the solver's own
/// default (no seed set at all).
fn resolve_seed(req: &OptimizeRequest) -> Option<u64> {
    if req.seed.is_some() {
        return req.seed;
    }
    if req.use_randomization {
        use rand::Rng;
        return Some(rand::rng().random());
    }
    None
}

fn default_run_parameters(req: &OptimizeRequest, resolved_seed: Option<u64>) -> RunParameters {
    RunParameters {
        max_execution_seconds: req.max_execution_seconds,
        max_optimal_solutions: req.max_optimal_solutions,
        max_zero_shortage: req.max_zero_shortage,
        use_lns: req.use_lns,
        use_manual_assignments: req.use_manual_assignments,
        use_randomization: req.use_randomization,
        seed: resolved_seed,
    }
}

/// Runs C3–C8 for a request and returns the completed run plus enough
/// of the prepared model to render the response (spec §2 end-to-end
/// flow).
async fn execute(data_source: &dyn DataSource, config: &RosterEngineConfig, req: &OptimizeRequest) -> Result<(OptimizationRun, PreparedModel)> {
    let model = prepare(data_source, config, req).await?;

    let mut problem_vars = ProblemVariables::new();
    let var_index = crate::domain::variables::VariableIndex::build(&mut problem_vars, &model.controllers, model.slots.len(), &model.required);
    let ctx = ModelContext::build(&model.controllers, &model.slots, &model.required, &model.staged, &var_index);

    let capacity_warnings = analyzer::pre_solve_check(&ctx);

    let (mut all_constraints, constraint_warnings) = constraints::build_constraints(&ctx);
    for w in &constraint_warnings {
        log::warn!("{:?}: {}", w.constraint, w.message);
    }

    let objective_build = objective::build_objective(&mut problem_vars, &ctx, &config.weights, req.use_manual_assignments);
    all_constraints.extend(objective_build.aux_constraints);

    let resolved_seed = resolve_seed(req);
    let params = SolverParams { max_execution_seconds: req.max_execution_seconds, workers: config.solver.workers, relative_gap: config.solver.relative_gap, seed: resolved_seed };
    let outcome = solver::solve(problem_vars, all_constraints, objective_build.expression, &params, &ctx)?;

    let parameters = default_run_parameters(req, resolved_seed);

    let run = if let (Some(assignment), true) = (&outcome.assignment, outcome.status.is_usable()) {
        let (statistics, shortage_by_slot) = solver::compute_statistics(&ctx, assignment, outcome.status, config.slot_width_seconds);
        OptimizationRun {
            run_id: 0,
            status: outcome.status,
            objective_value: outcome.objective_value,
            wall_time_seconds: outcome.wall_time_seconds,
            results: build_result_cells(&model, assignment),
            shortage_by_slot,
            statistics,
            description: String::new(),
            parameters,
        }
    } else {
        let classification = analyzer::classify_infeasibility(&ctx, outcome.status, &capacity_warnings);
        log::warn!("solve did not produce a usable solution: {}", classification_label(&classification));
        OptimizationRun {
            run_id: 0,
            status: outcome.status,
            objective_value: None,
            wall_time_seconds: outcome.wall_time_seconds,
            results: Vec::new(),
            shortage_by_slot: BTreeMap::new(),
            statistics: degraded_statistics(&model, outcome.status),
            description: String::new(),
            parameters,
        }
    };

    Ok((run, model))
}

fn run_to_response(run: &OptimizationRun, model: &PreparedModel, session: Option<SessionInfo>) -> OptimizeResponse {
    let optimized_results = run
        .results
        .iter()
        .map(|c| OptimizedResultRow {
            controller_id: c.controller_id.clone(),
            display_name: c.display_name.clone(),
            shift_code: c.shift_code,
            date: c.date.clone(),
            slot_from: c.slot_from,
            slot_to: c.slot_to,
            sector: c.sector.clone(),
            role: c.role,
            flag: c.flag.clone(),
            ordering_index: c.ordering_index,
            partner_code: c.partner_code.clone(),
            vreme_start: c.vreme_start,
        })
        .collect();

    OptimizeResponse {
        optimized_results,
        initial_assignments: build_initial_assignments(model),
        configuration_labels: configuration_labels(&model.required, &model.config_intervals, &model.slots),
        shortage_by_slot: run.shortage_by_slot.clone(),
        statistics: run.statistics.clone(),
        status: run.status,
        session,
    }
}

/// Public entry point for a fresh, non-session-scoped optimization
/// (spec §6). Never panics: unexpected failures surface as `Error`.
pub async fn optimize(data_source: &dyn DataSource, config: &RosterEngineConfig, req: OptimizeRequest) -> Result<OptimizeResponse> {
    let (run, model) = execute(data_source, config, &req).await?;
    Ok(run_to_response(&run, &model, None))
}

/// Public entry point for a session-scoped optimization: the new run is
/// appended to the session and the response carries navigation info
/// (spec §6, §4.9).
pub async fn optimize_in_session(data_source: &dyn DataSource, config: &RosterEngineConfig, sessions: &SessionStore, req: OptimizeInSessionRequest) -> Result<OptimizeResponse> {
    let (run, model) = execute(data_source, config, &req.request).await?;
    sessions.add_run(&req.session_id, run.clone(), req.description)?;
    let navigation = sessions.navigation_info(&req.session_id)?;

    Ok(run_to_response(&run, &model, Some(SessionInfo { session_id: req.session_id, navigation })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> OptimizeRequest {
        OptimizeRequest {
            date: "2026-07-27".into(),
            shift: "J".into(),
            max_execution_seconds: 10,
            max_optimal_solutions: None,
            max_zero_shortage: None,
            use_lns: false,
            workplace_whitelist: None,
            controller_whitelist: None,
            use_manual_assignments: true,
            seed: None,
            use_randomization: false,
        }
    }

    #[test]
    fn an_explicit_seed_always_wins_over_randomization() {
        let mut req = base_request();
        req.seed = Some(7);
        req.use_randomization = true;
        assert_eq!(resolve_seed(&req), Some(7));
    }

    #[test]
    fn randomization_without_an_explicit_seed_draws_one() {
        let mut req = base_request();
        req.use_randomization = true;
        assert!(resolve_seed(&req).is_some());
    }

    #[test]
    fn neither_seed_nor_randomization_resolves_to_none() {
        let req = base_request();
        assert_eq!(resolve_seed(&req), None);
    }
}
