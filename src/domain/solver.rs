use std::collections::BTreeMap;
use std::time::Instant;

use good_lp::{Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, highs};

use crate::domain::constraints::ModelContext;
use crate::domain::run::{SolutionStatus, Statistics};
use crate::domain::sector::SectorPosition;
use crate::error::{Error, Result};

/// Tracing target for solver-run analytics, mirrored on the dedicated
/// `ANALYTICS_TARGET` the upstream grid scheduler logs AcI operations
/// under so a `RUST_LOG` filter can select run telemetry independently
/// of ordinary application logging.
const ANALYTICS_TARGET: &str = "atc_roster_engine::analytics";

/// The four knobs spec §4.7 asks of the external solver. `Solver` is
/// written against exactly these so a different backend can be swapped
/// in without C1–C6 changing (spec §4.7 expansion).
#[derive(Debug, Clone, Copy)]
pub struct SolverParams {
    pub max_execution_seconds: u64,
    pub workers: u32,
    pub relative_gap: f64,
    pub seed: Option<u64>,
}

/// `assignment[controller_idx][slot_idx]` — `None` means break.
#[derive(Debug, Clone)]
pub struct AssignmentGrid {
    pub per_controller_slot: Vec<Vec<Option<SectorPosition>>>,
}

impl AssignmentGrid {
    pub fn sector_at(&self, controller_idx: usize, slot_idx: usize) -> Option<&SectorPosition> {
        self.per_controller_slot.get(controller_idx)?.get(slot_idx)?.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub wall_time_seconds: f64,
    pub assignment: Option<AssignmentGrid>,
}

/// Hands the assembled 0/1 program to HiGHS through `good_lp` and
/// recovers the per-`(controller, slot)` assignment from the returned
/// variable values.
pub fn solve(vars: ProblemVariables, constraints: Vec<Constraint>, objective: Expression, params: &SolverParams, ctx: &ModelContext) -> Result<SolveOutcome> {
    let objective_for_eval = objective.clone();
    let mut problem = vars.minimise(objective).using(highs);
    for c in constraints {
        problem = problem.with(c);
    }

    problem.set_time_limit(params.max_execution_seconds as f64);
    problem.set_threads(params.workers);
    problem.set_mip_rel_gap(params.relative_gap);
    if let Some(seed) = params.seed {
        problem.set_random_seed(seed);
    }

    let started = Instant::now();
    let result = problem.solve();
    let wall_time_seconds = started.elapsed().as_secs_f64();

    let outcome = match result {
        Ok(solution) => {
            let assignment = recover_assignment(&solution, ctx);
            let objective_value = Some(solution.eval(&objective_for_eval));
            Ok(SolveOutcome { status: SolutionStatus::Optimal, objective_value, wall_time_seconds, assignment: Some(assignment) })
        }
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome { status: SolutionStatus::Infeasible, objective_value: None, wall_time_seconds, assignment: None }),
        Err(ResolutionError::Unbounded) => Err(Error::Solver { status: "unbounded".into(), detail: "objective is unbounded; check weight signs".into() }),
        Err(other) => Ok(SolveOutcome { status: SolutionStatus::Unknown, objective_value: None, wall_time_seconds, assignment: None }.with_detail(other.to_string())),
    };

    match &outcome {
        Ok(o) => tracing::info!(
            target: ANALYTICS_TARGET,
            Status = ?o.status,
            ObjectiveValue = ?o.objective_value,
            WallTimeSeconds = wall_time_seconds,
            Workers = params.workers,
            Seed = ?params.seed,
            "solver run finished",
        ),
        Err(e) => tracing::warn!(
            target: ANALYTICS_TARGET,
            WallTimeSeconds = wall_time_seconds,
            Error = %e,
            "solver run failed",
        ),
    }

    outcome
}

impl SolveOutcome {
    fn with_detail(self, detail: String) -> Self {
        log::warn!("solver returned unknown status: {detail}");
        self
    }
}

fn recover_assignment(solution: &impl Solution, ctx: &ModelContext) -> AssignmentGrid {
    let num_controllers = ctx.vars.num_controllers();
    let num_slots = ctx.vars.num_slots();
    let mut per_controller_slot = vec![vec![None; num_slots]; num_controllers];

    for controller_idx in 0..num_controllers {
        for slot in ctx.slots {
            let break_value = solution.value(ctx.vars.break_var(controller_idx, slot.index));
            if break_value > 0.5 {
                continue;
            }
            for sector in ctx.required.at(slot.index) {
                let Some(v) = ctx.vars.sector_var_for(slot.index, sector, controller_idx) else { continue };
                if solution.value(v) > 0.5 {
                    per_controller_slot[controller_idx][slot.index] = Some(sector.clone());
                    break;
                }
            }
        }
    }

    AssignmentGrid { per_controller_slot }
}

/// Computes the §4.7 statistics block plus the per-slot shortage map
/// keyed `"{from}|{to}"` (spec §6), from a completed assignment grid.
pub fn compute_statistics(ctx: &ModelContext, assignment: &AssignmentGrid, status: SolutionStatus, slot_width_seconds: i64) -> (Statistics, BTreeMap<String, u32>) {
    let mut shortage_by_slot = BTreeMap::new();
    let mut total_required = 0u32;
    let mut total_covered = 0u32;
    let mut slots_with_shortage = 0u32;
    let mut slots_with_excess = 0u32;
    let mut missing_executors = 0u32;

    for slot in ctx.slots {
        let mut uncovered_here = 0u32;
        let mut excess_here = false;

        for sector in ctx.required.at(slot.index) {
            total_required += 1;
            let covering = (0..ctx.vars.num_controllers()).filter(|&c| ctx.on_duty(c, slot.index) && assignment.sector_at(c, slot.index) == Some(sector)).count();
            if covering == 0 {
                uncovered_here += 1;
            } else {
                total_covered += 1;
            }
            if covering > 1 {
                excess_here = true;
            }
        }

        if uncovered_here > 0 {
            slots_with_shortage += 1;
            shortage_by_slot.insert(format!("{}|{}", slot.start, slot.end), uncovered_here);
        }
        if excess_here {
            slots_with_excess += 1;
        }
        missing_executors = missing_executors.max(uncovered_here);
    }

    let success_rate = if total_required > 0 { f64::from(total_covered) / f64::from(total_required) * 100.0 } else { 100.0 };

    let slot_minutes = slot_width_seconds as f64 / 60.0;
    let mut working_minutes = Vec::with_capacity(ctx.vars.num_controllers());
    let mut total_duty_slots = 0u32;
    let mut total_break_slots = 0u32;
    let mut e_fractions = Vec::new();

    for controller_idx in 0..ctx.vars.num_controllers() {
        let mut worked_slots = 0u32;
        let mut e_slots = 0u32;
        for &slot_idx in &ctx.duty_slots[controller_idx] {
            total_duty_slots += 1;
            match assignment.sector_at(controller_idx, slot_idx) {
                Some(sector) => {
                    worked_slots += 1;
                    if sector.0.trim().ends_with('E') {
                        e_slots += 1;
                    }
                }
                None => total_break_slots += 1,
            }
        }
        working_minutes.push(f64::from(worked_slots) * slot_minutes);
        if worked_slots > 0 {
            e_fractions.push(f64::from(e_slots) / f64::from(worked_slots));
        }
    }

    let max_work_hour_difference = match (working_minutes.iter().cloned().fold(f64::MIN, f64::max), working_minutes.iter().cloned().fold(f64::MAX, f64::min)) {
        (max, min) if max >= min => (max - min) / 60.0,
        _ => 0.0,
    };

    let rest_fraction = if total_duty_slots > 0 { f64::from(total_break_slots) / f64::from(total_duty_slots) } else { 0.0 };
    let break_compliance = ((rest_fraction / 0.25) * 100.0).min(100.0);

    let rotation_compliance = if e_fractions.is_empty() {
        0.0
    } else {
        let compliant = e_fractions.iter().filter(|&&f| (0.4..=0.6).contains(&f)).count();
        f64::from(compliant as u32) / f64::from(e_fractions.len() as u32) * 100.0
    };

    let average_minutes = if working_minutes.is_empty() { 0.0 } else { working_minutes.iter().sum::<f64>() / working_minutes.len() as f64 };
    let employees_with_shortage = working_minutes.iter().filter(|&&m| m < 0.75 * average_minutes).count() as u32;

    let statistics = Statistics {
        success_rate,
        slots_with_shortage,
        slots_with_excess,
        missing_executors,
        max_work_hour_difference,
        break_compliance,
        rotation_compliance,
        employees_with_shortage,
        solution_status: status,
    };

    (statistics, shortage_by_slot)
}
