use good_lp::{Expression, Variable, ProblemVariables, variable, constraint, Constraint};

use crate::config::ObjectiveWeights;
use crate::domain::constraints::ModelContext;
use crate::domain::controller::{Role, ShiftCode};
use crate::domain::sector::SectorPosition;

/// Accumulates the minimized objective expression plus the auxiliary
/// linking constraints each indicator term needs, so the caller can fold
/// both into the same model in one pass.
pub struct ObjectiveBuild {
    pub expression: Expression,
    pub aux_constraints: Vec<Constraint>,
}

/// Introduces a fresh non-negative continuous variable pinned from below
/// to `expr - threshold` — the standard trick for a *penalty* indicator:
/// minimization alone drives it to `max(0, expr - threshold)` without
/// needing an upper-bound constraint.
fn penalty_indicator(vars: &mut ProblemVariables, out: &mut Vec<Constraint>, expr: Expression, threshold: f64) -> Variable {
    let aux = vars.add(variable().min(0.0));
    out.push(constraint!(aux >= expr - threshold));
    aux
}

/// Introduces a fresh variable in `[0, 1]` pinned from above by every
/// component — the dual trick for a *bonus* indicator: a negative
/// weight makes minimization pull it up to `min(components)` without
/// needing a lower-bound constraint.
fn bonus_indicator(vars: &mut ProblemVariables, out: &mut Vec<Constraint>, components: &[Expression]) -> Variable {
    let aux = vars.add(variable().min(0.0).max(1.0));
    for c in components {
        out.push(constraint!(aux <= c.clone()));
    }
    aux
}

fn ep_suffix(sector: &SectorPosition) -> Option<char> {
    let trimmed = sector.0.trim();
    let last = trimmed.chars().last()?;
    if last == 'E' || last == 'P' { Some(last) } else { None }
}

fn alternate_label(sector: &SectorPosition, suffix: char) -> SectorPosition {
    let base = sector.base_prefix().to_string();
    let alt = if suffix == 'E' { 'P' } else { 'E' };
    SectorPosition::new(format!("{base}{alt}"))
}

/// Builds the full weighted soft-term objective from spec §4.6, folding
/// in the auxiliary variables every non-linear indicator term needs.
pub fn build_objective(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, use_manual_assignments: bool) -> ObjectiveBuild {
    let mut expr = Expression::from(0.0);
    let mut aux = Vec::new();

    uncovered_sector(vars, ctx, weights, &mut expr, &mut aux);
    role_usage(ctx, weights, &mut expr);
    last_hour_work(ctx, weights, use_manual_assignments, &mut expr);
    short_break_after_long_block(vars, ctx, weights, &mut expr, &mut aux);
    rotation(vars, ctx, weights, &mut expr, &mut aux);
    sector_continuity_bonus(vars, ctx, weights, &mut expr, &mut aux);
    excess_controller(vars, ctx, weights, &mut expr, &mut aux);
    night_shift_terms(vars, ctx, weights, &mut expr, &mut aux);
    fmp_terms(ctx, weights, &mut expr);
    work_block_shape(vars, ctx, weights, &mut expr, &mut aux);

    ObjectiveBuild { expression: expr, aux_constraints: aux }
}

fn working_expr(ctx: &ModelContext, controller_idx: usize, slot_idx: usize) -> Expression {
    let mut e = Expression::from(0.0);
    for v in ctx.vars.sector_vars_for_controller_slot(slot_idx, controller_idx) {
        e = e + v;
    }
    e
}

/// +50 000 000 — a required sector with nobody assigned, counted only
/// among controllers who are actually eligible to cover it.
fn uncovered_sector(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for slot in ctx.slots {
        for sector in ctx.required.at(slot.index) {
            let Some(sector_idx) = ctx.vars.sector_index(slot.index, sector) else { continue };
            let mut covered = Expression::from(0.0);
            for (controller_idx, _c) in ctx.controllers.iter().enumerate() {
                if ctx.on_duty(controller_idx, slot.index) {
                    covered = covered + ctx.vars.sector_var(slot.index, sector_idx, controller_idx);
                }
            }
            let missing = penalty_indicator(vars, aux, Expression::from(0.0) - covered, -1.0);
            *expr = expr.clone() + missing * weights.uncovered_sector;
        }
    }
}

/// +50 shift-leader working, +30 supervisor working — direct linear
/// terms on the existing decision variables.
fn role_usage(ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression) {
    for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
        let weight = match controller.role {
            Role::ShiftLeader => weights.shift_leader_working,
            Role::Supervisor => weights.supervisor_working,
            _ => continue,
        };
        for slot in ctx.slots {
            if !ctx.in_shift[controller_idx][slot.index] {
                continue;
            }
            *expr = expr.clone() + working_expr(ctx, controller_idx, slot.index) * weight;
        }
    }
}

/// +500 — working in the last two slots of one's own shift; skipped for
/// a slot that is itself a manual pin (Open Question 3).
fn last_hour_work(ctx: &ModelContext, weights: &ObjectiveWeights, use_manual_assignments: bool, expr: &mut Expression) {
    for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
        let duty = &ctx.duty_slots[controller_idx];
        let tail_start = duty.len().saturating_sub(2);
        for &slot_idx in &duty[tail_start..] {
            if use_manual_assignments && ctx.staged.pin_at(&controller.id, slot_idx).is_some() {
                continue;
            }
            *expr = expr.clone() + working_expr(ctx, controller_idx, slot_idx) * weights.last_hour_work;
        }
    }
}

/// +300 — a single break slot bounded by 4+ worked slots before it and
/// a worked slot after, i.e. a short rest immediately following a long
/// block. In any solution honoring hard constraint #6 this never
/// actually fires (that rule already forces two breaks there); it is
/// still wired so the term is not a silent always-zero weight.
fn short_break_after_long_block(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for (controller_idx, _controller) in ctx.controllers.iter().enumerate() {
        let duty = &ctx.duty_slots[controller_idx];
        for window in duty.windows(6) {
            let mut work_sum = Expression::from(0.0);
            for &idx in &window[0..4] {
                work_sum = work_sum + (Expression::from(1.0) - ctx.vars.break_var(controller_idx, idx));
            }
            let break4 = ctx.vars.break_var(controller_idx, window[4]);
            let work5 = Expression::from(1.0) - ctx.vars.break_var(controller_idx, window[5]);
            let condition = work_sum + break4 + work5;
            let indicator = penalty_indicator(vars, aux, condition, 5.0);
            *expr = expr.clone() + indicator * weights.short_break;
        }
    }
}

/// +200 rotation violation / −100 rotation bonus: detected over every
/// E/P-suffixed sector pair required at consecutive slots.
fn rotation(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for (controller_idx, _controller) in ctx.controllers.iter().enumerate() {
        let duty = &ctx.duty_slots[controller_idx];

        // Violation: same exact sector held for three consecutive duty slots.
        for window in duty.windows(3) {
            for sector in ctx.required.at(window[0]) {
                if ep_suffix(sector).is_none() {
                    continue;
                }
                if !ctx.required.at(window[1]).contains(sector) || !ctx.required.at(window[2]).contains(sector) {
                    continue;
                }
                let alt = alternate_label(sector, ep_suffix(sector).unwrap());
                let has_alternative = ctx.required.at(window[0]).contains(&alt) || ctx.required.at(window[1]).contains(&alt) || ctx.required.at(window[2]).contains(&alt);
                if !has_alternative {
                    continue;
                }
                let (Some(v0), Some(v1), Some(v2)) = (
                    ctx.vars.sector_var_for(window[0], sector, controller_idx),
                    ctx.vars.sector_var_for(window[1], sector, controller_idx),
                    ctx.vars.sector_var_for(window[2], sector, controller_idx),
                ) else {
                    continue;
                };
                let indicator = penalty_indicator(vars, aux, Expression::from(v0) + v1 + v2, 2.0);
                *expr = expr.clone() + indicator * weights.rotation_violation;
            }
        }

        // Bonus: switched E<->P between two consecutive slots where both
        // labels were required at both slots.
        for window in duty.windows(2) {
            let (t0, t1) = (window[0], window[1]);
            for sector in ctx.required.at(t0) {
                let Some(suffix) = ep_suffix(sector) else { continue };
                let alt = alternate_label(sector, suffix);
                if !ctx.required.at(t0).contains(&alt) || !ctx.required.at(t1).contains(sector) || !ctx.required.at(t1).contains(&alt) {
                    continue;
                }
                let (Some(prev_base), Some(curr_alt)) = (ctx.vars.sector_var_for(t0, sector, controller_idx), ctx.vars.sector_var_for(t1, &alt, controller_idx)) else {
                    continue;
                };
                let indicator = bonus_indicator(vars, aux, &[Expression::from(prev_base), Expression::from(curr_alt)]);
                *expr = expr.clone() + indicator * weights.position_rotation_bonus;
            }
        }
    }
}

/// −200 — same sector across two consecutive in-shift slots.
fn sector_continuity_bonus(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for (controller_idx, _controller) in ctx.controllers.iter().enumerate() {
        for t in 1..ctx.slots.len() {
            if !(ctx.in_shift[controller_idx][t - 1] && ctx.in_shift[controller_idx][t]) {
                continue;
            }
            for sector in ctx.required.at(t - 1) {
                if !ctx.required.at(t).contains(sector) {
                    continue;
                }
                let (Some(prev), Some(curr)) = (ctx.vars.sector_var_for(t - 1, sector, controller_idx), ctx.vars.sector_var_for(t, sector, controller_idx)) else { continue };
                let indicator = bonus_indicator(vars, aux, &[Expression::from(prev), Expression::from(curr)]);
                *expr = expr.clone() + indicator * weights.sector_continuity_bonus;
            }
        }
    }
}

/// +100 000 — more than one controller on the same sector/slot; fires
/// only where C5.2 was locally relaxed for a conflicting pin pair.
fn excess_controller(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for slot in ctx.slots {
        for sector in ctx.required.at(slot.index) {
            let Some(sector_idx) = ctx.vars.sector_index(slot.index, sector) else { continue };
            let mut sum = Expression::from(0.0);
            for v in ctx.vars.controllers_at_sector(slot.index, sector_idx) {
                sum = sum + *v;
            }
            let indicator = penalty_indicator(vars, aux, sum, 1.0);
            *expr = expr.clone() + indicator * weights.excess_controller;
        }
    }
}

fn is_in_night_window(ctx: &ModelContext, controller_idx: usize, slot_idx: usize) -> bool {
    ctx.controllers[controller_idx].shift_code == ShiftCode::Night && ctx.in_shift[controller_idx][slot_idx]
}

/// Night-shift terms (−1000/break, +800/sector, −2000 long break,
/// +3000 long work, +1000×spread) for regular controllers on a Night
/// shift code, over their own shift span (the "night window").
fn night_shift_terms(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    let mut workload_vars = Vec::new();

    for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
        if controller.role != Role::Regular || controller.shift_code != ShiftCode::Night {
            continue;
        }
        let duty: Vec<usize> = ctx.duty_slots[controller_idx].iter().copied().filter(|&t| is_in_night_window(ctx, controller_idx, t)).collect();
        if duty.is_empty() {
            continue;
        }

        for &t in &duty {
            *expr = expr.clone() + ctx.vars.break_var(controller_idx, t) * weights.night_break_regular;
            *expr = expr.clone() + working_expr(ctx, controller_idx, t) * weights.night_work_regular;
        }

        // Long break: 4+ consecutive break slots (bonus, upper-bound only).
        for window in duty.windows(4) {
            let components: Vec<Expression> = window.iter().map(|&t| Expression::from(ctx.vars.break_var(controller_idx, t))).collect();
            let indicator = bonus_indicator(vars, aux, &components);
            *expr = expr.clone() + indicator * weights.night_long_break;
        }

        // Long work: 3+ consecutive worked slots (penalty, lower-bound only).
        for window in duty.windows(3) {
            let mut sum = Expression::from(0.0);
            for &t in window {
                sum = sum + (Expression::from(1.0) - ctx.vars.break_var(controller_idx, t));
            }
            let indicator = penalty_indicator(vars, aux, sum, 2.0);
            *expr = expr.clone() + indicator * weights.night_long_work;
        }

        let mut worked = Expression::from(0.0);
        for &t in &duty {
            worked = worked + (Expression::from(1.0) - ctx.vars.break_var(controller_idx, t));
        }
        let workload = vars.add(variable().min(0.0).max(duty.len() as f64));
        aux.push(constraint!(Expression::from(workload) == worked));
        workload_vars.push(workload);
    }

    if workload_vars.len() >= 2 {
        let max_work = vars.add(variable().min(0.0));
        let min_work = vars.add(variable().min(0.0));
        for w in &workload_vars {
            aux.push(constraint!(Expression::from(max_work) >= *w));
            aux.push(constraint!(Expression::from(min_work) <= *w));
        }
        *expr = expr.clone() + (Expression::from(max_work) - min_work) * weights.night_workload_spread;
    }
}

/// FMP preference terms — all direct linear terms on existing variables.
fn fmp_terms(ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression) {
    // Unlicensed FMP-role controllers working any sector at all.
    for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
        if controller.role != Role::FlowManagement || controller.has_license {
            continue;
        }
        for slot in ctx.slots {
            if !ctx.in_shift[controller_idx][slot.index] {
                continue;
            }
            *expr = expr.clone() + working_expr(ctx, controller_idx, slot.index) * weights.unlicensed_fmp_working;
        }
    }

    for slot in ctx.slots {
        for sector in ctx.required.at(slot.index) {
            let is_fmp = sector.is_fmp();
            for (controller_idx, controller) in ctx.controllers.iter().enumerate() {
                let Some(v) = ctx.vars.sector_var_for(slot.index, sector, controller_idx) else { continue };

                if controller.is_licensed_fmp() {
                    if is_fmp {
                        *expr = expr.clone() + v * weights.fmp_on_fmp_sector;
                    } else {
                        *expr = expr.clone() + v * weights.fmp_elsewhere;
                    }
                } else if is_fmp {
                    // Always 0 given hard constraint #9; wired for completeness.
                    *expr = expr.clone() + v * weights.non_fmp_on_fmp_sector;
                }
            }
        }
    }
}

/// −20 preferred exactly-four-slot block, +30 fragmented (worked-break-
/// worked) pattern.
fn work_block_shape(vars: &mut ProblemVariables, ctx: &ModelContext, weights: &ObjectiveWeights, expr: &mut Expression, aux: &mut Vec<Constraint>) {
    for (controller_idx, _controller) in ctx.controllers.iter().enumerate() {
        let duty = &ctx.duty_slots[controller_idx];

        for window in duty.windows(3) {
            let (t0, t1, t2) = (window[0], window[1], window[2]);
            let b0 = ctx.vars.break_var(controller_idx, t0);
            let b1 = ctx.vars.break_var(controller_idx, t1);
            let b2 = ctx.vars.break_var(controller_idx, t2);
            let condition = Expression::from(b1) - b0 - b2;
            let indicator = penalty_indicator(vars, aux, condition, 0.0);
            *expr = expr.clone() + indicator * weights.fragmented_work;
        }

        for window in duty.windows(6) {
            let b0 = ctx.vars.break_var(controller_idx, window[0]);
            let b5 = ctx.vars.break_var(controller_idx, window[5]);
            let components: Vec<Expression> = [
                Expression::from(b0),
                Expression::from(1.0) - ctx.vars.break_var(controller_idx, window[1]),
                Expression::from(1.0) - ctx.vars.break_var(controller_idx, window[2]),
                Expression::from(1.0) - ctx.vars.break_var(controller_idx, window[3]),
                Expression::from(1.0) - ctx.vars.break_var(controller_idx, window[4]),
                Expression::from(b5),
            ]
            .into();
            let indicator = bonus_indicator(vars, aux, &components);
            *expr = expr.clone() + indicator * weights.preferred_four_slot_block;
        }
    }
}
