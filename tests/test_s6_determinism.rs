//! Scenario S6 (spec §8): two runs over identical inputs with the same
//! seed must reach the same assignment and the same objective value —
//! the CP-SAT driver's determinism guarantee (spec §4.7).

use atc_roster_engine::api::request_dto::OptimizeRequest;
use atc_roster_engine::config::RosterEngineConfig;
use atc_roster_engine::domain::config_interval::{Cluster, ConfigurationInterval};
use atc_roster_engine::domain::controller::{Role, ShiftCode};
use atc_roster_engine::domain::engine;
use atc_roster_engine::domain::external::{InitialScheduleRow, StaticDataSource};
use atc_roster_engine::domain::ids::ControllerId;
use atc_roster_engine::domain::sector::SectorPosition;

const SLOT: i64 = 1800;
const SHIFT_END: i64 = 6 * SLOT;

fn controller_row(id: &str) -> InitialScheduleRow {
    InitialScheduleRow {
        controller_id: ControllerId::new(id),
        display_name: id.to_string(),
        date: "2026-07-27".into(),
        role: Role::Regular,
        shift_code: ShiftCode::Day,
        vreme_start: 0,
        shift_start: 0,
        shift_end: SHIFT_END,
        pinned_sector: None,
        release_window: None,
        ordering_index: 0,
        partner_code: None,
    }
}

fn fixture() -> StaticDataSource {
    StaticDataSource::new()
        .with_shift_duration("2026-07-27", "J", 0, SHIFT_END)
        .with_rows(vec![controller_row("c1"), controller_row("c2"), controller_row("c3")])
        .with_configurations(vec![ConfigurationInterval {
            from: 0,
            to: SHIFT_END,
            cluster: Cluster::Lu,
            config_code: "LU1".into(),
            sectors: vec![SectorPosition::new("LU E"), SectorPosition::new("LU W")],
            ordering: 0,
        }])
}

fn request() -> OptimizeRequest {
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
        seed: Some(99),
        use_randomization: false,
    }
}

/// A comparable projection of the assignment grid, independent of row
/// ordering and of any type that doesn't derive `PartialEq`.
fn assignment_fingerprint(results: &[atc_roster_engine::api::response_dto::OptimizedResultRow]) -> Vec<(String, i64, i64, Option<String>)> {
    let mut rows: Vec<_> = results.iter().map(|r| (r.controller_id.to_string(), r.slot_from, r.slot_to, r.sector.as_ref().map(ToString::to_string))).collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn identical_inputs_and_seed_reach_the_same_assignment_and_objective() {
    let config = RosterEngineConfig::default();

    let first = engine::optimize(&fixture(), &config, request()).await.expect("first run must solve");
    let second = engine::optimize(&fixture(), &config, request()).await.expect("second run must solve");

    assert_eq!(first.status, second.status);
    assert_eq!(assignment_fingerprint(&first.optimized_results), assignment_fingerprint(&second.optimized_results));
    assert_eq!(first.statistics.success_rate, second.statistics.success_rate);
    assert_eq!(first.shortage_by_slot, second.shortage_by_slot);
}
