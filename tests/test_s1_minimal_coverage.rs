//! Scenario S1 (spec §8): two regular controllers, four slots, one
//! sector required in every slot. The engine should cover every slot
//! with exactly one controller and drive shortages to zero.

use atc_roster_engine::api::request_dto::OptimizeRequest;
use atc_roster_engine::config::RosterEngineConfig;
use atc_roster_engine::domain::config_interval::{Cluster, ConfigurationInterval};
use atc_roster_engine::domain::controller::{Role, ShiftCode};
use atc_roster_engine::domain::engine;
use atc_roster_engine::domain::external::{InitialScheduleRow, StaticDataSource};
use atc_roster_engine::domain::ids::ControllerId;
use atc_roster_engine::domain::run::SolutionStatus;

const SLOT: i64 = 1800;
const SHIFT_END: i64 = 4 * SLOT;

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
        .with_rows(vec![controller_row("c1"), controller_row("c2")])
        .with_configurations(vec![ConfigurationInterval {
            from: 0,
            to: SHIFT_END,
            cluster: Cluster::Lu,
            config_code: "LU1".into(),
            sectors: vec![atc_roster_engine::domain::sector::SectorPosition::new("LU E")],
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
        seed: Some(42),
        use_randomization: false,
    }
}

#[tokio::test]
async fn covers_every_slot_with_exactly_one_controller_and_zero_shortage() {
    let data_source = fixture();
    let config = RosterEngineConfig::default();

    let response = engine::optimize(&data_source, &config, request()).await.expect("a feasible model must solve");

    assert!(matches!(response.status, SolutionStatus::Optimal | SolutionStatus::Feasible));
    assert_eq!(response.statistics.success_rate, 100.0);
    assert!(response.shortage_by_slot.is_empty());

    // Testable property 1/3: every slot has exactly one controller on
    // the sector, never more than one.
    let mut by_slot: std::collections::HashMap<(i64, i64), usize> = std::collections::HashMap::new();
    for row in &response.optimized_results {
        if row.sector.is_some() {
            *by_slot.entry((row.slot_from, row.slot_to)).or_default() += 1;
        }
    }
    assert_eq!(by_slot.len(), 4, "all four slots should have a sector occupant");
    for (_slot, working) in by_slot {
        assert_eq!(working, 1, "exactly one controller should be on the sector each slot");
    }
}
