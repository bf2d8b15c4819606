use clap::Parser;
use serde::Deserialize;

use atc_roster_engine::api::request_dto::OptimizeRequest;
use atc_roster_engine::config::RosterEngineConfig;
use atc_roster_engine::domain::config_interval::ConfigurationInterval;
use atc_roster_engine::domain::engine;
use atc_roster_engine::domain::external::{InitialScheduleRow, StaticDataSource};
use atc_roster_engine::domain::ids::ControllerId;
use atc_roster_engine::error::Result;
use atc_roster_engine::loader::parser::parse_json_file;
use atc_roster_engine::logger;

/// The on-disk shape of a one-shot fixture: a flattened stand-in for
/// whatever external system the `DataSource` trait would otherwise query
/// (spec §6), loaded directly since this binary owns no persistence layer.
#[derive(Debug, Deserialize)]
struct Fixture {
    shift_durations: Vec<ShiftDurationEntry>,
    rows: Vec<InitialScheduleRow>,
    #[serde(default)]
    configurations: Vec<ConfigurationInterval>,
    #[serde(default)]
    licensed: Vec<ControllerId>,
}

#[derive(Debug, Deserialize)]
struct ShiftDurationEntry {
    date: String,
    shift: String,
    start: i64,
    end: i64,
}

impl Fixture {
    fn into_data_source(self) -> StaticDataSource {
        let mut source = StaticDataSource::new().with_rows(self.rows).with_configurations(self.configurations).with_licensed(self.licensed);
        for entry in self.shift_durations {
            source = source.with_shift_duration(entry.date, entry.shift, entry.start, entry.end);
        }
        source
    }
}

/// Runs one optimization pass against a fixture file (spec §2, §6).
#[derive(Debug, Parser)]
#[command(name = "atc-roster-engine", about = "ATC duty-roster optimization engine")]
struct Cli {
    /// JSON fixture: shift duration table, schedule rows, configuration
    /// timeline and licensed-controller list.
    #[arg(long)]
    fixture: String,

    /// JSON engine configuration; falls back to built-in defaults.
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    date: String,

    #[arg(long)]
    shift: String,

    #[arg(long, default_value_t = 30)]
    max_execution_seconds: u64,

    #[arg(long, default_value_t = false)]
    use_manual_assignments: bool,
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();
    log::info!("Starting optimization for {} / {}", cli.date, cli.shift);

    let config: RosterEngineConfig = match &cli.config {
        Some(path) => parse_json_file(path)?,
        None => RosterEngineConfig::default(),
    };

    let fixture: Fixture = parse_json_file(&cli.fixture)?;
    let data_source = fixture.into_data_source();

    let request = OptimizeRequest {
        date: cli.date,
        shift: cli.shift,
        max_execution_seconds: cli.max_execution_seconds,
        max_optimal_solutions: None,
        max_zero_shortage: None,
        use_lns: false,
        workplace_whitelist: None,
        controller_whitelist: None,
        use_manual_assignments: cli.use_manual_assignments,
        seed: None,
        use_randomization: false,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let response = runtime.block_on(engine::optimize(&data_source, &config, request))?;

    let rendered = serde_json::to_string_pretty(&response)?;
    println!("{rendered}");
    Ok(())
}
