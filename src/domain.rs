pub mod analyzer;
pub mod config_interval;
pub mod constraints;
pub mod controller;
pub mod engine;
pub mod external;
pub mod ids;
pub mod input_staging;
pub mod objective;
pub mod required_sectors;
pub mod run;
pub mod sector;
pub mod session;
pub mod shift_row;
pub mod solver;
pub mod time_slot;
pub mod variables;
