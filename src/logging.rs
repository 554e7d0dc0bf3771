//! Terminal logging shared by both binaries.

use log::{LevelFilter, SetLoggerError};

/// Log to stderr at `level`; stdout stays reserved for solution reports.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off);
    simplelog::TermLogger::init(
        level,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}
