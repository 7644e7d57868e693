use brrtedge::cli::run_cli;
use brrtedge::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut config = LogConfig::from_env();
    // stdout carries the command's JSON; keep it quiet unless asked.
    if std::env::var_os("BRRTE_LOG_LEVEL").is_none() {
        config.log_level = "warn".to_string();
    }
    init_logging_with_config(&config)?;

    run_cli()
}
