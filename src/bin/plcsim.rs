use clap::{App, Arg};
use plcsim::adapter;
use plcsim::config::SimulatorConfig;
use plcsim::scheduler::TickDriver;
use plcsim::SimEngine;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let matches = App::new("plcsim")
        .version("0.1.0")
        .author("Industrial Systems Engineering Team")
        .about("Industrial controller simulator - typed register engine with process models")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("YAML configuration file (built-in reference map when omitted)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Override the configured listen address")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Override the configured listen port")
                .takes_value(true)
                .validator(|v| {
                    v.parse::<u16>()
                        .map(|_| ())
                        .map_err(|_| "port must be a number".into())
                }),
        )
        .arg(
            Arg::with_name("tick-ms")
                .long("tick-ms")
                .value_name("MILLIS")
                .help("Override the simulation tick interval")
                .takes_value(true)
                .validator(|v| {
                    v.parse::<u64>()
                        .map(|_| ())
                        .map_err(|_| "tick interval must be a number".into())
                }),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(host) = matches.value_of("host") {
        config.network.host = host.to_string();
    }
    if let Some(port) = matches.value_of("port") {
        config.network.port = port.parse()?;
    }
    if let Some(tick_ms) = matches.value_of("tick-ms") {
        config.tick_interval_ms = tick_ms.parse()?;
    }

    let engine = Arc::new(SimEngine::from_config(&config)?);
    info!(
        tick_ms = config.tick_interval_ms,
        port = config.network.port,
        "controller simulator starting"
    );

    let driver = TickDriver::new(
        Arc::clone(&engine),
        Duration::from_millis(config.tick_interval_ms.max(1)),
    );
    let tick_task = tokio::spawn(driver.run());

    let result = adapter::serve(engine, config.network.clone()).await;
    if let Err(e) = &result {
        error!(error = %e, "adapter server terminated");
    }
    tick_task.abort();
    result.map_err(Into::into)
}
