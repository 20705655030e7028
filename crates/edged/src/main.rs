use std::process::ExitCode;

use packetframe_cfg::EdgedConfig;
use packetframe_edged::center::Center;
use packetframe_edged::manager::Units;
use packetframe_log::Logger;
use packetframe_store::{AnyStore, PgStore};

fn main() -> ExitCode {
    let config = match EdgedConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("edged couldn't load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let logger = match Logger::launch(&config.logging()) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("edged couldn't start logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("couldn't start Tokio: {err}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async {
        let store = AnyStore::Pg(PgStore::connect(&config.db_url).await.unwrap_or_else(|err| {
            tracing::error!(%err, "failed to connect to the store");
            std::process::exit(1);
        }));

        let center = Center::new(config, logger, store);
        let units = Units::spawn(&center);

        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received shutdown signal"),
            Err(err) => tracing::error!(%err, "failed to listen for shutdown signal"),
        }

        units.shutdown().await;
        ExitCode::SUCCESS
    })
}
