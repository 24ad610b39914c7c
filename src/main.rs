use anyhow::Context;
use bevy_app::{App, AppExit, ScheduleRunnerPlugin};
use bevy_log::{info, LogPlugin};
use portfolio_server::prelude::*;
use std::time::Duration;

/// Frame pacing of the headless app loop.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

fn main() -> anyhow::Result<()> {
    let mut app = App::new();
    app.add_plugins((
        headless_plugins(),
        ScheduleRunnerPlugin::run_loop(TICK_INTERVAL),
        LogPlugin::default(),
    ));

    let config = PortfolioConfig::from_env().context("reading configuration")?;
    info!(
        "Data in {}, assets served from {}",
        config.data_dir.display(),
        config.site_root.display()
    );
    let state = ApiState::from_config(&config).context("opening data stores")?;

    app.add_plugins(PortfolioServerPlugin)
        .insert_resource(config)
        .serve_api(state);

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("exited with code {}", code),
    }
}
