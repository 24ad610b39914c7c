use bevy_app::{App, Last, Plugin, TaskPoolPlugin, Update};
use bevy_defer::AsyncPlugin;
use bevy_diagnostic::FrameCountPlugin;
use bevy_time::TimePlugin;
use bevy_ecs::prelude::*;
use std::net::{IpAddr, Ipv4Addr};

mod app_ext;
mod error;
mod server;
mod static_assets;
mod tracker;

pub mod api;
pub mod config;
pub mod images;
pub mod mail;
pub mod models;
pub mod prelude;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;

pub const DEFAULT_PORT: WebPort = 5000;
pub const DEFAULT_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

pub use app_ext::*;
pub use error::*;
pub use server::{ApiServer, ServerStatus, WebPort, MAX_RETRY_ATTEMPTS, RETRY_DELAY};
pub use static_assets::*;
pub use tracker::{ActivityGuard, ActivityTracker};

/// Plugins a headless host needs under [`PortfolioServerPlugin`]. The async
/// runtime reads the frame count every frame.
pub fn headless_plugins() -> (TaskPoolPlugin, FrameCountPlugin, TimePlugin) {
    (TaskPoolPlugin::default(), FrameCountPlugin, TimePlugin)
}

/// Drives the [`ApiServer`] resource: binds it, retries failed binds and stops
/// it when the app exits.
pub struct PortfolioServerPlugin;

impl Plugin for PortfolioServerPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<AsyncPlugin>() {
            app.add_plugins(AsyncPlugin::default_settings());
        }

        app.add_systems(
            Update,
            (ApiServer::launch, ApiServer::reap_tasks)
                .chain()
                .run_if(resource_exists::<ApiServer>),
        )
        .add_systems(
            Last,
            ApiServer::stop_on_exit.run_if(resource_exists::<ApiServer>),
        );
    }
}
