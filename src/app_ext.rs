use axum::Router;
use bevy_app::App;

use crate::api::{self, ApiState};
use crate::config::PortfolioConfig;
use crate::{ApiServer, PortfolioServerPlugin, ServerStatus, DEFAULT_IP, DEFAULT_PORT};

/// Mounts the portfolio API on a Bevy [`App`].
///
/// The listen address comes from the [`PortfolioConfig`] resource when one is
/// inserted, otherwise from [`DEFAULT_IP`] and [`DEFAULT_PORT`].
///
/// ```no_run
/// use bevy_app::App;
/// use portfolio_server::api::ApiState;
/// use portfolio_server::config::PortfolioConfig;
/// use portfolio_server::PortfolioAppExt;
///
/// let config = PortfolioConfig::from_env().unwrap();
/// let state = ApiState::from_config(&config).unwrap();
///
/// let mut app = App::new();
/// app.insert_resource(config).serve_api(state);
/// ```
pub trait PortfolioAppExt {
    /// Serves the full API router built from `state`.
    fn serve_api(&mut self, state: ApiState) -> &mut Self;

    /// Serves an arbitrary router on the configured address.
    fn serve_router(&mut self, router: Router) -> &mut Self;

    fn api_server_status(&self) -> Option<ServerStatus>;
}

impl PortfolioAppExt for App {
    fn serve_api(&mut self, state: ApiState) -> &mut Self {
        self.serve_router(api::router(state))
    }

    fn serve_router(&mut self, router: Router) -> &mut Self {
        if !self.is_plugin_added::<PortfolioServerPlugin>() {
            self.add_plugins(PortfolioServerPlugin);
        }

        let (ip, port) = self
            .world()
            .get_resource::<PortfolioConfig>()
            .map_or((DEFAULT_IP, DEFAULT_PORT), |config| (config.ip, config.port));

        self.insert_resource(ApiServer::new(ip, port, router));
        self
    }

    fn api_server_status(&self) -> Option<ServerStatus> {
        self.world()
            .get_resource::<ApiServer>()
            .map(|server| server.status())
    }
}
