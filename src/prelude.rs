pub use crate::api::{router, ApiState};
pub use crate::app_ext::*;
pub use crate::config::PortfolioConfig;
pub use crate::error::{PortfolioError, PortfolioResult};
pub use crate::images::{normalize_image_path, to_project_image_path};
pub use crate::server::{ApiServer, ServerStatus, WebPort};
pub use crate::{headless_plugins, PortfolioServerPlugin, DEFAULT_IP, DEFAULT_PORT};
