use bevy_ecs::prelude::*;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{PortfolioError, PortfolioResult, WebPort, DEFAULT_IP, DEFAULT_PORT};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_TOKEN: &str = "admin-token-change-in-production";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Outbound mail settings. Mail is considered configured once both a user and a
/// password are present.
#[derive(Clone, Debug, PartialEq)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl MailConfig {
    pub fn is_configured(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            user: String::new(),
            password: String::new(),
        }
    }
}

/// Everything the portfolio backend reads from its environment.
#[derive(Clone, Debug, PartialEq, Resource)]
pub struct PortfolioConfig {
    pub ip: IpAddr,
    pub port: WebPort,
    /// Directory holding `messages.json`, `projects.json` and `skills.json`.
    pub data_dir: PathBuf,
    /// Directory the `image/` asset folder is served from.
    pub site_root: PathBuf,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_token: String,
    pub mail: MailConfig,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_IP,
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("."),
            site_root: PathBuf::from("."),
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            admin_token: DEFAULT_ADMIN_TOKEN.to_string(),
            mail: MailConfig::default(),
        }
    }
}

impl PortfolioConfig {
    pub fn from_env() -> PortfolioResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Unset variables fall
    /// back to their defaults; set but unparseable ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PortfolioResult<Self> {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        Ok(Self {
            ip: parse_var(&lookup, "HOST", defaults.ip)?,
            port: parse_var(&lookup, "PORT", defaults.port)?,
            data_dir: lookup("DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            site_root: lookup("SITE_ROOT").map_or(defaults.site_root, PathBuf::from),
            admin_username: string("ADMIN_USERNAME", defaults.admin_username),
            admin_password: string("ADMIN_PASSWORD", defaults.admin_password),
            admin_token: string("ADMIN_TOKEN", defaults.admin_token),
            mail: MailConfig {
                host: string("SMTP_HOST", defaults.mail.host),
                port: parse_var(&lookup, "SMTP_PORT", defaults.mail.port)?,
                user: string("GMAIL_USER", defaults.mail.user),
                password: string("GMAIL_PASS", defaults.mail.password),
            },
        })
    }

    pub fn messages_file(&self) -> PathBuf {
        self.data_dir.join("messages.json")
    }

    pub fn projects_file(&self) -> PathBuf {
        self.data_dir.join("projects.json")
    }

    pub fn skills_file(&self) -> PathBuf {
        self.data_dir.join("skills.json")
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> PortfolioResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err| PortfolioError::config_error(key, format!("'{}': {}", raw, err))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = PortfolioConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, PortfolioConfig::default());
        assert_eq!(config.port, 5000);
        assert!(!config.mail.is_configured());
    }

    #[test]
    fn test_reads_overrides() {
        let config = PortfolioConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", " 8081 "),
            ("DATA_DIR", "/srv/portfolio"),
            ("ADMIN_TOKEN", "s3cret"),
            ("GMAIL_USER", "me@example.com"),
            ("GMAIL_PASS", "app-password"),
        ]))
        .unwrap();

        assert_eq!(config.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port, 8081);
        assert_eq!(config.admin_token, "s3cret");
        assert_eq!(
            config.projects_file(),
            PathBuf::from("/srv/portfolio/projects.json")
        );
        assert!(config.mail.is_configured());
    }

    #[test]
    fn test_invalid_port_names_variable() {
        let err = PortfolioConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigError { ref field, .. } if field == "PORT"));
    }
}
