use anyhow::{Context, anyhow};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::view::DivisionFilter;

/// Apps Script web app the dashboard reads from and writes to
pub const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycby5gfch9vmQbvfnTnjcRnqPzoo6iHV3nNEBbXMRlu2NxpWovcyi1re_Ln9fF6Q3mqgE/exec";

/// Sheet holding the personnel rows
pub const DEFAULT_SHEET: &str = "Personnel";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub sheet: String,
    pub host: String,
    pub port: u16,
    /// Division list entries; empty means "derive from the data"
    pub divisions: Vec<String>,
    /// Rank choices for the add form; empty means free text
    pub ranks: Vec<String>,
    pub division_filter: DivisionFilter,
    /// `None` leaves requests without a deadline
    pub request_timeout: Option<Duration>,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            divisions: Vec::new(),
            ranks: Vec::new(),
            division_filter: DivisionFilter::Highlight,
            request_timeout: None,
            static_dir: "static".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<AppConfig> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup, falling back to the defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let endpoint = lookup("DASHBOARD_ENDPOINT").unwrap_or(defaults.endpoint);
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(anyhow!("DASHBOARD_ENDPOINT must be an http(s) URL: {}", endpoint));
        }
        let sheet = lookup("DASHBOARD_SHEET")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.sheet);
        let host = lookup("DASHBOARD_HOST").unwrap_or(defaults.host);
        let port = lookup("DASHBOARD_PORT")
            .map(|x| x.parse::<u16>())
            .unwrap_or(Ok(defaults.port))
            .context("DASHBOARD_PORT")?;
        let divisions = lookup("DASHBOARD_DIVISIONS")
            .map(|s| split_list(&s))
            .unwrap_or_default();
        let ranks = lookup("DASHBOARD_RANKS")
            .map(|s| split_list(&s))
            .unwrap_or_default();
        let division_filter = match lookup("DASHBOARD_DIVISION_FILTER") {
            Some(s) => s
                .parse::<DivisionFilter>()
                .map_err(|e| anyhow!(e))
                .context("DASHBOARD_DIVISION_FILTER")?,
            None => defaults.division_filter,
        };
        let request_timeout = match lookup("DASHBOARD_TIMEOUT_SECS") {
            Some(s) => {
                let secs = s.parse::<u64>().context("DASHBOARD_TIMEOUT_SECS")?;
                if secs == 0 {
                    return Err(anyhow!("DASHBOARD_TIMEOUT_SECS must be positive"));
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        let static_dir = lookup("DASHBOARD_STATIC_DIR").unwrap_or(defaults.static_dir);

        Ok(AppConfig {
            endpoint,
            sheet,
            host,
            port,
            divisions,
            ranks,
            division_filter,
            request_timeout,
            static_dir,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}
