// src/session/chromedriver.rs

//! Lifecycle management for a per-session chromedriver process.
//!
//! Every browser session gets its own chromedriver on an ephemeral port, so
//! concurrent scrapes never share WebDriver state.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::error::{Result, ScrapeError};
use crate::models::DriverConfig;

static DRIVER_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Locate the chromedriver binary.
///
/// Order: explicit config path, the CHROMEDRIVER environment variable, then
/// a PATH lookup. The lookup result is cached for the process lifetime.
fn resolve_binary(config: &DriverConfig) -> Result<PathBuf> {
    if let Some(path) = &config.chromedriver_path {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = DRIVER_PATH.get() {
        return Ok(path.clone());
    }
    let found = match std::env::var_os("CHROMEDRIVER") {
        Some(path) => PathBuf::from(path),
        None => which::which("chromedriver").map_err(|e| {
            ScrapeError::driver(format!("chromedriver not found on PATH: {e}"))
        })?,
    };
    Ok(DRIVER_PATH.get_or_init(|| found).clone())
}

/// Ask the OS for a free loopback port.
fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

/// A running chromedriver child process.
pub struct ChromeDriverProcess {
    child: Child,
    port: u16,
}

impl ChromeDriverProcess {
    /// Spawn chromedriver on a free port and wait until it accepts
    /// connections.
    pub async fn launch(config: &DriverConfig) -> Result<Self> {
        let binary = resolve_binary(config)?;
        let port = free_port()?;
        log::debug!("Starting chromedriver from {binary:?} on port {port}");

        let child = Command::new(&binary)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScrapeError::driver(format!("failed to spawn {binary:?}: {e}")))?;

        let mut process = Self { child, port };
        process
            .wait_until_ready(Duration::from_secs(config.startup_timeout_secs))
            .await?;
        Ok(process)
    }

    /// Base URL of the WebDriver endpoint.
    pub fn server_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Poll the /status endpoint until chromedriver responds or the startup
    /// deadline passes.
    async fn wait_until_ready(&mut self, startup_timeout: Duration) -> Result<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()?;
        let status_url = format!("{}/status", self.server_url());
        let deadline = Instant::now() + startup_timeout;

        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait()? {
                return Err(ScrapeError::driver(format!(
                    "chromedriver exited during startup: {status}"
                )));
            }
            if let Ok(response) = client.get(&status_url).send().await {
                if response.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let _ = self.child.start_kill();
        Err(ScrapeError::driver(format!(
            "chromedriver not ready within {}s",
            startup_timeout.as_secs()
        )))
    }

    /// Terminate the child process.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.child.kill().await {
            log::warn!("Failed to kill chromedriver on port {}: {e}", self.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_port_is_nonzero() {
        let port = free_port().unwrap();
        assert!(port > 0);
    }

    #[test]
    fn consecutive_ports_are_usable() {
        // The listener is dropped before the port is handed out, so binding
        // again must succeed.
        let port = free_port().unwrap();
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[test]
    fn config_path_overrides_lookup() {
        let config = DriverConfig {
            chromedriver_path: Some("/opt/bin/chromedriver".to_string()),
            ..Default::default()
        };
        let resolved = resolve_binary(&config).unwrap();
        assert_eq!(resolved, PathBuf::from("/opt/bin/chromedriver"));
    }
}
