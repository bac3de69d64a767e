//! Configuration loading and validation

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::form::HoursPolicy;
use crate::submit::SubmitSettings;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_url")]
    pub url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Fetch a CSRF token before wallet API calls
    #[serde(default = "default_true")]
    pub use_csrf: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: default_node_url(),
            timeout_ms: default_timeout_ms(),
            use_csrf: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Path to the wallets.json registry
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    /// Start new forms with automatic hours
    #[serde(default = "default_true")]
    pub auto_hours: bool,
    /// Initial share factor for automatic hours
    #[serde(default = "default_share_factor")]
    pub share_factor: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            auto_hours: true,
            share_factor: default_share_factor(),
        }
    }
}

impl FormConfig {
    /// Initial hours policy for new forms
    pub fn hours_policy(&self) -> HoursPolicy {
        HoursPolicy::new(self.auto_hours, self.share_factor.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitConfig {
    /// How long error notifications stay visible
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
    /// Upper bound on the transaction build call, 0 disables
    #[serde(default)]
    pub build_timeout_ms: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            notification_secs: default_notification_secs(),
            build_timeout_ms: 0,
        }
    }
}

impl SubmitConfig {
    pub fn settings(&self) -> SubmitSettings {
        SubmitSettings {
            notification_duration: Duration::from_secs(self.notification_secs),
            build_timeout: (self.build_timeout_ms > 0)
                .then(|| Duration::from_millis(self.build_timeout_ms)),
        }
    }
}

fn default_true() -> bool { true }
fn default_node_url() -> String { "http://127.0.0.1:6420".to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_registry_path() -> String { "wallets.json".to_string() }
fn default_share_factor() -> String { crate::form::DEFAULT_SHARE_FACTOR.to_string() }
fn default_notification_secs() -> u64 { 300 }

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("node.url", default_node_url())?
            .set_default("node.timeout_ms", default_timeout_ms() as i64)?
            .set_default("wallet.registry_path", default_registry_path())?
            .set_default("submit.notification_secs", default_notification_secs() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SKYSEND_)
            .add_source(
                config::Environment::with_prefix("SKYSEND")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !self.node.url.starts_with("http://") && !self.node.url.starts_with("https://") {
            anyhow::bail!("node.url must be an http(s) URL, got {}", self.node.url);
        }

        if self.node.timeout_ms == 0 {
            anyhow::bail!("node.timeout_ms must be positive");
        }

        if self.submit.notification_secs == 0 {
            anyhow::bail!("submit.notification_secs must be positive");
        }

        let share: f64 = self
            .form
            .share_factor
            .parse()
            .with_context(|| format!("Invalid form.share_factor: {}", self.form.share_factor))?;

        if !(0.0..=1.0).contains(&share) {
            tracing::warn!(
                "form.share_factor {} is outside [0, 1]; passing it through unchanged",
                share
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Node:
    url: {}
    timeout: {}ms
    csrf: {}
  Wallet:
    registry: {}
  Form:
    auto_hours: {}
    share_factor: {}
  Submit:
    notification: {}s
    build_timeout: {}
"#,
            mask_url(&self.node.url),
            self.node.timeout_ms,
            self.node.use_csrf,
            self.wallet.registry_path,
            self.form.auto_hours,
            self.form.share_factor,
            self.submit.notification_secs,
            if self.submit.build_timeout_ms == 0 {
                "(none)".to_string()
            } else {
                format!("{}ms", self.submit.build_timeout_ms)
            },
        )
    }
}

/// Mask URL for display (hide credentials in userinfo and query params)
fn mask_url(url: &str) -> String {
    let url = match (url.find("://"), url.find('@')) {
        (Some(scheme), Some(at)) if at > scheme => {
            format!("{}***{}", &url[..scheme + 3], &url[at..])
        }
        _ => url.to_string(),
    };

    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            wallet: WalletConfig::default(),
            form: FormConfig::default(),
            submit: SubmitConfig::default(),
        }
    }
}
