use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::LoadedConfig;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BUSINESS_RULE_STATUS_CEILING: u16 = 500;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 1000;
pub const DEFAULT_SECONDARY_LOAD_DELAY_MS: u64 = 500;

/// Typed view of the effective configuration.
///
/// Every section and field is optional in YAML; missing values take the
/// defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReceivingConfig {
    pub service: ServiceSettings,
    pub reconcile: ReconcileSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSettings {
    /// OData service root, e.g. `https://host/sap/opu/odata/sap/ZRECEIVING_SRV`.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub credentials_env: CredentialsEnv,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials_env: CredentialsEnv::default(),
        }
    }
}

/// Names of the env vars holding service credentials. Never the values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsEnv {
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileSettings {
    /// Remote status codes below this are business-rule failures; at or
    /// above it (or missing) technical failures.
    pub business_rule_status_ceiling: u16,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            business_rule_status_ceiling: DEFAULT_BUSINESS_RULE_STATUS_CEILING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiSettings {
    pub toast_duration_ms: u64,
    /// Delay before the secondary collection of a waybill is loaded.
    pub secondary_load_delay_ms: u64,
    /// `EN` or `FR`; anything else falls back to `EN`.
    pub locale: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
            secondary_load_delay_ms: DEFAULT_SECONDARY_LOAD_DELAY_MS,
            locale: "EN".to_string(),
        }
    }
}

impl ReceivingConfig {
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: ReceivingConfig = serde_json::from_value(loaded.config_json.clone())
            .context("config does not match the receiving schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let ceiling = self.reconcile.business_rule_status_ceiling;
        if !(100..=599).contains(&ceiling) {
            bail!(
                "CONFIG_INVALID reconcile.business_rule_status_ceiling={ceiling} (must be 100..=599)"
            );
        }
        if self.service.timeout_secs == 0 {
            bail!("CONFIG_INVALID service.timeout_secs must be positive");
        }
        if let Some(url) = &self.service.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("CONFIG_INVALID service.base_url must be an http(s) URL: {url}");
            }
        }
        Ok(())
    }
}
