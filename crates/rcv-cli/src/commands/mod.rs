//! Command handler modules for the `rcv` binary.
//!
//! Shared wiring (config, service selection, policy) lives here.
//! Command-specific logic lives in the submodules.

pub mod check_in;
pub mod replay;
pub mod show;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rcv_config::{
    load_layered_yaml, report_unused_keys, resolve_credentials, ReceivingConfig, UnusedKeyPolicy,
};
use rcv_odata::ODataReceivingService;
use rcv_receiving::{ReceivingPolicy, ReceivingService, TracingNotifier};
use rcv_schemas::format::DisplayLocale;
use rcv_service_mem::{InMemoryReceivingService, ReceivingFixture};
use tracing::{info, warn};

/// Where waybill data comes from.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Store ID
    #[arg(long)]
    pub store: String,

    /// Waybill number
    #[arg(long)]
    pub waybill: String,

    /// Serve the waybill from a JSON fixture instead of the remote service
    #[arg(long, conflicts_with = "base_url")]
    pub fixture: Option<PathBuf>,

    /// Remote service root (overrides service.base_url)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Effective config; defaults when no layers are given.
pub fn load_config(paths: &[String]) -> Result<ReceivingConfig> {
    if paths.is_empty() {
        return Ok(ReceivingConfig::default());
    }
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&refs)?;
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "unused config key");
    }
    info!(config_hash = %loaded.config_hash, "config loaded");
    ReceivingConfig::from_loaded(&loaded)
}

/// Batch runs skip the secondary load delay; there is no screen to paint.
pub fn batch_policy(cfg: &ReceivingConfig) -> ReceivingPolicy {
    ReceivingPolicy {
        business_rule_status_ceiling: cfg.reconcile.business_rule_status_ceiling,
        secondary_load_delay: Duration::ZERO,
        toast_duration: Duration::from_millis(cfg.ui.toast_duration_ms),
        locale: DisplayLocale::parse(&cfg.ui.locale),
    }
}

pub fn notifier(policy: &ReceivingPolicy) -> Arc<TracingNotifier> {
    Arc::new(TracingNotifier::new(policy.toast_duration))
}

pub fn build_service(
    args: &SourceArgs,
    cfg: &ReceivingConfig,
) -> Result<Arc<dyn ReceivingService>> {
    if let Some(path) = &args.fixture {
        let fixture = ReceivingFixture::load(path)?;
        return Ok(Arc::new(InMemoryReceivingService::from_fixture(fixture)));
    }

    let mut effective = cfg.clone();
    if let Some(url) = &args.base_url {
        effective.service.base_url = Some(url.clone());
        effective.validate()?;
    }
    let settings = &effective.service;
    let credentials = resolve_credentials(settings, |var| std::env::var(var).ok())?;
    let svc = ODataReceivingService::from_settings(settings, credentials)
        .context("receiving service needs --fixture, --base-url or service.base_url")?;
    Ok(Arc::new(svc))
}
