//! rcv-config
//!
//! Layered YAML configuration for the receiving client.
//!
//! Layers merge in order (later overrides earlier), the result is converted
//! to JSON, checked for secret-looking literals and hashed over its canonical
//! form. [`ReceivingConfig::from_loaded`] then reads the typed settings.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

mod secrets;
mod settings;

pub use secrets::{resolve_credentials, ServiceCredentials};
pub use settings::{
    CredentialsEnv, ReceivingConfig, ReconcileSettings, ServiceSettings, UiSettings,
    DEFAULT_BUSINESS_RULE_STATUS_CEILING, DEFAULT_SECONDARY_LOAD_DELAY_MS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_TOAST_DURATION_MS,
};

/// If any leaf string starts with one of these the load aborts with
/// CONFIG_SECRET_DETECTED. Config holds env var names, never credentials.
const SECRET_PREFIXES: &[&str] = &[
    "-----BEGIN", // PEM private keys
    "Basic ",     // HTTP basic auth header value
    "Bearer ",    // HTTP bearer token
    "eyJ",        // JWT
    "sk-",
    "ghp_",
    "AKIA",
];

/// JSON-pointer prefixes the client reads. Leaves outside them are unused.
pub const CONSUMED_POINTERS: &[&str] = &["/service", "/reconcile", "/ui"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedKeyReport {
    /// Unused leaf pointers, sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves no consumer reads (typos, stale keys).
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let unused: BTreeSet<String> = leaves(config_json)
        .into_iter()
        .map(|(pointer, _)| pointer)
        // An empty document has the single leaf "/".
        .filter(|p| p != "/")
        .filter(|p| !CONSUMED_POINTERS.iter().any(|c| is_prefix_pointer(c, p)))
        .collect();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused.into_iter().collect(),
    };
    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS count={} pointers={:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers
        );
    }
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 of `canonical_json`, hex encoded.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("read config layer {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(serde_json::Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        // A blank layer parses as null; skip it instead of wiping the merge.
        if raw.trim().is_empty() {
            continue;
        }
        let layer: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        let layer = serde_json::to_value(layer)
            .with_context(|| format!("layer {i} is not representable as json"))?;
        merge_layer(&mut merged, layer);
    }

    reject_secret_literals(&merged)?;

    // serde_json's default map keeps keys sorted, so compact output is canonical.
    let canonical_json = serde_json::to_string(&merged).context("serialize canonical json")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Merge `layer` into `base`. Mappings merge key by key; anything else
/// replaces what was there.
fn merge_layer(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (k, v) in layer_map {
                merge_layer(base_map.entry(k).or_insert(Value::Null), v);
            }
        }
        (slot, v) => *slot = v,
    }
}

fn reject_secret_literals(v: &Value) -> Result<()> {
    let hit = leaves(v)
        .into_iter()
        .find(|(_, leaf)| leaf.as_str().is_some_and(looks_like_secret));
    if let Some((pointer, _)) = hit {
        bail!("CONFIG_SECRET_DETECTED leaf={pointer} value=REDACTED");
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

/// "/a/b" is a prefix of "/a/b" and "/a/b/c" but not of "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    match leaf.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Every leaf as (JSON pointer, value). Empty mappings and arrays count as
/// leaves; the root leaf is "/".
fn leaves(v: &Value) -> Vec<(String, &Value)> {
    let mut out = Vec::new();
    walk(v, String::new(), &mut out);
    out
}

fn walk<'a>(v: &'a Value, pointer: String, out: &mut Vec<(String, &'a Value)>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, child) in map {
                let token = k.replace('~', "~0").replace('/', "~1");
                walk(child, format!("{pointer}/{token}"), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{pointer}/{i}"), out);
            }
        }
        _ if pointer.is_empty() => out.push(("/".to_string(), v)),
        _ => out.push((pointer, v)),
    }
}
