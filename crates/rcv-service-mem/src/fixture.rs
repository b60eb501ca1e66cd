use std::path::Path;

use anyhow::{Context, Result};
use rcv_schemas::{ExceptionRecord, PalletHeader, PoHeader, PoItem, UnitKey, Waybill};
use serde::{Deserialize, Serialize};

/// What the service answers to the next update of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptedOutcome {
    /// Accept and clear the open quantity.
    Receive,
    /// Accept but leave `remaining` open.
    ReceivePartial { remaining: i64 },
    /// Refuse. `status: None` behaves like a dropped connection; `body` is an
    /// OData error payload.
    Fail {
        status: Option<u16>,
        message: String,
        #[serde(default)]
        body: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub unit: UnitKey,
    #[serde(flatten)]
    pub outcome: ScriptedOutcome,
}

/// One waybill with its units, exceptions and scripted update outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingFixture {
    pub waybill: Waybill,
    #[serde(default)]
    pub pallets: Vec<PalletHeader>,
    #[serde(default)]
    pub purchase_orders: Vec<PoHeader>,
    #[serde(default)]
    pub articles: Vec<PoItem>,
    #[serde(default)]
    pub exceptions: Vec<ExceptionRecord>,
    /// Consumed in order per unit; units without steps are received.
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl ReceivingFixture {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("parse receiving fixture")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read fixture failed: {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("fixture {}", path.display()))
    }
}
