use std::time::Duration;

use rcv_schemas::format::DisplayLocale;

/// Knobs the controller reads. Built from `rcv-config` by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivingPolicy {
    /// Remote status below this is a business-rule failure.
    pub business_rule_status_ceiling: u16,
    /// Delay before the secondary collection is loaded on open.
    pub secondary_load_delay: Duration,
    /// How long toast notices stay up.
    pub toast_duration: Duration,
    /// Date and time layout of the waybill header.
    pub locale: DisplayLocale,
}

impl Default for ReceivingPolicy {
    fn default() -> Self {
        Self {
            business_rule_status_ceiling: 500,
            secondary_load_delay: Duration::from_millis(500),
            toast_duration: Duration::from_millis(1000),
            locale: DisplayLocale::En,
        }
    }
}

impl ReceivingPolicy {
    /// Policy without load delays, for tests and batch replay.
    pub fn immediate() -> Self {
        Self {
            secondary_load_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
