//! Boundary to the remote receiving service.

use std::fmt;

use rcv_schemas::{ExceptionRecord, ParentRef, UnitKey, UnitKind, UnitRecord, Waybill};

use crate::error_payload::ErrorDetail;

/// A failed remote call.
///
/// `status_code` is the HTTP status when the service answered; `None` when
/// the request never produced a response (transport, timeout, decode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status_code: Option<u16>,
    pub message: String,
    /// Parsed OData error details, newest first.
    pub details: Vec<ErrorDetail>,
}

/// Caller-side classification of a [`RemoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The primary action went through; a dependent rule failed.
    BusinessRule,
    /// Nothing is assumed to have happened.
    Technical,
}

impl RemoteError {
    pub fn http(status_code: u16, message: impl Into<String>, details: Vec<ErrorDetail>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
            details,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Status below `ceiling` is a business-rule failure. At or above it, or
    /// no status at all, is technical.
    pub fn classify(&self, ceiling: u16) -> FailureClass {
        match self.status_code {
            Some(code) if code < ceiling => FailureClass::BusinessRule,
            _ => FailureClass::Technical,
        }
    }

    /// Text to show the user: the newest detail if any, else the message.
    pub fn user_message(&self) -> String {
        self.details
            .iter()
            .map(|d| d.text.trim())
            .find(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone())
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "receiving service error status={code}: {}", self.message),
            None => write!(f, "receiving service unreachable: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Remote receiving service contract.
///
/// Implementations must be `Send + Sync` so a controller can hand them to
/// spawned submissions.
#[async_trait::async_trait]
pub trait ReceivingService: Send + Sync {
    /// Short name for logs (e.g. `"odata"`, `"memory"`).
    fn name(&self) -> &'static str;

    async fn read_waybill(&self, store_id: &str, waybill_nbr: &str)
        -> Result<Waybill, RemoteError>;

    /// Child units of `parent` of the given kind, in service order.
    async fn read_units(
        &self,
        parent: &ParentRef,
        kind: UnitKind,
    ) -> Result<Vec<UnitRecord>, RemoteError>;

    /// Write the waybill header and return it as the service now holds it.
    async fn update_waybill(&self, waybill: &Waybill) -> Result<Waybill, RemoteError>;

    async fn read_unit(&self, key: &UnitKey) -> Result<UnitRecord, RemoteError>;

    /// Submit `record` for review and return the record as the service now
    /// holds it.
    async fn update_unit(
        &self,
        key: &UnitKey,
        record: &UnitRecord,
    ) -> Result<UnitRecord, RemoteError>;

    async fn read_exceptions(
        &self,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Vec<ExceptionRecord>, RemoteError>;

    /// Create or replace the exception at the record's key.
    async fn upsert_exception(
        &self,
        record: &ExceptionRecord,
    ) -> Result<ExceptionRecord, RemoteError>;
}
