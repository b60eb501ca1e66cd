//! rcv-odata
//!
//! OData v2 adapter for [`ReceivingService`].
//!
//! Credentials are resolved by the caller (CLI) and passed in; do not log
//! them. Every non-2xx answer is returned as a [`RemoteError`] carrying the
//! HTTP status and the parsed error details; requests that never got an
//! answer carry no status.

pub mod paths;

use std::time::Duration;

use anyhow::{Context, Result};
use rcv_config::{ServiceCredentials, ServiceSettings};
use rcv_receiving::{parse_error_payload, ReceivingService, RemoteError};
use rcv_schemas::{
    ExceptionRecord, PalletHeader, ParentRef, PoHeader, PoItem, UnitKey, UnitKind, UnitRecord,
    Waybill,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use paths::{children_path, exception_path, exceptions_path, unit_path, waybill_path};

#[derive(Deserialize)]
struct Single<T> {
    d: T,
}

#[derive(Deserialize)]
struct Many<T> {
    d: Results<T>,
}

#[derive(Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

/// Receiving service reached over HTTP.
#[derive(Debug, Clone)]
pub struct ODataReceivingService {
    http: Client,
    base_url: String,
    credentials: Option<ServiceCredentials>,
}

impl ODataReceivingService {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Option<ServiceCredentials>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Build from the `service` config section. A base URL is required.
    pub fn from_settings(
        settings: &ServiceSettings,
        credentials: Option<ServiceCredentials>,
    ) -> Result<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .context("CONFIG_INVALID service.base_url is not set")?;
        Self::new(
            base_url,
            Duration::from_secs(settings.timeout_secs),
            credentials,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self
            .http
            .request(method, url)
            .query(&[("$format", "json")])
            .header("Accept", "application/json");
        match &self.credentials {
            Some(c) => req.basic_auth(&c.user, Some(&c.password)),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response, RemoteError> {
        let resp = req.send().await.map_err(|e| transport_error(what, &e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(what, status = status.as_u16(), "odata error response");
        Err(http_error(status, &body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let resp = self.send(self.request(Method::GET, path), path).await?;
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::transport(format!("decode {path}: {e}")))
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        self.get::<Single<T>>(path).await.map(|s| s.d)
    }

    async fn get_many<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RemoteError> {
        self.get::<Many<T>>(path).await.map(|m| m.d.results)
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), RemoteError> {
        self.send(self.request(Method::PUT, path).json(body), path)
            .await
            .map(|_| ())
    }
}

fn transport_error(what: &str, err: &reqwest::Error) -> RemoteError {
    let message = if err.is_timeout() {
        format!("{what}: request timed out")
    } else if err.is_connect() {
        format!("{what}: cannot reach receiving service")
    } else {
        format!("{what}: {err}")
    };
    RemoteError::transport(message)
}

fn http_error(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message/value")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
    RemoteError::http(status.as_u16(), message, parse_error_payload(body))
}

fn unsupported(parent: &ParentRef, kind: UnitKind) -> RemoteError {
    RemoteError::transport(format!("no {kind} navigation from {parent:?}"))
}

#[async_trait::async_trait]
impl ReceivingService for ODataReceivingService {
    fn name(&self) -> &'static str {
        "odata"
    }

    async fn read_waybill(
        &self,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Waybill, RemoteError> {
        self.get_one(&waybill_path(store_id, waybill_nbr)).await
    }

    async fn read_units(
        &self,
        parent: &ParentRef,
        kind: UnitKind,
    ) -> Result<Vec<UnitRecord>, RemoteError> {
        let path = children_path(parent, kind).ok_or_else(|| unsupported(parent, kind))?;
        let records = match kind {
            UnitKind::Pallet => self
                .get_many::<PalletHeader>(&path)
                .await?
                .into_iter()
                .map(UnitRecord::from)
                .collect(),
            UnitKind::PurchaseOrder => self
                .get_many::<PoHeader>(&path)
                .await?
                .into_iter()
                .map(UnitRecord::from)
                .collect(),
            UnitKind::Article => self
                .get_many::<PoItem>(&path)
                .await?
                .into_iter()
                .map(UnitRecord::from)
                .collect(),
        };
        Ok(records)
    }

    async fn update_waybill(&self, waybill: &Waybill) -> Result<Waybill, RemoteError> {
        let path = waybill_path(&waybill.store_id, &waybill.waybill_nbr);
        self.put(&path, waybill).await?;
        match self.get_one::<Waybill>(&path).await {
            Ok(current) => Ok(current),
            Err(err) => {
                warn!(
                    path = %path,
                    error = %err,
                    "read-back after waybill update failed; using submitted header"
                );
                Ok(waybill.clone())
            }
        }
    }

    async fn read_unit(&self, key: &UnitKey) -> Result<UnitRecord, RemoteError> {
        let path = unit_path(key);
        Ok(match key.kind() {
            UnitKind::Pallet => self.get_one::<PalletHeader>(&path).await?.into(),
            UnitKind::PurchaseOrder => self.get_one::<PoHeader>(&path).await?.into(),
            UnitKind::Article => self.get_one::<PoItem>(&path).await?.into(),
        })
    }

    async fn update_unit(
        &self,
        key: &UnitKey,
        record: &UnitRecord,
    ) -> Result<UnitRecord, RemoteError> {
        let path = unit_path(key);
        match record {
            UnitRecord::Pallet(r) => self.put(&path, r).await?,
            UnitRecord::PurchaseOrder(r) => self.put(&path, r).await?,
            UnitRecord::Article(r) => self.put(&path, r).await?,
        }
        match self.read_unit(key).await {
            Ok(current) => Ok(current),
            Err(err) => {
                warn!(
                    unit = %key,
                    error = %err,
                    "read-back after update failed; using submitted record"
                );
                Ok(record.clone())
            }
        }
    }

    async fn read_exceptions(
        &self,
        store_id: &str,
        waybill_nbr: &str,
    ) -> Result<Vec<ExceptionRecord>, RemoteError> {
        self.get_many(&exceptions_path(store_id, waybill_nbr)).await
    }

    /// Update in place; a 404 means the exception does not exist yet and it
    /// is created instead.
    async fn upsert_exception(
        &self,
        record: &ExceptionRecord,
    ) -> Result<ExceptionRecord, RemoteError> {
        let path = exception_path(&record.key());
        match self.put(&path, record).await {
            Ok(()) => Ok(record.clone()),
            Err(e) if e.status_code == Some(StatusCode::NOT_FOUND.as_u16()) => {
                debug!(path = %path, "exception not found; creating");
                let collection = format!("/{}", paths::EXCEPTION_SET);
                let resp = self
                    .send(self.request(Method::POST, &collection).json(record), &collection)
                    .await?;
                resp.json::<Single<ExceptionRecord>>()
                    .await
                    .map(|s| s.d)
                    .map_err(|e| RemoteError::transport(format!("decode {collection}: {e}")))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_reads_message_and_details() {
        let body = r#"{"error":{"code":"ZRCV/001","message":{"lang":"en","value":"Pallet locked"},
            "innererror":{"errordetails":[{"code":"ZRCV/001","message":"Pallet locked"}]}}}"#;
        let err = http_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.status_code, Some(400));
        assert_eq!(err.message, "Pallet locked");
        assert_eq!(err.details.len(), 1);
    }

    #[test]
    fn http_error_without_body_uses_reason() {
        let err = http_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.status_code, Some(503));
        assert_eq!(err.message, "Service Unavailable");
        assert!(err.details.is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let svc = ODataReceivingService::new("http://host/sap/", Duration::from_secs(5), None)
            .unwrap();
        assert_eq!(svc.base_url(), "http://host/sap");
    }
}
