//! OData error payloads.
//!
//! The service wraps business messages as
//! `{"error": {"innererror": {"errordetails": [{"code": .., "message": ..}]}}}`.

use serde::{Deserialize, Serialize};

use rcv_schemas::format::remove_leading_zeros;

/// One message from an error payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// PO number with leading zeros removed, when the code names one.
    pub po_nbr: String,
    pub po_item: String,
    pub msg_id: String,
    pub msg_no: String,
    pub text: String,
}

#[derive(Deserialize)]
struct Envelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    innererror: Option<InnerError>,
}

#[derive(Deserialize)]
struct InnerError {
    #[serde(default)]
    errordetails: Vec<RawDetail>,
}

#[derive(Deserialize)]
struct RawDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Parse the details of an error body, newest first.
///
/// Anything that is not the expected JSON shape yields no details.
pub fn parse_error_payload(body: &str) -> Vec<ErrorDetail> {
    let Ok(envelope) = serde_json::from_str::<Envelope>(body) else {
        return Vec::new();
    };
    let raw = envelope
        .error
        .and_then(|e| e.innererror)
        .map(|i| i.errordetails)
        .unwrap_or_default();

    raw.iter().rev().map(parse_detail).collect()
}

fn parse_detail(raw: &RawDetail) -> ErrorDetail {
    let mut out = ErrorDetail::default();

    // "<po>|<item>:<rest>"
    let key_part = raw.code.split(':').next().unwrap_or_default();
    let keys: Vec<&str> = key_part.split('|').collect();
    if keys.len() > 1 {
        out.po_nbr = remove_leading_zeros(keys[0]);
        out.po_item = keys[1].to_string();
    }

    // "<id>/<no>~<text>"
    let message: Vec<&str> = raw.message.split('~').collect();
    if message.len() > 1 {
        let mut ty = message[0].split('/');
        out.msg_id = ty.next().unwrap_or_default().to_string();
        out.msg_no = ty.next().unwrap_or_default().to_string();
        out.text = message[1].to_string();
    } else {
        out.text = raw.message.clone();
        let ty: Vec<&str> = raw.code.split('/').collect();
        if ty.len() > 2 {
            // "/NS/123": the namespace keeps its leading slash.
            out.msg_id = format!("/{}", ty[1]);
            out.msg_no = ty[2].to_string();
        } else {
            out.msg_id = ty.first().copied().unwrap_or_default().to_string();
            out.msg_no = ty.get(1).copied().unwrap_or_default().to_string();
        }
    }
    out
}
