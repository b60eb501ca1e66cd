//! Service credential resolution.
//!
//! Config stores env var NAMES under `service.credentials_env`. The values
//! are read once here and handed to the HTTP adapter. Error messages name the
//! variable, never the value.

use anyhow::{bail, Result};

use crate::settings::ServiceSettings;

/// Basic-auth credentials for the receiving service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Resolve credentials through `lookup` (normally `std::env::var(..).ok()`).
///
/// No names configured means anonymous access (`Ok(None)`). Configuring only
/// one of the two names, or naming a variable that is unset or empty, is an
/// error.
pub fn resolve_credentials(
    service: &ServiceSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<ServiceCredentials>> {
    let names = &service.credentials_env;
    let (user_var, password_var) = match (&names.user, &names.password) {
        (None, None) => return Ok(None),
        (Some(u), Some(p)) => (u, p),
        _ => bail!("CONFIG_INVALID service.credentials_env needs both user and password"),
    };

    let read = |var: &str| -> Result<String> {
        match lookup(var) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => bail!("SECRET_MISSING env var {var} is unset or empty"),
        }
    };

    Ok(Some(ServiceCredentials {
        user: read(user_var)?,
        password: read(password_var)?,
    }))
}
