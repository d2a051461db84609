use std::{fmt, str::FromStr};

use crate::error::ServiceError;

/// Secret authorising calls to the generation provider.
///
/// Never empty. `Debug` is redacted so the value cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Result<Self, ServiceError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ServiceError::CredentialUnavailable(
                "API key is empty".into(),
            ));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Local,
    Managed,
}

impl ExecutionMode {
    pub fn from_marker(marker: Option<&str>) -> Self {
        match marker {
            Some(value) if !value.is_empty() => ExecutionMode::Managed,
            _ => ExecutionMode::Local,
        }
    }

    pub fn detect(marker_var: &str) -> Self {
        Self::from_marker(std::env::var(marker_var).ok().as_deref())
    }
}

/// Whether a resolved credential is kept for the process lifetime or
/// fetched again for every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialCache {
    #[default]
    Process,
    Request,
}

impl FromStr for CredentialCache {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "process" => Ok(CredentialCache::Process),
            "request" => Ok(CredentialCache::Request),
            other => Err(format!("unknown credential cache mode: {other}")),
        }
    }
}
