use crate::errors::RegionError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Port {
    #[serde(default)]
    pub http: u16,
    #[serde(default)]
    pub grpc: u16,
}

/// A host and its ports.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Port,
}

impl Endpoint {
    pub fn new<H: Into<String>>(host: H, http: u16, grpc: u16) -> Self {
        Endpoint {
            host: host.into(),
            port: Port { http, grpc },
        }
    }

    /// `http://{host}:{http port}`, the prefix forwarded URLs are built on.
    pub fn prefix(&self) -> String {
        format!("http://{}:{}", self.host, self.port.http)
    }

    fn validate(&self, field: &'static str) -> Result<(), RegionError> {
        if self.host.is_empty() {
            return Err(RegionError::EmptyHost(field));
        }
        if self.port.http == 0 {
            return Err(RegionError::ZeroHttpPort(field));
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}", self.host, self.port.http)
    }
}

/// One backend cluster of a region group, as stored in the region directory.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Access token of the cluster's control API. Carried, never used for forwarding.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    /// Name shown to operators in alarms. Derived from `is_default` when unset.
    #[serde(default)]
    pub label: Option<String>,
    pub gateway: Endpoint,
    pub operator: Endpoint,
    pub prometheus: Endpoint,
    #[serde(default)]
    pub external_dns: Option<String>,
    #[serde(default)]
    pub integration_external_dns: Option<String>,
}

impl Region {
    pub fn label(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None if self.is_default => "default",
            None => "standby",
        }
    }

    pub fn validate(&self) -> Result<(), RegionError> {
        if self.name.is_empty() {
            return Err(RegionError::EmptyName);
        }
        self.gateway.validate("gateway")?;
        self.operator.validate("operator")?;
        self.prometheus.validate("prometheus")?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_region(name: &str, host: &str, is_default: bool) -> Region {
    Region {
        name: name.to_string(),
        provider: None,
        location: None,
        token: None,
        is_default,
        label: None,
        gateway: Endpoint::new(host, 8080, 8081),
        operator: Endpoint::new(host, 8089, 0),
        prometheus: Endpoint::new(host, 9090, 0),
        external_dns: None,
        integration_external_dns: None,
    }
}
