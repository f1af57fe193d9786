//! Connection options.

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Options describing how to reach a database.
///
/// Deserializes from the JSON shape used by application configuration:
///
/// ```rust
/// use oxide_migrate::ConnectOptions;
///
/// let options = ConnectOptions::from_json(
///     r#"{"host":"db1","port":1521,"service":"orcl","user":"app","schema":"hr"}"#,
/// )
/// .unwrap();
/// assert_eq!(options.connect_descriptor(), "db1:1521/orcl");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Server host, `localhost` when absent.
    #[serde(default)]
    pub host: Option<String>,
    /// Server port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Service name.
    #[serde(default)]
    pub service: Option<String>,
    /// Server type (`dedicated`, `shared`, `pooled`).
    #[serde(default, rename = "type")]
    pub server_type: Option<String>,
    /// Instance name.
    #[serde(default)]
    pub instance: Option<String>,
    /// User name.
    #[serde(default)]
    pub user: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Default schema for unqualified names.
    #[serde(default)]
    pub schema: Option<String>,
    /// Complete connect string, overriding the individual parts.
    #[serde(default)]
    pub connect_string: Option<String>,
}

impl ConnectOptions {
    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MigrateError::Configuration(format!("invalid connect options: {e}")))
    }

    /// Returns `connect_string` when given, otherwise
    /// `host[:port][/service][:type][/instance]`.
    #[must_use]
    pub fn connect_descriptor(&self) -> String {
        if let Some(connect_string) = &self.connect_string {
            return connect_string.clone();
        }
        let mut descriptor = String::from(self.host.as_deref().unwrap_or("localhost"));
        if let Some(port) = self.port {
            descriptor.push_str(&format!(":{port}"));
        }
        if let Some(service) = &self.service {
            descriptor.push_str(&format!("/{service}"));
        }
        if let Some(server_type) = &self.server_type {
            descriptor.push_str(&format!(":{server_type}"));
        }
        if let Some(instance) = &self.instance {
            descriptor.push_str(&format!("/{instance}"));
        }
        descriptor
    }
}
