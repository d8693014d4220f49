//! Deployment configuration entity.
//!
//! [`Configuration`] mirrors the published `config.json`. Keys keep the
//! camelCase names of that file; keys this crate does not model are kept in
//! `extra` maps so a load/persist cycle never drops operator data.

mod store;

pub use store::{ConfigSource, ConfigStore, parse};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A configuration leaf that may be written as a JSON string or number.
///
/// The published configuration mixes both (`"port": "80"` next to
/// `"pipelineCount": 1`); rendering always uses the decimal text form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Canonical text used for substitution.
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Number(n.into())
    }
}

// ============================================================================
// ENDPOINT
// ============================================================================

/// Service reachability tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: String,
    pub host: String,
    pub port: Scalar,
    #[serde(
        rename = "public_uri",
        alias = "publicUri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Endpoint {
    pub fn new(protocol: &str, host: &str, port: impl Into<Scalar>) -> Self {
        Self {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port: port.into(),
            public_uri: None,
            extra: Map::new(),
        }
    }

    /// `{protocol}://{host}:{port}`, ignoring any stored public URI.
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// The stored public URI, or the derived address when none is stored.
    pub fn public_uri(&self) -> String {
        self.public_uri.clone().unwrap_or_else(|| self.address())
    }

    /// Fill in `public_uri` when absent; an existing value is kept as is.
    pub fn derive_public_uri(&mut self) {
        if self.public_uri.is_none() {
            self.public_uri = Some(self.address());
        }
    }

    /// Port text with surrounding whitespace removed.
    pub fn port_text(&self) -> String {
        self.port.as_text().trim().to_string()
    }
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrontendSection {
    pub external: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<Endpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSection {
    pub external: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_count: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawler_count: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_token: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lang_analyzer: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<Scalar>,
    /// Edition flag; `"ce"` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Scalar>,
    /// `"false"` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_file_preview: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_size: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_size: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_max_page_count: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_symbols_per_page_threshold: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropboxSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size_gb: Option<Scalar>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// The single persisted entity describing a deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub docker_repo: String,
    pub data_path: String,
    pub docker_compose_template: String,
    pub fe: FrontendSection,
    pub api: ApiSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es: Option<EsSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropbox: Option<DropboxSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<DbSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    /// Synthesize `public_uri` on every endpoint that lacks one.
    pub fn enrich(&mut self) {
        self.fe.external.derive_public_uri();
        self.api.external.derive_public_uri();
        if let Some(local) = self.fe.local.as_mut() {
            local.derive_public_uri();
        }
        if let Some(local) = self.api.local.as_mut() {
            local.derive_public_uri();
        }
    }

    /// Point both external endpoints at `host`.
    pub fn set_external_host(&mut self, host: &str) {
        self.fe.external.host = host.to_string();
        self.api.external.host = host.to_string();
    }

    /// Point both external endpoints at `port`.
    pub fn set_external_port(&mut self, port: u16) {
        self.fe.external.port = Scalar::Text(port.to_string());
        self.api.external.port = Scalar::Text(port.to_string());
    }

    /// Whether the API and frontend would bind the same host port.
    pub fn shares_external_port(&self) -> bool {
        self.api.external.port_text() == self.fe.external.port_text()
    }

    /// Image reference of a dynamically spawned worker, without tag.
    pub fn worker_image(&self, image: &str) -> String {
        format!("{}/{}", self.docker_repo, image)
    }
}
