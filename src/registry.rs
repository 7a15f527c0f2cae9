//! SÚKL document registry (PIL / SPC metadata)
//!
//! Only metadata is fetched; the document itself stays on the registry and
//! callers get a download link.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::RegistryConfig;
use crate::error::{Result, SuklError};

/// One document listed for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Published as a number by the DLP API; kept as text
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    /// Document type as published ("PIL", "SPC", "OBAL", ...)
    #[serde(rename = "typ")]
    pub kind: String,
    #[serde(rename = "nazev", default)]
    pub title: Option<String>,
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Outcome of a metadata lookup that reached the registry
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentListing {
    Found(Vec<DocumentMeta>),
    /// The registry answered with a non-success status
    Unavailable { status: u16 },
}

/// Source of document metadata
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    /// List documents for a zero-padded SÚKL code.
    ///
    /// `Err` means the registry could not be reached at all.
    async fn list_documents(&self, padded_code: &str) -> Result<DocumentListing>;

    /// Download URL for a document id
    fn document_url(&self, document_id: &str) -> String;
}

/// Base URL without trailing slash; only http(s) is accepted
fn base_url(config: &RegistryConfig) -> Result<String> {
    let base = config.base_url.trim().trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(SuklError::Config(format!(
            "registry URL must start with http:// or https://, got '{}'",
            config.base_url
        )));
    }
    Ok(base.to_string())
}

/// Registry backed by the SÚKL DLP REST API
#[cfg(feature = "registry")]
pub struct HttpDocumentRegistry {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "registry")]
impl HttpDocumentRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url(config)?,
        })
    }
}

#[cfg(feature = "registry")]
#[async_trait]
impl DocumentRegistry for HttpDocumentRegistry {
    async fn list_documents(&self, padded_code: &str) -> Result<DocumentListing> {
        let url = format!("{}/dokumenty-metadata/{}", self.base_url, padded_code);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(DocumentListing::Unavailable {
                status: status.as_u16(),
            });
        }

        let documents: Vec<DocumentMeta> = response.json().await?;
        Ok(DocumentListing::Found(documents))
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/dokumenty/{}", self.base_url, document_id)
    }
}

/// Registry used when network access is compiled out or disabled
pub struct OfflineRegistry {
    base_url: String,
}

impl OfflineRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DocumentRegistry for OfflineRegistry {
    async fn list_documents(&self, _padded_code: &str) -> Result<DocumentListing> {
        Err(SuklError::Registry("document registry is disabled".into()))
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/dokumenty/{}", self.base_url, document_id)
    }
}

/// Pick the registry implementation available in this build
pub fn default_registry(config: &RegistryConfig) -> Result<std::sync::Arc<dyn DocumentRegistry>> {
    #[cfg(feature = "registry")]
    {
        Ok(std::sync::Arc::new(HttpDocumentRegistry::new(config)?))
    }
    #[cfg(not(feature = "registry"))]
    {
        base_url(config)?;
        Ok(std::sync::Arc::new(OfflineRegistry::new(config)))
    }
}
