//! Read-only document fetches against the repository's static file layout.
//!
//! Three document kinds are understood: `maven-metadata.xml` (versioning),
//! Gradle `.module` descriptors (platform variants), and group directory
//! listings (HTML). HTTP 404 is an expected outcome and surfaces as
//! `Ok(None)`; connect errors and server errors are retried a bounded
//! number of times before surfacing as [`TransportError`].

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode, redirect};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Production repository base. Overridable for tests via
/// [`Transport::with_base_url`].
pub const MAVEN_CENTRAL_BASE: &str = "https://repo1.maven.org/maven2";

/// Module-descriptor attribute carrying the KMP platform type of a variant.
pub const ATTR_KOTLIN_PLATFORM_TYPE: &str = "org.jetbrains.kotlin.platform.type";

/// Module-descriptor attribute carrying the native target. Mandatory for
/// variants whose platform type is `native`.
pub const ATTR_KOTLIN_NATIVE_TARGET: &str = "org.jetbrains.kotlin.native.target";

/// Total attempts per fetch before a transport failure surfaces.
const FETCH_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode {kind} document: {message}")]
    Decode { kind: &'static str, message: String },
}

/// `maven-metadata.xml` as served per artifact directory.
///
/// All fields optional: a document missing mandatory parts is decoded
/// as-is and rejected by the resolver as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct MavenMetadata {
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "artifactId")]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Option<Versioning>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Versioning {
    pub latest: Option<String>,
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Versions,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Versions {
    #[serde(rename = "version", default)]
    pub items: Vec<String>,
}

/// Gradle module descriptor, reduced to the variant attributes the
/// platform probe reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GradleModule {
    #[serde(default)]
    pub variants: Vec<ModuleVariant>,
}

/// Attribute values mix strings, numbers, and booleans
/// (e.g. `org.gradle.jvm.version: 8`), so they are kept as raw JSON values.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleVariant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ModuleVariant {
    /// String value of an attribute, if present and a string.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Shared HTTP client bound to one repository base URL.
///
/// One instance is shared read-only across all resolution tasks of a crawl.
#[derive(Debug)]
pub struct Transport {
    client: Client,
    base_url: String,
}

impl Transport {
    /// Transport against Maven Central.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the TLS backend fails to
    /// initialize.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_base_url(MAVEN_CENTRAL_BASE)
    }

    /// Transport against an arbitrary base URL (used by tests to point the
    /// crawler at a local fixture server).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the TLS backend fails to
    /// initialize.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    /// Fetches and decodes `<base>/<group path>/<artifact>/maven-metadata.xml`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Http`] after retries are exhausted, or
    /// [`TransportError::Decode`] for undecodable XML.
    pub async fn fetch_metadata(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Option<MavenMetadata>, TransportError> {
        let url = format!(
            "{}/{}/{artifact_id}/maven-metadata.xml",
            self.base_url,
            group_path(group_id),
        );
        let Some(body) = self.get_text(&url).await? else {
            return Ok(None);
        };
        let metadata = quick_xml::de::from_str(&body).map_err(|e| TransportError::Decode {
            kind: "metadata",
            message: e.to_string(),
        })?;
        Ok(Some(metadata))
    }

    /// Fetches and decodes the per-version Gradle module descriptor at
    /// `<base>/<group path>/<artifact>/<version>/<artifact>-<version>.module`.
    ///
    /// The body is decoded as JSON regardless of the response content type;
    /// repositories serve `.module` files as `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Http`] after retries are exhausted, or
    /// [`TransportError::Decode`] for undecodable JSON.
    pub async fn fetch_module(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Result<Option<GradleModule>, TransportError> {
        let url = format!(
            "{}/{}/{artifact_id}/{version}/{artifact_id}-{version}.module",
            self.base_url,
            group_path(group_id),
        );
        let Some(body) = self.get_text(&url).await? else {
            return Ok(None);
        };
        let module = serde_json::from_str(&body).map_err(|e| TransportError::Decode {
            kind: "module",
            message: e.to_string(),
        })?;
        Ok(Some(module))
    }

    /// Fetches the raw HTML directory listing for a group at
    /// `<base>/<group path>/`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Http`] after retries are exhausted.
    pub async fn fetch_group_listing(
        &self,
        group_id: &str,
    ) -> Result<Option<String>, TransportError> {
        let url = format!("{}/{}/", self.base_url, group_path(group_id));
        self.get_text(&url).await
    }

    /// GET with bounded retry. `Ok(None)` on 404; connect errors and 5xx
    /// responses are retried with a short linear backoff.
    async fn get_text(&self, url: &str) -> Result<Option<String>, TransportError> {
        let mut attempt = 1;
        loop {
            let outcome = self.client.get(url).send().await;
            match outcome {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                    return Ok(None);
                }
                Ok(response) if response.status().is_server_error() && attempt < FETCH_ATTEMPTS => {
                    debug!(url, status = %response.status(), attempt, "retrying fetch");
                }
                Ok(response) => {
                    let response = response.error_for_status()?;
                    return Ok(Some(response.text().await?));
                }
                Err(e) if attempt < FETCH_ATTEMPTS => {
                    debug!(url, error = %e, attempt, "retrying fetch");
                }
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
            attempt += 1;
        }
    }
}

fn group_path(group_id: &str) -> String {
    group_id.replace('.', "/")
}
