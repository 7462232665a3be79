//! Concurrent resolution of allow-list entries against the repository.
//!
//! One crawl fans out per allow-list entry, and again per version for
//! platform probing. Every fetch-bearing step takes a permit from one
//! crawl-wide semaphore, so the fan-out stays bounded without changing
//! which events a crawl produces. Each task is an independent failure
//! domain: it reports through the event channel, and its failure never
//! aborts siblings.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use mavix_schema::{Allowlist, AllowlistEntry, Artifact, ResolutionEvent};
use regex::Regex;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::suffixes::PlatformSuffixes;
use crate::transport::{
    ATTR_KOTLIN_NATIVE_TARGET, ATTR_KOTLIN_PLATFORM_TYPE, Transport,
};

/// Subdirectory anchors in a group listing: relative, lowercase, trailing
/// slash. Excludes parent/self references and file links.
static SUBDIR_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([a-z0-9][a-z0-9.-]*)/""#).unwrap());

/// Crawl configuration.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// When true, only the latest version of each artifact is
    /// platform-probed; other versions are emitted unprobed. Probing every
    /// version multiplies fetch volume by the version count.
    pub resolve_kmp_latest_only: bool,

    /// Maximum concurrent document fetches per crawl.
    pub max_concurrency: usize,

    /// Suffix table for wildcard discovery filtering.
    pub platform_suffixes: PlatformSuffixes,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            resolve_kmp_latest_only: true,
            max_concurrency: 64,
            platform_suffixes: PlatformSuffixes::default(),
        }
    }
}

/// The one failure a resolution task can surface as an error rather than
/// an event: self-contradictory module metadata.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A `native` variant is missing its mandatory native-target attribute.
    #[error(
        "Inconsistent module metadata for {coordinate}: native variant '{variant}' has no native-target attribute"
    )]
    InconsistentModule { coordinate: String, variant: String },
}

/// Drives one crawl. Cheap to clone; clones share the transport, the
/// options, the event channel, and the concurrency limiter.
#[derive(Debug, Clone)]
pub struct Resolver {
    transport: Arc<Transport>,
    options: Arc<ResolveOptions>,
    events: mpsc::Sender<ResolutionEvent>,
    limiter: Arc<Semaphore>,
}

impl Resolver {
    pub fn new(
        transport: Arc<Transport>,
        options: ResolveOptions,
        events: mpsc::Sender<ResolutionEvent>,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
        Self {
            transport,
            options: Arc::new(options),
            events,
            limiter,
        }
    }

    /// Resolves every allow-list entry, then emits exactly one terminal
    /// [`ResolutionEvent::Finished`].
    ///
    /// The sentinel goes out after all fan-out work, including nested
    /// per-version probes, has completed, even if some tasks failed.
    /// Dropping this future cancels the crawl: all outstanding tasks are
    /// aborted and the sentinel is never emitted.
    pub async fn resolve_all(&self, allowlist: &Allowlist) {
        let mut tasks: JoinSet<Result<(), ResolveError>> = JoinSet::new();

        for (group_id, entries) in &allowlist.allowed {
            if entries.contains(&AllowlistEntry::AllInGroup) {
                let resolver = self.clone();
                let group_id = group_id.clone();
                tasks.spawn(async move {
                    resolver.resolve_all_in_group(&group_id).await;
                    Ok(())
                });
            } else {
                for entry in entries {
                    let AllowlistEntry::Artifact(artifact_id) = entry else {
                        continue;
                    };
                    let resolver = self.clone();
                    let group_id = group_id.clone();
                    let artifact_id = artifact_id.clone();
                    tasks.spawn(async move {
                        resolver.resolve_matching(&group_id, &artifact_id, true).await
                    });
                }
            }
        }

        drain(&mut tasks).await;
        let _ = self.events.send(ResolutionEvent::Finished).await;
    }

    /// Resolves one named artifact: metadata fetch, version expansion,
    /// per-version platform probes.
    ///
    /// `emit_unresolved` is false for discovered candidates, whose
    /// failures are dropped silently.
    async fn resolve_matching(
        &self,
        group_id: &str,
        artifact_id: &str,
        emit_unresolved: bool,
    ) -> Result<(), ResolveError> {
        let fetched = {
            // Never closed, so acquire cannot fail
            let _permit = self.limiter.acquire().await.ok();
            self.transport.fetch_metadata(group_id, artifact_id).await
        };

        let metadata = match fetched {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                self.emit_unresolved(emit_unresolved, group_id, artifact_id).await;
                return Ok(());
            }
            Err(e) => {
                warn!(group_id, artifact_id, error = %e, "metadata fetch failed");
                self.emit_unresolved(emit_unresolved, group_id, artifact_id).await;
                return Ok(());
            }
        };

        // Mandatory fields; anything missing makes the document malformed
        let (Some(group_id), Some(artifact_id), Some(versioning)) =
            (metadata.group_id, metadata.artifact_id, metadata.versioning)
        else {
            self.emit_unresolved(emit_unresolved, group_id, artifact_id).await;
            return Ok(());
        };
        let versions = versioning.versions.items;
        let Some(last_version) = versions.last().cloned() else {
            self.emit_unresolved(emit_unresolved, &group_id, &artifact_id).await;
            return Ok(());
        };
        let latest = versioning.latest.unwrap_or(last_version);

        let mut probes: JoinSet<Result<(), ResolveError>> = JoinSet::new();
        for version in versions {
            let artifact = Artifact {
                group_id: group_id.clone(),
                artifact_id: artifact_id.clone(),
                is_latest_version: version == latest,
                version,
                supported_platforms: None,
            };
            // Metadata echoes the ids; drop coordinates that would escape
            // the repository path layout
            if let Err(err) = artifact.validate() {
                warn!(coordinate = %artifact.coordinate(), error = %err, "skipping invalid coordinate");
                continue;
            }
            if self.options.resolve_kmp_latest_only && !artifact.is_latest_version {
                let _ = self.events.send(ResolutionEvent::Resolved(artifact)).await;
            } else {
                let resolver = self.clone();
                probes.spawn(async move {
                    resolver.resolve_kmp_aware(artifact, emit_unresolved).await
                });
            }
        }
        drain(&mut probes).await;
        Ok(())
    }

    /// Classifies one version's platform support via its module descriptor.
    ///
    /// No descriptor means the artifact is not multiplatform and resolves
    /// unchanged. A `native` variant without its target attribute is a
    /// metadata contract breach: fatal to this one resolution task, no
    /// event for this version.
    async fn resolve_kmp_aware(
        &self,
        artifact: Artifact,
        emit_unresolved: bool,
    ) -> Result<(), ResolveError> {
        let fetched = {
            let _permit = self.limiter.acquire().await.ok();
            self.transport
                .fetch_module(&artifact.group_id, &artifact.artifact_id, &artifact.version)
                .await
        };

        let module = match fetched {
            Ok(Some(module)) => module,
            Ok(None) => {
                // Certainly not multiplatform
                let _ = self.events.send(ResolutionEvent::Resolved(artifact)).await;
                return Ok(());
            }
            Err(e) => {
                warn!(coordinate = %artifact.coordinate(), error = %e, "platform probe failed");
                self.emit_unresolved(emit_unresolved, &artifact.group_id, &artifact.artifact_id)
                    .await;
                return Ok(());
            }
        };

        let mut platforms = BTreeSet::new();
        for variant in &module.variants {
            // Any mention of a platform counts as a usable variant for it
            let Some(platform) = variant.attribute(ATTR_KOTLIN_PLATFORM_TYPE) else {
                continue;
            };
            if platform == "native" {
                let Some(target) = variant.attribute(ATTR_KOTLIN_NATIVE_TARGET) else {
                    return Err(ResolveError::InconsistentModule {
                        coordinate: artifact.coordinate(),
                        variant: variant.name.clone(),
                    });
                };
                platforms.insert(format!("native:{target}"));
            } else {
                platforms.insert(platform.to_string());
            }
        }

        let _ = self
            .events
            .send(ResolutionEvent::Resolved(artifact.with_platforms(platforms)))
            .await;
        Ok(())
    }

    /// Wildcard entry: scrape the group's directory listing for candidate
    /// artifact names and resolve the survivors of the suffix filter.
    ///
    /// A missing listing yields zero events for the entry; discovered
    /// candidates that fail to resolve are dropped silently. Subfolders of
    /// a non-leaf group are scraped as if they were artifacts and simply
    /// fail resolution.
    async fn resolve_all_in_group(&self, group_id: &str) {
        let fetched = {
            let _permit = self.limiter.acquire().await.ok();
            self.transport.fetch_group_listing(group_id).await
        };

        let listing = match fetched {
            Ok(Some(listing)) => listing,
            Ok(None) => {
                warn!(group_id, "group directory listing not found, skipping group");
                return;
            }
            Err(e) => {
                warn!(group_id, error = %e, "group discovery failed, skipping group");
                return;
            }
        };

        let mut tasks: JoinSet<Result<(), ResolveError>> = JoinSet::new();
        for candidate in scrape_subdirectories(&listing) {
            if self.options.platform_suffixes.filters_name(&candidate) {
                debug!(group_id, artifact_id = %candidate, "dropping platform facet candidate");
                continue;
            }
            let resolver = self.clone();
            let group_id = group_id.to_string();
            tasks.spawn(async move {
                resolver.resolve_matching(&group_id, &candidate, false).await
            });
        }
        drain(&mut tasks).await;
    }

    async fn emit_unresolved(&self, emit: bool, group_id: &str, artifact_id: &str) {
        if emit {
            let _ = self
                .events
                .send(ResolutionEvent::Unresolved {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                })
                .await;
        }
    }
}

/// Awaits every task in the set. Failures and panics are logged and
/// isolated; they never abort siblings or the crawl.
async fn drain(tasks: &mut JoinSet<Result<(), ResolveError>>) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(error = %err, "resolution task failed"),
            Err(join_err) if join_err.is_panic() => {
                error!(error = %join_err, "resolution task panicked");
            }
            Err(_) => {}
        }
    }
}

/// Candidate artifact names from a directory-listing document.
fn scrape_subdirectories(listing_html: &str) -> Vec<String> {
    SUBDIR_HREF
        .captures_iter(listing_html)
        .map(|captures| captures[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrapes_only_relative_subdirectory_anchors() {
        let listing = r#"
            <html><body>
            <a href="../">../</a>
            <a href="lib-core/">lib-core/</a>
            <a href="lib-core-jvm/">lib-core-jvm/</a>
            <a href="kotlinx.html/">kotlinx.html/</a>
            <a href="maven-metadata.xml">maven-metadata.xml</a>
            <a href="https://example.org/elsewhere/">elsewhere</a>
            </body></html>
        "#;
        let candidates = scrape_subdirectories(listing);
        assert_eq!(
            candidates,
            vec!["lib-core", "lib-core-jvm", "kotlinx.html"]
        );
    }

    #[test]
    fn default_options_bound_the_fan_out() {
        let options = ResolveOptions::default();
        assert!(options.resolve_kmp_latest_only);
        assert!(options.max_concurrency > 0);
    }
}
