//! Artifact-name suffix table used to filter wildcard discovery candidates.
//!
//! Multiplatform builds publish one directory per platform facet next to
//! the canonical artifact (`lib-core`, `lib-core-jvm`, `lib-core-js`, ...).
//! Discovery drops candidates whose trailing `-suffix` matches this table,
//! assuming they are facets of a canonical artifact rather than independent
//! artifacts. This is a heuristic, known to produce false positives for
//! suffixes like `common` and `metadata`; the table is configuration, not a
//! constant, so callers can adjust it.

use std::collections::HashSet;

/// Overridable set of known per-platform artifact-name suffixes.
#[derive(Debug, Clone)]
pub struct PlatformSuffixes {
    suffixes: HashSet<String>,
}

impl PlatformSuffixes {
    /// An empty table (no candidate is filtered).
    pub fn empty() -> Self {
        Self {
            suffixes: HashSet::new(),
        }
    }

    /// Table built from the given suffixes, lowercased.
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Adds a suffix to the table.
    pub fn insert(&mut self, suffix: impl AsRef<str>) {
        self.suffixes.insert(suffix.as_ref().to_ascii_lowercase());
    }

    /// Whether the exact suffix is in the table.
    pub fn contains(&self, suffix: &str) -> bool {
        self.suffixes.contains(&suffix.to_ascii_lowercase())
    }

    /// Whether a discovered artifact name looks like a per-platform facet
    /// and should be dropped from discovery.
    ///
    /// Matches on the segment after the last `-` (the whole name if it has
    /// none), plus the two-segment `-wasm-wasi` convention.
    pub fn filters_name(&self, artifact_id: &str) -> bool {
        let lowered = artifact_id.to_ascii_lowercase();
        if lowered.ends_with("-wasm-wasi") {
            return true;
        }
        let last = lowered.rsplit('-').next().unwrap_or(&lowered);
        self.suffixes.contains(last)
    }
}

impl Default for PlatformSuffixes {
    /// The known KMP publication conventions: coarse platform names plus
    /// per-architecture native target suffixes.
    fn default() -> Self {
        let mut suffixes: HashSet<String> = [
            "native", "common", "metadata", "jvm", "android", "js", "jsir", "wasm", "wasm32",
            "wasm64",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let families = [
            "ios",
            "iossimulator",
            "androidnative",
            "linux",
            "mingw",
            "watchos",
            "watchossimulator",
            "watchosdevice",
            "macos",
            "tvos",
            "tvossimulator",
            "windows",
        ];
        let archs = ["arm64", "x64", "arm32", "arm32hfp", "x86"];
        for family in families {
            for arch in archs {
                suffixes.insert(format!("{family}{arch}"));
            }
        }

        Self { suffixes }
    }
}
