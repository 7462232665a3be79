use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// One allow-list entry within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AllowlistEntry {
    /// An artifact with the given name is eligible for crawling.
    Artifact(String),

    /// All artifacts in the group are eligible, discovered by directory
    /// scraping. Nested groups are not descended into.
    AllInGroup,
}

/// Curated set of groups/artifacts eligible for one crawl.
///
/// Groups keep their first-seen order; entries keep file order within a
/// group. Consumed once per crawl.
#[derive(Debug, Clone)]
pub struct Allowlist {
    /// `(group_id, entries)` pairs in first-seen order.
    pub allowed: Vec<(String, Vec<AllowlistEntry>)>,

    /// User-friendly description of where this allow-list came from.
    pub description: String,
}

/// Errors raised while loading an allow-list file.
#[derive(thiserror::Error, Debug)]
pub enum AllowlistError {
    #[error("Unable to read allowlist from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid allowlist line {line}: expected 'namespace,name', got '{content}'")]
    Malformed { line: usize, content: String },
}

impl Allowlist {
    /// Loads an allow-list from a CSV file with a `namespace,name` header.
    ///
    /// A `name` of `*` requests all artifacts in the namespace. Duplicate
    /// rows are dropped.
    ///
    /// Example file:
    /// ```csv
    /// namespace,name
    /// org.kodein.mock,mockmp-test-helper
    /// org.jetbrains.kotlinx,*
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistError::Io`] if the file cannot be read and
    /// [`AllowlistError::Malformed`] for rows that are not two
    /// comma-separated values.
    pub fn from_csv_file(path: &Path) -> Result<Self, AllowlistError> {
        let text = std::fs::read_to_string(path).map_err(|source| AllowlistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut allowlist = Self::from_csv(&text)?;
        allowlist.description = format!("Loaded from {}", path.display());
        Ok(allowlist)
    }

    /// Parses allow-list CSV content. See [`Allowlist::from_csv_file`].
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistError::Malformed`] for rows that are not two
    /// comma-separated values.
    pub fn from_csv(text: &str) -> Result<Self, AllowlistError> {
        let mut allowed: Vec<(String, Vec<AllowlistEntry>)> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Header row
            if idx == 0 && line.eq_ignore_ascii_case("namespace,name") {
                continue;
            }

            let Some((namespace, name)) = line.split_once(',') else {
                return Err(AllowlistError::Malformed {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let (namespace, name) = (namespace.trim(), name.trim());
            if namespace.is_empty() || name.is_empty() {
                return Err(AllowlistError::Malformed {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }

            if !seen.insert((namespace.to_string(), name.to_string())) {
                continue;
            }

            let entry = match name {
                "*" => AllowlistEntry::AllInGroup,
                name => AllowlistEntry::Artifact(name.to_string()),
            };

            match allowed.iter_mut().find(|(group, _)| group == namespace) {
                Some((_, entries)) => entries.push(entry),
                None => allowed.push((namespace.to_string(), vec![entry])),
            }
        }

        Ok(Self {
            allowed,
            description: "Parsed from CSV".to_string(),
        })
    }

    /// Builtin sample groups used when no allow-list file is given.
    pub fn example_groups() -> Self {
        let groups = [
            "io.ktor",
            "org.jetbrains.kotlinx",
            "org.apache.commons",
            "org.apache.tomcat",
            "com.google.dagger",
        ];
        Self {
            allowed: groups
                .iter()
                .map(|group| (group.to_string(), vec![AllowlistEntry::AllInGroup]))
                .collect(),
            description: format!("Builtin sample groups: {}", groups.join(", ")),
        }
    }

    /// Total number of entries across all groups.
    pub fn len(&self) -> usize {
        self.allowed.iter().map(|(_, entries)| entries.len()).sum()
    }

    /// Whether the allow-list holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl fmt::Display for Allowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}
