use std::{collections::HashSet, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::models::{CatalogStats, ToolEntry};

pub const CATEGORY_TITLES: &[(&str, &str)] = &[
    ("ai", "AI & Machine Learning"),
    ("frontend", "Frontend"),
    ("backend", "Backend"),
    ("developer-tools", "Developer Tools"),
    ("apis", "APIs"),
    ("database", "Database"),
    ("debugging", "Debugging"),
    ("testing", "Testing"),
    ("deployment", "Deployment"),
    ("version-control", "Version Control"),
    ("package-manager", "Package Manager"),
    ("devops", "DevOps"),
    ("automation", "Automation"),
    ("monitoring", "Monitoring"),
    ("performance", "Performance"),
    ("security", "Security"),
    ("cli", "CLI"),
    ("design", "Design"),
    ("documentation", "Documentation"),
    ("productivity", "Productivity"),
    ("collaboration", "Collaboration"),
    ("mobile", "Mobile"),
    ("cloud", "Cloud"),
    ("analytics", "Analytics"),
];

pub fn category_title(key: &str) -> &str {
    let lowered = key.to_lowercase();
    CATEGORY_TITLES
        .iter()
        .find(|(k, _)| *k == lowered)
        .map(|(_, title)| *title)
        .unwrap_or(key)
}

pub fn category_keys() -> impl Iterator<Item = &'static str> {
    CATEGORY_TITLES.iter().map(|(key, _)| *key)
}

/// Read-only tool directory, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ToolEntry>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ToolEntry>) -> Self {
        Self { entries }
    }

    /// Loads from a path, `file://` reference or `http(s)://` URL. Failures
    /// are logged and produce an empty catalog.
    pub async fn load(source: &str) -> Self {
        match fetch_entries(source).await {
            Ok(entries) => {
                let catalog = Self::from_entries(entries);
                info!("Loaded {} tools from {}", catalog.len(), source);
                let duplicates = catalog.duplicate_names();
                if !duplicates.is_empty() {
                    warn!("Catalog contains duplicate tool names: {:?}", duplicates);
                }
                catalog
            }
            Err(err) => {
                error!("Error loading tools from {}: {err:#}", source);
                Self::empty()
            }
        }
    }

    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&ToolEntry> {
        self.entries.iter().find(|tool| tool.id == id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.entries
            .iter()
            .any(|tool| tool.name.trim().to_lowercase() == wanted)
    }

    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for tool in &self.entries {
            let name = tool.name.trim().to_lowercase();
            if !seen.insert(name.clone()) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    pub fn stats(&self) -> CatalogStats {
        let categories = self
            .entries
            .iter()
            .map(|tool| tool.category.as_str())
            .collect::<HashSet<_>>()
            .len();
        CatalogStats {
            total_tools: self.entries.len(),
            free_tools: self.entries.iter().filter(|t| t.price.is_free()).count(),
            categories,
        }
    }

    pub fn category_count(&self, key: &str) -> usize {
        self.entries.iter().filter(|t| t.category == key).count()
    }

    pub fn names_list(&self) -> String {
        self.entries
            .iter()
            .map(|tool| tool.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn plain_text_list(&self) -> String {
        self.entries
            .iter()
            .map(|tool| tool.name.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

async fn fetch_entries(source: &str) -> Result<Vec<ToolEntry>> {
    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await
            .with_context(|| format!("Failed to fetch catalog from {source}"))?
            .error_for_status()
            .with_context(|| format!("Catalog request to {source} was rejected"))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read catalog body from {source}"))?
            .to_vec()
    } else {
        let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed reading catalog {}", path.display()))?
    };

    serde_json::from_slice::<Vec<ToolEntry>>(&raw).context("Failed to decode catalog JSON")
}
