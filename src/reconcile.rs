//! Post-processing of model-generated recommendations: name cleanup,
//! response-wide deduplication and matching against the catalog.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    models::{RecommendationItem, RecommendedCategory, Recommendations, ToolEntry},
};

pub const DEFAULT_REASON: &str = "Recommended for your project needs";

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static VERSION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+v?[0-9]+(\.[0-9]+)*\s*$").unwrap());
static GENERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(framework|library|tool|js|css)$").unwrap());

/// "React (v18)" -> "React", "Vue 3.2" -> "Vue", "Express framework" -> "Express".
pub fn clean_name(raw: &str) -> String {
    let name = raw.trim();
    let name = PARENTHETICAL.replace_all(name, "");
    let name = VERSION_SUFFIX.replace(&name, "");
    let name = GENERIC_SUFFIX.replace(&name, "");
    name.trim().to_string()
}

pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Lookup keys over catalog names. Keys keep their first insertion position;
/// a repeated key points at the most recent entry.
#[derive(Debug)]
pub struct DirectoryIndex<'a> {
    entries: &'a [ToolEntry],
    keys: Vec<String>,
    slots: HashMap<String, usize>,
}

impl<'a> DirectoryIndex<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        let mut index = Self {
            entries: catalog.entries(),
            keys: Vec::new(),
            slots: HashMap::new(),
        };
        for (pos, entry) in catalog.entries().iter().enumerate() {
            index.insert(normalize_name(&entry.name), pos);
            index.insert(entry.name.to_lowercase(), pos);
        }
        index
    }

    fn insert(&mut self, key: String, pos: usize) {
        if self.slots.insert(key.clone(), pos).is_none() {
            self.keys.push(key);
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a ToolEntry> {
        self.slots.get(key).map(|pos| &self.entries[*pos])
    }

    /// Exact, then alphanumeric-only, then substring in either direction.
    /// An empty normalized name is a substring of every key.
    pub fn resolve(&self, cleaned: &str) -> Option<&'a ToolEntry> {
        if let Some(entry) = self.lookup(&cleaned.to_lowercase()) {
            return Some(entry);
        }

        let normalized = normalize_name(cleaned);
        if let Some(entry) = self.lookup(&normalized) {
            return Some(entry);
        }

        self.keys
            .iter()
            .find(|key| key.contains(normalized.as_str()) || normalized.contains(key.as_str()))
            .and_then(|key| self.lookup(key))
    }
}

pub fn reconcile(raw: &Value, catalog: &Catalog) -> Recommendations {
    let Some(categories) = raw.as_object() else {
        debug!("Recommendation payload is not an object; nothing to reconcile");
        return Recommendations::default();
    };

    let index = DirectoryIndex::new(catalog);
    let mut seen = HashSet::new();
    let mut output = Recommendations::default();

    for (category, items) in categories {
        let Some(items) = items.as_array() else {
            continue;
        };

        let mut cleaned_items = Vec::new();
        for item in items {
            let Some(raw_name) = item
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
            else {
                continue;
            };

            let cleaned = clean_name(raw_name);
            if !seen.insert(cleaned.to_lowercase()) {
                warn!("Duplicate tool detected and skipped: {}", cleaned);
                continue;
            }

            let matched = index.resolve(&cleaned);
            let reason = item
                .get("reason")
                .and_then(Value::as_str)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_REASON)
                .to_string();
            let url = match matched {
                Some(_) => None,
                None => item
                    .get("url")
                    .and_then(Value::as_str)
                    .filter(|u| !u.is_empty())
                    .map(ToString::to_string),
            };

            cleaned_items.push(RecommendationItem {
                name: matched.map(|entry| entry.name.clone()).unwrap_or(cleaned),
                reason,
                in_directory: matched.is_some(),
                url,
            });
        }

        if !cleaned_items.is_empty() {
            output.categories.push(RecommendedCategory {
                category: category.clone(),
                items: cleaned_items,
            });
        }
    }

    output
}
