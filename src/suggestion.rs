use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::catalog::Catalog;

pub const ACKNOWLEDGMENT: &str =
    "Thank you for your suggestion! We'll review it and add it to our directory soon.";

const ENTRY_NAME: &str = "entry.1806715086";
const ENTRY_DESCRIPTION: &str = "entry.441835730";
const ENTRY_CATEGORY: &str = "entry.1645444266";
const ENTRY_URL: &str = "entry.669532944";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("A tool named \"{0}\" already exists in the directory.")]
    AlreadyListed(String),
    #[error("Please enter a valid URL (including http:// or https://)")]
    InvalidUrl,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub url: String,
}

impl ToolSuggestion {
    /// Returns a trimmed copy ready for submission.
    pub fn validate(&self, catalog: &Catalog) -> Result<Self, SuggestionError> {
        let trimmed = Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            url: self.url.trim().to_string(),
        };

        if trimmed.name.is_empty()
            || trimmed.description.is_empty()
            || trimmed.category.is_empty()
            || trimmed.url.is_empty()
        {
            return Err(SuggestionError::MissingFields);
        }
        if catalog.contains_name(&trimmed.name) {
            return Err(SuggestionError::AlreadyListed(trimmed.name));
        }
        if Url::parse(&trimmed.url).is_err() {
            return Err(SuggestionError::InvalidUrl);
        }
        Ok(trimmed)
    }

    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            (ENTRY_NAME, self.name.as_str()),
            (ENTRY_DESCRIPTION, self.description.as_str()),
            (ENTRY_CATEGORY, self.category.as_str()),
            (ENTRY_URL, self.url.as_str()),
        ]
    }
}

/// Forwards suggestions to the external form collector without waiting for
/// or inspecting its response.
#[derive(Debug, Clone)]
pub struct FormSubmitter {
    client: Client,
    form_url: String,
}

impl FormSubmitter {
    pub fn new(form_url: String) -> Self {
        Self {
            client: Client::new(),
            form_url,
        }
    }

    pub fn submit_detached(&self, suggestion: ToolSuggestion) {
        let client = self.client.clone();
        let form_url = self.form_url.clone();
        tokio::spawn(async move {
            let fields = suggestion.form_fields();
            match client.post(&form_url).form(&fields[..]).send().await {
                Ok(_) => info!("Forwarded tool suggestion {}", suggestion.name),
                Err(err) => warn!("Submission error for {}: {}", suggestion.name, err),
            }
        });
    }
}
