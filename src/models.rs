use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTier {
    Free,
    OpenSource,
    Paid,
    Freemium,
}

impl PriceTier {
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free | Self::OpenSource)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEntry {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: PriceTier,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub logo: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub name: String,
    pub reason: String,
    pub in_directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedCategory {
    pub category: String,
    pub items: Vec<RecommendationItem>,
}

/// Reconciled recommendations, keyed by category in the order the model
/// produced them. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendations {
    pub categories: Vec<RecommendedCategory>,
}

impl Recommendations {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &RecommendationItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }
}

impl Serialize for Recommendations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.categories.iter().map(|c| (&c.category, &c.items)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_tools: usize,
    pub free_tools: usize,
    pub categories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<PriceTier>,
    #[serde(default)]
    pub bookmarks: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyState {
    Bookmarks,
    Search,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListResponse {
    pub tools: Vec<ToolEntry>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolExistsQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolExistsResponse {
    pub name: String,
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub key: &'static str,
    pub title: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsResponse<T: Serialize> {
    pub success: bool,
    pub recommendations: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarksResponse {
    pub ids: Vec<u64>,
    pub tools: Vec<ToolEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkToggleResponse {
    pub id: u64,
    pub bookmarked: bool,
    pub ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionAccepted {
    pub accepted: bool,
    pub message: String,
}
