use crate::{
    bookmarks::BookmarkSet,
    catalog::Catalog,
    models::{PriceTier, ToolEntry},
};

const NAME_EXACT: u32 = 1000;
const NAME_PREFIX: u32 = 500;
const NAME_CONTAINS: u32 = 300;
const BADGE_MATCH: u32 = 200;
const DESCRIPTION_MATCH: u32 = 100;
const CATEGORY_MATCH: u32 = 50;

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Scores one entry against an already normalized, non-empty query.
pub fn score(entry: &ToolEntry, query: &str) -> u32 {
    let name = entry.name.to_lowercase();
    let mut score = 0;

    if name == query {
        score += NAME_EXACT;
    } else if name.starts_with(query) {
        score += NAME_PREFIX;
    } else if name.contains(query) {
        score += NAME_CONTAINS;
    }

    let badges = entry
        .badges
        .iter()
        .map(|badge| badge.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if badges.contains(query) {
        score += BADGE_MATCH;
    }

    if entry.description.to_lowercase().contains(query) {
        score += DESCRIPTION_MATCH;
    }

    if entry.category.to_lowercase().contains(query) {
        score += CATEGORY_MATCH;
    }

    score
}

/// Matching entries by descending score; ties keep catalog order. An empty
/// query returns the whole catalog unscored.
pub fn rank<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a ToolEntry> {
    let query = normalize_query(query);
    if query.is_empty() {
        return catalog.entries().iter().collect();
    }

    let mut scored = catalog
        .entries()
        .iter()
        .map(|entry| (score(entry, &query), entry))
        .filter(|(score, _)| *score > 0)
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, entry)| entry).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("all") => Self::All,
            Some(key) => Self::Only(key.to_string()),
        }
    }

    pub fn matches(&self, entry: &ToolEntry) -> bool {
        match self {
            Self::All => true,
            Self::Only(key) => entry.category == *key,
        }
    }
}

/// Everything that decides which entries are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub category: CategoryFilter,
    pub price: Option<PriceTier>,
    pub query: String,
    pub showing_bookmarks: bool,
}

impl ViewState {
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }

    pub fn select_category(&self, key: &str) -> Self {
        let category = match CategoryFilter::parse(Some(key)) {
            CategoryFilter::All => CategoryFilter::All,
            selected if selected == self.category => CategoryFilter::All,
            selected => selected,
        };
        Self {
            category,
            showing_bookmarks: false,
            ..self.clone()
        }
    }

    pub fn toggle_price(&self, tier: PriceTier) -> Self {
        if self.showing_bookmarks {
            return self.clone();
        }
        let price = if self.price == Some(tier) {
            None
        } else {
            Some(tier)
        };
        Self {
            price,
            ..self.clone()
        }
    }

    pub fn toggle_bookmarks_view(&self) -> Self {
        if self.showing_bookmarks {
            Self {
                category: CategoryFilter::All,
                showing_bookmarks: false,
                ..self.clone()
            }
        } else {
            Self {
                showing_bookmarks: true,
                ..Self::default()
            }
        }
    }

    pub fn has_active_criteria(&self) -> bool {
        !self.query.is_empty() || self.category != CategoryFilter::All || self.price.is_some()
    }

    fn admits(&self, entry: &ToolEntry) -> bool {
        self.category.matches(entry) && self.price.is_none_or(|tier| entry.price == tier)
    }
}

pub fn compute_visible_entries<'a>(
    catalog: &'a Catalog,
    bookmarks: &BookmarkSet,
    view: &ViewState,
) -> Vec<&'a ToolEntry> {
    if view.showing_bookmarks {
        return catalog
            .entries()
            .iter()
            .filter(|entry| bookmarks.contains(entry.id))
            .collect();
    }

    rank(catalog, &view.query)
        .into_iter()
        .filter(|entry| view.admits(entry))
        .collect()
}
