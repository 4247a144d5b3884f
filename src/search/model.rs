use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use validator::Validate;

pub const PAGE_SIZE: u32 = 30;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    Include,
    Exclude,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Relevance,
    Latest,
    Oldest,
    Title,
    Rating,
    FollowedCount,
}

impl SortKey {
    /// Upstream `order[field]=direction` pair.
    pub fn order(&self) -> (&'static str, &'static str) {
        match self {
            SortKey::Relevance => ("relevance", "desc"),
            SortKey::Latest => ("latestUploadedChapter", "desc"),
            SortKey::Oldest => ("latestUploadedChapter", "asc"),
            SortKey::Title => ("title", "asc"),
            SortKey::Rating => ("rating", "desc"),
            SortKey::FollowedCount => ("followedCount", "desc"),
        }
    }
}

#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

impl ContentRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::Safe => "safe",
            ContentRating::Suggestive => "suggestive",
            ContentRating::Erotica => "erotica",
            ContentRating::Pornographic => "pornographic",
        }
    }

    pub fn defaults() -> BTreeSet<ContentRating> {
        BTreeSet::from([ContentRating::Safe, ContentRating::Suggestive])
    }
}

#[derive(
    serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

impl MangaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MangaStatus::Ongoing => "ongoing",
            MangaStatus::Completed => "completed",
            MangaStatus::Hiatus => "hiatus",
            MangaStatus::Cancelled => "cancelled",
        }
    }
}

/// Parameters of one executed search. A tag missing from `tags` is neutral.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    #[validate(length(max = 200))]
    pub query: String,
    pub tags: BTreeMap<String, TagMode>,
    pub sort: SortKey,
    pub content_rating: BTreeSet<ContentRating>,
    pub status: BTreeSet<MangaStatus>,
    #[validate(range(min = 1))]
    pub page: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            query: String::new(),
            tags: BTreeMap::new(),
            sort: SortKey::default(),
            content_rating: ContentRating::defaults(),
            status: BTreeSet::new(),
            page: 1,
        }
    }
}

impl SearchFilters {
    /// Cycles neutral, include, exclude and back to neutral.
    pub fn toggle_tag(&mut self, tag_id: &str) {
        match self.tags.get(tag_id) {
            None => {
                self.tags.insert(tag_id.to_string(), TagMode::Include);
            }
            Some(TagMode::Include) => {
                self.tags.insert(tag_id.to_string(), TagMode::Exclude);
            }
            Some(TagMode::Exclude) => {
                self.tags.remove(tag_id);
            }
        }
    }

    pub fn tag_mode(&self, tag_id: &str) -> Option<TagMode> {
        self.tags.get(tag_id).copied()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn offset(&self, limit: u32) -> u32 {
        self.page.saturating_sub(1).saturating_mul(limit)
    }

    /// Query pairs for the upstream manga listing. Array parameters repeat
    /// their `name[]` key once per value.
    pub fn to_query(&self, limit: u32) -> Vec<(String, String)> {
        let mut query = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), self.offset(limit).to_string()),
            ("includes[]".to_string(), "cover_art".to_string()),
        ];

        let title = self.query.trim();
        if !title.is_empty() {
            query.push(("title".to_string(), title.to_string()));
        }

        for (tag_id, mode) in &self.tags {
            let key = match mode {
                TagMode::Include => "includedTags[]",
                TagMode::Exclude => "excludedTags[]",
            };
            query.push((key.to_string(), tag_id.clone()));
        }

        let ratings = if self.content_rating.is_empty() {
            ContentRating::defaults()
        } else {
            self.content_rating.clone()
        };
        for rating in ratings {
            query.push(("contentRating[]".to_string(), rating.as_str().to_string()));
        }

        for status in &self.status {
            query.push(("status[]".to_string(), status.as_str().to_string()));
        }

        let (field, direction) = self.sort.order();
        query.push((format!("order[{}]", field), direction.to_string()));

        query
    }
}

/// Filters as they were cached, with the moment they were captured.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchFilterSnapshot {
    #[serde(flatten)]
    pub filters: SearchFilters,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}
