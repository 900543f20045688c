use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod query;
pub mod track;
pub mod work;

pub use query::{Order, PageQuery, SortDirection};
pub use track::{TrackFile, TrackNode};
pub use work::{Circle, Performer, Tag, Work};

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedWorks {
    pub works: Vec<Work>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl PagedWorks {
    pub fn has_more(&self) -> bool {
        let seen = self.pagination.current_page as u64 * self.pagination.page_size as u64;
        seen < self.pagination.total_count
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }
}

/// Size tag understood by the cover endpoint.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoverSize {
    Thumbnail,
    Small,
    #[default]
    Full,
}

impl CoverSize {
    pub fn as_query(&self) -> &'static str {
        match self {
            CoverSize::Thumbnail => "sam",
            CoverSize::Small => "240x240",
            CoverSize::Full => "main",
        }
    }
}

impl FromStr for CoverSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thumbnail" | "sam" => Ok(CoverSize::Thumbnail),
            "small" | "240x240" => Ok(CoverSize::Small),
            "full" | "main" => Ok(CoverSize::Full),
            _ => Err(()),
        }
    }
}

impl Display for CoverSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query())
    }
}

/// The catalog sends `null` for counters it has not computed yet.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
