use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    #[default]
    CreateDate,
    Release,
    DownloadCount,
    Price,
    Rating,
    ReviewCount,
    Id,
    Random,
}

impl Order {
    pub fn as_param(&self) -> &'static str {
        match self {
            Order::CreateDate => "create_date",
            Order::Release => "release",
            Order::DownloadCount => "dl_count",
            Order::Price => "price",
            Order::Rating => "rate_average_2dp",
            Order::ReviewCount => "review_count",
            Order::Id => "id",
            Order::Random => "random",
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One page request against a listing or search endpoint.
///
/// Queries are values: moving to another page or changing the ordering
/// builds a new query rather than mutating the one a request was issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub order: Order,
    pub sort: SortDirection,
    pub subtitle_only: bool,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            order: Order::CreateDate,
            sort: SortDirection::Desc,
            subtitle_only: false,
        }
    }
}

impl PageQuery {
    pub fn new() -> Self {
        Default::default()
    }

    /// Ordering used by keyword search when the caller has no preference.
    pub fn for_search() -> Self {
        Self {
            order: Order::Release,
            ..Default::default()
        }
    }

    pub fn with_page(self, page: u32) -> Self {
        Self { page, ..self }
    }

    pub fn with_order(self, order: Order) -> Self {
        Self {
            order,
            page: 1,
            ..self
        }
    }

    pub fn with_sort(self, sort: SortDirection) -> Self {
        Self {
            sort,
            page: 1,
            ..self
        }
    }

    pub fn with_subtitle_only(self, subtitle_only: bool) -> Self {
        Self {
            subtitle_only,
            page: 1,
            ..self
        }
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..*self
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("order", self.order.as_param().to_string()),
            ("sort", self.sort.as_param().to_string()),
            ("subtitle", if self.subtitle_only { "1" } else { "0" }.to_string()),
        ]
    }
}
