use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub circle: Option<Circle>,
    #[serde(rename = "rate_average_2dp", default, deserialize_with = "null_as_default")]
    pub rating_average: f64,
    #[serde(rename = "dl_count", default, deserialize_with = "null_as_default")]
    pub download_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vas: Vec<Performer>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub create_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_subtitle: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nsfw: bool,
}

impl Work {
    pub fn circle_name(&self) -> &str {
        self.circle.as_ref().map_or("", |circle| circle.name.as_str())
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|tag| tag.name.as_str())
    }

    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub id: u64,
    pub name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTag")]
pub struct Tag {
    pub id: Option<u64>,
    pub name: String,
}

/// Tags arrive as objects on most endpoints and as bare names on a few.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTag {
    Named {
        #[serde(default)]
        id: Option<u64>,
        name: String,
    },
    Bare(String),
}

impl From<RawTag> for Tag {
    fn from(raw: RawTag) -> Self {
        match raw {
            RawTag::Named { id, name } => Self { id, name },
            RawTag::Bare(name) => Self { id: None, name },
        }
    }
}

/// A voice actor credited on a work.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performer {
    pub id: String,
    pub name: String,
}
