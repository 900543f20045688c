use serde::{Deserialize, Deserializer, Serialize};

/// A node of a work's file hierarchy as served by the `tracks` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrackNode {
    Folder {
        title: String,
        children: Vec<TrackNode>,
    },
    File(TrackFile),
}

/// Serializes with the catalog's field names, so rendered trees read back.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFile {
    pub title: String,
    #[serde(rename = "mediaStreamUrl")]
    pub media_url: Option<String>,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

impl TrackNode {
    pub fn title(&self) -> &str {
        match self {
            TrackNode::Folder { title, .. } => title,
            TrackNode::File(file) => &file.title,
        }
    }

    pub fn folder(title: impl Into<String>, children: Vec<TrackNode>) -> Self {
        TrackNode::Folder {
            title: title.into(),
            children,
        }
    }

    pub fn file(title: impl Into<String>, media_url: Option<&str>, duration_seconds: f64) -> Self {
        TrackNode::File(TrackFile {
            title: title.into(),
            media_url: media_url.map(str::to_string),
            duration_seconds,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrackNode {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    children: Option<Vec<TrackNode>>,
    #[serde(default)]
    media_stream_url: Option<String>,
    #[serde(default)]
    media_download_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl<'de> Deserialize<'de> for TrackNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawTrackNode::deserialize(deserializer).map(Into::into)
    }
}

impl From<RawTrackNode> for TrackNode {
    fn from(raw: RawTrackNode) -> Self {
        if raw.kind == "folder" {
            return TrackNode::Folder {
                title: raw.title,
                children: raw.children.unwrap_or_default(),
            };
        }

        let media_url = [raw.media_stream_url, raw.media_download_url]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty());

        TrackNode::File(TrackFile {
            title: raw.title,
            media_url,
            duration_seconds: raw.duration.unwrap_or_default(),
        })
    }
}
