use std::{fmt::Display, sync::Arc};

use asmr_player_client::models::{TrackFile, TrackNode};

use crate::time::Time;

pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "m4a", "ogg", "aac"];

/// Whether a file title carries one of the [`AUDIO_EXTENSIONS`], ignoring case.
pub fn is_audio(title: &str) -> bool {
    title.rsplit_once('.').is_some_and(|(_, extension)| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|audio| audio.eq_ignore_ascii_case(extension))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayableEntry {
    pub title: String,
    pub media_url: String,
    pub duration_seconds: f64,
    pub flat_index: usize,
}

impl PlayableEntry {
    /// Catalog duration, when the service knows one.
    pub fn duration(&self) -> Option<Time> {
        (self.duration_seconds > 0.0).then(|| Time::from_seconds_f64(self.duration_seconds))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutlineKind {
    Folder,
    Track { flat_index: usize, duration: Time },
    /// A leaf that cannot be played: not audio, or audio without a media url.
    File { duration: Time },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub depth: usize,
    pub title: String,
    pub kind: OutlineKind,
}

impl Display for OutlineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent = "  ".repeat(self.depth);
        match &self.kind {
            OutlineKind::Folder => write!(f, "{indent}{}/", self.title),
            OutlineKind::Track {
                flat_index,
                duration,
            } => write!(f, "{indent}{:>3}. {} ({duration})", flat_index + 1, self.title),
            OutlineKind::File { duration } if duration.mseconds() > 0 => {
                write!(f, "{indent}     {} ({duration})", self.title)
            }
            OutlineKind::File { .. } => write!(f, "{indent}     {}", self.title),
        }
    }
}

/// Ordered, navigable list of entries the session can play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    entries: Vec<Arc<PlayableEntry>>,
}

impl Playlist {
    pub fn new(entries: Vec<Arc<PlayableEntry>>) -> Self {
        Self { entries }
    }

    pub fn single(entry: Arc<PlayableEntry>) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    pub fn get(&self, index: usize) -> Option<&Arc<PlayableEntry>> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PlayableEntry>> {
        self.entries.iter()
    }

    pub fn contains(&self, entry: &PlayableEntry) -> bool {
        self.position(entry).is_some()
    }

    pub fn next_after(&self, entry: &PlayableEntry) -> Option<&Arc<PlayableEntry>> {
        self.position(entry)
            .and_then(|position| self.entries.get(position + 1))
    }

    pub fn previous_before(&self, entry: &PlayableEntry) -> Option<&Arc<PlayableEntry>> {
        self.position(entry)
            .and_then(|position| position.checked_sub(1))
            .and_then(|position| self.entries.get(position))
    }

    fn position(&self, entry: &PlayableEntry) -> Option<usize> {
        self.entries
            .iter()
            .position(|candidate| candidate.flat_index == entry.flat_index && **candidate == *entry)
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a Arc<PlayableEntry>;
    type IntoIter = std::slice::Iter<'a, Arc<PlayableEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackTree {
    pub outline: Vec<OutlineEntry>,
    pub playlist: Playlist,
}

/// Depth-first, left-to-right projection of a work's file hierarchy.
pub fn flatten(nodes: &[TrackNode]) -> TrackTree {
    let mut tree = TrackTree::default();
    walk(nodes, 0, &mut tree);
    tree
}

fn walk(nodes: &[TrackNode], depth: usize, tree: &mut TrackTree) {
    for node in nodes {
        match node {
            TrackNode::Folder { title, children } => {
                tree.outline.push(OutlineEntry {
                    depth,
                    title: title.clone(),
                    kind: OutlineKind::Folder,
                });
                walk(children, depth + 1, tree);
            }
            TrackNode::File(file) => leaf(file, depth, tree),
        }
    }
}

fn leaf(file: &TrackFile, depth: usize, tree: &mut TrackTree) {
    let duration = Time::from_seconds_f64(file.duration_seconds);

    let playable_url = file
        .media_url
        .as_deref()
        .filter(|url| !url.is_empty() && is_audio(&file.title));

    let kind = match playable_url {
        Some(media_url) => {
            let flat_index = tree.playlist.entries.len();
            tree.playlist.entries.push(Arc::new(PlayableEntry {
                title: file.title.clone(),
                media_url: media_url.to_string(),
                duration_seconds: file.duration_seconds,
                flat_index,
            }));
            OutlineKind::Track {
                flat_index,
                duration,
            }
        }
        None => OutlineKind::File { duration },
    };

    tree.outline.push(OutlineEntry {
        depth,
        title: file.title.clone(),
        kind,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(title: &str) -> TrackNode {
        TrackNode::file(title, Some(&format!("https://cdn.test/{title}")), 60.0)
    }

    fn titles(playlist: &Playlist) -> Vec<&str> {
        playlist.iter().map(|entry| entry.title.as_str()).collect()
    }

    #[test]
    fn detects_audio_extensions() {
        assert!(is_audio("01 intro.mp3"));
        assert!(is_audio("TRACK.FLAC"));
        assert!(is_audio("a.b.m4a"));
        assert!(!is_audio("cover.jpg"));
        assert!(!is_audio("notes.pdf"));
        assert!(!is_audio("mp3"));
        assert!(!is_audio("track.mp3.txt"));
    }

    #[test]
    fn flattens_depth_first_in_order() {
        let nodes = vec![TrackNode::folder(
            "root",
            vec![
                audio("A.mp3"),
                TrackNode::folder("inner", vec![audio("B.wav"), audio("C.flac")]),
                audio("D.ogg"),
            ],
        )];

        let tree = flatten(&nodes);

        assert_eq!(titles(&tree.playlist), vec!["A.mp3", "B.wav", "C.flac", "D.ogg"]);
        let indexes: Vec<usize> = tree.playlist.iter().map(|e| e.flat_index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);

        let depths: Vec<(usize, &str)> = tree
            .outline
            .iter()
            .map(|row| (row.depth, row.title.as_str()))
            .collect();
        assert_eq!(
            depths,
            vec![
                (0, "root"),
                (1, "A.mp3"),
                (1, "inner"),
                (2, "B.wav"),
                (2, "C.flac"),
                (1, "D.ogg"),
            ]
        );
    }

    #[test]
    fn non_audio_leaves_stay_in_outline_only() {
        let nodes = vec![
            audio("01.mp3"),
            TrackNode::file("script.pdf", Some("https://cdn.test/script.pdf"), 0.0),
            audio("02.mp3"),
        ];

        let tree = flatten(&nodes);

        assert_eq!(titles(&tree.playlist), vec!["01.mp3", "02.mp3"]);
        assert_eq!(tree.playlist.get(1).map(|e| e.flat_index), Some(1));
        assert_eq!(tree.outline.len(), 3);
        assert_eq!(
            tree.outline[1].kind,
            OutlineKind::File {
                duration: Time::ZERO
            }
        );
    }

    #[test]
    fn audio_without_url_is_not_playable() {
        let nodes = vec![
            TrackNode::file("missing.mp3", None, 30.0),
            audio("present.mp3"),
        ];

        let tree = flatten(&nodes);

        assert_eq!(titles(&tree.playlist), vec!["present.mp3"]);
        assert_eq!(
            tree.outline[0].kind,
            OutlineKind::File {
                duration: Time::from_seconds(30)
            }
        );
    }

    #[test]
    fn flattening_is_deterministic() {
        let nodes = vec![
            TrackNode::folder("x", vec![audio("1.aac"), TrackNode::folder("empty", vec![])]),
            audio("2.aac"),
        ];

        assert_eq!(flatten(&nodes), flatten(&nodes));
        assert_eq!(flatten(&[]), TrackTree::default());
    }

    #[test]
    fn navigates_neighbours() {
        let tree = flatten(&[audio("a.mp3"), audio("b.mp3"), audio("c.mp3")]);
        let playlist = &tree.playlist;
        let first = playlist.get(0).unwrap();
        let last = playlist.get(2).unwrap();

        assert_eq!(playlist.next_after(first).map(|e| e.title.as_str()), Some("b.mp3"));
        assert_eq!(playlist.previous_before(last).map(|e| e.title.as_str()), Some("b.mp3"));
        assert!(playlist.next_after(last).is_none());
        assert!(playlist.previous_before(first).is_none());

        let stranger = PlayableEntry {
            title: "z.mp3".to_string(),
            media_url: "https://cdn.test/z.mp3".to_string(),
            duration_seconds: 0.0,
            flat_index: 1,
        };
        assert!(!playlist.contains(&stranger));
        assert!(playlist.next_after(&stranger).is_none());
    }

    #[test]
    fn renders_outline_rows() {
        let tree = flatten(&[TrackNode::folder(
            "SE",
            vec![TrackNode::file("01.mp3", Some("https://cdn.test/01.mp3"), 125.0)],
        )]);

        let rows: Vec<String> = tree.outline.iter().map(ToString::to_string).collect();
        assert_eq!(rows, vec!["SE/", "    1. 01.mp3 (2:05)"]);
    }
}
