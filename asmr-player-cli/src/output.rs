use asmr_player_client::models::{PageQuery, PagedWorks, TrackNode, Work};
use asmr_player_controls::track_tree::TrackTree;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

use crate::cli::Error;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Json,
    /// Tab separated rows.
    #[default]
    Tsv,
}

pub fn works(output: Output, page: &PagedWorks) -> Result<String, Error> {
    match output {
        Output::Json => Ok(serde_json::to_string_pretty(page)?),
        Output::Tsv => Ok(page
            .works
            .iter()
            .map(work_row)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn page_footer(page: &PagedWorks, query: &PageQuery) -> String {
    let pagination = &page.pagination;
    let mut footer = format!(
        "page {} ({} works in total)",
        pagination.current_page, pagination.total_count
    );
    if page.has_more() {
        footer.push_str(&format!(", next with --page {}", query.next_page().page));
    }
    footer
}

fn price(work: &Work) -> String {
    if work.is_free() {
        "free".to_string()
    } else {
        work.price.to_string()
    }
}

fn work_row(work: &Work) -> String {
    [
        work.id.to_string(),
        work.source_id.clone().unwrap_or_default(),
        work.title.clone(),
        work.circle_name().to_string(),
        format!("{:.2}", work.rating_average),
        work.download_count.to_string(),
        price(work),
        work.tag_names().collect::<Vec<_>>().join(","),
    ]
    .join("\t")
}

pub fn work(
    output: Output,
    work: &Work,
    nodes: &[TrackNode],
    tree: &TrackTree,
) -> Result<String, Error> {
    if output == Output::Json {
        return Ok(serde_json::to_string_pretty(
            &json!({ "work": work, "tracks": nodes }),
        )?);
    }

    let performers = work
        .vas
        .iter()
        .map(|performer| performer.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("id\t{}", work.id),
        format!("source\t{}", work.source_id.as_deref().unwrap_or_default()),
        format!("title\t{}", work.title),
        format!("circle\t{}", work.circle_name()),
        format!("performers\t{performers}"),
        format!("rating\t{:.2}", work.rating_average),
        format!("downloads\t{}", work.download_count),
        format!("price\t{}", price(work)),
        format!("release\t{}", work.release.as_deref().unwrap_or_default()),
        format!("subtitles\t{}", if work.has_subtitle { "yes" } else { "no" }),
        format!("tags\t{}", work.tag_names().collect::<Vec<_>>().join(", ")),
        String::new(),
    ];
    lines.extend(tree.outline.iter().map(ToString::to_string));

    Ok(lines.join("\n"))
}

pub fn tracks(output: Output, nodes: &[TrackNode], tree: &TrackTree) -> Result<String, Error> {
    match output {
        Output::Json => Ok(serde_json::to_string_pretty(nodes)?),
        Output::Tsv => Ok(tree
            .outline
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Taxonomy listings: an id and a name per row.
pub fn named<T: Serialize>(
    output: Output,
    items: &[T],
    row: impl Fn(&T) -> (String, String),
) -> Result<String, Error> {
    match output {
        Output::Json => Ok(serde_json::to_string_pretty(items)?),
        Output::Tsv => Ok(items
            .iter()
            .map(|item| {
                let (id, name) = row(item);
                format!("{id}\t{name}")
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn cover(output: Output, url: &str) -> Result<String, Error> {
    match output {
        Output::Json => Ok(serde_json::to_string_pretty(&json!({ "url": url }))?),
        Output::Tsv => Ok(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use asmr_player_client::models::{Circle, Pagination, Tag};
    use asmr_player_controls::track_tree;

    use super::*;

    fn page() -> PagedWorks {
        PagedWorks {
            works: vec![Work {
                id: 403038,
                title: "Rainy night".to_string(),
                source_id: Some("RJ403038".to_string()),
                circle: Some(Circle {
                    id: 7,
                    name: "Quiet Room".to_string(),
                }),
                rating_average: 4.5,
                download_count: 1200,
                price: 660,
                tags: vec![
                    Tag {
                        id: Some(1),
                        name: "rain".to_string(),
                    },
                    Tag {
                        id: None,
                        name: "sleep".to_string(),
                    },
                ],
                ..Default::default()
            }],
            pagination: Pagination {
                current_page: 1,
                page_size: 1,
                total_count: 3,
            },
        }
    }

    #[test]
    fn renders_work_rows() {
        assert_eq!(
            works(Output::Tsv, &page()).unwrap(),
            "403038\tRJ403038\tRainy night\tQuiet Room\t4.50\t1200\t660\train,sleep"
        );
        assert_eq!(
            page_footer(&page(), &PageQuery::new()),
            "page 1 (3 works in total), next with --page 2"
        );
    }

    #[test]
    fn free_works_and_last_page() {
        let mut page = page();
        page.works[0].price = 0;
        page.pagination.total_count = 1;

        assert!(works(Output::Tsv, &page).unwrap().ends_with("\tfree\train,sleep"));
        assert_eq!(
            page_footer(&page, &PageQuery::new()),
            "page 1 (1 works in total)"
        );
    }

    #[test]
    fn renders_json() {
        let rendered = works(Output::Json, &page()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["works"][0]["id"], 403038);
        assert_eq!(value["pagination"]["totalCount"], 3);
    }

    #[test]
    fn renders_track_outline() {
        let nodes = vec![TrackNode::folder(
            "MP3",
            vec![
                TrackNode::file("01.mp3", Some("https://cdn.test/01.mp3"), 65.0),
                TrackNode::file("notes.txt", Some("https://cdn.test/notes.txt"), 0.0),
            ],
        )];
        let tree = track_tree::flatten(&nodes);

        assert_eq!(
            tracks(Output::Tsv, &nodes, &tree).unwrap(),
            "MP3/\n    1. 01.mp3 (1:05)\n       notes.txt"
        );
    }

    #[test]
    fn renders_named_rows() {
        let circles = vec![Circle {
            id: 7,
            name: "Quiet Room".to_string(),
        }];

        let rendered = named(Output::Tsv, &circles, |circle| {
            (circle.id.to_string(), circle.name.clone())
        })
        .unwrap();

        assert_eq!(rendered, "7\tQuiet Room");
    }
}
