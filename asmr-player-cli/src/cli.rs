use std::time::Duration;

use asmr_player_client::{
    Client, ClientConfig,
    client::DEFAULT_BASE_URL,
    models::{CoverSize, Order, PageQuery, SortDirection},
};
use asmr_player_controls::track_tree;
use clap::{Args, Parser, Subcommand};
use dialoguer::Password;
use snafu::prelude::*;

use crate::output::{self, Output};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, env = "ASMR_API_URL", default_value = DEFAULT_BASE_URL)]
    /// Catalog API base url.
    api_url: String,

    #[clap(short, long, env = "ASMR_USERNAME")]
    /// Sign in as this user.
    username: Option<String>,

    #[clap(short, long, env = "ASMR_PASSWORD", hide_env_values = true)]
    /// Password for --username. Prompted for when missing.
    password: Option<String>,

    #[clap(long, env = "ASMR_TOKEN", hide_env_values = true)]
    /// Reuse a token from an earlier sign-in instead of a username.
    token: Option<String>,

    #[clap(long, default_value_t = 30)]
    /// Request timeout in seconds.
    timeout_secs: u64,

    #[clap(short, long)]
    /// Log level
    verbosity: Option<tracing::Level>,

    #[clap(short, long, value_enum, default_value_t = Output::Tsv)]
    output: Output,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List works in the catalog.
    Works {
        #[clap(flatten)]
        listing: Listing,
    },
    /// Search works by keyword.
    Search {
        keyword: String,
        #[clap(flatten)]
        listing: Listing,
    },
    /// Show a work and its files.
    Work { id: u64 },
    /// Show the file outline of a work.
    Tracks { id: u64 },
    /// List tags. Requires signing in.
    Tags,
    /// List voice actors. Requires signing in.
    Performers,
    /// List circles. Requires signing in.
    Circles,
    /// Print the cover art url of a work.
    Cover {
        id: u64,
        #[clap(short, long, value_enum, default_value_t = CoverSize::Full)]
        size: CoverSize,
    },
    #[cfg(feature = "audio")]
    /// Play the audio files of a work.
    Play {
        id: u64,
        #[clap(short, long, default_value_t = 1)]
        /// Track number to start from, as shown by `tracks`.
        index: usize,

        #[clap(long, env = "ASMR_LOAD_TIMEOUT", default_value_t = 120)]
        /// Seconds a track may take to download and start.
        load_timeout_secs: u64,
    },
}

#[derive(Args)]
struct Listing {
    #[clap(long, default_value_t = 1)]
    page: u32,

    #[clap(long, value_enum)]
    order: Option<Order>,

    #[clap(long, value_enum)]
    sort: Option<SortDirection>,

    #[clap(long, default_value_t = false)]
    /// Only works with subtitles.
    subtitle_only: bool,
}

impl Listing {
    fn query(&self, base: PageQuery) -> PageQuery {
        let mut query = base;
        if let Some(order) = self.order {
            query = query.with_order(order);
        }
        if let Some(sort) = self.sort {
            query = query.with_sort(sort);
        }

        query
            .with_subtitle_only(self.subtitle_only)
            .with_page(self.page)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{error}"))]
    ClientError { error: String },
    #[snafu(display("{error}"))]
    PlayerError { error: String },
    #[snafu(display("{error}"))]
    TerminalError { error: String },
    #[snafu(display("Sign-in rejected for {username}"))]
    LoginRejected { username: String },
    #[snafu(display("Work {id} has no playable audio"))]
    NothingPlayable { id: u64 },
    #[snafu(display("Unable to render output: {source}"))]
    Render { source: serde_json::Error },
}

impl From<asmr_player_client::Error> for Error {
    fn from(error: asmr_player_client::Error) -> Self {
        let error = if error.is_unauthorized() {
            format!("{error}. Pass --username or --token to sign in.")
        } else {
            error.to_string()
        };

        Error::ClientError { error }
    }
}

impl From<asmr_player_controls::error::Error> for Error {
    fn from(error: asmr_player_controls::error::Error) -> Self {
        Error::PlayerError {
            error: error.to_string(),
        }
    }
}

impl From<asmr_player_controls::engine::EngineError> for Error {
    fn from(error: asmr_player_controls::engine::EngineError) -> Self {
        Error::PlayerError {
            error: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Render { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::TerminalError {
            error: error.to_string(),
        }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(error: dialoguer::Error) -> Self {
        Error::TerminalError {
            error: error.to_string(),
        }
    }
}

pub async fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_target(false)
        .compact()
        .init();

    let client = Client::new(ClientConfig {
        base_url: cli.api_url,
        timeout: Duration::from_secs(cli.timeout_secs),
        ..Default::default()
    })?;

    if let Some(token) = cli.token {
        client.set_token(token).await;
    } else if let Some(username) = cli.username {
        let password = match cli.password {
            Some(password) => password,
            None => Password::new()
                .with_prompt("Enter your password (hidden)")
                .interact()?,
        };

        if !client.authenticate(&username, &password).await? {
            return LoginRejectedSnafu { username }.fail();
        }
        tracing::info!("Signed in as {username}");
    }

    let output = cli.output;

    match cli.command {
        Commands::Works { listing } => {
            let query = listing.query(PageQuery::new());
            let page = client.list_works(&query).await?;
            println!("{}", output::works(output, &page)?);
            eprintln!("{}", output::page_footer(&page, &query));
        }
        Commands::Search { keyword, listing } => {
            let query = listing.query(PageQuery::for_search());
            let page = client.search(&keyword, &query).await?;
            println!("{}", output::works(output, &page)?);
            eprintln!("{}", output::page_footer(&page, &query));
        }
        Commands::Work { id } => {
            let (work, nodes) = tokio::try_join!(client.work_detail(id), client.track_tree(id))?;
            let tree = track_tree::flatten(&nodes);
            println!("{}", output::work(output, &work, &nodes, &tree)?);
        }
        Commands::Tracks { id } => {
            let nodes = client.track_tree(id).await?;
            let tree = track_tree::flatten(&nodes);
            println!("{}", output::tracks(output, &nodes, &tree)?);
        }
        Commands::Tags => {
            let tags = client.list_tags().await?;
            println!(
                "{}",
                output::named(output, &tags, |tag| (
                    tag.id.map(|id| id.to_string()).unwrap_or_default(),
                    tag.name.clone()
                ))?
            );
        }
        Commands::Performers => {
            let performers = client.list_performers().await?;
            println!(
                "{}",
                output::named(output, &performers, |performer| (
                    performer.id.clone(),
                    performer.name.clone()
                ))?
            );
        }
        Commands::Circles => {
            let circles = client.list_circles().await?;
            println!(
                "{}",
                output::named(output, &circles, |circle| (
                    circle.id.to_string(),
                    circle.name.clone()
                ))?
            );
        }
        Commands::Cover { id, size } => {
            println!("{}", output::cover(output, &client.cover_url(id, size))?);
        }
        #[cfg(feature = "audio")]
        Commands::Play {
            id,
            index,
            load_timeout_secs,
        } => {
            let config = crate::play::session_config(load_timeout_secs);
            crate::play::play(&client, id, index, config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_flags_build_the_query() {
        let cli = Cli::parse_from([
            "asmr-player",
            "works",
            "--page",
            "3",
            "--order",
            "download-count",
            "--sort",
            "asc",
            "--subtitle-only",
        ]);

        let Commands::Works { listing } = cli.command else {
            panic!("expected works");
        };
        let query = listing.query(PageQuery::new());

        assert_eq!(query.page, 3);
        assert_eq!(query.order, Order::DownloadCount);
        assert_eq!(query.sort, SortDirection::Asc);
        assert!(query.subtitle_only);
    }

    #[test]
    fn search_defaults_to_release_order() {
        let cli = Cli::parse_from(["asmr-player", "search", "rain"]);

        let Commands::Search { keyword, listing } = cli.command else {
            panic!("expected search");
        };

        assert_eq!(keyword, "rain");
        assert_eq!(listing.query(PageQuery::for_search()), PageQuery::for_search());
    }

    #[cfg(feature = "audio")]
    #[test]
    fn play_accepts_a_load_timeout() {
        let cli = Cli::parse_from(["asmr-player", "play", "403038", "--load-timeout-secs", "600"]);

        let Commands::Play {
            id,
            index,
            load_timeout_secs,
        } = cli.command
        else {
            panic!("expected play");
        };

        assert_eq!((id, index, load_timeout_secs), (403038, 1, 600));
    }

    #[test]
    fn unauthorized_errors_carry_a_hint() {
        let error: Error = asmr_player_client::Error::Unauthorized {
            endpoint: "tags".to_string(),
        }
        .into();

        assert_eq!(
            error.to_string(),
            "tags requires signing in. Pass --username or --token to sign in."
        );
    }
}
