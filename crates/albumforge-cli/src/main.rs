#![deny(unsafe_code)]

//! Albumforge CLI — declarative smart-album selection for Immich.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use albumforge_config::AppConfig;
use albumforge_core::api::LibraryBackend;
use albumforge_core::pipeline::{
    CategoryPlan, LocalSelectors, ModeLists, SelectionPipeline, SelectionPlan,
};
use albumforge_core::query::{ContentQuery, MetadataQuery};
use albumforge_core::rules::{CombineMode, LocalFilterSet};
use albumforge_core::{report, ImmichClient};

/// Albumforge — select photo-library assets with declarative search and
/// filter criteria, and optionally add them to an album.
#[derive(Parser)]
#[command(name = "albumforge", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "albumforge.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a selection and preview it or add it to an album.
    Run(Box<RunArgs>),

    /// List albums visible to the API key.
    Albums,

    /// List named people recognised by the server.
    People,

    /// List user accounts (may require admin privileges).
    Users,

    /// Show the authenticated user.
    Me,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Selection criteria. Query inputs may be a JSON file path, an inline JSON
/// object, or (for content queries) a bare query string with an optional
/// `@N` result-limit suffix. Local filter inputs may be a JSON file path,
/// an inline JSON array, or the `path:regex` shorthand.
#[derive(Args)]
struct RunArgs {
    /// Include assets matching ANY of these metadata queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    include_metadata_union: Vec<String>,

    /// Include assets matching ALL of these metadata queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    include_metadata_intersection: Vec<String>,

    /// Exclude assets matching ANY of these metadata queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    exclude_metadata_union: Vec<String>,

    /// Exclude assets matching ALL of these metadata queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    exclude_metadata_intersection: Vec<String>,

    /// Include assets matching ANY of these content queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    include_content_union: Vec<String>,

    /// Include assets matching ALL of these content queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    include_content_intersection: Vec<String>,

    /// Exclude assets matching ANY of these content queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    exclude_content_union: Vec<String>,

    /// Exclude assets matching ALL of these content queries.
    #[arg(long, value_name = "QUERY", num_args = 1..)]
    exclude_content_intersection: Vec<String>,

    /// Include assets containing ANY of these people (name or UUID).
    #[arg(long, value_name = "PERSON", num_args = 1..)]
    include_person_union: Vec<String>,

    /// Include assets containing ALL of these people (name or UUID).
    #[arg(long, value_name = "PERSON", num_args = 1..)]
    include_person_intersection: Vec<String>,

    /// Exclude assets containing ANY of these people (name or UUID).
    #[arg(long, value_name = "PERSON", num_args = 1..)]
    exclude_person_union: Vec<String>,

    /// Exclude assets containing ALL of these people (name or UUID).
    #[arg(long, value_name = "PERSON", num_args = 1..)]
    exclude_person_intersection: Vec<String>,

    /// Keep only assets matching ANY of these local filter rules.
    #[arg(long, value_name = "RULE", num_args = 1..)]
    include_local_union: Vec<String>,

    /// Keep only assets matching ALL of these local filter rules.
    #[arg(long, value_name = "RULE", num_args = 1..)]
    include_local_intersection: Vec<String>,

    /// Drop assets matching ANY of these local filter rules.
    #[arg(long, value_name = "RULE", num_args = 1..)]
    exclude_local_union: Vec<String>,

    /// Drop assets matching ALL of these local filter rules.
    #[arg(long, value_name = "RULE", num_args = 1..)]
    exclude_local_intersection: Vec<String>,

    /// Album (name or UUID) to add the selection to. Omit to preview.
    #[arg(long, value_name = "ALBUM")]
    album: Option<String>,

    /// Cap the selection at this many assets. The selection is an
    /// unordered set, so which assets survive the cap is arbitrary.
    #[arg(long, value_name = "N")]
    max_assets: Option<usize>,

    /// Default result limit for content queries (overrides the config
    /// value; individual queries can still use the `@N` notation).
    #[arg(long, value_name = "N")]
    content_limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = load_config(&cli.config).await?;

    // Verbosity flags override the configured level; RUST_LOG beats both.
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !config_found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Run(args) => cmd_run(&config, *args).await?,
        Commands::Albums => cmd_albums(&config).await?,
        Commands::People => cmd_people(&config).await?,
        Commands::Users => cmd_users(&config).await?,
        Commands::Me => cmd_me(&config).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

fn build_client(config: &AppConfig) -> Result<ImmichClient> {
    let Some(url) = config.server.resolved_url() else {
        bail!(
            "no server URL configured; set server.url or the {} environment variable",
            albumforge_config::SERVER_URL_ENV
        );
    };
    let Some(api_key) = config.server.resolved_api_key() else {
        bail!(
            "no API key configured; set server.api_key or the {} environment variable",
            albumforge_config::API_KEY_ENV
        );
    };
    Ok(ImmichClient::new(url, api_key))
}

async fn cmd_run(config: &AppConfig, args: RunArgs) -> Result<()> {
    // Static criteria parse first: malformed queries, paths, and regexes
    // must surface before a single remote call is made.
    let mut plan = SelectionPlan {
        metadata: CategoryPlan {
            include: ModeLists {
                union: parse_metadata(&args.include_metadata_union)?,
                intersection: parse_metadata(&args.include_metadata_intersection)?,
            },
            exclude: ModeLists {
                union: parse_metadata(&args.exclude_metadata_union)?,
                intersection: parse_metadata(&args.exclude_metadata_intersection)?,
            },
        },
        content: CategoryPlan {
            include: ModeLists {
                union: parse_content(&args.include_content_union)?,
                intersection: parse_content(&args.include_content_intersection)?,
            },
            exclude: ModeLists {
                union: parse_content(&args.exclude_content_union)?,
                intersection: parse_content(&args.exclude_content_intersection)?,
            },
        },
        local_include: LocalSelectors {
            union: LocalFilterSet::load(&args.include_local_union, CombineMode::Any)?,
            intersection: LocalFilterSet::load(
                &args.include_local_intersection,
                CombineMode::All,
            )?,
        },
        local_exclude: LocalSelectors {
            union: LocalFilterSet::load(&args.exclude_local_union, CombineMode::Any)?,
            intersection: LocalFilterSet::load(
                &args.exclude_local_intersection,
                CombineMode::All,
            )?,
        },
        max_assets: args.max_assets,
    };

    let client = build_client(config)?;

    // Person criteria become metadata queries once the names resolve.
    // An unresolvable name aborts here, before any search runs.
    append_person_queries(
        &client,
        &args.include_person_union,
        &args.include_person_intersection,
        &mut plan.metadata.include,
    )
    .await?;
    append_person_queries(
        &client,
        &args.exclude_person_union,
        &args.exclude_person_intersection,
        &mut plan.metadata.exclude,
    )
    .await?;

    if !plan.has_criteria() {
        bail!("no selection criteria given; see `albumforge run --help`");
    }

    // Resolve the album before running searches so a bad reference fails
    // cheaply and nothing is mutated.
    let album_id = match &args.album {
        Some(reference) => Some(
            client
                .resolve_album(reference)
                .await
                .with_context(|| format!("resolving album {reference:?}"))?,
        ),
        None => None,
    };

    let default_limit = args
        .content_limit
        .unwrap_or(config.selection.default_content_limit);
    let pipeline = SelectionPipeline::new(&client, default_limit);
    let selection = pipeline.run(&plan).await?;

    info!(
        known = selection.stats.known,
        selected = selection.stats.selected,
        excluded = selection.stats.excluded,
        "selection finished"
    );

    if selection.assets.is_empty() {
        println!("No assets matched all criteria.");
        return Ok(());
    }

    match album_id {
        None => report::preview(&selection, client.base_url()),
        Some(album_id) => {
            let added =
                report::publish(&client, &album_id, &selection, config.selection.chunk_size)
                    .await?;
            println!("Added {added} assets to album.");
        }
    }

    Ok(())
}

fn parse_metadata(inputs: &[String]) -> Result<Vec<MetadataQuery>> {
    inputs
        .iter()
        .map(|input| MetadataQuery::parse(input).map_err(Into::into))
        .collect()
}

fn parse_content(inputs: &[String]) -> Result<Vec<ContentQuery>> {
    inputs
        .iter()
        .map(|input| ContentQuery::parse(input).map_err(Into::into))
        .collect()
}

/// Resolve person references and push the equivalent metadata queries.
///
/// Union-mode people fan out into one query per person id, so any of them
/// includes/excludes the asset. Intersection-mode people share one query:
/// the server ANDs `personIds`, which is exactly the ALL semantics.
async fn append_person_queries(
    backend: &dyn LibraryBackend,
    union_refs: &[String],
    intersection_refs: &[String],
    lists: &mut ModeLists<MetadataQuery>,
) -> Result<()> {
    for reference in union_refs {
        let ids = backend
            .resolve_person(reference)
            .await
            .with_context(|| format!("resolving person {reference:?}"))?;
        for id in ids {
            lists
                .union
                .push(MetadataQuery::for_person_ids(vec![id], format!("person:{reference}")));
        }
    }

    if !intersection_refs.is_empty() {
        let mut all_ids = Vec::new();
        for reference in intersection_refs {
            let ids = backend
                .resolve_person(reference)
                .await
                .with_context(|| format!("resolving person {reference:?}"))?;
            all_ids.extend(ids);
        }
        lists.intersection.push(MetadataQuery::for_person_ids(
            all_ids,
            format!("people:{}", intersection_refs.join(",")),
        ));
    }

    Ok(())
}

async fn cmd_albums(config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let albums = client.list_albums().await?;
    if albums.is_empty() {
        println!("No albums found.");
        return Ok(());
    }
    println!("{:<38} {:<7} {:>7}  {}", "id", "shared", "assets", "name");
    for album in albums {
        println!(
            "{:<38} {:<7} {:>7}  {}",
            album.id, album.shared, album.asset_count, album.album_name
        );
    }
    Ok(())
}

async fn cmd_people(config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let people = client.list_people().await?;
    let named: Vec<_> = people.into_iter().filter(|p| !p.name.is_empty()).collect();
    if named.is_empty() {
        println!("No people with names found.");
        return Ok(());
    }
    println!("{:<38} {}", "id", "name");
    for person in named {
        println!("{:<38} {}", person.id, person.name);
    }
    Ok(())
}

async fn cmd_users(config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let users = client
        .list_users()
        .await
        .context("listing users (this may require admin privileges)")?;
    println!("{:<38} {:<25} {}", "id", "name", "email");
    for user in users {
        println!("{:<38} {:<25} {}", user.id, user.name, user.email);
    }
    Ok(())
}

async fn cmd_me(config: &AppConfig) -> Result<()> {
    let client = build_client(config)?;
    let user = client.current_user().await?;
    println!("id:    {}", user.id);
    println!("name:  {}", user.name);
    println!("email: {}", user.email);
    println!("admin: {}", user.is_admin);
    Ok(())
}

fn cmd_config(path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let json = serde_json::to_string_pretty(config).context("rendering config")?;
        println!("{json}");
    } else {
        println!("Configuration at '{}' is valid.", path.display());
    }
    Ok(())
}
