//! Operator entry point for a Bookshelf catalog database.
//!
//! # Responsibility
//! - Open the configured SQLite catalog and run one command against it.
//! - Print results as JSON lines for scripting.

use anyhow::{anyhow, Context};
use bookshelf_core::query::{SEARCH_BOOKS_BY_TITLE, SEARCH_GENRES_BY_TERM};
use bookshelf_core::{
    core_version, init_logging, ping, seed_catalog, CatalogService, EntityKind, QueryRequest,
    Settings, Sha256PasswordHasher, SqliteCatalogStore,
};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookshelf", about = "Bookshelf catalog tools", version)]
struct Cli {
    /// SQLite database path (overrides settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Check core linkage
    Ping,
    /// Load the deterministic seed dataset
    Seed,
    /// Search books by title fragment
    Books { title: String },
    /// Search genres by name fragment
    Genres { term: String },
    /// List every entity of one kind (authors, books, genres, ...)
    List { kind: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.command == Command::Ping {
        println!("{}", json!({ "ping": ping(), "version": core_version() }));
        return Ok(());
    }

    let settings = Settings::load().context("failed to load settings")?;
    if let Some(dir) = &settings.logging.dir {
        init_logging(&settings.logging.level, dir).context("failed to start logging")?;
    }
    let db_path = cli.db.unwrap_or_else(|| settings.database.path.clone());
    let store = SqliteCatalogStore::open(&db_path)
        .with_context(|| format!("failed to open catalog `{}`", db_path.display()))?;
    info!(
        "event=cli_command module=cli status=start command={:?}",
        cli.command
    );

    let mut service = CatalogService::with_genre_limit(store, settings.search.genre_limit);
    match cli.command {
        Command::Ping => {}
        Command::Seed => {
            let summary = seed_catalog(service.store_mut(), &Sha256PasswordHasher)?;
            println!(
                "{}",
                json!({
                    "alreadySeeded": summary.already_seeded,
                    "users": summary.users,
                    "books": summary.books,
                    "reviews": summary.reviews,
                    "comments": summary.comments,
                })
            );
        }
        Command::Books { title } => {
            let request = QueryRequest::operation(EntityKind::Book, SEARCH_BOOKS_BY_TITLE)
                .with_arg("title", title);
            print_lines(&service.query(&request)?)?;
        }
        Command::Genres { term } => {
            let request = QueryRequest::operation(EntityKind::Genre, SEARCH_GENRES_BY_TERM)
                .with_arg("term", term);
            print_lines(&service.query(&request)?)?;
        }
        Command::List { kind } => {
            let kind = EntityKind::parse(&kind).ok_or_else(|| anyhow!("unknown kind `{kind}`"))?;
            print_lines(&service.query(&QueryRequest::collection(kind))?)?;
        }
    }
    Ok(())
}

fn print_lines(output: &bookshelf_core::QueryOutput) -> anyhow::Result<()> {
    let value = serde_json::to_value(output)?;
    if let Some(items) = value.get("items").and_then(|items| items.as_array()) {
        for item in items {
            println!("{item}");
        }
    }
    Ok(())
}
