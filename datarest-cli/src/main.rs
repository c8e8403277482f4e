//! datarest command-line tool
//!
//! Renders hypermedia resources and applies patches over local files:
//!
//!   datarest --metadata entities.json --data data.json show /people/1
//!   datarest ... list people --page 0 --size 20
//!   datarest ... patch /people/1 '{"name": "Ann"}'
//!   datarest ... put /people/7 @person.json
//!
//! Writes are applied to the in-memory dataset and the resulting
//! representation is printed; the data file is left untouched.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use datarest_cli::{DataRest, Preconditions, Response};
use datarest_hal::RepresentationShape;
use datarest_patch::{MERGE_PATCH_MEDIA_TYPE, PatchStrategy};
use datarest_types::HttpDate;
use serde_json::Value as Json;
use std::path::PathBuf;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "datarest")]
#[command(about = "Render hypermedia resources and apply patches over local data files")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "datarest.toml")]
    config: PathBuf,

    /// Path to the entity metadata document
    #[arg(short, long, default_value = "entities.json")]
    metadata: PathBuf,

    /// Path to the JSON dataset
    #[arg(short, long, default_value = "data.json")]
    data: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single item
    Show {
        /// Item URI, absolute or relative to the base URI
        uri: String,

        /// Accepted media type, e.g. text/uri-list
        #[arg(long, default_value = "application/hal+json")]
        accept: String,

        #[arg(long)]
        if_none_match: Option<String>,

        /// HTTP date, e.g. "Sun, 06 Nov 1994 08:49:37 GMT"
        #[arg(long)]
        if_modified_since: Option<String>,
    },

    /// Render a collection
    List {
        /// Collection path segment, e.g. people
        collection: String,

        /// Zero-based page number
        #[arg(long)]
        page: Option<u64>,

        #[arg(long, default_value = "20")]
        size: u64,
    },

    /// Render the schema of a collection's entity type
    Schema { collection: String },

    /// Apply a partial update
    Patch {
        uri: String,

        /// Patch document, or @path to read it from a file
        payload: String,

        /// Selects JSON Patch or merge patch semantics
        #[arg(long, default_value = MERGE_PATCH_MEDIA_TYPE)]
        content_type: String,

        #[arg(long)]
        if_match: Option<String>,
    },

    /// Replace an item, or create it if absent
    Put {
        uri: String,

        /// Full representation, or @path to read it from a file
        payload: String,

        #[arg(long)]
        if_match: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut service = DataRest::open(&args.config, &args.metadata, &args.data)?;

    let response = match args.command {
        Command::Show {
            uri,
            accept,
            if_none_match,
            if_modified_since,
        } => {
            let if_modified_since = if_modified_since
                .map(|date| HttpDate::parse(&date))
                .transpose()
                .context("invalid --if-modified-since")?;
            let preconditions = Preconditions {
                if_none_match,
                if_modified_since,
                ..Preconditions::default()
            };
            service.show(&uri, RepresentationShape::from_media_type(&accept), &preconditions)
        }
        Command::List {
            collection,
            page,
            size,
        } => service.list(&collection, page.map(|number| (number, size))),
        Command::Schema { collection } => service.schema(&collection),
        Command::Patch {
            uri,
            payload,
            content_type,
            if_match,
        } => {
            let strategy = PatchStrategy::from_content_type(&content_type);
            debug!("Selected {} for content type {}", strategy, content_type);
            let payload = read_payload(&payload)?;
            service.update(&uri, strategy, &payload, &Preconditions {
                if_match,
                ..Preconditions::default()
            })
        }
        Command::Put {
            uri,
            payload,
            if_match,
        } => {
            let payload = read_payload(&payload)?;
            service.update(&uri, PatchStrategy::Put, &payload, &Preconditions {
                if_match,
                ..Preconditions::default()
            })
        }
    };

    print_response(&response);
    if response.status >= 400 {
        std::process::exit(1);
    }
    Ok(())
}

fn read_payload(argument: &str) -> Result<Json> {
    let text = match argument.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read payload file {path}"))?,
        None => argument.to_string(),
    };
    if text.trim().is_empty() {
        bail!("empty payload");
    }
    serde_json::from_str(&text).context("payload is not valid JSON")
}

fn print_response(response: &Response) {
    println!("{}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    if !response.body.is_empty() {
        println!();
        match serde_json::from_str::<Json>(&response.body) {
            Ok(json) => match serde_json::to_string_pretty(&json) {
                Ok(pretty) => println!("{pretty}"),
                Err(_) => println!("{}", response.body),
            },
            Err(_) => println!("{}", response.body),
        }
    }
}
