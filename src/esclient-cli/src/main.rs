use anyhow::{bail, Context, Result};
use clap::Parser;
use esclient_core::config::normalize_base_url;
use esclient_core::ClientConfig;
use esclient_rs::{ConcurrencyToken, ElasticClient, SearchResults};
use serde::Serialize;
use std::path::Path;

mod cli;
mod telemetry;

use crate::cli::{Cli, Commands, QueryArgs, SaveArgs, SearchArgs};

const DEFAULT_CONFIG_FILE: &str = "esclient.json";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = telemetry::init_telemetry(cli.log_dir.as_deref())?;

    let config = load_config(&cli)?;
    tracing::debug!("Using {:?}", config);

    let client = ElasticClient::new(config)?;
    run(&client, cli.command).await
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(&path.to_string_lossy())
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => ClientConfig::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?,
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.base_url = normalize_base_url(url);
    }

    if let Some(user) = &cli.user {
        let password = cli.password.clone().or(config.password.take()).unwrap_or_default();
        config = config.with_basic_auth(user.clone(), password);
    } else if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }

    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &ElasticClient, command: Commands) -> Result<()> {
    match command {
        Commands::Indices => print_json(&client.index_names().await?),
        Commands::Mapping { index } => print_json(&client.mappings(&index).await?),
        Commands::Get { index, id } => match client.get_doc(&index, &id).await? {
            Some(body) => {
                println!("{}", body);
                Ok(())
            }
            None => bail!("Document id must not be blank"),
        },
        Commands::Search(args) => cmd_search(client, args).await,
        Commands::Count(args) => {
            let results = run_query(client, &args, Some(0)).await?;
            print_json(&serde_json::json!({ "count": results.total }))
        }
        Commands::Aggregate { index, field } => {
            print_json(&client.simple_aggregate(&index, &field).await?)
        }
        Commands::Save(args) => cmd_save(client, args).await,
        Commands::BulkCreate { index, file } => cmd_bulk_create(client, &index, &file).await,
        Commands::Delete { index, id } => {
            client.delete_doc(&index, &id).await?;
            tracing::info!("Deleted {}/{}", index, id);
            Ok(())
        }
        Commands::DeleteAll { index, yes } => {
            if !yes {
                bail!("Refusing to delete every document in {} without --yes", index);
            }
            let deleted = client.delete_all_docs(&index).await?;
            print_json(&serde_json::json!({ "index": index, "deleted": deleted }))
        }
    }
}

async fn run_query(client: &ElasticClient, args: &QueryArgs, max_hits: Option<u32>) -> Result<SearchResults> {
    let results = match &args.query {
        Some(query) => {
            client
                .query_string_query(&args.index, Some(query), max_hits)
                .await?
        }
        None => {
            client
                .match_query(&args.index, args.field.as_deref(), args.value.as_deref(), max_hits)
                .await?
        }
    };
    Ok(results)
}

async fn cmd_search(client: &ElasticClient, args: SearchArgs) -> Result<()> {
    let max_hits = Some(args.max_hits);

    if args.raw {
        let q = &args.query;
        let body = match &q.query {
            Some(query) => {
                client
                    .query_string_query_raw(&q.index, Some(query), max_hits)
                    .await?
            }
            None => {
                client
                    .match_query_raw(&q.index, q.field.as_deref(), q.value.as_deref(), max_hits)
                    .await?
            }
        };
        println!("{}", body);
        return Ok(());
    }

    print_json(&run_query(client, &args.query, max_hits).await?)
}

async fn cmd_save(client: &ElasticClient, args: SaveArgs) -> Result<()> {
    let document = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let token = match (args.seq_no, args.primary_term) {
        (Some(seq_no), Some(primary_term)) => Some(ConcurrencyToken::new(seq_no, primary_term)),
        _ => None,
    };

    match client
        .save_doc(&args.index, &document, args.id.as_deref(), token)
        .await?
    {
        Some(id) => print_json(&serde_json::json!({ "_id": id })),
        None => bail!("{} is empty", args.file.display()),
    }
}

async fn cmd_bulk_create(client: &ElasticClient, index: &str, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let documents: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    tracing::info!("Creating {} documents in {}", documents.len(), index);
    let ids = client.bulk_create(index, &documents).await?;
    print_json(&ids)
}
