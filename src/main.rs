//! Command-line entry point: create (or reuse) a store, ingest one document, and ask about it.
use anyhow::{Context, Result};
use clap::Parser;
use filesearch::{
    config,
    ingestion::{CancelToken, IngestionService, PollSettings},
    logging,
    store::{FileSearchService, StoreRef},
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "filesearch",
    about = "Upload a document to a File Search store and ask a grounded question about it"
)]
struct Cli {
    /// Document to upload.
    #[arg(long)]
    file: PathBuf,
    /// Question answered from the uploaded content.
    #[arg(long)]
    prompt: String,
    /// Existing store to upload into instead of creating a new one.
    #[arg(long)]
    store: Option<String>,
    /// Display name for a newly created store.
    #[arg(long, default_value = "filesearch-store")]
    store_display_name: String,
    /// Display name for the uploaded document.
    #[arg(long)]
    display_name: Option<String>,
    /// Model override.
    #[arg(long)]
    model: Option<String>,
    /// Seconds between status checks.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
    /// Give up after this many status checks.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config().context("failed to load configuration")?;
    logging::init_tracing(config.log_file.as_deref());
    tracing::debug!(
        base_url = %config.base_url,
        model = %config.model,
        poll_interval = ?config.poll_interval,
        max_poll_attempts = ?config.max_poll_attempts,
        "Loaded configuration"
    );

    if let Some(model) = cli.model {
        config.model = model;
    }
    let mut settings = PollSettings::from_config(&config);
    if let Some(secs) = cli.interval_secs {
        settings.interval = Duration::from_secs(secs);
    }
    if let Some(max_attempts) = cli.max_attempts {
        settings.max_attempts = Some(max_attempts);
    }

    let backend = FileSearchService::new(&config).context("failed to build File Search client")?;
    let service = IngestionService::with_settings(backend, settings, config.model.clone());

    let store = match cli.store {
        Some(name) => StoreRef::named(name),
        None => service
            .create_store(&cli.store_display_name)
            .await
            .context("failed to create File Search store")?,
    };

    // Ctrl-C stays routed to the token until exit, so every await below must race it.
    let (cancel_handle, cancel) = CancelToken::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_handle.cancel();
        }
    });

    let display_name = cli.display_name.as_deref();
    service
        .ingest(&cli.file, &store, display_name, Some(&cancel))
        .await
        .with_context(|| format!("failed to import {}", cli.file.display()))?;
    println!("File imported successfully!");

    let answer = service
        .query_or_cancel(&cli.prompt, std::slice::from_ref(&store), &cancel)
        .await
        .context("failed to get a grounded answer")?;

    println!("\nResponse:\n{}", answer.text);
    if !answer.sources.is_empty() {
        println!("\nSources:");
        for source in &answer.sources {
            let label = source
                .title
                .as_deref()
                .or(source.uri.as_deref())
                .unwrap_or("(untitled)");
            println!("- {label}");
        }
    }

    let metrics = service.metrics_snapshot();
    tracing::debug!(
        submitted = metrics.documents_submitted,
        polls = metrics.status_polls,
        queries = metrics.queries_answered,
        "Session finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["filesearch", "--file", "sample.txt", "--prompt", "What is X?"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(parse(&["--interval-secs", "0"]).is_err());
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        assert!(parse(&["--max-attempts", "0"]).is_err());
    }

    #[test]
    fn positive_poll_overrides_are_accepted() {
        let cli = parse(&["--interval-secs", "2", "--max-attempts", "5"]).expect("cli");
        assert_eq!(cli.interval_secs, Some(2));
        assert_eq!(cli.max_attempts, Some(5));
    }
}
