//! wisp entry point.
//!
//! Loads one locator and prints its rendered text to stdout. Logging goes to
//! stderr so the page text stays clean.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wisp_client::{Fetcher, Locator, load};
use wisp_core::AppConfig;

/// Fetch a page and print its text.
#[derive(Debug, Parser)]
#[command(name = "wisp", version)]
struct Args {
    /// Locator to load (http, https, file, data, optionally prefixed with `view-source:`).
    /// Without one, the configured default document is shown.
    url: Option<String>,

    /// Extra request header as `Name=Value`; repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once('=').ok_or_else(|| format!("expected Name=Value, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let mut locator = match &args.url {
        Some(url) => Locator::parse_with_user_agent(url, &config.user_agent)?,
        None => Locator::file(config.default_document.display().to_string()),
    };
    if !args.headers.is_empty() {
        locator.set_headers(args.headers)?;
    }
    tracing::info!(locator = %locator, "loading");

    let fetcher = Fetcher::new((&config).into())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    load(&fetcher, &locator, &mut out)?;
    writeln!(out)?;

    Ok(())
}
