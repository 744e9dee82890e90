use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gptshim::{ConfigBuilder, FileConfig, HeaderSet, Provider};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Send a single prompt and print the completion.
#[derive(Debug, Parser)]
#[command(name = "gptshim", version, about)]
struct Args {
    /// Prompt text.
    prompt: String,

    /// YAML config file. Missing files are ignored.
    #[arg(short, long, default_value = "gptshim.yaml")]
    config: PathBuf,

    /// Model name, e.g. gpt-4 or davinci-002.
    #[arg(short, long)]
    model: Option<String>,

    /// openai or azure.
    #[arg(long, value_parser = parse_provider)]
    provider: Option<Provider>,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    api_version: Option<String>,

    /// Azure deployment name.
    #[arg(long)]
    model_name: Option<String>,

    #[arg(long)]
    max_tokens: Option<u32>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// HTTP proxy URL. Replaces any proxy from the config file or environment.
    #[arg(long, conflicts_with = "socks")]
    proxy: Option<String>,

    /// SOCKS5 proxy address (host:port). Replaces any proxy from the config
    /// file or environment.
    #[arg(long)]
    socks: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    insecure: bool,

    /// Extra header, key=value. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Print token usage after the completion.
    #[arg(long)]
    usage: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gptshim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = FileConfig::load(&args.config)
        .await
        .with_context(|| format!("loading {}", args.config.display()))?;
    let builder = ConfigBuilder::new()
        .apply_file(file)
        .apply_env(|key| std::env::var(key).ok())
        .context("reading OPENAI_* environment")?;
    let builder = apply_args(builder, &args);

    let client = builder.connect().context("building client")?;
    info!(model = %client.model(), provider = %client.provider(), "sending prompt");

    let response = client
        .completion(&args.prompt)
        .await
        .context("completion request failed")?;

    println!("{}", response.content.trim());
    if args.usage {
        eprintln!(
            "usage: prompt={} completion={} total={}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );
    }
    Ok(())
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    s.parse().map_err(|e: gptshim::ConfigError| e.to_string())
}

fn apply_args(mut builder: ConfigBuilder, args: &Args) -> ConfigBuilder {
    if let Some(v) = &args.model {
        builder = builder.model(v);
    }
    if let Some(v) = args.provider {
        builder = builder.provider(v);
    }
    if let Some(v) = &args.base_url {
        builder = builder.base_url(v);
    }
    if let Some(v) = &args.api_version {
        builder = builder.api_version(v);
    }
    if let Some(v) = &args.model_name {
        builder = builder.model_name(v);
    }
    if let Some(v) = args.max_tokens {
        builder = builder.max_tokens(v);
    }
    if let Some(v) = args.temperature {
        builder = builder.temperature(v);
    }
    if let Some(v) = args.timeout {
        builder = builder.timeout(Duration::from_secs(v));
    }
    if args.proxy.is_some() || args.socks.is_some() {
        builder = builder.clear_proxy();
    }
    if let Some(v) = &args.proxy {
        builder = builder.proxy_url(v);
    }
    if let Some(v) = &args.socks {
        builder = builder.socks_url(v);
    }
    if args.insecure {
        builder = builder.skip_verify(true);
    }
    builder.headers(HeaderSet::parse(&args.headers))
}
