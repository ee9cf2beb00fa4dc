use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    memtune_config::MemtuneConfig,
    memtune_memory::{
        embeddings::EmbeddingProvider, embeddings_openai::OpenAiEmbeddingProvider,
        ingest::ingest_chunks, retriever::Retriever, store_sqlite::SqliteMemoryStore,
    },
    memtune_pipeline::{generate::Generator, pack::pack_dataset, summarize::Summarizer},
    memtune_providers::{LlmProvider, OpenAiProvider},
};

#[derive(Parser)]
#[command(
    name = "memtune",
    about = "memtune — retrieval-augmented fine-tuning dataset builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed pre-chunked blog posts into the store.
    Ingest {
        /// Corpus name; reads `<data_dir>/<name>_chunked.jsonl`.
        name: String,
    },
    /// Build the intermediate dataset from sequential transcript files.
    Generate {
        /// Corpus name; reads `<data_dir>/<name>_transcript_<i>.json`.
        name: String,
        /// Rewrite every retrieved memory without the usefulness judgment.
        #[arg(long, default_value_t = false)]
        skip_filter: bool,
    },
    /// Pack the intermediate dataset into token-budgeted training windows.
    Pack {
        /// Corpus name; reads `<data_dir>/<name>_finetune.json`.
        name: String,
        /// Override the configured window token budget.
        #[arg(long)]
        token_budget: Option<usize>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "memtune starting");

    let config = memtune_config::discover_and_load();

    match cli.command {
        Commands::Ingest { name } => run_ingest(&config, &name).await,
        Commands::Generate { name, skip_filter } => run_generate(&config, &name, skip_filter).await,
        Commands::Pack { name, token_budget } => run_pack(&config, &name, token_budget),
    }
}

async fn open_store(config: &MemtuneConfig, name: &str) -> anyhow::Result<Arc<SqliteMemoryStore>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let store = SqliteMemoryStore::open(&config.data_dir.join(format!("{name}.db"))).await?;
    Ok(Arc::new(store))
}

fn build_embedder(config: &MemtuneConfig) -> anyhow::Result<OpenAiEmbeddingProvider> {
    let api_key = resolve_api_key(config)?;
    let mut embedder = OpenAiEmbeddingProvider::new(api_key).with_model(
        config.openai.embedding_model.clone(),
        config.openai.embedding_dims,
    );
    if let Some(url) = &config.openai.base_url {
        embedder = embedder.with_base_url(url.clone());
    }
    Ok(embedder)
}

fn build_llm(config: &MemtuneConfig) -> anyhow::Result<OpenAiProvider> {
    let api_key = resolve_api_key(config)?;
    let mut provider = OpenAiProvider::new(api_key).with_model(config.openai.chat_model.clone());
    if let Some(url) = &config.openai.base_url {
        provider = provider.with_base_url(url.clone());
    }
    Ok(provider)
}

fn resolve_api_key(config: &MemtuneConfig) -> anyhow::Result<String> {
    config.openai.resolve_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "no OpenAI API key — set openai.api_key in memtune.toml or the OPENAI_API_KEY env var"
        )
    })
}

/// Enumerate `<name>_transcript_<i>.json` for i = 1, 2, ...; the first
/// missing suffix ends the series (normal termination, not an error).
fn transcript_paths(data_dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for i in 1.. {
        let path = data_dir.join(format!("{name}_transcript_{i}.json"));
        if !path.exists() {
            break;
        }
        paths.push(path);
    }
    paths
}

async fn run_ingest(config: &MemtuneConfig, name: &str) -> anyhow::Result<()> {
    let store = open_store(config, name).await?;
    let embedder = Arc::new(build_embedder(config)?);
    info!(
        model = embedder.model_name(),
        dims = embedder.dimensions(),
        key = embedder.provider_key(),
        "embedding provider ready"
    );
    let path = config.data_dir.join(format!("{name}_chunked.jsonl"));

    let count = ingest_chunks(store, embedder, name, &path, config.memory.embedding_budget).await?;
    info!(chunks = count, "ingest complete");
    Ok(())
}

async fn run_generate(config: &MemtuneConfig, name: &str, skip_filter: bool) -> anyhow::Result<()> {
    let paths = transcript_paths(&config.data_dir, name);
    if paths.is_empty() {
        anyhow::bail!(
            "no transcript files found under {} (expected {name}_transcript_1.json)",
            config.data_dir.display()
        );
    }
    info!(transcripts = paths.len(), "found transcript files");

    let store = open_store(config, name).await?;
    let embedder = Arc::new(build_embedder(config)?);
    let retriever = Retriever::new(store, embedder, config.memory.k);

    let llm = Arc::new(build_llm(config)?);
    info!(provider = llm.name(), model = llm.id(), "chat provider ready");
    let mut summarizer =
        Summarizer::new(llm).with_skip_filter(skip_filter || config.pipeline.skip_filter);
    if let Some(concurrency) = config.pipeline.concurrency {
        summarizer = summarizer.with_concurrency(concurrency);
    }

    let generator = Generator::new(retriever, summarizer)
        .with_throttle(Duration::from_millis(config.pipeline.throttle_ms));

    let out_path = config.data_dir.join(format!("{name}_finetune.json"));
    generator.run(&paths, name, &out_path).await?;
    info!(path = %out_path.display(), "generation complete");
    Ok(())
}

fn run_pack(config: &MemtuneConfig, name: &str, token_budget: Option<usize>) -> anyhow::Result<()> {
    let budget = token_budget.unwrap_or(config.pack.token_budget);
    let in_path = config.data_dir.join(format!("{name}_finetune.json"));
    let out_path = config.data_dir.join(format!("{name}_openai.jsonl"));

    let windows = pack_dataset(&in_path, &out_path, budget)?;
    info!(windows, budget, "packing complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_series_stops_at_first_gap() {
        let dir = tempfile::tempdir().unwrap();
        for i in [1, 2, 4] {
            std::fs::write(dir.path().join(format!("blog_transcript_{i}.json")), "{}").unwrap();
        }

        let paths = transcript_paths(dir.path(), "blog");
        assert_eq!(paths.len(), 2);
        assert!(paths[1].ends_with("blog_transcript_2.json"));
    }

    #[test]
    fn no_transcripts_is_an_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        assert!(transcript_paths(dir.path(), "blog").is_empty());
    }
}
