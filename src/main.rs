use std::env;
use std::sync::Arc;

use ai_llm_service::{HealthService, LlmClientRegistry};
use rag_chat::{AnswerOptions, ChatSettings, IndicatifProgress};
use rag_store::{
    ChunkFilter, ChunkingOptions, IngestOptions, IngestReceipt, Metadata, RagStore, StoreConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file when present.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("ingest") => ingest(&args[1..]).await,
        Some("query") => query(&args[1..]).await,
        Some("delete") => delete(&args[1..]).await,
        Some("health") => health().await,
        _ => {
            eprintln!(
                "usage:\n  doc-chat-backend ingest <file> <source> [--replace]\n  \
                 doc-chat-backend query <question...>\n  \
                 doc-chat-backend delete <source>\n  \
                 doc-chat-backend health"
            );
            Ok(())
        }
    }
}

fn make_store(settings: &ChatSettings) -> anyhow::Result<RagStore> {
    let cfg = StoreConfig::from_env(settings.embedding_dimension());
    Ok(RagStore::new(cfg)?)
}

fn owner_id() -> Option<String> {
    env::var("OWNER_ID").ok().filter(|v| !v.is_empty())
}

async fn ingest(args: &[String]) -> anyhow::Result<()> {
    let (Some(path), Some(source)) = (args.first(), args.get(1)) else {
        anyhow::bail!("usage: ingest <file> <source> [--replace]");
    };
    let replace = args.iter().any(|a| a == "--replace");

    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        anyhow::bail!("text content is required");
    }

    let settings = ChatSettings::from_env();
    let store = make_store(&settings)?;
    let svc = Arc::new(LlmClientRegistry::new());
    let embedder = settings.embedder(svc);

    let opts = IngestOptions {
        chunking: ChunkingOptions {
            metadata: Metadata::from([(
                "source".to_string(),
                serde_json::Value::from(source.as_str()),
            )]),
            ..ChunkingOptions::default()
        },
        owner_id: owner_id(),
        replace,
    };

    let stored = store.ingest_text(&text, &opts, embedder.as_ref()).await?;
    let receipt = IngestReceipt::from(stored);
    println!("ingested {} chunks from {path}", receipt.chunks_created);
    for chunk in &receipt.chunks {
        println!("  {}  {}", chunk.id, chunk.content_preview);
    }
    Ok(())
}

async fn query(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        anyhow::bail!("usage: query <question...>");
    }
    let question = args.join(" ");

    let settings = ChatSettings::from_env();
    let store = make_store(&settings)?;
    let svc = Arc::new(LlmClientRegistry::new());
    let prog = IndicatifProgress::spinner();

    let result = rag_chat::answer_with_progress(
        &question,
        &AnswerOptions::default(),
        &settings,
        &store,
        &svc,
        &prog,
    )
    .await?;

    println!("{}", result.answer);
    if result.chunks_used > 0 {
        println!("\n-- context ({} chunks, {})", result.chunks_used, result.provider);
        for chunk in &result.chunks {
            let source = chunk
                .metadata
                .get("source")
                .and_then(|v| v.as_str())
                .unwrap_or("?");
            println!("  {:.3}  {}", chunk.similarity, source);
        }
    }
    Ok(())
}

async fn delete(args: &[String]) -> anyhow::Result<()> {
    let Some(source) = args.first() else {
        anyhow::bail!("usage: delete <source> (the source filter is required)");
    };

    let settings = ChatSettings::from_env();
    let store = make_store(&settings)?;

    let deleted = store
        .delete_by_metadata(&ChunkFilter::by_source(source), owner_id().as_deref())
        .await?;
    println!("deleted {} chunks for source '{source}'", deleted.len());
    Ok(())
}

async fn health() -> anyhow::Result<()> {
    let settings = ChatSettings::from_env();
    let health = HealthService::new(settings.timeout_secs)?;
    let configs = [settings.chat_config(), settings.embedding_config()];

    for status in health.check_many(&configs).await {
        let flag = if status.ok { "ok " } else { "FAIL" };
        println!(
            "[{flag}] {} {} ({} ms): {}",
            status.provider, status.endpoint, status.latency_ms, status.message
        );
    }
    Ok(())
}
