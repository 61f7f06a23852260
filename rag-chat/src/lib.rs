//! RAG orchestrator with a single public entry point.
//!
//! Public API: [`answer`]. Per call it short-circuits bare greetings, runs
//! similarity search with widening retries (drop the metadata filter, then
//! relax threshold and limit), and hands whatever context resulted to the
//! grounded answer generator. State-free: everything a call needs arrives
//! as arguments.

mod api_types;
mod error;
mod generate;
mod greeting;
mod progress;
mod prompt;
mod settings;

pub use api_types::{AnswerOptions, RagAnswer, UsedChunk};
pub use error::ChatError;
pub use generate::generate;
pub use greeting::is_greeting;
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use prompt::{STRICT_PROMPT_TEMPLATE, SYSTEM_MESSAGE, format_context, render_prompt};
pub use settings::{ChatSettings, DEFAULT_GREETING_MESSAGE, DEFAULT_NO_RESPONSE_TEXT};

use std::sync::Arc;

use ai_llm_service::LlmClientRegistry;
use rag_store::{RagStore, ScoredChunk, SearchOptions};
use tracing::{debug, info};

/// Answers a question from ingested content.
///
/// Convenience wrapper over [`answer_with_progress`] with no progress UI.
///
/// # Errors
/// [`ChatError::EmptyQuery`] for blank input; provider and store failures
/// propagate. Zero retrieved chunks is not an error — the generator returns
/// the configured no-response text.
pub async fn answer(
    question: &str,
    opts: &AnswerOptions,
    settings: &ChatSettings,
    store: &RagStore,
    svc: &Arc<LlmClientRegistry>,
) -> Result<RagAnswer, ChatError> {
    answer_with_progress(question, opts, settings, store, svc, &NoopProgress).await
}

/// Full pipeline: greeting short-circuit → widening retrieval → grounded
/// generation → redacted envelope.
pub async fn answer_with_progress(
    question: &str,
    opts: &AnswerOptions,
    settings: &ChatSettings,
    store: &RagStore,
    svc: &Arc<LlmClientRegistry>,
    prog: &dyn Progress,
) -> Result<RagAnswer, ChatError> {
    if question.trim().is_empty() {
        return Err(ChatError::EmptyQuery);
    }

    // Bare greetings never reach the embedding or LLM backends.
    if greeting::is_greeting(question) {
        debug!("greeting short-circuit");
        return Ok(RagAnswer {
            answer: settings.greeting_message.clone(),
            provider: settings.llm_provider.to_string(),
            chunks_used: 0,
            chunks: Vec::new(),
        });
    }

    prog.message("embedding + retrieving");
    let embedder = settings.embedder(svc.clone());

    let mut hits: Vec<ScoredChunk> = Vec::new();
    let plan = widening_plan(opts);
    let attempts = plan.len();
    for (attempt, step) in plan.into_iter().enumerate() {
        debug!(
            attempt = attempt + 1,
            attempts,
            limit = step.limit,
            threshold = step.threshold,
            filtered = step.filter.is_some(),
            "similarity search attempt"
        );
        hits = store.search(question, &step, embedder.as_ref()).await?;
        if !hits.is_empty() {
            break;
        }
        // Zero results is a valid outcome at every step, not a failure;
        // each widening step trades precision for recall.
        prog.step("widening retrieval");
    }

    info!(retrieved = hits.len(), "retrieval finished");

    prog.step("generating answer");
    let answer = generate::generate(settings, &hits, question, svc).await?;
    prog.finish("done");

    Ok(RagAnswer {
        answer,
        provider: settings.llm_provider.to_string(),
        chunks_used: hits.len(),
        chunks: hits.into_iter().map(UsedChunk::from).collect(),
    })
}

/// The widening retrieval schedule for one query:
/// 1. as requested;
/// 2. with the metadata filter cleared (skipped when there was none);
/// 3. with the threshold halved and the limit doubled.
fn widening_plan(opts: &AnswerOptions) -> Vec<SearchOptions> {
    let mut plan = Vec::with_capacity(3);
    plan.push(SearchOptions {
        limit: opts.limit,
        threshold: opts.threshold,
        filter: opts.filter.clone(),
    });

    if opts.filter.as_ref().is_some_and(|f| !f.is_empty()) {
        plan.push(SearchOptions {
            limit: opts.limit,
            threshold: opts.threshold,
            filter: None,
        });
    }

    plan.push(SearchOptions {
        limit: opts.limit.saturating_mul(2),
        threshold: opts.threshold / 2.0,
        filter: None,
    });

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_store::{ChunkFilter, StoreConfig};

    fn test_store() -> RagStore {
        // The client is lazy: nothing connects until a call is made, so a
        // store against an unreachable endpoint is fine for short-circuit
        // tests.
        RagStore::new(StoreConfig::new("http://127.0.0.1:6334", "test_chunks", 768)).unwrap()
    }

    #[test]
    fn widening_plan_with_filter_has_three_steps() {
        let opts = AnswerOptions {
            limit: 5,
            threshold: 0.3,
            filter: Some(ChunkFilter::by_source("faq")),
        };
        let plan = widening_plan(&opts);
        assert_eq!(plan.len(), 3);

        assert!(plan[0].filter.is_some());
        assert_eq!(plan[0].limit, 5);

        assert!(plan[1].filter.is_none());
        assert_eq!(plan[1].limit, 5);
        assert_eq!(plan[1].threshold, 0.3);

        assert!(plan[2].filter.is_none());
        assert_eq!(plan[2].limit, 10);
        assert_eq!(plan[2].threshold, 0.15);
    }

    #[test]
    fn widening_plan_without_filter_skips_the_duplicate_step() {
        let plan = widening_plan(&AnswerOptions::default());
        assert_eq!(plan.len(), 2);
        assert!(plan[0].filter.is_none());
        assert_eq!(plan[1].limit, 10);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let store = test_store();
        let svc = Arc::new(LlmClientRegistry::new());
        let err = answer(
            "   ",
            &AnswerOptions::default(),
            &ChatSettings::default(),
            &store,
            &svc,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChatError::EmptyQuery));
    }

    /// Greeting inputs return the canned message without touching the
    /// embedding backend, the store, or the LLM. The store and providers
    /// all point at unreachable endpoints, so any attempted call would
    /// surface an error instead of this `Ok`.
    #[tokio::test]
    async fn greetings_short_circuit_before_any_backend_call() {
        let store = test_store();
        let svc = Arc::new(LlmClientRegistry::new());
        let settings = ChatSettings {
            ollama_api_url: "http://127.0.0.1:1".to_string(),
            ..ChatSettings::default()
        };

        for query in ["hi", "  Hello  ", "Good evening"] {
            let out = answer(query, &AnswerOptions::default(), &settings, &store, &svc)
                .await
                .unwrap();
            assert_eq!(out.answer, DEFAULT_GREETING_MESSAGE);
            assert_eq!(out.chunks_used, 0);
            assert!(out.chunks.is_empty());
        }
    }
}
