//! Context-grounded answer generation.

use std::sync::Arc;

use ai_llm_service::LlmClientRegistry;
use rag_store::ScoredChunk;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::prompt;
use crate::settings::ChatSettings;

/// Generates an answer from the retrieved chunks.
///
/// Hard rule: an empty chunk list returns `settings.no_response_text`
/// verbatim and invokes no model backend. Otherwise the chunks are rendered
/// into the instruction template and dispatched to the provider named in
/// the settings. No retries; backend errors propagate to the orchestrator.
pub async fn generate(
    settings: &ChatSettings,
    chunks: &[ScoredChunk],
    question: &str,
    svc: &Arc<LlmClientRegistry>,
) -> Result<String, ChatError> {
    if chunks.is_empty() {
        info!("no context retrieved; returning the canned no-response text");
        return Ok(settings.no_response_text.clone());
    }

    let context = prompt::format_context(chunks);
    let user_prompt = prompt::render_prompt(settings.custom_prompt.as_deref(), &context, question);

    debug!(
        provider = %settings.llm_provider,
        chunks = chunks.len(),
        prompt_len = user_prompt.len(),
        "dispatching grounded prompt"
    );

    let cfg = settings.chat_config();
    let answer = svc
        .chat(&cfg, Some(prompt::SYSTEM_MESSAGE), &user_prompt)
        .await?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::LlmProvider;

    /// With zero chunks the generator must return the canned text before any
    /// backend dispatch. The settings deliberately name an OpenAI backend
    /// with no API key: if a call were attempted it would fail with a
    /// missing-credentials error, so an `Ok` here proves no call happened.
    #[tokio::test]
    async fn empty_context_short_circuits_without_calling_any_backend() {
        let settings = ChatSettings {
            llm_provider: LlmProvider::OpenAi,
            openai_api_key: None,
            no_response_text: "Nothing relevant found.".to_string(),
            ..ChatSettings::default()
        };
        let svc = Arc::new(LlmClientRegistry::new());

        let answer = generate(&settings, &[], "any question", &svc).await.unwrap();
        assert_eq!(answer, "Nothing relevant found.");
    }

    #[tokio::test]
    async fn missing_credentials_propagate_when_context_exists() {
        let settings = ChatSettings {
            llm_provider: LlmProvider::OpenAi,
            openai_api_key: None,
            ..ChatSettings::default()
        };
        let svc = Arc::new(LlmClientRegistry::new());
        let chunks = vec![ScoredChunk {
            id: "1".to_string(),
            content: "Widgets ship in 3-5 days.".to_string(),
            metadata: rag_store::Metadata::new(),
            similarity: 0.9,
        }];

        let err = generate(&settings, &chunks, "How fast?", &svc)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Llm(e) if e.is_missing_api_key()));
    }
}
