//! Prompt builder: strict grounded instruction template + labeled context
//! block.

use rag_store::ScoredChunk;

/// Short system message for chat-style providers.
pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant that answers questions STRICTLY \
    based on the provided context. NEVER make up, guess, or infer information not in the context.";

/// Default instruction template. `{context}` and `{question}` are replaced
/// at render time.
pub const STRICT_PROMPT_TEMPLATE: &str = r#"You are a helpful assistant that answers questions STRICTLY based on the provided context.

CRITICAL RULES:
1. ONLY use information from the provided context to answer questions
2. NEVER make up, guess, or infer information not in the context
3. If the answer is not in the context, say "I don't have information about that in the provided content"
4. Do not add any suggestions, opinions, or information beyond what's in the context
5. Be concise and accurate
6. If multiple relevant pieces of information exist, combine them clearly

Answer the user's question based ONLY on this context:

{context}

Question: {question}

Answer (based ONLY on the context above):"#;

/// Formats retrieved chunks into a labeled context block, 1-indexed, in the
/// order supplied.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return "No relevant content found.".to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Context {}]\n{}", i + 1, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the instruction template with the context block and question.
///
/// A custom template replaces only the instructional framing; the context
/// and question are always inserted. When a custom template omits the
/// placeholders, the missing pieces are appended so no question ever
/// reaches the model without its context.
pub fn render_prompt(template: Option<&str>, context: &str, question: &str) -> String {
    let template = template.unwrap_or(STRICT_PROMPT_TEMPLATE);

    let mut rendered = template.to_string();
    let had_context = rendered.contains("{context}");
    let had_question = rendered.contains("{question}");
    rendered = rendered.replace("{context}", context);
    rendered = rendered.replace("{question}", question);

    if !had_context {
        rendered.push_str("\n\nContext:\n");
        rendered.push_str(context);
    }
    if !had_question {
        rendered.push_str("\n\nQuestion: ");
        rendered.push_str(question);
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_store::Metadata;

    fn chunk(content: &str, similarity: f32) -> ScoredChunk {
        ScoredChunk {
            id: "id".to_string(),
            content: content.to_string(),
            metadata: Metadata::new(),
            similarity,
        }
    }

    #[test]
    fn context_blocks_are_labeled_and_ordered() {
        let chunks = vec![chunk("first fact", 0.9), chunk("second fact", 0.8)];
        let ctx = format_context(&chunks);
        assert!(ctx.starts_with("[Context 1]\nfirst fact"));
        assert!(ctx.contains("[Context 2]\nsecond fact"));
        let first = ctx.find("first fact").unwrap();
        let second = ctx.find("second fact").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_context_has_a_placeholder() {
        assert_eq!(format_context(&[]), "No relevant content found.");
    }

    #[test]
    fn default_template_embeds_context_and_question() {
        let rendered = render_prompt(None, "[Context 1]\nWidgets ship fast.", "How fast?");
        assert!(rendered.contains("[Context 1]\nWidgets ship fast."));
        assert!(rendered.contains("Question: How fast?"));
        assert!(rendered.contains("ONLY use information from the provided context"));
    }

    #[test]
    fn custom_template_swaps_the_framing_only() {
        let custom = "Answer like a pirate.\n\n{context}\n\nQ: {question}";
        let rendered = render_prompt(Some(custom), "CTX", "why?");
        assert!(rendered.starts_with("Answer like a pirate."));
        assert!(rendered.contains("CTX"));
        assert!(rendered.contains("Q: why?"));
        assert!(!rendered.contains("CRITICAL RULES"));
    }

    #[test]
    fn custom_template_without_placeholders_still_gets_both() {
        let rendered = render_prompt(Some("Be brief."), "CTX", "why?");
        assert!(rendered.contains("CTX"));
        assert!(rendered.contains("why?"));
    }
}
