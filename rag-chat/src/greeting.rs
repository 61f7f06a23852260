//! Bare-greeting detection for the orchestrator short-circuit.

/// True when the query, trimmed and case-folded, is a bare greeting.
///
/// Matches a small fixed set; anything beyond a bare greeting ("hi there",
/// "hello, can you help") goes through retrieval like any other query.
pub fn is_greeting(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    matches!(
        normalized.as_str(),
        "hi" | "hello"
            | "hey"
            | "greetings"
            | "good morning"
            | "good afternoon"
            | "good evening"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_greetings_match() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("  Hello  "));
        assert!(is_greeting("HEY"));
        assert!(is_greeting("Good evening"));
        assert!(is_greeting("greetings"));
    }

    #[test]
    fn questions_do_not_match() {
        assert!(!is_greeting("hi there"));
        assert!(!is_greeting("hello, how do returns work?"));
        assert!(!is_greeting("good morning everyone"));
        assert!(!is_greeting("how long does shipping take?"));
        assert!(!is_greeting(""));
    }
}
