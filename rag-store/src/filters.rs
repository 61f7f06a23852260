//! Filter conversion to Qdrant `Filter`.
//!
//! Every entry of a [`ChunkFilter`] becomes a `must` equality condition, so
//! all keys have to match for a point to qualify. Supported scalar types:
//! `String` → `Keyword`, integer `Number` → `Integer`, `Bool` → `Boolean`.

use crate::record::ChunkFilter;
use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match, condition::ConditionOneOf};
use tracing::debug;

/// Converts a [`ChunkFilter`] plus an optional owner id into a Qdrant
/// [`Filter`] of conjunctive equality conditions.
pub fn to_qdrant_filter(f: &ChunkFilter, owner_id: Option<&str>) -> Filter {
    debug!(
        equals = f.equals.len(),
        owner = owner_id.is_some(),
        "filters::to_qdrant_filter"
    );

    let mut must: Vec<Condition> = Vec::with_capacity(f.equals.len() + 1);

    for (field, val) in &f.equals {
        let m = match val {
            serde_json::Value::String(s) => Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                    s.clone(),
                )),
            },
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Match {
                        match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Integer(i)),
                    }
                } else {
                    debug!(field, "skipping non-integer numeric filter value");
                    continue;
                }
            }
            serde_json::Value::Bool(b) => Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Boolean(*b)),
            },
            _ => {
                debug!(field, "skipping unsupported filter value type");
                continue;
            }
        };

        must.push(field_condition(field.clone(), m));
    }

    if let Some(owner) = owner_id {
        must.push(field_condition(
            "owner_id".to_string(),
            Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                    owner.to_string(),
                )),
            },
        ));
    }

    Filter {
        must,
        ..Default::default()
    }
}

fn field_condition(key: String, m: Match) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key,
            r#match: Some(m),
            ..Default::default()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_becomes_a_must_condition() {
        let f = ChunkFilter::by_source("faq").equals("category", "shipping");
        let filter = to_qdrant_filter(&f, None);
        assert_eq!(filter.must.len(), 2);
        assert!(filter.should.is_empty());
    }

    #[test]
    fn owner_id_is_an_implicit_extra_condition() {
        let f = ChunkFilter::by_source("faq");
        let filter = to_qdrant_filter(&f, Some("user-42"));
        assert_eq!(filter.must.len(), 2);
    }

    #[test]
    fn unsupported_value_types_are_skipped() {
        let f = ChunkFilter::new()
            .equals("tags", serde_json::json!(["a", "b"]))
            .equals("source", "faq");
        let filter = to_qdrant_filter(&f, None);
        assert_eq!(filter.must.len(), 1);
    }
}
