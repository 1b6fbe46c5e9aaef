use intel_clients::RawRelationship;
use intel_core::Relationship;

/// Known passive-voice relationship verbs and their active-voice inverse.
/// Anything not in the table is assumed already canonical.
const INVERSE_VERBS: &[(&str, &str)] = &[
    ("SUPPLIED_BY", "SUPPLIES"),
    ("OWNED_BY", "OWNS"),
    ("ACQUIRED_BY", "ACQUIRES"),
    ("LICENSED_FROM", "LICENSES_TO"),
];

/// Normalizes a raw (source, target, type) triple from the LLM into
/// canonical direction (e.g. Supplier → Buyer rather than Buyer →
/// Supplier), swapping source/target when the verb is passive-voice.
fn normalize_direction(raw: &RawRelationship) -> (String, String, String) {
    let upper = raw.relationship_type.to_uppercase();
    if let Some((_, active)) = INVERSE_VERBS.iter().find(|(passive, _)| *passive == upper) {
        (raw.target.clone(), raw.source.clone(), active.to_string())
    } else {
        (raw.source.clone(), raw.target.clone(), upper)
    }
}

/// Builds a persistable `Relationship` from the LLM's raw output, applying
/// direction normalization and the logic-check-derived initial confidence.
pub fn build_relationship(
    raw: &RawRelationship,
    initial_confidence: f64,
    source_article_id: uuid::Uuid,
    detected_at: chrono::DateTime<chrono::Utc>,
) -> Relationship {
    let (source_ticker, target_ticker, relationship_type) = normalize_direction(raw);
    Relationship {
        source_ticker,
        target_ticker,
        relationship_type,
        confidence: initial_confidence,
        source_article_id,
        detected_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_passive_voice_supplied_by() {
        let raw = RawRelationship {
            source: "BUYER".into(),
            target: "SUPPLIER".into(),
            relationship_type: "SUPPLIED_BY".into(),
        };
        let (s, t, ty) = normalize_direction(&raw);
        assert_eq!((s.as_str(), t.as_str(), ty.as_str()), ("SUPPLIER", "BUYER", "SUPPLIES"));
    }

    #[test]
    fn leaves_active_voice_untouched() {
        let raw = RawRelationship {
            source: "SUPPLIER".into(),
            target: "BUYER".into(),
            relationship_type: "SUPPLIES".into(),
        };
        let (s, t, ty) = normalize_direction(&raw);
        assert_eq!((s.as_str(), t.as_str(), ty.as_str()), ("SUPPLIER", "BUYER", "SUPPLIES"));
    }
}
