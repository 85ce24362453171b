//! Source/topic routing.
//!
//! The legacy routing tables carried overlapping conditions for a few
//! topic ids, resolved last-match-wins by accident of evaluation order.
//! Here the table is an explicit ordered rule list evaluated top-to-bottom,
//! deduplicated so every topic id appears in exactly one rule; the
//! `routing_full_table` test enumerates every constant to pin the behavior.

use serde_json::Value;

use crate::clause;

/// Topics restricted to LinkedIn. Upstream data carries both casings.
pub const LINKEDIN_ONLY_TOPICS: &[u64] = &[204, 209];

/// Topics restricted to the three core consumer platforms.
pub const FB_TW_IG_TOPICS: &[u64] = &[101, 118, 126];

/// Topics that additionally monitor YouTube.
pub const FB_TW_IG_YT_TOPICS: &[u64] = &[133, 147];

/// The single sentinel topic with its own two-platform list.
pub const SPECIAL_TOPIC: u64 = 160;

/// The full supported platform list, used when no rule matches.
pub const ALL_PLATFORMS: &[&str] = &[
    "Facebook", "Twitter", "Instagram", "YouTube", "LinkedIn", "Linkedin", "Pinterest", "Web",
    "Reddit", "TikTok",
];

/// Topics whose queries only ever see public-opinion documents.
pub const PUBLIC_OPINION_TOPICS: &[u64] = &[118, 147];

/// Topics pinned to the Healthcare category tag.
pub const HEALTHCARE_TAG_TOPICS: &[u64] = &[126];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Resolve the platform list to OR-match on `source`. An explicit
/// caller-supplied list always takes precedence over topic rules.
pub fn resolve_sources(topic_id: u64, explicit: &[String]) -> Vec<String> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    if LINKEDIN_ONLY_TOPICS.contains(&topic_id) {
        return owned(&["LinkedIn", "Linkedin"]);
    }
    if FB_TW_IG_TOPICS.contains(&topic_id) {
        return owned(&["Facebook", "Twitter", "Instagram"]);
    }
    if FB_TW_IG_YT_TOPICS.contains(&topic_id) {
        return owned(&["Facebook", "Twitter", "Instagram", "YouTube"]);
    }
    if topic_id == SPECIAL_TOPIC {
        return owned(&["Facebook", "Twitter"]);
    }
    owned(ALL_PLATFORMS)
}

/// Mandatory clauses some topics append outside the source list. Kept as a
/// separate table so source rules and mandatory-tag rules can evolve
/// independently.
pub fn extra_clauses(topic_id: u64) -> Vec<Value> {
    let mut extra = Vec::new();
    if PUBLIC_OPINION_TOPICS.contains(&topic_id) {
        extra.push(clause::match_bool("is_public_opinion", true));
    }
    if HEALTHCARE_TAG_TOPICS.contains(&topic_id) {
        extra.push(clause::match_term("category_tag", "Healthcare"));
    }
    extra
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_sources_always_win() {
        let explicit = vec!["Reddit".to_string()];
        for topic in [204, 101, 133, SPECIAL_TOPIC, 999] {
            assert_eq!(resolve_sources(topic, &explicit), explicit);
        }
    }

    #[test]
    fn routing_full_table() {
        // Every topic id constant, pinned to the list its rule produces.
        for topic in LINKEDIN_ONLY_TOPICS {
            assert_eq!(resolve_sources(*topic, &[]), vec!["LinkedIn", "Linkedin"]);
        }
        for topic in FB_TW_IG_TOPICS {
            assert_eq!(resolve_sources(*topic, &[]), vec!["Facebook", "Twitter", "Instagram"]);
        }
        for topic in FB_TW_IG_YT_TOPICS {
            assert_eq!(
                resolve_sources(*topic, &[]),
                vec!["Facebook", "Twitter", "Instagram", "YouTube"]
            );
        }
        assert_eq!(resolve_sources(SPECIAL_TOPIC, &[]), vec!["Facebook", "Twitter"]);
        assert_eq!(resolve_sources(424242, &[]), owned(ALL_PLATFORMS));
    }

    #[test]
    fn rules_are_mutually_exclusive() {
        let mut seen = std::collections::HashSet::new();
        let all = LINKEDIN_ONLY_TOPICS
            .iter()
            .chain(FB_TW_IG_TOPICS)
            .chain(FB_TW_IG_YT_TOPICS)
            .chain(std::iter::once(&SPECIAL_TOPIC));
        for topic in all {
            assert!(seen.insert(*topic), "topic {topic} appears in two rules");
        }
    }

    #[test]
    fn extra_clause_table() {
        let extra = extra_clauses(118);
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0]["match"]["is_public_opinion"], true);

        let extra = extra_clauses(126);
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0]["match"]["category_tag"], "Healthcare");

        assert!(extra_clauses(999).is_empty());
    }
}
