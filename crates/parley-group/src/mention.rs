use parley_core::constants::MIN_MENTION_KEYWORD_CHARS;
use parley_core::models::Aid;

/// Case-insensitive keyword matcher for "was this identity mentioned".
///
/// Keywords are the agent name, the AID prefix, the full AID, and aliases.
/// Keywords shorter than two chars are discarded; duplicates are folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionMatcher {
    keywords: Vec<String>,
}

impl MentionMatcher {
    pub fn new(name: &str, aid: &Aid, aliases: &[String]) -> Self {
        let candidates = [name, aid.prefix(), aid.as_str()]
            .into_iter()
            .chain(aliases.iter().map(String::as_str));

        let mut keywords: Vec<String> = Vec::new();
        for candidate in candidates {
            let folded = candidate.trim().to_lowercase();
            if folded.chars().count() < MIN_MENTION_KEYWORD_CHARS {
                continue;
            }
            if !keywords.contains(&folded) {
                keywords.push(folded);
            }
        }
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_mentioned(&self, content: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let folded = content.to_lowercase();
        self.keywords.iter().any(|k| folded.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_duplicate_keywords_are_dropped() {
        let m = MentionMatcher::new(
            "Alice",
            &Aid::from("alice.agents.example"),
            &["A".to_string(), "ALICE".to_string(), "ali".to_string()],
        );
        assert_eq!(m.keywords(), &["alice", "alice.agents.example", "ali"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = MentionMatcher::new("Bob", &Aid::from("bob.example"), &[]);
        assert!(m.is_mentioned("hey BOB, thoughts?"));
        assert!(!m.is_mentioned("nobody here"));
    }
}
