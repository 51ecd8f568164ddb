//! Keyword classification of issue comment bodies
//!
//! A comment counts as an approval or denial only when the whole body equals
//! one of the configured words after punctuation normalization. Words
//! embedded in longer sentences never match, so ordinary discussion on the
//! tracking issue cannot trigger the gate.

/// Classification of a single comment body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
    Neutral,
}

const BUILTIN_APPROVAL_WORDS: &[&str] = &["approve", "approved", "lgtm", "yes"];
const BUILTIN_DENIAL_WORDS: &[&str] = &["deny", "denied", "no"];

/// Approval and denial word lists for one session
///
/// Built-in words are matched case-insensitively. Custom words are matched
/// exactly as registered, which keeps symbolic forms like `:shipit:`,
/// `#shipit` or `✅` working. The session takes an immutable snapshot at
/// construction time, so classification never races with registration.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    custom_approval_words: Vec<String>,
    custom_denial_words: Vec<String>,
}

impl Vocabulary {
    /// Register an additional approval word (exact, case-sensitive match)
    pub fn with_approval_word(mut self, word: impl Into<String>) -> Self {
        self.custom_approval_words.push(word.into());
        self
    }

    /// Register an additional denial word (exact, case-sensitive match)
    pub fn with_denial_word(mut self, word: impl Into<String>) -> Self {
        self.custom_denial_words.push(word.into());
        self
    }

    /// Classify a comment body as approval, denial or neither
    pub fn classify(&self, body: &str) -> Decision {
        let normalized = normalize(body);

        if matches_word(normalized, BUILTIN_APPROVAL_WORDS, &self.custom_approval_words) {
            return Decision::Approve;
        }

        if matches_word(normalized, BUILTIN_DENIAL_WORDS, &self.custom_denial_words) {
            return Decision::Deny;
        }

        Decision::Neutral
    }
}

/// Strip the punctuation a human reviewer plausibly appends to a keyword:
/// surrounding whitespace, a trailing run of `!` and at most one trailing
/// `.`. A trailing `?` is intentionally left in place so that a question
/// like "Approved?" never counts as a decision.
fn normalize(body: &str) -> &str {
    let trimmed = body.trim();
    let trimmed = trimmed.trim_end_matches('!');
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    trimmed.trim_end_matches('!')
}

fn matches_word(normalized: &str, builtin: &[&str], custom: &[String]) -> bool {
    let folded = normalized.to_lowercase();

    builtin.iter().any(|word| *word == folded)
        || custom.iter().any(|word| word == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(body: &str) -> Decision {
        Vocabulary::default().classify(body)
    }

    #[test]
    fn test_builtin_approval_words() {
        for body in ["approve", "approved", "lgtm", "yes"] {
            assert_eq!(classify(body), Decision::Approve, "body: {:?}", body);
        }
    }

    #[test]
    fn test_builtin_denial_words() {
        for body in ["deny", "denied", "no"] {
            assert_eq!(classify(body), Decision::Deny, "body: {:?}", body);
        }
    }

    #[test]
    fn test_builtin_words_are_case_insensitive() {
        assert_eq!(classify("APPROVE"), Decision::Approve);
        assert_eq!(classify("Approved"), Decision::Approve);
        assert_eq!(classify("DENY"), Decision::Deny);
        assert_eq!(classify("Denied"), Decision::Deny);
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(classify("Approved."), Decision::Approve);
        assert_eq!(classify("Approved!"), Decision::Approve);
        assert_eq!(classify("Approved!!"), Decision::Approve);
        assert_eq!(classify("Denied."), Decision::Deny);
        assert_eq!(classify("Denied!"), Decision::Deny);
    }

    #[test]
    fn test_trailing_question_mark_is_neutral() {
        assert_eq!(classify("Approved?"), Decision::Neutral);
        assert_eq!(classify("Deny?"), Decision::Neutral);
    }

    #[test]
    fn test_trailing_newlines() {
        assert_eq!(classify("approved\n"), Decision::Approve);
        assert_eq!(classify("approved!\n"), Decision::Approve);
        assert_eq!(classify("approved!!!\n\n\n"), Decision::Approve);
        assert_eq!(classify("denied\n"), Decision::Deny);
    }

    #[test]
    fn test_keywords_inside_sentences_are_neutral() {
        assert_eq!(classify("should i approve this"), Decision::Neutral);
        assert_eq!(classify("should i deny this"), Decision::Neutral);
        assert_eq!(classify("this is just some random comment"), Decision::Neutral);
    }

    #[test]
    fn test_custom_approval_words() {
        let vocabulary = Vocabulary::default()
            .with_approval_word("shipit")
            .with_approval_word(":shipit:")
            .with_approval_word("#shipit")
            .with_approval_word("✅");

        assert_eq!(vocabulary.classify("shipit"), Decision::Approve);
        assert_eq!(vocabulary.classify(":shipit:"), Decision::Approve);
        assert_eq!(vocabulary.classify("#shipit"), Decision::Approve);
        assert_eq!(vocabulary.classify("✅ "), Decision::Approve);
    }

    #[test]
    fn test_custom_denial_words() {
        let vocabulary = Vocabulary::default()
            .with_denial_word("naw")
            .with_denial_word(":no_entry_sign:")
            .with_denial_word("#noway");

        assert_eq!(vocabulary.classify("naw"), Decision::Deny);
        assert_eq!(vocabulary.classify(":no_entry_sign: "), Decision::Deny);
        assert_eq!(vocabulary.classify("#noway"), Decision::Deny);
    }

    #[test]
    fn test_custom_words_are_case_sensitive() {
        let vocabulary = Vocabulary::default().with_approval_word("shipit");

        assert_eq!(vocabulary.classify("SHIPIT"), Decision::Neutral);
    }

    #[test]
    fn test_custom_words_do_not_leak_into_default_vocabulary() {
        let vocabulary = Vocabulary::default().with_approval_word("shipit");

        assert_eq!(vocabulary.classify("shipit"), Decision::Approve);
        assert_eq!(classify("shipit"), Decision::Neutral);
    }
}
