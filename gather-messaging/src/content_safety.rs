use std::collections::HashSet;

/// Built-in block list: common profanity plus domain-specific terms.
/// Single words match on word boundaries ("hell" does not flag
/// "hello"); entries with spaces match as normalized phrases.
const DEFAULT_BLOCKED_TERMS: &[&str] = &[
    "anal",
    "anus",
    "arse",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "blowjob",
    "bollocks",
    "boner",
    "boob",
    "clit",
    "cock",
    "crap",
    "cunt",
    "damn",
    "dick",
    "dildo",
    "fag",
    "faggot",
    "fuck",
    "fucker",
    "fucking",
    "handjob",
    "hell",
    "horny",
    "jerk off",
    "jizz",
    "milf",
    "motherfucker",
    "naked pics",
    "nude",
    "nudes",
    "orgasm",
    "orgy",
    "penis",
    "piss",
    "porn",
    "porno",
    "pussy",
    "rimjob",
    "send nudes",
    "sext",
    "sexting",
    "shit",
    "slut",
    "tits",
    "twat",
    "vagina",
    "wank",
    "whore",
];

/// Keyword moderation gate applied to free-text fields before any
/// forum or category write. Built once at startup from the built-in
/// list plus configured extra terms, then immutable.
#[derive(Debug, Clone)]
pub struct ContentSafetyFilter {
    words: HashSet<String>,
    phrases: Vec<String>,
}

impl ContentSafetyFilter {
    pub fn new(extra_terms: &[String]) -> Self {
        let mut words = HashSet::new();
        let mut phrases = Vec::new();

        for term in DEFAULT_BLOCKED_TERMS
            .iter()
            .map(|t| t.to_string())
            .chain(extra_terms.iter().map(|t| t.to_lowercase()))
        {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            if term.contains(char::is_whitespace) {
                phrases.push(normalize(&term));
            } else {
                words.insert(term);
            }
        }

        Self { words, phrases }
    }

    /// Returns true if any non-empty string contains a blocked token.
    /// Empty arrays and arrays of only empty strings are safe.
    pub fn is_text_unsafe<S: AsRef<str>>(&self, texts: &[S]) -> bool {
        texts.iter().any(|text| self.is_unsafe(text.as_ref()))
    }

    fn is_unsafe(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let normalized = normalize(text);
        if normalized
            .split_whitespace()
            .any(|word| self.words.contains(word))
        {
            return true;
        }

        self.phrases.iter().any(|p| normalized.contains(p.as_str()))
    }
}

impl Default for ContentSafetyFilter {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Lowercase and collapse every non-alphanumeric run to a single space,
/// so punctuation cannot hide a blocked word.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_text_passes() {
        let filter = ContentSafetyFilter::default();
        assert!(!filter.is_text_unsafe(&["Hello world", "This is a friendly message"]));
    }

    #[test]
    fn profanity_is_detected() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&["This contains a bad word: shit"]));
    }

    #[test]
    fn any_unsafe_entry_flags_the_whole_array() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&[
            "This is safe",
            "This contains damn word",
            "This is also safe",
        ]));
    }

    #[test]
    fn empty_array_is_safe() {
        let filter = ContentSafetyFilter::default();
        assert!(!filter.is_text_unsafe::<&str>(&[]));
    }

    #[test]
    fn empty_and_whitespace_strings_are_safe() {
        let filter = ContentSafetyFilter::default();
        assert!(!filter.is_text_unsafe(&["", "   ", "hello world"]));
    }

    #[test]
    fn custom_single_words_are_detected() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&["This mentions sexting inappropriately"]));
    }

    #[test]
    fn custom_phrases_are_detected() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&["Some inappropriate content jerk off"]));
    }

    #[test]
    fn detection_is_case_insensitive() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&["SHIT happens"]));
        assert!(filter.is_text_unsafe(&["This contains SHIT"]));
    }

    #[test]
    fn blocked_words_match_on_word_boundaries() {
        let filter = ContentSafetyFilter::default();
        // "hell" is blocked but must not flag "hello"
        assert!(!filter.is_text_unsafe(&["hello world"]));
        assert!(filter.is_text_unsafe(&["What the hell and damn"]));
        // "ass" must not flag "assessment"
        assert!(!filter.is_text_unsafe(&["quarterly assessment review"]));
    }

    #[test]
    fn punctuation_does_not_hide_blocked_words() {
        let filter = ContentSafetyFilter::default();
        assert!(filter.is_text_unsafe(&["what.the.shit!"]));
    }

    #[test]
    fn typical_forum_content_is_safe() {
        let filter = ContentSafetyFilter::default();
        assert!(!filter.is_text_unsafe(&[
            "Tech Discussion",
            "A place to discuss technology",
            "Share your knowledge and learn from others",
        ]));
        assert!(filter.is_text_unsafe(&["Adult Group", "Sexting and more", "Come join us"]));
    }

    #[test]
    fn unicode_and_special_characters_are_safe() {
        let filter = ContentSafetyFilter::default();
        assert!(!filter.is_text_unsafe(&["Hello 世界", "Bonjour le monde"]));
        assert!(!filter.is_text_unsafe(&["Hello! @#$%^&*()"]));
    }

    #[test]
    fn configured_extra_terms_extend_the_list() {
        let filter = ContentSafetyFilter::new(&["Gambling".to_string(), "buy followers".to_string()]);
        assert!(filter.is_text_unsafe(&["no gambling here"]));
        assert!(filter.is_text_unsafe(&["Buy   Followers today"]));
        assert!(!filter.is_text_unsafe(&["buy flowers today"]));
    }
}
