//! Text tokenization.
//!
//! Text is lowercased and split on every character that is not alphanumeric.
//! Punctuation never survives, so `"it's"` becomes `["it", "s"]`. Changing
//! this function changes what previously persisted models mean.

/// Splits `text` into lowercase word and number tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_words_and_numbers() {
        assert_eq!(
            tokenize("It's 5 o'clock!"),
            vec!["it", "s", "5", "o", "clock"]
        );
    }

    #[test]
    fn test_tokenize_mentions_and_braces() {
        assert_eq!(
            tokenize("<@U123> What {Service} is out?"),
            vec!["u123", "what", "service", "is", "out"]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! ... --").is_empty());
    }

    #[test]
    fn test_tokenize_unicode() {
        assert_eq!(tokenize("Guten Morgen, Käse"), vec!["guten", "morgen", "käse"]);
    }
}
