//! Prompt generation and spoken-response scoring

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

/// Pick `count` distinct vocabulary words in random order, space separated
pub fn generate_prompt<R: Rng + ?Sized>(vocabulary: &[String], count: usize, rng: &mut R) -> String {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = vocabulary
        .iter()
        .map(|w| w.as_str())
        .filter(|w| seen.insert(*w))
        .collect();

    unique
        .choose_multiple(rng, count)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// `|prompt ∩ heard| / |prompt|` over lowercase word sets
pub fn match_ratio(prompt: &str, heard: &str) -> f64 {
    let expected = words(prompt);
    if expected.is_empty() {
        return 0.0;
    }
    let spoken = words(heard);
    expected.intersection(&spoken).count() as f64 / expected.len() as f64
}

/// Split a prompt into two display lines (first two words, the rest)
pub fn display_lines(prompt: &str) -> (String, String) {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    let split = words.len().min(2);
    (words[..split].join(" "), words[split..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SobrietyConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_prompt_has_distinct_vocabulary_words() {
        let config = SobrietyConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let prompt = generate_prompt(&config.vocabulary, 4, &mut rng);
            let words: Vec<&str> = prompt.split(' ').collect();
            assert_eq!(words.len(), 4);
            let unique: HashSet<&str> = words.iter().copied().collect();
            assert_eq!(unique.len(), 4);
            assert!(words.iter().all(|w| config.vocabulary.iter().any(|v| v == w)));
        }
    }

    #[test]
    fn test_small_vocabulary_caps_prompt() {
        let vocabulary = vec!["apple".to_string(), "apple".to_string(), "pear".to_string()];
        let mut rng = StdRng::seed_from_u64(1);
        let prompt = generate_prompt(&vocabulary, 4, &mut rng);
        assert_eq!(prompt.split(' ').count(), 2);
    }

    #[test]
    fn test_ratio_full_and_half() {
        let prompt = "apple banana computer elephant";
        assert_eq!(match_ratio(prompt, "apple banana computer elephant"), 1.0);
        assert_eq!(match_ratio(prompt, "apple banana"), 0.5);
    }

    #[test]
    fn test_ratio_ignores_case_order_and_punctuation() {
        let prompt = "apple banana computer elephant";
        assert_eq!(match_ratio(prompt, "Elephant, COMPUTER banana. apple!"), 1.0);
        assert_eq!(match_ratio(prompt, "apple banana computer"), 0.75);
        assert_eq!(match_ratio("", "apple"), 0.0);
    }

    #[test]
    fn test_display_lines() {
        let (first, second) = display_lines("apple banana computer elephant");
        assert_eq!(first, "apple banana");
        assert_eq!(second, "computer elephant");
        assert_eq!(display_lines("apple"), ("apple".to_string(), String::new()));
    }

    proptest::proptest! {
        #[test]
        fn prop_ratio_is_a_fraction(heard in "[a-z ,.!]{0,60}", seed in 0u64..1000) {
            let config = SobrietyConfig::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let prompt = generate_prompt(&config.vocabulary, config.prompt_words, &mut rng);
            let ratio = match_ratio(&prompt, &heard);
            proptest::prop_assert!((0.0..=1.0).contains(&ratio));
            proptest::prop_assert_eq!(match_ratio(&prompt, &prompt), 1.0);
        }
    }
}
