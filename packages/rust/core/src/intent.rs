//! Lexical intent guardrails.
//!
//! Classification looks only at the lower-cased, trimmed topic. Phrases match
//! as plain substrings, so `hi` matches "machine" as well as "hi there".

use topicpress_shared::{Intent, OffTopicReason};

const IDENTITY_PHRASES: &[&str] = &["who are you", "aap kon hain", "tum kon ho"];

const GREETING_PHRASES: &[&str] = &["aoa", "hello", "hi", "how are you", "kaisy ho", "kaise ho"];

const CODE_PHRASES: &[&str] = &[
    "code",
    "programming",
    "python code",
    "script",
    "html",
    "write a function",
];

const MATH_SYMBOLS: &[char] = &['+', '-', '*', '/', '='];

/// Topics with one token must be longer than this to count as articles.
const MIN_SINGLE_WORD_CHARS: usize = 3;

/// Reply to identity questions.
pub const IDENTITY_REPLY: &str = "I am your AI Blog Agent. My purpose is to research and write \
professional blog articles for you. Please provide a topic to get started!";

/// Reply to coding requests.
pub const CODE_REJECTION: &str = "I am a **Blog Agent**, and I cannot provide or write \
programming code. I specialize in research and writing professional blog articles. If you \
would like me to write a blog post about a technical topic, I'd be happy to help!";

/// Reply to math and too-short requests.
pub const OFF_TOPIC_REJECTION: &str = "I'm sorry, that is not a blog topic. I specialize in \
writing research-backed blog articles. Please provide a relevant topic, like 'Benefits of AI' \
or 'Travel guide to Paris', so I can help you!";

/// Classify a raw topic. First match wins: identity, greeting, the off-topic
/// bundle, then article.
pub fn classify(topic: &str) -> Intent {
    let normalized = topic.trim().to_lowercase();

    if contains_any(&normalized, IDENTITY_PHRASES) {
        return Intent::Identity;
    }
    if contains_any(&normalized, GREETING_PHRASES) {
        return Intent::Greeting;
    }

    if contains_any(&normalized, CODE_PHRASES) {
        return Intent::OffTopic(OffTopicReason::Code);
    }
    if is_math(&normalized) {
        return Intent::OffTopic(OffTopicReason::Math);
    }

    let tokens = normalized.split_whitespace().count();
    if tokens < 2 && normalized.chars().count() <= MIN_SINGLE_WORD_CHARS {
        return Intent::OffTopic(OffTopicReason::TooShort);
    }

    Intent::ArticleTopic
}

/// Canned body text for intents that need no model call.
pub fn canned_reply(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::Identity => Some(IDENTITY_REPLY),
        Intent::OffTopic(OffTopicReason::Code) => Some(CODE_REJECTION),
        Intent::OffTopic(_) => Some(OFF_TOPIC_REJECTION),
        Intent::Greeting | Intent::ArticleTopic => None,
    }
}

fn is_math(normalized: &str) -> bool {
    normalized.contains(MATH_SYMBOLS) && normalized.chars().any(|c| c.is_ascii_digit())
}

fn contains_any(normalized: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| normalized.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_questions() {
        assert_eq!(classify("Who are you?"), Intent::Identity);
        assert_eq!(classify("  tum kon ho "), Intent::Identity);
        assert_eq!(classify("aap kon hain"), Intent::Identity);
    }

    #[test]
    fn identity_wins_over_greeting() {
        assert_eq!(classify("hello, who are you"), Intent::Identity);
    }

    #[test]
    fn greetings() {
        assert_eq!(classify("hello"), Intent::Greeting);
        assert_eq!(classify("Hi!"), Intent::Greeting);
        assert_eq!(classify("AOA"), Intent::Greeting);
        assert_eq!(classify("how are you doing"), Intent::Greeting);
        assert_eq!(classify("kaise ho"), Intent::Greeting);
    }

    #[test]
    fn phrases_match_inside_words() {
        assert_eq!(classify("machine learning ethics"), Intent::Greeting);
        assert_eq!(classify("Philosophy of science"), Intent::Greeting);
        assert_eq!(classify("History of Chile"), Intent::Greeting);
        assert_eq!(classify("Othello themes"), Intent::Greeting);
        assert_eq!(
            classify("Transcript of the Gettysburg Address"),
            Intent::OffTopic(OffTopicReason::Code)
        );
        assert_eq!(
            classify("Barcode scanners in retail"),
            Intent::OffTopic(OffTopicReason::Code)
        );
    }

    #[test]
    fn math_is_rejected() {
        assert_eq!(classify("2+2="), Intent::OffTopic(OffTopicReason::Math));
        assert_eq!(classify("what is 12 * 7"), Intent::OffTopic(OffTopicReason::Math));
    }

    #[test]
    fn symbols_without_digits_are_not_math() {
        assert_eq!(classify("pros and cons of e-bikes"), Intent::ArticleTopic);
    }

    #[test]
    fn code_requests_are_rejected() {
        assert_eq!(classify("write a function to sort"), Intent::OffTopic(OffTopicReason::Code));
        assert_eq!(classify("HTML"), Intent::OffTopic(OffTopicReason::Code));
        assert_eq!(classify("python code for 2+2"), Intent::OffTopic(OffTopicReason::Code));
    }

    #[test]
    fn short_single_tokens() {
        assert_eq!(classify("AI"), Intent::OffTopic(OffTopicReason::TooShort));
        assert_eq!(classify("cat"), Intent::OffTopic(OffTopicReason::TooShort));
        assert_eq!(classify(""), Intent::OffTopic(OffTopicReason::TooShort));
        assert_eq!(classify("Paris"), Intent::ArticleTopic);
    }

    #[test]
    fn article_topics() {
        assert_eq!(classify("Benefits of AI"), Intent::ArticleTopic);
        assert_eq!(classify("Travel guide to Paris"), Intent::ArticleTopic);
    }

    #[test]
    fn canned_replies() {
        assert_eq!(canned_reply(Intent::Identity), Some(IDENTITY_REPLY));
        assert_eq!(canned_reply(Intent::OffTopic(OffTopicReason::Code)), Some(CODE_REJECTION));
        assert_eq!(
            canned_reply(Intent::OffTopic(OffTopicReason::TooShort)),
            Some(OFF_TOPIC_REJECTION)
        );
        assert_eq!(canned_reply(Intent::Greeting), None);
        assert_eq!(canned_reply(Intent::ArticleTopic), None);
    }
}
