//! Key topic derivation for the generated document.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::ScrapedPage;
use crate::text_utils::capitalize_string;

/// Upper bound on derived topics.
const MAX_TOPICS: usize = 15;
/// Below this many derived topics, the configured defaults fill in.
const MIN_TOPICS_BEFORE_FALLBACK: usize = 3;
/// Minimum length for a word to be a frequency candidate.
const MIN_WORD_LEN: usize = 4;
/// Minimum occurrences across the corpus for a word to become a topic.
const MIN_WORD_COUNT: usize = 2;
/// How many of the most frequent words are considered at all.
const MAX_FREQUENCY_TERMS: usize = 10;

/// Compound phrases worth surfacing verbatim, e.g. "digital fashion" or
/// "ai powered photography".
static COMPOUND_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)\b
          (?: ai | generative | digital | virtual | smart | online )
          [\s-]+
          (?: fashion | model(?:ing)? | photography | commerce | shopping
            | marketing | design | learning | platform | influencer )
          \b",
    )
    .expect("compound term regex")
});

/// Industry vocabulary promoted to a topic on bare containment anywhere in
/// the corpus.
const INDUSTRY_VOCAB: &[&str] = &[
    "fashion",
    "modeling",
    "photography",
    "influencer",
    "ecommerce",
    "retail",
    "branding",
    "marketing",
    "digital",
    "virtual",
    "online",
    "shopping",
    "style",
    "trend",
    "design",
    "creative",
    "agency",
    "platform",
    "technology",
    "innovation",
    "sustainability",
];

/// Substrings that bump a topic to the front of the list.
const HIGH_PRIORITY_MARKERS: &[&str] =
    &["ai", "artificial intelligence", "digital", "virtual", "generative"];
const MEDIUM_PRIORITY_MARKERS: &[&str] =
    &["fashion", "model", "photography", "influencer", "ecommerce"];

/// Words too generic to be topics, beyond their raw frequency.
const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "your", "have", "more", "will", "about",
    "page", "home", "here", "their", "what", "when", "where", "which", "them",
    "then", "than", "were", "been", "being", "into", "over", "under", "only",
    "also", "just", "like", "make", "made", "much", "many", "most", "some",
    "such", "very", "well", "they", "these", "those", "each", "other", "after",
    "before", "because", "there", "should", "would", "could", "site", "website",
    "read", "learn", "find", "best", "free", "view", "click", "using", "used",
];

/// Derives up to [`MAX_TOPICS`] topics from everything the scrape saw.
///
/// Three passes run over the combined titles, descriptions, and body text of
/// every page: compound phrases, industry vocabulary containment, and
/// recurring 4+ character words. Results are ordered by relevance; when
/// fewer than three topics emerge, the configured defaults pad the list.
pub fn derive_topics(pages: &[ScrapedPage], defaults: &[String]) -> Vec<String> {
    let corpus = combined_corpus(pages);

    let mut topics: Vec<String> = Vec::new();
    for topic in compound_topics(&corpus)
        .into_iter()
        .chain(industry_topics(&corpus))
        .chain(frequency_topics(&corpus))
    {
        if !topics.iter().any(|t| t.eq_ignore_ascii_case(&topic)) {
            topics.push(topic);
        }
    }
    if topics.len() < MIN_TOPICS_BEFORE_FALLBACK {
        for topic in defaults {
            if !topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
                topics.push(topic.clone());
            }
        }
    }

    // Stable sort, so within a priority tier the pass order above holds.
    topics.sort_by_key(|topic| priority_of(topic));
    topics.truncate(MAX_TOPICS);
    topics
}

/// Lowercased titles, descriptions, keyword metadata, and body text, joined.
fn combined_corpus(pages: &[ScrapedPage]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for page in pages {
        parts.push(&page.title);
        parts.push(&page.description);
        parts.extend(page.keywords.iter().map(String::as_str));
        parts.push(&page.body_text);
    }
    parts.join(" ").to_lowercase()
}

fn compound_topics(corpus: &str) -> Vec<String> {
    let mut topics = Vec::new();
    for found in COMPOUND_TERM_RE.find_iter(corpus) {
        let phrase: Vec<String> = found
            .as_str()
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|w| !w.is_empty())
            .map(capitalize_string)
            .collect();
        let phrase = phrase.join(" ");
        if !topics.contains(&phrase) {
            topics.push(phrase);
        }
    }
    topics
}

fn industry_topics(corpus: &str) -> Vec<String> {
    INDUSTRY_VOCAB
        .iter()
        .filter(|keyword| corpus.contains(*keyword))
        .map(|keyword| capitalize_string(keyword))
        .collect()
}

fn frequency_topics(corpus: &str) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in corpus
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= MIN_WORD_LEN && !STOPWORDS.contains(w))
    {
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= MIN_WORD_COUNT)
        .collect();
    // Count descending, then alphabetical so output is deterministic.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(MAX_FREQUENCY_TERMS)
        .map(|(word, _)| capitalize_string(word))
        .collect()
}

fn priority_of(topic: &str) -> u8 {
    let lower = topic.to_lowercase();
    if HIGH_PRIORITY_MARKERS.iter().any(|m| lower.contains(m)) {
        0
    } else if MEDIUM_PRIORITY_MARKERS.iter().any(|m| lower.contains(m)) {
        1
    } else {
        2
    }
}
