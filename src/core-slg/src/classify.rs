//! Final content-category classification.
//!
//! Layered heuristics over an ordered list of pure predicates: a provisional
//! type from sitemap resolution short-circuits everything, then URL-structure
//! signals run before content sniffing because URL structure is cheaper and
//! more reliable. Content sniffing is the fallback for sites with flat or
//! ambiguous URL schemes.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::PageKind;

/// The canonical inputs every classification predicate sees.
#[derive(Debug, Clone, Copy)]
pub struct PageFacts<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub body: &'a str,
}

/// A single classification predicate. Pure: same facts, same answer.
pub struct Signal {
    pub name: &'static str,
    pub kind: PageKind,
    pub matches: fn(&PageFacts<'_>) -> bool,
}

static PRODUCT_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)/(product|products|shop|store|item|goods|merchandise|catalog|buy|purchase|order|cart|ecommerce|e-commerce|retail)/",
    )
    .expect("product URL regex")
});

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([$€£]\d+(\.\d+)?|\d+(\.\d+)?\s*(dollars?|euros?|pounds?)|(price|cost):\s*\$\d+(\.\d+)?)")
        .expect("price regex")
});

static BLOG_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(/(blog|post|article|news|story|category|tag|author)/|/\d{4}/\d{2}/|/\d{4}/)")
        .expect("blog URL regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{4}/\d{2}/\d{2}|january|february|march|april|may|june|july|august|september|october|november|december)",
    )
    .expect("date regex")
});

const COMMERCE_VOCAB: &[&str] = &[
    "product",
    "shop",
    "store",
    "buy",
    "purchase",
    "order",
    "price",
    "cost",
    "sale",
    "discount",
    "add to cart",
    "shopping cart",
    "checkout",
    "payment",
    "shipping",
    "in stock",
    "out of stock",
    "quantity",
    "sku",
    "upc",
    "ean",
];

const BLOG_VOCAB: &[&str] = &[
    "blog",
    "post",
    "article",
    "news",
    "story",
    "published",
    "author",
    "category",
    "tag",
    "comment",
    "share",
];

fn product_url(facts: &PageFacts<'_>) -> bool {
    PRODUCT_URL_RE.is_match(facts.url)
}

fn commerce_vocabulary(facts: &PageFacts<'_>) -> bool {
    let haystack = format!("{} {} {}", facts.title, facts.description, facts.body).to_lowercase();
    COMMERCE_VOCAB.iter().any(|term| haystack.contains(term))
}

fn price_tokens(facts: &PageFacts<'_>) -> bool {
    let haystack = format!("{} {} {}", facts.title, facts.description, facts.body);
    PRICE_RE.is_match(&haystack)
}

fn blog_url(facts: &PageFacts<'_>) -> bool {
    BLOG_URL_RE.is_match(facts.url)
}

fn blog_vocabulary(facts: &PageFacts<'_>) -> bool {
    let haystack = format!("{} {}", facts.title, facts.description).to_lowercase();
    BLOG_VOCAB.iter().any(|term| haystack.contains(term))
}

fn date_in_metadata(facts: &PageFacts<'_>) -> bool {
    let haystack = format!("{} {}", facts.title, facts.description);
    DATE_RE.is_match(&haystack)
}

/// The default ordered predicate list. Product signals run before blog
/// signals; the first match wins.
pub fn default_signals() -> Vec<Signal> {
    vec![
        Signal {
            name: "product-url",
            kind: PageKind::Product,
            matches: product_url,
        },
        Signal {
            name: "price-tokens",
            kind: PageKind::Product,
            matches: price_tokens,
        },
        Signal {
            name: "commerce-vocabulary",
            kind: PageKind::Product,
            matches: commerce_vocabulary,
        },
        Signal {
            name: "blog-url",
            kind: PageKind::Blog,
            matches: blog_url,
        },
        Signal {
            name: "blog-vocabulary",
            kind: PageKind::Blog,
            matches: blog_vocabulary,
        },
        Signal {
            name: "date-in-metadata",
            kind: PageKind::Blog,
            matches: date_in_metadata,
        },
    ]
}

/// Classifies a page against an explicit signal list.
///
/// A provisional type from sitemap resolution is trusted outright. A record
/// that falls through every signal necessarily came from a sitemap with no
/// inferable type, so it lands in `Uncategorized` — `Page` is only ever
/// assigned via the provisional type.
pub fn classify_with(
    signals: &[Signal],
    facts: &PageFacts<'_>,
    provisional: Option<PageKind>,
) -> PageKind {
    if let Some(kind) = provisional {
        return kind;
    }
    for signal in signals {
        if (signal.matches)(facts) {
            tracing::debug!("Classified {} as {} via {}", facts.url, signal.kind, signal.name);
            return signal.kind;
        }
    }
    PageKind::Uncategorized
}

/// Classifies a page with the default signal list.
pub fn classify(facts: &PageFacts<'_>, provisional: Option<PageKind>) -> PageKind {
    classify_with(&default_signals(), facts, provisional)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts<'a>(url: &'a str, title: &'a str, description: &'a str, body: &'a str) -> PageFacts<'a> {
        PageFacts {
            url,
            title,
            description,
            body,
        }
    }

    #[test]
    fn test_provisional_type_short_circuits() {
        // Strong blog vocabulary, but the provisional type wins.
        let f = facts(
            "https://example.com/thing",
            "Published by our author",
            "A blog post with comments",
            "",
        );
        assert_eq!(classify(&f, Some(PageKind::Product)), PageKind::Product);
    }

    #[test]
    fn test_product_url_pattern() {
        let f = facts("https://example.com/shop/blue-shirt", "", "", "");
        assert_eq!(classify(&f, None), PageKind::Product);
    }

    #[test]
    fn test_price_tokens_in_body() {
        let f = facts(
            "https://example.com/blue-shirt",
            "Blue Shirt",
            "",
            "Only $29.99 while supplies last",
        );
        assert_eq!(classify(&f, None), PageKind::Product);
    }

    #[test]
    fn test_product_beats_blog_signals() {
        // Both /blog/ and a price token; product signals run first.
        let f = facts(
            "https://example.com/blog/deal",
            "Deal of the day",
            "",
            "Get it for £15",
        );
        assert_eq!(classify(&f, None), PageKind::Product);
    }

    #[test]
    fn test_blog_url_pattern() {
        let f = facts("https://example.com/2024/03/hello-world", "Hello", "", "just text");
        assert_eq!(classify(&f, None), PageKind::Blog);
    }

    #[test]
    fn test_blog_vocabulary_in_title() {
        let f = facts("https://example.com/hello", "Our latest article", "", "");
        assert_eq!(classify(&f, None), PageKind::Blog);
    }

    #[test]
    fn test_date_in_title_is_blog() {
        let f = facts("https://example.com/notes", "Notes from 2024-01-15", "", "");
        assert_eq!(classify(&f, None), PageKind::Blog);
    }

    #[test]
    fn test_no_signal_is_uncategorized() {
        let f = facts("https://example.com/misc", "Misc", "plain", "nothing special here");
        assert_eq!(classify(&f, None), PageKind::Uncategorized);
    }

    #[test]
    fn test_provisional_page_stays_page() {
        let f = facts("https://example.com/about-us", "About", "", "");
        assert_eq!(classify(&f, Some(PageKind::Page)), PageKind::Page);
    }
}
