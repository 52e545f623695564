//! Sitemap auto-detection for runs given a plain site URL.

use url::Url;

use crate::errors::{GenError, Result};

/// Well-known sitemap locations, probed in order before robots.txt.
const CANDIDATE_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap/sitemap.xml",
    "/sitemap/sitemap_index.xml",
    "/sitemaps/sitemap.xml",
    "/sitemaps/sitemap_index.xml",
    "/wp-sitemap.xml",
    "/sitemap1.xml",
];

/// True when a URL already names a sitemap directly, so detection can be
/// skipped.
pub fn looks_like_sitemap_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("sitemap") && lower.ends_with(".xml")
}

/// Finds a working sitemap URL for a site.
///
/// The well-known candidate paths are probed first with cheap HEAD
/// requests; only when none answers does robots.txt get a say via its
/// `Sitemap:` directive.
///
/// # Errors
///
/// Returns [`GenError::SitemapDetection`] when neither source yields a
/// sitemap.
pub async fn detect_sitemap(client: &reqwest::Client, site_url: &str) -> Result<String> {
    let base = Url::parse(site_url)?;

    for path in CANDIDATE_PATHS {
        let candidate = base.join(path)?.to_string();
        tracing::debug!("Trying sitemap candidate: {}", candidate);
        if head_ok(client, &candidate).await {
            tracing::info!("Found sitemap at well-known path: {}", candidate);
            return Ok(candidate);
        }
    }

    if let Some(declared) = sitemap_from_robots(client, &base).await {
        tracing::info!("Found sitemap via robots.txt: {}", declared);
        return Ok(declared);
    }

    Err(GenError::SitemapDetection(format!(
        "no sitemap found for {site_url}"
    )))
}

async fn head_ok(client: &reqwest::Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

async fn sitemap_from_robots(client: &reqwest::Client, base: &Url) -> Option<String> {
    let robots_url = base.join("/robots.txt").ok()?;
    let body = client
        .get(robots_url)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?
        .text()
        .await
        .ok()?;
    body.lines()
        .filter_map(|line| {
            let line = line.trim();
            match line.split_once(':') {
                Some((key, value)) if key.eq_ignore_ascii_case("sitemap") => {
                    Some(value.trim().to_string())
                }
                _ => None,
            }
        })
        .find(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_sitemap_url() {
        assert!(looks_like_sitemap_url("https://example.com/sitemap.xml"));
        assert!(looks_like_sitemap_url("https://example.com/sitemap_index.XML"));
        assert!(!looks_like_sitemap_url("https://example.com/"));
        assert!(!looks_like_sitemap_url("https://example.com/sitemap"));
        assert!(!looks_like_sitemap_url("https://example.com/feed.xml"));
    }

    #[test]
    fn test_candidate_paths_cover_common_layouts() {
        assert_eq!(CANDIDATE_PATHS.first(), Some(&"/sitemap.xml"));
        for nested in ["/sitemap/sitemap_index.xml", "/sitemaps/sitemap.xml", "/sitemap1.xml"] {
            assert!(CANDIDATE_PATHS.contains(&nested));
        }
    }
}
