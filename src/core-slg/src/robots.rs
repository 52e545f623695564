//! Minimal robots.txt policy: `User-agent: *` allow/disallow path prefixes.

use url::Url;

use crate::errors::Result;

/// Parsed robots.txt rules for the wildcard user agent.
///
/// Consulted before fetching only when `respect_robots_txt` is enabled.
/// A site with no rules allows everything; a failed load degrades to
/// allow-all with a warning.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    allowed: Vec<String>,
    disallowed: Vec<String>,
}

impl RobotsPolicy {
    /// Fetches and parses `<base_url>/robots.txt`.
    pub async fn load(client: &reqwest::Client, base_url: &str) -> Self {
        match Self::try_load(client, base_url).await {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!("Could not load robots.txt for {}: {}", base_url, e);
                Self::default()
            }
        }
    }

    async fn try_load(client: &reqwest::Client, base_url: &str) -> Result<Self> {
        let robots_url = Url::parse(base_url)?.join("/robots.txt")?;
        let response = client.get(robots_url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(Self::parse(&body))
    }

    /// Parses robots.txt content, keeping rules for `User-agent: *` (or rules
    /// appearing before any user-agent line).
    pub fn parse(content: &str) -> Self {
        let mut policy = Self::default();
        let mut current_agent: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if let Some(agent) = line.strip_prefix("User-agent:") {
                current_agent = Some(agent.trim().to_string());
            } else if let Some(path) = line.strip_prefix("Allow:") {
                if current_agent.as_deref().map_or(true, |a| a == "*") {
                    policy.allowed.push(path.trim().to_string());
                }
            } else if let Some(path) = line.strip_prefix("Disallow:") {
                if current_agent.as_deref().map_or(true, |a| a == "*") {
                    let path = path.trim();
                    if !path.is_empty() {
                        policy.disallowed.push(path.to_string());
                    }
                }
            }
        }
        policy
    }

    /// Path-prefix check against the disallow rules.
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.disallowed.is_empty() && self.allowed.is_empty() {
            return true;
        }
        let path = match Url::parse(url) {
            Ok(u) => u.path().to_string(),
            Err(_) => return true,
        };
        !self.disallowed.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_empty_policy_allows_everything() {
        let policy = RobotsPolicy::default();
        assert!(policy.is_allowed("https://example.com/anything"));
    }

    #[test]
    fn test_disallow_prefix() {
        let policy = RobotsPolicy::parse(indoc! {"
            User-agent: *
            Disallow: /private/
            Allow: /public/
        "});
        assert!(!policy.is_allowed("https://example.com/private/secret"));
        assert!(policy.is_allowed("https://example.com/public/page"));
        assert!(policy.is_allowed("https://example.com/other"));
    }

    #[test]
    fn test_other_agents_ignored() {
        let policy = RobotsPolicy::parse(indoc! {"
            User-agent: BadBot
            Disallow: /

            User-agent: *
            Disallow: /tmp/
        "});
        assert!(policy.is_allowed("https://example.com/page"));
        assert!(!policy.is_allowed("https://example.com/tmp/x"));
    }
}
