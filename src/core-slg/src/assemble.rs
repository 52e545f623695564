//! Final document assembly: turning scraped pages into the llms.txt artifact.
//!
//! Section names and order are a compatibility surface for downstream
//! consumers; change them only together with whatever parses the output.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::RunConfig;
use crate::errors::Result;
use crate::models::{PageKind, ScrapedPage};
use crate::text_utils::{clean_for_display, date_part, truncate_chars};
use crate::topics::derive_topics;

/// Ceiling on per-page text in the Detailed Content section.
const DETAILED_CONTENT_MAX_CHARS: usize = 2000;
/// Ceiling on the description shown next to each link entry.
const ENTRY_DESCRIPTION_MAX_CHARS: usize = 150;

/// Placeholders: site_name, site_description, key_topics, pages_section,
/// blog_section, products_section, uncategorized_section, detailed_content,
/// site_overview, generated_date.
const DEFAULT_TEMPLATE: &str = "\
# ${site_name}

> ${site_description}

${key_topics}
${pages_section}${blog_section}${products_section}${uncategorized_section}${detailed_content}${site_overview}---
Generated on ${generated_date}
";

/// Renders scraped pages into the output document and writes it to disk.
pub struct DocumentAssembler<'a> {
    config: &'a RunConfig,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Renders the full document. `total_discovered` is the URL count from
    /// sitemap resolution before tier limits, shown in the overview so a
    /// shortfall between discovered and scraped is visible.
    ///
    /// # Errors
    ///
    /// Fails only when a custom template references an unknown placeholder.
    pub fn assemble(
        &self,
        pages: &[ScrapedPage],
        total_discovered: Option<usize>,
    ) -> Result<String> {
        let topics = derive_topics(pages, &self.config.default_topics);

        // Listed counts in the overview must equal what the rendered lists
        // actually show, so each category is selected exactly once.
        let page_entries = by_recency(pages, PageKind::Page, self.config.max_pages);
        let blog_entries = by_recency(pages, PageKind::Blog, self.config.max_blogs);
        let product_entries = by_recency(pages, PageKind::Product, self.config.max_products);
        let other_entries =
            by_recency(pages, PageKind::Uncategorized, self.config.max_uncategorized);

        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("site_name".to_string(), self.config.site_name.clone());
        vars.insert("site_description".to_string(), self.site_description(pages, &topics));
        vars.insert("key_topics".to_string(), key_topics_section(&topics));
        vars.insert(
            "pages_section".to_string(),
            category_section("Important Pages", &page_entries),
        );
        vars.insert(
            "blog_section".to_string(),
            category_section("Recent Blog Posts", &blog_entries),
        );
        vars.insert(
            "products_section".to_string(),
            category_section("Products", &product_entries),
        );
        vars.insert(
            "uncategorized_section".to_string(),
            category_section("Other Content", &other_entries),
        );
        vars.insert(
            "detailed_content".to_string(),
            detailed_content_section(pages, self.config.max_detailed),
        );
        let listed = [
            ("Pages listed", page_entries.len()),
            ("Blog posts listed", blog_entries.len()),
            ("Products listed", product_entries.len()),
            ("Other content listed", other_entries.len()),
        ];
        vars.insert(
            "site_overview".to_string(),
            site_overview_section(pages, total_discovered, &listed, &self.config.sitemap_url),
        );
        vars.insert(
            "generated_date".to_string(),
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        let template = self.config.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        let rendered = subst::substitute(template, &vars)?;
        Ok(rendered)
    }

    /// Writes the document to the configured path, renaming any existing file
    /// out of the way first when backups are enabled. Returns the backup path
    /// when one was made.
    pub fn write_output(&self, content: &str) -> Result<Option<PathBuf>> {
        let path = Path::new(&self.config.output_path);
        let backup = if self.config.backup_existing && path.exists() {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let backup_path = PathBuf::from(format!("{}.backup.{}", self.config.output_path, stamp));
            std::fs::rename(path, &backup_path)?;
            tracing::info!("Backed up existing output to {}", backup_path.display());
            Some(backup_path)
        } else {
            None
        };
        std::fs::write(path, content)?;
        tracing::info!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(backup)
    }

    fn site_description(&self, pages: &[ScrapedPage], topics: &[String]) -> String {
        if !self.config.site_description.is_empty() {
            return self.config.site_description.clone();
        }
        synthesize_description(&self.config.site_name, pages, topics)
    }
}

/// Builds a one-line description from what the site actually contains.
fn synthesize_description(site_name: &str, pages: &[ScrapedPage], topics: &[String]) -> String {
    let blogs = count_kind(pages, PageKind::Blog);
    let products = count_kind(pages, PageKind::Product);

    let focus = match topics {
        [] => String::new(),
        [only] => format!(" covering {only}"),
        [first, second, ..] => format!(" covering {first} and {second}"),
    };
    let character = if products > 0 && blogs > 0 {
        "an online store with articles"
    } else if products > 0 {
        "an online store"
    } else if blogs > 0 {
        "a content site"
    } else {
        "a website"
    };
    format!("{site_name} is {character}{focus}.")
}

fn count_kind(pages: &[ScrapedPage], kind: PageKind) -> usize {
    pages.iter().filter(|p| p.kind == kind).count()
}

/// Pages of one category, most recent first, capped.
fn by_recency(pages: &[ScrapedPage], kind: PageKind, cap: usize) -> Vec<&ScrapedPage> {
    let mut selected: Vec<&ScrapedPage> = pages.iter().filter(|p| p.kind == kind).collect();
    selected.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    selected.truncate(cap);
    selected
}

fn key_topics_section(topics: &[String]) -> String {
    if topics.is_empty() {
        return String::new();
    }
    let mut out = String::from("## Key Topics\n\n");
    for topic in topics {
        out.push_str(&format!("- {topic}\n"));
    }
    out.push('\n');
    out
}

/// One `## Heading` block per category. Empty categories produce no section
/// at all.
fn category_section(heading: &str, selected: &[&ScrapedPage]) -> String {
    if selected.is_empty() {
        return String::new();
    }
    let mut out = format!("## {heading}\n\n");
    for page in selected {
        let description = truncate_chars(
            &clean_for_display(&page.description),
            ENTRY_DESCRIPTION_MAX_CHARS,
        );
        if description.is_empty() {
            out.push_str(&format!("- [{}]({})\n", page.title, page.url));
        } else {
            out.push_str(&format!("- [{}]({}): {}\n", page.title, page.url, description));
        }
    }
    out.push('\n');
    out
}

/// Full-text excerpts for the most recent `max_detailed` pages across all
/// categories, grouped into per-category subsections.
fn detailed_content_section(pages: &[ScrapedPage], max_detailed: usize) -> String {
    let mut selected: Vec<&ScrapedPage> = pages.iter().filter(|p| !p.body_text.is_empty()).collect();
    if selected.is_empty() || max_detailed == 0 {
        return String::new();
    }
    selected.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    selected.truncate(max_detailed);

    let mut out = String::from("## Detailed Content\n\n");
    for (kind, label) in [
        (PageKind::Page, "Pages"),
        (PageKind::Blog, "Blogs"),
        (PageKind::Product, "Products"),
    ] {
        let group: Vec<&&ScrapedPage> = selected.iter().filter(|p| p.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("## {label}\n\n"));
        for page in group {
            // Published and Modified both come from sitemap lastmod; the
            // sitemap protocol carries no separate publication date.
            let dated = match &page.lastmod {
                Some(lastmod) => date_part(lastmod),
                None => "Unknown",
            };
            out.push_str(&format!("- Published: {dated}\n"));
            out.push_str(&format!("- Modified: {dated}\n"));
            out.push_str(&format!("- URL: {}\n\n", page.url));
            let body =
                truncate_chars(&clean_for_display(&page.body_text), DETAILED_CONTENT_MAX_CHARS);
            out.push_str(&body);
            out.push_str("\n\n");
        }
    }
    out
}

fn site_overview_section(
    pages: &[ScrapedPage],
    total_discovered: Option<usize>,
    listed: &[(&str, usize)],
    sitemap_url: &str,
) -> String {
    let mut out = String::from("## Site Overview\n\n");
    if let Some(discovered) = total_discovered {
        out.push_str(&format!("- URLs discovered: {discovered}\n"));
    }
    out.push_str(&format!("- Total pages scraped: {}\n", pages.len()));
    for (label, count) in listed {
        out.push_str(&format!("- {label}: {count}\n"));
    }
    let last_updated = pages
        .iter()
        .filter_map(|p| p.lastmod.as_deref())
        .max()
        .map(date_part)
        .unwrap_or("Unknown");
    out.push_str(&format!("- Last updated: {last_updated}\n"));
    out.push_str(&format!("- Sitemap: {sitemap_url}\n"));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, kind: PageKind, lastmod: Option<&str>) -> ScrapedPage {
        let mut page = ScrapedPage::new(url, title, kind);
        page.description = format!("{title} described.");
        page.body_text = format!("{title} body text.");
        page.lastmod = lastmod.map(str::to_string);
        page
    }

    fn config() -> RunConfig {
        RunConfig::builder()
            .sitemap_url("https://example.com/sitemap.xml")
            .site_name("Example Site")
            .build()
    }

    #[test]
    fn test_document_has_expected_sections_in_order() {
        let pages = vec![
            page("https://example.com/blog/a", "Post A", PageKind::Blog, Some("2024-02-01")),
            page("https://example.com/about", "About", PageKind::Page, None),
            page("https://example.com/product/w", "Widget", PageKind::Product, None),
        ];
        let config = config();
        let doc = DocumentAssembler::new(&config).assemble(&pages, Some(10)).unwrap();
        assert!(doc.starts_with("# Example Site\n"));

        let order = [
            "## Key Topics",
            "## Important Pages",
            "## Recent Blog Posts",
            "## Products",
            "## Detailed Content",
            "## Site Overview",
            "Generated on",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|h| doc.find(h).unwrap_or_else(|| panic!("missing section {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "sections out of order");

        assert!(doc.contains("- [Post A](https://example.com/blog/a): Post A described."));
        assert!(doc.contains("- URLs discovered: 10"));
        assert!(doc.contains("- Total pages scraped: 3"));
        assert!(doc.contains("- Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn test_overview_counts_match_rendered_lists() {
        let pages: Vec<ScrapedPage> = (0..5)
            .map(|i| {
                page(
                    &format!("https://example.com/blog/{i}"),
                    &format!("Post {i}"),
                    PageKind::Blog,
                    Some(&format!("2024-01-0{}", i + 1)),
                )
            })
            .collect();
        let mut config = config();
        config.max_blogs = 3;
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();

        // The overview reports what the lists show, not the raw bucket sizes.
        let blog = &doc[doc.find("## Recent Blog Posts").unwrap()..doc.find("## Detailed").unwrap()];
        assert_eq!(blog.matches("- [Post").count(), 3);
        assert!(doc.contains("- Blog posts listed: 3"));
        assert!(doc.contains("- Pages listed: 0"));
        assert!(doc.contains("- Products listed: 0"));
        assert!(doc.contains("- Last updated: 2024-01-05"));
    }

    #[test]
    fn test_empty_categories_omitted() {
        let pages = vec![page("https://example.com/about", "About", PageKind::Page, None)];
        let config = config();
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        assert!(!doc.contains("## Recent Blog Posts"));
        assert!(!doc.contains("## Products"));
        assert!(!doc.contains("## Other Content"));
        assert!(!doc.contains("URLs discovered"));
    }

    #[test]
    fn test_blog_entries_most_recent_first() {
        let pages = vec![
            page("https://example.com/blog/old", "Old", PageKind::Blog, Some("2023-01-01")),
            page("https://example.com/blog/new", "New", PageKind::Blog, Some("2024-06-01")),
        ];
        let config = config();
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        let new_at = doc.find("[New]").unwrap();
        let old_at = doc.find("[Old]").unwrap();
        assert!(new_at < old_at);
    }

    #[test]
    fn test_category_list_capped() {
        let pages: Vec<ScrapedPage> = (0..5)
            .map(|i| {
                page(
                    &format!("https://example.com/blog/{i}"),
                    &format!("Post {i}"),
                    PageKind::Blog,
                    Some(&format!("2024-01-0{}", i + 1)),
                )
            })
            .collect();
        let mut config = config();
        config.max_blogs = 3;
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        let blog = &doc[doc.find("## Recent Blog Posts").unwrap()..doc.find("## Detailed").unwrap()];
        assert_eq!(blog.matches("- [Post").count(), 3);
        assert!(blog.contains("[Post 4]"));
        assert!(!blog.contains("[Post 1]"));
    }

    #[test]
    fn test_configured_description_wins() {
        let mut config = config();
        config.site_description = "Hand-written description.".to_string();
        let doc = DocumentAssembler::new(&config).assemble(&[], None).unwrap();
        assert!(doc.contains("> Hand-written description."));
    }

    #[test]
    fn test_description_synthesized_from_content() {
        let pages = vec![
            page("https://example.com/p/1", "Widget One", PageKind::Product, None),
            page("https://example.com/blog/1", "Post One", PageKind::Blog, None),
        ];
        let config = config();
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        assert!(doc.contains("> Example Site is an online store with articles"));
    }

    #[test]
    fn test_detailed_content_grouped_and_capped() {
        let mut pages: Vec<ScrapedPage> = (0..4)
            .map(|i| {
                page(
                    &format!("https://example.com/blog/{i}"),
                    &format!("Post {i}"),
                    PageKind::Blog,
                    Some(&format!("2024-01-0{}", i + 1)),
                )
            })
            .collect();
        pages.push(page("https://example.com/about", "About", PageKind::Page, Some("2024-02-01")));

        let mut config = config();
        config.max_detailed = 3;
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        let detailed = &doc[doc.find("## Detailed Content").unwrap()..doc.find("## Site Overview").unwrap()];
        // Pages subsection comes before Blogs; 3 most recent items overall.
        assert!(detailed.find("## Pages").unwrap() < detailed.find("## Blogs").unwrap());
        assert!(detailed.contains("- URL: https://example.com/about"));
        assert_eq!(detailed.matches("- URL: ").count(), 3);
        assert!(detailed.contains("- Published: 2024-02-01"));
        assert!(detailed.contains("- Modified: 2024-02-01"));
    }

    #[test]
    fn test_detailed_item_without_lastmod_reads_unknown() {
        let pages = vec![page("https://example.com/about", "About", PageKind::Page, None)];
        let config = config();
        let doc = DocumentAssembler::new(&config).assemble(&pages, None).unwrap();
        assert!(doc.contains("- Published: Unknown\n- Modified: Unknown\n- URL: https://example.com/about"));
    }

    #[test]
    fn test_custom_template() {
        let mut config = config();
        config.template = Some("TITLE=${site_name}\n${site_overview}".to_string());
        let doc = DocumentAssembler::new(&config).assemble(&[], None).unwrap();
        assert!(doc.starts_with("TITLE=Example Site"));
        assert!(doc.contains("Total pages scraped: 0"));
    }

    #[test]
    fn test_custom_template_unknown_placeholder_fails() {
        let mut config = config();
        config.template = Some("${no_such_placeholder}".to_string());
        assert!(DocumentAssembler::new(&config).assemble(&[], None).is_err());
    }

    #[test]
    fn test_write_output_backs_up_existing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("llms.txt");
        std::fs::write(&out, "old content").unwrap();

        let mut config = config();
        config.output_path = out.to_string_lossy().to_string();
        let assembler = DocumentAssembler::new(&config);
        let backup = assembler.write_output("new content").unwrap();

        let backup = backup.expect("backup should exist");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old content");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "new content");
    }

    #[test]
    fn test_write_output_no_backup_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("llms.txt");
        std::fs::write(&out, "old content").unwrap();

        let mut config = config();
        config.output_path = out.to_string_lossy().to_string();
        config.backup_existing = false;
        let backup = DocumentAssembler::new(&config).write_output("new content").unwrap();
        assert!(backup.is_none());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "new content");
    }
}
