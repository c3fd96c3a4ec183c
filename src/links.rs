//! Booking link extraction
//!
//! Pulls Markdown links (`[Explore Zamalek](https://...)`) and bare Airbnb
//! search URLs out of a model reply so each can be delivered as its own
//! Telegram message.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static RE_MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\((https?://(?:[^\s()]|\([^\s()]*\))+)\)").unwrap());

static RE_BARE_AIRBNB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://www\.airbnb\.com/s/[^\s)\]]+").unwrap());

/// A link found in a reply
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExtractedLink {
    /// Markdown label, `None` for bare URLs
    pub label: Option<String>,
    pub url: String,
}

impl ExtractedLink {
    pub fn labeled(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            url: url.into(),
        }
    }

    pub fn bare(url: impl Into<String>) -> Self {
        Self {
            label: None,
            url: url.into(),
        }
    }
}

/// `label: url` for Markdown links, the plain URL otherwise
impl fmt::Display for ExtractedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}: {}", label, self.url),
            None => f.write_str(&self.url),
        }
    }
}

/// Extract booking links from `reply`.
///
/// Links are deduplicated by URL and returned ordered by URL. When a URL
/// appears both as a Markdown target and bare, the labeled form wins; the
/// first label seen is kept.
pub fn extract_links(reply: &str) -> Vec<ExtractedLink> {
    let mut by_url: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    let mut markdown_spans = Vec::new();

    for caps in RE_MARKDOWN_LINK.captures_iter(reply) {
        let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        markdown_spans.push(url.range());
        let label = label.as_str().trim();
        let entry = by_url.entry(url.as_str()).or_insert(None);
        if entry.is_none() && !label.is_empty() {
            *entry = Some(label);
        }
    }

    // Bare matches inside a Markdown target are the same link
    for m in RE_BARE_AIRBNB.find_iter(reply) {
        if markdown_spans.iter().any(|span| span.contains(&m.start())) {
            continue;
        }
        by_url.entry(m.as_str()).or_insert(None);
    }

    by_url
        .into_iter()
        .map(|(url, label)| ExtractedLink {
            label: label.map(str::to_string),
            url: url.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_and_bare_links() {
        let reply = "Here you go: [Explore X](https://a) or see https://www.airbnb.com/s/b for more.";
        let links = extract_links(reply);

        assert_eq!(
            links,
            vec![
                ExtractedLink::labeled("Explore X", "https://a"),
                ExtractedLink::bare("https://www.airbnb.com/s/b"),
            ]
        );
        let rendered: Vec<String> = links.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["Explore X: https://a", "https://www.airbnb.com/s/b"]);
    }

    #[test]
    fn test_markdown_target_not_repeated_as_bare() {
        let url = "https://www.airbnb.com/s/Cairo--Zamalek/homes?checkin=2025-07-12&checkout=2025-07-15&adults=2";
        let reply = format!("1. **Zamalek** - leafy island.\n   [Explore Zamalek]({})\n", url);

        let links = extract_links(&reply);
        assert_eq!(links, vec![ExtractedLink::labeled("Explore Zamalek", url)]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let reply = "[A](https://x.com/1) [A again](https://x.com/1) https://www.airbnb.com/s/z https://www.airbnb.com/s/z";
        let links = extract_links(reply);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1], ExtractedLink::labeled("A", "https://x.com/1"));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let reply = "[Explore Maadi](https://www.airbnb.com/s/Cairo--Maadi/homes) [Explore Giza](https://www.airbnb.com/s/Giza/homes) https://www.airbnb.com/s/Cairo--Downtown/homes";
        let first = extract_links(reply);
        for _ in 0..5 {
            assert_eq!(extract_links(reply), first);
        }
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_markdown_target_with_parentheses() {
        let reply = "Read about [Zamalek](https://en.wikipedia.org/wiki/Zamalek_(Cairo)) first.";
        assert_eq!(
            extract_links(reply),
            vec![ExtractedLink::labeled(
                "Zamalek",
                "https://en.wikipedia.org/wiki/Zamalek_(Cairo)"
            )]
        );
    }

    #[test]
    fn test_parenthesized_airbnb_target_is_one_link() {
        let url = "https://www.airbnb.com/s/Cairo_(Egypt)/homes?adults=2";
        let reply = format!("[Explore Cairo]({})", url);
        assert_eq!(extract_links(&reply), vec![ExtractedLink::labeled("Explore Cairo", url)]);
    }

    #[test]
    fn test_bare_url_stops_at_closing_paren() {
        let reply = "(see https://www.airbnb.com/s/Cairo/homes)";
        assert_eq!(
            extract_links(reply),
            vec![ExtractedLink::bare("https://www.airbnb.com/s/Cairo/homes")]
        );
    }

    #[test]
    fn test_non_airbnb_bare_urls_ignored() {
        assert!(extract_links("Visit https://example.com/s/x today").is_empty());
        assert!(extract_links("").is_empty());
    }
}
