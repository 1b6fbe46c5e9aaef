use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ExtractionError;

/// Per-domain User-Agent overrides for sites known to block the default
/// client UA outright. Falls back to a generic desktop Chrome string.
const USER_AGENT_TABLE: &[(&str, &str)] = &[
    (
        "seekingalpha.com",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    ),
    (
        "barrons.com",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    ),
    (
        "wsj.com",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    ),
];

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Substrings seen in paywall interstitials across major financial
/// publishers. Checked against the fetched body before content extraction
/// runs, so a thin teaser page is never mistaken for real article text.
const PAYWALL_MARKERS: &[&str] = &[
    "subscribe to continue reading",
    "subscribe to read",
    "already a subscriber",
    "create a free account to read",
    "this content is reserved for subscribers",
    "to continue reading this article",
];

fn user_agent_for(host: &str) -> &'static str {
    USER_AGENT_TABLE
        .iter()
        .find(|(domain, _)| host.ends_with(domain))
        .map(|(_, ua)| *ua)
        .unwrap_or(DEFAULT_USER_AGENT)
}

fn looks_paywalled(body_lower: &str) -> bool {
    PAYWALL_MARKERS.iter().any(|m| body_lower.contains(m))
}

#[derive(Debug, Clone)]
pub struct ExtractedArticle {
    pub title: String,
    pub content: String,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Fetches a URL and pulls out title/content/source, distinguishing the
/// recoverable failure reasons the pipeline needs to branch on.
#[derive(Clone)]
pub struct Extractor {
    client: reqwest::Client,
}

impl Extractor {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build extractor HTTP client");
        Self::with_client(client)
    }

    pub async fn extract(&self, url: &str) -> Result<ExtractedArticle, ExtractionError> {
        let host = url::host_from(url);
        let ua = user_agent_for(&host);

        let resp = self
            .client
            .get(url)
            .header("User-Agent", ua)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout
                } else {
                    ExtractionError::Unknown(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionError::Http(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ExtractionError::Unknown(e.to_string()))?;

        if looks_paywalled(&body.to_lowercase()) {
            return Err(ExtractionError::PaidSubscription);
        }

        let (title, content) = parse_title_and_content(&body);
        if content.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }

        Ok(ExtractedArticle {
            title,
            content,
            source: Some(host),
            published_at: None,
        })
    }

    pub async fn health(&self) -> bool {
        self.client
            .get("https://www.google.com")
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Same title/content pass as `extract`, run against HTML already in
    /// hand (an archive snapshot body) instead of fetching a URL.
    pub fn extract_from_html(&self, html: &str) -> Result<ExtractedArticle, ExtractionError> {
        let (title, content) = parse_title_and_content(html);
        if content.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(ExtractedArticle {
            title,
            content,
            source: None,
            published_at: None,
        })
    }
}

/// Minimal readability pass: title from `<title>`, content from `<p>` tags
/// with markup stripped. Real HTML parsing belongs in a dedicated crate;
/// this is deliberately forgiving since upstream pages vary wildly.
fn parse_title_and_content(html: &str) -> (String, String) {
    let title = html
        .find("<title>")
        .and_then(|start| {
            html[start..]
                .find("</title>")
                .map(|end| html[start + 7..start + end].trim().to_string())
        })
        .unwrap_or_default();

    let mut content = String::new();
    let mut rest = html;
    while let Some(p_start) = rest.find("<p") {
        let Some(tag_end) = rest[p_start..].find('>') else {
            break;
        };
        let body_start = p_start + tag_end + 1;
        let Some(p_end) = rest[body_start..].find("</p>") else {
            break;
        };
        let raw = &rest[body_start..body_start + p_end];
        content.push_str(&strip_tags(raw));
        content.push('\n');
        rest = &rest[body_start + p_end + 4..];
    }

    (title, content.trim().to_string())
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Tiny host-extraction helper so this module doesn't need a full `url` crate
/// dependency for the one thing it needs from a URL string.
mod url {
    pub fn host_from(raw: &str) -> String {
        let without_scheme = raw.split("://").nth(1).unwrap_or(raw);
        without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_paywall_markers_case_insensitively() {
        assert!(looks_paywalled("please Subscribe To Continue Reading this story"));
        assert!(!looks_paywalled("a perfectly normal article body"));
    }

    #[test]
    fn picks_domain_specific_user_agent() {
        assert!(user_agent_for("www.seekingalpha.com").contains("Safari/605.1.15"));
        assert_eq!(user_agent_for("example.com"), DEFAULT_USER_AGENT);
    }

    #[test]
    fn extracts_title_and_paragraph_text() {
        let html = "<html><head><title>Hi</title></head><body><p>Hello <b>world</b></p></body></html>";
        let (title, content) = parse_title_and_content(html);
        assert_eq!(title, "Hi");
        assert_eq!(content, "Hello world");
    }
}
