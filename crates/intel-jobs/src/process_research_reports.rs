use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use intel_core::{Article, ArticleType, ReportType, Sentiment};
use intel_scheduler::{Job, JobOutcome, Trigger};
use uuid::Uuid;

use crate::deps::JobDeps;

/// Relevance assigned to every research report: these are curated documents,
/// not discovered news, so they start from a high prior.
const RESEARCH_REPORT_RELEVANCE: f64 = 0.9;
const EMBEDDING_CHAR_LIMIT: usize = 6000;

pub struct ProcessResearchReportsJob {
    deps: JobDeps,
    root: PathBuf,
}

impl ProcessResearchReportsJob {
    pub fn new(deps: JobDeps, root: PathBuf) -> Self {
        Self { deps, root }
    }

    fn report_type_for(path: &Path) -> ReportType {
        let folder = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_lowercase();

        if folder.contains("ticker") {
            ReportType::TICKER
        } else if folder.contains("fund") {
            ReportType::FUND
        } else {
            ReportType::MARKET
        }
    }

    /// Renames files lacking a `YYYYMMDD_` prefix in place, returning the
    /// (possibly new) path.
    async fn ensure_dated_prefix(path: &Path) -> std::io::Result<PathBuf> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if has_date_prefix(file_name) {
            return Ok(path.to_path_buf());
        }

        let today = Utc::now().format("%Y%m%d");
        let renamed = path.with_file_name(format!("{today}_{file_name}"));
        tokio::fs::rename(path, &renamed).await?;
        Ok(renamed)
    }

    async fn collect_pdfs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let mut stack = vec![dir.to_path_buf()];

        while let Some(current) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&current).await {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(dir = %current.display(), error = %e, "failed to read research reports directory");
                    continue;
                }
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().and_then(|e| e.to_str()) == Some("pdf") {
                    out.push(path);
                }
            }
        }
        Ok(out)
    }
}

fn has_date_prefix(file_name: &str) -> bool {
    file_name.len() >= 9
        && file_name.as_bytes()[..8].iter().all(u8::is_ascii_digit)
        && file_name.as_bytes()[8] == b'_'
}

#[async_trait]
impl Job for ProcessResearchReportsJob {
    fn id(&self) -> &str {
        "process_research_reports"
    }

    fn name(&self) -> &str {
        "Process Research Reports"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(std::time::Duration::from_secs(60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let pdfs = Self::collect_pdfs(&self.root).await?;
        let mut saved = 0u64;

        for pdf_path in pdfs {
            let url = pdf_path.to_string_lossy().to_string();
            match self.deps.research_store.article_exists_by_url(&url).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %url, error = %e, "duplicate check failed, skipping");
                    continue;
                }
            }

            let report_type = Self::report_type_for(&pdf_path);
            let pdf_path = match Self::ensure_dated_prefix(&pdf_path).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path = %url, error = %e, "failed to apply date prefix, processing in place");
                    pdf_path
                }
            };

            let pdf_path_for_extract = pdf_path.clone();
            let content = match tokio::task::spawn_blocking(move || pdf_extract::extract_text(&pdf_path_for_extract))
                .await
            {
                Ok(Ok(text)) if !text.trim().is_empty() => text,
                Ok(Ok(_)) => {
                    tracing::warn!(path = %url, "PDF produced no extractable text");
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!(path = %url, error = %e, "PDF extraction failed");
                    continue;
                }
                Err(e) => {
                    tracing::error!(path = %url, error = %e, "PDF extraction task panicked");
                    continue;
                }
            };

            let title = pdf_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Research Report")
                .to_string();

            let analysis = match self.deps.clients.llm.summarize(&title, &content).await {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(path = %url, error = %e, "LLM analysis of research report failed");
                    continue;
                }
            };

            let truncated: String = content.chars().take(EMBEDDING_CHAR_LIMIT).collect();
            let embedding = self.deps.clients.llm.embed(&truncated).await.ok();

            let article = Article {
                id: Uuid::new_v4(),
                title,
                url: pdf_path.to_string_lossy().to_string(),
                content,
                summary: Some(analysis.summary),
                source: Some(format!("research_report:{}", report_type.label)),
                published_at: None,
                fetched_at: Utc::now(),
                article_type: ArticleType::ResearchReport,
                tickers: analysis.tickers,
                sector: analysis.sectors.into_iter().next(),
                relevance_score: RESEARCH_REPORT_RELEVANCE,
                embedding,
                claims: analysis.claims,
                fact_check: analysis.fact_check,
                conclusion: analysis.conclusion,
                sentiment: analysis.sentiment.as_deref().and_then(parse_sentiment),
                sentiment_score: analysis.sentiment_score,
                logic_check: None,
                fund: None,
                archive_submitted_at: None,
                archive_checked_at: None,
                archive_url: None,
            };

            match self.deps.research_store.save_article(&article).await {
                Ok(_) => saved += 1,
                Err(e) => tracing::error!(path = %url, error = %e, "failed to persist research report"),
            }
        }

        Ok(JobOutcome {
            items_processed: saved,
            summary: format!("saved={saved}"),
        })
    }
}

fn parse_sentiment(raw: &str) -> Option<Sentiment> {
    match raw.to_lowercase().as_str() {
        "very_bullish" => Some(Sentiment::VeryBullish),
        "bullish" => Some(Sentiment::Bullish),
        "neutral" => Some(Sentiment::Neutral),
        "bearish" => Some(Sentiment::Bearish),
        "very_bearish" => Some(Sentiment::VeryBearish),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_date_prefix() {
        assert!(has_date_prefix("20260304_earnings.pdf"));
        assert!(!has_date_prefix("earnings.pdf"));
        assert!(!has_date_prefix("2026_earnings.pdf"));
    }
}
