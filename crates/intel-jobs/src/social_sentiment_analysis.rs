use std::time::Duration;

use async_trait::async_trait;
use intel_analyzer::analyze_crowd_sentiment;
use intel_scheduler::{Job, JobOutcome, Trigger};

use crate::deps::JobDeps;

const BATCH_SIZE: i64 = 50;

/// Runs the crowd-sentiment LLM call against each session awaiting
/// analysis, mapping the five-point label to the stored numeric score.
pub struct SocialSentimentAnalysisJob {
    deps: JobDeps,
}

impl SocialSentimentAnalysisJob {
    pub fn new(deps: JobDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Job for SocialSentimentAnalysisJob {
    fn id(&self) -> &str {
        "social_sentiment_analysis"
    }

    fn name(&self) -> &str {
        "Social Sentiment Analysis"
    }

    fn trigger(&self) -> Trigger {
        Trigger::Interval(Duration::from_secs(60 * 60))
    }

    async fn run(&self) -> anyhow::Result<JobOutcome> {
        let sessions = self.deps.meta_store.sessions_needing_social_analysis(BATCH_SIZE).await?;
        let mut analyzed = 0u64;

        for session in &sessions {
            let posts = match self.deps.meta_store.posts_for_session(session.id).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(session_id = %session.id, error = %e, "failed to load session posts");
                    continue;
                }
            };
            if posts.is_empty() {
                continue;
            }

            let texts: Vec<String> = posts.into_iter().map(|p| p.text).collect();
            let verdict = match analyze_crowd_sentiment(&self.deps.clients.llm, &session.ticker, &texts).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(session_id = %session.id, error = %e, "crowd sentiment analysis failed");
                    continue;
                }
            };

            let label = format!("{:?}", verdict.sentiment).to_lowercase();
            let score = verdict.sentiment.score() as f64;
            if let Err(e) = self
                .deps
                .meta_store
                .save_social_sentiment_analysis(session.id, &label, score, &verdict.reasoning)
                .await
            {
                tracing::error!(session_id = %session.id, error = %e, "failed to persist sentiment analysis");
                continue;
            }
            analyzed += 1;
        }

        Ok(JobOutcome {
            items_processed: analyzed,
            summary: format!("sessions_analyzed={analyzed}"),
        })
    }
}
