use std::sync::Arc;

use intel_clients::ExternalClients;
use intel_domain_health::DomainHealth;
use intel_pipeline::ArticlePipeline;
use intel_store::{MetaStore, ResearchStore};

/// Everything a job needs, bundled once at `apps/intel-worker` startup and
/// cloned cheaply (every field is an `Arc` or already `Clone`) into each job
/// struct at registration time.
#[derive(Clone)]
pub struct JobDeps {
    pub pipeline: Arc<ArticlePipeline>,
    pub clients: ExternalClients,
    pub research_store: Arc<ResearchStore>,
    pub meta_store: Arc<MetaStore>,
    pub domain_health: Arc<DomainHealth>,
}
