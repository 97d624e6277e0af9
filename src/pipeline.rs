// End-to-end run: authenticate, pick the first two API-enabled projects,
// upload synthetic documents to the first, transfer them all to the second
// and verify the second.

use crate::api::{ApiClient, Document};
use crate::config::Config;
use crate::migration;
use anyhow::Result;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub source_project: String,
    pub target_project: String,
    pub uploaded: Vec<Document>,
    pub transferred: Vec<Document>,
    pub verified: bool,
}

/// Run the whole migration against the service described by `config`.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let mut api = ApiClient::new(&config.base_url, config.request_timeout)?;
    migration::authenticate(&mut api, &config.credentials).await?;

    let projects = migration::api_enabled_projects(&api).await?;
    let [source, target, ..] = projects.as_slice() else {
        anyhow::bail!(
            "at least two API-enabled projects are required for the document transfer, found {}",
            projects.len()
        );
    };
    tracing::info!(source_project = %source, target_project = %target, "selected projects");

    let uploaded =
        migration::upload_documents(&api, source, config.document_count, config.concurrency)
            .await?;
    let transferred =
        migration::transfer_documents(&api, source, target, config.concurrency).await?;

    let verified = if config.strict_verify {
        let missing = migration::missing_documents(&api, target, &transferred).await?;
        if !missing.is_empty() {
            let numbers: Vec<&str> = missing.iter().map(|d| d.document_number.as_str()).collect();
            anyhow::bail!(
                "{} transferred documents are missing from {}: {}",
                missing.len(),
                target,
                numbers.join(", ")
            );
        }
        true
    } else {
        migration::verify_documents_exist(&api, target).await?
    };

    Ok(RunSummary {
        source_project: source.clone(),
        target_project: target.clone(),
        uploaded,
        transferred,
        verified,
    })
}
