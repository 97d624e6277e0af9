// Migration stages. Each stage is a thin wrapper over one or more API calls;
// none of them retries or recovers. The batch stages fan out through
// `batch::run_batch_with_progress`.

use crate::api::{ApiClient, Document, LoginRequest};
use crate::batch::run_batch_with_progress;
use crate::config::Credentials;
use crate::ui;
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Log in and store the session token in `api`. Returns the token.
pub async fn authenticate(api: &mut ApiClient, credentials: &Credentials) -> Result<String> {
    let spinner = ui::spinner("Logging in...");
    let req = LoginRequest {
        username: credentials.username.clone(),
        password: credentials.password.clone(),
    };
    let result = api.login(&req).await;
    spinner.finish_and_clear();
    let token = result?.token;
    api.set_token(&token);
    tracing::info!(username = %credentials.username, "authenticated");
    Ok(token)
}

/// Names of the API-enabled projects, in the order the service lists them.
pub async fn api_enabled_projects(api: &ApiClient) -> Result<Vec<String>> {
    let projects = api.list_projects().await?;
    let total = projects.len();
    let enabled: Vec<String> = projects
        .into_iter()
        .filter(|p| p.api_enabled == Some(true))
        .map(|p| p.name)
        .collect();
    tracing::info!(total, enabled = enabled.len(), "listed projects");
    Ok(enabled)
}

/// `Document-1` … `Document-{count}`, all at version 1.
pub fn synthetic_documents(count: usize) -> Vec<Document> {
    (1..=count)
        .map(|i| Document::new(format!("Document-{}", i)))
        .collect()
}

/// Create `count` synthetic documents in `project`, at most `concurrency`
/// requests at a time. Documents created before a failure are left in place.
pub async fn upload_documents(
    api: &ApiClient,
    project: &str,
    count: usize,
    concurrency: usize,
) -> Result<Vec<Document>> {
    let documents = synthetic_documents(count);
    let progress = ui::batch_progress(count, "Uploading");
    run_batch_with_progress(documents.clone(), concurrency, &progress, |document| async move {
        api.create_document(project, &document).await
    })
    .await
    .with_context(|| format!("Uploading documents to {} failed", project))?;
    tracing::info!("Successfully uploaded {} documents to {}.", count, project);
    Ok(documents)
}

/// Transfer every document listed in `source` to `target`, at most
/// `concurrency` requests at a time. Returns the documents that were
/// transferred.
pub async fn transfer_documents(
    api: &ApiClient,
    source: &str,
    target: &str,
    concurrency: usize,
) -> Result<Vec<Document>> {
    let documents = api.list_documents(source).await?;
    let progress = ui::batch_progress(documents.len(), "Transferring");
    run_batch_with_progress(documents.clone(), concurrency, &progress, |document| async move {
        api.transfer_document(source, &document, target).await
    })
    .await
    .with_context(|| format!("Transferring documents from {} to {} failed", source, target))?;
    tracing::info!(
        "Successfully transferred {} documents from {} to {}.",
        documents.len(),
        source,
        target
    );
    Ok(documents)
}

/// List `project` and log each version-1 document as present.
///
/// Returns `true` whenever the listing succeeds, including an empty listing.
/// It does not compare against any expected set; use [`missing_documents`]
/// for that.
pub async fn verify_documents_exist(api: &ApiClient, project: &str) -> Result<bool> {
    let documents = api.list_documents(project).await?;
    for document in documents.iter().filter(|d| d.version == 1) {
        tracing::info!("Document {} exists in {}.", document.document_number, project);
    }
    Ok(true)
}

/// Documents from `expected` whose `(documentNumber, version)` is absent
/// from the listing of `project`.
pub async fn missing_documents(
    api: &ApiClient,
    project: &str,
    expected: &[Document],
) -> Result<Vec<Document>> {
    let present: HashSet<Document> = api.list_documents(project).await?.into_iter().collect();
    Ok(expected
        .iter()
        .filter(|d| !present.contains(*d))
        .cloned()
        .collect())
}
