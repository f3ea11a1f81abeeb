use crate::clock::document_file_name;
use crate::config::ConflictPolicy;
use crate::dtos::GenerateDocumentRequest;
use crate::services::metrics::{record_document_generated, record_generation_failure};
use crate::services::{GeneratedDocument, DOCX_CONTENT_TYPE};
use crate::startup::AppState;
use crate::utils::FormOrJson;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;
use tracing::{field, Span};

/// `POST /generate`: validate, build the document, store it under
/// `doc_<ts>.docx` and return the same bytes as an attachment.
#[tracing::instrument(
    skip_all,
    fields(request_id = field::Empty, file_name = field::Empty)
)]
pub async fn generate_document(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    FormOrJson(request): FormOrJson<GenerateDocumentRequest>,
) -> Result<Response, AppError> {
    if let Some(Extension(id)) = &request_id {
        Span::current().record("request_id", field::display(id));
    }

    let request = request.into_valid()?;

    let file_name = document_file_name(state.clock.now());
    Span::current().record("file_name", file_name.as_str());

    let document = GeneratedDocument::from_request(&request);
    let bytes = match tokio::task::spawn_blocking(move || document.to_docx_bytes()).await {
        Ok(result) => result,
        Err(e) => Err(AppError::InternalError(anyhow::anyhow!(
            "Document serialization task failed: {}",
            e
        ))),
    }
    .map_err(|e| {
        record_generation_failure("serialize");
        tracing::error!(error = %e, "Failed to serialize document");
        e
    })?;

    let stored = match state.config.documents.on_conflict {
        ConflictPolicy::Overwrite => state.storage.put(&file_name, bytes.clone()).await,
        ConflictPolicy::Reject => state.storage.put_new(&file_name, bytes.clone()).await,
    };
    stored.map_err(|e| {
        match &e {
            AppError::Conflict(_) => {
                tracing::warn!("Document name already taken in storage");
            }
            _ => {
                record_generation_failure("store");
                tracing::error!(error = %e, "Failed to store document");
            }
        }
        e
    })?;

    record_document_generated(bytes.len());
    tracing::info!(size = bytes.len(), "Document generated");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}
