//! Document upload endpoint

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::FileParser;
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(err.body_text())
    } else {
        Error::InvalidRequest(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

/// POST /api/upload - Extract, chunk, embed and index one file
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| Error::InvalidRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::InvalidRequest("uploaded file has no filename".to_string()))?;

        // Reject before reading the body
        FileParser::detect(&filename)?;

        let data = field.bytes().await.map_err(multipart_error)?;
        let start = Instant::now();

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        // PDF extraction is CPU-bound and may panic on malformed input
        let processed = {
            let state = state.clone();
            let name = filename.clone();
            let bytes = data.clone();
            tokio::task::spawn_blocking(move || state.processor().process(&name, &bytes))
                .await
                .map_err(|e| Error::extraction(&filename, format!("parser failed: {}", e)))??
        };

        let chunks_created = state.pipeline().index_document(&processed).await?;

        // Keep the raw file only for documents that made it into the index
        let document_id = processed.document.id;
        match state.documents().store_document(&document_id, &filename, &data).await {
            Ok(stored_at) => tracing::debug!("Stored raw upload at {}", stored_at),
            Err(e) => {
                tracing::error!("Failed to store raw upload for {}: {}", document_id, e);
                if let Err(cleanup) = state.pipeline().store().delete_document(&document_id).await {
                    tracing::warn!("Failed to remove chunks for {}: {}", document_id, cleanup);
                }
                return Err(e);
            }
        }

        tracing::info!(
            "Uploaded {} as {} with {} chunks in {}ms",
            filename,
            processed.document.id,
            chunks_created,
            start.elapsed().as_millis()
        );

        return Ok(Json(UploadResponse {
            document_id: processed.document.id,
            filename,
            chunks_created,
            message: "Document uploaded and indexed successfully".to_string(),
        }));
    }

    Err(Error::InvalidRequest(format!(
        "multipart field '{}' is required",
        FILE_FIELD
    )))
}
