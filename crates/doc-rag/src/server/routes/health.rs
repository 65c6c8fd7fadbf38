//! Health and collection statistics endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{HealthResponse, StatsResponse};

/// GET /api/health - Provider reachability, storage health and index size; always 200
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = state.pipeline();

    let provider_connection = pipeline.llm().health_check().await.unwrap_or(false);
    let index_ok = pipeline.store().health_check().await.unwrap_or(false);
    let uploads_ok = state.documents().health_check().await.unwrap_or(false);

    let response = match pipeline.store().len().await {
        Ok(chunks) if provider_connection && index_ok && uploads_ok => HealthResponse {
            status: "healthy".to_string(),
            provider_connection,
            chunks_indexed: chunks,
            message: format!("Service is running. {} chunks indexed.", chunks),
        },
        Ok(chunks) => {
            let message = if !provider_connection {
                format!("Cannot reach model provider '{}'", pipeline.llm().name())
            } else if !index_ok {
                format!("Vector store '{}' is unavailable", pipeline.store().name())
            } else {
                format!("Document store '{}' is unavailable", state.documents().name())
            };
            HealthResponse {
                status: "unhealthy".to_string(),
                provider_connection,
                chunks_indexed: chunks,
                message,
            }
        }
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            HealthResponse {
                status: "unhealthy".to_string(),
                provider_connection,
                chunks_indexed: 0,
                message: e.to_string(),
            }
        }
    };

    Json(response)
}

/// GET /api/stats - Collection statistics
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let store = state.pipeline().store();

    Ok(Json(StatsResponse {
        total_chunks: store.len().await?,
        total_documents: store.document_count().await?,
        collection_name: state.config().storage.collection_name.clone(),
    }))
}
