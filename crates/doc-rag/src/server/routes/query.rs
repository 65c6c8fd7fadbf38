//! Question answering endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// Characters of the question kept in log lines
const LOG_PREVIEW_CHARS: usize = 50;

/// POST /api/query - Answer a question from the indexed documents
pub async fn query_documents(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let start = Instant::now();
    tracing::info!(
        "Query: \"{}\" (top_k={})",
        preview(&request.question),
        request.top_k
    );

    let answer = state
        .pipeline()
        .answer(&request.question, request.top_k)
        .await?;

    tracing::info!(
        "Query completed in {}ms, {} sources",
        start.elapsed().as_millis(),
        answer.sources.len()
    );

    Ok(Json(QueryResponse::new(request.question, answer)))
}

fn preview(question: &str) -> String {
    if question.chars().count() <= LOG_PREVIEW_CHARS {
        question.to_string()
    } else {
        let head: String = question.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
