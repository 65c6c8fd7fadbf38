//! Document Q&A server binary
//!
//! Run with: MISTRAL_API_KEY=... cargo run -p doc-rag --bin doc-rag-server
//!
//! Variables may also be placed in a `.env` file in the working directory.

use doc_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables take precedence
    dotenvy::dotenv().ok();

    let config = RagConfig::from_env();

    let debug = config.as_ref().map(|c| c.app.debug).unwrap_or(false);
    let default_filter = if debug {
        "doc_rag=debug,tower_http=debug"
    } else {
        "doc_rag=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config.inspect_err(|e| tracing::error!("{}", e))?;

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Document RAG API                      ║
║          Ask questions about your PDFs and notes          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    tracing::info!("Configuration loaded");
    tracing::info!("  - App: {}", config.app.name);
    tracing::info!("  - Provider: {}", config.provider.base_url);
    tracing::info!("  - Chat model: {}", config.provider.chat_model);
    tracing::info!(
        "  - Embedding model: {} ({} dims)",
        config.provider.embedding_model,
        config.embeddings.dimensions
    );
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload  - Upload a document");
    println!("  POST /api/query   - Ask a question");
    println!("  GET  /api/stats   - Collection statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
