//! Document processing: extract, then chunk

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// A document record together with its chunks, ready for embedding
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

impl ProcessedDocument {
    /// Chunk texts in sequence order
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.content.clone()).collect()
    }
}

/// Turns uploaded bytes into a document and its chunks
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    chunker: TextChunker,
}

impl DocumentProcessor {
    /// Create a new processor
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self {
            chunker: TextChunker::from_config(config),
        }
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Extract and chunk a file
    pub fn process(&self, filename: &str, data: &[u8]) -> Result<ProcessedDocument> {
        let parsed = FileParser::parse(filename, data)?;

        let mut document = Document::new(
            filename.to_string(),
            parsed.file_type,
            parsed.content_hash.clone(),
            data.len() as u64,
        );
        document.total_pages = parsed.total_pages;
        document
            .metadata
            .insert("file_type".to_string(), serde_json::json!(parsed.file_type.as_str()));

        let chunks: Vec<Chunk> = self
            .chunker
            .chunk_text(&parsed.content)
            .iter()
            .map(|span| Chunk::new(&document, span))
            .collect();

        if chunks.is_empty() {
            return Err(Error::extraction(filename, "no extractable text"));
        }

        document.total_chunks = chunks.len() as u32;

        tracing::info!(
            "Processed '{}': {} pages, {} chunks",
            filename,
            document.total_pages.unwrap_or(1),
            chunks.len()
        );

        Ok(ProcessedDocument { document, chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    #[test]
    fn test_process_text_file() {
        let processor = DocumentProcessor::new(1000, 200);
        let processed = processor
            .process("facts.txt", b"The mitochondria is the powerhouse of the cell.")
            .unwrap();

        assert_eq!(processed.document.file_type, FileType::Txt);
        assert_eq!(processed.document.total_chunks, 1);
        assert_eq!(processed.chunks.len(), 1);
        assert_eq!(processed.chunks[0].document_id, processed.document.id);
        assert_eq!(processed.chunks[0].chunk_index, 0);
        assert_eq!(processed.texts(), vec!["The mitochondria is the powerhouse of the cell."]);
    }

    #[test]
    fn test_from_config_uses_chunking_settings() {
        let config = ChunkingConfig {
            chunk_size: 300,
            chunk_overlap: 30,
            ..ChunkingConfig::default()
        };
        let processor = DocumentProcessor::from_config(&config);
        assert_eq!(processor.chunker().chunk_size(), 300);
        assert_eq!(processor.chunker().overlap(), 30);
    }

    #[test]
    fn test_chunks_are_indexed_in_order() {
        let processor = DocumentProcessor::new(50, 10);
        let text = "word ".repeat(100);
        let processed = processor.process("long.md", text.as_bytes()).unwrap();

        assert!(processed.chunks.len() > 1);
        for (i, chunk) in processed.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index as usize, i);
        }
    }

    #[test]
    fn test_same_bytes_give_distinct_documents() {
        let processor = DocumentProcessor::default();
        let a = processor.process("a.txt", b"same content").unwrap();
        let b = processor.process("a.txt", b"same content").unwrap();
        assert_ne!(a.document.id, b.document.id);
        assert_eq!(a.document.content_hash, b.document.content_hash);
    }
}
