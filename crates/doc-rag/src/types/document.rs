//! Document and chunk types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Detect file type from a filename's final extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Extensions accepted on upload
    pub fn allowed_extensions() -> &'static [&'static str] {
        &[".pdf", ".txt", ".md"]
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
        }
    }

    /// Stable lowercase tag used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Markdown => "markdown",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// A document that has been uploaded and indexed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded by user
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// Total number of pages (PDF only)
    pub total_pages: Option<u32>,
    /// Total number of chunks created
    pub total_chunks: u32,
    /// File size in bytes
    pub file_size: u64,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document with a fresh ID
    pub fn new(filename: String, file_type: FileType, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            total_pages: None,
            total_chunks: 0,
            file_size,
            uploaded_at: chrono::Utc::now(),
            metadata: HashMap::new(),
        }
    }
}

/// A chunk of text from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Source filename (for prompt context)
    pub filename: String,
    /// Chunk index within document
    pub chunk_index: u32,
    /// Text content
    pub content: String,
    /// Length of `content` in characters
    pub char_len: usize,
    /// Character window in the extracted text
    pub char_start: usize,
    pub char_end: usize,
    /// Characters shared with the previous chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_chars: Option<usize>,
}

impl Chunk {
    /// Create a chunk owned by `document`
    pub fn new(document: &Document, span: &TextSpan) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            filename: document.filename.clone(),
            chunk_index: span.index,
            char_len: span.text.chars().count(),
            content: span.text.clone(),
            char_start: span.char_start,
            char_end: span.char_end,
            overlap_chars: span.overlap_chars,
        }
    }
}

/// Output of the chunker before a chunk is bound to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Sequence index
    pub index: u32,
    /// Trimmed text
    pub text: String,
    /// Window start (characters)
    pub char_start: usize,
    /// Window end, exclusive (characters)
    pub char_end: usize,
    /// Characters shared with the previous window
    pub overlap_chars: Option<usize>,
}
