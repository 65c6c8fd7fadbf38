//! Chunk vector index backed by ruvector-core, with a SQLite document catalog
//!
//! Vectors and the chunk fields needed to rebuild a `Chunk` live in the
//! ruvector HNSW index (cosine distance). Document records and the
//! chunk-to-document mapping live in SQLite so documents can be listed,
//! counted and deleted.

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use ruvector_core::types::{DbOptions, HnswConfig};
use ruvector_core::{DistanceMetric, SearchQuery as CoreSearchQuery, VectorDB, VectorEntry};

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document, FileType};

const INDEX_FILE: &str = "vectors.db";
const CATALOG_FILE: &str = "catalog.db";

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Vector store wrapper for ruvector-core
pub struct VectorStore {
    /// Underlying vector database
    db: VectorDB,
    /// Document records and chunk ownership
    catalog: Arc<Mutex<Connection>>,
    /// Embedding dimensions
    dimensions: usize,
    #[cfg(test)]
    _dir: Option<tempfile::TempDir>,
}

impl VectorStore {
    /// Create or open the store under `data_dir`
    pub fn new(data_dir: &Path, dimensions: usize, index: &VectorDbConfig) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let conn = Connection::open(data_dir.join(CATALOG_FILE))
            .map_err(|e| Error::vector_db(format!("Failed to open catalog: {}", e)))?;
        let catalog = Arc::new(Mutex::new(conn));
        migrate(&catalog.lock(), dimensions)?;

        let options = DbOptions {
            dimensions,
            distance_metric: DistanceMetric::Cosine,
            storage_path: data_dir.join(INDEX_FILE).to_string_lossy().to_string(),
            hnsw_config: Some(HnswConfig {
                m: index.hnsw_m,
                ef_construction: index.hnsw_ef_construction,
                ef_search: index.hnsw_ef_search,
                max_elements: 10_000_000,
            }),
            quantization: None,
        };

        let db = VectorDB::new(options)?;

        Ok(Self {
            db,
            catalog,
            dimensions,
            #[cfg(test)]
            _dir: None,
        })
    }

    /// Create a store in a temporary directory removed on drop (for testing)
    #[cfg(test)]
    pub fn temporary(dimensions: usize) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let mut store = Self::new(dir.path(), dimensions, &VectorDbConfig::default())?;
        store._dir = Some(dir);
        Ok(store)
    }

    /// Embedding dimensionality enforced by this store
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Persist a document and its chunks with their embeddings
    ///
    /// Nothing is kept unless every chunk has exactly one embedding of the
    /// configured dimensionality and every write succeeds.
    pub fn add(&self, document: &Document, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        if let Some((i, bad)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != self.dimensions)
        {
            return Err(Error::vector_db(format!(
                "embedding {} has {} dimensions, expected {}",
                i,
                bad.len(),
                self.dimensions
            )));
        }

        if chunks.iter().any(|c| c.document_id != document.id) {
            return Err(Error::vector_db("chunk does not belong to document"));
        }

        let metadata = serde_json::to_string(&document.metadata)?;

        let mut conn = self.catalog.lock();
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO documents
               (id, filename, file_type, content_hash, total_pages, total_chunks, file_size, uploaded_at, metadata)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                document.id.to_string(),
                document.filename,
                document.file_type.as_str(),
                document.content_hash,
                document.total_pages,
                chunks.len() as i64,
                document.file_size as i64,
                document.uploaded_at,
                metadata,
            ],
        )?;

        let mut entries = Vec::with_capacity(chunks.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (id, document_id, chunk_index) VALUES (?1, ?2, ?3)",
            )?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.document_id.to_string(),
                    chunk.chunk_index,
                ])?;

                entries.push(VectorEntry {
                    id: Some(chunk.id.to_string()),
                    vector: embedding.clone(),
                    metadata: Some(chunk_to_metadata(chunk, tx.last_insert_rowid())),
                });
            }
        }

        let mut inserted: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.clone().unwrap_or_default();
            if let Err(e) = self.db.insert(entry) {
                self.remove_vectors(&inserted);
                return Err(e.into());
            }
            inserted.push(id);
        }

        if let Err(e) = tx.commit() {
            self.remove_vectors(&inserted);
            return Err(e.into());
        }

        tracing::debug!("Stored {} chunks for document {}", chunks.len(), document.id);
        Ok(chunks.len())
    }

    /// Return the `top_k` chunks most similar to `vector`, most similar first
    ///
    /// Equal scores keep insertion order.
    pub fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if vector.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "query vector has {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        if top_k == 0 || self.is_empty()? {
            return Ok(Vec::new());
        }

        let query = CoreSearchQuery {
            vector: vector.to_vec(),
            k: top_k,
            filter: None,
            ef_search: None,
        };

        let mut hits = Vec::new();
        for result in self.db.search(query)? {
            let parsed = result
                .metadata
                .as_ref()
                .and_then(|metadata| metadata_to_chunk(&result.id, metadata));

            match parsed {
                Some((seq, chunk)) => hits.push((
                    seq,
                    SearchResult {
                        chunk,
                        // Cosine distance -> similarity
                        similarity: 1.0 - result.score,
                    },
                )),
                None => tracing::warn!("Skipping vector {} with malformed metadata", result.id),
            }
        }

        hits.sort_by(|(seq_a, a), (seq_b, b)| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        hits.truncate(top_k);

        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> Result<usize> {
        Ok(self.db.len()?)
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of stored documents
    pub fn document_count(&self) -> Result<usize> {
        let conn = self.catalog.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Look up a document record
    pub fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        let conn = self.catalog.lock();
        conn.query_row(
            r#"SELECT id, filename, file_type, content_hash, total_pages, total_chunks,
                      file_size, uploaded_at, metadata
               FROM documents WHERE id = ?1"#,
            params![id.to_string()],
            row_to_document,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Delete a document and its chunks, returning the number of chunks removed
    pub fn delete_document(&self, id: &Uuid) -> Result<usize> {
        let mut conn = self.catalog.lock();

        let chunk_ids: Vec<String> = {
            let mut stmt = conn.prepare("SELECT id FROM chunks WHERE document_id = ?1")?;
            let rows = stmt.query_map(params![id.to_string()], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut deleted = 0;
        for chunk_id in &chunk_ids {
            if self.db.delete(chunk_id)? {
                deleted += 1;
            }
        }

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;

        Ok(deleted)
    }

    /// Check that both the index and the catalog answer
    pub fn health_check(&self) -> bool {
        let catalog_ok = {
            let conn = self.catalog.lock();
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
        };
        catalog_ok && self.db.len().is_ok()
    }

    fn remove_vectors(&self, ids: &[String]) {
        for id in ids {
            if let Err(e) = self.db.delete(id) {
                tracing::warn!("Failed to roll back vector {}: {}", id, e);
            }
        }
    }
}

/// Run catalog migrations and pin the embedding dimensionality
fn migrate(conn: &Connection, dimensions: usize) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;
    "#,
    )
    .map_err(|e| Error::vector_db(format!("Failed to set pragmas: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            file_type TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            total_pages INTEGER,
            total_chunks INTEGER NOT NULL,
            file_size INTEGER NOT NULL,
            uploaded_at TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            chunk_index INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);
    "#,
    )
    .map_err(|e| Error::vector_db(format!("Failed to create tables: {}", e)))?;

    conn.execute(
        "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('dimensions', ?1)",
        params![dimensions.to_string()],
    )?;

    let stored: String = conn.query_row(
        "SELECT value FROM store_meta WHERE key = 'dimensions'",
        [],
        |row| row.get(0),
    )?;

    if stored != dimensions.to_string() {
        return Err(Error::Config(format!(
            "vector store was created with {} dimensions, configured for {}",
            stored, dimensions
        )));
    }

    Ok(())
}

/// Chunk fields stored next to its vector; `seq` is the catalog insertion order
fn chunk_to_metadata(chunk: &Chunk, seq: i64) -> HashMap<String, Value> {
    let mut metadata = HashMap::new();
    metadata.insert("seq".to_string(), Value::from(seq));
    metadata.insert("document_id".to_string(), Value::from(chunk.document_id.to_string()));
    metadata.insert("filename".to_string(), Value::from(chunk.filename.clone()));
    metadata.insert("chunk_index".to_string(), Value::from(chunk.chunk_index));
    metadata.insert("content".to_string(), Value::from(chunk.content.clone()));
    metadata.insert("char_len".to_string(), Value::from(chunk.char_len as u64));
    metadata.insert("char_start".to_string(), Value::from(chunk.char_start as u64));
    metadata.insert("char_end".to_string(), Value::from(chunk.char_end as u64));
    if let Some(overlap) = chunk.overlap_chars {
        metadata.insert("overlap_chars".to_string(), Value::from(overlap as u64));
    }
    metadata
}

/// Convert metadata back to chunk
fn metadata_to_chunk(id: &str, metadata: &HashMap<String, Value>) -> Option<(i64, Chunk)> {
    let get_u64 = |key: &str| metadata.get(key).and_then(Value::as_u64);
    let get_str = |key: &str| metadata.get(key).and_then(Value::as_str);

    let chunk = Chunk {
        id: Uuid::parse_str(id).ok()?,
        document_id: Uuid::parse_str(get_str("document_id")?).ok()?,
        filename: get_str("filename")?.to_string(),
        chunk_index: u32::try_from(get_u64("chunk_index")?).ok()?,
        content: get_str("content")?.to_string(),
        char_len: get_u64("char_len")? as usize,
        char_start: get_u64("char_start")? as usize,
        char_end: get_u64("char_end")? as usize,
        overlap_chars: get_u64("overlap_chars").map(|o| o as usize),
    };

    Some((metadata.get("seq").and_then(Value::as_i64)?, chunk))
}

fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let file_type: String = row.get(2)?;
    let metadata: String = row.get(8)?;

    Ok(Document {
        id: parse_uuid(0, row.get(0)?)?,
        filename: row.get(1)?,
        file_type: FileType::parse(&file_type).unwrap_or(FileType::Txt),
        content_hash: row.get(3)?,
        total_pages: row.get(4)?,
        total_chunks: row.get(5)?,
        file_size: row.get::<_, i64>(6)? as u64,
        uploaded_at: row.get(7)?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextSpan;

    const DIMS: usize = 4;

    fn document_with_chunks(texts: &[&str]) -> (Document, Vec<Chunk>) {
        let doc = Document::new("doc.txt".to_string(), FileType::Txt, "hash".to_string(), 10);
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Chunk::new(
                    &doc,
                    &TextSpan {
                        index: i as u32,
                        text: t.to_string(),
                        char_start: 0,
                        char_end: t.len(),
                        overlap_chars: if i > 0 { Some(1) } else { None },
                    },
                )
            })
            .collect();
        (doc, chunks)
    }

    #[test]
    fn test_add_and_query_ordering() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["north", "east", "north-east"]);
        let embeddings = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.7, 0.7, 0.0, 0.0],
        ];

        assert_eq!(store.add(&doc, &chunks, &embeddings).unwrap(), 3);
        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.document_count().unwrap(), 1);

        let results = store.query(&[1.0, 0.1, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "north");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].chunk.filename, "doc.txt");
        assert_eq!(results[0].chunk.document_id, doc.id);
    }

    #[test]
    fn test_chunk_fields_survive_the_index() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["first", "second"]);
        store
            .add(&doc, &chunks, &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 0.0]])
            .unwrap();

        let results = store.query(&[0.0, 0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk, chunks[1]);
    }

    #[test]
    fn test_query_empty_store() {
        let store = VectorStore::temporary(DIMS).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(store.query(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
        assert!(store.health_check());
    }

    #[test]
    fn test_rejects_wrong_dimensions() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["a", "b"]);
        let embeddings = vec![vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0]];

        assert!(store.add(&doc, &chunks, &embeddings).is_err());
        assert_eq!(store.len().unwrap(), 0);
        assert_eq!(store.document_count().unwrap(), 0);

        assert!(store.query(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["a", "b"]);
        assert!(store.add(&doc, &chunks, &[vec![0.0; DIMS]]).is_err());
    }

    #[test]
    fn test_duplicate_document_id_leaves_no_vectors() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["a"]);
        store.add(&doc, &chunks, &[vec![1.0, 0.0, 0.0, 0.0]]).unwrap();

        // Same document row again: the catalog insert fails before any vector is written
        assert!(store.add(&doc, &chunks, &[vec![1.0, 0.0, 0.0, 0.0]]).is_err());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_and_delete_document() {
        let store = VectorStore::temporary(DIMS).unwrap();
        let (doc, chunks) = document_with_chunks(&["a", "b"]);
        store
            .add(&doc, &chunks, &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]])
            .unwrap();

        let fetched = store.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(fetched.filename, "doc.txt");
        assert_eq!(fetched.total_chunks, 2);

        assert_eq!(store.delete_document(&doc.id).unwrap(), 2);
        assert!(store.get_document(&doc.id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_catalog_pins_dimensions_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, chunks) = document_with_chunks(&["persisted"]);
        {
            let store = VectorStore::new(dir.path(), DIMS, &VectorDbConfig::default()).unwrap();
            store.add(&doc, &chunks, &[vec![0.0, 0.0, 1.0, 0.0]]).unwrap();
        }

        {
            let store = VectorStore::new(dir.path(), DIMS, &VectorDbConfig::default()).unwrap();
            assert_eq!(store.document_count().unwrap(), 1);
            assert_eq!(store.get_document(&doc.id).unwrap().unwrap().filename, "doc.txt");
        }

        assert!(matches!(
            VectorStore::new(dir.path(), 8, &VectorDbConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
