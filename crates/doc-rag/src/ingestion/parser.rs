//! Text extraction for PDF, plain text and Markdown uploads

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// SHA-256 of `content`
    pub content_hash: String,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
}

/// Format-dispatching file parser
pub struct FileParser;

impl FileParser {
    /// Resolve the declared format of `filename`
    pub fn detect(filename: &str) -> Result<FileType> {
        FileType::from_filename(filename).ok_or_else(|| {
            let ext = filename
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
                .unwrap_or_else(|| "(none)".to_string());
            Error::UnsupportedFormat(format!(
                "{}. Allowed: {}",
                ext,
                FileType::allowed_extensions().join(", ")
            ))
        })
    }

    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = Self::detect(filename)?;

        let parsed = match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data)?,
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, file_type)?,
        };

        if parsed.content.trim().is_empty() {
            return Err(Error::extraction(filename, "no extractable text"));
        }

        tracing::debug!(
            "Extracted {} characters from {} ({})",
            parsed.content.chars().count(),
            filename,
            file_type.display_name()
        );

        Ok(parsed)
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("unreadable PDF: {}", e)))?;

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(Error::extraction(filename, "PDF is encrypted"));
        }

        let total_pages = doc.get_pages().len() as u32;

        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content_hash: hash_content(&content),
            content,
            total_pages: Some(total_pages),
        })
    }

    /// Parse plain text or markdown
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("file is not valid UTF-8: {}", e)))?
            .to_string();

        Ok(ParsedDocument {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
        })
    }
}

/// Hash extracted content
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// One-page PDF showing `text` in Courier; `encrypt` adds an Encrypt trailer entry
    fn build_pdf(text: &str, encrypt: bool) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if encrypt {
            let encrypt_id = doc.add_object(dictionary! {
                "Filter" => "Standard",
                "V" => 1,
                "R" => 2,
                "O" => Object::string_literal(vec![0u8; 32]),
                "U" => Object::string_literal(vec![0u8; 32]),
                "P" => -4,
            });
            doc.trailer.set("Encrypt", encrypt_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_parse_text_and_markdown() {
        let parsed = FileParser::parse("notes.txt", b"Rust is a systems language.").unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert_eq!(parsed.content, "Rust is a systems language.");
        assert_eq!(parsed.content_hash.len(), 64);
        assert_eq!(parsed.total_pages, None);

        let parsed = FileParser::parse("README.MD", b"# Title\n\nBody text.").unwrap();
        assert_eq!(parsed.file_type, FileType::Markdown);
        assert!(parsed.content.starts_with("# Title"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let parsed = FileParser::parse("bom.txt", b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(parsed.content, "hello");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileParser::parse("report.docx", b"data").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(err.to_string().contains(".docx"));

        let err = FileParser::parse("noext", b"data").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_utf8_is_extraction_error() {
        let err = FileParser::parse("bad.txt", &[0xff, 0xfe, 0x00, 0x80]).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_blank_file_is_extraction_error() {
        let err = FileParser::parse("blank.md", b"  \n\t ").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_parse_single_page_pdf() {
        let data = build_pdf("Hello from page one", false);
        let parsed = FileParser::parse("letter.pdf", &data).unwrap();

        assert_eq!(parsed.file_type, FileType::Pdf);
        assert_eq!(parsed.total_pages, Some(1));
        assert!(parsed.content.contains("Hello"), "extracted: {:?}", parsed.content);
        assert_eq!(parsed.content_hash.len(), 64);
    }

    #[test]
    fn test_encrypted_pdf_is_extraction_error() {
        let data = build_pdf("Secret minutes", true);
        let err = FileParser::parse("locked.pdf", &data).unwrap_err();
        assert!(matches!(err, Error::Extraction { ref filename, .. } if filename == "locked.pdf"));
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let err = FileParser::parse("broken.pdf", b"%PDF-1.4 this is not really a pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }
}
