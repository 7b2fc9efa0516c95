//! Workflow documents and their blob paths.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::LitmasId;

/// Bucket holding task and report documents.
pub const DOCUMENTS_BUCKET: &str = "documents";

/// Extension used when an uploaded file name carries none.
const FALLBACK_EXTENSION: &str = "pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Signed assignment letter uploaded when work starts.
    SuratTugas,
    /// The field report submitted for review.
    HasilLitmas,
}

impl DocumentKind {
    pub fn category(self) -> &'static str {
        match self {
            DocumentKind::SuratTugas => "surat-tugas",
            DocumentKind::HasilLitmas => "hasil-litmas",
        }
    }
}

/// What the lifecycle engine needs to know about a file before it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file_name: String,
    pub size: u64,
}

impl DocumentMeta {
    pub fn new(file_name: impl Into<String>, size: u64) -> Self {
        DocumentMeta {
            file_name: file_name.into(),
            size,
        }
    }
}

/// `{category}/{caseId}_{timestampMillis}.{ext}`
pub fn document_path(
    kind: DocumentKind,
    case_id: LitmasId,
    file_name: &str,
    now: OffsetDateTime,
) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    format!(
        "{}/{}_{}.{}",
        kind.category(),
        case_id,
        millis,
        extension_of(file_name)
    )
}

/// `path` with `-{attempt}` before the extension, for when the plain path
/// is already taken.
pub fn alternate_document_path(path: &str, attempt: u32) -> String {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !stem.ends_with('/') => format!("{}-{}.{}", stem, attempt, ext),
        _ => format!("{}-{}", path, attempt),
    }
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(stem, ext)| (stem, ext.trim()))
        .filter(|(stem, ext)| {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn path_uses_category_case_and_millis() {
        let now = datetime!(2026-03-05 10:30:00.250 UTC);
        let path = document_path(DocumentKind::SuratTugas, 42, "Surat Tugas.PDF", now);
        assert_eq!(path, format!("surat-tugas/42_{}.pdf", 1_772_706_600_250i64));
    }

    #[test]
    fn odd_file_names_fall_back_to_pdf() {
        let now = datetime!(2026-03-05 10:30 UTC);
        for name in ["laporan", ".hidden", "laporan.", "laporan.p d f"] {
            let path = document_path(DocumentKind::HasilLitmas, 1, name, now);
            assert!(path.ends_with(".pdf"), "{} -> {}", name, path);
            assert!(path.starts_with("hasil-litmas/1_"));
        }
        let path = document_path(DocumentKind::HasilLitmas, 1, "laporan.docx", now);
        assert!(path.ends_with(".docx"));
    }

    #[test]
    fn alternate_path_keeps_extension() {
        assert_eq!(
            alternate_document_path("hasil-litmas/1_1767607200000.pdf", 2),
            "hasil-litmas/1_1767607200000-2.pdf"
        );
        assert_eq!(alternate_document_path("odd/path", 1), "odd/path-1");
    }
}
