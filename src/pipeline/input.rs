//! File selection: resolve a user-supplied path and check it against the
//! document allow-list.
//!
//! A file is accepted when its declared MIME type is one of
//! [`ALLOWED_MIME_TYPES`], or when its name ends in one of
//! [`FALLBACK_EXTENSIONS`]. Browsers and operating systems report spreadsheet
//! MIME types inconsistently (an empty string or `application/octet-stream`
//! for `.csv` is common), hence the extension fallback. PDFs are always
//! reported reliably, so `.pdf` is deliberately absent from the fallback list.

use crate::error::AnalysisError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Declared MIME types accepted without looking at the file name.
pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Extensions accepted when the MIME type is not on the list.
pub const FALLBACK_EXTENSIONS: [&str; 3] = [".csv", ".xls", ".xlsx"];

/// Where the bytes of a file come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A local file, read when the analysis runs.
    Path(PathBuf),
    /// Bytes already in memory.
    Memory(Arc<[u8]>),
}

/// A file the user picked, before validation.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    /// MIME type as declared by the picker; may be empty.
    pub mime_type: String,
    pub size_bytes: Option<u64>,
    pub source: FileSource,
}

impl FileCandidate {
    /// Wrap an in-memory document.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: Some(bytes.len() as u64),
            source: FileSource::Memory(bytes),
        }
    }
}

/// A candidate that passed [`validate_selection`].
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    size_bytes: Option<u64>,
    source: FileSource,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type as declared at selection time.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size_bytes
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// MIME type to label the inline attachment with.
    ///
    /// Uses the declared type when it is on the allow-list, otherwise the type
    /// implied by the fallback extension that got the file accepted.
    pub fn attachment_mime_type(&self) -> &str {
        if ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return &self.mime_type;
        }
        let lower = self.name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            "text/csv"
        } else if lower.ends_with(".xlsx") {
            ALLOWED_MIME_TYPES[3]
        } else if lower.ends_with(".xls") {
            "application/vnd.ms-excel"
        } else {
            &self.mime_type
        }
    }
}

/// Whether a file with this name and declared MIME type may be analysed.
pub fn is_allowed(name: &str, mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    if ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    FALLBACK_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Accept or reject a picked file.
pub fn validate_selection(candidate: FileCandidate) -> Result<SelectedFile, AnalysisError> {
    if !is_allowed(&candidate.name, &candidate.mime_type) {
        warn!(
            "Rejected '{}' (declared type '{}')",
            candidate.name, candidate.mime_type
        );
        return Err(AnalysisError::UnsupportedFile {
            name: candidate.name,
            mime_type: if candidate.mime_type.is_empty() {
                "unknown".to_string()
            } else {
                candidate.mime_type
            },
        });
    }
    debug!("Accepted '{}' ({})", candidate.name, candidate.mime_type);
    Ok(SelectedFile {
        name: candidate.name,
        mime_type: candidate.mime_type.trim().to_ascii_lowercase(),
        size_bytes: candidate.size_bytes,
        source: candidate.source,
    })
}

/// Guess the MIME type a file picker would declare for this path.
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Turn a local path into a [`FileCandidate`], checking that it is readable.
///
/// `mime_override` stands in for the type a browser would report; without it
/// the type is guessed from the extension.
pub fn resolve_local(path: &Path, mime_override: Option<&str>) -> Result<FileCandidate, AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let metadata = match std::fs::File::open(path).and_then(|f| f.metadata()) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnalysisError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(AnalysisError::FileRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if !metadata.is_file() {
        return Err(AnalysisError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = match mime_override {
        Some(m) => m.to_string(),
        None => guess_mime_type(path),
    };

    debug!(
        "Resolved local file: {} ({} bytes, {})",
        path.display(),
        metadata.len(),
        mime_type
    );

    Ok(FileCandidate {
        name,
        mime_type,
        size_bytes: Some(metadata.len()),
        source: FileSource::Path(path.to_path_buf()),
    })
}

/// Load the bytes of a selected file.
pub async fn read_contents(file: &SelectedFile) -> Result<Arc<[u8]>, AnalysisError> {
    match file.source() {
        FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
        FileSource::Path(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AnalysisError::FileRead {
                    path: path.clone(),
                    source: e,
                })?;
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, mime: &str) -> FileCandidate {
        FileCandidate::from_bytes(name, mime, b"a,b\n1,2\n".to_vec())
    }

    #[test]
    fn accepts_allowed_mime_types() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(is_allowed("whatever.bin", mime), "{mime}");
        }
        assert!(is_allowed("report", "Application/PDF"));
    }

    #[test]
    fn accepts_spreadsheet_extensions_with_unknown_mime() {
        assert!(is_allowed("sales.csv", ""));
        assert!(is_allowed("sales.XLS", "application/octet-stream"));
        assert!(is_allowed("budget.xlsx", "application/zip"));
    }

    #[test]
    fn pdf_extension_is_not_a_fallback() {
        assert!(!is_allowed("brochure.pdf", "application/octet-stream"));
        assert!(!is_allowed("brochure.pdf", ""));
    }

    #[test]
    fn rejects_other_files() {
        assert!(!is_allowed("notes.txt", "text/plain"));
        assert!(!is_allowed("photo.png", "image/png"));
        assert!(!is_allowed("archive.csv.zip", "application/zip"));
    }

    #[test]
    fn validate_keeps_fields() {
        let file = validate_selection(candidate("leads.csv", "text/csv")).unwrap();
        assert_eq!(file.name(), "leads.csv");
        assert_eq!(file.mime_type(), "text/csv");
        assert_eq!(file.size_bytes(), Some(8));
    }

    #[test]
    fn validate_rejects_with_unknown_type_label() {
        match validate_selection(candidate("notes.md", "")) {
            Err(AnalysisError::UnsupportedFile { name, mime_type }) => {
                assert_eq!(name, "notes.md");
                assert_eq!(mime_type, "unknown");
            }
            other => panic!("expected UnsupportedFile, got {other:?}"),
        }
    }

    #[test]
    fn attachment_mime_follows_extension_fallback() {
        let f = validate_selection(candidate("a.CSV", "")).unwrap();
        assert_eq!(f.attachment_mime_type(), "text/csv");
        let f = validate_selection(candidate("a.xlsx", "application/octet-stream")).unwrap();
        assert_eq!(
            f.attachment_mime_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let f = validate_selection(candidate("a.xls", "")).unwrap();
        assert_eq!(f.attachment_mime_type(), "application/vnd.ms-excel");
        let f = validate_selection(candidate("a.bin", "application/pdf")).unwrap();
        assert_eq!(f.attachment_mime_type(), "application/pdf");
    }

    #[test]
    fn guesses_mime_from_extension() {
        assert_eq!(guess_mime_type(Path::new("x.pdf")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("x.csv")), "text/csv");
        assert_eq!(guess_mime_type(Path::new("x")), "application/octet-stream");
    }

    #[test]
    fn resolve_missing_file() {
        let r = resolve_local(Path::new("/definitely/not/here.csv"), None);
        assert!(matches!(r, Err(AnalysisError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn resolve_and_read_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campaign.csv");
        std::fs::write(&path, "channel,spend\nsearch,100\n").unwrap();

        let c = resolve_local(&path, None).unwrap();
        assert_eq!(c.name, "campaign.csv");
        assert_eq!(c.mime_type, "text/csv");
        assert_eq!(c.size_bytes, Some(25));

        let file = validate_selection(c).unwrap();
        let bytes = read_contents(&file).await.unwrap();
        assert_eq!(&bytes[..], b"channel,spend\nsearch,100\n");
    }

    #[test]
    fn mime_override_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.dat");
        std::fs::write(&path, "x").unwrap();
        let c = resolve_local(&path, Some("text/csv")).unwrap();
        assert_eq!(c.mime_type, "text/csv");
    }
}
