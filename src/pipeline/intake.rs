//! File intake: classify uploads by extension and load local paths.
//!
//! Only six extensions are accepted. Anything else is refused at the
//! acceptance boundary and never reaches a pipeline, so it produces no
//! status line.

use crate::error::SweepError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// An uploaded blob with its declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Declared size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Declared size in KB, as shown next to the table preview.
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// Which handler an upload is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Csv,
    Excel,
    Pdf,
    Word,
    Image,
}

impl FileKind {
    /// Classify a file name by its lowercase extension.
    ///
    /// Returns `None` for unsupported extensions and for names without one.
    pub fn from_name(name: &str) -> Option<Self> {
        match lowercase_extension(name)?.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" => Some(FileKind::Excel),
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Word),
            "jpg" | "png" => Some(FileKind::Image),
            _ => None,
        }
    }

    /// `true` for the two table formats.
    pub fn is_tabular(&self) -> bool {
        matches!(self, FileKind::Csv | FileKind::Excel)
    }
}

/// Lowercase extension of `name` without the dot, if any.
pub fn lowercase_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// `name` with its extension swapped for `.pdf`.
pub fn pdf_name(name: &str) -> String {
    let path = Path::new(name);
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if path.extension().is_some() => {
            let parent = &name[..name.len() - path.file_name().map_or(0, |f| f.len())];
            format!("{parent}{stem}.pdf")
        }
        _ => format!("{name}.pdf"),
    }
}

/// Files that passed intake, plus the names that did not.
#[derive(Debug, Default)]
pub struct Intake {
    pub accepted: Vec<(FileKind, UploadedFile)>,
    pub rejected: Vec<String>,
}

/// Split uploads into routable files and refused names, keeping order.
pub fn accept(files: impl IntoIterator<Item = UploadedFile>) -> Intake {
    let mut intake = Intake::default();
    for file in files {
        match FileKind::from_name(&file.name) {
            Some(kind) => {
                debug!("Accepted {} as {:?}", file.name, kind);
                intake.accepted.push((kind, file));
            }
            None => {
                warn!("Refusing {}: unsupported file type", file.name);
                intake.rejected.push(file.name);
            }
        }
    }
    intake
}

/// Load a local file as an upload, named after its final path component.
pub fn read_upload(path: impl AsRef<Path>) -> Result<UploadedFile, SweepError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SweepError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SweepError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SweepError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedFile { name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn classify_by_extension() {
        assert_eq!(FileKind::from_name("a.csv"), Some(FileKind::Csv));
        assert_eq!(FileKind::from_name("Report.XLSX"), Some(FileKind::Excel));
        assert_eq!(FileKind::from_name("paper.pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_name("letter.docx"), Some(FileKind::Word));
        assert_eq!(FileKind::from_name("photo.JPG"), Some(FileKind::Image));
        assert_eq!(FileKind::from_name("logo.png"), Some(FileKind::Image));
    }

    #[test]
    fn unsupported_extensions_are_refused() {
        assert_eq!(FileKind::from_name("photo.jpeg"), None);
        assert_eq!(FileKind::from_name("old.xls"), None);
        assert_eq!(FileKind::from_name("notes.txt"), None);
        assert_eq!(FileKind::from_name("Makefile"), None);
        assert_eq!(FileKind::from_name(".csv"), None);
    }

    #[test]
    fn accept_keeps_order_and_splits() {
        let intake = accept(vec![
            UploadedFile::new("b.csv", "x\n1\n"),
            UploadedFile::new("notes.txt", "hi"),
            UploadedFile::new("a.png", vec![0u8; 4]),
        ]);
        let names: Vec<_> = intake.accepted.iter().map(|(_, f)| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.csv", "a.png"]);
        assert_eq!(intake.rejected, vec!["notes.txt".to_string()]);
    }

    #[test]
    fn pdf_names() {
        assert_eq!(pdf_name("letter.docx"), "letter.pdf");
        assert_eq!(pdf_name("photo.PNG"), "photo.pdf");
        assert_eq!(pdf_name("my.scan.jpg"), "my.scan.pdf");
        assert_eq!(pdf_name("dir/x.png"), "dir/x.pdf");
    }

    #[test]
    fn size_in_kb() {
        let f = UploadedFile::new("a.csv", vec![0u8; 2048]);
        assert_eq!(f.size(), 2048);
        assert!((f.size_kb() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn read_upload_names_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"a,b\n1,2\n").unwrap();

        let upload = read_upload(&path).unwrap();
        assert_eq!(upload.name, "data.csv");
        assert_eq!(upload.bytes, b"a,b\n1,2\n");
    }

    #[test]
    fn read_upload_missing_file() {
        let err = read_upload("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, SweepError::FileNotFound { .. }));
    }
}
