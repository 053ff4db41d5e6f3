//! Corpus loader: walks the configured paths and reads text and PDF documents.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One source document, read whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position of the document in load order, as a string ("doc-0", ...)
    pub id: String,

    /// File path the document was read from
    pub source: String,

    pub content: String,
}

/// Reads every file under `paths` whose extension is in `extensions`.
///
/// Paths may be files or directories (walked recursively, following
/// symlinks). Entries are visited in file-name order so the corpus order is
/// stable across runs. Symlink loops, missing paths and unreadable files are
/// logged and skipped. `.pdf` files go through text extraction, everything
/// else is read as UTF-8.
pub fn load_corpus<P: AsRef<Path>>(paths: &[P], extensions: &[String]) -> Vec<Document> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path.as_ref(), extensions, &mut files);
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        match read_document(&file) {
            Ok(content) if content.trim().is_empty() => {
                debug!(path = %file.display(), "Skipping empty document");
            }
            Ok(content) => {
                documents.push(Document {
                    id: format!("doc-{}", documents.len()),
                    source: file.display().to_string(),
                    content,
                });
            }
            Err(reason) => {
                warn!(path = %file.display(), error = %reason, "Skipping unreadable document");
            }
        }
    }

    debug!(documents = documents.len(), "Corpus loaded");
    documents
}

fn collect_files(root: &Path, extensions: &[String], out: &mut Vec<PathBuf>) {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
                    out.push(entry.into_path());
                }
            }
            Err(e) => {
                warn!(path = %root.display(), error = %e, "Corpus entry not readable");
            }
        }
    }
}

fn read_document(path: &Path) -> Result<String, String> {
    if is_pdf(path) {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| format!("PDF extraction failed: {e}"))
    } else {
        fs::read_to_string(path).map_err(|e| e.to_string())
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}
