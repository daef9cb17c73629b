//! Document sources.
//!
//! A `DocumentSource` hands the retriever (and the refund policy engine)
//! raw document text keyed by a stable doc id. The filesystem source walks
//! a docs directory and picks up `.md` and `.txt` files; the doc id is the
//! file stem, so `docs/billing_policy.md` becomes `billing_policy`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Source of raw support documents.
pub trait DocumentSource: Send + Sync {
    /// Load every document, keyed by doc id. Unreadable files are skipped.
    fn load_all(&self) -> BTreeMap<String, String>;

    /// Load a single document by id.
    fn load(&self, doc_id: &str) -> Option<String> {
        self.load_all().remove(doc_id)
    }
}

/// Loads documents from a directory tree on disk.
pub struct FsDocumentSource {
    root: PathBuf,
}

impl FsDocumentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collect(&self, dir: &Path, documents: &mut BTreeMap<String, String>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read docs directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, documents);
                continue;
            }
            let is_doc = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            );
            if !is_doc {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let doc_id = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    documents.insert(doc_id, content);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read document");
                }
            }
        }
    }
}

impl DocumentSource for FsDocumentSource {
    fn load_all(&self) -> BTreeMap<String, String> {
        let mut documents = BTreeMap::new();
        if !self.root.exists() {
            debug!(root = %self.root.display(), "Docs directory does not exist, no documents loaded");
            return documents;
        }
        self.collect(&self.root, &mut documents);
        debug!(count = documents.len(), "Loaded documents");
        documents
    }
}
