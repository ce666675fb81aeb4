use std::path::Path;

use codeseek_embed::EmbeddingProvider;
use codeseek_index::{CodeIndexer, detect_language};

/// Outcome of indexing a source tree.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub chunks_created: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Index every file under `root` whose language is recognized.
///
/// Honors `.gitignore` and skips hidden entries. Chunk paths are stored
/// relative to `root`. A file that cannot be read or indexed is recorded in
/// [`IndexReport::errors`] and the walk continues.
pub async fn index_project<P: EmbeddingProvider>(
    indexer: &CodeIndexer<P>,
    root: &Path,
) -> IndexReport {
    let start = std::time::Instant::now();
    let mut report = IndexReport::default();

    let mut entries: Vec<_> = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .build()
        .flatten()
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|e| detect_language(e.path()).map(|lang| (e.into_path(), lang)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let total = entries.len();
    tracing::info!(root = %root.display(), total, "indexing started");

    for (i, (path, lang)) in entries.iter().enumerate() {
        report.files_scanned += 1;
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                report.errors.push(format!("{rel_path}: {e}"));
                continue;
            }
        };

        match indexer.index_file(&rel_path, &content, lang.id()).await {
            Ok(created) => {
                if created > 0 {
                    report.files_indexed += 1;
                }
                report.chunks_created += created;
                tracing::debug!(
                    file = %rel_path,
                    progress = format_args!("{}/{total}", i + 1),
                    created,
                );
            }
            Err(e) => report.errors.push(format!("{rel_path}: {e:#}")),
        }
    }

    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        files = report.files_indexed,
        chunks = report.chunks_created,
        errors = report.errors.len(),
        duration_ms = report.duration_ms,
        "indexing complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use codeseek_embed::mock::MockEmbedder;
    use codeseek_index::ChunkerConfig;
    use codeseek_store::InMemoryVectorIndex;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn indexes_known_languages_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.rs", "fn main() {}\n");
        write(dir.path(), "scripts/run.py", "print('hi')\n");
        write(dir.path(), "assets/logo.png", "not really a png");
        write(dir.path(), "empty.go", "");

        let store = Arc::new(InMemoryVectorIndex::new());
        let indexer = CodeIndexer::new(
            Arc::clone(&store) as Arc<dyn codeseek_store::VectorIndex>,
            Arc::new(MockEmbedder::default()),
            ChunkerConfig::default(),
        );

        let report = index_project(&indexer, dir.path()).await;

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_indexed, 2);
        assert_eq!(report.chunks_created, 2);
        assert!(report.errors.is_empty());
        assert_eq!(store.ids_for_file("src/main.rs"), vec!["src/main.rs:1-1".to_string()]);
        assert_eq!(store.ids_for_file("scripts/run.py").len(), 1);
    }

    #[tokio::test]
    async fn provider_errors_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.rs", "fn a() {}\n");
        write(dir.path(), "b.rs", "fn b() {}\n");

        let indexer = CodeIndexer::new(
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(MockEmbedder::failing()),
            ChunkerConfig::default(),
        );

        let report = index_project(&indexer, dir.path()).await;

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_indexed, 0);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("a.rs: "));
    }
}
