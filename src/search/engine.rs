// src/search/engine.rs

//! Search engine: the text index plus its authoritative document table.
//!
//! The index only yields ids; hits are resolved through the id -> view
//! table. Both halves sit behind one lock and are only ever updated
//! together. A hit with no table entry is logged and skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::slice;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, Result};
use crate::models::{MAX_ITEMS_RETURNED, PostEntry, PostMatch, SearchConfig, ViewObject};
use crate::search::index::TextIndex;
use crate::storage::StorageClient;
use crate::view;

/// Hard cap on hits per query.
pub const MAX_SEARCH_RESULTS: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
struct IndexState {
    index: TextIndex,
    docs: HashMap<i64, ViewObject>,
}

impl IndexState {
    fn fresh() -> Self {
        Self {
            index: TextIndex::new(),
            docs: HashMap::new(),
        }
    }

    fn add(&mut self, doc: ViewObject) -> Result<()> {
        let id = doc.global_id;
        if self.docs.contains_key(&id) {
            log::warn!("Document {} already exists in index", id);
            return Err(AppError::AlreadyExists(id));
        }
        if !self.index.add_document(&id.to_string(), &document_text(&doc)) {
            log::warn!("Document {} in text index without a table entry", id);
            return Err(AppError::AlreadyExists(id));
        }
        self.docs.insert(id, doc);
        Ok(())
    }
}

/// Sizes of the two halves; equal unless the soft invariant was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub indexed: usize,
    pub documents: usize,
}

/// Full-text search over view objects.
pub struct SearchEngine {
    state: RwLock<IndexState>,
    index_path: Option<PathBuf>,
    max_results: usize,
    persist_guard: Mutex<()>,
}

impl SearchEngine {
    /// Create an empty engine. With an `index_path`, a previously persisted
    /// index is reloaded.
    pub async fn new(config: &SearchConfig) -> Result<Self> {
        let state = match &config.index_path {
            Some(path) => match read_state(path).await? {
                Some(state) => {
                    log::info!(
                        "Loaded {} documents from {}",
                        state.docs.len(),
                        path.display()
                    );
                    state
                }
                None => IndexState::fresh(),
            },
            None => {
                log::info!("No index path configured, using memory index.");
                IndexState::fresh()
            }
        };

        Ok(Self {
            state: RwLock::new(state),
            index_path: config.index_path.clone(),
            max_results: config.max_results.clamp(1, MAX_SEARCH_RESULTS),
            persist_guard: Mutex::new(()),
        })
    }

    /// Build the baseline index from every stored post.
    ///
    /// A failing fetch is returned to the caller; the service must not start
    /// on a partial index. Posts already present (from a persisted index)
    /// are left alone.
    pub async fn initialize(&self, db: &dyn StorageClient) -> Result<usize> {
        let posts = db.find_posts(&PostMatch::default()).await?;

        let mut views = Vec::with_capacity(posts.len());
        for chunk in posts.chunks(MAX_ITEMS_RETURNED) {
            views.extend(view::convert_posts(db, chunk).await);
        }

        let added = {
            let mut state = self.state.write().await;
            let mut added = 0;
            for doc in views {
                if state.docs.contains_key(&doc.global_id) {
                    continue;
                }
                if state.add(doc).is_ok() {
                    added += 1;
                }
            }
            added
        };

        log::info!(
            "Built index of length {} ({} new, {} stored posts)",
            self.len().await,
            added,
            posts.len()
        );
        if let Err(e) = self.persist().await {
            log::warn!("Failed to persist index: {}", e);
        }
        Ok(added)
    }

    /// Index a single stored post.
    ///
    /// Fails with [`AppError::Conversion`] when the author cannot be
    /// resolved and with [`AppError::AlreadyExists`] when the id is already
    /// indexed; neither changes the index. Nothing is written to disk here;
    /// the index is saved after `initialize` and by [`Self::persist`].
    pub async fn index_one(&self, db: &dyn StorageClient, post: &PostEntry) -> Result<i64> {
        let mut views = view::convert_posts(db, slice::from_ref(post)).await;
        if views.len() != 1 {
            return Err(AppError::conversion(format!(
                "couldn't convert post {} to a view object",
                post.global_id
            )));
        }
        let doc = views.remove(0);
        let id = doc.global_id;

        self.state.write().await.add(doc)?;
        log::info!("Indexed article with id {}", id);
        Ok(id)
    }

    /// Run a fuzzy query, returning at most 50 view objects.
    pub async fn search(&self, query: &str) -> Result<Vec<ViewObject>> {
        if query.trim().is_empty() {
            return Err(AppError::validation("empty search query"));
        }

        let state = self.state.read().await;
        let hits = state.index.search(query, self.max_results);

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let id: i64 = match hit.id.parse() {
                Ok(id) => id,
                Err(e) => {
                    log::warn!("Bad id ({}) in search index: {}", hit.id, e);
                    continue;
                }
            };
            match state.docs.get(&id) {
                Some(doc) => results.push(doc.clone()),
                None => log::warn!("Doc found in search does not exist for id: {}", id),
            }
        }
        Ok(results)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.docs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> IndexStats {
        let state = self.state.read().await;
        IndexStats {
            indexed: state.index.document_count(),
            documents: state.docs.len(),
        }
    }

    /// Write the index to its configured path, if any.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.index_path else {
            return Ok(());
        };
        let _guard = self.persist_guard.lock().await;
        let bytes = {
            let state = self.state.read().await;
            serde_json::to_vec(&*state)?
        };
        write_atomic(path, &bytes).await
    }
}

/// Text fed to the index for one document.
fn document_text(doc: &ViewObject) -> String {
    let mut text = String::new();
    for part in [&doc.title, &doc.summary, &doc.body, &doc.author] {
        text.push_str(part);
        text.push('\n');
    }
    text.push_str(&doc.tags.join(" "));
    text
}

async fn read_state(path: &Path) -> Result<Option<IndexState>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Write to a temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::UserEntry;
    use crate::storage::MemoryStorage;
    use crate::testing::FlakyStorage;

    async fn seed(db: &MemoryStorage, titles: &[&str]) -> i64 {
        let author = db
            .insert_user(&UserEntry {
                handle: "alice".into(),
                ..UserEntry::default()
            })
            .await
            .unwrap()
            .global_id;
        for title in titles {
            db.insert_post(&PostEntry {
                author_id: author,
                title: title.to_string(),
                ..PostEntry::default()
            })
            .await
            .unwrap();
        }
        author
    }

    async fn memory_engine() -> SearchEngine {
        SearchEngine::new(&SearchConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_initialize_indexes_everything() {
        let db = MemoryStorage::new();
        let titles: Vec<String> = (0..120).map(|i| format!("article number {i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        seed(&db, &refs).await;

        let engine = memory_engine().await;
        assert_eq!(engine.initialize(&db).await.unwrap(), 120);
        assert_eq!(engine.len().await, 120);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_storage_is_down() {
        let db = FlakyStorage::new(MemoryStorage::new());
        db.fail_post_finds(true);

        let engine = memory_engine().await;
        assert!(engine.initialize(&db).await.is_err());
        assert!(engine.is_empty().await);
    }

    #[tokio::test]
    async fn test_index_then_search_round_trip() {
        let db = MemoryStorage::new();
        let author = seed(&db, &["Existing notes"]).await;
        let engine = memory_engine().await;
        engine.initialize(&db).await.unwrap();

        let post = PostEntry {
            global_id: 500,
            author_id: author,
            title: "Compiler internals explained".into(),
            ..PostEntry::default()
        };
        assert_eq!(engine.index_one(&db, &post).await.unwrap(), 500);

        let hits = engine.search("internals").await.unwrap();
        assert!(hits.iter().any(|v| v.global_id == 500));
        assert_eq!(hits[0].author, "alice");

        let fuzzy = engine.search("compilr").await.unwrap();
        assert!(fuzzy.iter().any(|v| v.global_id == 500));
    }

    #[tokio::test]
    async fn test_index_one_duplicate_leaves_state_unchanged() {
        let db = MemoryStorage::new();
        let author = seed(&db, &[]).await;
        let engine = memory_engine().await;
        let post = PostEntry {
            global_id: 7,
            author_id: author,
            title: "first version".into(),
            ..PostEntry::default()
        };
        engine.index_one(&db, &post).await.unwrap();
        let before = engine.stats().await;

        let changed = PostEntry {
            title: "second version".into(),
            ..post
        };
        let err = engine.index_one(&db, &changed).await.unwrap_err();

        assert!(matches!(err, AppError::AlreadyExists(7)));
        assert_eq!(engine.stats().await, before);
        assert!(engine.search("second").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_one_unknown_author_is_conversion_error() {
        let db = MemoryStorage::new();
        let engine = memory_engine().await;
        let post = PostEntry {
            global_id: 1,
            author_id: 99,
            title: "orphan".into(),
            ..PostEntry::default()
        };
        let err = engine.index_one(&db, &post).await.unwrap_err();
        assert!(matches!(err, AppError::Conversion(_)));
        assert!(engine.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_capped_at_fifty() {
        let db = MemoryStorage::new();
        let titles = vec!["shared keyword"; 80];
        seed(&db, &titles).await;
        let engine = memory_engine().await;
        engine.initialize(&db).await.unwrap();

        assert_eq!(engine.search("keyword").await.unwrap().len(), MAX_SEARCH_RESULTS);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let engine = memory_engine().await;
        assert!(matches!(
            engine.search("   ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_hit_without_document_is_skipped() {
        let engine = memory_engine().await;
        {
            let mut state = engine.state.write().await;
            state.index.add_document("42", "dangling entry");
        }
        assert!(engine.search("dangling").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persisted_index_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig {
            index_path: Some(dir.path().join("index.json")),
            ..SearchConfig::default()
        };
        let db = MemoryStorage::new();
        seed(&db, &["persistent storage engines"]).await;

        let engine = SearchEngine::new(&config).await.unwrap();
        engine.initialize(&db).await.unwrap();
        drop(engine);

        let reloaded = SearchEngine::new(&config).await.unwrap();
        assert_eq!(reloaded.len().await, 1);
        assert_eq!(reloaded.search("engines").await.unwrap().len(), 1);
        assert_eq!(reloaded.initialize(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_one_defers_disk_writes_to_persist() {
        let dir = tempfile::tempdir().unwrap();
        let config = SearchConfig {
            index_path: Some(dir.path().join("index.json")),
            ..SearchConfig::default()
        };
        let db = MemoryStorage::new();
        let author = seed(&db, &[]).await;
        let engine = SearchEngine::new(&config).await.unwrap();
        engine.initialize(&db).await.unwrap();

        let post = PostEntry {
            global_id: 500,
            author_id: author,
            title: "late arrival".into(),
            ..PostEntry::default()
        };
        engine.index_one(&db, &post).await.unwrap();
        let on_disk = SearchEngine::new(&config).await.unwrap();
        assert!(on_disk.is_empty().await);

        engine.persist().await.unwrap();
        let on_disk = SearchEngine::new(&config).await.unwrap();
        assert_eq!(on_disk.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_searches_and_index_one_stay_consistent() {
        let db = Arc::new(MemoryStorage::new());
        let author = seed(&db, &["shared topic 0"]).await;
        let engine = Arc::new(memory_engine().await);
        engine.initialize(db.as_ref()).await.unwrap();

        let mut tasks = Vec::new();
        for i in 1..=20 {
            let engine = Arc::clone(&engine);
            let db = Arc::clone(&db);
            tasks.push(tokio::spawn(async move {
                let post = PostEntry {
                    global_id: 1_000 + i,
                    author_id: author,
                    title: format!("shared topic {i}"),
                    ..PostEntry::default()
                };
                engine.index_one(db.as_ref(), &post).await.unwrap();
            }));
        }
        for _ in 0..20 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                let hits = engine.search("topic").await.unwrap();
                assert!(!hits.is_empty());
                let stats = engine.stats().await;
                assert_eq!(stats.indexed, stats.documents);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stats = engine.stats().await;
        assert_eq!(stats.documents, 21);
        assert_eq!(stats.indexed, 21);
        assert_eq!(engine.search("topic").await.unwrap().len(), 21);
    }
}
