use crate::config::RetryPolicy;
use crate::pipeline::{saturating_count, IndexArtifacts};
use crate::store::{IndexSnapshot, IndexStore};
use crate::{DocumentStats, IndexError, PostingList, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const VOCABULARY: &str = "vocabulary";
const DOCUMENT_INDEX: &str = "document_index";
const DOCUMENT_STATS: &str = "document_stats";
const META: &str = "meta";
const TABLES: [&str; 4] = [VOCABULARY, DOCUMENT_INDEX, DOCUMENT_STATS, META];
const META_KEY: &[u8] = b"meta";
/// Default-tree key holding the live generation as a big-endian `u64`.
const GENERATION_KEY: &[u8] = b"generation";
pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub generation: u64,
}

/// On-disk store backed by sled.
///
/// Every build is written to its own generation of trees (`vocabulary.<n>`, `document_index.<n>`,
/// `document_stats.<n>`, `meta.<n>`). The live generation number is flipped only after the new
/// trees are flushed, so a reader or a crash never sees half a build. `document_index` is keyed
/// by `term 0x00 doc_id`; normalized terms never contain NUL, so one term's postings are a
/// prefix scan.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    current: Arc<RwLock<Arc<Generation>>>,
    /// Replaced generations still pinned by a reader. Also serializes writers.
    retired: Arc<Mutex<Vec<Arc<Generation>>>>,
}

struct Generation {
    id: u64,
    vocabulary: sled::Tree,
    document_index: sled::Tree,
    document_stats: sled::Tree,
    meta: sled::Tree,
}

fn tree_name(table: &str, generation: u64) -> String {
    format!("{table}.{generation}")
}

impl Generation {
    fn open(db: &sled::Db, id: u64) -> Result<Self> {
        Ok(Self {
            id,
            vocabulary: db.open_tree(tree_name(VOCABULARY, id))?,
            document_index: db.open_tree(tree_name(DOCUMENT_INDEX, id))?,
            document_stats: db.open_tree(tree_name(DOCUMENT_STATS, id))?,
            meta: db.open_tree(tree_name(META, id))?,
        })
    }

    fn trees(&self) -> [&sled::Tree; 4] {
        [&self.vocabulary, &self.document_index, &self.document_stats, &self.meta]
    }

    /// Write a full build into these (assumed unreachable) trees.
    fn fill(&self, artifacts: &IndexArtifacts) -> Result<MetaFile> {
        // leftovers of an earlier failed attempt at this generation
        for tree in self.trees() {
            tree.clear()?;
        }

        let mut batch = sled::Batch::default();
        for v in &artifacts.vocabulary {
            batch.insert(v.term.as_bytes(), bincode::serialize(&v.doc_count)?);
        }
        self.vocabulary.apply_batch(batch)?;

        let mut batch = sled::Batch::default();
        for list in &artifacts.postings {
            for (doc_id, tf) in &list.postings {
                batch.insert(posting_key(&list.term, doc_id), bincode::serialize(tf)?);
            }
        }
        self.document_index.apply_batch(batch)?;

        let mut batch = sled::Batch::default();
        for s in &artifacts.stats {
            batch.insert(s.doc_id.as_bytes(), bincode::serialize(s)?);
        }
        self.document_stats.apply_batch(batch)?;

        let meta = MetaFile {
            num_docs: saturating_count(artifacts.num_docs()),
            num_terms: saturating_count(artifacts.num_terms()),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            version: FORMAT_VERSION,
            generation: self.id,
        };
        self.meta.insert(META_KEY, serde_json::to_vec_pretty(&meta)?)?;
        Ok(meta)
    }

    fn meta(&self) -> Result<Option<MetaFile>> {
        match self.meta.get(META_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn discard(&self, db: &sled::Db) -> Result<()> {
        for table in TABLES {
            db.drop_tree(tree_name(table, self.id))?;
        }
        Ok(())
    }
}

impl IndexSnapshot for Generation {
    fn doc_count(&self, term: &str) -> Result<Option<u32>> {
        match self.vocabulary.get(term.as_bytes())? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    fn postings(&self, term: &str) -> Result<Option<PostingList>> {
        let prefix = posting_prefix(term);
        let mut postings = BTreeMap::new();
        for item in self.document_index.scan_prefix(&prefix) {
            let (key, raw) = item?;
            let doc_id = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            postings.insert(doc_id, bincode::deserialize::<u32>(&raw)?);
        }
        if postings.is_empty() { return Ok(None); }
        Ok(Some(PostingList { term: term.to_string(), postings }))
    }

    fn document(&self, doc_id: &str) -> Result<Option<DocumentStats>> {
        match self.document_stats.get(doc_id.as_bytes())? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    fn document_stats(&self) -> Result<Vec<DocumentStats>> {
        let mut rows = Vec::with_capacity(self.document_stats.len());
        for item in self.document_stats.iter() {
            let (_, raw) = item?;
            rows.push(bincode::deserialize(&raw)?);
        }
        Ok(rows)
    }
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// A store that lives only as long as the handle.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let id = match db.get(GENERATION_KEY)? {
            Some(raw) => decode_generation(&raw)?,
            None => 0,
        };
        let live = Generation::open(&db, id)?;
        drop_stale_generations(&db, id)?;
        Ok(Self {
            db,
            current: Arc::new(RwLock::new(Arc::new(live))),
            retired: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn meta(&self) -> Result<Option<MetaFile>> {
        self.pinned().meta()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().id
    }

    fn pinned(&self) -> Arc<Generation> {
        self.current.read().clone()
    }

    /// Drop retired generations no reader holds any more.
    fn reap(&self, retired: &mut Vec<Arc<Generation>>) {
        let (idle, pinned): (Vec<_>, Vec<_>) = retired.drain(..).partition(|g| Arc::strong_count(g) == 1);
        *retired = pinned;
        for generation in idle {
            if let Err(e) = generation.discard(&self.db) {
                // dropped on the next open instead
                tracing::warn!(error = %e, generation = generation.id, "failed to drop retired generation");
            }
        }
    }
}

fn decode_generation(raw: &[u8]) -> Result<u64> {
    <[u8; 8]>::try_from(raw)
        .map(u64::from_be_bytes)
        .map_err(|_| IndexError::Corrupt(format!("generation pointer has {} bytes", raw.len())))
}

/// Remove trees of every generation but `live`: retired ones a previous process never dropped,
/// and half-written ones from a replace that did not finish.
fn drop_stale_generations(db: &sled::Db, live: u64) -> Result<()> {
    for name in db.tree_names() {
        let Ok(name) = std::str::from_utf8(&name) else { continue };
        let Some((table, generation)) = name.rsplit_once('.') else { continue };
        let Ok(generation) = generation.parse::<u64>() else { continue };
        if generation != live && TABLES.contains(&table) {
            tracing::debug!(tree = name, "dropping stale tree");
            db.drop_tree(name)?;
        }
    }
    Ok(())
}

fn posting_key(term: &str, doc_id: &str) -> Vec<u8> {
    let mut key = posting_prefix(term);
    key.extend_from_slice(doc_id.as_bytes());
    key
}

fn posting_prefix(term: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(term.len() + 1);
    key.extend_from_slice(term.as_bytes());
    key.push(0);
    key
}

impl IndexStore for SledStore {
    fn replace(&self, artifacts: &IndexArtifacts) -> Result<()> {
        let mut retired = self.retired.lock();
        let next = Generation::open(&self.db, self.generation() + 1)?;
        let filled = next.fill(artifacts).and_then(|meta| {
            self.db.flush()?;
            Ok(meta)
        });
        let meta = match filled {
            Ok(meta) => meta,
            Err(e) => {
                if let Err(cleanup) = next.discard(&self.db) {
                    tracing::warn!(error = %cleanup, generation = next.id, "failed to drop partial generation");
                }
                return Err(e);
            }
        };

        // the flip: durable pointer first, then the in-process handles
        self.db.insert(GENERATION_KEY, next.id.to_be_bytes().to_vec())?;
        self.db.flush()?;
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(next));
        retired.push(previous);
        self.reap(&mut retired);

        tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, generation = meta.generation, "index store replaced");
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<dyn IndexSnapshot>> {
        let generation: Arc<Generation> = self.pinned();
        Ok(generation)
    }
}

/// Open the store, retrying with a fixed delay while it is unavailable (e.g. locked by another process).
pub fn open_with_retry<P: AsRef<Path>>(path: P, policy: RetryPolicy) -> Result<SledStore> {
    let path = path.as_ref();
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match SledStore::open(path) {
            Ok(store) => {
                tracing::info!(path = %path.display(), attempt, "index store opened");
                return Ok(store);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(error = %e, attempt, max_attempts = attempts, "index store unavailable, retrying in {:?}", policy.delay);
                std::thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(e) => return Err(IndexError::Unreachable { attempts, source: Box::new(e) }),
        }
    }
}
