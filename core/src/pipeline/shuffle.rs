use super::IndexJob;
use crate::Document;
use std::collections::BTreeMap;
use std::thread;

/// Runs a job's map step over input partitions and delivers every value of a key to one reduce call.
pub trait ShuffleEngine {
    fn run<J: IndexJob>(&self, job: &J, docs: &[Document]) -> Vec<J::Output>;
}

/// In-process engine: one scoped thread per map partition, ordered grouping, reduce in key order.
#[derive(Debug, Clone, Copy)]
pub struct LocalShuffle {
    partitions: usize,
}

impl LocalShuffle {
    pub fn new(partitions: usize) -> Self {
        Self { partitions: partitions.max(1) }
    }

    pub fn partitions(&self) -> usize { self.partitions }
}

impl Default for LocalShuffle {
    fn default() -> Self {
        Self::new(thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }
}

impl ShuffleEngine for LocalShuffle {
    fn run<J: IndexJob>(&self, job: &J, docs: &[Document]) -> Vec<J::Output> {
        if docs.is_empty() { return Vec::new(); }
        let chunk = docs.len().div_ceil(self.partitions);
        let mapped: Vec<Vec<(J::Key, J::Value)>> = thread::scope(|s| {
            let handles: Vec<_> = docs
                .chunks(chunk)
                .map(|part| s.spawn(move || part.iter().flat_map(|d| job.map(d)).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        let groups = group_by_key(mapped.into_iter().flatten());
        tracing::debug!(keys = groups.len(), partitions = self.partitions, "shuffle complete");
        groups.into_iter().flat_map(|(k, vs)| job.reduce(k, vs)).collect()
    }
}

/// Group pairs by key. Keys come out ascending; values keep arrival order.
pub fn group_by_key<K: Ord, V>(pairs: impl IntoIterator<Item = (K, V)>) -> BTreeMap<K, Vec<V>> {
    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (k, v) in pairs {
        groups.entry(k).or_default().push(v);
    }
    groups
}
