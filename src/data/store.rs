//! Process-wide dataset cache
//!
//! The store holds an immutable [`Snapshot`] behind an `Arc`. A reload builds
//! a complete new snapshot off to the side and publishes it with a single
//! pointer swap, so readers see either the old or the new data, never a mix.
//! Reloads are serialized by an async mutex; callers that queue behind an
//! in-flight reload pick up its result instead of loading again.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::bundle::BundledData;
use crate::config::StoreConfig;
use crate::error::{Result, SuklError};
use crate::search::{SearchConfig, SearchIndex};
use crate::types::{
    normalize_code, AtcEntry, DataStats, MedicineRecord, PharmacyRecord, ReimbursementRecord,
    SuklCode,
};

/// Where the bundle comes from
pub trait DatasetSource: Send + Sync {
    /// Read and parse the whole bundle. Runs on the blocking pool.
    fn read(&self) -> Result<BundledData>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Bundle file on disk
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn read(&self) -> Result<BundledData> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            SuklError::DataUnavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        BundledData::from_slice(&bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Bundle already in memory (fixtures, tests, embedding)
pub struct StaticSource {
    bundle: BundledData,
}

impl StaticSource {
    pub fn new(bundle: BundledData) -> Self {
        Self { bundle }
    }
}

impl DatasetSource for StaticSource {
    fn read(&self) -> Result<BundledData> {
        Ok(self.bundle.clone())
    }

    fn describe(&self) -> String {
        "in-memory bundle".to_string()
    }
}

/// One fully built, immutable generation of the dataset
pub struct Snapshot {
    medicines: Vec<MedicineRecord>,
    by_code: HashMap<SuklCode, usize>,
    atc: HashMap<String, AtcEntry>,
    pharmacies: Vec<PharmacyRecord>,
    reimbursements: HashMap<SuklCode, ReimbursementRecord>,
    index: SearchIndex,
    bundle_timestamp: Option<String>,
    loaded_at: DateTime<Utc>,
    loaded_instant: Instant,
    duplicates_dropped: usize,
}

impl Snapshot {
    /// Decode the bundle and build every lookup structure
    pub fn build(bundle: BundledData, search_config: SearchConfig) -> Self {
        let mut medicines = Vec::with_capacity(bundle.medicines.len());
        let mut by_code = HashMap::with_capacity(bundle.medicines.len());
        let mut duplicates_dropped = 0;

        for raw in bundle.medicines {
            let record = MedicineRecord::from(raw);
            if by_code.contains_key(&record.sukl_code) {
                duplicates_dropped += 1;
                continue;
            }
            by_code.insert(record.sukl_code.clone(), medicines.len());
            medicines.push(record);
        }

        let atc = bundle
            .atc
            .into_iter()
            .map(AtcEntry::from)
            .map(|entry| (entry.code.clone(), entry))
            .collect();

        let pharmacies = bundle
            .pharmacies
            .unwrap_or_default()
            .into_iter()
            .map(PharmacyRecord::from)
            .collect();

        let reimbursements = bundle
            .reimbursements
            .unwrap_or_default()
            .into_iter()
            .map(ReimbursementRecord::from)
            .map(|r| (r.sukl_code.clone(), r))
            .collect();

        let index = SearchIndex::build(&medicines, search_config);

        Self {
            medicines,
            by_code,
            atc,
            pharmacies,
            reimbursements,
            index,
            bundle_timestamp: bundle.metadata.and_then(|m| m.timestamp),
            loaded_at: Utc::now(),
            loaded_instant: Instant::now(),
            duplicates_dropped,
        }
    }

    pub fn medicines(&self) -> &[MedicineRecord] {
        &self.medicines
    }

    /// Lookup by code in any zero-padding
    pub fn medicine(&self, code: &str) -> Option<&MedicineRecord> {
        self.by_code
            .get(&normalize_code(code))
            .map(|&i| &self.medicines[i])
    }

    /// Exact ATC lookup, case preserved
    pub fn atc(&self, code: &str) -> Option<&AtcEntry> {
        self.atc.get(code)
    }

    pub fn pharmacies(&self) -> &[PharmacyRecord] {
        &self.pharmacies
    }

    pub fn reimbursement(&self, code: &str) -> Option<&ReimbursementRecord> {
        self.reimbursements.get(&normalize_code(code))
    }

    /// Fuzzy search, best match first
    pub fn search(&self, query: &str, limit: usize) -> Vec<&MedicineRecord> {
        self.index
            .search(query, limit)
            .into_iter()
            .map(|hit| &self.medicines[hit.position])
            .collect()
    }

    pub fn age(&self) -> Duration {
        self.loaded_instant.elapsed()
    }

    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    pub fn stats(&self) -> DataStats {
        DataStats {
            medicines: self.medicines.len(),
            atc_codes: self.atc.len(),
            pharmacies: self.pharmacies.len(),
            reimbursements: self.reimbursements.len(),
            bundle_timestamp: self.bundle_timestamp.clone(),
            loaded_at: self.loaded_at,
            cache_age_secs: self.age().as_secs(),
        }
    }
}

#[derive(Default)]
struct ReloadState {
    last_failure: Option<Instant>,
}

/// Lazily loaded, TTL-refreshed dataset cache
pub struct DataStore {
    source: Arc<dyn DatasetSource>,
    config: StoreConfig,
    search_config: SearchConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
    reload: tokio::sync::Mutex<ReloadState>,
}

impl DataStore {
    pub fn new(source: Arc<dyn DatasetSource>, config: StoreConfig) -> Self {
        Self {
            source,
            config,
            search_config: SearchConfig::default(),
            current: RwLock::new(None),
            reload: tokio::sync::Mutex::new(ReloadState::default()),
        }
    }

    /// Store backed by the bundle file named in `config`
    pub fn from_config(config: StoreConfig) -> Self {
        let source = Arc::new(FileSource::new(config.data_path.clone()));
        Self::new(source, config)
    }

    /// Store over an in-memory bundle with default settings
    pub fn from_bundle(bundle: BundledData) -> Self {
        Self::new(Arc::new(StaticSource::new(bundle)), StoreConfig::default())
    }

    pub fn with_search_config(mut self, search_config: SearchConfig) -> Self {
        self.search_config = search_config;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .as_ref()
            .filter(|s| s.age() < self.config.ttl)
            .cloned()
    }

    /// Current snapshot, loading or refreshing it first when needed.
    ///
    /// Fails only when no snapshot has ever been loaded successfully; a failed
    /// refresh keeps serving the previous generation.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let mut state = self.reload.lock().await;
        if let Some(snapshot) = self.fresh() {
            return Ok(snapshot);
        }

        let stale = self.current.read().clone();
        if let (Some(stale), Some(failed_at)) = (&stale, state.last_failure) {
            if failed_at.elapsed() < self.config.retry_backoff {
                return Ok(stale.clone());
            }
        }

        match self.build().await {
            Ok(snapshot) => {
                state.last_failure = None;
                *self.current.write() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                state.last_failure = Some(Instant::now());
                match stale {
                    Some(stale) => {
                        tracing::warn!(
                            source = %self.source.describe(),
                            error = %e,
                            "Reload failed, keeping previous SÚKL data"
                        );
                        Ok(stale)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Force a full load and publish it, regardless of cache age
    pub async fn load(&self) -> Result<Arc<Snapshot>> {
        let mut state = self.reload.lock().await;
        let snapshot = self.build().await?;
        state.last_failure = None;
        *self.current.write() = Some(snapshot.clone());
        Ok(snapshot)
    }

    async fn build(&self) -> Result<Arc<Snapshot>> {
        let source = self.source.clone();
        let search_config = self.search_config.clone();
        let started = Instant::now();

        tracing::info!(source = %source.describe(), "Loading SÚKL data from bundle...");

        let snapshot = tokio::task::spawn_blocking(move || -> Result<Snapshot> {
            let bundle = source.read()?;
            Ok(Snapshot::build(bundle, search_config))
        })
        .await
        .map_err(|e| SuklError::Internal(format!("data load task failed: {}", e)))??;

        if snapshot.duplicates_dropped() > 0 {
            tracing::debug!(
                duplicates = snapshot.duplicates_dropped(),
                "Dropped duplicate medicine codes"
            );
        }

        let stats = snapshot.stats();
        tracing::info!(
            medicines = stats.medicines,
            atc_codes = stats.atc_codes,
            pharmacies = stats.pharmacies,
            reimbursements = stats.reimbursements,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded SÚKL data"
        );

        Ok(Arc::new(snapshot))
    }
}
