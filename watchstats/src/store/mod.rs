use crate::config::Config;
use crate::entry::{self, RawRow, WatchlistEntry};
use crate::error::{Result, WatchStatsError};
use crate::genre::GenreTaxonomy;
use crate::validation;
use crate::view::{AggregateView, Report, ViewEngine, ViewName};
use crate::watcher::{self, FileWatcher};
use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Callback fired with every snapshot that becomes current.
pub type ReloadCallback = Box<dyn Fn(&Arc<Snapshot>) + Send + Sync>;

/// An immutable, validated entry collection produced by one load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
    entries: Vec<WatchlistEntry>,
    warnings: Vec<String>,
}

impl Snapshot {
    /// Validate raw rows and turn them into a snapshot. Fails without
    /// producing anything if the first row lacks a required column.
    pub fn from_rows(generation: u64, source: Option<PathBuf>, rows: &[RawRow]) -> Result<Self> {
        let warnings = validation::validate_and_prepare(rows)?;
        Ok(Snapshot {
            generation,
            source,
            loaded_at: Utc::now(),
            entries: entry::entries_from_rows(rows),
            warnings,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// A report tagged with the snapshot it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub generation: u64,
    pub source: Option<PathBuf>,
    #[serde(flatten)]
    pub report: Report,
}

/// The main entry point for watchstats.
///
/// Owns the aggregation engine and the current snapshot. Every load takes a
/// generation number before it starts; a finished load only replaces the
/// current snapshot if nothing newer has been published in the meantime.
pub struct Store {
    config: Config,
    engine: RwLock<ViewEngine>,
    next_generation: AtomicU64,
    current: RwLock<Option<Arc<Snapshot>>>,
    watcher: Mutex<Option<FileWatcher>>,
    callbacks: Mutex<Vec<ReloadCallback>>,
}

impl Store {
    /// Open a store: load the genre taxonomy (empty on failure) and, if the
    /// config names one, the watchlist export.
    pub fn open(config: Config) -> Result<Self> {
        let store = Store::new(config)?;
        store.load_configured()?;
        Ok(store)
    }

    /// Build a store with its taxonomy and engine but no snapshot yet.
    pub fn new(config: Config) -> Result<Self> {
        let genres = GenreTaxonomy::load_or_empty(config.genres.as_deref());
        let engine = ViewEngine::new(genres, i64::from(Local::now().year()))?
            .with_director_limit(config.director_limit);
        Ok(Store::with_engine(config, engine))
    }

    /// Load the configured watchlist, if there is one.
    pub fn load_configured(&self) -> Result<Option<Arc<Snapshot>>> {
        match self.config.watchlist.clone() {
            Some(path) => self.load_path(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Load the configured watchlist, falling back to the sample export when
    /// no watchlist is configured or it cannot be loaded.
    pub fn load_or_sample(&self) -> Result<Option<Arc<Snapshot>>> {
        let Some(sample) = self.config.sample.clone() else {
            return self.load_configured();
        };
        match self.load_configured() {
            Ok(Some(snapshot)) => return Ok(Some(snapshot)),
            Ok(None) => log::info!("No watchlist configured; showing sample {}", sample.display()),
            Err(e) => log::warn!("Watchlist load failed ({e}); showing sample {}", sample.display()),
        }
        self.load_path(&sample).map(Some)
    }

    /// Build a store around an existing engine without loading anything.
    pub fn with_engine(config: Config, engine: ViewEngine) -> Self {
        Store {
            config,
            engine: RwLock::new(engine),
            next_generation: AtomicU64::new(1),
            current: RwLock::new(None),
            watcher: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reserve the generation number for a load that is about to start.
    pub fn begin_load(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    /// Make `snapshot` current unless a newer one is already published.
    /// Returns whether it was accepted.
    pub fn publish(&self, snapshot: Arc<Snapshot>) -> bool {
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = current.as_ref() {
                if existing.generation >= snapshot.generation {
                    log::debug!(
                        "Discarding stale snapshot {} (current is {})",
                        snapshot.generation,
                        existing.generation
                    );
                    return false;
                }
            }
            *current = Some(Arc::clone(&snapshot));
        }

        log::info!(
            "Published snapshot {} with {} entries",
            snapshot.generation,
            snapshot.entries.len()
        );

        self.notify(&snapshot);
        true
    }

    /// Load an export file into a new snapshot.
    pub fn load_path(&self, path: &Path) -> Result<Arc<Snapshot>> {
        entry::ensure_csv_extension(path)?;
        let generation = self.begin_load();
        log::info!("Loading watchlist from {} (generation {generation})", path.display());
        let rows = entry::read_rows_from_path(path)?;
        self.finish_load(generation, Some(path.to_path_buf()), &rows)
    }

    /// Load an export held in memory.
    pub fn load_str(&self, csv: &str) -> Result<Arc<Snapshot>> {
        let generation = self.begin_load();
        let rows = entry::parse_rows_str(csv)?;
        self.finish_load(generation, None, &rows)
    }

    fn finish_load(
        &self,
        generation: u64,
        source: Option<PathBuf>,
        rows: &[RawRow],
    ) -> Result<Arc<Snapshot>> {
        let snapshot = Arc::new(Snapshot::from_rows(generation, source, rows)?);
        self.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// The current snapshot, if any load has succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.snapshot().ok_or_else(|| WatchStatsError::NotFound {
            kind: "snapshot".into(),
            name: "current".into(),
        })
    }

    /// Compute every view of the current snapshot.
    pub fn report(&self, today: NaiveDate) -> Result<SnapshotReport> {
        let snapshot = self.require_snapshot()?;
        Ok(self.report_of(&snapshot, today))
    }

    /// Compute every view of a specific snapshot, current or not.
    pub fn report_of(&self, snapshot: &Snapshot, today: NaiveDate) -> SnapshotReport {
        let engine = self.engine.read().unwrap_or_else(PoisonError::into_inner);
        SnapshotReport {
            generation: snapshot.generation,
            source: snapshot.source.clone(),
            report: engine.report(&snapshot.entries, today),
        }
    }

    /// Compute one view of the current snapshot.
    pub fn view(&self, name: ViewName, today: NaiveDate) -> Result<AggregateView> {
        let snapshot = self.require_snapshot()?;
        let engine = self.engine.read().unwrap_or_else(PoisonError::into_inner);
        Ok(engine.compute(name, &snapshot.entries, today))
    }

    /// Compute one view by name.
    pub fn view_dynamic(&self, name: &str, today: NaiveDate) -> Result<serde_json::Value> {
        let view = self.view(name.parse()?, today)?;
        Ok(serde_json::to_value(view)?)
    }

    /// Re-read the genre taxonomy from the configured path.
    pub fn reload_genres(&self) {
        let genres = GenreTaxonomy::load_or_empty(self.config.genres.as_deref());
        self.engine
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_genres(genres);
    }

    /// Status information: current snapshot, taxonomy size, available views.
    pub fn status(&self) -> serde_json::Value {
        let engine = self.engine.read().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot().map(|s| {
            serde_json::json!({
                "generation": s.generation,
                "source": s.source,
                "loaded_at": s.loaded_at.to_rfc3339(),
                "entries": s.entries.len(),
                "warnings": s.warnings.len(),
            })
        });

        serde_json::json!({
            "snapshot": snapshot,
            "genre_categories": engine.genres().len(),
            "director_limit": engine.director_limit(),
            "views": ViewName::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>(),
        })
    }

    /// Register a callback for every newly published snapshot.
    pub fn on_reload(&self, callback: ReloadCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    /// Start watching the configured watchlist and genre files.
    pub fn watch(&self) -> Result<()> {
        let files: Vec<PathBuf> = [&self.config.watchlist, &self.config.genres]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        if files.is_empty() {
            return Err(WatchStatsError::Config(
                "Nothing to watch: no watchlist or genre file configured".into(),
            ));
        }

        let watcher = FileWatcher::start(&files)?;
        *self.watcher.lock().unwrap_or_else(PoisonError::into_inner) = Some(watcher);
        Ok(())
    }

    /// Drain pending watcher events and reload what changed. A changed
    /// taxonomy only affects views computed afterwards; a changed export
    /// produces a new snapshot. Returns the number of events handled.
    pub fn process_watcher_events(&self) -> Result<usize> {
        let events: Vec<_> = {
            let guard = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(w) => w.event_rx.try_iter().collect(),
                None => return Ok(0),
            }
        };

        let watchlist = self.config.watchlist.as_deref().map(watcher::watch_target);
        let genres = self.config.genres.as_deref().map(watcher::watch_target);

        for event in &events {
            log::debug!("Watcher event: {:?} {}", event.kind, event.path.display());

            if genres.as_ref() == Some(&event.path) {
                self.reload_genres();
                // taxonomy changes invalidate the rendered genre views
                if let Some(snapshot) = self.snapshot() {
                    self.notify(&snapshot);
                }
            }

            if watchlist.as_ref() == Some(&event.path) {
                if !event.path.exists() {
                    log::warn!("Watchlist {} was removed; keeping last snapshot", event.path.display());
                    continue;
                }
                if let Err(e) = self.load_path(&event.path) {
                    log::error!("Reload of {} failed: {e}", event.path.display());
                }
            }
        }

        Ok(events.len())
    }

    fn notify(&self, snapshot: &Arc<Snapshot>) {
        let callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.iter() {
            callback(snapshot);
        }
    }
}
