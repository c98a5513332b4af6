use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// An event from the file watcher, ready for the Store to process.
#[derive(Debug, Clone)]
pub struct WatcherEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Watches a fixed set of input files (the watchlist export and the genre
/// taxonomy). Debounced events are sent through an mpsc channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    /// Handle to the background thread processing events
    _thread: std::thread::JoinHandle<()>,
    /// Receiver for debounced file change events
    pub event_rx: mpsc::Receiver<WatcherEvent>,
}

impl FileWatcher {
    /// Start watching the given files. Each file's parent directory is
    /// watched so that editors which replace files by rename are still seen.
    /// Debounced events (100ms) are available via `event_rx`.
    pub fn start(files: &[PathBuf]) -> Result<Self, notify::Error> {
        let (notify_tx, notify_rx) = mpsc::channel::<notify::Result<Event>>();
        let (event_tx, event_rx) = mpsc::channel::<WatcherEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default(),
        )?;

        let mut targets = HashSet::new();
        let mut dirs = HashSet::new();
        for file in files {
            let target = watch_target(file);
            if let Some(dir) = target.parent() {
                dirs.insert(dir.to_path_buf());
            }
            targets.insert(target);
        }

        for dir in &dirs {
            if dir.exists() {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
            } else {
                log::warn!("Not watching {}: directory does not exist", dir.display());
            }
        }

        // Background thread to process events with debouncing
        let thread = std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut pending: Vec<(PathBuf, ChangeKind)> = Vec::new();
            let mut last_event = Instant::now();

            loop {
                match notify_rx.recv_timeout(debounce) {
                    Ok(Ok(event)) => {
                        let kind = match event.kind {
                            EventKind::Create(_) => Some(ChangeKind::Created),
                            EventKind::Modify(_) => Some(ChangeKind::Modified),
                            EventKind::Remove(_) => Some(ChangeKind::Deleted),
                            _ => None,
                        };

                        if let Some(kind) = kind {
                            for path in event.paths {
                                if targets.contains(&path) {
                                    pending.push((path, kind));
                                }
                            }
                        }
                        last_event = Instant::now();
                    }
                    Ok(Err(e)) => {
                        log::warn!("File watcher error: {e}");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if !pending.is_empty() && last_event.elapsed() >= debounce {
                            // Deduplicate paths (keep last change kind)
                            let mut seen = std::collections::HashMap::new();
                            for (path, kind) in pending.drain(..) {
                                seen.insert(path, kind);
                            }
                            for (path, kind) in seen {
                                if event_tx.send(WatcherEvent { path, kind }).is_err() {
                                    return; // Receiver dropped
                                }
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        break;
                    }
                }
            }
        });

        Ok(FileWatcher {
            _watcher: watcher,
            _thread: thread,
            event_rx,
        })
    }
}

/// The kind of file change detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// The path notify will report for `file`: its canonical parent directory
/// joined with the file name. Falls back to the path as given.
pub fn watch_target(file: &Path) -> PathBuf {
    let parent = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), file.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => file.to_path_buf(),
    }
}
