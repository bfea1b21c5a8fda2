//! Filesystem watcher with debouncing and per-path coalescing
//!
//! Raw `notify` events are translated into sync events for files below the
//! root, held until their path has been quiet for the stability window, and
//! then emitted with paths relative to the root.

use indexmap::IndexMap;
use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use remotesync_core::{Error, EventType, PathMatcher, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A debounced change to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Relative to the watched root, `/`-separated
    pub path: String,
    /// What happened to the file
    pub event: EventType,
}

/// Timing for the debouncer
#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// How long a path must stay quiet before its event is emitted
    pub stability: Duration,
    /// How often pending events are checked
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            stability: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Holds events until their path settles
#[derive(Debug, Default)]
pub struct Debouncer {
    stability: Duration,
    pending: IndexMap<String, (EventType, Instant)>,
}

impl Debouncer {
    /// Debouncer emitting after `stability` of quiet
    pub fn new(stability: Duration) -> Self {
        Self {
            stability,
            pending: IndexMap::new(),
        }
    }

    /// Record an event, merging with any pending one for the same path
    ///
    /// A pending `Add` absorbs a later `Change`; otherwise the newest event
    /// replaces the pending one.
    pub fn push(&mut self, path: String, event: EventType, now: Instant) {
        let merged = match (self.pending.get(&path), event) {
            (Some((EventType::Add, _)), EventType::Change) => EventType::Add,
            _ => event,
        };
        self.pending.insert(path, (merged, now));
    }

    /// Remove and return events whose path has been quiet long enough
    pub fn drain_ready(&mut self, now: Instant) -> Vec<WatchEvent> {
        let mut ready = Vec::new();
        self.pending.retain(|path, (event, last)| {
            if now.duration_since(*last) >= self.stability {
                ready.push(WatchEvent {
                    path: path.clone(),
                    event: *event,
                });
                false
            } else {
                true
            }
        });
        ready
    }

    /// No events waiting
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Watches a directory tree and yields [`WatchEvent`]s
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    _debouncer_handle: JoinHandle<()>,
    receiver: mpsc::UnboundedReceiver<WatchEvent>,
}

impl FileWatcher {
    /// Start watching `root` recursively
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Watch`] if the platform watcher cannot be set up
    pub fn start(root: &Path, matcher: Arc<dyn PathMatcher>, config: WatcherConfig) -> Result<Self> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = raw_tx.send(res);
        })
        .map_err(|e| Error::Watch(format!("Failed to create watcher: {e}")))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("Failed to watch {}: {e}", root.display())))?;

        tracing::debug!("Watching {}", root.display());

        let handle = tokio::spawn(debounce_events(
            root.to_path_buf(),
            matcher,
            config,
            raw_rx,
            event_tx,
        ));

        Ok(Self {
            _watcher: watcher,
            _debouncer_handle: handle,
            receiver: event_rx,
        })
    }

    /// Next settled event; `None` once the watcher has shut down
    pub async fn recv(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await
    }
}

async fn debounce_events(
    root: PathBuf,
    matcher: Arc<dyn PathMatcher>,
    config: WatcherConfig,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
) {
    let mut debouncer = Debouncer::new(config.stability);
    let mut tick = tokio::time::interval(config.poll_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            raw = raw_rx.recv() => match raw {
                Some(Ok(event)) => {
                    let now = Instant::now();
                    for (path, kind) in translate(&root, &event) {
                        if matcher.is_excluded(Path::new(&path)) {
                            tracing::trace!("Ignoring event for excluded path: {path}");
                            continue;
                        }
                        debouncer.push(path, kind, now);
                    }
                }
                Some(Err(e)) => tracing::warn!("Watcher error: {e}"),
                None => break,
            },
            _ = tick.tick() => {
                for event in debouncer.drain_ready(Instant::now()) {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Map a raw notify event to sync events for files below `root`
pub fn translate(root: &Path, event: &Event) -> Vec<(String, EventType)> {
    let mapped: Vec<(&PathBuf, EventType)> = match &event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            Vec::new()
        }
        EventKind::Create(_) => event.paths.iter().map(|p| (p, EventType::Add)).collect(),
        EventKind::Remove(_) => event.paths.iter().map(|p| (p, EventType::Delete)).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.iter().map(|p| (p, EventType::Delete)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().map(|p| (p, EventType::Add)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                out.push((from, EventType::Delete));
            }
            if let Some(to) = event.paths.get(1) {
                out.push((to, EventType::Add));
            }
            out
        }
        // Rename without a known direction: decide by whether the path is still there
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let kind = if p.exists() {
                    EventType::Add
                } else {
                    EventType::Delete
                };
                (p, kind)
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => Vec::new(),
        EventKind::Modify(_) => event.paths.iter().map(|p| (p, EventType::Change)).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    };

    mapped
        .into_iter()
        .filter(|(path, kind)| *kind == EventType::Delete || !path.is_dir())
        .filter_map(|(path, kind)| relative_key(root, path).map(|key| (key, kind)))
        .collect()
}

/// `/`-separated path of `path` below `root`
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use notify::event::DataChange;
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[PathBuf]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(path.clone());
        }
        event
    }

    #[test]
    fn test_debouncer_waits_for_stability() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.push("a.txt".to_string(), EventType::Change, start);
        assert!(debouncer.drain_ready(start + Duration::from_millis(300)).is_empty());

        debouncer.push("a.txt".to_string(), EventType::Change, start + Duration::from_millis(300));
        assert!(debouncer.drain_ready(start + Duration::from_millis(600)).is_empty());

        let ready = debouncer.drain_ready(start + Duration::from_millis(800));
        assert_eq!(
            ready,
            vec![WatchEvent {
                path: "a.txt".to_string(),
                event: EventType::Change
            }]
        );
        assert!(debouncer.is_empty());
    }

    #[test]
    fn test_debouncer_coalesces() {
        let now = Instant::now();
        let later = now + Duration::from_secs(1);
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.push("new.txt".to_string(), EventType::Add, now);
        debouncer.push("new.txt".to_string(), EventType::Change, now);
        debouncer.push("gone.txt".to_string(), EventType::Change, now);
        debouncer.push("gone.txt".to_string(), EventType::Delete, now);

        let ready = debouncer.drain_ready(later);
        assert_eq!(ready[0].event, EventType::Add);
        assert_eq!(ready[1].event, EventType::Delete);
    }

    #[test]
    fn test_translate_file_events() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir(root.join("src")).unwrap();
        std::fs::write(root.join("src/a.rs"), "").unwrap();

        let created = translate(
            root,
            &event(EventKind::Create(CreateKind::File), &[root.join("src/a.rs")]),
        );
        assert_eq!(created, vec![("src/a.rs".to_string(), EventType::Add)]);

        let modified = translate(
            root,
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &[root.join("src/a.rs")],
            ),
        );
        assert_eq!(modified, vec![("src/a.rs".to_string(), EventType::Change)]);

        let removed = translate(
            root,
            &event(EventKind::Remove(RemoveKind::File), &[root.join("old.rs")]),
        );
        assert_eq!(removed, vec![("old.rs".to_string(), EventType::Delete)]);
    }

    #[test]
    fn test_translate_rename_and_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("b.txt"), "").unwrap();
        std::fs::create_dir(root.join("dir")).unwrap();

        let renamed = translate(
            root,
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &[root.join("a.txt"), root.join("b.txt")],
            ),
        );
        assert_eq!(
            renamed,
            vec![
                ("a.txt".to_string(), EventType::Delete),
                ("b.txt".to_string(), EventType::Add)
            ]
        );

        let dir_modified = translate(
            root,
            &event(EventKind::Modify(ModifyKind::Any), &[root.join("dir")]),
        );
        assert!(dir_modified.is_empty());

        let outside = translate(
            root,
            &event(EventKind::Create(CreateKind::File), &[PathBuf::from("/elsewhere/x")]),
        );
        assert!(outside.is_empty());
    }

    struct ExcludeTmp;

    impl PathMatcher for ExcludeTmp {
        fn is_excluded(&self, path: &Path) -> bool {
            path.extension().is_some_and(|ext| ext == "tmp")
        }
    }

    #[tokio::test]
    async fn test_watcher_emits_one_settled_add() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let config = WatcherConfig {
            stability: Duration::from_millis(100),
            poll_interval: Duration::from_millis(20),
        };
        let mut watcher = FileWatcher::start(&root, Arc::new(ExcludeTmp), config).unwrap();

        std::fs::write(root.join("scratch.tmp"), "x").unwrap();
        std::fs::write(root.join("new.txt"), "hello").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            WatchEvent {
                path: "new.txt".to_string(),
                event: EventType::Add
            }
        );

        let extra = tokio::time::timeout(Duration::from_millis(400), watcher.recv()).await;
        assert!(extra.is_err(), "unexpected event: {extra:?}");
    }

    #[test]
    fn test_relative_key() {
        let root = Path::new("/w");
        assert_eq!(relative_key(root, Path::new("/w/a/b.txt")), Some("a/b.txt".to_string()));
        assert_eq!(relative_key(root, Path::new("/w")), None);
        assert_eq!(relative_key(root, Path::new("/other/b.txt")), None);
    }
}
