//! Watch runtime: initial scan plus live filesystem notifications.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher as NotifyWatcher};
use parking_lot::RwLock;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::WatchError;
use crate::watch::events::{FileEventKind, FileListener};

/// Observation produced from a raw notification.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChangeEvent {
    Appeared(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

/// Drives a [`FileListener`] from a set of watch roots.
///
/// `run` registers watches, walks every root once delivering initial
/// events, then blocks on live notifications until stopped. Registration
/// comes first so changes made during the walk still arrive as events.
/// All listener calls happen on the calling thread, which makes it the
/// single writer for whatever the listener mutates. A listener error
/// fails that event only; the runtime logs it and keeps consuming.
pub struct Watcher {
    roots: Vec<PathBuf>,
    listener: Arc<dyn FileListener>,
    running: Arc<RwLock<bool>>,
}

impl Watcher {
    /// Roots are expected to be absolute; canonicalize before constructing.
    pub fn new(roots: Vec<PathBuf>, listener: Arc<dyn FileListener>) -> Self {
        Watcher {
            roots,
            listener,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Walk every root once, delivering `Initial` observations.
    pub fn scan_roots(&self) {
        for root in &self.roots {
            info!(root = %root.display(), "scanning media root");
            self.scan_tree(root, root, FileEventKind::Initial);
        }
    }

    /// Register watches, run the initial scan, then consume live events
    /// until [`stop`](Self::stop).
    pub fn run(&self) -> Result<(), WatchError> {
        *self.running.write() = true;

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("error sending watch event: {}", e);
            }
        })?;
        // watches go live before the walk, so a file landing mid-scan is
        // still delivered as an event; re-observing a scanned file is a
        // no-op for the listener
        for root in &self.roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }
        info!(roots = ?self.roots, "watching media roots");

        self.scan_roots();

        loop {
            if !*self.running.read() {
                break;
            }
            match rx.recv_timeout(Duration::from_millis(250)) {
                Ok(Ok(event)) => {
                    if let Some(change) = convert_event(event) {
                        self.dispatch(change);
                    }
                }
                Ok(Err(e)) => {
                    warn!("watch error: {}", e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("watcher channel disconnected");
                    return Err(WatchError::ChannelClosed);
                }
            }
        }

        Ok(())
    }

    /// Ask a running watcher to exit after its current event.
    pub fn stop(&self) {
        *self.running.write() = false;
    }

    fn dispatch(&self, change: ChangeEvent) {
        match change {
            ChangeEvent::Appeared(path) => self.handle_appeared(path),
            ChangeEvent::Removed(path) => self.handle_removed(path),
            ChangeEvent::Renamed { from, to } => {
                self.handle_removed(from);
                self.handle_appeared(to);
            }
        }
    }

    fn handle_appeared(&self, path: PathBuf) {
        let Some(root) = self.root_of(&path) else {
            return;
        };
        if path.is_dir() {
            // a directory moved in wholesale may never notify for its
            // contents, so walk it here
            self.scan_tree(&root, &path, FileEventKind::Live);
        } else if let Err(e) = self.listener.file_found(&root, &path, FileEventKind::Live) {
            warn!(file = %path.display(), error = %e, "dropped file event");
        }
    }

    fn handle_removed(&self, path: PathBuf) {
        if let Err(e) = self.listener.file_gone(&path) {
            warn!(file = %path.display(), error = %e, "dropped removal event");
        }
    }

    fn scan_tree(&self, root: &Path, start: &Path, kind: FileEventKind) {
        for entry in WalkDir::new(start).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Err(e) = self.listener.file_found(root, entry.path(), kind) {
                warn!(file = %entry.path().display(), error = %e, "dropped file event");
            }
        }
    }

    fn root_of(&self, path: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .find(|root| path.starts_with(root))
            .cloned()
    }
}

fn convert_event(event: Event) -> Option<ChangeEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.first().map(|p| ChangeEvent::Appeared(p.clone())),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
            if event.paths.len() >= 2 {
                Some(ChangeEvent::Renamed {
                    from: event.paths[0].clone(),
                    to: event.paths[1].clone(),
                })
            } else {
                event.paths.first().map(|p| {
                    if p.exists() {
                        ChangeEvent::Appeared(p.clone())
                    } else {
                        ChangeEvent::Removed(p.clone())
                    }
                })
            }
        }
        EventKind::Modify(_) => event.paths.first().map(|p| ChangeEvent::Appeared(p.clone())),
        EventKind::Remove(_) => event.paths.first().map(|p| ChangeEvent::Removed(p.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingListener {
        found: Mutex<Vec<(PathBuf, PathBuf, FileEventKind)>>,
        gone: Mutex<Vec<PathBuf>>,
    }

    impl FileListener for RecordingListener {
        fn file_found(
            &self,
            root: &Path,
            file: &Path,
            kind: FileEventKind,
        ) -> Result<(), IndexError> {
            self.found
                .lock()
                .push((root.to_path_buf(), file.to_path_buf(), kind));
            Ok(())
        }

        fn file_gone(&self, file: &Path) -> Result<(), IndexError> {
            self.gone.lock().push(file.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_scan_roots_delivers_initial_events_with_owning_root() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join("x.mp4"), b"x").unwrap();
        std::fs::write(nested.join("y.mp4"), b"y").unwrap();

        let listener = Arc::new(RecordingListener::default());
        let watcher = Watcher::new(vec![tmp.path().to_path_buf()], listener.clone());
        watcher.scan_roots();

        let found = listener.found.lock();
        assert_eq!(found.len(), 2);
        for (root, file, kind) in found.iter() {
            assert_eq!(root, tmp.path());
            assert!(file.starts_with(tmp.path()));
            assert_eq!(*kind, FileEventKind::Initial);
        }
    }

    #[test]
    fn test_scan_survives_listener_errors() {
        struct FailingListener;
        impl FileListener for FailingListener {
            fn file_found(&self, root: &Path, _: &Path, _: FileEventKind) -> Result<(), IndexError> {
                Err(IndexError::RootGone(root.to_path_buf()))
            }
            fn file_gone(&self, _: &Path) -> Result<(), IndexError> {
                Ok(())
            }
        }

        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.mp4"), b"a").unwrap();
        std::fs::write(tmp.path().join("b.mp4"), b"b").unwrap();

        let watcher = Watcher::new(vec![tmp.path().to_path_buf()], Arc::new(FailingListener));
        // every event fails; the scan itself must not
        watcher.scan_roots();
    }

    #[test]
    fn test_events_outside_roots_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let listener = Arc::new(RecordingListener::default());
        let watcher = Watcher::new(vec![tmp.path().to_path_buf()], listener.clone());

        watcher.dispatch(ChangeEvent::Appeared(elsewhere.path().join("x.mp4")));
        assert!(listener.found.lock().is_empty());
    }

    #[test]
    fn test_rename_becomes_gone_then_found() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("old.mp4");
        let to = tmp.path().join("new.mp4");
        std::fs::write(&to, b"x").unwrap();

        let listener = Arc::new(RecordingListener::default());
        let watcher = Watcher::new(vec![tmp.path().to_path_buf()], listener.clone());
        watcher.dispatch(ChangeEvent::Renamed {
            from: from.clone(),
            to: to.clone(),
        });

        assert_eq!(listener.gone.lock().as_slice(), &[from]);
        let found = listener.found.lock();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, to);
        assert_eq!(found[0].2, FileEventKind::Live);
    }

    #[test]
    fn test_appeared_directory_is_walked() {
        let tmp = TempDir::new().unwrap();
        let moved_in = tmp.path().join("incoming");
        std::fs::create_dir(&moved_in).unwrap();
        std::fs::write(moved_in.join("a.mp4"), b"a").unwrap();
        std::fs::write(moved_in.join("b.mp4"), b"b").unwrap();

        let listener = Arc::new(RecordingListener::default());
        let watcher = Watcher::new(vec![tmp.path().to_path_buf()], listener.clone());
        watcher.dispatch(ChangeEvent::Appeared(moved_in.clone()));

        let found = listener.found.lock();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|(_, _, kind)| *kind == FileEventKind::Live));
    }

    fn wait_until(what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if cond() {
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
        panic!("timed out waiting for {what}");
    }

    #[test]
    fn test_files_created_during_initial_scan_are_picked_up() {
        struct StallingListener {
            found: Mutex<Vec<PathBuf>>,
            stalled: AtomicBool,
            release: AtomicBool,
        }

        impl FileListener for StallingListener {
            fn file_found(
                &self,
                _: &Path,
                file: &Path,
                kind: FileEventKind,
            ) -> Result<(), IndexError> {
                if kind == FileEventKind::Initial && !self.release.load(Ordering::SeqCst) {
                    self.stalled.store(true, Ordering::SeqCst);
                    while !self.release.load(Ordering::SeqCst) {
                        thread::sleep(Duration::from_millis(10));
                    }
                }
                self.found.lock().push(file.to_path_buf());
                Ok(())
            }

            fn file_gone(&self, _: &Path) -> Result<(), IndexError> {
                Ok(())
            }
        }

        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("first.mp4"), b"x").unwrap();

        let listener = Arc::new(StallingListener {
            found: Mutex::new(Vec::new()),
            stalled: AtomicBool::new(false),
            release: AtomicBool::new(false),
        });
        let watcher = Arc::new(Watcher::new(
            vec![tmp.path().to_path_buf()],
            listener.clone(),
        ));
        let runner = Arc::clone(&watcher);
        let handle = thread::spawn(move || runner.run());

        wait_until("the scan to reach the first file", || {
            listener.stalled.load(Ordering::SeqCst)
        });
        // watches are live before the walk, so this lands as an event
        let late = tmp.path().join("late.mp4");
        std::fs::write(&late, b"x").unwrap();
        listener.release.store(true, Ordering::SeqCst);

        wait_until("the mid-scan file to be delivered", || {
            listener.found.lock().iter().any(|p| p == &late)
        });

        watcher.stop();
        handle.join().unwrap().unwrap();
    }
}
