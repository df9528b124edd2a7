//! Debounced background autosave.
//!
//! Editing never blocks on disk: callers hand the worker a serialized
//! workspace after each change, the worker waits out a quiet period and
//! writes only the newest document. A request arriving while the timer is
//! armed supersedes the pending document and re-arms the timer, so there is
//! never more than one outstanding write.

use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::time::Instant;

use crate::document::SavedWorkspace;

/// Default quiet period between the last edit and the actual write
pub const QUIET_PERIOD: Duration = Duration::from_secs(3);

/// Configuration for the autosave worker
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Where the workspace document is written
    pub path: PathBuf,
    /// How long the document must stay quiet before it hits the disk
    pub quiet_period: Duration,
}

impl AutosaveConfig {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            quiet_period: QUIET_PERIOD,
        }
    }
}

/// Events from the autosave worker to the main thread
#[derive(Debug)]
pub enum AutosaveEvent {
    /// A document hit the disk
    Saved,
    /// A write failed; editing continues and nothing in memory is lost
    Error(String),
}

/// Commands from the main thread to the autosave worker
#[derive(Debug)]
enum AutosaveCommand {
    Schedule(Box<SavedWorkspace>),
    Shutdown,
}

/// Handle for communicating with the autosave worker from the main thread
pub struct AutosaveHandle {
    command_tx: std_mpsc::Sender<AutosaveCommand>,
    event_rx: std_mpsc::Receiver<AutosaveEvent>,
    thread: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Non-blocking check for worker events
    pub fn poll_event(&self) -> Option<AutosaveEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Queue a document to be written after the quiet period. Supersedes any
    /// document already pending and re-arms the timer.
    pub fn schedule(&self, doc: SavedWorkspace) -> Result<()> {
        self.command_tx
            .send(AutosaveCommand::Schedule(Box::new(doc)))?;
        Ok(())
    }

    /// Flush any pending document and stop the worker
    pub fn shutdown(self) -> Result<()> {
        self.command_tx.send(AutosaveCommand::Shutdown)?;
        self.thread
            .join()
            .map_err(|_| anyhow!("autosave worker panicked"))?;
        Ok(())
    }
}

/// Start the autosave worker thread
pub fn start_autosave_thread(config: AutosaveConfig) -> AutosaveHandle {
    let (event_tx, event_rx) = std_mpsc::channel();
    let (command_tx, command_rx) = std_mpsc::channel();

    let thread = thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime");

        rt.block_on(run_autosave(config, event_tx, command_rx));
    });

    AutosaveHandle {
        command_tx,
        event_rx,
        thread,
    }
}

/// Main debounce loop: poll for commands, write once the deadline passes
async fn run_autosave(
    config: AutosaveConfig,
    event_tx: std_mpsc::Sender<AutosaveEvent>,
    command_rx: std_mpsc::Receiver<AutosaveCommand>,
) {
    let mut pending: Option<SavedWorkspace> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(25)) => {
                match command_rx.try_recv() {
                    Ok(AutosaveCommand::Schedule(doc)) => {
                        pending = Some(*doc);
                        deadline = Instant::now() + config.quiet_period;
                    }
                    Ok(AutosaveCommand::Shutdown) => {
                        flush(&config, &mut pending, &event_tx);
                        break;
                    }
                    Err(std_mpsc::TryRecvError::Empty) => {}
                    Err(std_mpsc::TryRecvError::Disconnected) => {
                        flush(&config, &mut pending, &event_tx);
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline), if pending.is_some() => {
                flush(&config, &mut pending, &event_tx);
            }
        }
    }
}

fn flush(
    config: &AutosaveConfig,
    pending: &mut Option<SavedWorkspace>,
    event_tx: &std_mpsc::Sender<AutosaveEvent>,
) {
    if let Some(doc) = pending.take() {
        match doc.save(&config.path) {
            Ok(()) => {
                let _ = event_tx.send(AutosaveEvent::Saved);
            }
            Err(e) => {
                tracing::warn!("autosave failed: {e:#}");
                let _ = event_tx.send(AutosaveEvent::Error(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir, quiet_ms: u64) -> AutosaveConfig {
        AutosaveConfig {
            path: dir.path().join("document.json"),
            quiet_period: Duration::from_millis(quiet_ms),
        }
    }

    #[test]
    fn write_waits_out_the_quiet_period() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, 500);
        let handle = start_autosave_thread(cfg.clone());

        handle.schedule(SavedWorkspace::baseline()).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(!cfg.path.exists(), "write happened before the quiet period");

        thread::sleep(Duration::from_millis(1000));
        assert!(cfg.path.exists());
        assert!(matches!(handle.poll_event(), Some(AutosaveEvent::Saved)));
        handle.shutdown().unwrap();
    }

    #[test]
    fn newer_requests_supersede_pending_ones() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, 400);
        let handle = start_autosave_thread(cfg.clone());

        let mut first = SavedWorkspace::baseline();
        first.version = Some("first".into());
        let mut second = SavedWorkspace::baseline();
        second.version = Some("second".into());

        handle.schedule(first).unwrap();
        thread::sleep(Duration::from_millis(150));
        handle.schedule(second).unwrap();
        thread::sleep(Duration::from_millis(1200));

        // only the newest document was written, exactly once
        let saved = SavedWorkspace::load(&cfg.path);
        assert_eq!(saved.version.as_deref(), Some("second"));
        let mut saves = 0;
        while let Some(event) = handle.poll_event() {
            if matches!(event, AutosaveEvent::Saved) {
                saves += 1;
            }
        }
        assert_eq!(saves, 1);
        handle.shutdown().unwrap();
    }

    #[test]
    fn shutdown_flushes_the_pending_document() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, 60_000);
        let handle = start_autosave_thread(cfg.clone());

        handle.schedule(SavedWorkspace::baseline()).unwrap();
        handle.shutdown().unwrap();
        assert!(cfg.path.exists());
    }

    #[test]
    fn write_failure_reports_an_event_and_keeps_running() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the target path makes the write fail
        let path = dir.path().join("document.json");
        std::fs::create_dir_all(&path).unwrap();

        let handle = start_autosave_thread(AutosaveConfig {
            path,
            quiet_period: Duration::from_millis(50),
        });
        handle.schedule(SavedWorkspace::baseline()).unwrap();
        thread::sleep(Duration::from_millis(500));

        assert!(matches!(handle.poll_event(), Some(AutosaveEvent::Error(_))));
        // the worker is still alive and accepts further requests
        handle.schedule(SavedWorkspace::baseline()).unwrap();
        handle.shutdown().unwrap();
    }
}
