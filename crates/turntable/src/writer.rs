//! Background persistence of encoded frames.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

use turntable_core::{Result, TurntableError};

/// A frame that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to write {}: {message}", path.display())]
pub struct WriteFailure {
    /// Target path of the frame.
    pub path: PathBuf,
    /// What went wrong.
    pub message: String,
}

/// Outcome of the writes completed since the last drain.
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    /// Frames that reached the disk.
    pub written: Vec<PathBuf>,
    /// Frames that did not.
    pub failures: Vec<WriteFailure>,
}

impl WriteSummary {
    /// Returns true if no write failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes encoded frames on the blocking pool with bounded backpressure.
///
/// At most `max_pending` writes are in flight; [`FrameWriter::write`] waits
/// for a slot when the queue is full. [`FrameWriter::drain`] waits for every
/// outstanding write.
pub struct FrameWriter {
    permits: Arc<Semaphore>,
    tasks: JoinSet<std::result::Result<PathBuf, WriteFailure>>,
    paths: HashMap<Id, PathBuf>,
    completed: WriteSummary,
}

impl FrameWriter {
    /// Creates a writer allowing `max_pending` writes in flight (at least one).
    pub fn new(max_pending: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_pending.max(1))),
            tasks: JoinSet::new(),
            paths: HashMap::new(),
            completed: WriteSummary::default(),
        }
    }

    /// Number of writes not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Queues `bytes` to be written to `path`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn write(&mut self, bytes: Vec<u8>, path: PathBuf) -> Result<()> {
        log::debug!("queued {} ({} bytes)", path.display(), bytes.len());
        self.submit(path, move |path| std::fs::write(path, &bytes))
            .await
    }

    /// Waits for a free slot, then runs `job` on the blocking pool.
    async fn submit<F>(&mut self, path: PathBuf, job: F) -> Result<()>
    where
        F: FnOnce(&Path) -> std::io::Result<()> + Send + 'static,
    {
        self.reap();

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| TurntableError::WriteQueueClosed)?;

        let task_path = path.clone();
        let handle = self.tasks.spawn_blocking(move || {
            let _permit = permit;
            match job(&task_path) {
                Ok(()) => Ok(task_path),
                Err(e) => Err(WriteFailure {
                    path: task_path,
                    message: e.to_string(),
                }),
            }
        });
        self.paths.insert(handle.id(), path);
        Ok(())
    }

    /// Waits for every queued write and returns what happened since the
    /// last drain.
    pub async fn drain(&mut self) -> WriteSummary {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.record(joined);
        }
        std::mem::take(&mut self.completed)
    }

    /// Collects writes that have already finished.
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.record(joined);
        }
    }

    fn record(
        &mut self,
        joined: std::result::Result<(Id, std::result::Result<PathBuf, WriteFailure>), JoinError>,
    ) {
        match joined {
            Ok((id, Ok(path))) => {
                self.paths.remove(&id);
                log::debug!("wrote {}", path.display());
                self.completed.written.push(path);
            }
            Ok((id, Err(failure))) => {
                self.paths.remove(&id);
                log::error!("{failure}");
                self.completed.failures.push(failure);
            }
            Err(e) => {
                let path = self.paths.remove(&e.id()).unwrap_or_default();
                let failure = WriteFailure {
                    path,
                    message: e.to_string(),
                };
                log::error!("{failure}");
                self.completed.failures.push(failure);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_in_flight_writes_never_exceed_limit() {
        let mut writer = FrameWriter::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for i in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            writer
                .submit(PathBuf::from(format!("frame{i:04}.png")), move |_| {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
        }
        let summary = writer.drain().await;

        assert_eq!(summary.written.len(), 6);
        let peak = peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak in-flight writes was {peak}");
    }

    #[tokio::test]
    async fn test_write_waits_for_free_slot() {
        let mut writer = FrameWriter::new(2);
        let mut gates = Vec::new();
        for i in 0..2 {
            let (tx, rx) = mpsc::channel::<()>();
            gates.push(tx);
            writer
                .submit(PathBuf::from(format!("held{i}.png")), move |_| {
                    let _ = rx.recv();
                    Ok(())
                })
                .await
                .unwrap();
        }

        // Both slots are held, so a third write cannot start.
        let queued = tokio::select! {
            biased;
            _ = writer.submit(PathBuf::from("third.png"), |_| Ok(())) => true,
            _ = async {
                for _ in 0..16 {
                    tokio::task::yield_now().await;
                }
            } => false,
        };
        assert!(!queued);
        assert_eq!(writer.pending(), 2);

        drop(gates);
        writer
            .submit(PathBuf::from("third.png"), |_| Ok(()))
            .await
            .unwrap();
        let summary = writer.drain().await;
        assert_eq!(summary.written.len(), 3);
    }

    #[tokio::test]
    async fn test_drain_waits_for_every_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FrameWriter::new(2);

        for i in 0..5 {
            let path = dir.path().join(format!("frame{i:04}.png"));
            writer.write(vec![i as u8; 16], path).await.unwrap();
        }
        let summary = writer.drain().await;

        assert!(summary.is_clean());
        assert_eq!(summary.written.len(), 5);
        assert_eq!(writer.pending(), 0);
        for i in 0..5u8 {
            let bytes = std::fs::read(dir.path().join(format!("frame{i:04}.png"))).unwrap();
            assert_eq!(bytes, vec![i; 16]);
        }
    }

    #[tokio::test]
    async fn test_failed_write_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("frame0000.png");
        let mut writer = FrameWriter::new(8);

        writer.write(vec![1, 2, 3], missing.clone()).await.unwrap();
        let summary = writer.drain().await;

        assert!(summary.written.is_empty());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, missing);
    }

    #[tokio::test]
    async fn test_drain_resets_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FrameWriter::new(0);

        writer
            .write(vec![0], dir.path().join("a.png"))
            .await
            .unwrap();
        assert_eq!(writer.drain().await.written.len(), 1);
        assert!(writer.drain().await.written.is_empty());
    }
}
