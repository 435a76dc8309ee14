//! # DebouncedStore
//!
//! 合并频繁的会话写入：每次 `schedule` 替换待写快照并重置计时器，
//! 计时器到期后只写入最新的一份。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

use aura_core::{SessionMap, Theme};

use crate::error::{StorageError, StorageResult};
use crate::storage::SessionStore;

enum WriteCommand {
    Schedule(SessionMap),
    Flush(oneshot::Sender<()>),
}

pub struct DebouncedStore {
    store: Arc<dyn SessionStore>,
    tx: mpsc::UnboundedSender<WriteCommand>,
    worker: JoinHandle<()>,
}

impl DebouncedStore {
    /// 启动后台写入任务，必须在 tokio 运行时内调用
    pub fn new(store: Arc<dyn SessionStore>, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Self::run_writer(Arc::clone(&store), rx, delay));

        debug!("DebouncedStore started with {:?} delay", delay);
        Self { store, tx, worker }
    }

    /// 底层存储
    pub fn inner(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// 安排一次写入，替换尚未写出的快照
    pub fn schedule(&self, snapshot: SessionMap) {
        if self.tx.send(WriteCommand::Schedule(snapshot)).is_err() {
            warn!("Session writer stopped, dropping scheduled save");
        }
    }

    /// 立即写出待写快照并等待完成
    pub async fn flush(&self) -> StorageResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriteCommand::Flush(ack_tx))
            .map_err(|_| StorageError::WriterStopped)?;
        ack_rx.await.map_err(|_| StorageError::WriterStopped)
    }

    /// 主题不做合并，直接写入
    pub async fn save_theme(&self, theme: Theme) -> StorageResult<()> {
        self.store.save_theme(theme).await
    }

    async fn write(store: &Arc<dyn SessionStore>, snapshot: SessionMap) {
        if let Err(e) = store.save_sessions(&snapshot).await {
            error!("Failed to save sessions: {}", e);
        }
    }

    async fn run_writer(
        store: Arc<dyn SessionStore>,
        mut rx: mpsc::UnboundedReceiver<WriteCommand>,
        delay: Duration,
    ) {
        let mut pending: Option<SessionMap> = None;
        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(WriteCommand::Schedule(snapshot)) => {
                        pending = Some(snapshot);
                        timer.as_mut().reset(Instant::now() + delay);
                    }
                    Some(WriteCommand::Flush(ack)) => {
                        if let Some(snapshot) = pending.take() {
                            Self::write(&store, snapshot).await;
                        }
                        let _ = ack.send(());
                    }
                    None => {
                        if let Some(snapshot) = pending.take() {
                            Self::write(&store, snapshot).await;
                        }
                        debug!("Session writer shutting down");
                        break;
                    }
                },
                _ = &mut timer, if pending.is_some() => {
                    if let Some(snapshot) = pending.take() {
                        Self::write(&store, snapshot).await;
                    }
                }
            }
        }
    }
}

impl Drop for DebouncedStore {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aura_core::ChatSession;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingStore {
        saves: Mutex<Vec<SessionMap>>,
    }

    #[async_trait]
    impl SessionStore for CountingStore {
        async fn load_sessions(&self) -> StorageResult<SessionMap> {
            Ok(SessionMap::new())
        }

        async fn save_sessions(&self, sessions: &SessionMap) -> StorageResult<()> {
            self.saves.lock().push(sessions.clone());
            Ok(())
        }

        async fn load_theme(&self) -> StorageResult<Option<Theme>> {
            Ok(None)
        }

        async fn save_theme(&self, _theme: Theme) -> StorageResult<()> {
            Ok(())
        }
    }

    /// 第一次保存失败，之后正常
    #[derive(Default)]
    struct FlakyStore {
        attempts: Mutex<usize>,
        written: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn load_sessions(&self) -> StorageResult<SessionMap> {
            Ok(SessionMap::new())
        }

        async fn save_sessions(&self, sessions: &SessionMap) -> StorageResult<()> {
            let mut attempts = self.attempts.lock();
            *attempts += 1;
            if *attempts == 1 {
                return Err(StorageError::other("disk full"));
            }
            self.written.lock().push(sessions.len());
            Ok(())
        }

        async fn load_theme(&self) -> StorageResult<Option<Theme>> {
            Ok(None)
        }

        async fn save_theme(&self, _theme: Theme) -> StorageResult<()> {
            Ok(())
        }
    }

    fn map_with(count: usize) -> SessionMap {
        (0..count)
            .map(|_| {
                let session = ChatSession::new("New Chat", "hi");
                (session.id.clone(), session)
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_write_once_with_latest() {
        let counting = Arc::new(CountingStore::default());
        let store = DebouncedStore::new(counting.clone(), Duration::from_millis(500));

        for i in 1..=5 {
            store.schedule(map_with(i));
            sleep(Duration::from_millis(100)).await;
        }
        assert!(counting.saves.lock().is_empty());

        sleep(Duration::from_millis(600)).await;

        let saves = counting.saves.lock();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_pending_immediately() {
        let counting = Arc::new(CountingStore::default());
        let store = DebouncedStore::new(counting.clone(), Duration::from_millis(500));

        store.schedule(map_with(2));
        store.flush().await.unwrap();
        assert_eq!(counting.saves.lock().len(), 1);

        // 没有待写数据时 flush 不产生写入
        store.flush().await.unwrap();
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(counting.saves.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_write() {
        let counting = Arc::new(CountingStore::default());
        let store = DebouncedStore::new(counting.clone(), Duration::from_millis(500));

        store.schedule(map_with(1));
        drop(store);
        sleep(Duration::from_millis(1000)).await;

        assert!(counting.saves.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_dropped_and_later_writes_continue() {
        let flaky = Arc::new(FlakyStore::default());
        let store = DebouncedStore::new(flaky.clone(), Duration::from_millis(500));

        store.schedule(map_with(1));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(*flaky.attempts.lock(), 1);
        assert!(flaky.written.lock().is_empty());

        store.schedule(map_with(2));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(*flaky.attempts.lock(), 2);
        assert_eq!(*flaky.written.lock(), vec![2]);

        // 失败的快照不会重试
        store.flush().await.unwrap();
        assert_eq!(*flaky.attempts.lock(), 2);
    }
}
