use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::cipher::error::TransformError;
use crate::cipher::manager::{Control, ManagerLoop, QueuedTask};
use crate::cipher::protocol::{CipherOp, TaskId};
use crate::cipher::transform::SecretCipher;

/// Limits and timing for a [`CipherExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// How long a live worker may sit with no queued or in-flight work
    /// before its thread is torn down.
    pub idle_timeout: Duration,
    /// Maximum number of accepted-but-undispatched submissions.
    pub queue_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            queue_capacity: 64,
        }
    }
}

/// Point-in-time view of the executor, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorStatus {
    pub worker_alive: bool,
    pub busy: bool,
    pub queued: usize,
    pub workers_spawned: u64,
    pub tasks_settled: u64,
}

/// Completion handle for one submitted transform. Settles exactly once, in
/// submission order relative to all other tickets from the same executor.
#[derive(Debug)]
pub struct TransformTicket {
    id: TaskId,
    rx: oneshot::Receiver<Result<String, TransformError>>,
}

impl TransformTicket {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub async fn wait(self) -> Result<String, TransformError> {
        match self.rx.await {
            Ok(result) => result,
            // The manager dropped the reply channel without settling; only
            // possible once the loop itself is gone.
            Err(_) => Err(TransformError::Closed),
        }
    }
}

/// Cloneable handle to the serialized transform executor.
///
/// All clones feed one manager loop, which owns at most one worker thread
/// and keeps at most one request in flight. No worker exists until the
/// first submission; an idle worker is torn down after
/// [`ExecutorConfig::idle_timeout`] and respawned transparently on the next
/// submission, as is a crashed one.
#[derive(Debug, Clone)]
pub struct CipherExecutor {
    task_tx: mpsc::Sender<QueuedTask>,
    control_tx: mpsc::UnboundedSender<Control>,
    next_id: Arc<AtomicU64>,
}

impl CipherExecutor {
    /// Starts the manager loop on the current runtime. No worker thread is
    /// spawned until the first dispatch.
    pub fn new(cipher: Arc<dyn SecretCipher>, config: ExecutorConfig) -> Self {
        let (task_tx, task_rx) = mpsc::channel(config.queue_capacity);
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        tokio::spawn(ManagerLoop::new(cipher, config.idle_timeout, task_rx, control_rx).run());

        Self {
            task_tx,
            control_tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Queues one transform, waiting for queue capacity if necessary.
    pub async fn submit(&self, op: CipherOp, payload: impl Into<String>) -> Result<TransformTicket, TransformError> {
        let (id, reply, task) = self.make_task(op, payload.into());
        self.task_tx.send(task).await.map_err(|_| TransformError::Closed)?;
        Ok(TransformTicket { id, rx: reply })
    }

    /// Queues one transform without waiting; fails fast when the queue is
    /// at capacity.
    pub fn try_submit(&self, op: CipherOp, payload: impl Into<String>) -> Result<TransformTicket, TransformError> {
        let (id, reply, task) = self.make_task(op, payload.into());
        self.task_tx.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransformError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransformError::Closed,
        })?;
        Ok(TransformTicket { id, rx: reply })
    }

    /// Submit and wait, for callers that only need the result.
    pub async fn transform(&self, op: CipherOp, payload: impl Into<String>) -> Result<String, TransformError> {
        self.submit(op, payload).await?.wait().await
    }

    pub async fn status(&self) -> Result<ExecutorStatus, TransformError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control_tx
            .send(Control::Status(reply_tx))
            .map_err(|_| TransformError::Closed)?;
        reply_rx.await.map_err(|_| TransformError::Closed)
    }

    /// Stops intake, lets already-queued tasks finish through the worker,
    /// tears the worker down and resolves once the manager loop has exited.
    /// Later calls return immediately.
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.control_tx.send(Control::Shutdown(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    fn make_task(
        &self,
        op: CipherOp,
        payload: String,
    ) -> (TaskId, oneshot::Receiver<Result<String, TransformError>>, QueuedTask) {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (reply_tx, reply_rx) = oneshot::channel();
        let task = QueuedTask {
            id,
            op,
            payload,
            reply: reply_tx,
        };
        (id, reply_rx, task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::cipher::transform::{CipherError, XChaChaCipher};

    /// Prefixes payloads on encrypt, strips the prefix on decrypt, and
    /// records every payload it sees plus how many transforms ran at once.
    #[derive(Default)]
    struct RecordingCipher {
        seen: Mutex<Vec<String>>,
        running: AtomicUsize,
        max_running: AtomicUsize,
        delay: Option<Duration>,
    }

    impl RecordingCipher {
        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn observe(&self, payload: &str) {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            self.seen.lock().unwrap().push(payload.to_string());
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }

            self.running.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl SecretCipher for RecordingCipher {
        fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
            self.observe(plaintext);
            match plaintext {
                "decline me" => Err(CipherError::Encrypt("marker payload".to_string())),
                "panic me" => panic!("injected worker panic"),
                _ => Ok(format!("enc:{plaintext}")),
            }
        }

        fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
            self.observe(ciphertext);
            ciphertext
                .strip_prefix("enc:")
                .map(str::to_string)
                .ok_or_else(|| CipherError::Decrypt("missing prefix".to_string()))
        }
    }

    fn executor_with(cipher: Arc<RecordingCipher>, config: ExecutorConfig) -> CipherExecutor {
        CipherExecutor::new(cipher, config)
    }

    fn quick_config() -> ExecutorConfig {
        ExecutorConfig {
            idle_timeout: Duration::from_millis(150),
            queue_capacity: 16,
        }
    }

    async fn wait_for(executor: &CipherExecutor, pred: impl Fn(&ExecutorStatus) -> bool) -> ExecutorStatus {
        for _ in 0..200 {
            let status = executor.status().await.unwrap();
            if pred(&status) {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("status condition not reached in time");
    }

    #[tokio::test]
    async fn no_worker_exists_before_first_submit() {
        let executor = executor_with(Arc::new(RecordingCipher::default()), quick_config());

        let status = executor.status().await.unwrap();
        assert!(!status.worker_alive);
        assert_eq!(status.workers_spawned, 0);
    }

    #[tokio::test]
    async fn tickets_settle_in_submission_order_on_one_worker() {
        let cipher = Arc::new(RecordingCipher::default());
        let executor = executor_with(Arc::clone(&cipher), ExecutorConfig {
            idle_timeout: Duration::from_secs(30),
            queue_capacity: 16,
        });

        let mut tickets = Vec::new();
        for i in 0..5 {
            tickets.push(executor.submit(CipherOp::Encrypt, format!("p{i}")).await.unwrap());
        }

        for (i, ticket) in tickets.into_iter().enumerate() {
            assert_eq!(ticket.wait().await.unwrap(), format!("enc:p{i}"));
        }

        let seen = cipher.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["p0", "p1", "p2", "p3", "p4"]);

        let status = executor.status().await.unwrap();
        assert_eq!(status.workers_spawned, 1);
        assert_eq!(status.tasks_settled, 5);
    }

    #[tokio::test]
    async fn at_most_one_transform_runs_at_a_time() {
        let cipher = Arc::new(RecordingCipher::slow(Duration::from_millis(20)));
        let executor = executor_with(Arc::clone(&cipher), quick_config());

        let mut tickets = Vec::new();
        for i in 0..5 {
            tickets.push(executor.submit(CipherOp::Encrypt, format!("p{i}")).await.unwrap());
        }
        for ticket in tickets {
            ticket.wait().await.unwrap();
        }

        assert_eq!(cipher.max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn round_trips_through_the_real_cipher() {
        let executor = CipherExecutor::new(Arc::new(XChaChaCipher::new("executor secret")), quick_config());

        let encrypted = executor.transform(CipherOp::Encrypt, "aa11bb22").await.unwrap();
        assert_ne!(encrypted, "aa11bb22");

        let decrypted = executor.transform(CipherOp::Decrypt, encrypted).await.unwrap();
        assert_eq!(decrypted, "aa11bb22");
    }

    #[tokio::test]
    async fn decline_settles_only_its_own_ticket() {
        let executor = executor_with(Arc::new(RecordingCipher::default()), quick_config());

        let before = executor.submit(CipherOp::Encrypt, "before").await.unwrap();
        let declined = executor.submit(CipherOp::Encrypt, "decline me").await.unwrap();
        let after = executor.submit(CipherOp::Encrypt, "after").await.unwrap();

        assert_eq!(before.wait().await.unwrap(), "enc:before");

        let err = declined.wait().await.unwrap_err();
        assert!(err.is_declined());
        assert!(matches!(err, TransformError::Declined(_)));

        assert_eq!(after.wait().await.unwrap(), "enc:after");
    }

    #[tokio::test]
    async fn worker_panic_rejects_only_the_inflight_task() {
        let executor = executor_with(Arc::new(RecordingCipher::default()), quick_config());

        let first = executor.submit(CipherOp::Encrypt, "first").await.unwrap();
        let poisoned = executor.submit(CipherOp::Encrypt, "panic me").await.unwrap();
        let second = executor.submit(CipherOp::Encrypt, "second").await.unwrap();
        let third = executor.submit(CipherOp::Encrypt, "third").await.unwrap();

        assert_eq!(first.wait().await.unwrap(), "enc:first");

        let err = poisoned.wait().await.unwrap_err();
        assert!(matches!(err, TransformError::WorkerFault(_)));
        assert!(!err.is_declined());

        // Queued tasks are served by a freshly spawned worker.
        assert_eq!(second.wait().await.unwrap(), "enc:second");
        assert_eq!(third.wait().await.unwrap(), "enc:third");

        let status = executor.status().await.unwrap();
        assert_eq!(status.workers_spawned, 2);
    }

    #[tokio::test]
    async fn idle_worker_is_torn_down_and_respawned() {
        let executor = executor_with(Arc::new(RecordingCipher::default()), ExecutorConfig {
            idle_timeout: Duration::from_millis(100),
            queue_capacity: 16,
        });

        executor.transform(CipherOp::Encrypt, "one").await.unwrap();
        let status = executor.status().await.unwrap();
        assert!(status.worker_alive);
        assert_eq!(status.workers_spawned, 1);

        let status = wait_for(&executor, |s| !s.worker_alive).await;
        assert_eq!(status.workers_spawned, 1);

        // A later submission transparently respawns.
        executor.transform(CipherOp::Encrypt, "two").await.unwrap();
        let status = executor.status().await.unwrap();
        assert!(status.worker_alive);
        assert_eq!(status.workers_spawned, 2);
    }

    #[tokio::test]
    async fn idle_window_shorter_than_a_task_does_not_kill_the_worker() {
        let cipher = Arc::new(RecordingCipher::slow(Duration::from_millis(120)));
        let executor = executor_with(cipher, ExecutorConfig {
            idle_timeout: Duration::from_millis(30),
            queue_capacity: 16,
        });

        let ticket = executor.submit(CipherOp::Encrypt, "slow").await.unwrap();
        assert_eq!(ticket.wait().await.unwrap(), "enc:slow");

        let status = executor.status().await.unwrap();
        assert_eq!(status.workers_spawned, 1);
    }

    #[tokio::test]
    async fn try_submit_reports_queue_full() {
        let cipher = Arc::new(RecordingCipher::slow(Duration::from_millis(100)));
        let executor = executor_with(cipher, ExecutorConfig {
            idle_timeout: Duration::from_secs(30),
            queue_capacity: 2,
        });

        let blocker = executor.submit(CipherOp::Encrypt, "blocker").await.unwrap();
        wait_for(&executor, |s| s.busy).await;

        let q1 = executor.try_submit(CipherOp::Encrypt, "q1").unwrap();
        let q2 = executor.try_submit(CipherOp::Encrypt, "q2").unwrap();

        let err = executor.try_submit(CipherOp::Encrypt, "overflow").unwrap_err();
        assert_eq!(err, TransformError::QueueFull);

        for ticket in [blocker, q1, q2] {
            ticket.wait().await.unwrap();
        }
    }

    #[tokio::test]
    async fn shutdown_drains_accepted_tasks_then_refuses_new_ones() {
        let cipher = Arc::new(RecordingCipher::slow(Duration::from_millis(20)));
        let executor = executor_with(Arc::clone(&cipher), quick_config());

        let mut tickets = Vec::new();
        for i in 0..3 {
            tickets.push(executor.submit(CipherOp::Encrypt, format!("p{i}")).await.unwrap());
        }

        executor.shutdown().await;

        for (i, ticket) in tickets.into_iter().enumerate() {
            assert_eq!(ticket.wait().await.unwrap(), format!("enc:p{i}"));
        }

        let err = executor.submit(CipherOp::Encrypt, "late").await.unwrap_err();
        assert_eq!(err, TransformError::Closed);

        // Idempotent.
        executor.shutdown().await;
    }

    #[tokio::test]
    async fn ticket_ids_are_monotonic() {
        let executor = executor_with(Arc::new(RecordingCipher::default()), quick_config());

        let a = executor.submit(CipherOp::Encrypt, "a").await.unwrap();
        let b = executor.submit(CipherOp::Encrypt, "b").await.unwrap();
        assert!(a.id().0 < b.id().0);

        a.wait().await.unwrap();
        b.wait().await.unwrap();
    }
}
