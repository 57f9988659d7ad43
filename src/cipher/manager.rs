use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

use crate::cipher::error::TransformError;
use crate::cipher::executor::ExecutorStatus;
use crate::cipher::protocol::{CipherOp, TaskId, TransformRequest, WorkerEvent};
use crate::cipher::transform::SecretCipher;
use crate::cipher::worker;

/// One accepted submission, queued until the worker is free.
pub(crate) struct QueuedTask {
    pub id: TaskId,
    pub op: CipherOp,
    pub payload: String,
    pub reply: oneshot::Sender<Result<String, TransformError>>,
}

pub(crate) enum Control {
    Status(oneshot::Sender<ExecutorStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Channels into the live worker thread. Dropping this tears the worker
/// down: the request sender closes, the thread's blocking recv fails and it
/// exits.
struct WorkerHandle {
    requests: std_mpsc::Sender<TransformRequest>,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
}

struct InFlight {
    id: TaskId,
    reply: oneshot::Sender<Result<String, TransformError>>,
}

/// The lifecycle manager: a single loop owning the worker handle, the
/// in-flight record and the idle deadline, so no other component ever
/// touches them.
///
/// The task queue is polled only while nothing is in flight, which is what
/// serializes the worker: at most one request is outstanding, and tickets
/// settle in submission order. The idle deadline is armed only when the
/// queue is empty and nothing is in flight, and disarmed on every dispatch,
/// so it can never fire mid-task.
pub(crate) struct ManagerLoop {
    cipher: Arc<dyn SecretCipher>,
    idle_timeout: Duration,
    task_rx: mpsc::Receiver<QueuedTask>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    worker: Option<WorkerHandle>,
    in_flight: Option<InFlight>,
    idle_deadline: Option<Instant>,
    workers_spawned: u64,
    tasks_settled: u64,
}

impl ManagerLoop {
    pub(crate) fn new(
        cipher: Arc<dyn SecretCipher>,
        idle_timeout: Duration,
        task_rx: mpsc::Receiver<QueuedTask>,
        control_rx: mpsc::UnboundedReceiver<Control>,
    ) -> Self {
        Self {
            cipher,
            idle_timeout,
            task_rx,
            control_rx,
            worker: None,
            in_flight: None,
            idle_deadline: None,
            workers_spawned: 0,
            tasks_settled: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(idle_secs = self.idle_timeout.as_secs_f64(); "Cipher executor manager started");

        loop {
            let idle_deadline = self.idle_deadline;

            tokio::select! {
                maybe_control = self.control_rx.recv() => {
                    match maybe_control {
                        Some(Control::Status(reply)) => {
                            let _ = reply.send(self.snapshot());
                        },
                        Some(Control::Shutdown(done)) => {
                            self.drain_and_stop().await;
                            let _ = done.send(());
                            return;
                        },
                        // Every executor handle is gone; settle what was
                        // already accepted and stop.
                        None => {
                            self.drain_and_stop().await;
                            return;
                        },
                    }
                },
                maybe_event = next_event(&mut self.worker), if self.worker.is_some() => {
                    match maybe_event {
                        Some(event) => self.handle_worker_event(event),
                        None => self.handle_worker_gone(),
                    }
                },
                maybe_task = self.task_rx.recv(), if self.in_flight.is_none() => {
                    match maybe_task {
                        Some(task) => self.dispatch(task),
                        None => {
                            self.drain_and_stop().await;
                            return;
                        },
                    }
                },
                _ = idle_sleep(idle_deadline), if idle_deadline.is_some() => {
                    debug!(idle_secs = self.idle_timeout.as_secs_f64(); "Idle window elapsed, tearing down cipher worker");
                    self.teardown_worker();
                },
            }
        }
    }

    /// Sends the task to the worker, spawning one first if absent. A handle
    /// whose thread already exited shows up as a failed send; it is replaced
    /// once, then the task is rejected.
    fn dispatch(&mut self, task: QueuedTask) {
        self.idle_deadline = None;

        let QueuedTask { id, op, payload, reply } = task;
        debug!(task_id:% = id, op:% = op; "Dispatching transform");

        let mut request = TransformRequest { id, op, payload };

        for _ in 0..2 {
            if self.worker.is_none() {
                if let Err(e) = self.spawn_worker() {
                    warn!(task_id:% = id; "Could not spawn cipher worker: {e}");
                    let _ = reply.send(Err(TransformError::WorkerFault(format!(
                        "failed to spawn worker thread: {e}"
                    ))));
                    return;
                }
            }

            let Some(handle) = self.worker.as_ref() else { break };
            match handle.requests.send(request) {
                Ok(()) => {
                    self.in_flight = Some(InFlight { id, reply });
                    return;
                },
                Err(std_mpsc::SendError(returned)) => {
                    request = returned;
                    self.worker = None;
                },
            }
        }

        let _ = reply.send(Err(TransformError::WorkerExited));
    }

    fn spawn_worker(&mut self) -> std::io::Result<()> {
        let (request_tx, request_rx) = std_mpsc::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        self.workers_spawned += 1;
        worker::spawn(self.workers_spawned, Arc::clone(&self.cipher), request_rx, event_tx)?;

        info!(generation = self.workers_spawned; "Spawned cipher worker");
        self.worker = Some(WorkerHandle {
            requests: request_tx,
            events: event_rx,
        });
        Ok(())
    }

    fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Completed { id, outcome } => {
                let Some(in_flight) = self.in_flight.take() else {
                    warn!(task_id:% = id; "Worker response with nothing in flight, dropping");
                    return;
                };

                if in_flight.id != id {
                    // Correlation broke; fail the request rather than hand
                    // it another task's payload, and distrust the worker.
                    warn!(expected:% = in_flight.id, got:% = id; "Worker response correlation mismatch");
                    let _ = in_flight.reply.send(Err(TransformError::WorkerFault(format!(
                        "response correlation mismatch: expected task {}, got task {}",
                        in_flight.id, id
                    ))));
                    self.teardown_worker();
                    return;
                }

                debug!(task_id:% = id, declined = outcome.is_err(); "Transform settled");
                let _ = in_flight.reply.send(outcome.map_err(TransformError::Declined));
                self.tasks_settled += 1;

                if self.task_rx.is_empty() {
                    self.idle_deadline = Some(Instant::now() + self.idle_timeout);
                }
            },
            WorkerEvent::Fault { message } => {
                warn!("Cipher worker fault: {message}");
                if let Some(in_flight) = self.in_flight.take() {
                    let _ = in_flight.reply.send(Err(TransformError::WorkerFault(message)));
                }
                // The thread exits after a fault; drop the handle so the
                // next dispatch spawns a fresh worker.
                self.worker = None;
                self.idle_deadline = None;
            },
        }
    }

    /// The event channel closed without a fault: the thread is simply gone.
    /// Queued tasks are unaffected and respawn a worker on next dispatch.
    fn handle_worker_gone(&mut self) {
        warn!("Cipher worker exited unexpectedly");
        self.worker = None;
        self.idle_deadline = None;

        if let Some(in_flight) = self.in_flight.take() {
            let _ = in_flight.reply.send(Err(TransformError::WorkerExited));
        }
    }

    fn teardown_worker(&mut self) {
        if self.worker.take().is_some() {
            info!(tasks_settled = self.tasks_settled; "Cipher worker torn down");
        }
        self.idle_deadline = None;
    }

    /// Stops intake and settles everything already accepted before tearing
    /// the worker down.
    async fn drain_and_stop(&mut self) {
        info!(queued = self.task_rx.len(); "Cipher executor draining");
        self.task_rx.close();

        loop {
            if self.in_flight.is_some() {
                match next_event(&mut self.worker).await {
                    Some(event) => self.handle_worker_event(event),
                    None => self.handle_worker_gone(),
                }
            } else {
                match self.task_rx.recv().await {
                    Some(task) => self.dispatch(task),
                    None => break,
                }
            }
        }

        self.teardown_worker();
        info!(tasks_settled = self.tasks_settled; "Cipher executor stopped");
    }

    fn snapshot(&self) -> ExecutorStatus {
        ExecutorStatus {
            worker_alive: self.worker.is_some(),
            busy: self.in_flight.is_some(),
            queued: self.task_rx.len(),
            workers_spawned: self.workers_spawned,
            tasks_settled: self.tasks_settled,
        }
    }
}

async fn next_event(worker: &mut Option<WorkerHandle>) -> Option<WorkerEvent> {
    match worker {
        Some(handle) => handle.events.recv().await,
        None => std::future::pending().await,
    }
}

async fn idle_sleep(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
