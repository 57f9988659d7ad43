use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::cipher::protocol::{CipherOp, TransformRequest, WorkerEvent};
use crate::cipher::transform::{CipherError, SecretCipher};

/// Spawns the worker execution unit: a dedicated OS thread that performs one
/// transform per request and reports each result on the event channel, in
/// request order, echoing the request id.
///
/// The thread exits when the request sender is dropped (orderly teardown) or
/// after reporting a fault; either way the event channel closes behind it.
pub(crate) fn spawn(
    generation: u64,
    cipher: Arc<dyn SecretCipher>,
    requests: Receiver<TransformRequest>,
    events: UnboundedSender<WorkerEvent>,
) -> std::io::Result<()> {
    thread::Builder::new()
        .name(format!("cipher-worker-{generation}"))
        .spawn(move || run(cipher, requests, events))
        .map(|_| ())
}

fn run(cipher: Arc<dyn SecretCipher>, requests: Receiver<TransformRequest>, events: UnboundedSender<WorkerEvent>) {
    debug!("Cipher worker started");

    while let Ok(TransformRequest { id, op, payload }) = requests.recv() {
        match catch_unwind(AssertUnwindSafe(|| apply(cipher.as_ref(), op, &payload))) {
            Ok(outcome) => {
                let outcome = outcome.map_err(|e| e.to_string());
                if events.send(WorkerEvent::Completed { id, outcome }).is_err() {
                    break;
                }
            },
            Err(panic) => {
                warn!(task_id:% = id, op:% = op; "Cipher worker panicked during transform");
                let _ = events.send(WorkerEvent::Fault {
                    message: panic_message(panic),
                });
                return;
            },
        }
    }

    debug!("Cipher worker stopped");
}

fn apply(cipher: &dyn SecretCipher, op: CipherOp, payload: &str) -> Result<String, CipherError> {
    match op {
        CipherOp::Encrypt => cipher.encrypt(payload),
        CipherOp::Decrypt => cipher.decrypt(payload),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::protocol::TaskId;

    struct EchoCipher;

    impl SecretCipher for EchoCipher {
        fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
            if plaintext == "panic" {
                panic!("boom");
            }
            Ok(format!("enc:{plaintext}"))
        }

        fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
            ciphertext
                .strip_prefix("enc:")
                .map(str::to_string)
                .ok_or_else(|| CipherError::Decrypt("missing prefix".to_string()))
        }
    }

    fn start_worker() -> (
        std::sync::mpsc::Sender<TransformRequest>,
        tokio::sync::mpsc::UnboundedReceiver<WorkerEvent>,
    ) {
        let (request_tx, request_rx) = std::sync::mpsc::channel();
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        spawn(1, Arc::new(EchoCipher), request_rx, event_tx).unwrap();
        (request_tx, event_rx)
    }

    #[tokio::test]
    async fn echoes_request_ids_in_order() {
        let (request_tx, mut event_rx) = start_worker();

        for id in 1..=3u64 {
            request_tx
                .send(TransformRequest {
                    id: TaskId(id),
                    op: CipherOp::Encrypt,
                    payload: format!("p{id}"),
                })
                .unwrap();
        }

        for id in 1..=3u64 {
            match event_rx.recv().await.unwrap() {
                WorkerEvent::Completed { id: got, outcome } => {
                    assert_eq!(got, TaskId(id));
                    assert_eq!(outcome.unwrap(), format!("enc:p{id}"));
                },
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn decline_is_reported_on_the_completion_channel() {
        let (request_tx, mut event_rx) = start_worker();

        request_tx
            .send(TransformRequest {
                id: TaskId(7),
                op: CipherOp::Decrypt,
                payload: "garbage".to_string(),
            })
            .unwrap();

        match event_rx.recv().await.unwrap() {
            WorkerEvent::Completed { id, outcome } => {
                assert_eq!(id, TaskId(7));
                assert!(outcome.unwrap_err().contains("missing prefix"));
            },
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn panic_sends_fault_then_closes_channel() {
        let (request_tx, mut event_rx) = start_worker();

        request_tx
            .send(TransformRequest {
                id: TaskId(1),
                op: CipherOp::Encrypt,
                payload: "panic".to_string(),
            })
            .unwrap();

        match event_rx.recv().await.unwrap() {
            WorkerEvent::Fault { message } => assert!(message.contains("boom")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(event_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_sender_stops_the_worker() {
        let (request_tx, mut event_rx) = start_worker();

        drop(request_tx);
        assert!(event_rx.recv().await.is_none());
    }
}
