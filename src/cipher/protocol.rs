use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cipher::error::TransformError;

/// Correlation identifier assigned at submission time and echoed back by the
/// worker in its response. Monotonic per executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two supported transform kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherOp {
    Encrypt,
    Decrypt,
}

impl std::fmt::Display for CipherOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherOp::Encrypt => write!(f, "encrypt"),
            CipherOp::Decrypt => write!(f, "decrypt"),
        }
    }
}

impl FromStr for CipherOp {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encrypt" => Ok(CipherOp::Encrypt),
            "decrypt" => Ok(CipherOp::Decrypt),
            _ => Err(TransformError::UnsupportedAction(s.to_string())),
        }
    }
}

/// One request handed to the worker. The worker must answer each request
/// exactly once, echoing `id`, in the order requests were received.
#[derive(Debug)]
pub struct TransformRequest {
    pub id: TaskId,
    pub op: CipherOp,
    pub payload: String,
}

/// Worker-to-manager messages. Termination without a preceding [`Fault`] is
/// signalled by the event channel closing, not by a variant.
///
/// [`Fault`]: WorkerEvent::Fault
#[derive(Debug)]
pub enum WorkerEvent {
    /// The transform ran. `Err` carries the cipher's reason for declining
    /// the payload; the request itself was still well-formed.
    Completed {
        id: TaskId,
        outcome: Result<String, String>,
    },
    /// The transform panicked. Sent once, then the worker thread exits.
    Fault { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_op_parses_known_actions() {
        assert_eq!("encrypt".parse::<CipherOp>().unwrap(), CipherOp::Encrypt);
        assert_eq!("decrypt".parse::<CipherOp>().unwrap(), CipherOp::Decrypt);
    }

    #[test]
    fn unknown_action_is_a_soft_error() {
        let err = "shuffle".parse::<CipherOp>().unwrap_err();
        assert_eq!(err, TransformError::UnsupportedAction("shuffle".to_string()));
        assert!(err.is_declined());
    }

    #[test]
    fn cipher_op_display_matches_wire_form() {
        assert_eq!(CipherOp::Encrypt.to_string(), "encrypt");
        assert_eq!(CipherOp::Decrypt.to_string(), "decrypt");
    }
}
