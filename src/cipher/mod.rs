//! Serialized offload executor for secret-material transforms.
//!
//! Callers submit encrypt/decrypt requests from async context; a single
//! manager loop queues them and feeds a lone worker thread one request at a
//! time, so tickets settle in submission order. The worker thread is
//! spawned on first use, torn down after a configurable idle window and
//! replaced transparently if it crashes. The cipher itself is an opaque
//! [`SecretCipher`] implementation chosen at construction time.

mod executor;
mod manager;
mod protocol;
mod worker;

pub mod error;
pub mod transform;

pub use error::TransformError;
pub use executor::{CipherExecutor, ExecutorConfig, ExecutorStatus, TransformTicket};
pub use protocol::{CipherOp, TaskId};
pub use transform::{CipherError, SecretCipher, XChaChaCipher};
