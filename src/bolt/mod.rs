//! Bolt wire protocol.
//!
//! Everything needed to speak the Bolt binary protocol from the client
//! side:
//!
//! - [`packstream`] - value serialization
//! - [`message`] - request/response message types
//! - [`handshake`] - magic preamble and version negotiation
//! - [`codec`] - chunked message framing for tokio
//! - [`error`] - wire-level error types
//!
//! Most users should stay on the [`crate::driver`] module; this layer is
//! exposed for tooling and tests that need raw protocol access.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use codec::{BoltClientCodec, BoltCodec, BoltServerCodec};
pub use error::{BoltError, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, BOLT_MAGIC, HANDSHAKE_REQUEST_SIZE, HANDSHAKE_RESPONSE_SIZE};
pub use message::{
    AccessMode, AuthToken, BeginMessage, BoltRequest, BoltResponse, DiscardMessage,
    FailureMessage, HelloMessage, PullMessage, RecordMessage, RunMessage, SuccessMessage,
    TransactionType,
};
pub use packstream::{PackStreamError, PackStreamStructure, PackStreamValue};
