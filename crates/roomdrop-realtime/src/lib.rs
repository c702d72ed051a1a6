//! # roomdrop-realtime
//!
//! In-process realtime plumbing: the [`EventBus`] fanning room lifecycle
//! events out to transports, and the [`DirectTransferRelay`] pairing an
//! anonymous sender and receiver for a one-shot streamed transfer.

pub mod bus;
pub mod relay;

pub use bus::{EventBus, Subscription};
pub use relay::{DirectTransferRelay, TRANSFER_CODE_LEN};
