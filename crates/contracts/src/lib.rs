//! # Contracts
//!
//! Frozen interface contracts shared by every hub crate: the message and device data model,
//! the processing/publishing seams, typed outcomes and the hub configuration.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Message model
//! - A `Message` is produced by the transport and immutable once enqueued
//! - `MessageType` resolves from the `MessageType` header; unmatched strings map to
//!   `MessageType::Unsupported`, blank headers do not resolve at all
//! - `SourceType` tags provenance and is used to drop self-echo in bridged deployments

mod device;
mod error;
mod hub_config;
mod message;
mod outcome;
mod processor;
mod publisher;

pub use device::*;
pub use error::*;
pub use hub_config::*;
pub use message::*;
pub use outcome::*;
pub use processor::Processor;
pub use publisher::Publisher;
