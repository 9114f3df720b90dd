//! Signature workflow engine.
//!
//! This crate ties the provider client to the host workflow:
//!
//! - [`state_machine`]: pure mapping from provider status to local status
//! - [`poller`]: one status check per trigger, with a polling timeout
//! - [`bridge`]: reads and writes the host's process fields
//! - [`document`]: resolves document ids to base64 content
//! - [`hooks`]: the `submit` and `poll` entry points the host invokes
//!
//! # Example
//!
//! ```ignore
//! use signflow_engine::{HookContext, SignatureHooks};
//!
//! let hooks = SignatureHooks::new(config, services);
//! let advance = hooks.poll_blocking(&HookContext::for_instance("1042"));
//! ```

pub mod bridge;
pub mod document;
pub mod hooks;
pub mod poller;
pub mod state_machine;

pub use bridge::{FieldStore, FieldStoreError, JsonFileFieldStore, MemoryFieldStore, ProcessStateBridge, SIGNER_SEPARATOR};
pub use document::{DirectoryDocumentSource, DocumentSource, DocumentSourceError, MemoryDocumentSource};
pub use hooks::{HookContext, HookFailure, HookReport, HookServices, SignatureHooks};
pub use poller::{PollOutcome, StatusPoller};
pub use state_machine::{FailureReason, LocalStatus, is_recognized_status, map_provider_status};
