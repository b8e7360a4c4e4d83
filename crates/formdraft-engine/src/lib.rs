//! Form Draft Engine
//!
//! Client-side draft synchronization for long-form editing pages: the form
//! is autosaved to durable local storage, reconciled against the server's
//! last-modified time on the next load, and the user is offered a choice only
//! when the draft is both newer and genuinely different.
//!
//! # Architecture
//!
//! ```text
//! DraftSession::setup
//!   ├── DraftCache::prune            (expired drafts never prompt)
//!   ├── Reconciler::run
//!   │     ├── MetadataSource::fetch  -> StalenessPolicy
//!   │     ├── EditorReadiness        (bounded wait)
//!   │     └── capture + decide       -> Resume | PromptConflict | Abort
//!   └── PeriodicSaver::start         (on Resume)
//!
//! accept_draft  -> RecoveryForm::build -> FormHost::submit
//! ignore_draft  -> save now, PeriodicSaver::start
//! discard_draft -> remove record, reload recovered pages
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use formdraft_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(AutosaveContext::new(page, config.clone(), EngineSettings::default()));
//! let mut session = DraftSession::new(ctx, Some(Arc::new(MemoryStore::new())), form);
//!
//! match session.setup(&StaticMetadata::from_config(&config), &AlwaysReady).await {
//!     ReconcileOutcome::PromptConflict { draft_timestamp } => show(ConflictPrompt::new(draft_timestamp)),
//!     _ => {}
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod capture;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod metadata;
pub mod readiness;
pub mod reconcile;
pub mod revert;
pub mod scheduler;
pub mod session;

pub use capture::{capture, ControlKind, FormControl, RichTextWidget, ValueSource};
pub use clock::{Clock, ManualClock, StalenessPolicy, SystemClock};
pub use config::{EngineSettings, PageConfig};
pub use context::AutosaveContext;
pub use error::{AutosaveError, AutosaveResult, ConfigError, MetadataError, SubmissionError};
pub use host::{FormHost, StaticForm};
pub use metadata::{HttpMetadataSource, MetadataSource, StaticMetadata, LAST_MODIFIED_ENDPOINT};
pub use readiness::{wait_for_editor, AlwaysReady, EditorReadiness, ReadySignal, ReadyWaiter};
pub use reconcile::{
    decide, AbortReason, ConflictPrompt, ReconcileOutcome, ReconcileState, Reconciler,
    Reconciliation,
};
pub use revert::RecoveryForm;
pub use scheduler::{Autosaver, PeriodicSaver};
pub use session::{DiscardOutcome, DraftSession};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a draft session
    pub use crate::capture::{FormControl, RichTextWidget};
    pub use crate::config::{EngineSettings, PageConfig};
    pub use crate::context::AutosaveContext;
    pub use crate::error::{AutosaveError, AutosaveResult};
    pub use crate::host::FormHost;
    pub use crate::metadata::{HttpMetadataSource, MetadataSource, StaticMetadata};
    pub use crate::readiness::{AlwaysReady, EditorReadiness, ReadySignal};
    pub use crate::reconcile::{AbortReason, ConflictPrompt, ReconcileOutcome};
    pub use crate::session::DraftSession;
    pub use formdraft_model::{PageIdentity, Snapshot};
    pub use formdraft_store::{DurableStore, FileStore, MemoryStore};
}
