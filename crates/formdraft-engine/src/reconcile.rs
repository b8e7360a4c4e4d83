//! Draft reconciliation
//!
//! One pass per page load decides whether the stored draft is stale, newer
//! but identical, or newer and different from what the page shows:
//!
//! ```text
//! Init ──> Checked ──> Resuming
//!   │         ├──────> Prompting ──(ignore)──> Resuming
//!   └─────────┴──────> Aborted
//! ```
//!
//! Prompts are reserved for genuine divergence: a draft that is not newer
//! than server state, or newer but equal to the live form, resumes silently.

use crate::capture::capture;
use crate::clock::StalenessPolicy;
use crate::context::AutosaveContext;
use crate::error::AutosaveError;
use crate::host::FormHost;
use crate::metadata::MetadataSource;
use crate::readiness::{wait_for_editor, EditorReadiness};
use chrono::{DateTime, Utc};
use formdraft_model::{DraftRecord, Snapshot};
use formdraft_store::DraftCache;
use std::fmt::{self, Display, Formatter};

/// Reconciliation states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileState {
    /// Nothing decided yet
    Init,
    /// Server time and stored draft are known
    Checked,
    /// Autosaving over the stored draft
    Resuming,
    /// Waiting for the user to pick a version
    Prompting,
    /// Autosave disabled for this page load
    Aborted,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ReconcileState) -> Vec<ReconcileState> {
    use ReconcileState::{Aborted, Checked, Init, Prompting, Resuming};
    match from {
        Init => vec![Checked, Aborted],
        Checked => vec![Resuming, Prompting, Aborted],
        Prompting => vec![Resuming],
        Resuming | Aborted => vec![],
    }
}

/// Validate a state transition
pub fn validate_transition(from: ReconcileState, to: ReconcileState) -> Result<(), AutosaveError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(AutosaveError::IllegalTransition { from, to })
    }
}

/// Why autosave was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// No durable storage
    CapabilityMissing,
    /// Page was rendered from a recovery submission
    RecoveredAutosave,
    /// Server state is ambiguous or unreachable
    MetadataUnavailable,
    /// Storage failed while reading the draft
    StoreFailure,
}

/// Result of reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Start autosaving over the stored draft
    Resume,
    /// Ask the user; the draft was saved at `draft_timestamp`
    PromptConflict {
        /// Unix seconds of the stored draft
        draft_timestamp: i64,
    },
    /// Do not autosave, do not prompt
    Abort(AbortReason),
}

impl ReconcileOutcome {
    /// Terminal state for this outcome
    #[inline]
    #[must_use]
    pub fn state(&self) -> ReconcileState {
        match self {
            Self::Resume => ReconcileState::Resuming,
            Self::PromptConflict { .. } => ReconcileState::Prompting,
            Self::Abort(_) => ReconcileState::Aborted,
        }
    }

    /// Prompt to show, if any
    #[inline]
    #[must_use]
    pub fn prompt(&self) -> Option<ConflictPrompt> {
        match self {
            Self::PromptConflict { draft_timestamp } => Some(ConflictPrompt::new(*draft_timestamp)),
            _ => None,
        }
    }
}

/// Decide the outcome for a stored draft against the live form
///
/// No draft resumes. A draft that is not newer than `effective_server_time`
/// resumes regardless of content. A newer draft prompts only if it differs
/// from `current` (ignoring `ignored_field`).
#[must_use]
pub fn decide(
    draft: Option<&DraftRecord>,
    effective_server_time: i64,
    current: &Snapshot,
    ignored_field: &str,
) -> ReconcileOutcome {
    let Some(draft) = draft else {
        return ReconcileOutcome::Resume;
    };
    if !StalenessPolicy::draft_is_newer(draft.timestamp, effective_server_time) {
        return ReconcileOutcome::Resume;
    }
    if draft.form_values.differs_from_ignoring(current, ignored_field) {
        ReconcileOutcome::PromptConflict {
            draft_timestamp: draft.timestamp,
        }
    } else {
        ReconcileOutcome::Resume
    }
}

/// Text of the user-facing conflict choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictPrompt {
    /// Unix seconds of the stored draft
    pub draft_timestamp: i64,
}

impl ConflictPrompt {
    /// Create prompt
    #[inline]
    #[must_use]
    pub fn new(draft_timestamp: i64) -> Self {
        Self { draft_timestamp }
    }

    /// Draft time as a UTC datetime
    #[inline]
    #[must_use]
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.draft_timestamp, 0)
    }
}

impl Display for ConflictPrompt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let when = self.saved_at().map_or_else(
            || self.draft_timestamp.to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        write!(
            f,
            "It looks like you have a more recent version autosaved at {when}. \
             Revert to that or continue with this version?"
        )
    }
}

/// Everything one reconciliation pass produced
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Decision
    pub outcome: ReconcileOutcome,
    /// Draft found in the cache, if it was read
    pub stored: Option<DraftRecord>,
    /// States visited, in order
    pub trail: Vec<ReconcileState>,
}

/// Single-use driver for one reconciliation pass
pub struct Reconciler<'a> {
    ctx: &'a AutosaveContext,
    cache: Option<&'a DraftCache>,
    form: &'a dyn FormHost,
    state: ReconcileState,
    trail: Vec<ReconcileState>,
}

impl<'a> Reconciler<'a> {
    /// Create reconciler; `cache` is `None` when no durable storage exists
    #[must_use]
    pub fn new(
        ctx: &'a AutosaveContext,
        cache: Option<&'a DraftCache>,
        form: &'a dyn FormHost,
    ) -> Self {
        Self {
            ctx,
            cache,
            form,
            state: ReconcileState::Init,
            trail: vec![ReconcileState::Init],
        }
    }

    /// Run the pass
    ///
    /// Waits once on `metadata` and, only when a newer draft has to be
    /// compared with the live form, once on `readiness` (bounded by the
    /// configured ceiling). An add view the server has no timestamp for
    /// always resumes.
    pub async fn run(
        mut self,
        metadata: &dyn MetadataSource,
        readiness: &dyn EditorReadiness,
    ) -> Reconciliation {
        let ctx = self.ctx;
        let page = ctx.page();

        let Some(cache) = self.cache else {
            tracing::debug!("No durable storage, autosave disabled for {}", page);
            return self.abort(AbortReason::CapabilityMissing);
        };
        if ctx.config().is_recovered_autosave {
            tracing::debug!("{} shows recovered content, not reconciling", page);
            return self.abort(AbortReason::RecoveredAutosave);
        }

        let effective = match metadata.fetch(page).await {
            Ok(meta) => match ctx.staleness_policy().effective_server_time(meta) {
                Ok(effective) => effective,
                Err(e) => {
                    tracing::warn!("Not autosaving {}: {}", page, e);
                    return self.abort(AbortReason::MetadataUnavailable);
                }
            },
            Err(e) => {
                tracing::warn!("Not autosaving {}: metadata fetch failed: {}", page, e);
                return self.abort(AbortReason::MetadataUnavailable);
            }
        };

        let stored = match cache.load_or_discard(page) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Not autosaving {}: {}", page, e);
                return self.abort(AbortReason::StoreFailure);
            }
        };
        self.advance(ReconcileState::Checked);

        let outcome = match (&stored, effective) {
            (Some(draft), Some(effective))
                if StalenessPolicy::draft_is_newer(draft.timestamp, effective) =>
            {
                let settings = ctx.settings();
                wait_for_editor(readiness, settings.editor_ready_timeout()).await;
                let current = capture(&self.form.controls(), &settings.csrf_field);
                decide(Some(draft), effective, &current, &settings.csrf_field)
            }
            _ => ReconcileOutcome::Resume,
        };

        tracing::debug!(
            "Reconciled {}: draft at {:?}, effective server time {:?}",
            page,
            stored.as_ref().map(|d| d.timestamp),
            effective
        );
        self.finish(outcome, stored)
    }

    fn advance(&mut self, to: ReconcileState) {
        debug_assert!(
            validate_transition(self.state, to).is_ok(),
            "illegal reconcile transition {:?} -> {:?}",
            self.state,
            to
        );
        self.state = to;
        self.trail.push(to);
    }

    fn abort(self, reason: AbortReason) -> Reconciliation {
        self.finish(ReconcileOutcome::Abort(reason), None)
    }

    fn finish(mut self, outcome: ReconcileOutcome, stored: Option<DraftRecord>) -> Reconciliation {
        self.advance(outcome.state());
        tracing::info!("Reconciliation for {} resolved to {:?}", self.ctx.page(), outcome);
        Reconciliation {
            outcome,
            stored,
            trail: self.trail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdraft_model::CSRF_FIELD;

    fn draft(ts: i64, title: &str) -> DraftRecord {
        DraftRecord::new(Snapshot::new().with_field("title", title), ts, 1)
    }

    fn live(title: &str) -> Snapshot {
        Snapshot::new().with_field("title", title)
    }

    #[test]
    fn transitions_follow_the_diagram() {
        use ReconcileState::*;
        assert!(validate_transition(Init, Checked).is_ok());
        assert!(validate_transition(Init, Aborted).is_ok());
        assert!(validate_transition(Checked, Prompting).is_ok());
        assert!(validate_transition(Prompting, Resuming).is_ok());

        assert!(validate_transition(Init, Resuming).is_err());
        assert!(validate_transition(Aborted, Resuming).is_err());
        assert!(validate_transition(Resuming, Prompting).is_err());
    }

    #[test]
    fn no_draft_resumes() {
        assert_eq!(decide(None, -1_000, &live("x"), CSRF_FIELD), ReconcileOutcome::Resume);
    }

    #[test]
    fn older_draft_resumes_even_if_different() {
        let d = draft(100, "Draft");
        assert_eq!(decide(Some(&d), 101, &live("Live"), CSRF_FIELD), ReconcileOutcome::Resume);
    }

    #[test]
    fn tie_resumes() {
        let d = draft(100, "Draft");
        assert_eq!(decide(Some(&d), 100, &live("Live"), CSRF_FIELD), ReconcileOutcome::Resume);
    }

    #[test]
    fn newer_identical_draft_resumes() {
        let d = draft(100, "Same");
        assert_eq!(decide(Some(&d), 99, &live("Same"), CSRF_FIELD), ReconcileOutcome::Resume);
    }

    #[test]
    fn newer_different_draft_prompts() {
        let d = draft(2000, "Draft");
        assert_eq!(
            decide(Some(&d), 1015, &live("Live"), CSRF_FIELD),
            ReconcileOutcome::PromptConflict {
                draft_timestamp: 2000
            }
        );
    }

    #[test]
    fn prompt_text_names_the_draft_time() {
        let prompt = ConflictPrompt::new(0);
        let text = prompt.to_string();
        assert!(text.contains("1970-01-01 00:00:00 UTC"));
        assert!(text.contains("Revert to that"));
    }

    #[test]
    fn outcome_maps_to_terminal_state() {
        assert_eq!(ReconcileOutcome::Resume.state(), ReconcileState::Resuming);
        assert_eq!(
            ReconcileOutcome::Abort(AbortReason::StoreFailure).state(),
            ReconcileState::Aborted
        );
        assert!(ReconcileOutcome::PromptConflict { draft_timestamp: 5 }
            .prompt()
            .is_some());
    }
}
