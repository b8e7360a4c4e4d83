//! Draft session
//!
//! Owns everything autosave needs for one page load: the context, the
//! draft cache, the host form and the background saver. Setup sweeps
//! expired drafts and reconciles; the conflict actions (accept, ignore,
//! discard) and the confirmed-save signal act on the result.

use crate::context::AutosaveContext;
use crate::error::{AutosaveError, AutosaveResult};
use crate::host::FormHost;
use crate::metadata::MetadataSource;
use crate::readiness::EditorReadiness;
use crate::reconcile::{validate_transition, ReconcileOutcome, ReconcileState, Reconciler};
use crate::revert::RecoveryForm;
use crate::scheduler::{Autosaver, PeriodicSaver};
use formdraft_model::DraftRecord;
use formdraft_store::{DraftCache, DurableStore};
use std::fmt;
use std::sync::Arc;

/// What a discard did besides deleting the record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardOutcome {
    /// Page was asked to reload from the server
    pub reloaded: bool,
    /// Autosave started over the current content
    pub resumed: bool,
}

/// Autosave for one page load
pub struct DraftSession {
    ctx: Arc<AutosaveContext>,
    cache: Option<DraftCache>,
    form: Arc<dyn FormHost>,
    saver: PeriodicSaver,
    save_count: u32,
    csrf_token: Option<String>,
    state: ReconcileState,
    outcome: Option<ReconcileOutcome>,
}

impl DraftSession {
    /// Create session; `store` is `None` when no durable storage exists
    #[must_use]
    pub fn new(
        ctx: Arc<AutosaveContext>,
        store: Option<Arc<dyn DurableStore>>,
        form: Arc<dyn FormHost>,
    ) -> Self {
        let cache =
            store.map(|store| DraftCache::with_namespace(store, ctx.settings().namespace.clone()));
        Self {
            ctx,
            cache,
            form,
            saver: PeriodicSaver::new(),
            save_count: 1,
            csrf_token: None,
            state: ReconcileState::Init,
            outcome: None,
        }
    }

    /// Sweep, reconcile and start autosaving when the outcome allows it
    ///
    /// Runs once; later calls return the first outcome.
    pub async fn setup(
        &mut self,
        metadata: &dyn MetadataSource,
        readiness: &dyn EditorReadiness,
    ) -> ReconcileOutcome {
        if let Some(outcome) = self.outcome {
            tracing::debug!("Session for {} already set up", self.ctx.page());
            return outcome;
        }

        if let Some(cache) = &self.cache {
            match cache.prune(self.ctx.now(), self.ctx.settings().retention_secs) {
                Ok(report) if !report.removed.is_empty() => {
                    tracing::info!("Pruned {} expired drafts", report.removed.len());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Draft sweep failed: {}", e),
            }
            if self.ctx.config().save_acknowledged {
                tracing::debug!("Save acknowledged, clearing draft for {}", self.ctx.page());
                if let Err(e) = cache.remove(self.ctx.page()) {
                    tracing::warn!("Could not clear acknowledged draft: {}", e);
                }
            }
        }

        self.csrf_token = self.form.csrf_token(&self.ctx.settings().csrf_field);

        let reconciliation = Reconciler::new(&self.ctx, self.cache.as_ref(), self.form.as_ref())
            .run(metadata, readiness)
            .await;

        self.save_count = reconciliation
            .stored
            .as_ref()
            .map_or(1, |d| d.save_count.saturating_add(1));
        self.state = reconciliation.outcome.state();
        self.outcome = Some(reconciliation.outcome);

        if reconciliation.outcome == ReconcileOutcome::Resume {
            self.start_saving();
        }
        reconciliation.outcome
    }

    /// Revert to the stored draft by submitting a rebuilt form
    ///
    /// The token is re-read from the page; the one seen at setup is used
    /// if the field has since gone. The host navigates away on success;
    /// submission errors are the host's to handle and are returned unchanged.
    pub fn accept_draft(&self) -> AutosaveResult<()> {
        if self.state != ReconcileState::Prompting {
            return Err(AutosaveError::NotPrompting(self.state));
        }
        let cache = self.cache()?;
        let draft = cache
            .load(self.ctx.page())?
            .ok_or_else(|| AutosaveError::NoDraft(self.ctx.page().to_string()))?;

        let settings = self.ctx.settings();
        let token = self
            .form
            .csrf_token(&settings.csrf_field)
            .or_else(|| self.csrf_token.clone());
        let form = RecoveryForm::build(
            self.form.controls(),
            &draft.form_values,
            token.as_deref(),
            settings,
        );
        tracing::info!(
            "Reverting {} to draft saved at {}",
            self.ctx.page(),
            draft.timestamp
        );
        self.form.submit(form)?;
        Ok(())
    }

    /// Keep the live content: save it now and resume autosaving
    pub fn ignore_draft(&mut self) -> AutosaveResult<DraftRecord> {
        validate_transition(self.state, ReconcileState::Resuming)?;
        let record = self.autosaver()?.save_once()?;
        self.state = ReconcileState::Resuming;
        self.start_saving();
        tracing::info!("Draft for {} ignored, live content kept", self.ctx.page());
        Ok(record)
    }

    /// Delete the stored draft
    ///
    /// A page showing recovered content is reloaded. A pending conflict is
    /// resolved in favour of the live content.
    pub fn discard_draft(&mut self) -> AutosaveResult<DiscardOutcome> {
        self.cache()?.remove(self.ctx.page())?;
        tracing::info!("Draft for {} discarded", self.ctx.page());

        let mut outcome = DiscardOutcome::default();
        if self.ctx.config().is_recovered_autosave {
            self.saver.cancel();
            self.form.reload();
            outcome.reloaded = true;
        } else if self.state == ReconcileState::Prompting {
            self.state = ReconcileState::Resuming;
            outcome.resumed = self.start_saving();
        }
        Ok(outcome)
    }

    /// Stop autosaving and delete the stored draft
    pub fn clear(&mut self) -> AutosaveResult<()> {
        self.saver.cancel();
        self.cache()?.remove(self.ctx.page())?;
        tracing::debug!("Autosave cleared for {}", self.ctx.page());
        Ok(())
    }

    /// Server confirmed a save; the draft is superseded
    pub fn acknowledge_save(&self) -> AutosaveResult<()> {
        self.cache()?.remove(self.ctx.page())?;
        tracing::debug!("Save acknowledged for {}", self.ctx.page());
        Ok(())
    }

    /// Save the current content immediately
    pub fn save_now(&self) -> AutosaveResult<DraftRecord> {
        Ok(self.autosaver()?.save_once()?)
    }

    /// Stop the background saver, keeping the stored draft
    pub fn shutdown(&mut self) {
        self.saver.cancel();
    }

    /// Current reconciliation state
    #[inline]
    #[must_use]
    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Setup outcome, once set up
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> Option<ReconcileOutcome> {
        self.outcome
    }

    /// Load counter written into every record
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> u32 {
        self.save_count
    }

    /// Check if the background saver is running
    #[inline]
    #[must_use]
    pub fn is_autosaving(&self) -> bool {
        self.saver.is_running()
    }

    /// Shared context
    #[inline]
    #[must_use]
    pub fn context(&self) -> &AutosaveContext {
        &self.ctx
    }

    fn cache(&self) -> AutosaveResult<&DraftCache> {
        self.cache.as_ref().ok_or(AutosaveError::CapabilityMissing)
    }

    fn autosaver(&self) -> AutosaveResult<Autosaver> {
        Ok(Autosaver::new(
            self.ctx.clone(),
            self.cache()?.clone(),
            self.form.clone(),
            self.save_count,
        ))
    }

    fn start_saving(&mut self) -> bool {
        match self.autosaver() {
            Ok(saver) => self.saver.start(saver),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftSession")
            .field("ctx", &self.ctx)
            .field("cache", &self.cache)
            .field("save_count", &self.save_count)
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FormControl;
    use crate::clock::ManualClock;
    use crate::config::{EngineSettings, PageConfig};
    use crate::host::StaticForm;
    use crate::metadata::StaticMetadata;
    use crate::readiness::AlwaysReady;
    use crate::reconcile::AbortReason;
    use formdraft_model::{PageIdentity, Snapshot, CSRF_FIELD};
    use formdraft_store::MemoryStore;

    const PAGE: &str = "/story/1/change/";

    struct Fixture {
        session: DraftSession,
        cache: DraftCache,
        form: Arc<StaticForm>,
    }

    fn fixture(config: PageConfig, now: i64, title: &str) -> Fixture {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let ctx = Arc::new(AutosaveContext::with_clock(
            PageIdentity::new(PAGE),
            config,
            EngineSettings::default(),
            Arc::new(ManualClock::new(now)),
        ));
        let form = Arc::new(StaticForm::new(vec![
            FormControl::hidden(CSRF_FIELD, "page-token"),
            FormControl::input("title", title),
        ]));
        Fixture {
            session: DraftSession::new(ctx, Some(store.clone()), form.clone()),
            cache: DraftCache::new(store),
            form,
        }
    }

    fn seed(cache: &DraftCache, title: &str, ts: i64, count: u32) {
        let record = DraftRecord::new(Snapshot::new().with_field("title", title), ts, count);
        cache.store_record(&PageIdentity::new(PAGE), &record).unwrap();
    }

    async fn run_setup(session: &mut DraftSession, config: &PageConfig) -> ReconcileOutcome {
        session
            .setup(&StaticMetadata::from_config(config), &AlwaysReady)
            .await
    }

    #[tokio::test]
    async fn conflicting_draft_prompts_without_saving() {
        let config = PageConfig::new().with_last_updated(1_000).with_client_time_offset(0);
        let mut fx = fixture(config.clone(), 2_100, "Live");
        seed(&fx.cache, "Draft", 2_000, 4);

        let outcome = run_setup(&mut fx.session, &config).await;
        assert_eq!(outcome, ReconcileOutcome::PromptConflict { draft_timestamp: 2_000 });
        assert_eq!(fx.session.state(), ReconcileState::Prompting);
        assert_eq!(fx.session.save_count(), 5);
        assert!(!fx.session.is_autosaving());
    }

    #[tokio::test]
    async fn accept_submits_the_draft_with_a_fresh_token() {
        let config = PageConfig::new().with_last_updated(1_000).with_client_time_offset(0);
        let mut fx = fixture(config.clone(), 2_100, "Live");
        seed(&fx.cache, "Draft", 2_000, 1);
        run_setup(&mut fx.session, &config).await;

        fx.session.accept_draft().unwrap();
        let submitted = fx.form.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(
            submitted[0].payload(),
            vec![
                (CSRF_FIELD.to_string(), "page-token".to_string()),
                ("title".to_string(), "Draft".to_string()),
                ("is_retrieved_from_autosave".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn ignore_overwrites_the_draft_and_resumes() {
        let config = PageConfig::new().with_last_updated(1_000).with_client_time_offset(0);
        let mut fx = fixture(config.clone(), 2_100, "Live");
        seed(&fx.cache, "Draft", 2_000, 1);
        run_setup(&mut fx.session, &config).await;

        let record = fx.session.ignore_draft().unwrap();
        assert_eq!(record.timestamp, 2_100);
        assert_eq!(record.form_values, Snapshot::new().with_field("title", "Live"));
        assert_eq!(fx.session.state(), ReconcileState::Resuming);
        assert!(fx.session.is_autosaving());

        assert!(matches!(
            fx.session.ignore_draft(),
            Err(AutosaveError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn accept_outside_a_conflict_is_refused() {
        let config = PageConfig::new().add_view();
        let mut fx = fixture(config.clone(), 100, "Live");
        assert_eq!(run_setup(&mut fx.session, &config).await, ReconcileOutcome::Resume);

        assert!(matches!(
            fx.session.accept_draft(),
            Err(AutosaveError::NotPrompting(ReconcileState::Resuming))
        ));
        assert!(fx.form.submitted().is_empty());
    }

    #[tokio::test]
    async fn discard_on_recovered_page_reloads() {
        let config = PageConfig::new().with_last_updated(1_000).recovered();
        let mut fx = fixture(config.clone(), 2_100, "Draft");
        seed(&fx.cache, "Draft", 2_000, 1);

        assert_eq!(
            run_setup(&mut fx.session, &config).await,
            ReconcileOutcome::Abort(AbortReason::RecoveredAutosave)
        );
        let outcome = fx.session.discard_draft().unwrap();
        assert!(outcome.reloaded);
        assert_eq!(fx.form.reloads(), 1);
        assert!(fx.cache.load(&PageIdentity::new(PAGE)).unwrap().is_none());
    }

    #[tokio::test]
    async fn acknowledged_save_clears_the_draft_before_reconciling() {
        let config = PageConfig::new()
            .with_last_updated(1_000)
            .with_client_time_offset(0)
            .acknowledged();
        let mut fx = fixture(config.clone(), 2_100, "Live");
        seed(&fx.cache, "Draft", 2_000, 7);

        assert_eq!(run_setup(&mut fx.session, &config).await, ReconcileOutcome::Resume);
        assert_eq!(fx.session.save_count(), 1);
        fx.session.shutdown();
    }

    #[tokio::test]
    async fn missing_storage_disables_everything() {
        let config = PageConfig::new().add_view();
        let ctx = Arc::new(AutosaveContext::new(
            PageIdentity::new(PAGE),
            config.clone(),
            EngineSettings::default(),
        ));
        let mut session = DraftSession::new(ctx, None, Arc::new(StaticForm::default()));

        assert_eq!(
            run_setup(&mut session, &config).await,
            ReconcileOutcome::Abort(AbortReason::CapabilityMissing)
        );
        assert!(!session.is_autosaving());
        assert!(matches!(session.save_now(), Err(AutosaveError::CapabilityMissing)));
    }
}
