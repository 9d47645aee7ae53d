//! The editor session state machine
//!
//! A session owns the working copy of one template. Edits are applied
//! synchronously; rendering and saving are split into a request the session
//! hands out and a reply it later accepts, so the host decides where the
//! slow work runs and edits can keep flowing while it does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mailmake::{RenderPipeline, RenderResult, Template, TemplateIdentity};
use mailmake_registry::{RegistryError, TemplateStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::navigation::{HistoryMode, NavigationTarget, Navigator};
use crate::notice::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for a persisted template to load
    Loading,
    /// A working copy is available
    Editing,
    /// The template does not exist; the session is finished
    Redirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Markup and preview side by side
    #[default]
    Split,
    PreviewOnly,
}

impl ViewMode {
    fn toggled(self) -> Self {
        match self {
            ViewMode::Split => ViewMode::PreviewOnly,
            ViewMode::PreviewOnly => ViewMode::Split,
        }
    }
}

/// The render currently on display
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// Content version the result was computed for
    pub version: u64,
    pub result: RenderResult,
}

/// Markup to render for a given content version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub version: u64,
    pub markup: String,
}

impl RenderRequest {
    pub fn execute(self, pipeline: &RenderPipeline) -> RenderReply {
        RenderReply {
            version: self.version,
            result: pipeline.render(&self.markup),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReply {
    pub version: u64,
    pub result: RenderResult,
}

/// Clears the session's saving flag when the save it belongs to ends,
/// however it ends
#[derive(Debug)]
struct SavingGuard(Arc<AtomicBool>);

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A save that has been started but not yet sent to the store
#[derive(Debug)]
pub struct PendingSave {
    snapshot: Template,
    guard: SavingGuard,
}

impl PendingSave {
    /// The working copy as it was when the save began
    pub fn snapshot(&self) -> &Template {
        &self.snapshot
    }

    /// Persist the snapshot
    pub async fn execute<S: TemplateStore + ?Sized>(self, store: &S) -> SaveCompletion {
        let result = store.save(&self.snapshot).await;
        SaveCompletion {
            snapshot: self.snapshot,
            result,
            guard: self.guard,
        }
    }
}

/// The store's answer to a [`PendingSave`]
#[derive(Debug)]
pub struct SaveCompletion {
    snapshot: Template,
    result: std::result::Result<Template, RegistryError>,
    guard: SavingGuard,
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// The canonical record returned by the store
    Saved(Template),
    Failed(RegistryError),
    /// Nothing was sent: a save was already running or there is nothing to edit
    Skipped,
}

/// Editing state for a single template
pub struct EditorSession {
    state: SessionState,
    working: Option<Template>,
    /// Title and content of the last loaded or saved version
    baseline: Option<(String, String)>,
    saving: Arc<AtomicBool>,
    view_mode: ViewMode,
    content_version: u64,
    preview: Option<Preview>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl EditorSession {
    /// A session waiting for [`EditorSession::load`]
    pub fn new(navigator: Arc<dyn Navigator>, notifier: Arc<dyn Notifier>) -> Self {
        EditorSession {
            state: SessionState::Loading,
            working: None,
            baseline: None,
            saving: Arc::new(AtomicBool::new(false)),
            view_mode: ViewMode::default(),
            content_version: 0,
            preview: None,
            navigator,
            notifier,
        }
    }

    /// Open a session on `identity`
    ///
    /// An unsaved identity starts editing a fresh draft. A persisted one is
    /// loaded from the store; if it does not exist the session ends up
    /// [`SessionState::Redirected`].
    pub async fn open<S: TemplateStore + ?Sized>(
        identity: TemplateIdentity,
        store: &S,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let mut session = EditorSession::new(navigator, notifier);
        session.load(identity, store).await?;
        Ok(session)
    }

    /// Resolve the template to edit
    ///
    /// Store failures other than a missing template are returned and leave
    /// the session loading, so the caller may retry.
    pub async fn load<S: TemplateStore + ?Sized>(
        &mut self,
        identity: TemplateIdentity,
        store: &S,
    ) -> Result<()> {
        if self.state != SessionState::Loading {
            return Err(SessionError::NotEditing);
        }

        let id = match identity {
            TemplateIdentity::Unsaved => {
                debug!("editing new draft");
                self.start_editing(store.create_draft());
                return Ok(());
            }
            TemplateIdentity::Persisted(id) => id,
        };

        match store.get(&id).await {
            Ok(template) => {
                debug!(%id, "loaded template");
                self.start_editing(template);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(%id, "template not found, redirecting");
                self.state = SessionState::Redirected;
                self.notifier.notify(Notice::not_found());
                self.navigator.navigate(NavigationTarget::Home, HistoryMode::Push);
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "failed to load template");
                Err(e.into())
            }
        }
    }

    fn start_editing(&mut self, template: Template) {
        self.baseline = Some((template.title.clone(), template.content.clone()));
        self.working = Some(template);
        self.state = SessionState::Editing;
    }

    fn editing_mut(&mut self) -> Option<&mut Template> {
        match self.state {
            SessionState::Editing => self.working.as_mut(),
            _ => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The working copy, once loaded
    pub fn template(&self) -> Option<&Template> {
        self.working.as_ref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Whether the working copy differs from what was last loaded or saved
    pub fn is_dirty(&self) -> bool {
        match (&self.working, &self.baseline) {
            (Some(working), Some((title, content))) => {
                working.title != *title || working.content != *content
            }
            _ => false,
        }
    }

    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// A render of the current content, for the initial preview
    pub fn render_request(&self) -> Option<RenderRequest> {
        match self.state {
            SessionState::Editing => self.working.as_ref().map(|t| RenderRequest {
                version: self.content_version,
                markup: t.content.clone(),
            }),
            _ => None,
        }
    }

    /// Replace the markup, returning the render it calls for
    pub fn on_content_change(&mut self, text: impl Into<String>) -> Option<RenderRequest> {
        let template = self.editing_mut()?;
        template.content = text.into();
        let markup = template.content.clone();
        self.content_version += 1;
        Some(RenderRequest {
            version: self.content_version,
            markup,
        })
    }

    pub fn on_title_change(&mut self, text: impl Into<String>) {
        if let Some(template) = self.editing_mut() {
            template.title = text.into();
        }
    }

    pub fn on_toggle_preview(&mut self) -> ViewMode {
        if self.state == SessionState::Editing {
            self.view_mode = self.view_mode.toggled();
        }
        self.view_mode
    }

    /// Show a render result unless a newer one is already on display
    ///
    /// Returns whether the preview changed.
    pub fn apply_render(&mut self, reply: RenderReply) -> bool {
        if self.state != SessionState::Editing || reply.version > self.content_version {
            return false;
        }
        if let Some(current) = &self.preview {
            if reply.version < current.version {
                debug!(
                    stale = reply.version,
                    displayed = current.version,
                    "discarding stale render"
                );
                return false;
            }
        }
        self.preview = Some(Preview {
            version: reply.version,
            result: reply.result,
        });
        true
    }

    /// Capture the working copy and mark the session as saving
    pub fn begin_save(&mut self) -> Result<PendingSave> {
        let snapshot = match (self.state, &self.working) {
            (SessionState::Editing, Some(template)) => template.clone(),
            _ => return Err(SessionError::NotEditing),
        };
        if self.saving.swap(true, Ordering::AcqRel) {
            return Err(SessionError::SaveInProgress);
        }
        Ok(PendingSave {
            snapshot,
            guard: SavingGuard(self.saving.clone()),
        })
    }

    /// Apply the store's answer
    ///
    /// On success the working copy adopts the canonical identity and
    /// timestamps; edits made while the save was in flight are kept. A draft
    /// saved for the first time navigates to its own editor route.
    pub fn finish_save(&mut self, completion: SaveCompletion) -> SaveOutcome {
        let SaveCompletion {
            snapshot,
            result,
            guard,
        } = completion;
        drop(guard);

        match result {
            Ok(canonical) => {
                if let Some(working) = self.working.as_mut() {
                    working.id = canonical.id.clone();
                    working.created_at = canonical.created_at;
                    working.updated_at = canonical.updated_at;
                }
                self.baseline = Some((canonical.title.clone(), canonical.content.clone()));

                self.notifier.notify(Notice::saved());
                if snapshot.id.is_unsaved() {
                    if let Some(id) = canonical.id.id() {
                        self.navigator
                            .navigate(NavigationTarget::Editor(id.clone()), HistoryMode::Replace);
                    }
                }
                SaveOutcome::Saved(canonical)
            }
            Err(e) => {
                warn!(identity = %snapshot.id, error = %e, "failed to save template");
                self.notifier.notify(Notice::save_failed());
                SaveOutcome::Failed(e)
            }
        }
    }

    /// Run a whole save against `store`
    ///
    /// A no-op while another save is in flight.
    pub async fn on_save<S: TemplateStore + ?Sized>(&mut self, store: &S) -> SaveOutcome {
        match self.begin_save() {
            Ok(pending) => {
                let completion = pending.execute(store).await;
                self.finish_save(completion)
            }
            Err(e) => {
                debug!(reason = %e, "save skipped");
                SaveOutcome::Skipped
            }
        }
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("state", &self.state)
            .field("identity", &self.working.as_ref().map(|t| &t.id))
            .field("saving", &self.is_saving())
            .field("content_version", &self.content_version)
            .finish()
    }
}
