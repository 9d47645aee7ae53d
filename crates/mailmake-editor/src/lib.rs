//! # Mailmake Editor
//!
//! The state behind a template editor screen. An [`EditorSession`] holds the
//! working copy of one template and decides when to render, when a save may
//! start, and where the host should navigate afterwards.
//!
//! Rendering and saving are split-phase: the session hands out a
//! [`RenderRequest`] or [`PendingSave`], the host runs it wherever it likes,
//! and feeds the result back with [`EditorSession::apply_render`] or
//! [`EditorSession::finish_save`].

pub mod error;
pub mod events;
pub mod navigation;
pub mod notice;
pub mod session;

pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use navigation::{HistoryMode, NavigationTarget, Navigator};
pub use notice::{Notice, NoticeKind, Notifier, Severity};
pub use session::{
    EditorSession, PendingSave, Preview, RenderReply, RenderRequest, SaveCompletion, SaveOutcome,
    SessionState, ViewMode,
};
