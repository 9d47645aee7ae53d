//! Messages exchanged over the live editor socket

use mailmake::Template;
use mailmake_editor::{
    EditorSession, HistoryMode, NavigationTarget, Notice, Preview, SessionEvent, SessionState,
    ViewMode,
};
use serde::{Deserialize, Serialize};

use super::render::RenderPreview;

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Full replacement of the markup
    Content { content: String },
    Title { title: String },
    TogglePreview,
    Save,
}

/// Snapshot of a session for clients
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub template: Option<Template>,
    pub saving: bool,
    pub dirty: bool,
    pub view_mode: ViewMode,
    pub content_version: u64,
}

impl From<&EditorSession> for SessionView {
    fn from(session: &EditorSession) -> Self {
        Self {
            state: session.state(),
            template: session.template().cloned(),
            saving: session.is_saving(),
            dirty: session.is_dirty(),
            view_mode: session.view_mode(),
            content_version: session.content_version(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewView {
    pub version: u64,
    #[serde(flatten)]
    pub preview: RenderPreview,
}

impl From<&Preview> for PreviewView {
    fn from(preview: &Preview) -> Self {
        Self {
            version: preview.version,
            preview: RenderPreview::from(&preview.result),
        }
    }
}

/// Server to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    State(SessionView),
    Preview(PreviewView),
    Notice(Notice),
    Navigate {
        target: NavigationTarget,
        mode: HistoryMode,
    },
    Error {
        message: String,
    },
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Navigate { target, mode } => ServerMessage::Navigate { target, mode },
            SessionEvent::Notice(notice) => ServerMessage::Notice(notice),
        }
    }
}
