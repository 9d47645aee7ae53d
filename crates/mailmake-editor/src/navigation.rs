//! Navigation requests emitted by a session

use std::fmt;

use mailmake::TemplateId;
use serde::{Serialize, Serializer};

/// Where the host application should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Home,
    Editor(TemplateId),
}

impl NavigationTarget {
    /// The route path for this target
    pub fn path(&self) -> String {
        match self {
            NavigationTarget::Home => "/".to_string(),
            NavigationTarget::Editor(id) => format!("/editor/{}", id),
        }
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for NavigationTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

/// Whether the navigation adds a history entry or replaces the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    /// Leaving a missing template for home
    Push,
    /// A draft moving to its canonical route after the first save
    Replace,
}

/// Receives navigation requests from a session
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget, mode: HistoryMode);
}
