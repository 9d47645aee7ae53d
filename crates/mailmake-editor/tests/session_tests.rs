//! End-to-end tests for editor sessions

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mailmake::{DEFAULT_TITLE, RenderPipeline, Template, TemplateId, TemplateIdentity};
use mailmake_editor::*;
use mailmake_registry::{
    Delayed, MemoryStorage, Registry, RegistryError, StorageError, TemplateStore,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

const HELLO: &str = "<mjml><mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>";

fn channel() -> (
    Arc<mpsc::UnboundedSender<SessionEvent>>,
    UnboundedReceiver<SessionEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

async fn open(
    identity: TemplateIdentity,
    store: &dyn TemplateStore,
) -> (EditorSession, UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = channel();
    let session = EditorSession::open(identity, store, tx.clone(), tx)
        .await
        .unwrap();
    (session, rx)
}

fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn saved_id(outcome: &SaveOutcome) -> TemplateId {
    match outcome {
        SaveOutcome::Saved(template) => template.id.id().cloned().unwrap(),
        other => panic!("expected a successful save, got {:?}", other),
    }
}

/// A store that can read but never write
struct FailingStore;

#[async_trait]
impl TemplateStore for FailingStore {
    async fn get(&self, id: &TemplateId) -> mailmake_registry::Result<Template> {
        Err(RegistryError::TemplateNotFound(id.to_string()))
    }

    async fn save(&self, _template: &Template) -> mailmake_registry::Result<Template> {
        Err(RegistryError::Storage(StorageError::Backend("disk full".into())))
    }

    async fn list(&self) -> mailmake_registry::Result<Vec<Template>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_new_draft_save_assigns_id_and_navigates() {
    let store = Registry::new(MemoryStorage::new());
    let (mut session, mut rx) = open(TemplateIdentity::Unsaved, &store).await;

    assert_eq!(session.state(), SessionState::Editing);
    let draft = session.template().unwrap();
    assert!(draft.is_draft());
    assert_eq!(draft.title, DEFAULT_TITLE);
    assert_eq!(draft.content, "");
    assert!(store.storage().is_empty());

    session.on_content_change(HELLO);
    let outcome = session.on_save(&store).await;
    let id = saved_id(&outcome);

    assert!(id.as_str().starts_with("tpl_"));
    assert!(!session.is_saving());
    assert!(!session.is_dirty());
    assert_eq!(session.template().unwrap().id, TemplateIdentity::Persisted(id.clone()));
    assert_eq!(session.state(), SessionState::Editing);

    assert_eq!(
        drain(&mut rx),
        vec![
            SessionEvent::Notice(Notice::saved()),
            SessionEvent::Navigate {
                target: NavigationTarget::Editor(id.clone()),
                mode: HistoryMode::Replace,
            },
        ]
    );

    let stored = store.get(&id).await.unwrap();
    assert_eq!(stored.content, HELLO);
}

#[tokio::test]
async fn test_second_save_does_not_navigate() {
    let store = Registry::new(MemoryStorage::new());
    let (mut session, mut rx) = open(TemplateIdentity::Unsaved, &store).await;

    let first = saved_id(&session.on_save(&store).await);
    drain(&mut rx);

    session.on_title_change("Renamed");
    let second = saved_id(&session.on_save(&store).await);

    assert_eq!(first, second);
    assert_eq!(drain(&mut rx), vec![SessionEvent::Notice(Notice::saved())]);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_template_redirects_home() {
    let store = Registry::new(MemoryStorage::new());
    let id = TemplateId::new("tpl_missing").unwrap();
    let (mut session, mut rx) = open(TemplateIdentity::Persisted(id), &store).await;

    assert_eq!(session.state(), SessionState::Redirected);
    assert!(session.template().is_none());

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            SessionEvent::Notice(Notice::not_found()),
            SessionEvent::Navigate {
                target: NavigationTarget::Home,
                mode: HistoryMode::Push,
            },
        ]
    );
    match &events[0] {
        SessionEvent::Notice(notice) => {
            assert_eq!(notice.kind, NoticeKind::NotFound);
            assert_eq!(notice.severity, Severity::Destructive);
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Terminal: edits and saves are ignored
    assert!(session.on_content_change(HELLO).is_none());
    assert!(matches!(session.on_save(&store).await, SaveOutcome::Skipped));
    assert!(store.storage().is_empty());
}

#[tokio::test]
async fn test_open_existing_template() {
    let store = Registry::new(MemoryStorage::new());
    let saved = store
        .save(&store.create_draft().with_title("Digest").with_content(HELLO))
        .await
        .unwrap();

    let (session, mut rx) = open(saved.id.clone(), &store).await;
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(session.template(), Some(&saved));
    assert!(!session.is_dirty());
    assert!(drain(&mut rx).is_empty());

    let request = session.render_request().unwrap();
    assert_eq!(request.version, 0);
    assert_eq!(request.markup, HELLO);
}

#[tokio::test]
async fn test_double_save_is_ignored() {
    let store = Registry::new(MemoryStorage::new());
    let (mut session, mut rx) = open(TemplateIdentity::Unsaved, &store).await;

    let pending = session.begin_save().unwrap();
    assert!(session.is_saving());
    assert!(matches!(session.begin_save(), Err(SessionError::SaveInProgress)));

    let completion = pending.execute(&store).await;
    saved_id(&session.finish_save(completion));

    assert_eq!(store.list().await.unwrap().len(), 1);
    // One notice, one navigation
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_during_save_are_kept_but_not_persisted() {
    let store = Delayed::new(Registry::new(MemoryStorage::new()), Duration::from_millis(200));
    let (mut session, _rx) = open(TemplateIdentity::Unsaved, &store).await;

    session.on_content_change("<mjml></mjml>");
    let pending = session.begin_save().unwrap();
    assert_eq!(pending.snapshot().content, "<mjml></mjml>");

    // Edit while the save is in flight
    let (completion, ()) = tokio::join!(pending.execute(&store), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.on_content_change(HELLO);
        assert!(session.is_saving());
    });

    let id = saved_id(&session.finish_save(completion));

    let stored = store.get(&id).await.unwrap();
    assert_eq!(stored.content, "<mjml></mjml>");

    let working = session.template().unwrap();
    assert_eq!(working.content, HELLO);
    assert_eq!(working.id, TemplateIdentity::Persisted(id));
    assert_eq!(working.updated_at, stored.updated_at);
    assert!(session.is_dirty());
}

#[tokio::test]
async fn test_failed_save_keeps_working_copy() {
    let store = FailingStore;
    let (mut session, mut rx) = open(TemplateIdentity::Unsaved, &store).await;

    session.on_title_change("Launch");
    session.on_content_change(HELLO);
    let before = session.template().cloned().unwrap();

    let outcome = session.on_save(&store).await;
    assert!(matches!(outcome, SaveOutcome::Failed(RegistryError::Storage(_))));
    assert!(!session.is_saving());
    assert_eq!(session.template(), Some(&before));
    assert!(session.template().unwrap().is_draft());

    let events = drain(&mut rx);
    assert_eq!(events, vec![SessionEvent::Notice(Notice::save_failed())]);

    // Retry is allowed
    assert!(session.begin_save().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_save_clears_saving_flag() {
    let store = Delayed::new(Registry::new(MemoryStorage::new()), Duration::from_secs(5));
    let (mut session, _rx) = open(TemplateIdentity::Unsaved, &store).await;

    let pending = session.begin_save().unwrap();
    let timed_out = tokio::time::timeout(Duration::from_millis(10), pending.execute(&store)).await;
    assert!(timed_out.is_err());

    assert!(!session.is_saving());
    assert!(store.inner().storage().is_empty());
    assert!(session.begin_save().is_ok());
}

#[tokio::test]
async fn test_stale_render_is_discarded() {
    let store = Registry::new(MemoryStorage::new());
    let pipeline = RenderPipeline::new();
    let (mut session, _rx) = open(TemplateIdentity::Unsaved, &store).await;

    let a = session.on_content_change("<unclosed>").unwrap();
    let b = session.on_content_change(HELLO).unwrap();

    let reply_a = a.execute(&pipeline);
    let reply_b = b.execute(&pipeline);

    // B finishes first, A arrives late
    assert!(session.apply_render(reply_b));
    assert!(!session.apply_render(reply_a));

    let preview = session.preview().unwrap();
    assert_eq!(preview.version, 2);
    assert!(preview.result.as_ref().unwrap().html.contains("Hello"));
}

#[tokio::test]
async fn test_invalid_markup_updates_content_and_shows_diagnostic() {
    let store = Registry::new(MemoryStorage::new());
    let pipeline = RenderPipeline::new();
    let (mut session, _rx) = open(TemplateIdentity::Unsaved, &store).await;

    let request = session.on_content_change("<unclosed>").unwrap();
    assert_eq!(session.template().unwrap().content, "<unclosed>");

    assert!(session.apply_render(request.execute(&pipeline)));
    let error = session.preview().unwrap().result.as_ref().unwrap_err();
    assert!(!error.message.is_empty());
    assert_eq!(session.state(), SessionState::Editing);
}

#[tokio::test]
async fn test_toggle_preview_leaves_template_alone() {
    let store = Registry::new(MemoryStorage::new());
    let (mut session, _rx) = open(TemplateIdentity::Unsaved, &store).await;
    let before = session.template().cloned();

    assert_eq!(session.view_mode(), ViewMode::Split);
    assert_eq!(session.on_toggle_preview(), ViewMode::PreviewOnly);
    assert_eq!(session.on_toggle_preview(), ViewMode::Split);

    assert_eq!(session.template().cloned(), before);
    assert!(!session.is_dirty());
    assert_eq!(session.content_version(), 0);
}

#[test]
fn test_session_events_serialize_for_clients() {
    let id = TemplateId::new("tpl_abc").unwrap();
    let navigate = SessionEvent::Navigate {
        target: NavigationTarget::Editor(id),
        mode: HistoryMode::Replace,
    };
    assert_eq!(
        serde_json::to_value(&navigate).unwrap(),
        serde_json::json!({"type": "navigate", "target": "/editor/tpl_abc", "mode": "replace"})
    );

    let home = SessionEvent::Navigate {
        target: NavigationTarget::Home,
        mode: HistoryMode::Push,
    };
    assert_eq!(
        serde_json::to_value(&home).unwrap(),
        serde_json::json!({"type": "navigate", "target": "/", "mode": "push"})
    );

    let notice = serde_json::to_value(SessionEvent::Notice(Notice::not_found())).unwrap();
    assert_eq!(notice["type"], "notice");
    assert_eq!(notice["kind"], "not_found");
    assert_eq!(notice["severity"], "destructive");
    assert_eq!(notice["title"], "Template not found");
}
