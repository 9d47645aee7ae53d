//! Live editor sessions over WebSocket
//!
//! Each socket owns one [`EditorSession`]. Renders run on blocking tasks and
//! saves on spawned tasks; both report back through channels into the
//! socket loop, so edits keep being applied while they are in flight.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use mailmake::{RenderPipeline, TemplateIdentity};
use mailmake_editor::{
    EditorSession, RenderReply, RenderRequest, SaveCompletion, SessionEvent, SessionState,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, Result},
    models::{ClientMessage, PreviewView, ServerMessage, SessionView},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/ws", get(editor_ws))
}

/// WebSocket endpoint for a live editing session
///
/// `id` is a template id, or `new` for a fresh draft.
pub async fn editor_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let identity: TemplateIdentity = id.parse()?;
    info!(%identity, "editor session requested");
    Ok(ws.on_upgrade(move |socket| handle_editor_ws(socket, state, identity)))
}

async fn handle_editor_ws(socket: WebSocket, state: AppState, identity: TemplateIdentity) {
    let (sender, receiver) = socket.split();
    run_editor(sender, receiver, state, identity).await;
}

/// Drive one editor session over a pair of socket halves
///
/// Returns once the client goes away, a send fails, or the session is
/// redirected.
async fn run_editor<S, R, E>(
    mut sender: S,
    mut receiver: R,
    state: AppState,
    identity: TemplateIdentity,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
{
    let connection = Uuid::new_v4();
    debug!(%connection, %identity, "editor socket connected");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderReply>();
    let (save_tx, mut save_rx) = mpsc::unbounded_channel::<SaveCompletion>();

    let events = Arc::new(event_tx);
    let mut session =
        match EditorSession::open(identity, state.store.as_ref(), events.clone(), events).await {
            Ok(session) => session,
            Err(e) => {
                error!(%connection, error = %e, "failed to open editor session");
                let _ = send(&mut sender, &ServerMessage::Error { message: e.to_string() }).await;
                let _ = sender.close().await;
                return;
            }
        };

    // Redirect notices emitted while loading
    if flush_events(&mut sender, &mut event_rx).await.is_err()
        || send_state(&mut sender, &session).await.is_err()
    {
        return;
    }
    if session.state() == SessionState::Redirected {
        info!(%connection, "template not found, closing editor socket");
        let _ = sender.close().await;
        return;
    }

    if let Some(request) = session.render_request() {
        spawn_render(&state.pipeline, request, render_tx.clone());
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%connection, "editor socket closed by client");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(%connection, error = %e, "editor socket error");
                        break;
                    }
                    // Binary, ping, pong
                    Some(Ok(_)) => continue,
                };

                let message = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => message,
                    Err(e) => {
                        let reply = ServerMessage::Error { message: format!("Invalid message: {}", e) };
                        if send(&mut sender, &reply).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                match message {
                    ClientMessage::Content { content } => {
                        if let Some(request) = session.on_content_change(content) {
                            spawn_render(&state.pipeline, request, render_tx.clone());
                        }
                    }
                    ClientMessage::Title { title } => session.on_title_change(title),
                    ClientMessage::TogglePreview => {
                        session.on_toggle_preview();
                    }
                    ClientMessage::Save => match session.begin_save() {
                        Ok(pending) => {
                            let store = state.store.clone();
                            let save_tx = save_tx.clone();
                            tokio::spawn(async move {
                                let completion = pending.execute(store.as_ref()).await;
                                // A closed socket drops the completion, which ends the save
                                let _ = save_tx.send(completion);
                            });
                        }
                        Err(e) => debug!(%connection, reason = %e, "save ignored"),
                    },
                }

                if send_state(&mut sender, &session).await.is_err() {
                    break;
                }
            }
            Some(reply) = render_rx.recv() => {
                if session.apply_render(reply) {
                    if let Some(preview) = session.preview() {
                        if send(&mut sender, &ServerMessage::Preview(PreviewView::from(preview))).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Some(completion) = save_rx.recv() => {
                session.finish_save(completion);
                // Navigation and notice go out before the new state
                if flush_events(&mut sender, &mut event_rx).await.is_err()
                    || send_state(&mut sender, &session).await.is_err()
                {
                    break;
                }
            }
            Some(event) = event_rx.recv() => {
                if send(&mut sender, &event.into()).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!(%connection, "editor socket finished");
}

fn spawn_render(pipeline: &RenderPipeline, request: RenderRequest, tx: UnboundedSender<RenderReply>) {
    let pipeline = pipeline.clone();
    tokio::task::spawn_blocking(move || {
        let _ = tx.send(request.execute(&pipeline));
    });
}

async fn flush_events<S>(sender: &mut S, events: &mut UnboundedReceiver<SessionEvent>) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Ok(event) = events.try_recv() {
        send(sender, &event.into()).await?;
    }
    Ok(())
}

async fn send_state<S>(sender: &mut S, session: &EditorSession) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    send(sender, &ServerMessage::State(SessionView::from(session))).await
}

async fn send<S>(sender: &mut S, message: &ServerMessage) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let text = serde_json::to_string(message)
        .map_err(|e| ApiError::internal(format!("Failed to encode message: {}", e)))?;

    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| ApiError::internal(format!("WebSocket send failed: {}", e)))
}
