use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use crewline_bus::Connect;
use futures::{sink::SinkExt, stream::StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::GatewayState;
use crate::auth::{ConnectionIdentity, extract_credential};
use crate::protocol::{ClientCommand, ServerMessage};
use crate::rooms::Room;

const OUTBOUND_QUEUE: usize = 100;

async fn handle_socket_error(mut socket: WebSocket, reason: &str) {
    error!("Error handling websocket: {}", reason);

    socket
        .send(Message::Close(Some(CloseFrame {
            code: axum::extract::ws::close_code::ERROR,
            reason: reason.into(),
        })))
        .await
        .ok();
}

pub(crate) async fn ws_handler<C>(
    State(state): State<GatewayState<C>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse
where
    C: Connect,
{
    let Some(credential) = extract_credential(&headers) else {
        return ws.on_upgrade(|socket| handle_socket_error(socket, "Missing credentials"));
    };

    let identity = match state.authenticator.authenticate(&credential).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Error authenticating connection: {:?}", e);
            return ws.on_upgrade(|socket| handle_socket_error(socket, "Authentication failed"));
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn handle_socket<C>(socket: WebSocket, state: GatewayState<C>, identity: ConnectionIdentity)
where
    C: Connect,
{
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<ServerMessage>(OUTBOUND_QUEUE);

    // Tenant and user rooms are unconditional; project rooms come later via
    // authorized joins.
    let joined = vec![
        Room::tenant(&identity.tenant_id),
        Room::user(&identity.user_id),
    ];
    for room in &joined {
        state.rooms.join(room, connection_id, tx.clone());
    }
    let joined = Arc::new(Mutex::new(joined));

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!("Error encoding frame: {:?}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let rooms = state.rooms.clone();
    let recv_joined = Arc::clone(&joined);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    let command: ClientCommand = match serde_json::from_str(&text) {
                        Ok(command) => command,
                        Err(e) => {
                            warn!(%connection_id, error = %e, "unparseable client command ignored");
                            continue;
                        }
                    };
                    handle_command(
                        &state,
                        &identity,
                        connection_id,
                        &tx,
                        &recv_joined,
                        command,
                    )
                    .await;
                }
                Message::Close(_) => break,
                Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // If any one of the tasks exit, abort the other.
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        },
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    for room in joined.lock().iter() {
        rooms.leave(room, connection_id);
    }
    info!(%connection_id, "connection closed");
}

pub(crate) async fn handle_command<C>(
    state: &GatewayState<C>,
    identity: &ConnectionIdentity,
    connection_id: Uuid,
    tx: &mpsc::Sender<ServerMessage>,
    joined: &Mutex<Vec<Room>>,
    command: ClientCommand,
) where
    C: Connect,
{
    match command {
        ClientCommand::JoinProject { project_id } => {
            let ok = match state
                .authorizer
                .can_access_project(identity, &project_id)
                .await
            {
                Ok(allowed) => allowed,
                Err(e) => {
                    warn!(%connection_id, %project_id, error = %e, "project authorization failed");
                    false
                }
            };

            if ok {
                let room = Room::project(&project_id);
                state.rooms.join(&room, connection_id, tx.clone());
                joined.lock().push(room);
            }

            let _ = tx.send(ServerMessage::JoinResult { project_id, ok }).await;
        }
        ClientCommand::LeaveProject { project_id } => {
            let room = Room::project(&project_id);
            state.rooms.leave(&room, connection_id);
            joined.lock().retain(|joined_room| joined_room != &room);
        }
    }
}
