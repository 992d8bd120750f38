use std::{collections::HashMap, sync::Arc};

use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use fogmap_common::{
    models::ImageSize,
    protocol::{ClientMessage, ServerMessage, SessionView},
};

use crate::{
    config::Config,
    dice,
    fog::GridDims,
    persistence,
    render::render,
    session::{ClickOutcome, SessionState, UsageError, encode_image},
    store::KeyValueStore,
};

pub type SharedTable = Arc<Mutex<Table>>;

/// Owns the one session of this process, the store it is saved to, and the
/// viewers currently watching it. Every change is applied, saved and then
/// broadcast while the table lock is held.
pub struct Table {
    session: SessionState,
    store: Box<dyn KeyValueStore>,
    streams: HashMap<Uuid, SplitSink<DuplexStream, Message>>,
}

async fn send(stream: &mut SplitSink<DuplexStream, Message>, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(
    streams: &mut HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    message: &ServerMessage,
) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

impl Table {
    #[instrument(level = "trace", skip(store))]
    pub fn new(store: Box<dyn KeyValueStore>, config: &Config) -> Self {
        let mut session = persistence::load(store.as_ref());
        session.set_radius(i64::from(config.default_radius));
        Self {
            session,
            store,
            streams: HashMap::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn view(&self) -> SessionView {
        render(&self.session)
    }

    fn view_message(&self) -> ServerMessage {
        ServerMessage::View { view: self.view() }
    }

    /// Saves the durable part of the session. A failed write is logged and
    /// otherwise ignored: memory stays authoritative until the next save.
    fn persist(&mut self) {
        if let Err(e) = persistence::save(self.store.as_mut(), &self.session) {
            error!("Failed to persist session, continuing in memory: {}", e);
        }
    }

    #[instrument(level = "trace", skip(self, bytes), fields(len = bytes.len()))]
    pub fn upload_image(&mut self, content_type: &str, bytes: &[u8]) -> Result<(), UsageError> {
        let image_ref = encode_image(content_type, bytes)?;
        self.session.load_image(image_ref);
        self.persist();
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn reset(&mut self) {
        self.session.reset();
        self.persist();
    }

    /// Applies one input event. Returns what should be broadcast, or `None`
    /// when the event was ignored.
    #[instrument(level = "trace", skip(self))]
    pub fn apply(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        let result = match message {
            ClientMessage::Click { x, y, rect } => {
                self.session.click(x, y, &rect).map(|outcome| {
                    if let ClickOutcome::Revealed(added) = outcome
                        && added > 0
                    {
                        self.persist();
                    }
                })
            }
            ClientMessage::ImageLoaded { width, height } => {
                self.session.image_loaded(ImageSize { width, height })
            }
            ClientMessage::SetGrid { cols, rows } => {
                if self.session.set_dims(GridDims::from_input(&cols, &rows)) {
                    self.persist();
                }
                Ok(())
            }
            ClientMessage::SetMode { mode } => {
                self.session.set_mode(mode);
                Ok(())
            }
            ClientMessage::SetRadius { radius } => {
                self.session.set_radius(radius);
                Ok(())
            }
            ClientMessage::SetViewAll { enabled } => {
                info!("View-all override {}", if enabled { "on" } else { "off" });
                self.session.set_view_all(enabled);
                Ok(())
            }
            ClientMessage::SaveMarker { name, check } => {
                self.session.save_pending_marker(&name, &check).map(|_| {
                    self.persist();
                })
            }
            ClientMessage::CancelMarker => {
                self.session.cancel_pending_marker();
                Ok(())
            }
            ClientMessage::RequestDelete { id } => self.session.request_delete(id),
            ClientMessage::ResolveDelete { approved } => {
                self.session.resolve_delete(approved).map(|removed| {
                    if removed.is_some() {
                        self.persist();
                    }
                })
            }
            ClientMessage::Reset => {
                self.reset();
                Ok(())
            }
            ClientMessage::Roll { count, sides } => {
                let result = dice::roll(count, sides, &mut rand::rng());
                info!(
                    "Rolled {}d{}: {:?} = {}",
                    result.count,
                    result.sides,
                    result.rolls,
                    result.total()
                );
                return Some(ServerMessage::Dice {
                    count: result.count,
                    sides: result.sides,
                    total: result.total(),
                    rolls: result.rolls,
                });
            }
        };

        match result {
            Ok(()) => Some(self.view_message()),
            Err(e) => {
                debug!("Ignoring request: {}", e);
                None
            }
        }
    }

    /// Applies an input event and broadcasts the result to every viewer.
    pub async fn handle(&mut self, message: ClientMessage) {
        if let Some(reply) = self.apply(message) {
            broadcast(&mut self.streams, &reply).await;
        }
    }

    /// Sends the current view to every viewer.
    pub async fn publish_view(&mut self) {
        let message = self.view_message();
        broadcast(&mut self.streams, &message).await;
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, mut stream: SplitSink<DuplexStream, Message>) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding viewer {}", id);
        send(&mut stream, &self.view_message()).await;
        self.streams.insert(id, stream);
        info!("Viewer {} added, total viewers: {}", id, self.streams.len());
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Viewer {} removed, remaining viewers: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent viewer: {}", id);
        }
    }
}
