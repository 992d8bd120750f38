use rocket::{
    Data, State,
    data::ToByteUnit,
    futures::StreamExt,
    get,
    http::{ContentType, Status},
    post,
    serde::json::Json,
};
use rocket_ws::{Channel, Message, WebSocket};
use tracing::{debug, error, info, instrument, warn};

use fogmap_common::protocol::{ClientMessage, SessionView};

use crate::{config::Config, logic::SharedTable, session::image_mime};

#[get("/view")]
#[instrument(level = "trace", skip(table))]
pub async fn get_view(table: &State<SharedTable>) -> Json<SessionView> {
    Json(table.lock().await.view())
}

/// Replaces the map image with the request body. Only bodies declared as
/// `image/*` are accepted; anything else leaves the session untouched.
#[post("/image", data = "<data>")]
#[instrument(level = "trace", skip(data, table, config))]
pub async fn upload_image(
    content_type: Option<&ContentType>,
    data: Data<'_>,
    table: &State<SharedTable>,
    config: &State<Config>,
) -> Result<Json<SessionView>, Status> {
    let declared = content_type.map(ToString::to_string).unwrap_or_default();
    if image_mime(&declared).is_none() {
        warn!("Rejected upload declared as {:?}", declared);
        return Err(Status::UnsupportedMediaType);
    }

    let body = match data.open(config.max_image_bytes.bytes()).into_bytes().await {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read image upload: {}", e);
            return Err(Status::InternalServerError);
        }
    };
    if !body.is_complete() {
        warn!(
            "Rejected image larger than {} bytes",
            config.max_image_bytes
        );
        return Err(Status::PayloadTooLarge);
    }

    let mut table = table.lock().await;
    if let Err(e) = table.upload_image(&declared, &body) {
        warn!("Rejected image upload: {}", e);
        return Err(Status::UnprocessableEntity);
    }
    info!("Map image replaced ({} bytes)", body.len());
    table.publish_view().await;
    Ok(Json(table.view()))
}

#[post("/reset")]
#[instrument(level = "trace", skip(table))]
pub async fn reset_session(table: &State<SharedTable>) -> Json<SessionView> {
    let mut table = table.lock().await;
    table.reset();
    table.publish_view().await;
    Json(table.view())
}

#[get("/ws")]
#[instrument(level = "trace", skip(ws, table))]
pub fn websocket_handler(ws: WebSocket, table: &State<SharedTable>) -> Channel<'static> {
    let table = table.inner().clone();

    ws.channel(move |stream| {
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut table = table.lock().await;
                table.add_stream(write).await
            };

            info!("Viewer connected (stream: {})", stream_id);

            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            debug!("Received message from {}: {:?}", stream_id, message);
                            let mut table = table.lock().await;
                            table.handle(message).await;
                        }
                        Err(e) => {
                            warn!("Invalid message format: {} - Error: {}", text, e);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed (stream: {})", stream_id);
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket error (stream: {}): {}", stream_id, e);
                        break;
                    }
                    _ => {
                        debug!("Received non-text message from {}, ignoring", stream_id);
                    }
                }
            }

            {
                let mut table = table.lock().await;
                table.remove_stream(&stream_id).await;
            }

            info!("Viewer disconnected (stream: {})", stream_id);
            Ok(())
        })
    })
}
