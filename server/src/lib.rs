//! Local fog-of-war map viewer for tabletop sessions.
//!
//! The game master uploads a map image, lays a grid over it, reveals cells as
//! the players explore and pins annotated markers ("checks") to the map.
//! Everything durable is saved to a key-value store after each change so a
//! session can be resumed later.
//!
//! The core is plain synchronous code: [`geometry`], [`fog`], [`markers`],
//! [`session`] and [`persistence`] know nothing about HTTP. [`logic::Table`]
//! owns one session and its store, and the Rocket routes in [`routes`] feed
//! input events into it.

use std::sync::Arc;

use rocket::{Build, Rocket, routes};
use tokio::sync::Mutex;

pub mod config;
pub mod cors;
pub mod dice;
pub mod fog;
pub mod geometry;
pub mod logic;
pub mod markers;
pub mod persistence;
pub mod render;
pub mod routes;
pub mod session;
pub mod store;

use crate::{
    config::Config,
    cors::create_cors,
    logic::{SharedTable, Table},
    routes::{get_view, reset_session, upload_image, websocket_handler},
    store::KeyValueStore,
};

pub fn build(config: Config, store: Box<dyn KeyValueStore>) -> Rocket<Build> {
    let table: SharedTable = Arc::new(Mutex::new(Table::new(store, &config)));

    rocket::build()
        .attach(create_cors())
        .manage(table)
        .manage(config)
        .mount(
            "/",
            routes![get_view, upload_image, reset_session, websocket_handler],
        )
}
