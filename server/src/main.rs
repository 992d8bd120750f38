use fogmap_server::{config::Config, store::FileStore};
use rocket::{Build, Rocket};
use tracing::info;

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    tracing_subscriber::fmt::init();
    info!("🗺️ Starting fogmap viewer");

    let config = Config::from_env();
    let store = FileStore::new(config.data_dir.clone());
    info!("💾 Saving sessions under {}", store.dir().display());

    let rocket = fogmap_server::build(config, Box::new(store));

    info!("📡 Endpoints: GET /view, POST /image, POST /reset, GET /ws");

    rocket
}
