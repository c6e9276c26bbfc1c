use std::io;

use actix_web::{web, App, HttpServer};

use server::config::ServerConfig;
use server::connection::ConnectionIdSource;
use server::handlers;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config =
        ServerConfig::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let srv_tx = web::Data::new(spawn_server(config.turn_duration));
    let ids = web::Data::new(ConnectionIdSource::default());
    let bind_address = config.bind_address();
    let config = web::Data::new(config);

    log::info!(
        "Listening on {}:{} (turn duration {:?})",
        bind_address.0,
        bind_address.1,
        config.turn_duration
    );

    HttpServer::new(move || {
        App::new()
            .app_data(srv_tx.clone())
            .app_data(ids.clone())
            .app_data(config.clone())
            .configure(handlers::root)
    })
    .bind(bind_address)?
    .run()
    .await
}
