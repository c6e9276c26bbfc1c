use crate::config::ServerConfig;
use actix_web::web;
use actix_web::Responder;
use askama_actix::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    turn_seconds: u64,
}

/// Every path that isn't the websocket gets the drawing page, so `/` works as
/// a health check too.
pub fn configure_page_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/{tail:.*}").route(web::get().to(index)));
}

pub async fn index(config: web::Data<ServerConfig>) -> impl Responder {
    IndexTemplate {
        turn_seconds: config.turn_duration.as_secs(),
    }
}
