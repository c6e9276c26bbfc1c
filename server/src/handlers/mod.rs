use crate::connection::ws_index;
use crate::handlers::page::configure_page_handlers;
use actix_web::web;

mod page;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(ws_index)));

    configure_page_handlers(cfg);
}
