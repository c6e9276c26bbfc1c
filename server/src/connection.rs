use std::sync::atomic::{AtomicU32, Ordering};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use system::{ClientMessage, ConnectionId};

use crate::config::ServerConfig;
use crate::registry::{ConnectionTx, Payload};
use crate::server::ServerTx;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        connection_id: ConnectionId,
        tx: ConnectionTx,
    },
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },
    Disconnect {
        from: ConnectionId,
    },
}

/// Hands out connection ids. Wraps around; a wrapped id only collides with a
/// connection that has stayed open through four billion newer ones.
#[derive(Debug, Default)]
pub struct ConnectionIdSource(AtomicU32);

impl ConnectionIdSource {
    pub fn next(&self) -> ConnectionId {
        self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct Egress(Payload);

struct ConnectionActor {
    connection_id: ConnectionId,
    srv_tx: ServerTx,
    outbox_capacity: usize,
}

impl ConnectionActor {
    fn forward(&self, ctx: &mut ws::WebsocketContext<Self>, text: &str) {
        // Malformed input is dropped; the connection stays open.
        if let Some(message) = ClientMessage::parse(text) {
            log::debug!("Ingress {} {:?}", self.connection_id, message);
            if self
                .srv_tx
                .send(ConnectionCommand::Message {
                    from: self.connection_id,
                    message,
                })
                .is_err()
            {
                log::error!("Server loop is gone, closing connection");
                ctx.stop();
            }
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<Payload>(self.outbox_capacity);

        if self
            .srv_tx
            .send(ConnectionCommand::Connect {
                connection_id: self.connection_id,
                tx,
            })
            .is_err()
        {
            log::error!("Server loop is gone, refusing connection");
            ctx.stop();
            return;
        }

        let addr = ctx.address().recipient();
        let connection_id = self.connection_id;

        // Ends once the server drops its sender on disconnect.
        tokio::spawn(async move {
            log::debug!("connection {} egress - started", connection_id);
            while let Some(payload) = rx.recv().await {
                addr.do_send(Egress(payload));
            }
            log::debug!("connection {} egress - terminated", connection_id);
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self
            .srv_tx
            .send(ConnectionCommand::Disconnect {
                from: self.connection_id,
            })
            .is_err()
        {
            log::debug!(
                "Server loop is gone, disconnect of {} not reported",
                self.connection_id
            );
        }
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => self.forward(ctx, &text),
            Ok(ws::Message::Binary(bin)) => match std::str::from_utf8(&bin) {
                Ok(text) => self.forward(ctx, text),
                Err(_) => log::debug!("Discarding non-utf8 frame from {}", self.connection_id),
            },
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::warn!("Protocol error on connection {}: {}", self.connection_id, err);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<Egress> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, msg: Egress, ctx: &mut ws::WebsocketContext<Self>) -> Self::Result {
        ctx.text(&*msg.0);
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    ids: web::Data<ConnectionIdSource>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, Error> {
    ws::start(
        ConnectionActor {
            connection_id: ids.next(),
            srv_tx: srv_tx.get_ref().clone(),
            outbox_capacity: config.outbox_capacity,
        },
        &req,
        stream,
    )
}
