use std::time::{Duration, Instant};

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use system::{Audience, Delivery, TurnArbiter};

use crate::connection::ConnectionCommand;
use crate::registry::ConnectionRegistry;

pub type ServerTx = UnboundedSender<ConnectionCommand>;

/// Owns every piece of shared state. Commands from all connections are
/// handled one at a time in arrival order.
pub struct Server {
    arbiter: TurnArbiter,
    connections: ConnectionRegistry,
}

impl Server {
    pub fn new(turn_duration: Duration) -> Self {
        Self {
            arbiter: TurnArbiter::new(turn_duration),
            connections: ConnectionRegistry::new(),
        }
    }

    pub fn handle_connection_command(&mut self, command: ConnectionCommand, now: Instant) {
        match command {
            ConnectionCommand::Connect { connection_id, tx } => {
                self.connections.register(connection_id, tx);
                self.connections
                    .send(&connection_id, &self.arbiter.connect(now));
                log::info!(
                    "Connection {} opened ({} online)",
                    connection_id,
                    self.connections.len()
                );
            }
            ConnectionCommand::Message { from, message } => {
                if !self.connections.contains(&from) {
                    log::debug!("Ignoring message from unregistered connection {}", from);
                    return;
                }
                let deliveries = self.arbiter.handle(from, message, now);
                self.deliver(deliveries);
            }
            ConnectionCommand::Disconnect { from } => {
                if self.connections.unregister(&from).is_none() {
                    return;
                }
                log::info!(
                    "Connection {} closed ({} online)",
                    from,
                    self.connections.len()
                );
                let deliveries = self.arbiter.disconnect(from, now);
                self.deliver(deliveries);
            }
        }
    }

    fn deliver(&self, deliveries: Vec<Delivery>) {
        for Delivery { audience, message } in deliveries {
            match audience {
                Audience::Everyone => {
                    self.connections.broadcast(&message, None);
                }
                Audience::EveryoneExcept(excluded) => {
                    self.connections.broadcast(&message, Some(&excluded));
                }
                Audience::Only(to) => {
                    self.connections.send(&to, &message);
                }
            }
        }
    }
}

pub fn spawn_server(turn_duration: Duration) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ConnectionCommand>();

    tokio::spawn(async move {
        let mut server = Server::new(turn_duration);

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command, Instant::now());
        }
        log::info!("Server loop terminated");
    });

    srv_tx
}
