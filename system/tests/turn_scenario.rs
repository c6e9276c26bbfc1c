use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use system::{ClientMessage, ConnectionId, Delivery, ServerMessage, Stroke, TurnArbiter};

/// Connections and what each has received so far.
struct Room {
    arbiter: TurnArbiter,
    inboxes: BTreeMap<ConnectionId, Vec<ServerMessage>>,
}

impl Room {
    fn new() -> Self {
        Self {
            arbiter: TurnArbiter::default(),
            inboxes: BTreeMap::new(),
        }
    }

    fn connect(&mut self, id: ConnectionId, now: Instant) {
        let init = self.arbiter.connect(now);
        self.inboxes.insert(id, vec![init]);
    }

    fn send(&mut self, from: ConnectionId, message: ClientMessage, now: Instant) {
        let deliveries = self.arbiter.handle(from, message, now);
        self.deliver(deliveries);
    }

    fn disconnect(&mut self, id: ConnectionId, now: Instant) {
        self.inboxes.remove(&id);
        let deliveries = self.arbiter.disconnect(id, now);
        self.deliver(deliveries);
    }

    fn deliver(&mut self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            for (id, inbox) in self.inboxes.iter_mut() {
                if delivery.audience.includes(*id) {
                    inbox.push(delivery.message.clone());
                }
            }
        }
    }

    fn drain(&mut self, id: ConnectionId) -> Vec<ServerMessage> {
        self.inboxes
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

#[test]
fn it_rotates_a_turn_through_draw_disconnect_and_cooldown() {
    let start = Instant::now();
    let (a, b, c) = (1, 2, 3);
    let mut room = Room::new();
    room.connect(a, start);
    room.connect(b, start);
    room.connect(c, start);
    for id in &[a, b, c] {
        assert_eq!(
            room.drain(*id),
            vec![ServerMessage::Init {
                can_draw: true,
                time_left: 0,
                drawer: None,
            }]
        );
    }

    room.send(a, ClientMessage::RequestTurn, start);
    let new_turn = ServerMessage::NewTurn {
        drawer: "someone".into(),
        time_left: 60000,
    };
    assert_eq!(
        room.drain(a),
        vec![new_turn.clone(), ServerMessage::YourTurn { duration: 60000 }]
    );
    assert_eq!(room.drain(b), vec![new_turn.clone()]);
    assert_eq!(room.drain(c), vec![new_turn]);

    let draw: ClientMessage = serde_json::from_str(
        r##"{"type":"draw","x0":0,"y0":0,"x1":10,"y1":10,"color":"#f00"}"##,
    )
    .expect("valid draw");
    room.send(a, draw, start + Duration::from_secs(1));
    let stroke = ServerMessage::Draw(Stroke::new(0, 0, 10, 10, Some("#f00".into())));
    assert!(room.drain(a).is_empty());
    assert_eq!(room.drain(b), vec![stroke.clone()]);
    assert_eq!(room.drain(c), vec![stroke]);

    let left_at = start + Duration::from_secs(2);
    room.disconnect(a, left_at);
    for id in &[b, c] {
        let received = room.drain(*id);
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0], ServerMessage::TurnEnded { .. }));
    }
    assert_eq!(room.arbiter.current_drawer(), None);

    room.send(b, ClientMessage::RequestTurn, left_at + Duration::from_secs(30));
    assert_eq!(
        room.drain(b),
        vec![ServerMessage::TurnInfo {
            can_draw: false,
            time_left: 30000,
        }]
    );
    assert!(room.drain(c).is_empty());

    room.send(c, ClientMessage::RequestTurn, left_at + Duration::from_secs(60));
    assert_eq!(room.arbiter.current_drawer(), Some(c));
    assert_eq!(
        room.drain(c).last(),
        Some(&ServerMessage::YourTurn { duration: 60000 })
    );
}

#[test]
fn it_produces_no_traffic_for_unauthorized_actions() {
    let start = Instant::now();
    let mut room = Room::new();
    for id in 1..=3 {
        room.connect(id, start);
        room.drain(id);
    }
    room.send(1, ClientMessage::RequestTurn, start);
    for id in 1..=3 {
        room.drain(id);
    }

    room.send(2, ClientMessage::Clear, start);
    room.send(
        3,
        ClientMessage::Draw {
            x0: 1.into(),
            y0: 1.into(),
            x1: 2.into(),
            y1: 2.into(),
            color: None,
        },
        start,
    );
    for id in 1..=3 {
        assert!(room.drain(id).is_empty());
    }
}

#[test]
fn it_never_changes_the_drawer_on_a_rejected_request() {
    let start = Instant::now();
    let mut room = Room::new();
    let ids: Vec<ConnectionId> = (1..=4).collect();
    for id in &ids {
        room.connect(*id, start);
    }

    // Deterministic walk over requests and disconnects, stepping the clock
    // by uneven amounts so both cooldown and idle states get visited.
    let mut next_id = 5;
    let mut grants = 0;
    let mut now = start;
    for step in 0u64..400 {
        now += Duration::from_millis((step * 7919) % 45_000);
        let live: Vec<ConnectionId> = room.inboxes.keys().copied().collect();
        let actor = live[(step as usize * 31) % live.len()];

        if step % 5 == 4 {
            room.disconnect(actor, now);
            room.connect(next_id, now);
            next_id += 1;
        } else {
            let before = room.arbiter.current_drawer();
            room.send(actor, ClientMessage::RequestTurn, now);
            let reply = room.drain(actor);
            let granted = reply
                .iter()
                .any(|m| matches!(m, ServerMessage::YourTurn { .. }));

            if granted {
                assert_eq!(before, None, "granted while {:?} held the turn", before);
                assert_eq!(room.arbiter.current_drawer(), Some(actor));
                grants += 1;
            } else {
                assert_eq!(room.arbiter.current_drawer(), before);
                assert!(matches!(
                    reply.as_slice(),
                    [ServerMessage::TurnInfo {
                        can_draw: false,
                        ..
                    }]
                ));
                for inbox in room.inboxes.values() {
                    assert!(inbox.is_empty());
                }
            }
        }

        if let Some(drawer) = room.arbiter.current_drawer() {
            assert!(room.inboxes.contains_key(&drawer));
        }
        for id in room.inboxes.keys().copied().collect::<Vec<_>>() {
            room.drain(id);
        }
    }
    assert!(grants > 1);
}
