use std::net::SocketAddr;
use std::time::Duration;

use crate::config::NetConfig;
use crate::world::{GUEST_PLAYER, PlayerId, WorldState};

use super::connection::ConnectionState;
use super::error::NetError;
use super::protocol::{InputMessage, Message, Packet, SnapshotMessage};
use super::snapshot::WorldSnapshot;
use super::stats::NetworkStats;
use super::transport::{HostListener, StreamTransport};

/// Authoritative end of a session link: accepts one guest, collects its input and
/// pushes snapshots.
pub struct HostEndpoint {
    config: NetConfig,
    listener: Option<HostListener>,
    transport: Option<StreamTransport>,
    local_addr: SocketAddr,
    state: ConnectionState,
    guest_id: PlayerId,
}

impl HostEndpoint {
    pub fn listen(addr: SocketAddr, config: NetConfig) -> Result<Self, NetError> {
        let listener = HostListener::bind(addr)?;
        let local_addr = listener.local_addr();
        log::info!("listening for a guest on {}", local_addr);

        Ok(Self {
            config,
            listener: Some(listener),
            transport: None,
            local_addr,
            state: ConnectionState::Listening,
            guest_id: GUEST_PLAYER,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.transport.as_ref().map(StreamTransport::peer_addr)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn guest_id(&self) -> PlayerId {
        self.guest_id
    }

    pub fn stats(&self) -> Option<&NetworkStats> {
        self.transport.as_ref().map(StreamTransport::stats)
    }

    /// Drives the handshake. Accepts a pending guest while listening and promotes the link
    /// to `Synchronized` once the `Hello` has left the socket.
    pub fn poll(&mut self) -> Result<ConnectionState, NetError> {
        let result = self.advance_handshake();
        self.fail_on_error(result)?;
        Ok(self.state)
    }

    fn advance_handshake(&mut self) -> Result<(), NetError> {
        if self.state == ConnectionState::Listening {
            let accepted = match &self.listener {
                Some(listener) => listener.accept()?,
                None => None,
            };

            if let Some((stream, peer)) = accepted {
                log::info!("guest connected from {}", peer);
                // Exactly one guest per session.
                self.listener = None;

                let mut transport = StreamTransport::from_stream(stream, &self.config)?;
                transport.send(&Packet::new(Message::Hello {
                    player_id: self.guest_id,
                }))?;
                self.transport = Some(transport);
                self.state = ConnectionState::Handshaking;
            }
        }

        if self.state == ConnectionState::Handshaking {
            let transport = self.transport.as_mut().ok_or(NetError::PeerDisconnected)?;
            if transport.flush()? {
                log::info!("guest {} synchronized", self.guest_id);
                self.state = ConnectionState::Synchronized;
            }
        }

        Ok(())
    }

    /// Every input message that arrived since the last call, oldest first.
    pub fn receive_inputs(&mut self) -> Result<Vec<InputMessage>, NetError> {
        let result = self.collect_inputs();
        self.fail_on_error(result)
    }

    fn collect_inputs(&mut self) -> Result<Vec<InputMessage>, NetError> {
        let guest_id = self.guest_id;
        let Some(transport) = self.transport.as_mut() else {
            return Ok(Vec::new());
        };

        let mut inputs = Vec::new();
        for packet in transport.receive()? {
            match packet.payload {
                Message::Input(input) if input.player_id == guest_id && input.is_finite() => {
                    inputs.push(input)
                }
                Message::Input(input) if input.player_id != guest_id => transport
                    .record_violation(&format!("input for player {}", input.player_id))?,
                Message::Input(_) => transport.record_violation("non-finite input")?,
                other => transport
                    .record_violation(&format!("unexpected {} from guest", other.kind()))?,
            }
        }
        Ok(inputs)
    }

    pub fn send_snapshot(&mut self, world: &WorldState) -> Result<(), NetError> {
        let result = self.push_snapshot(world);
        self.fail_on_error(result)
    }

    fn push_snapshot(&mut self, world: &WorldState) -> Result<(), NetError> {
        if !self.state.is_synchronized() {
            return Ok(());
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        transport.send_latest(&Packet::new(Message::Snapshot(SnapshotMessage {
            tick: world.tick,
            world: WorldSnapshot::capture(world),
        })))?;
        Ok(())
    }

    /// Flushes whatever is still queued, then releases the stream and the listener.
    pub fn close(&mut self) {
        self.listener = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close(Duration::from_millis(self.config.close_linger_ms));
        }
        if self.state != ConnectionState::Terminated {
            log::info!("host link closed");
            self.state = ConnectionState::Terminated;
        }
    }

    fn fail_on_error<T>(&mut self, result: Result<T, NetError>) -> Result<T, NetError> {
        if let Err(e) = &result {
            log::warn!("dropping guest link: {}", e);
            self.listener = None;
            if let Some(mut transport) = self.transport.take() {
                transport.shutdown();
            }
            self.state = ConnectionState::Terminated;
        }
        result
    }
}
