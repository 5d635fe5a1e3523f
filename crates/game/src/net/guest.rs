use std::net::SocketAddr;
use std::time::Duration;

use crate::config::NetConfig;
use crate::simulation::Intent;
use crate::world::{HOST_PLAYER, PlayerId};

use super::connection::ConnectionState;
use super::error::NetError;
use super::protocol::{InputMessage, Message, Packet, SnapshotMessage};
use super::snapshot::SnapshotGate;
use super::stats::NetworkStats;
use super::transport::StreamTransport;

/// Mirroring end of a session link. Forwards local intent and keeps the newest snapshot.
pub struct GuestEndpoint {
    config: NetConfig,
    transport: Option<StreamTransport>,
    state: ConnectionState,
    player_id: Option<PlayerId>,
    gate: SnapshotGate,
}

impl GuestEndpoint {
    /// Blocks for at most the configured connect timeout.
    pub fn connect(addr: SocketAddr, config: NetConfig) -> Result<Self, NetError> {
        log::info!("connecting to host at {}", addr);
        let transport = StreamTransport::connect(addr, &config)?;
        log::info!("connected to {}, awaiting hello", addr);

        Ok(Self {
            config,
            transport: Some(transport),
            state: ConnectionState::Handshaking,
            player_id: None,
            gate: SnapshotGate::new(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.transport.as_ref().map(StreamTransport::peer_addr)
    }

    pub fn stats(&self) -> Option<&NetworkStats> {
        self.transport.as_ref().map(StreamTransport::stats)
    }

    pub fn last_applied_tick(&self) -> Option<u64> {
        self.gate.last_applied()
    }

    /// Reads everything the host sent since the last call. Returns the newest snapshot
    /// that is newer than any already returned; older and duplicate ticks are dropped.
    pub fn poll(&mut self) -> Result<Option<SnapshotMessage>, NetError> {
        let result = self.drain();
        self.fail_on_error(result)
    }

    fn drain(&mut self) -> Result<Option<SnapshotMessage>, NetError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };

        transport.flush()?;

        let mut newest = None;
        for packet in transport.receive()? {
            match (self.state, packet.payload) {
                (ConnectionState::Handshaking, Message::Hello { player_id })
                    if player_id != HOST_PLAYER =>
                {
                    log::info!("synchronized as player {}", player_id);
                    self.player_id = Some(player_id);
                    self.state = ConnectionState::Synchronized;
                }
                (ConnectionState::Synchronized, Message::Snapshot(snapshot)) => {
                    if snapshot.tick != snapshot.world.tick {
                        transport.record_violation(&format!(
                            "snapshot tick {} does not match world tick {}",
                            snapshot.tick, snapshot.world.tick
                        ))?;
                    } else if self.gate.admit(snapshot.tick) {
                        newest = Some(snapshot);
                    } else {
                        transport.stats_mut().stale_snapshots += 1;
                        log::debug!("dropped stale snapshot for tick {}", snapshot.tick);
                    }
                }
                (state, payload) => transport.record_violation(&format!(
                    "unexpected {} while {}",
                    payload.kind(),
                    state.label()
                ))?,
            }
        }

        Ok(newest)
    }

    /// Sends this tick's intent. A no-op until the handshake has completed.
    pub fn send_input(&mut self, intent: &Intent, tick: u64) -> Result<(), NetError> {
        let result = self.push_input(intent, tick);
        self.fail_on_error(result)
    }

    fn push_input(&mut self, intent: &Intent, tick: u64) -> Result<(), NetError> {
        let (Some(player_id), Some(transport)) = (self.player_id, self.transport.as_mut()) else {
            return Ok(());
        };
        if !self.state.is_synchronized() {
            return Ok(());
        }

        let message = InputMessage::from_intent(player_id, tick, intent);
        transport.send(&Packet::new(Message::Input(message)))?;
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close(Duration::from_millis(self.config.close_linger_ms));
        }
        if self.state != ConnectionState::Terminated {
            log::info!("guest link closed");
            self.state = ConnectionState::Terminated;
        }
    }

    fn fail_on_error<T>(&mut self, result: Result<T, NetError>) -> Result<T, NetError> {
        if let Err(e) = &result {
            log::warn!("lost host link: {}", e);
            if let Some(mut transport) = self.transport.take() {
                transport.shutdown();
            }
            self.state = ConnectionState::Terminated;
        }
        result
    }
}
