mod latch;
mod view;

use std::net::SocketAddr;

pub use latch::InputLatch;
pub use view::{PlayerView, RenderView, SessionEnd, SessionStatus};

use crate::config::{ConfigError, GameConfig, NetConfig};
use crate::net::{
    ConnectionState, GuestEndpoint, HostEndpoint, NetError, NetworkStats, resolve_peer,
};
use crate::simulation::{Intent, PlayerInput, Simulation, SimulationError, TickEvents};
use crate::world::{GUEST_PLAYER, HOST_PLAYER, PlayerId, WorldState};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Net(#[from] NetError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Local,
    Host { bind: SocketAddr },
    /// `target` is a hostname or IPv4 address, optionally with a port.
    Join { target: String },
}

enum Role {
    Local {
        simulation: Simulation,
        world: WorldState,
    },
    Host {
        simulation: Simulation,
        world: WorldState,
        endpoint: HostEndpoint,
        latch: InputLatch,
    },
    Guest {
        endpoint: GuestEndpoint,
        mirror: Option<WorldState>,
    },
}

/// One game from start to teardown. The caller ticks it at the configured rate, handing
/// over the local intent and reading back a `RenderView`.
pub struct Session {
    config: GameConfig,
    dt: f32,
    role: Role,
    status: SessionStatus,
    last_events: Option<TickEvents>,
}

impl Session {
    pub fn start(mode: SessionMode, config: GameConfig, net: NetConfig) -> Result<Self, SessionError> {
        config.validate()?;
        net.validate()?;
        let dt = 1.0 / net.tick_rate as f32;

        let (role, status) = match mode {
            SessionMode::Local => {
                let simulation = Simulation::new(config.clone());
                let world = simulation.new_world(&[HOST_PLAYER]);
                log::info!("local session started with seed {:#x}", config.seed);
                (Role::Local { simulation, world }, SessionStatus::Running)
            }
            SessionMode::Host { bind } => {
                let endpoint = HostEndpoint::listen(bind, net)?;
                let simulation = Simulation::new(config.clone());
                let world = simulation.new_world(&[HOST_PLAYER, endpoint.guest_id()]);
                (
                    Role::Host {
                        simulation,
                        world,
                        endpoint,
                        latch: InputLatch::new(),
                    },
                    SessionStatus::WaitingForPeer,
                )
            }
            SessionMode::Join { target } => {
                let addr = resolve_peer(&target, net.port)?;
                let endpoint = GuestEndpoint::connect(addr, net)?;
                (
                    Role::Guest {
                        endpoint,
                        mirror: None,
                    },
                    SessionStatus::WaitingForPeer,
                )
            }
        };

        Ok(Self {
            config,
            dt,
            role,
            status,
            last_events: None,
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn role_label(&self) -> &'static str {
        match self.role {
            Role::Local { .. } => "local",
            Role::Host { .. } => "host",
            Role::Guest { .. } => "guest",
        }
    }

    pub fn local_player(&self) -> PlayerId {
        match &self.role {
            Role::Local { .. } | Role::Host { .. } => HOST_PLAYER,
            Role::Guest { endpoint, .. } => endpoint.player_id().unwrap_or(GUEST_PLAYER),
        }
    }

    /// The authoritative world, or the guest's newest mirror.
    pub fn world(&self) -> Option<&WorldState> {
        match &self.role {
            Role::Local { world, .. } | Role::Host { world, .. } => Some(world),
            Role::Guest { mirror, .. } => mirror.as_ref(),
        }
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        match &self.role {
            Role::Local { .. } => None,
            Role::Host { endpoint, .. } => Some(endpoint.state()),
            Role::Guest { endpoint, .. } => Some(endpoint.state()),
        }
    }

    /// Address the host is listening on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Host { endpoint, .. } => Some(endpoint.local_addr()),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&NetworkStats> {
        match &self.role {
            Role::Local { .. } => None,
            Role::Host { endpoint, .. } => endpoint.stats(),
            Role::Guest { endpoint, .. } => endpoint.stats(),
        }
    }

    /// What the most recent tick produced. `None` for guests and for ticks that did not
    /// advance the world.
    pub fn last_events(&self) -> Option<&TickEvents> {
        self.last_events.as_ref()
    }

    /// Runs one fixed tick. Network faults end the session with
    /// `SessionEnd::Disconnected` rather than failing the call.
    pub fn tick(&mut self, intent: &Intent) -> Result<SessionStatus, SessionError> {
        if self.status.is_ended() {
            return Ok(self.status);
        }

        let dt = self.dt;
        self.last_events = None;
        let next = match &mut self.role {
            Role::Local { simulation, world } => {
                let inputs = [PlayerInput::new(HOST_PLAYER, intent.clone())];
                self.last_events = Some(simulation.advance(world, &inputs, dt)?);
                SessionStatus::of_world(world, HOST_PLAYER)
            }
            Role::Host {
                simulation,
                world,
                endpoint,
                latch,
            } => {
                let (status, events) = tick_host(simulation, world, endpoint, latch, intent, dt)?;
                self.last_events = events;
                status
            }
            Role::Guest { endpoint, mirror } => tick_guest(endpoint, mirror, intent),
        };

        match next {
            SessionStatus::Ended(end) => self.finish(end),
            other => self.status = other,
        }
        Ok(self.status)
    }

    pub fn view(&self) -> RenderView {
        match self.world() {
            Some(world) => RenderView::from_world(world, &self.config, self.local_player(), self.status),
            None => RenderView::empty(&self.config, self.status),
        }
    }

    pub fn quit(&mut self) {
        if !self.status.is_ended() {
            log::info!("{} session quit", self.role_label());
            self.finish(SessionEnd::Quit);
        }
        self.teardown();
    }

    fn finish(&mut self, end: SessionEnd) {
        log::info!("{} session ended: {:?}", self.role_label(), end);
        self.status = SessionStatus::Ended(end);
        self.teardown();
    }

    fn teardown(&mut self) {
        match &mut self.role {
            Role::Local { .. } => {}
            Role::Host { endpoint, .. } => endpoint.close(),
            Role::Guest { endpoint, .. } => endpoint.close(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn tick_host(
    simulation: &mut Simulation,
    world: &mut WorldState,
    endpoint: &mut HostEndpoint,
    latch: &mut InputLatch,
    intent: &Intent,
    dt: f32,
) -> Result<(SessionStatus, Option<TickEvents>), SessionError> {
    match endpoint.poll() {
        Err(_) => return Ok((SessionStatus::Ended(SessionEnd::Disconnected), None)),
        Ok(state) if !state.is_synchronized() => return Ok((SessionStatus::WaitingForPeer, None)),
        Ok(_) => {}
    }

    match endpoint.receive_inputs() {
        Ok(messages) => messages.iter().for_each(|m| latch.push(m)),
        Err(_) => return Ok((SessionStatus::Ended(SessionEnd::Disconnected), None)),
    }

    let guest = endpoint.guest_id();
    let mut inputs = vec![PlayerInput::new(HOST_PLAYER, intent.clone())];
    if let Some(remote) = latch.take(guest) {
        inputs.push(PlayerInput::new(guest, remote));
    }

    let events = simulation.advance(world, &inputs, dt)?;
    let status = SessionStatus::of_world(world, HOST_PLAYER);

    if endpoint.send_snapshot(world).is_err() && !status.is_ended() {
        return Ok((SessionStatus::Ended(SessionEnd::Disconnected), Some(events)));
    }
    Ok((status, Some(events)))
}

fn tick_guest(
    endpoint: &mut GuestEndpoint,
    mirror: &mut Option<WorldState>,
    intent: &Intent,
) -> SessionStatus {
    match endpoint.poll() {
        Ok(Some(snapshot)) => *mirror = Some(snapshot.world.restore()),
        Ok(None) => {}
        Err(_) => return SessionStatus::Ended(SessionEnd::Disconnected),
    }

    let local = endpoint.player_id().unwrap_or(GUEST_PLAYER);
    if let Some(world) = mirror.as_ref() {
        if world.is_terminal() {
            return SessionStatus::of_world(world, local);
        }
    }

    let tick = mirror.as_ref().map_or(0, |w| w.tick);
    if endpoint.send_input(intent, tick).is_err() {
        return SessionStatus::Ended(SessionEnd::Disconnected);
    }

    if mirror.is_some() {
        SessionStatus::Running
    } else {
        SessionStatus::WaitingForPeer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_invalid_config_is_refused() {
        let config = GameConfig {
            player_speed: -1.0,
            ..GameConfig::default()
        };
        assert!(matches!(
            Session::start(SessionMode::Local, config, NetConfig::default()),
            Err(SessionError::Config(ConfigError::NotPositive { .. }))
        ));

        let net = NetConfig {
            tick_rate: 0,
            ..NetConfig::default()
        };
        assert!(matches!(
            Session::start(SessionMode::Local, GameConfig::default(), net),
            Err(SessionError::Config(ConfigError::TickRate))
        ));
    }

    #[test]
    fn test_local_session_ticks_and_quits() {
        let mut session = Session::start(SessionMode::Local, GameConfig::default(), NetConfig::default()).unwrap();
        assert_eq!(session.connection_state(), None);

        let status = session.tick(&Intent::moving(Vec2::X)).unwrap();
        assert_eq!(status, SessionStatus::Running);

        let view = session.view();
        assert_eq!(view.tick, 1);
        assert!(view.local_player().unwrap().position.x > 400.0);

        session.quit();
        assert_eq!(session.status(), SessionStatus::Ended(SessionEnd::Quit));
        assert_eq!(session.tick(&Intent::idle()).unwrap(), session.status());
        assert_eq!(session.view().tick, 1);
    }

    #[test]
    fn test_local_death_ends_with_fallen() {
        let mut session = Session::start(SessionMode::Local, GameConfig::default(), NetConfig::default()).unwrap();
        if let Role::Local { world, .. } = &mut session.role {
            world.spawn_enemy(Vec2::new(400.0, 300.0), HOST_PLAYER);
        }

        let status = session.tick(&Intent::idle()).unwrap();

        assert_eq!(status, SessionStatus::Ended(SessionEnd::Fallen));
        let view = session.view();
        assert!(view.terminal);
        assert!(!view.local_player().unwrap().alive);
        assert_eq!(session.last_events().unwrap().fallen, vec![HOST_PLAYER]);
    }
}
