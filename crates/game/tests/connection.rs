use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use cubestorm::net::encode_frame;
use cubestorm::{
    ConnectionState, GUEST_PLAYER, GameConfig, GuestEndpoint, HOST_PLAYER, HostEndpoint, Intent,
    NetConfig, NetError, WorldState,
};
use glam::Vec2;

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn wait_until<T>(timeout_ms: u64, mut poll: impl FnMut() -> Option<T>) -> Option<T> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if let Some(value) = poll() {
            return Some(value);
        }
        thread::sleep(Duration::from_millis(1));
    }
    None
}

fn synchronized_pair() -> (HostEndpoint, GuestEndpoint) {
    let mut host = HostEndpoint::listen(loopback(), NetConfig::default()).unwrap();
    assert_eq!(host.state(), ConnectionState::Listening);

    let mut guest = GuestEndpoint::connect(host.local_addr(), NetConfig::default()).unwrap();
    assert_eq!(guest.state(), ConnectionState::Handshaking);

    wait_until(1000, || host.poll().unwrap().is_synchronized().then_some(()))
        .expect("host never synchronized");
    wait_until(1000, || {
        guest.poll().unwrap();
        guest.state().is_synchronized().then_some(())
    })
    .expect("guest never synchronized");

    (host, guest)
}

fn two_player_world(tick: u64) -> WorldState {
    let mut world = WorldState::new(&GameConfig::default(), &[HOST_PLAYER, GUEST_PLAYER]);
    world.tick = tick;
    world
}

#[test]
fn test_handshake_assigns_guest_id() {
    let (host, guest) = synchronized_pair();

    assert_eq!(guest.player_id(), Some(GUEST_PLAYER));
    assert_eq!(host.guest_id(), GUEST_PLAYER);
    assert_eq!(host.peer_addr().map(|a| a.ip()), Some(guest.peer_addr().unwrap().ip()));
    assert_eq!(guest.stats().unwrap().frames_received, 1);
}

#[test]
fn test_snapshot_reaches_guest_and_input_reaches_host() {
    let (mut host, mut guest) = synchronized_pair();

    let mut world = two_player_world(12);
    world.spawn_enemy(Vec2::new(0.0, 50.0), GUEST_PLAYER);
    host.send_snapshot(&world).unwrap();

    let snapshot = wait_until(1000, || guest.poll().unwrap()).expect("no snapshot");
    assert_eq!(snapshot.tick, 12);
    assert_eq!(snapshot.world.restore(), world);

    let intent = Intent::moving(Vec2::NEG_X).with_sprint(true).with_fire(Vec2::Y);
    guest.send_input(&intent, snapshot.tick).unwrap();

    let inputs = wait_until(1000, || {
        let inputs = host.receive_inputs().unwrap();
        (!inputs.is_empty()).then_some(inputs)
    })
    .expect("no input");

    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].player_id, GUEST_PLAYER);
    assert_eq!(inputs[0].tick, 12);
    assert_eq!(inputs[0].intent(), intent);
}

#[test]
fn test_guest_applies_5_then_7() {
    let (mut host, mut guest) = synchronized_pair();
    let mut applied = Vec::new();

    host.send_snapshot(&two_player_world(5)).unwrap();
    let first = wait_until(1000, || guest.poll().unwrap()).expect("no snapshot");
    applied.push(first.tick);

    host.send_snapshot(&two_player_world(3)).unwrap();
    host.send_snapshot(&two_player_world(7)).unwrap();
    let second = wait_until(1000, || guest.poll().unwrap()).expect("no snapshot");
    applied.push(second.tick);

    assert_eq!(applied, vec![5, 7]);
    assert_eq!(guest.last_applied_tick(), Some(7));
    assert_eq!(guest.stats().unwrap().stale_snapshots, 1);
}

#[test]
fn test_guest_disconnect_terminates_host() {
    let (mut host, guest) = synchronized_pair();
    drop(guest);

    let error = wait_until(1000, || host.receive_inputs().err()).expect("host never noticed");

    assert!(matches!(error, NetError::PeerDisconnected | NetError::Io(_)));
    assert_eq!(host.state(), ConnectionState::Terminated);
    assert!(host.receive_inputs().unwrap().is_empty());
}

#[test]
fn test_host_close_flushes_final_snapshot() {
    let (mut host, mut guest) = synchronized_pair();

    let mut world = two_player_world(99);
    world.player_mut(HOST_PLAYER).unwrap().alive = false;
    world.terminal = true;
    host.send_snapshot(&world).unwrap();
    host.close();
    assert_eq!(host.state(), ConnectionState::Terminated);

    let last = wait_until(1000, || guest.poll().unwrap()).expect("final snapshot lost");
    assert!(last.world.terminal);

    let error = wait_until(1000, || guest.poll().err()).expect("guest never noticed");
    assert!(matches!(error, NetError::PeerDisconnected | NetError::Io(_)));
    assert_eq!(guest.state(), ConnectionState::Terminated);
}

#[test]
fn test_repeated_garbage_terminates_connection() {
    let mut host = HostEndpoint::listen(loopback(), NetConfig::default()).unwrap();
    let mut raw = TcpStream::connect(host.local_addr()).unwrap();
    wait_until(1000, || host.poll().unwrap().is_synchronized().then_some(()))
        .expect("host never synchronized");

    raw.write_all(&encode_frame(&[0xab; 24], 1024).unwrap()).unwrap();
    raw.write_all(&encode_frame(&[0xcd; 24], 1024).unwrap()).unwrap();
    raw.flush().unwrap();

    thread::sleep(Duration::from_millis(50));
    assert!(host.receive_inputs().unwrap().is_empty());
    assert_eq!(host.stats().unwrap().protocol_violations, 2);
    assert_eq!(host.state(), ConnectionState::Synchronized);

    raw.write_all(&encode_frame(&[0xef; 24], 1024).unwrap()).unwrap();
    raw.flush().unwrap();

    let error = wait_until(1000, || host.receive_inputs().err()).expect("never terminated");
    assert!(matches!(error, NetError::ProtocolViolation(_)));
    assert_eq!(host.state(), ConnectionState::Terminated);
}

#[test]
fn test_oversized_frame_is_fatal() {
    let mut host = HostEndpoint::listen(loopback(), NetConfig::default()).unwrap();
    let mut raw = TcpStream::connect(host.local_addr()).unwrap();
    wait_until(1000, || host.poll().unwrap().is_synchronized().then_some(()))
        .expect("host never synchronized");

    raw.write_all(&(10u32 * 1024 * 1024).to_be_bytes()).unwrap();
    raw.flush().unwrap();

    let error = wait_until(1000, || host.receive_inputs().err()).expect("never terminated");
    assert!(matches!(error, NetError::FrameTooLarge { .. }));
}

#[test]
fn test_connect_to_closed_port_fails() {
    let free = TcpListener::bind(loopback()).unwrap().local_addr().unwrap();

    let result = GuestEndpoint::connect(free, NetConfig::default());

    assert!(matches!(result, Err(NetError::ConnectionFailure { .. })));
}
