use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::NetConfig;

use super::error::NetError;
use super::protocol::Packet;
use super::stats::NetworkStats;

pub const FRAME_HEADER_LEN: usize = 4;

const READ_CHUNK: usize = 16 * 1024;

/// Outbound backlog allowed before a peer that stopped reading is dropped, in frames of
/// the maximum size.
const MAX_QUEUED_FRAMES: usize = 4;

/// Prefixes `payload` with its length as a big-endian u32.
pub fn encode_frame(payload: &[u8], max_frame_size: usize) -> Result<Vec<u8>, NetError> {
    if payload.len() > max_frame_size || payload.len() > u32::MAX as usize {
        return Err(NetError::FrameTooLarge {
            size: payload.len(),
            max: max_frame_size,
        });
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Reassembles length-prefixed frames from arbitrary stream chunks.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_size,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, NetError> {
        if self.buffer.len() < FRAME_HEADER_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; FRAME_HEADER_LEN];
        prefix.copy_from_slice(&self.buffer[..FRAME_HEADER_LEN]);
        let size = u32::from_be_bytes(prefix) as usize;
        if size > self.max_frame_size {
            return Err(NetError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }

        let end = FRAME_HEADER_LEN + size;
        if self.buffer.len() < end {
            return Ok(None);
        }

        let frame = self.buffer[FRAME_HEADER_LEN..end].to_vec();
        self.buffer.drain(..end);
        Ok(Some(frame))
    }
}

/// Resolves `host`, `host:port` or an IP literal, filling in `default_port` when the
/// target names none. IPv4 results are preferred.
pub fn resolve_peer(target: &str, default_port: u16) -> Result<SocketAddr, NetError> {
    let target = target.trim();

    let candidates: Vec<SocketAddr> = if let Ok(ip) = target.parse::<IpAddr>() {
        vec![SocketAddr::new(ip, default_port)]
    } else if let Ok(addr) = target.parse::<SocketAddr>() {
        vec![addr]
    } else {
        let has_port = target
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
        let query = if has_port {
            target.to_string()
        } else {
            format!("{}:{}", target, default_port)
        };
        query
            .to_socket_addrs()
            .map_err(|e| NetError::connection(target, e))?
            .collect()
    };

    candidates
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| candidates.first())
        .copied()
        .ok_or_else(|| {
            NetError::connection(
                target,
                io::Error::new(io::ErrorKind::NotFound, "no address found"),
            )
        })
}

fn classify(error: io::Error) -> NetError {
    match error.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => NetError::PeerDisconnected,
        _ => NetError::Io(error),
    }
}

/// Non-blocking TCP stream carrying length-prefixed packets in both directions.
pub struct StreamTransport {
    stream: TcpStream,
    peer_addr: SocketAddr,
    decoder: FrameDecoder,
    outbound: Vec<u8>,
    /// Start of the tail frame queued by `send_latest`, while none of it has been written.
    replaceable: Option<usize>,
    max_queued: usize,
    read_buffer: Vec<u8>,
    stats: NetworkStats,
    max_frame_size: usize,
    max_violations: u32,
    eof: bool,
    closed: bool,
}

impl StreamTransport {
    pub fn from_stream(stream: TcpStream, config: &NetConfig) -> Result<Self, NetError> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        Ok(Self {
            stream,
            peer_addr,
            decoder: FrameDecoder::new(config.max_frame_size),
            outbound: Vec::new(),
            replaceable: None,
            max_queued: config.max_frame_size.saturating_mul(MAX_QUEUED_FRAMES),
            read_buffer: vec![0u8; READ_CHUNK],
            stats: NetworkStats::default(),
            max_frame_size: config.max_frame_size,
            max_violations: config.max_protocol_violations.max(1),
            eof: false,
            closed: false,
        })
    }

    pub fn connect(addr: SocketAddr, config: &NetConfig) -> Result<Self, NetError> {
        let timeout = Duration::from_secs(config.connect_timeout_secs.max(1));
        let stream =
            TcpStream::connect_timeout(&addr, timeout).map_err(|e| NetError::connection(addr, e))?;
        Self::from_stream(stream, config)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut NetworkStats {
        &mut self.stats
    }

    /// Queues `packet` and writes as much as the socket accepts. Returns `true` once the
    /// outbound queue is empty.
    pub fn send(&mut self, packet: &Packet) -> Result<bool, NetError> {
        let frame = self.encode(packet)?;
        self.replaceable = None;
        self.enqueue(frame)
    }

    /// Like `send`, but the frame replaces one queued by an earlier `send_latest` call if
    /// no byte of it has reached the socket yet. Used for full snapshots.
    pub fn send_latest(&mut self, packet: &Packet) -> Result<bool, NetError> {
        let frame = self.encode(packet)?;
        if let Some(start) = self.replaceable.take() {
            self.outbound.truncate(start);
            self.stats.frames_superseded += 1;
        }
        self.replaceable = Some(self.outbound.len());
        self.enqueue(frame)
    }

    fn encode(&self, packet: &Packet) -> Result<Vec<u8>, NetError> {
        if self.closed {
            return Err(NetError::PeerDisconnected);
        }
        let payload = packet.serialize()?;
        encode_frame(&payload, self.max_frame_size)
    }

    fn enqueue(&mut self, frame: Vec<u8>) -> Result<bool, NetError> {
        if self.outbound.len() + frame.len() > self.max_queued {
            return Err(NetError::SlowPeer {
                queued: self.outbound.len(),
                max: self.max_queued,
            });
        }

        self.stats.record_sent(frame.len());
        self.outbound.extend_from_slice(&frame);
        self.flush()
    }

    pub fn flush(&mut self) -> Result<bool, NetError> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(NetError::PeerDisconnected),
                Ok(n) => {
                    self.outbound.drain(..n);
                    self.replaceable = self.replaceable.and_then(|start| start.checked_sub(n));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(classify(e)),
            }
        }
        Ok(true)
    }

    /// Drains the socket and returns every complete, valid packet. Malformed frames count
    /// as violations and are dropped. Once the peer has closed, frames already buffered
    /// are still returned; the call after that fails with `PeerDisconnected`.
    pub fn receive(&mut self) -> Result<Vec<Packet>, NetError> {
        if self.closed {
            return Err(NetError::PeerDisconnected);
        }

        while !self.eof {
            match self.stream.read(&mut self.read_buffer) {
                Ok(0) => self.eof = true,
                Ok(n) => self.decoder.push(&self.read_buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(classify(e)),
            }
        }

        let mut packets = Vec::new();
        while let Some(frame) = self.decoder.next_frame()? {
            match Packet::deserialize(&frame) {
                Ok(packet) => {
                    self.stats.record_received(FRAME_HEADER_LEN + frame.len());
                    packets.push(packet);
                }
                Err(e) => self.record_violation(&e.to_string())?,
            }
        }

        if packets.is_empty() && self.eof {
            return Err(NetError::PeerDisconnected);
        }
        Ok(packets)
    }

    /// Counts a dropped message. Fails once the connection has used up its allowance.
    pub fn record_violation(&mut self, reason: &str) -> Result<(), NetError> {
        self.stats.protocol_violations += 1;
        log::warn!(
            "protocol violation from {} ({}/{}): {}",
            self.peer_addr,
            self.stats.protocol_violations,
            self.max_violations,
            reason
        );

        if self.stats.protocol_violations >= self.max_violations {
            return Err(NetError::ProtocolViolation(reason.to_string()));
        }
        Ok(())
    }

    /// Flushes queued output for up to `linger`, half-closes, and waits for the peer's
    /// FIN within the same window before shutting the socket down.
    pub fn close(&mut self, linger: Duration) {
        if self.closed {
            return;
        }

        let deadline = Instant::now() + linger;
        loop {
            match self.flush() {
                Ok(true) | Err(_) => break,
                Ok(false) if Instant::now() >= deadline => break,
                Ok(false) => thread::sleep(Duration::from_millis(1)),
            }
        }

        let _ = self.stream.shutdown(Shutdown::Write);
        while !self.eof && Instant::now() < deadline {
            match self.stream.read(&mut self.read_buffer) {
                Ok(0) => self.eof = true,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(1))
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }

        self.shutdown();
    }

    pub fn shutdown(&mut self) {
        if !self.closed {
            let _ = self.stream.shutdown(Shutdown::Both);
            self.closed = true;
            log::debug!("closed stream to {}", self.peer_addr);
        }
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Non-blocking listener that hands out at most one stream per `accept` call.
pub struct HostListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl HostListener {
    pub fn bind(addr: SocketAddr) -> Result<Self, NetError> {
        let listener = TcpListener::bind(addr).map_err(|e| NetError::connection(addr, e))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn accept(&self) -> Result<Option<(TcpStream, SocketAddr)>, NetError> {
        match self.listener.accept() {
            Ok(pair) => Ok(Some(pair)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(NetError::connection(self.local_addr, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::net::protocol::{Message, SnapshotMessage};
    use crate::net::snapshot::WorldSnapshot;
    use crate::world::{GUEST_PLAYER, HOST_PLAYER, WorldState};
    use glam::Vec2;

    /// A connected transport whose peer never reads.
    fn stalled_pair(config: &NetConfig) -> (StreamTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, _) = listener.accept().unwrap();
        (StreamTransport::from_stream(stream, config).unwrap(), peer)
    }

    fn crowded_world() -> WorldState {
        let mut world = WorldState::new(&GameConfig::default(), &[HOST_PLAYER, GUEST_PLAYER]);
        for i in 0..200 {
            world.spawn_enemy(Vec2::new(i as f32, 0.0), GUEST_PLAYER);
        }
        world
    }

    fn snapshot_packet(world: &WorldState) -> Packet {
        Packet::new(Message::Snapshot(SnapshotMessage {
            tick: world.tick,
            world: WorldSnapshot::capture(world),
        }))
    }

    #[test]
    fn test_frames_reassemble_across_chunks() {
        let a = encode_frame(b"hello", 64).unwrap();
        let b = encode_frame(b"", 64).unwrap();
        let c = encode_frame(&[7u8; 40], 64).unwrap();
        let stream: Vec<u8> = [a, b, c].concat();

        let mut decoder = FrameDecoder::new(64);
        let mut frames = Vec::new();
        for chunk in stream.chunks(3) {
            decoder.push(chunk);
            while let Some(frame) = decoder.next_frame().unwrap() {
                frames.push(frame);
            }
        }

        assert_eq!(frames, vec![b"hello".to_vec(), Vec::new(), vec![7u8; 40]]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_incomplete_frame_waits_for_more_bytes() {
        let frame = encode_frame(b"abcdef", 64).unwrap();
        let mut decoder = FrameDecoder::new(64);
        decoder.push(&frame[..5]);
        assert!(decoder.next_frame().unwrap().is_none());
        decoder.push(&frame[5..]);
        assert_eq!(decoder.next_frame().unwrap(), Some(b"abcdef".to_vec()));
    }

    #[test]
    fn test_oversized_frames_are_refused() {
        assert!(matches!(
            encode_frame(&[0u8; 65], 64),
            Err(NetError::FrameTooLarge { size: 65, max: 64 })
        ));

        let mut decoder = FrameDecoder::new(64);
        decoder.push(&1_000u32.to_be_bytes());
        assert!(matches!(
            decoder.next_frame(),
            Err(NetError::FrameTooLarge { size: 1_000, .. })
        ));
    }

    #[test]
    fn test_resolve_fills_in_default_port() {
        assert_eq!(
            resolve_peer("127.0.0.1", 5555).unwrap(),
            "127.0.0.1:5555".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            resolve_peer(" 10.0.0.2:7000 ", 5555).unwrap(),
            "10.0.0.2:7000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(resolve_peer("localhost", 5555).unwrap().port(), 5555);
    }

    #[test]
    fn test_resolve_rejects_nonsense() {
        assert!(matches!(
            resolve_peer("not a host name", 5555),
            Err(NetError::ConnectionFailure { .. })
        ));
    }

    #[test]
    fn test_stalled_peer_only_queues_the_newest_snapshot() {
        let config = NetConfig::default();
        let (mut transport, _peer) = stalled_pair(&config);
        let mut world = crowded_world();
        let frame_len = FRAME_HEADER_LEN + snapshot_packet(&world).serialize().unwrap().len();
        assert!(frame_len < config.max_frame_size);

        // Two minutes at 60 Hz.
        for tick in 0..7_200 {
            world.tick = tick;
            transport.send_latest(&snapshot_packet(&world)).unwrap();
            assert!(transport.outbound.len() <= 2 * frame_len);
        }

        assert!(transport.stats().frames_superseded > 0);
        assert!(!transport.closed);
    }

    #[test]
    fn test_stalled_peer_is_dropped_once_the_backlog_is_full() {
        let config = NetConfig {
            max_frame_size: 8 * 1024,
            ..NetConfig::default()
        };
        let (mut transport, _peer) = stalled_pair(&config);
        let packet = snapshot_packet(&crowded_world());

        let mut failure = None;
        for _ in 0..100_000 {
            if let Err(e) = transport.send(&packet) {
                failure = Some(e);
                break;
            }
        }

        assert!(matches!(failure, Some(NetError::SlowPeer { max: 32_768, .. })));
        assert!(transport.outbound.len() <= 32_768);
    }
}
