#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub protocol_violations: u32,
    pub stale_snapshots: u64,
    /// Snapshots dropped from the send queue in favour of a newer one.
    pub frames_superseded: u64,
}

impl NetworkStats {
    pub fn record_sent(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.frames_received += 1;
        self.bytes_received += bytes as u64;
    }
}
