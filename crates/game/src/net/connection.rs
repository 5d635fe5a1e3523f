/// Lifecycle shared by both ends of a session link. A guest's connect attempt blocks
/// inside `GuestEndpoint::connect`, so its link starts at `Handshaking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Listening,
    Handshaking,
    Synchronized,
    Terminated,
}

impl ConnectionState {
    pub fn is_synchronized(self) -> bool {
        self == ConnectionState::Synchronized
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Listening => "listening",
            ConnectionState::Handshaking => "handshaking",
            ConnectionState::Synchronized => "synchronized",
            ConnectionState::Terminated => "terminated",
        }
    }
}
