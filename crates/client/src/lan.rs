use std::net::{IpAddr, UdpSocket};

/// Address other machines on the LAN can reach this one at. Connecting a UDP socket
/// sends nothing; it only makes the OS pick the outbound interface.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket
        .local_addr()
        .ok()
        .map(|addr| addr.ip())
        .filter(|ip| !ip.is_unspecified())
}
