use glam::Vec2;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::simulation::Intent;
use crate::world::PlayerId;

use super::snapshot::WorldSnapshot;

pub const PROTOCOL_MAGIC: u32 = 0x4355_4253;
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl PacketHeader {
    pub fn new() -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Guest intent for one tick. `tick` is the newest world tick the guest had seen when it
/// sampled the input.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct InputMessage {
    pub player_id: PlayerId,
    pub tick: u64,
    pub movement: [f32; 2],
    pub sprinting: bool,
    pub fire_direction: Option<[f32; 2]>,
}

impl InputMessage {
    pub fn from_intent(player_id: PlayerId, tick: u64, intent: &Intent) -> Self {
        Self {
            player_id,
            tick,
            movement: intent.movement.to_array(),
            sprinting: intent.sprint,
            fire_direction: intent.primary_fire().map(|d| d.to_array()),
        }
    }

    pub fn intent(&self) -> Intent {
        let mut intent = Intent::moving(Vec2::from_array(self.movement)).with_sprint(self.sprinting);
        if let Some(direction) = self.fire_direction {
            intent = intent.with_fire(Vec2::from_array(direction));
        }
        intent
    }

    pub fn is_finite(&self) -> bool {
        self.movement.iter().all(|v| v.is_finite())
            && self
                .fire_direction
                .is_none_or(|d| d.iter().all(|v| v.is_finite()))
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct SnapshotMessage {
    pub tick: u64,
    pub world: WorldSnapshot,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Message {
    Hello { player_id: PlayerId },
    Input(InputMessage),
    Snapshot(SnapshotMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::Input(_) => "input",
            Message::Snapshot(_) => "snapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Message,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad header: magic {magic:#x}, version {version}")]
    Header { magic: u32, version: u32 },
}

impl Packet {
    pub fn new(payload: Message) -> Self {
        Self {
            header: PacketHeader::new(),
            payload,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    /// Frame payloads are sliced out of a byte stream with no alignment guarantee, so the
    /// bytes are copied into an aligned buffer before validation.
    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        let mut aligned: AlignedVec = AlignedVec::with_capacity(data.len());
        aligned.extend_from_slice(data);

        let packet =
            rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::Header {
                magic: packet.header.magic,
                version: packet.header.version,
            });
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::world::{GUEST_PLAYER, HOST_PLAYER, WorldState};

    #[test]
    fn test_input_carries_primary_fire_only() {
        let intent = Intent::moving(Vec2::new(0.0, 2.0))
            .with_sprint(true)
            .with_fire(Vec2::ZERO)
            .with_fire(Vec2::new(-3.0, 0.0))
            .with_fire(Vec2::X);

        let message = InputMessage::from_intent(GUEST_PLAYER, 9, &intent);
        assert_eq!(message.movement, [0.0, 1.0]);
        assert_eq!(message.fire_direction, Some([-1.0, 0.0]));

        let decoded = message.intent();
        assert!(decoded.sprint);
        assert_eq!(decoded.fire, vec![Vec2::NEG_X]);
    }

    #[test]
    fn test_snapshot_packet_survives_the_wire() {
        let config = GameConfig::default();
        let mut world = WorldState::new(&config, &[HOST_PLAYER, GUEST_PLAYER]);
        world.spawn_enemy(Vec2::new(12.0, 0.0), GUEST_PLAYER);
        world.spawn_projectile(Vec2::new(400.0, 280.0), Vec2::NEG_Y, HOST_PLAYER);
        world.tick = 41;

        let packet = Packet::new(Message::Snapshot(SnapshotMessage {
            tick: world.tick,
            world: WorldSnapshot::capture(&world),
        }));
        let bytes = packet.serialize().unwrap();

        // Force a misaligned source slice.
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        let decoded = Packet::deserialize(&shifted[1..]).unwrap();

        assert_eq!(decoded, packet);
        let Message::Snapshot(snapshot) = decoded.payload else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.world.restore(), world);
    }

    #[test]
    fn test_foreign_header_is_rejected() {
        let mut packet = Packet::new(Message::Hello {
            player_id: GUEST_PLAYER,
        });
        packet.header.magic = 0xdead_beef;
        let bytes = packet.serialize().unwrap();

        assert!(matches!(
            Packet::deserialize(&bytes),
            Err(PacketError::Header {
                magic: 0xdead_beef,
                ..
            })
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            Packet::deserialize(&[0xff; 7]),
            Err(PacketError::Deserialize(_))
        ));
    }
}
