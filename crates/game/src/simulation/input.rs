use glam::Vec2;

use crate::world::PlayerId;

/// What a player wants to do this tick, before the simulation resolves it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    pub movement: Vec2,
    pub sprint: bool,
    pub fire: Vec<Vec2>,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(direction: Vec2) -> Self {
        Self {
            movement: direction.normalize_or_zero(),
            ..Self::default()
        }
    }

    pub fn with_sprint(mut self, sprint: bool) -> Self {
        self.sprint = sprint;
        self
    }

    pub fn with_fire(mut self, direction: Vec2) -> Self {
        self.fire.push(direction);
        self
    }

    pub fn is_idle(&self) -> bool {
        self.movement == Vec2::ZERO && self.fire.is_empty()
    }

    /// First usable fire direction, normalized.
    pub fn primary_fire(&self) -> Option<Vec2> {
        self.fire
            .iter()
            .map(|d| d.normalize_or_zero())
            .find(|d| *d != Vec2::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInput {
    pub player_id: PlayerId,
    pub intent: Intent,
}

impl PlayerInput {
    pub fn new(player_id: PlayerId, intent: Intent) -> Self {
        Self { player_id, intent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_normalizes_direction() {
        let intent = Intent::moving(Vec2::new(3.0, 4.0));
        assert!((intent.movement.length() - 1.0).abs() < 1e-6);
        assert_eq!(Intent::moving(Vec2::ZERO).movement, Vec2::ZERO);
    }

    #[test]
    fn test_primary_fire_skips_zero_vectors() {
        let intent = Intent::idle()
            .with_fire(Vec2::ZERO)
            .with_fire(Vec2::new(0.0, -5.0));
        assert_eq!(intent.primary_fire(), Some(Vec2::new(0.0, -1.0)));
        assert_eq!(Intent::idle().with_fire(Vec2::ZERO).primary_fire(), None);
    }
}
