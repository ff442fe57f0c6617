use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only snapshot of one cart-pole system after a tick.
///
/// Rendering collaborators consume these; nothing in the core reads one
/// back into a live state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Ticks survived so far.
    pub ticks: u64,
    /// Cart center, world coordinates.
    pub position: f64,
    /// Cart horizontal velocity.
    pub velocity: f64,
    /// Pole deviation from upright, radians. 0 = balanced.
    pub angle: f64,
    /// Pole angular velocity.
    pub angular_velocity: f64,
    /// Whether the system has failed.
    pub terminal: bool,
}

/// Observation vector fed to a decision source.
///
/// Layout: `[offset, velocity, angle, angular_velocity]`, each scaled into
/// roughly `[-1, 1]` (offset by half the world width, velocity and angular
/// velocity by 5, angle by pi/2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f64; 4]);

impl Observation {
    pub fn offset(&self) -> f64 {
        self.0[0]
    }

    pub fn velocity(&self) -> f64 {
        self.0[1]
    }

    pub fn angle(&self) -> f64 {
        self.0[2]
    }

    pub fn angular_velocity(&self) -> f64 {
        self.0[3]
    }
}

/// Unique identification of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque display identity for an agent. Irrelevant to physics; renderers
/// use it to keep a stable color per cart across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualToken {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VisualToken {
    /// Derives a stable color from an agent id.
    #[must_use]
    pub fn from_id(id: &AgentId) -> Self {
        let bytes = id.0.as_bytes();
        Self {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_accessors() {
        let obs = Observation([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(obs.offset(), 0.1);
        assert_eq!(obs.velocity(), 0.2);
        assert_eq!(obs.angle(), 0.3);
        assert_eq!(obs.angular_velocity(), 0.4);
    }

    #[test]
    fn test_visual_token_stable() {
        let id = AgentId::new();
        assert_eq!(VisualToken::from_id(&id), VisualToken::from_id(&id));
    }
}
