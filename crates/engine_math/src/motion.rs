//! Planar motion components.
//!
//! [`Position`] and [`Velocity`] are the two components read by a motion
//! integration system: each frame, position advances by velocity times the
//! frame's time step.

use engine_component::Component;
use glam::Vec2;

/// World-space position of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self(Vec2::ZERO);

    /// Create a position from coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Advance this position by `velocity` over `dt` seconds.
    #[must_use]
    pub fn integrated(self, velocity: Velocity, dt: f32) -> Self {
        Self(self.0 + velocity.0 * dt)
    }

    /// Distance to another position.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.0.distance(other.0)
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Rate of change of [`Position`], in units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Self = Self(Vec2::ZERO);

    /// Create a velocity from components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    /// Speed, the length of the velocity vector.
    #[must_use]
    pub fn speed(self) -> f32 {
        self.0.length()
    }
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}
