use serde::{Deserialize, Serialize};

use super::domain::SwipeDirection;

/// Commit thresholds for a horizontal drag, in pixels and pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureThresholds {
    pub distance: f32,
    pub velocity: f32,
}

impl GestureThresholds {
    pub const DEFAULT_DISTANCE: f32 = 120.0;
    pub const DEFAULT_VELOCITY: f32 = 500.0;
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            distance: Self::DEFAULT_DISTANCE,
            velocity: Self::DEFAULT_VELOCITY,
        }
    }
}

/// Discrete result of releasing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureDecision {
    CommitRight,
    CommitLeft,
    SnapBack,
}

impl GestureDecision {
    pub const fn direction(self) -> Option<SwipeDirection> {
        match self {
            GestureDecision::CommitRight => Some(SwipeDirection::Right),
            GestureDecision::CommitLeft => Some(SwipeDirection::Left),
            GestureDecision::SnapBack => None,
        }
    }

    fn from_direction(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Right => GestureDecision::CommitRight,
            SwipeDirection::Left => GestureDecision::CommitLeft,
        }
    }
}

/// Turns a drag trajectory into a swipe decision. Pure: never touches session or store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureInterpreter {
    thresholds: GestureThresholds,
}

impl GestureInterpreter {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> GestureThresholds {
        self.thresholds
    }

    /// Commit when either the distance or the velocity threshold is exceeded.
    ///
    /// A long slow drag and a short fast flick both count. The offset decides the
    /// direction when it crossed its threshold; otherwise the flick velocity does.
    pub fn interpret(&self, offset_x: f32, velocity_x: f32) -> GestureDecision {
        if !offset_x.is_finite() || !velocity_x.is_finite() {
            return GestureDecision::SnapBack;
        }

        let direction = if offset_x.abs() > self.thresholds.distance {
            SwipeDirection::from_sign(offset_x)
        } else if velocity_x.abs() > self.thresholds.velocity {
            SwipeDirection::from_sign(velocity_x)
        } else {
            None
        };

        direction
            .map(GestureDecision::from_direction)
            .unwrap_or(GestureDecision::SnapBack)
    }

    /// Direction the card would commit to if released now without any velocity.
    pub fn preview(&self, offset_x: f32) -> Option<SwipeDirection> {
        self.interpret(offset_x, 0.0).direction()
    }
}

/// Visual state of the top card while it is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardFeedback {
    pub offset_x: f32,
    pub rotation_degrees: f32,
    pub like_intensity: f32,
    pub pass_intensity: f32,
}

impl CardFeedback {
    const ROTATION_SPAN: f32 = 200.0;
    const MAX_ROTATION: f32 = 15.0;
    const GLOW_SPAN: f32 = 150.0;

    pub fn from_offset(offset_x: f32) -> Self {
        let offset_x = if offset_x.is_finite() { offset_x } else { 0.0 };
        let rotation = (offset_x / Self::ROTATION_SPAN).clamp(-1.0, 1.0) * Self::MAX_ROTATION;
        let like = (offset_x / Self::GLOW_SPAN).clamp(0.0, 1.0);
        let pass = (-offset_x / Self::GLOW_SPAN).clamp(0.0, 1.0);

        Self {
            offset_x,
            rotation_degrees: rotation,
            like_intensity: like,
            pass_intensity: pass,
        }
    }

    pub fn resting() -> Self {
        Self::from_offset(0.0)
    }
}
