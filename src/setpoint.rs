//! Encoder position to target temperature.

use crate::config::SetpointConfig;
use crate::sensor::EncoderPosition;

/// Maps an [`EncoderPosition`] to a setpoint in °F.
///
/// Stateless: `scale * position + offset`, identity by default.
///
/// ```rust
/// use rs_roaster::config::SetpointConfig;
/// use rs_roaster::sensor::EncoderPosition;
/// use rs_roaster::setpoint::SetpointManager;
///
/// let setpoints = SetpointManager::new(&SetpointConfig::default());
/// assert_eq!(setpoints.current_setpoint(EncoderPosition::new(400)), 400.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetpointManager {
    scale: f32,
    offset: f32,
}

impl SetpointManager {
    /// Creates a manager from its configuration section.
    pub fn new(config: &SetpointConfig) -> Self {
        Self {
            scale: config.scale,
            offset: config.offset,
        }
    }

    /// Target temperature for the given position.
    #[inline]
    pub fn current_setpoint(&self, position: EncoderPosition) -> f32 {
        self.scale * position.get() as f32 + self.offset
    }
}

impl Default for SetpointManager {
    fn default() -> Self {
        Self::new(&SetpointConfig::default())
    }
}
