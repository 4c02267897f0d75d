//! Animation Settings
//!
//! Options handed to every evaluation call. They are passed explicitly rather
//! than read from any global state, so an evaluation depends only on its
//! arguments.
//!
//! ```rust,ignore
//! use sinew_scene::AnimationSettings;
//! use sinew_animation::TimeFormat;
//!
//! let settings = AnimationSettings::default()
//!     .with_time_format(TimeFormat::Normalized)
//!     .with_bounds(false);
//! model.evaluate(Some(0), 0.25, &settings);
//! ```

use serde::{Deserialize, Serialize};
use sinew_animation::TimeFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Interpretation of the time argument.
    pub time_format: TimeFormat,
    /// Recompute pose bounding boxes. Bone matrices are produced regardless.
    pub update_bounds: bool,
    /// Check the skeleton layout invariants before evaluating.
    pub validate_layout: bool,
}

impl Default for AnimationSettings {
    #[inline]
    fn default() -> Self {
        Self {
            time_format: TimeFormat::Seconds,
            update_bounds: true,
            validate_layout: cfg!(debug_assertions),
        }
    }
}

impl AnimationSettings {
    #[must_use]
    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, update_bounds: bool) -> Self {
        self.update_bounds = update_bounds;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, validate_layout: bool) -> Self {
        self.validate_layout = validate_layout;
        self
    }
}
