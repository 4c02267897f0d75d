use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;
use crate::time::NTIME_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

/// Playback cursor for one clip.
///
/// Only advances time; the skeleton is posed by handing
/// [`Playback::normalized_time`] to the evaluator together with [`Playback::clip`].
#[derive(Debug, Clone)]
pub struct Playback {
    clip: Option<usize>,
    duration: f32,

    time: f32,
    pub time_scale: f32,
    pub loop_mode: LoopMode,
    pub paused: bool,
}

impl Playback {
    /// Playback of the clip stored at `clip_index`.
    #[must_use]
    pub fn new(clip_index: usize, clip: &AnimationClip) -> Self {
        Self {
            clip: Some(clip_index),
            duration: clip.duration_seconds(),
            time: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
        }
    }

    /// A playback that holds the bind pose.
    #[must_use]
    pub fn bind_pose() -> Self {
        Self {
            clip: None,
            duration: 0.0,
            time: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Loop,
            paused: false,
        }
    }

    #[must_use]
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> Option<usize> {
        self.clip
    }

    /// Current time in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Current time as a fraction of the clip, in `[0, 1)`.
    ///
    /// The clip end maps to the last pose rather than wrapping to the first,
    /// so a finished `Once` or a `PingPong` turnaround holds the final frame.
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let time = match self.loop_mode {
            LoopMode::Loop => self.time.rem_euclid(self.duration),
            LoopMode::Once | LoopMode::PingPong => self.time,
        };
        (time / self.duration).clamp(0.0, NTIME_MAX)
    }

    /// Advances time by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }

        let duration = self.duration;
        if duration <= 0.0 {
            return;
        }

        self.time += dt * self.time_scale;

        match self.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.paused = true;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.paused = true;
                }
            }
            LoopMode::Loop => {
                self.time = self.time.rem_euclid(duration);
            }
            LoopMode::PingPong => {
                let double_duration = duration * 2.0;
                let mut t = self.time.rem_euclid(double_duration);
                if t > duration {
                    t = double_duration - t;
                }
                self.time = t;
            }
        }
    }
}

/// Fades from one playback to another over `fade_duration` seconds.
#[derive(Debug, Clone)]
pub struct Crossfade {
    pub from: Playback,
    pub to: Playback,
    fade_duration: f32,
    elapsed: f32,
}

impl Crossfade {
    #[must_use]
    pub fn new(from: Playback, to: Playback, fade_duration: f32) -> Self {
        Self {
            from,
            to,
            fade_duration: fade_duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.from.update(dt);
        self.to.update(dt);
        self.elapsed = (self.elapsed + dt).min(self.fade_duration);
    }

    /// Blend fraction toward `to`, in `[0, 1]`.
    #[must_use]
    pub fn frac(&self) -> f32 {
        if self.fade_duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.fade_duration).clamp(0.0, 1.0)
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.frac() >= 1.0
    }
}
