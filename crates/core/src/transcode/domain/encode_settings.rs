use std::fmt;

use crate::shared::constants::{DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_CPU_USED, DEFAULT_CRF};

/// libvpx encoding deadline: how much time the encoder may spend per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Deadline {
    Realtime,
    #[default]
    Good,
    Best,
}

impl Deadline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deadline::Realtime => "realtime",
            Deadline::Good => "good",
            Deadline::Best => "best",
        }
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// VP9 quality/speed knobs for the video pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoEncodeSettings {
    /// Constant rate factor; lower is better quality.
    pub crf: u32,
    pub deadline: Deadline,
    /// Speed/quality trade-off; higher is faster.
    pub cpu_used: i32,
}

impl Default for VideoEncodeSettings {
    fn default() -> Self {
        Self {
            crf: DEFAULT_CRF,
            deadline: Deadline::default(),
            cpu_used: DEFAULT_CPU_USED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioEncodeSettings {
    pub bitrate_kbps: u32,
}

impl Default for AudioEncodeSettings {
    fn default() -> Self {
        Self {
            bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
        }
    }
}
