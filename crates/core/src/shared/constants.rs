pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "avi", "webm", "m4v", "mpg", "mpeg", "wmv", "flv",
];

pub const CONTAINER_MAGIC: [u8; 4] = *b"VID0";
pub const CONTAINER_VERSION: u32 = 1;
/// Magic (4) + version (4) + payload size (8).
pub const CONTAINER_HEADER_LEN: usize = 16;

/// Payload bytes copied per read/write when wrapping.
pub const COPY_CHUNK_SIZE: usize = 1024 * 1024;

pub const CONTAINER_EXTENSION: &str = "video";
pub const INTERMEDIATE_EXTENSION: &str = "webm";
pub const AUDIO_EXTENSION: &str = "opus";

pub const DEFAULT_CRF: u32 = 30;
pub const DEFAULT_CPU_USED: i32 = 4;
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

/// libvpx-vp9 accepts CRF values 0-63.
pub const MAX_CRF: u32 = 63;
pub const CPU_USED_RANGE: std::ops::RangeInclusive<i32> = -8..=8;

pub const FFMPEG_BINARY_NAME: &str = "ffmpeg";
/// Bundled ffmpeg layout, relative to the directory holding the executable.
pub const BUNDLED_FFMPEG_DIR: &str = "third_party/ffmpeg";
