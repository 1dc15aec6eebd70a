pub mod ffmpeg_locator;
pub mod ffmpeg_transcoder;
