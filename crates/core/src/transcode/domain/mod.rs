pub mod encode_settings;
pub mod transcoder;
