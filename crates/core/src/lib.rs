pub mod container;
pub mod discovery;
pub mod pipeline;
pub mod shared;
pub mod transcode;
