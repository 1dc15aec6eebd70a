pub mod convert_videos_use_case;
pub mod job;
pub mod pipeline_logger;
