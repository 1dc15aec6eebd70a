pub mod video_classifier;
