pub mod constants;
pub mod convert_options;
