pub mod container_file_reader;
pub mod container_file_writer;
