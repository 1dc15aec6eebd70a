pub mod container_header;
