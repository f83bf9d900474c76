pub mod file_sink;
pub mod probe;
pub mod valve;
