pub mod cli;
pub mod host;
pub mod protocol;
pub mod stdio_player;

pub use host::{run_host, write_outputs, HostOptions};
