mod init;

pub use init::{InitArgs, cmd_init};
