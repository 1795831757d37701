/*
[INPUT]:  Command-line arguments and terminal input
[OUTPUT]: Executed marketplace commands
[POS]:    CLI layer - module wiring
[UPDATE]: When adding CLI submodules
*/

pub mod args;
pub mod commands;
pub mod init;
pub mod prompt;
pub mod render;

pub use args::{Cli, Command};
