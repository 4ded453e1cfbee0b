// Terminal front end: command parsing, the shell loop, the now-playing bar
// and the output they share

pub mod command;
pub mod output;
pub mod player_bar;
pub mod shell;

pub use command::Command;
pub use output::SharedOutput;
pub use shell::Shell;
