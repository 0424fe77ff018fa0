//! Interactive command parsing
//!
//! Turns one line typed at the `ftp> ` prompt into a [`Command`].

/// A command typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `get <name>`
    Get(String),

    /// `put <name>`
    Put(String),

    /// `ls`
    List,

    /// `quit` or `exit`
    Quit,

    /// Anything else; the prompt re-asks
    Invalid(InvalidCommand),
}

/// Why a line was not a valid command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidCommand {
    /// Empty line or unknown keyword
    Unknown,

    /// `get`/`put` without a file name
    MissingArgument,

    /// `ls`/`quit` followed by an argument
    UnexpectedArgument,
}

impl std::fmt::Display for InvalidCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            InvalidCommand::Unknown => "Invalid command!",
            InvalidCommand::MissingArgument => "Missing file name!",
            InvalidCommand::UnexpectedArgument => "Unexpected argument!",
        };
        f.write_str(message)
    }
}

/// Parse one input line
///
/// Keywords are case-insensitive; the first whitespace-separated token after
/// the keyword is the argument.
pub fn parse_command(line: &str) -> Command {
    let mut tokens = line.split_whitespace();

    let keyword = match tokens.next() {
        Some(keyword) => keyword.to_ascii_lowercase(),
        None => return Command::Invalid(InvalidCommand::Unknown),
    };
    let argument = tokens.next();

    match (keyword.as_str(), argument) {
        ("get", Some(name)) => Command::Get(name.to_string()),
        ("put", Some(name)) => Command::Put(name.to_string()),
        ("get" | "put", None) => Command::Invalid(InvalidCommand::MissingArgument),
        ("ls", None) => Command::List,
        ("quit" | "exit", None) => Command::Quit,
        ("ls" | "quit" | "exit", Some(_)) => Command::Invalid(InvalidCommand::UnexpectedArgument),
        _ => Command::Invalid(InvalidCommand::Unknown),
    }
}
