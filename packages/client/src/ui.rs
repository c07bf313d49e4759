//! Console commands and prompt handling.

use std::io::Write;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Play,
    Pause,
    Seek(f64),
    Buffer,
    Unbuffer,
    Media(u32),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid argument '{value}' for '{command}'")]
    InvalidArgument { command: &'static str, value: String },
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let argument = words.next();

        match name.as_str() {
            "play" => Ok(ConsoleCommand::Play),
            "pause" => Ok(ConsoleCommand::Pause),
            "seek" => {
                let value = argument.ok_or(CommandParseError::MissingArgument {
                    command: "seek",
                    argument: "a position in seconds",
                })?;
                match value.parse::<f64>() {
                    Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(ConsoleCommand::Seek(secs)),
                    _ => Err(CommandParseError::InvalidArgument {
                        command: "seek",
                        value: value.to_string(),
                    }),
                }
            }
            "buffer" => Ok(ConsoleCommand::Buffer),
            "unbuffer" => Ok(ConsoleCommand::Unbuffer),
            "media" => {
                let value = argument.ok_or(CommandParseError::MissingArgument {
                    command: "media",
                    argument: "a media index",
                })?;
                value
                    .parse::<u32>()
                    .map(ConsoleCommand::Media)
                    .map_err(|_| CommandParseError::InvalidArgument {
                        command: "media",
                        value: value.to_string(),
                    })
            }
            "status" => Ok(ConsoleCommand::Status),
            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

/// Redisplay the prompt after printing a notification
pub fn redisplay_prompt(participant_id: &str) {
    print!("{}> ", participant_id);
    std::io::stdout().flush().ok();
}
