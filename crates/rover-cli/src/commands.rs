//! Operator console commands

use std::fmt;
use std::str::FromStr;

/// One line of operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    Status,
    Help,
    Quit,
}

impl OperatorCommand {
    pub const HELP: &'static str =
        "commands: start | pause | resume | stop | reset | status | help | quit";

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCommand::Start => "start",
            OperatorCommand::Pause => "pause",
            OperatorCommand::Resume => "resume",
            OperatorCommand::Stop => "stop",
            OperatorCommand::Reset => "reset",
            OperatorCommand::Status => "status",
            OperatorCommand::Help => "help",
            OperatorCommand::Quit => "quit",
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "go" => Ok(OperatorCommand::Start),
            "pause" | "p" => Ok(OperatorCommand::Pause),
            "resume" | "r" => Ok(OperatorCommand::Resume),
            "stop" => Ok(OperatorCommand::Stop),
            "reset" => Ok(OperatorCommand::Reset),
            "status" | "s" => Ok(OperatorCommand::Status),
            "help" | "?" => Ok(OperatorCommand::Help),
            "quit" | "exit" | "q" => Ok(OperatorCommand::Quit),
            other => Err(format!("unknown command '{}' ({})", other, Self::HELP)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("start".parse::<OperatorCommand>(), Ok(OperatorCommand::Start));
        assert_eq!("  PAUSE \n".parse::<OperatorCommand>(), Ok(OperatorCommand::Pause));
        assert_eq!("q".parse::<OperatorCommand>(), Ok(OperatorCommand::Quit));
        assert!("launch".parse::<OperatorCommand>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for command in [
            OperatorCommand::Start,
            OperatorCommand::Resume,
            OperatorCommand::Reset,
            OperatorCommand::Status,
        ] {
            assert_eq!(command.to_string().parse::<OperatorCommand>(), Ok(command));
        }
    }
}
