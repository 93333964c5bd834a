/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Anything that is not a `:` command is treated as pasted links.
    Links(String),
    /// 1-based row number as shown in the queue.
    Retry(usize),
    ClearQueue,
    ClearHistory,
    ToggleTheme,
    DismissBanner,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str =
    "Paste links and press Enter. Commands: :retry N  :clear  :clear-history  :theme  :dismiss  :help  :quit";

/// `None` for blank lines.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Some(Command::Links(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let parsed = match name.as_str() {
        "retry" | "r" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(row) if row > 0 => Command::Retry(row),
            _ => Command::Unknown(line.to_string()),
        },
        "clear" => Command::ClearQueue,
        "clear-history" => Command::ClearHistory,
        "theme" => Command::ToggleTheme,
        "dismiss" => Command::DismissBanner,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_links() {
        assert_eq!(
            parse_command("  https://youtu.be/a, https://youtu.be/b "),
            Some(Command::Links("https://youtu.be/a, https://youtu.be/b".into()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn colon_commands_are_recognised() {
        assert_eq!(parse_command(":retry 2"), Some(Command::Retry(2)));
        assert_eq!(parse_command(":clear"), Some(Command::ClearQueue));
        assert_eq!(parse_command(":clear-history"), Some(Command::ClearHistory));
        assert_eq!(parse_command(":THEME"), Some(Command::ToggleTheme));
        assert_eq!(parse_command(":dismiss"), Some(Command::DismissBanner));
        assert_eq!(parse_command(":q"), Some(Command::Quit));
    }

    #[test]
    fn bad_retry_row_is_unknown() {
        assert_eq!(
            parse_command(":retry 0"),
            Some(Command::Unknown(":retry 0".into()))
        );
        assert_eq!(
            parse_command(":retry x"),
            Some(Command::Unknown(":retry x".into()))
        );
        assert_eq!(parse_command(":nope"), Some(Command::Unknown(":nope".into())));
    }
}
