//! Reviewer input parsing for the interactive session prompt.

pub(crate) const INTERACTIVE_USAGE: &str = "\
Commands:
  yes | y                      approve the pending prompt
  no | n                       reject the pending prompt, then type a comment
  /submit <company> [paths...] start a new session with the given documents
  /cancel                      close the current session
  /status                      show the session state
  /help                        show this help
  /quit                        exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedCommand<'a> {
    name: &'a str,
    args: &'a str,
}

fn parse_command(input: &str) -> Option<ParsedCommand<'_>> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let args = parts.next().map(str::trim).unwrap_or_default();
    Some(ParsedCommand { name, args })
}

fn canonical_command_name(name: &str) -> &str {
    if name == "/exit" {
        "/quit"
    } else {
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InteractiveCommand {
    Approve,
    Reject,
    Comment(String),
    Submit { subject: String, paths: Vec<String> },
    Cancel,
    Status,
    Help,
    Quit,
    Empty,
    Invalid { message: String },
}

/// While a rejection awaits its comment, every non-command line is the comment.
pub(crate) fn parse_interactive_command(line: &str, awaiting_comment: bool) -> InteractiveCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InteractiveCommand::Empty;
    }

    if let Some(command) = parse_command(trimmed) {
        return match canonical_command_name(command.name) {
            "/submit" => parse_submit_args(command.args),
            "/cancel" => InteractiveCommand::Cancel,
            "/status" => InteractiveCommand::Status,
            "/help" => InteractiveCommand::Help,
            "/quit" => InteractiveCommand::Quit,
            other => InteractiveCommand::Invalid {
                message: format!("unknown command {other}; type /help for usage"),
            },
        };
    }

    if awaiting_comment {
        return InteractiveCommand::Comment(trimmed.to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "yes" | "y" => InteractiveCommand::Approve,
        "no" | "n" => InteractiveCommand::Reject,
        _ => InteractiveCommand::Invalid {
            message: "answer yes or no, or type /help for usage".to_string(),
        },
    }
}

fn parse_submit_args(args: &str) -> InteractiveCommand {
    let tokens = match shell_words::split(args) {
        Ok(tokens) => tokens,
        Err(error) => {
            return InteractiveCommand::Invalid {
                message: format!("failed to parse /submit arguments: {error}"),
            }
        }
    };
    let mut tokens = tokens.into_iter();
    let Some(subject) = tokens.next() else {
        return InteractiveCommand::Invalid {
            message: "usage: /submit <company> [paths...]".to_string(),
        };
    };
    InteractiveCommand::Submit {
        subject,
        paths: tokens.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_interactive_command, InteractiveCommand};

    #[test]
    fn unit_parse_interactive_command_maps_decisions() {
        assert_eq!(
            parse_interactive_command("yes", false),
            InteractiveCommand::Approve
        );
        assert_eq!(
            parse_interactive_command(" Y ", false),
            InteractiveCommand::Approve
        );
        assert_eq!(
            parse_interactive_command("no", false),
            InteractiveCommand::Reject
        );
        assert_eq!(
            parse_interactive_command("N", false),
            InteractiveCommand::Reject
        );
        assert_eq!(
            parse_interactive_command("   ", false),
            InteractiveCommand::Empty
        );
        assert!(matches!(
            parse_interactive_command("maybe", false),
            InteractiveCommand::Invalid { .. }
        ));
    }

    #[test]
    fn functional_parse_interactive_command_treats_text_as_comment_when_awaiting() {
        assert_eq!(
            parse_interactive_command("  Sector should be Utilities ", true),
            InteractiveCommand::Comment("Sector should be Utilities".to_string())
        );
        assert_eq!(
            parse_interactive_command("yes", true),
            InteractiveCommand::Comment("yes".to_string())
        );
        assert_eq!(
            parse_interactive_command("/cancel", true),
            InteractiveCommand::Cancel
        );
    }

    #[test]
    fn functional_parse_submit_splits_quoted_company_and_paths() {
        assert_eq!(
            parse_interactive_command(
                r#"/submit "Acme Corp" reports/2024.pdf "annex one.pdf""#,
                false
            ),
            InteractiveCommand::Submit {
                subject: "Acme Corp".to_string(),
                paths: vec!["reports/2024.pdf".to_string(), "annex one.pdf".to_string()],
            }
        );
        assert_eq!(
            parse_interactive_command("/submit Acme", false),
            InteractiveCommand::Submit {
                subject: "Acme".to_string(),
                paths: Vec::new(),
            }
        );
    }

    #[test]
    fn regression_parse_submit_reports_missing_company_and_bad_quoting() {
        assert!(matches!(
            parse_interactive_command("/submit", false),
            InteractiveCommand::Invalid { .. }
        ));
        assert!(matches!(
            parse_interactive_command(r#"/submit "Acme"#, false),
            InteractiveCommand::Invalid { .. }
        ));
        assert_eq!(
            parse_interactive_command("/exit", false),
            InteractiveCommand::Quit
        );
        assert!(matches!(
            parse_interactive_command("/restart", false),
            InteractiveCommand::Invalid { .. }
        ));
    }
}
