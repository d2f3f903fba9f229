/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "more",
    aliases: &["m", "next", "page"],
    description: "Load the next catalog page",
  },
  Command {
    name: "new",
    aliases: &["a", "add", "create"],
    description: "Add your own beer",
  },
  Command {
    name: "reload",
    aliases: &["r", "refresh"],
    description: "Reload beers from the local cache",
  },
  Command {
    name: "reset",
    aliases: &["clear"],
    description: "Empty the local cache and start over",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit hopdex",
  },
];

/// Get autocomplete suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input_lower).map(|rank| (cmd, rank)))
    .collect();

  // Stable sort keeps declaration order within a rank
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better; None when the command does not match at all
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) || cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(4)
  } else {
    None
  }
}
