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
    name: "community",
    aliases: &["c", "feed", "responses"],
    description: "Browse community responses",
  },
  Command {
    name: "planner",
    aliases: &["p", "plan", "trip"],
    description: "AI trip planner",
  },
  Command {
    name: "share",
    aliases: &["new", "post"],
    description: "Share a travel experience",
  },
  Command {
    name: "login",
    aliases: &["signin"],
    description: "Sign in to the community",
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out",
  },
  Command {
    name: "cache",
    aliases: &["offline", "assets"],
    description: "Offline asset cache status",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit wayfarer",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if let Some(priority) = match_priority(cmd, &input_lower) {
      matches.push((cmd, priority));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Rank how well a command matches the input. Lower is better, None is no match.
fn match_priority(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    return Some(0);
  }
  if cmd.aliases.contains(&input) {
    return Some(1);
  }
  if cmd.name.starts_with(input) {
    return Some(2);
  }
  if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    return Some(3);
  }
  if cmd.name.contains(input) {
    return Some(4);
  }
  if cmd.aliases.iter().any(|a| a.contains(input)) {
    return Some(5);
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("community");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "community");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("c");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "community");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("pla");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "planner");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("unit");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "community");
  }

  #[test]
  fn test_no_match() {
    let suggestions = get_suggestions("zzz");
    assert!(suggestions.is_empty());
  }
}
