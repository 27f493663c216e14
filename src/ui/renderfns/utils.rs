/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Heart marker for the like control
pub fn heart(liked: bool) -> &'static str {
  if liked {
    "\u{2665}" // filled
  } else {
    "\u{2661}" // outline
  }
}

/// Human-readable byte count for the cache status view
pub fn format_bytes(bytes: u64) -> String {
  const KIB: u64 = 1024;
  const MIB: u64 = 1024 * 1024;

  if bytes >= MIB {
    format!("{:.1} MiB", bytes as f64 / MIB as f64)
  } else if bytes >= KIB {
    format!("{:.1} KiB", bytes as f64 / KIB as f64)
  } else {
    format!("{} B", bytes)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    // Char-based, so multibyte place names don't split mid-codepoint
    assert_eq!(truncate("Škofja Loka", 8), "Škofj...");
  }

  #[test]
  fn test_heart() {
    assert_eq!(heart(true), "♥");
    assert_eq!(heart(false), "♡");
  }

  #[test]
  fn test_format_bytes() {
    assert_eq!(format_bytes(512), "512 B");
    assert_eq!(format_bytes(2048), "2.0 KiB");
    assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
  }
}
