//! Cleanup for HTML-flavoured synopsis text.

use regex::Regex;
use std::sync::LazyLock;

static LINE_BREAK: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break pattern is valid"));

static TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Turn `<br>` variants into newlines, drop all other tags, then trim.
pub fn format_synopsis(text: &str) -> String {
  let with_breaks = LINE_BREAK.replace_all(text, "\n");
  TAG.replace_all(&with_breaks, "").trim().to_string()
}
