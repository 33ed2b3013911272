#[cfg(test)]
pub mod test;

use once_cell::sync::Lazy;
use regex::Regex;

static TELEGRAM_USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{3,31}$").expect("static regex"));

/// Renders seconds as `HH:MM:SS`, dropping leading components that are zero.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as i64;
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let secs = total % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{:02}", hours));
    }
    if hours > 0 || minutes > 0 {
        parts.push(format!("{:02}", minutes));
    }
    parts.push(format!("{:02}", secs));
    parts.join(":")
}

/// Session key of a chat user: the username when there is one, otherwise `id{user_id}`.
pub fn identity_of(username: Option<&str>, user_id: i64) -> String {
    match username {
        Some(username) if !username.is_empty() => username.to_string(),
        _ => format!("id{}", user_id),
    }
}

/// Strips surrounding whitespace and a leading `@`.
pub fn preprocess_username(input: &str) -> String {
    input.trim().trim_start_matches('@').to_string()
}

pub fn is_valid_username(username: &str) -> bool {
    TELEGRAM_USERNAME_REGEX.is_match(username)
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

pub fn next_page(current: usize, pages: usize) -> usize {
    if pages == 0 {
        0
    } else {
        (current + 1) % pages
    }
}

pub fn previous_page(current: usize, pages: usize) -> usize {
    match (pages, current) {
        (0, _) => 0,
        (_, 0) => pages - 1,
        _ => (current - 1).min(pages - 1),
    }
}

/// Share of `part` in `total`, rounded to one decimal; zero when there is nothing to divide.
pub fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Telegram refuses messages longer than this many characters.
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// Joins lines into messages of at most `limit` characters, splitting only between lines.
/// A single line over the limit is cut.
pub fn chunk_lines<S: AsRef<str>>(lines: &[S], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in lines {
        let line: String = line.as_ref().chars().take(limit).collect();
        let len = line.chars().count();
        if !current.is_empty() && current_len + 1 + len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00");
        assert_eq!(format_time(59.0), "59");
        assert_eq!(format_time(61.0), "01:01");
        assert_eq!(format_time(3600.0), "01:00:00");
        assert_eq!(format_time(3725.4), "01:02:05");
        assert_eq!(format_time(90061.0), "25:01:01");
    }

    #[test]
    fn test_preprocess_username() {
        assert_eq!(preprocess_username("@alice"), "alice");
        assert_eq!(preprocess_username("  bob_1 "), "bob_1");
        assert_eq!(preprocess_username("carol"), "carol");
    }

    #[test]
    fn test_identity_of() {
        assert_eq!(identity_of(Some("alice"), 1), "alice");
        assert_eq!(identity_of(None, 42), "id42");
        assert_eq!(identity_of(Some(""), 42), "id42");
    }

    #[test]
    fn test_username_regex() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username("Bob_42"));
        assert!(!is_valid_username("ab")); // too short
        assert!(!is_valid_username("1alice")); // starts with a digit
        assert!(!is_valid_username("al ice"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn test_pagination_wraps_both_ways() {
        for total in [1usize, 9, 10, 18, 19, 40] {
            let pages = page_count(total, 9);
            assert_eq!(pages, (total + 8) / 9);

            let mut page = 0;
            for _ in 0..pages {
                page = next_page(page, pages);
            }
            assert_eq!(page, 0, "next {} times from page 0 with {} items", pages, total);
            assert_eq!(previous_page(0, pages), pages - 1);
        }

        assert_eq!(page_count(0, 9), 0);
        assert_eq!(next_page(0, 0), 0);
        assert_eq!(previous_page(0, 0), 0);
    }

    #[test]
    fn test_chunk_lines() {
        assert_eq!(chunk_lines(&["a", "b"], 10), vec!["a\nb"]);
        assert_eq!(chunk_lines(&["aaaa", "bbbb", "cc"], 9), vec!["aaaa\nbbbb", "cc"]);
        assert_eq!(chunk_lines(&["x".repeat(12)], 5), vec!["xxxxx"]);
        assert!(chunk_lines::<&str>(&[], 5).is_empty());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 4), 50.0);
        assert_eq!(percent(5, 0), 0.0);
    }
}
