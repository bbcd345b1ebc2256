/// Returns the prefix of `s` holding at most `max_chars` characters.
/// Counts Unicode scalar values, so multi-byte text is never split mid-character.
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Safely truncates a UTF-8 string without breaking character boundaries.
/// If `s` length exceeds `max` bytes, returns a string cut at a valid char boundary and appends `suffix`.
/// The resulting string length will be <= max whenever possible (suffix included). If `max` < suffix length,
/// the function returns a safely cut string without suffix, not exceeding `max` bytes.
pub fn safe_truncate_utf8(s: &str, max: usize, suffix: &str) -> String {
    if s.len() <= max {
        return s.to_string();
    }

    if max == 0 {
        return String::new();
    }

    let suffix_len = suffix.len();
    if max <= suffix_len {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        return s[..end].to_string();
    }

    let mut end = max - suffix_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut result = String::with_capacity(end + suffix_len);
    result.push_str(&s[..end]);
    result.push_str(suffix);
    result
}
