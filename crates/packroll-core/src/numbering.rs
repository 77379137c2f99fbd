//! Pure filename-number transforms shared by the rename pass and the
//! document editors.

/// Increment the first contiguous digit run found inside a bounded
/// substring of `name`, preserving zero-padding width.
///
/// The search space starts after the first occurrence of
/// `start_marker` (or at the beginning when empty) and ends at the
/// last occurrence of `end_marker` at or after that point (or the end
/// of the string when empty). When a marker or a digit run is absent
/// the name is returned unchanged.
///
/// Everything outside the digit run stays byte-identical:
/// `increment_number("REC-0005", "", "")` → `"REC-0006"`,
/// `increment_number("cover(0007)ok", "(", ")")` → `"cover(0008)ok"`.
pub fn increment_number(name: &str, start_marker: &str, end_marker: &str) -> String {
    let search_start = if start_marker.is_empty() {
        0
    } else {
        match name.find(start_marker) {
            Some(pos) => pos + start_marker.len(),
            None => return name.to_string(),
        }
    };

    let search_end = if end_marker.is_empty() {
        name.len()
    } else {
        match name[search_start..].rfind(end_marker) {
            Some(pos) => search_start + pos,
            None => return name.to_string(),
        }
    };

    let window = &name[search_start..search_end];

    let Some((run_start, run_end)) = first_digit_run(window) else {
        return name.to_string();
    };

    let digits = &window[run_start..run_end];
    let Ok(value) = digits.parse::<u64>() else {
        // Run longer than u64 range; leave the name alone.
        return name.to_string();
    };

    let incremented = format!("{:0width$}", value + 1, width = digits.len());

    let mut out = String::with_capacity(name.len() + 1);
    out.push_str(&name[..search_start]);
    out.push_str(&window[..run_start]);
    out.push_str(&incremented);
    out.push_str(&window[run_end..]);
    out.push_str(&name[search_end..]);
    out
}

/// Byte offsets of the first ASCII digit run in `s`, if any.
fn first_digit_run(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let len = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    Some((start, start + len))
}

/// Whether a cell's text reads as a number (the data-row test used by
/// the A2 editors and extractors). Matches float syntax, not just
/// integers, so "1.5" marks a data row too.
pub fn is_numeric_text(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_no_markers() {
        assert_eq!(increment_number("REC-0005", "", ""), "REC-0006");
        assert_eq!(increment_number("0038", "", ""), "0039");
    }

    #[test]
    fn test_increment_with_markers() {
        assert_eq!(
            increment_number("cover(0007)ok", "(", ")"),
            "cover(0008)ok"
        );
        assert_eq!(
            increment_number("表单（0099）终版.docx", "（", "）"),
            "表单（0100）终版.docx"
        );
    }

    #[test]
    fn test_increment_identity_cases() {
        assert_eq!(increment_number("no-digits-here", "", ""), "no-digits-here");
        assert_eq!(increment_number("a(b)c", "(", ")"), "a(b)c");
        assert_eq!(increment_number("a1b", "(", ")"), "a1b");
        assert_eq!(increment_number("x(1y", "(", ")"), "x(1y");
    }

    #[test]
    fn test_increment_width_growth() {
        assert_eq!(increment_number("v-9999", "", ""), "v-10000");
        assert_eq!(increment_number("v-0999", "", ""), "v-1000");
    }

    #[test]
    fn test_increment_targets_run_inside_markers_only() {
        // The digit run before the marker must stay untouched.
        assert_eq!(
            increment_number("REC-Q680003-A2-01(0038)批准.docx", "(", ")"),
            "REC-Q680003-A2-01(0039)批准.docx"
        );
    }

    #[test]
    fn test_increment_uses_last_end_marker() {
        assert_eq!(increment_number("a(1)b)c", "(", ")"), "a(2)b)c");
    }

    #[test]
    fn test_is_numeric_text() {
        assert!(is_numeric_text("12"));
        assert!(is_numeric_text(" 3.5 "));
        assert!(!is_numeric_text(""));
        assert!(!is_numeric_text("备注"));
        assert!(!is_numeric_text("1a"));
    }
}
