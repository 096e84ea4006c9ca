//! Candidate corrections offered next to each segment.

use std::sync::LazyLock;

use regex::Regex;

/// A leading number written with `.`, `,` or space between groups of three digits.
static GROUPED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,3})((?:[., ]{1,2}\d{3})+)").expect("grouped-number regex is valid")
});

/// Best-effort repair of a single OCR string.
///
/// Text that starts with a grouped number becomes that number with `,` thousands
/// separators (`"1 234.567"` becomes `"1,234,567"`, anything after the number is dropped).
/// Everything else comes back with all spaces removed.
pub fn guess_fix(text: &str) -> String {
    if let Some(caps) = GROUPED_NUMBER.captures(text) {
        let digits: String = caps
            .iter()
            .skip(1)
            .flatten()
            .flat_map(|m| m.as_str().chars())
            .filter(char::is_ascii_digit)
            .collect();
        return group_thousands(&digits);
    }
    text.replace(' ', "")
}

/// Ordered suggestions for `ocr_text`: the guessed fix, the trimmed OCR text and a blank.
///
/// Duplicates are kept so suggestion numbers stay stable across segments.
pub fn suggestions_for(ocr_text: &str) -> Vec<String> {
    vec![guess_fix(ocr_text), ocr_text.trim().to_owned(), String::new()]
}

fn group_thousands(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    let trimmed = if trimmed.is_empty() { "0" } else { trimmed };

    let mut out = String::with_capacity(trimmed.len() + trimmed.len() / 3);
    for (i, ch) in trimmed.chars().enumerate() {
        if i > 0 && (trimmed.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_numbers_are_normalised() {
        assert_eq!(guess_fix("1 234.567"), "1,234,567");
        assert_eq!(guess_fix("12.345"), "12,345");
        assert_eq!(guess_fix("999, 000"), "999,000");
        assert_eq!(guess_fix("1.000.000.000.000.000.000.000"), "1,000,000,000,000,000,000,000");
    }

    #[test]
    fn trailing_text_after_number_is_dropped() {
        assert_eq!(guess_fix("4 500 kg"), "4,500");
    }

    #[test]
    fn leading_zeros_collapse() {
        assert_eq!(guess_fix("0.000"), "0");
        assert_eq!(guess_fix("00 123"), "123");
    }

    #[test]
    fn non_numbers_lose_their_spaces() {
        assert_eq!(guess_fix("To tal  amount"), "Totalamount");
        assert_eq!(guess_fix("1234"), "1234");
        assert_eq!(guess_fix("12 34"), "1234");
        assert_eq!(guess_fix(""), "");
    }

    #[test]
    fn number_must_start_the_text() {
        assert_eq!(guess_fix("Total 1 234"), "Total1234");
    }

    #[test]
    fn suggestions_keep_order_and_blank() {
        assert_eq!(suggestions_for("  1 000 "), vec!["1000", "1 000", ""]);
        assert_eq!(suggestions_for("5.000"), vec!["5,000", "5.000", ""]);
    }
}
