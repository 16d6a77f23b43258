//! Masking of example values before they leave the engine.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9._%+-])[A-Za-z0-9._%+-]*@[A-Za-z0-9.-]+?(\.[A-Za-z]{2,})$")
        .expect("Invalid email regex")
});

static IBAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z]{2}\d{2}[A-Z0-9]{1,30}$").expect("Invalid IBAN regex"));

/// Longest prefix kept by the generic mask.
const GENERIC_KEEP: usize = 12;

/// Masks a single sampled value.
pub trait Masker: Send + Sync + fmt::Debug {
    fn mask(&self, value: &str) -> String;

    fn mask_all(&self, values: &[String]) -> Vec<String> {
        values.iter().map(|v| self.mask(v)).collect()
    }
}

/// Pattern-aware masking for regulated data.
///
/// - email: first character, then `***@***` and the top-level domain
/// - IBAN: `****` plus the last four characters
/// - seven or more digits (phones, card numbers): `***-***-` plus last four digits
/// - anything else: first twelve characters with every odd alphanumeric starred
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiMasker;

impl Masker for PiiMasker {
    fn mask(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }
        if let Some(caps) = EMAIL_REGEX.captures(value) {
            return format!("{}***@***{}", &caps[1], &caps[2]);
        }
        if IBAN_REGEX.is_match(value) {
            let tail: String = last_chars(value, 4);
            return format!("****{tail}");
        }
        let digits: String = value.chars().filter(char::is_ascii_digit).collect();
        if digits.len() >= 7 {
            return format!("***-***-{}", last_chars(&digits, 4));
        }
        value
            .chars()
            .take(GENERIC_KEEP)
            .enumerate()
            .map(|(i, ch)| if ch.is_alphanumeric() && i % 2 == 1 { '*' } else { ch })
            .collect()
    }
}

/// Leaves values untouched. Used outside regulated mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMasking;

impl Masker for NoMasking {
    fn mask(&self, value: &str) -> String {
        value.to_string()
    }
}

fn last_chars(value: &str, n: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_keeps_first_char_and_tld() {
        assert_eq!(PiiMasker.mask("a@b.com"), "a***@***.com");
        assert_eq!(PiiMasker.mask("jane.doe@bank.co.uk"), "j***@***.uk");
    }

    #[test]
    fn iban_keeps_last_four() {
        assert_eq!(PiiMasker.mask("GB29NWBK60161331926819"), "****6819");
    }

    #[test]
    fn long_digit_runs_look_like_phones() {
        assert_eq!(PiiMasker.mask("+1 (416) 555-0199"), "***-***-0199");
    }

    #[test]
    fn generic_values_are_truncated_and_starred() {
        assert_eq!(PiiMasker.mask("C12"), "C*2");
        assert_eq!(PiiMasker.mask("abcdefghijklmnop"), "a*c*e*g*i*k*");
        assert_eq!(PiiMasker.mask("1"), "1");
    }

    #[test]
    fn passthrough_masker() {
        assert_eq!(NoMasking.mask("a@b.com"), "a@b.com");
    }
}
