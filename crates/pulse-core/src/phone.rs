//! Phone number canonicalisation.
//!
//! The canonical form is a bare digit string prefixed with the country
//! calling code and no leading `+`, e.g. `27821234567`. It is the lookup key
//! for subscribers and the `to` field of every outbound request.

/// Country calling code substituted for a national trunk prefix `0`.
pub const COUNTRY_CODE: &str = "27";

/// Inclusive bounds on the canonical digit count.
pub const MIN_DIGITS: usize = 10;
pub const MAX_DIGITS: usize = 15;

/// Canonicalise `raw`: keep only ASCII digits and swap a leading `0` for
/// [`COUNTRY_CODE`]. Never fails; garbage in yields deterministic garbage out.
pub fn normalize(raw: &str) -> String {
  let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

  match digits.strip_prefix('0') {
    Some(rest) => format!("{COUNTRY_CODE}{rest}"),
    None => digits,
  }
}

/// `true` if `raw` normalises to between [`MIN_DIGITS`] and [`MAX_DIGITS`]
/// digits.
pub fn is_valid(raw: &str) -> bool {
  let normalized = normalize(raw);
  (MIN_DIGITS..=MAX_DIGITS).contains(&normalized.len())
    && normalized.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn national_international_and_bare_forms_agree() {
    let expected = "27821234567";
    assert_eq!(normalize("0821234567"), expected);
    assert_eq!(normalize("+27821234567"), expected);
    assert_eq!(normalize("27821234567"), expected);
    assert_eq!(normalize("+27 82 123-4567"), expected);
    assert_eq!(normalize("(082) 123 4567"), expected);
  }

  #[test]
  fn normalize_is_idempotent() {
    for raw in [
      "0821234567",
      "+27821234567",
      "00",
      "0",
      "",
      "abc",
      "+1 (555) 010-9999",
      "0027821234567",
    ] {
      let once = normalize(raw);
      assert_eq!(normalize(&once), once, "input {raw:?}");
    }
  }

  #[test]
  fn malformed_input_is_deterministic() {
    assert_eq!(normalize("not a number"), "");
    assert_eq!(normalize("0"), "27");
    assert_eq!(normalize("00"), "270");
  }

  #[test]
  fn validity_boundaries() {
    assert!(!is_valid("123456789"));
    assert!(is_valid("1234567890"));
    assert!(is_valid("123456789012345"));
    assert!(!is_valid("1234567890123456"));
  }

  #[test]
  fn validity_uses_normalised_length() {
    // Nine national digits become ten once the trunk prefix is expanded.
    assert!(is_valid("082123456"));
    assert!(!is_valid(""));
    assert!(!is_valid("+-() "));
  }
}
