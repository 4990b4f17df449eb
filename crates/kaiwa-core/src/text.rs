//! Byte-budgeted line truncation for the IRC wire format.
//!
//! IRC caps every raw line at 512 bytes including the trailing CRLF, so an
//! outbound line has at most 510 bytes of payload. Rust `&str[..n]` panics
//! when `n` falls inside a multi-byte character, so the fit is always
//! computed on char boundaries. A fitted line is wrapped in [`Truncated`]
//! so that a value which already went through the budget step is never
//! truncated again when it flows through a second budget-aware call site.

use std::fmt;

/// Hard protocol cap for one raw line, terminator included.
pub const MAX_LINE_BYTES: usize = 512;

/// Payload budget for lines sent to the server: [`MAX_LINE_BYTES`] minus
/// the mandatory two-byte CRLF terminator.
pub const SERVER_BUDGET: usize = MAX_LINE_BYTES - 2;

/// A line already fitted to a byte budget.
///
/// The only way to obtain one is [`fit_to_budget`], which makes the tag an
/// idempotence marker: feeding a `Truncated` back into [`fit_to_budget`]
/// returns it unchanged instead of double-accounting the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Truncated(String);

impl Truncated {
    /// The fitted text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the tag, yielding the fitted text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of characters in the fitted text.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for Truncated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to [`fit_to_budget`]: either plain text or an already-fitted line.
#[derive(Clone, Debug)]
pub enum Outgoing {
    /// Text that has not been through the budget step yet.
    Plain(String),
    /// A line already fitted to a budget; passed through unchanged.
    Fitted(Truncated),
}

impl From<&str> for Outgoing {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_owned())
    }
}

impl From<String> for Outgoing {
    fn from(s: String) -> Self {
        Self::Plain(s)
    }
}

impl From<Truncated> for Outgoing {
    fn from(t: Truncated) -> Self {
        Self::Fitted(t)
    }
}

/// Fit a line into `byte_limit` bytes.
///
/// Already-fitted input passes through unchanged. Plain input is cleaned
/// first: every CR and LF becomes a single space (one-for-one, so the char
/// count is unchanged by the replacement), then surrounding whitespace is
/// trimmed. The result is the longest char-boundary prefix of the cleaned
/// text whose byte length does not exceed `byte_limit`.
pub fn fit_to_budget(raw: impl Into<Outgoing>, byte_limit: usize) -> Truncated {
    let raw = match raw.into() {
        Outgoing::Fitted(t) => return t,
        Outgoing::Plain(s) => s,
    };
    let cleaned: String = raw
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    Truncated(truncate_str(cleaned.trim(), byte_limit).to_owned())
}

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
///
/// Returns the longest prefix of `s` whose byte length is ≤ `max_bytes`
/// and that does not split a multi-byte character.
#[inline]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // `floor_char_boundary` is nightly-only, so implement it ourselves.
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Payload budget for lines the server will relay to other clients.
///
/// The server prepends `:<hostmask> ` to relayed lines, so what other
/// clients can see shrinks by the hostmask's byte length plus the two
/// separator bytes.
pub fn client_budget(hostmask_bytes: usize) -> usize {
    SERVER_BUDGET
        .saturating_sub(hostmask_bytes)
        .saturating_sub(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── truncate_str ─────────────────────────────────────────────────────

    #[test]
    fn ascii_within_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn ascii_exact_limit() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn ascii_truncated() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn multibyte_boundary_snaps_back() {
        // 'é' (U+00E9) is 2 bytes: c(0) a(1) f(2) é(3,4)
        assert_eq!(truncate_str("café", 4), "caf");
        assert_eq!(truncate_str("café", 5), "café");
    }

    #[test]
    fn kana_three_byte_chars() {
        // 'か' and 'な' are 3 bytes each
        let s = "かな";
        assert_eq!(truncate_str(s, 2), "");
        assert_eq!(truncate_str(s, 3), "か");
        assert_eq!(truncate_str(s, 5), "か");
        assert_eq!(truncate_str(s, 6), "かな");
    }

    // ── fit_to_budget ────────────────────────────────────────────────────

    #[test]
    fn plain_within_budget_unchanged() {
        let t = fit_to_budget("PRIVMSG #chan :hi", SERVER_BUDGET);
        assert_eq!(t.as_str(), "PRIVMSG #chan :hi");
    }

    #[test]
    fn fitted_passes_through_unchanged() {
        let once = fit_to_budget("hello world", 5);
        let twice = fit_to_budget(once.clone(), 3);
        // Identical despite the smaller second budget: the tag wins.
        assert_eq!(once, twice);
    }

    #[test]
    fn crlf_replaced_by_spaces_one_for_one() {
        let t = fit_to_budget("a\rb\nc", SERVER_BUDGET);
        assert_eq!(t.as_str(), "a b c");
        assert_eq!(t.char_count(), 5);
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        let t = fit_to_budget("  hello  ", SERVER_BUDGET);
        assert_eq!(t.as_str(), "hello");
    }

    #[test]
    fn trailing_newline_trimmed_after_replacement() {
        // The newline becomes a space first, then the trim removes it.
        let t = fit_to_budget("hello\n", SERVER_BUDGET);
        assert_eq!(t.as_str(), "hello");
    }

    #[test]
    fn ascii_600_chars_fits_to_exactly_510() {
        let long = "x".repeat(600);
        let t = fit_to_budget(long.as_str(), SERVER_BUDGET);
        assert_eq!(t.as_str().len(), 510);
        assert_eq!(t.char_count(), 510);
    }

    #[test]
    fn multibyte_at_byte_510_yields_fewer_bytes() {
        // 169 'あ' (3 bytes each) = 507 bytes, then one more lands across
        // the 510-byte mark: 170 * 3 = 510 exactly, so pad with ASCII to
        // force a split. "a" + 170 'あ' = 511 bytes; byte 510 is inside
        // the last 'あ'.
        let s = format!("a{}", "あ".repeat(170));
        assert_eq!(s.len(), 511);
        let t = fit_to_budget(s.as_str(), SERVER_BUDGET);
        assert!(t.as_str().len() < 510);
        assert_eq!(t.as_str().len(), 508);
        assert!(t.as_str().chars().all(|c| c == 'a' || c == 'あ'));
    }

    #[test]
    fn zero_budget_yields_empty() {
        let t = fit_to_budget("hello", 0);
        assert_eq!(t.as_str(), "");
    }

    // ── client_budget ────────────────────────────────────────────────────

    #[test]
    fn client_budget_formula() {
        assert_eq!(client_budget(20), 510 - 20 - 2);
    }

    #[test]
    fn client_budget_saturates() {
        assert_eq!(client_budget(600), 0);
    }

    proptest! {
        #[test]
        fn fitted_never_exceeds_budget(s in ".*", limit in 0usize..600) {
            let t = fit_to_budget(s.as_str(), limit);
            prop_assert!(t.as_str().len() <= limit);
        }

        #[test]
        fn fitted_is_valid_prefix(s in ".*", limit in 0usize..600) {
            // A panic-free pass plus str invariants already prove validity;
            // also check the fit is a prefix of the cleaned input.
            let cleaned: String = s
                .chars()
                .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
                .collect();
            let t = fit_to_budget(s.as_str(), limit);
            prop_assert!(cleaned.trim().starts_with(t.as_str()));
        }

        #[test]
        fn refit_is_noop(s in ".*", limit in 0usize..600) {
            let once = fit_to_budget(s.as_str(), limit);
            let twice = fit_to_budget(once.clone(), limit);
            prop_assert_eq!(once, twice);
        }
    }
}
