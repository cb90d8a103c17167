//! Display formatting for raw token amounts.
//!
//! Amounts are raw integer units (`u64`). A token with `decimals = 6` shows
//! `1_500_000` raw as `1.5`.

/// Format a raw amount as a human-readable decimal with thousands separators
/// and at most two fraction digits (rounded half up, trailing zeros dropped).
///
/// Scales beyond `u128` round every `u64` amount to zero.
pub fn format_display_amount(raw: u64, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(u32::from(decimals)) else {
        return "0".to_string();
    };
    let hundredths = (raw as u128 * 100 + scale / 2) / scale;
    let whole = hundredths / 100;
    let frac = hundredths % 100;

    let mut out = group_thousands(whole);
    if frac != 0 {
        if frac % 10 == 0 {
            out.push_str(&format!(".{}", frac / 10));
        } else {
            out.push_str(&format!(".{frac:02}"));
        }
    }
    out
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
