//! Number formatting shared by the exporter and the replay runtime.
//!
//! The replay runtime script carries a line-for-line mirror of these rules
//! (`fmtValue`, `fmtDelta`, `toFixedJs`); both sides must agree on every
//! printed character.

/// Glyph shown when a delta is undefined (previous value zero).
pub const NEUTRAL_GLYPH: &str = "—";

/// Format a value with the dashboard's magnitude suffixes.
///
/// `n.nn M` for magnitudes of at least one million, `n.n K` for at least one
/// thousand, and a rounded integer otherwise. Non-finite input prints as `0`.
pub fn format_value(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{} M", to_fixed(value / 1_000_000.0, 2))
    } else if magnitude >= 1_000.0 {
        format!("{} K", to_fixed(value / 1_000.0, 1))
    } else {
        to_fixed(value, 0)
    }
}

/// Percentage change between consecutive visible periods.
///
/// `(curr - prev) / |prev| * 100`, or `None` whenever `prev == 0`.
pub fn percent_delta(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 || !prev.is_finite() || !curr.is_finite() {
        return None;
    }
    Some((curr - prev) / prev.abs() * 100.0)
}

/// Format a delta as `+30.0%` / `-100.0%`, or the neutral glyph.
pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) if d.is_finite() => {
            let body = to_fixed(d, 1);
            if d > 0.0 && body != "0.0" {
                format!("+{}%", body)
            } else {
                format!("{}%", body)
            }
        }
        _ => NEUTRAL_GLYPH.to_string(),
    }
}

/// Fixed-point rendering with ties rounded away from zero.
///
/// Matches `Number.prototype.toFixed` on the exact binary value, including
/// the minus sign on a negative input that rounds to zero (`-0.3` -> `-0`).
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return to_fixed(0.0, digits);
    }
    let negative = value < 0.0;
    let expanded = format!("{:.*}", digits + 30, value.abs());
    let (int_part, frac_part) = expanded.split_once('.').unwrap_or((expanded.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    let next = frac_part.as_bytes().get(digits).copied().unwrap_or(b'0');

    if next >= b'5' {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }

    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if negative {
        out.push('-');
    }
    out.extend(kept[..int_len].iter().map(|&b| b as char));
    if digits > 0 {
        out.push('.');
        out.extend(kept[int_len..].iter().map(|&b| b as char));
    }
    out
}
