//! Numeric coercion of formatted source values.

/// Outcome of sanitizing one source value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sanitized {
    /// A finite number.
    Value(f64),
    /// Unparseable input; contributes zero and is counted.
    Invalid,
}

impl Sanitized {
    /// Numeric value, zero when invalid.
    pub fn or_zero(self) -> f64 {
        match self {
            Sanitized::Value(v) => v,
            Sanitized::Invalid => 0.0,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Sanitized::Invalid)
    }
}

fn normalize_minus(c: char) -> char {
    match c {
        '\u{2212}' | '\u{2012}'..='\u{2015}' | '\u{FE63}' | '\u{FF0D}' => '-',
        other => other,
    }
}

fn is_grouping(c: char) -> bool {
    matches!(c, ',' | '_' | '\'' | ' ' | '\u{00A0}' | '\u{202F}' | '\t')
}

/// Parse a currency-prefixed, comma-grouped number.
///
/// Grouping characters are removed, minus variants normalized, currency
/// symbols or codes before and after the digits dropped, and accounting
/// parentheses read as a negative sign.
///
/// ```
/// use dx_metrics::{sanitize_number, Sanitized};
/// assert_eq!(sanitize_number("AED 1,234.50"), Sanitized::Value(1234.5));
/// assert_eq!(sanitize_number("(2,000)"), Sanitized::Value(-2000.0));
/// assert_eq!(sanitize_number("\u{2212}$12"), Sanitized::Value(-12.0));
/// assert_eq!(sanitize_number("n/a"), Sanitized::Invalid);
/// ```
pub fn sanitize_number(raw: &str) -> Sanitized {
    let mut text: Vec<char> = raw
        .trim()
        .chars()
        .map(normalize_minus)
        .filter(|c| !is_grouping(*c))
        .collect();

    let mut negative = false;
    if text.len() >= 2 && text.first() == Some(&'(') && text.last() == Some(&')') {
        negative = true;
        text = text[1..text.len() - 1].to_vec();
    }

    let starts_number = |i: usize| {
        let c = text[i];
        c.is_ascii_digit()
            || (c == '.' && text.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
    };
    let Some(start) = (0..text.len()).find(|&i| starts_number(i)) else {
        return Sanitized::Invalid;
    };
    let Some(last_digit) = text.iter().rposition(|c| c.is_ascii_digit()) else {
        return Sanitized::Invalid;
    };

    if text[..start].contains(&'-') {
        negative = !negative;
    }

    let body: String = text[start..=last_digit].iter().collect();
    match body.parse::<f64>() {
        Ok(v) if v.is_finite() => Sanitized::Value(if negative { -v } else { v }),
        _ => Sanitized::Invalid,
    }
}
