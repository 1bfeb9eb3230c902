// Numeric field parsing and normalization

/// Optional inclusive bounds applied when normalizing a field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds { min: None, max: None };

    /// Relative humidity, 0-100 %
    pub const PERCENT: Bounds = Bounds {
        min: Some(0.0),
        max: Some(100.0),
    };
}

/// Largest magnitude below which every integral f64 is exact
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parse a field strictly: sign, digits, optional fraction and exponent.
/// Whitespace, `inf`, `NaN` and anything that overflows to infinity are rejected.
pub fn parse_strict(text: &str) -> Option<f64> {
    if !is_decimal_literal(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Canonical text for a parsed number ("40.0" -> "40", "1e3" -> "1000")
pub fn canonical(value: f64) -> String {
    format!("{}", value)
}

/// Coerce raw field text into a numeric string or empty.
///
/// Empty text, a bare `-` and a bare `.` are in-progress editing states and
/// pass through untouched, as does an in-bounds fraction still being typed
/// (`"0."`, `"0.0"` on the way to `"0.05"`). Anything unparsable collapses to
/// empty; values outside `bounds` clamp to the nearest bound.
pub fn normalize(text: &str, bounds: Bounds) -> String {
    if matches!(text, "" | "-" | ".") {
        return text.to_string();
    }

    let Some(value) = parse_strict(text) else {
        return String::new();
    };

    if let Some(min) = bounds.min {
        if value < min {
            return canonical(min);
        }
    }
    if let Some(max) = bounds.max {
        if value > max {
            return canonical(max);
        }
    }

    if is_partial_fraction(text) {
        return text.to_string();
    }
    canonical(value)
}

/// Normalize a whole-number field such as an identifier.
///
/// Fractional values and integers too large to hold exactly collapse to
/// empty, so the field only ever carries an integer or an editing state.
pub fn normalize_integer(text: &str, bounds: Bounds) -> String {
    let normalized = normalize(text, bounds);
    match parse_strict(&normalized) {
        Some(value) if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER => canonical(value),
        Some(_) => String::new(),
        None => normalized,
    }
}

/// A plain decimal whose fraction ends in `.` or `0`
fn is_partial_fraction(text: &str) -> bool {
    text.contains('.')
        && !text.contains(['e', 'E'])
        && (text.ends_with('.') || text.ends_with('0'))
}

fn is_decimal_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
