//! Inline float scanner
//!
//! Feature values are read straight out of the line without allocating. The common shape
//! (`[-]digits[.digits][e[-]digits]` followed by a space, tab or newline) is handled by a
//! fast accumulator; everything else falls back to a `strtod`-compatible scan so that
//! inputs like `1e+3`, `inf` or `nan` behave the way the training tools expect.

const MAX_DECIMALS: i32 = 35;

/// Parse a float at the start of `bytes`.
///
/// Returns the value and how many bytes were consumed. Zero consumed bytes means no number
/// was found, in which case the value is `0.0`.
pub fn parse_float(bytes: &[u8]) -> (f32, usize) {
    if bytes.is_empty() {
        return (0.0, 0);
    }

    let at = |i: usize| bytes.get(i).copied();
    let mut p = 0;
    while at(p) == Some(b' ') {
        p += 1;
    }

    let mut sign = 1.0f32;
    if at(p) == Some(b'-') {
        sign = -1.0;
        p += 1;
    }

    let mut acc = 0.0f32;
    while let Some(d @ b'0'..=b'9') = at(p) {
        acc = acc * 10.0 + (d - b'0') as f32;
        p += 1;
    }

    let mut num_dec: i32 = 0;
    if at(p) == Some(b'.') {
        p += 1;
        while let Some(d @ b'0'..=b'9') = at(p) {
            if num_dec < MAX_DECIMALS {
                acc = acc * 10.0 + (d - b'0') as f32;
                num_dec += 1;
            }
            p += 1;
        }
    }

    let mut exp_acc: i32 = 0;
    if matches!(at(p), Some(b'e') | Some(b'E')) {
        p += 1;
        let mut exp_sign = 1;
        if at(p) == Some(b'-') {
            exp_sign = -1;
            p += 1;
        }
        while let Some(d @ b'0'..=b'9') = at(p) {
            exp_acc = exp_acc.wrapping_mul(10).wrapping_add((d - b'0') as i32);
            p += 1;
        }
        exp_acc = exp_acc.wrapping_mul(exp_sign);
    }

    if matches!(at(p), Some(b' ') | Some(b'\n') | Some(b'\t')) {
        acc *= 10f32.powf(exp_acc.wrapping_sub(num_dec) as f32);
        return (sign * acc, p);
    }

    strtod(bytes)
}

/// Longest-prefix decimal scan in the manner of C `strtod`, narrowed to `f32`.
fn strtod(bytes: &[u8]) -> (f32, usize) {
    let at = |i: usize| bytes.get(i).copied();
    let mut p = 0;
    while matches!(at(p), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)) {
        p += 1;
    }
    let number_start = p;

    let mut negative = false;
    if let Some(s @ (b'+' | b'-')) = at(p) {
        negative = s == b'-';
        p += 1;
    }

    if let Some((value, len)) = special_value(&bytes[p..]).or_else(|| hex_value(&bytes[p..])) {
        let value = if negative { -value } else { value };
        return (value as f32, p + len);
    }

    let mut int_digits = 0;
    while at(p).is_some_and(|b| b.is_ascii_digit()) {
        p += 1;
        int_digits += 1;
    }
    let mut frac_digits = 0;
    if at(p) == Some(b'.') {
        let mut q = p + 1;
        while at(q).is_some_and(|b| b.is_ascii_digit()) {
            q += 1;
            frac_digits += 1;
        }
        if int_digits + frac_digits > 0 {
            p = q;
        }
    }
    if int_digits + frac_digits == 0 {
        return (0.0, 0);
    }

    if matches!(at(p), Some(b'e' | b'E')) {
        let mut q = p + 1;
        if matches!(at(q), Some(b'+' | b'-')) {
            q += 1;
        }
        let exp_digits_start = q;
        while at(q).is_some_and(|b| b.is_ascii_digit()) {
            q += 1;
        }
        if q > exp_digits_start {
            p = q;
        }
    }

    let text = match std::str::from_utf8(&bytes[number_start..p]) {
        Ok(text) => text,
        Err(_) => return (0.0, 0),
    };
    match text.parse::<f64>() {
        Ok(value) => (value as f32, p),
        Err(_) => (0.0, 0),
    }
}

/// `inf`, `infinity` and `nan`, case-insensitive.
fn special_value(bytes: &[u8]) -> Option<(f64, usize)> {
    let starts_with = |word: &[u8]| {
        bytes.len() >= word.len() && bytes[..word.len()].eq_ignore_ascii_case(word)
    };
    if starts_with(b"infinity") {
        Some((f64::INFINITY, 8))
    } else if starts_with(b"inf") {
        Some((f64::INFINITY, 3))
    } else if starts_with(b"nan") {
        Some((f64::NAN, 3))
    } else {
        None
    }
}

/// C99 hexadecimal float: `0x` mantissa, optional `.` fraction, optional `p` binary
/// exponent. `None` when no hex digit follows the prefix.
fn hex_value(bytes: &[u8]) -> Option<(f64, usize)> {
    if bytes.len() < 3 || bytes[0] != b'0' || !matches!(bytes[1], b'x' | b'X') {
        return None;
    }
    let at = |i: usize| bytes.get(i).copied();
    let hex_digit = |i: usize| at(i).and_then(|b| (b as char).to_digit(16));

    let mut p = 2;
    let mut mantissa = 0f64;
    let mut digits = 0;
    while let Some(d) = hex_digit(p) {
        mantissa = mantissa * 16.0 + d as f64;
        digits += 1;
        p += 1;
    }
    let mut scale = 0i32;
    if at(p) == Some(b'.') {
        let mut q = p + 1;
        while let Some(d) = hex_digit(q) {
            mantissa = mantissa * 16.0 + d as f64;
            scale -= 4;
            digits += 1;
            q += 1;
        }
        if digits > 0 {
            p = q;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(at(p), Some(b'p' | b'P')) {
        let mut q = p + 1;
        let mut exp_negative = false;
        if let Some(s @ (b'+' | b'-')) = at(q) {
            exp_negative = s == b'-';
            q += 1;
        }
        let exp_digits_start = q;
        let mut exp = 0i32;
        while let Some(d) = at(q).filter(u8::is_ascii_digit) {
            exp = exp.saturating_mul(10).saturating_add((d - b'0') as i32);
            q += 1;
        }
        if q > exp_digits_start {
            scale = scale.saturating_add(if exp_negative { -exp } else { exp });
            p = q;
        }
    }
    Some((mantissa * 2f64.powi(scale), p))
}
