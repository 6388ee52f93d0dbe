use crate::{ast, grammar};

/// A numeric token that could not be interpreted.
///
/// The parser re-reports these with the name of the construct being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberError {
    /// The text matched none of the literal forms allowed here.
    Malformed,
    /// A negative value where only non-negative values are allowed.
    Negative,
    /// An integer literal larger than `u64::MAX`.
    OutOfRange,
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

fn radix_and_digits(text: &str) -> Option<(u32, &str)> {
    if grammar::is_decimal(text) {
        Some((10, text))
    } else if grammar::is_hex(text) {
        Some((16, &text[2..]))
    } else if grammar::is_octal(text) {
        Some((8, &text[1..]))
    } else {
        None
    }
}

/// Parses a field number, enum value number or extension range bound.
///
/// Values outside the 32 bit range are truncated to their low 32 bits rather than rejected. Unless
/// `allow_negative` is set, a result below zero is an error.
pub(crate) fn parse_id(text: &str, allow_negative: bool) -> Result<i32, NumberError> {
    let (negative, unsigned) = split_sign(text);
    let (radix, digits) = radix_and_digits(unsigned).ok_or(NumberError::Malformed)?;

    let mut value = 0u32;
    for ch in digits.chars() {
        let digit = ch.to_digit(radix).ok_or(NumberError::Malformed)?;
        value = value.wrapping_mul(radix).wrapping_add(digit);
    }

    let id = if negative {
        (value as i32).wrapping_neg()
    } else {
        value as i32
    };

    if id < 0 && !allow_negative {
        return Err(NumberError::Negative);
    }
    Ok(id)
}

/// Parses a numeric option value, which may be an integer in any base or a float.
pub(crate) fn parse_number(text: &str) -> Result<ast::OptionValue, NumberError> {
    let (negative, unsigned) = split_sign(text);

    if let Some((radix, digits)) = radix_and_digits(unsigned) {
        let value = u64::from_str_radix(digits, radix).map_err(|_| NumberError::OutOfRange)?;
        return Ok(ast::OptionValue::Int(ast::Int { negative, value }));
    }

    if grammar::is_float(unsigned) {
        let value: f64 = unsigned.parse().map_err(|_| NumberError::Malformed)?;
        return Ok(ast::OptionValue::Float(if negative { -value } else { value }));
    }

    Err(NumberError::Malformed)
}
