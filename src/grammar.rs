//! Classification of token text.
//!
//! Tokens are plain text slices. Whether a token is a name, a type reference or a numeric literal
//! is decided by the productions that consume it, using the predicates in this module. The classes
//! overlap freely (`max` is both a name and a type reference), so none of them take precedence.

pub(crate) const STATEMENT_END: &str = ";";
pub(crate) const BLOCK_OPEN: &str = "{";
pub(crate) const BLOCK_CLOSE: &str = "}";
pub(crate) const ASSIGN: &str = "=";
pub(crate) const CUSTOM_OPEN: &str = "(";
pub(crate) const CUSTOM_CLOSE: &str = ")";
pub(crate) const OPTIONS_OPEN: &str = "[";
pub(crate) const OPTIONS_CLOSE: &str = "]";
pub(crate) const OPTIONS_SEPARATOR: &str = ",";
pub(crate) const DOUBLE_QUOTE: &str = "\"";
pub(crate) const SINGLE_QUOTE: &str = "'";

const SCALAR_TYPES: &[&str] = &[
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// Field, message, enum, service and method names.
pub(crate) fn is_name(s: &str) -> bool {
    match s.as_bytes().split_first() {
        Some((&first, rest)) => {
            (first.is_ascii_alphabetic() || first == b'_')
                && rest.iter().all(|&ch| ch.is_ascii_alphanumeric() || ch == b'_')
        }
        None => false,
    }
}

/// A possibly dot-qualified name, such as `Foo`, `foo.Bar` or `.foo.Bar`.
pub(crate) fn is_type_ref(s: &str) -> bool {
    let s = s.strip_prefix('.').unwrap_or(s);
    !s.is_empty() && s.split('.').all(is_name)
}

/// The dotted suffix that may follow a parenthesized option name, as in `(foo.bar).baz`.
pub(crate) fn is_fq_continuation(s: &str) -> bool {
    match s.strip_prefix('.') {
        Some(rest) => rest.split('.').all(|part| {
            is_name(part) && part.as_bytes()[0].is_ascii_alphabetic()
        }),
        None => false,
    }
}

pub(crate) fn is_scalar_type(s: &str) -> bool {
    SCALAR_TYPES.contains(&s)
}

pub(crate) fn is_field_type(s: &str) -> bool {
    is_scalar_type(s) || is_type_ref(s)
}

pub(crate) fn is_bool(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
}

pub(crate) fn is_string_open(s: &str) -> bool {
    s == DOUBLE_QUOTE || s == SINGLE_QUOTE
}

pub(crate) fn is_group_name(s: &str) -> bool {
    is_name(s) && s.as_bytes()[0].is_ascii_uppercase()
}

pub(crate) fn is_decimal(s: &str) -> bool {
    match s.as_bytes() {
        [b'0'] => true,
        [first, rest @ ..] => (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit),
        [] => false,
    }
}

pub(crate) fn is_hex(s: &str) -> bool {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|ch| ch.is_ascii_hexdigit()),
        None => false,
    }
}

pub(crate) fn is_octal(s: &str) -> bool {
    match s.strip_prefix('0') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|ch| (b'0'..=b'7').contains(&ch)),
        None => false,
    }
}

/// Floating point literals: `1.5`, `1.`, `.5`, `1e10`, `2.5E-3`, `inf` and `nan`.
pub(crate) fn is_float(s: &str) -> bool {
    if s == "inf" || s == "nan" {
        return true;
    }

    let (mantissa, exponent) = match s.find(|ch: char| ch == 'e' || ch == 'E') {
        Some(index) => (&s[..index], Some(&s[index + 1..])),
        None => (s, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            !(int.is_empty() && frac.is_empty())
                && int.bytes().all(|ch| ch.is_ascii_digit())
                && frac.bytes().all(|ch| ch.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.bytes().all(|ch| ch.is_ascii_digit()),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(|ch: char| ch == '+' || ch == '-').unwrap_or(exp);
            !digits.is_empty() && digits.bytes().all(|ch| ch.is_ascii_digit())
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

/// Any numeric literal, with an optional leading minus sign.
pub(crate) fn is_number(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    is_decimal(s) || is_hex(s) || is_octal(s) || is_float(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(is_name("foo"));
        assert!(is_name("_foo9"));
        assert!(is_name("Foo_Bar"));
        assert!(!is_name("9foo"));
        assert!(!is_name(""));
        assert!(!is_name("foo.bar"));
        assert!(!is_name("foo-bar"));
    }

    #[test]
    fn type_refs() {
        assert!(is_type_ref("Foo"));
        assert!(is_type_ref("foo.bar.Baz"));
        assert!(is_type_ref(".foo.Bar"));
        assert!(!is_type_ref("."));
        assert!(!is_type_ref("foo..Bar"));
        assert!(!is_type_ref("foo."));
        assert!(!is_type_ref("..foo"));
        assert!(!is_type_ref("1foo"));
    }

    #[test]
    fn fq_continuations() {
        assert!(is_fq_continuation(".baz"));
        assert!(is_fq_continuation(".baz.quz"));
        assert!(!is_fq_continuation("baz"));
        assert!(!is_fq_continuation(".9baz"));
        assert!(!is_fq_continuation("."));
    }

    #[test]
    fn keywords() {
        assert!(is_scalar_type("sfixed64"));
        assert!(!is_scalar_type("Foo"));
        assert!(is_field_type("Foo"));
        assert!(is_field_type("bytes"));
        assert!(is_bool("TRUE"));
        assert!(is_bool("false"));
        assert!(!is_bool("yes"));
        assert!(is_group_name("Result"));
        assert!(!is_group_name("result"));
    }

    #[test]
    fn numbers() {
        assert!(is_decimal("0"));
        assert!(is_decimal("10"));
        assert!(!is_decimal("017"));
        assert!(is_hex("0x1A"));
        assert!(is_hex("0XfF"));
        assert!(!is_hex("0x"));
        assert!(is_octal("017"));
        assert!(!is_octal("018"));
        assert!(!is_octal("0"));
        assert!(is_float("3.14"));
        assert!(is_float("1."));
        assert!(is_float(".5"));
        assert!(is_float("1e10"));
        assert!(is_float("2.5E-3"));
        assert!(is_float("inf"));
        assert!(!is_float("."));
        assert!(!is_float("e5"));
        assert!(!is_float("1e"));
        assert!(is_number("-5"));
        assert!(is_number("-0x10"));
        assert!(!is_number("-foo"));
        assert!(!is_number("--5"));
    }
}
