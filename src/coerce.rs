//! Scalar text → leaf bytes.
//!
//! Integer targets parse the text as a decimal literal and narrow to the
//! target width, failing on overflow. Unsigned targets also accept
//! `true`/`false` (any case) as 1/0, since booleans are stored as unsigned
//! integers. Float targets turn any text containing `nan` (any case) into a
//! quiet NaN and accept the YAML infinities `.inf`, `+.inf`, `-.inf`.

use std::collections::BTreeMap;

use crate::error::ReflectfigError;
use crate::types::NumericKind;

/// Encode `text` as a native-endian numeric of `size` bytes.
pub fn numeric_bytes(
    kind: NumericKind,
    size: usize,
    text: &str,
    path: &str,
    target: &str,
) -> Result<Vec<u8>, ReflectfigError> {
    let mismatch = || ReflectfigError::ValueMismatch {
        path: path.to_string(),
        value: text.to_string(),
        target: target.to_string(),
    };
    let unsupported = || ReflectfigError::UnsupportedWidth {
        path: path.to_string(),
        target: target.to_string(),
        width: size,
    };

    match kind {
        NumericKind::Float => match size {
            4 => {
                let v = match FloatLiteral::classify(text) {
                    FloatLiteral::NaN => f32::NAN,
                    FloatLiteral::Infinity => f32::INFINITY,
                    FloatLiteral::NegInfinity => f32::NEG_INFINITY,
                    FloatLiteral::Decimal => text.parse::<f32>().map_err(|_| mismatch())?,
                };
                Ok(v.to_ne_bytes().to_vec())
            }
            8 => {
                let v = match FloatLiteral::classify(text) {
                    FloatLiteral::NaN => f64::NAN,
                    FloatLiteral::Infinity => f64::INFINITY,
                    FloatLiteral::NegInfinity => f64::NEG_INFINITY,
                    FloatLiteral::Decimal => text.parse::<f64>().map_err(|_| mismatch())?,
                };
                Ok(v.to_ne_bytes().to_vec())
            }
            _ => Err(unsupported()),
        },
        NumericKind::Signed => {
            if !matches!(size, 1 | 2 | 4 | 8) {
                return Err(unsupported());
            }
            let v: i64 = text.parse().map_err(|_| mismatch())?;
            let bytes = match size {
                1 => i8::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                2 => i16::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                4 => i32::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                _ => Ok(v.to_ne_bytes().to_vec()),
            };
            bytes.map_err(|_| mismatch())
        }
        NumericKind::Unsigned => {
            if !matches!(size, 1 | 2 | 4 | 8) {
                return Err(unsupported());
            }
            let literal = if text.eq_ignore_ascii_case("true") {
                "1"
            } else if text.eq_ignore_ascii_case("false") {
                "0"
            } else {
                text
            };
            let v: u64 = literal.parse().map_err(|_| mismatch())?;
            let bytes = match size {
                1 => u8::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                2 => u16::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                4 => u32::try_from(v).map(|n| n.to_ne_bytes().to_vec()),
                _ => Ok(v.to_ne_bytes().to_vec()),
            };
            bytes.map_err(|_| mismatch())
        }
    }
}

enum FloatLiteral {
    NaN,
    Infinity,
    NegInfinity,
    Decimal,
}

impl FloatLiteral {
    fn classify(text: &str) -> Self {
        let lower = text.to_ascii_lowercase();
        if lower.contains("nan") {
            return FloatLiteral::NaN;
        }
        match lower.as_str() {
            ".inf" | "+.inf" => FloatLiteral::Infinity,
            "-.inf" => FloatLiteral::NegInfinity,
            _ => FloatLiteral::Decimal,
        }
    }
}

/// Resolve an enum name (optionally written `:NAME`) to its code.
pub fn enum_code(
    values: &BTreeMap<String, i32>,
    size: usize,
    text: &str,
    path: &str,
    target: &str,
) -> Result<i32, ReflectfigError> {
    if text.is_empty() {
        return Err(ReflectfigError::ValueMismatch {
            path: path.to_string(),
            value: String::new(),
            target: target.to_string(),
        });
    }

    let name = text.strip_prefix(':').unwrap_or(text);
    let Some(code) = values.get(name) else {
        return Err(ReflectfigError::UnknownEnumName {
            path: path.to_string(),
            value: text.to_string(),
            target: target.to_string(),
            known: values
                .keys()
                .filter(|k| !k.is_empty())
                .map(|k| k.strip_prefix(':').unwrap_or(k).to_string())
                .collect(),
        });
    };

    if size != 4 {
        return Err(ReflectfigError::UnsupportedWidth {
            path: path.to_string(),
            target: target.to_string(),
            width: size,
        });
    }
    Ok(*code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(kind: NumericKind, size: usize, text: &str) -> Result<Vec<u8>, ReflectfigError> {
        numeric_bytes(kind, size, text, "prop", "/target")
    }

    #[test]
    fn signed_widths() {
        assert_eq!(num(NumericKind::Signed, 1, "-5").unwrap(), (-5i8).to_ne_bytes());
        assert_eq!(num(NumericKind::Signed, 2, "300").unwrap(), 300i16.to_ne_bytes());
        assert_eq!(num(NumericKind::Signed, 4, "5").unwrap(), 5i32.to_ne_bytes());
        assert_eq!(
            num(NumericKind::Signed, 8, "-9000000000").unwrap(),
            (-9_000_000_000i64).to_ne_bytes()
        );
    }

    #[test]
    fn narrowing_overflow_is_a_mismatch() {
        let err = num(NumericKind::Signed, 1, "200").unwrap_err();
        match err {
            ReflectfigError::ValueMismatch { path, value, target } => {
                assert_eq!(path, "prop");
                assert_eq!(value, "200");
                assert_eq!(target, "/target");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(num(NumericKind::Unsigned, 1, "256").is_err());
        assert!(num(NumericKind::Unsigned, 4, "-1").is_err());
    }

    #[test]
    fn unsigned_accepts_booleans() {
        assert_eq!(num(NumericKind::Unsigned, 1, "true").unwrap(), [1u8]);
        assert_eq!(num(NumericKind::Unsigned, 1, "FALSE").unwrap(), [0u8]);
        assert_eq!(num(NumericKind::Unsigned, 4, "True").unwrap(), 1u32.to_ne_bytes());
        assert!(num(NumericKind::Signed, 4, "true").is_err());
    }

    #[test]
    fn unsigned_full_range() {
        assert_eq!(
            num(NumericKind::Unsigned, 8, "18446744073709551615").unwrap(),
            u64::MAX.to_ne_bytes()
        );
    }

    #[test]
    fn integers_reject_fractions_and_garbage() {
        assert!(num(NumericKind::Signed, 4, "1.5").is_err());
        assert!(num(NumericKind::Signed, 4, "abc").is_err());
        assert!(num(NumericKind::Signed, 4, "").is_err());
    }

    #[test]
    fn unexpected_widths_are_unsupported() {
        assert!(matches!(
            num(NumericKind::Signed, 3, "1"),
            Err(ReflectfigError::UnsupportedWidth { width: 3, .. })
        ));
        assert!(matches!(
            num(NumericKind::Float, 16, "1"),
            Err(ReflectfigError::UnsupportedWidth { width: 16, .. })
        ));
    }

    #[test]
    fn floats_parse_decimals() {
        assert_eq!(num(NumericKind::Float, 8, "2.5").unwrap(), 2.5f64.to_ne_bytes());
        assert_eq!(num(NumericKind::Float, 4, "-0.25").unwrap(), (-0.25f32).to_ne_bytes());
        assert_eq!(num(NumericKind::Float, 8, "1e3").unwrap(), 1000f64.to_ne_bytes());
    }

    #[test]
    fn nan_in_any_case_is_quiet_nan() {
        for text in ["NaN", "nan", ".NaN", "-nan"] {
            let bytes = num(NumericKind::Float, 8, text).unwrap();
            let v = f64::from_ne_bytes(bytes.try_into().unwrap());
            assert!(v.is_nan(), "for {text}");
            assert_ne!(v.to_bits() & (1 << 51), 0, "quiet bit for {text}");
        }
        let bytes = num(NumericKind::Float, 4, "NAN").unwrap();
        assert!(f32::from_ne_bytes(bytes.try_into().unwrap()).is_nan());
    }

    #[test]
    fn yaml_infinities() {
        assert_eq!(
            num(NumericKind::Float, 8, ".inf").unwrap(),
            f64::INFINITY.to_ne_bytes()
        );
        assert_eq!(
            num(NumericKind::Float, 4, "-.Inf").unwrap(),
            f32::NEG_INFINITY.to_ne_bytes()
        );
    }

    #[test]
    fn float_garbage_is_a_mismatch() {
        assert!(matches!(
            num(NumericKind::Float, 8, "abc"),
            Err(ReflectfigError::ValueMismatch { .. })
        ));
    }

    fn directions() -> BTreeMap<String, i32> {
        [("NORTH".to_string(), 0), ("SOUTH".to_string(), 1)]
            .into_iter()
            .collect()
    }

    #[test]
    fn enum_names_with_and_without_colon() {
        assert_eq!(enum_code(&directions(), 4, "NORTH", "p", "/Dir").unwrap(), 0);
        assert_eq!(enum_code(&directions(), 4, ":NORTH", "p", "/Dir").unwrap(), 0);
        assert_eq!(enum_code(&directions(), 4, "SOUTH", "p", "/Dir").unwrap(), 1);
    }

    #[test]
    fn unknown_enum_lists_names() {
        let err = enum_code(&directions(), 4, "WEST", "p", "/Dir").unwrap_err();
        match err {
            ReflectfigError::UnknownEnumName { value, known, .. } => {
                assert_eq!(value, "WEST");
                assert_eq!(known, vec!["NORTH", "SOUTH"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn known_names_are_listed_without_colon_and_empties() {
        let values: BTreeMap<String, i32> = [
            (String::new(), 9),
            (":EAST".to_string(), 2),
            ("NORTH".to_string(), 0),
        ]
        .into_iter()
        .collect();
        let err = enum_code(&values, 4, "WEST", "p", "/Dir").unwrap_err();
        let ReflectfigError::UnknownEnumName { known, .. } = err else {
            panic!("expected UnknownEnumName");
        };
        assert_eq!(known, vec!["EAST", "NORTH"]);
    }

    #[test]
    fn empty_enum_value_is_rejected() {
        assert!(matches!(
            enum_code(&directions(), 4, "", "p", "/Dir"),
            Err(ReflectfigError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn only_four_byte_enums() {
        assert!(matches!(
            enum_code(&directions(), 2, "NORTH", "p", "/Dir"),
            Err(ReflectfigError::UnsupportedWidth { width: 2, .. })
        ));
    }
}
