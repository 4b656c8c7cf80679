//! PICTURE clause sizing and field type classification.
//!
//! A PICTURE string describes a field's character positions; the USAGE
//! qualifier decides how those positions are stored:
//!
//! | Usage            | Bytes                                   |
//! |------------------|-----------------------------------------|
//! | DISPLAY          | one per position                        |
//! | COMP / BINARY    | 2 (1-4 digits), 4 (5-9), 8 (10-18)      |
//! | COMP-3 / PACKED  | `digits / 2 + 1` (two digits per byte plus sign) |

use thiserror::Error;

use crate::layout::FieldType;

/// Largest digit count a binary (COMP) field can hold.
pub const MAX_BINARY_DIGITS: u32 = 18;

/// Reasons a PICTURE string has no usable size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PictureError {
    /// The string is empty.
    #[error("empty picture string")]
    Empty,
    /// A parenthesis without its partner, or a repeat count with no symbol.
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,
    /// A repeat count that is not a positive integer.
    #[error("invalid repeat count '{0}'")]
    InvalidRepeat(String),
    /// A character that is not a PICTURE symbol.
    #[error("unknown picture symbol '{0}'")]
    UnknownSymbol(char),
    /// Only sign, decimal-point or scaling symbols, so nothing is stored.
    #[error("picture describes no character positions")]
    NoPositions,
    /// Too many digits for binary storage.
    #[error("{digits} digits exceed the {max}-digit limit of binary storage")]
    TooManyDigits {
        /// Digits in the picture.
        digits: u32,
        /// Largest supported digit count.
        max: u32,
    },
}

/// USAGE of an elementary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    /// DISPLAY (default): one byte per position.
    #[default]
    Display,
    /// COMP / BINARY: halfword, fullword or doubleword binary.
    Binary,
    /// COMP-3 / PACKED-DECIMAL.
    PackedDecimal,
}

impl Usage {
    /// Parse a usage keyword (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "DISPLAY" => Some(Usage::Display),
            "COMP" | "COMP-4" | "COMPUTATIONAL" | "COMPUTATIONAL-4" | "BINARY" => {
                Some(Usage::Binary)
            }
            "COMP-3" | "COMPUTATIONAL-3" | "PACKED-DECIMAL" => Some(Usage::PackedDecimal),
            _ => None,
        }
    }

    /// Check if the item is stored in a non-character form.
    pub fn is_computational(&self) -> bool {
        matches!(self, Usage::Binary | Usage::PackedDecimal)
    }
}

/// Count the character/digit positions described by a PICTURE string.
///
/// The string is split on `V`. A segment with a repeat count is counted
/// symbol by symbol, `n` times for `x(n)`, with `S` and `P` taking no
/// positions; a segment without one counts every character it holds, so
/// `S999` is 4.
pub fn digit_count(picture: &str) -> Result<u32, PictureError> {
    if picture.is_empty() {
        return Err(PictureError::Empty);
    }

    let mut total: u32 = 0;
    for segment in picture.split(|c| c == 'V' || c == 'v') {
        let positions = segment_positions(segment)?;
        let count = if segment.contains('(') {
            positions
        } else {
            segment.chars().count() as u32
        };
        total = total.saturating_add(count);
    }

    if total == 0 {
        return Err(PictureError::NoPositions);
    }
    Ok(total)
}

/// Validate one `V`-free segment and count its storage positions.
fn segment_positions(segment: &str) -> Result<u32, PictureError> {
    let mut total: u32 = 0;
    let mut chars = segment.chars().peekable();

    while let Some(ch) = chars.next() {
        let symbol = ch.to_ascii_uppercase();
        if symbol == '(' || symbol == ')' {
            return Err(PictureError::UnbalancedParenthesis);
        }
        if !is_picture_symbol(symbol) {
            return Err(PictureError::UnknownSymbol(ch));
        }

        let repeat = if chars.peek() == Some(&'(') {
            chars.next();
            let mut digits = String::new();
            loop {
                match chars.next() {
                    Some(')') => break,
                    Some(c) => digits.push(c),
                    None => return Err(PictureError::UnbalancedParenthesis),
                }
            }
            match digits.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(PictureError::InvalidRepeat(digits)),
            }
        } else {
            1
        };

        if !matches!(symbol, 'S' | 'P') {
            total = total.saturating_add(repeat);
        }
    }

    Ok(total)
}

/// Storage size in bytes of a PICTURE string under a usage.
pub fn storage_size(picture: &str, usage: Usage) -> Result<u32, PictureError> {
    let digits = digit_count(picture)?;
    match usage {
        Usage::Display => Ok(digits),
        Usage::Binary => match digits {
            0..=4 => Ok(2),
            5..=9 => Ok(4),
            10..=MAX_BINARY_DIGITS => Ok(8),
            _ => Err(PictureError::TooManyDigits {
                digits,
                max: MAX_BINARY_DIGITS,
            }),
        },
        Usage::PackedDecimal => Ok(digits / 2 + 1),
    }
}

/// Semantic type of an elementary item.
///
/// Repeat counts are not symbols: `X(9)` is a string.
pub fn classify(picture: &str, usage: Usage) -> FieldType {
    let mut depth = 0usize;
    let has_digit_symbol = picture.chars().any(|ch| match ch {
        '(' => {
            depth += 1;
            false
        }
        ')' => {
            depth = depth.saturating_sub(1);
            false
        }
        '9' => depth == 0,
        _ => false,
    });

    if usage.is_computational() {
        FieldType::Binary
    } else if has_digit_symbol {
        FieldType::Number
    } else {
        FieldType::String
    }
}

fn is_picture_symbol(symbol: char) -> bool {
    matches!(
        symbol,
        '9' | 'X'
            | 'A'
            | 'N'
            | 'G'
            | 'U'
            | 'S'
            | 'V'
            | 'P'
            | 'Z'
            | 'B'
            | 'E'
            | '0'
            | '1'
            | '/'
            | ','
            | '.'
            | '+'
            | '-'
            | '*'
            | '$'
            | 'C'
            | 'R'
            | 'D'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_sizes() {
        assert_eq!(storage_size("9(5)", Usage::Display), Ok(5));
        assert_eq!(storage_size("X(10)", Usage::Display), Ok(10));
        assert_eq!(storage_size("9(5)V99", Usage::Display), Ok(7));
        assert_eq!(storage_size("XXX", Usage::Display), Ok(3));
        assert_eq!(storage_size("x(4)", Usage::Display), Ok(4));
    }

    #[test]
    fn test_sign_and_scaling_with_repeat_counts() {
        assert_eq!(digit_count("S9(3)"), Ok(3));
        assert_eq!(digit_count("S9(3)V9(2)"), Ok(5));
        assert_eq!(digit_count("9(3)PP"), Ok(3));
    }

    #[test]
    fn test_segments_without_repeat_count_use_character_count() {
        assert_eq!(digit_count("S999"), Ok(4));
        assert_eq!(digit_count("S999V99"), Ok(6));
        assert_eq!(storage_size("S999", Usage::Display), Ok(4));
        assert_eq!(storage_size("S999V99", Usage::Display), Ok(6));
        assert_eq!(storage_size("S999V99", Usage::PackedDecimal), Ok(4));
    }

    #[test]
    fn test_edited_pictures() {
        assert_eq!(digit_count("ZZ,ZZ9.99"), Ok(9));
        assert_eq!(digit_count("9(3).99"), Ok(6));
        assert_eq!(digit_count("-9(4)CR"), Ok(7));
    }

    #[test]
    fn test_binary_sizes() {
        assert_eq!(storage_size("9(3)", Usage::Binary), Ok(2));
        assert_eq!(storage_size("S9(4)", Usage::Binary), Ok(2));
        assert_eq!(storage_size("9(5)", Usage::Binary), Ok(4));
        assert_eq!(storage_size("S9(9)", Usage::Binary), Ok(4));
        assert_eq!(storage_size("S9(10)", Usage::Binary), Ok(8));
        assert_eq!(storage_size("9(18)", Usage::Binary), Ok(8));
        assert_eq!(
            storage_size("9(19)", Usage::Binary),
            Err(PictureError::TooManyDigits { digits: 19, max: 18 })
        );
    }

    #[test]
    fn test_packed_sizes() {
        assert_eq!(storage_size("9(5)", Usage::PackedDecimal), Ok(3));
        assert_eq!(storage_size("S9(7)V99", Usage::PackedDecimal), Ok(5));
        assert_eq!(storage_size("9(4)", Usage::PackedDecimal), Ok(3));
        assert_eq!(storage_size("9", Usage::PackedDecimal), Ok(1));
    }

    #[test]
    fn test_malformed_pictures() {
        assert_eq!(digit_count(""), Err(PictureError::Empty));
        assert_eq!(digit_count("9("), Err(PictureError::UnbalancedParenthesis));
        assert_eq!(digit_count("9(5"), Err(PictureError::UnbalancedParenthesis));
        assert_eq!(digit_count("(5)"), Err(PictureError::UnbalancedParenthesis));
        assert_eq!(digit_count("9)"), Err(PictureError::UnbalancedParenthesis));
        assert_eq!(
            digit_count("X(A)"),
            Err(PictureError::InvalidRepeat("A".to_string()))
        );
        assert_eq!(
            digit_count("X(0)"),
            Err(PictureError::InvalidRepeat("0".to_string()))
        );
        assert_eq!(digit_count("9#"), Err(PictureError::UnknownSymbol('#')));
        assert_eq!(digit_count("V"), Err(PictureError::NoPositions));
        assert_eq!(digit_count("9V9("), Err(PictureError::UnbalancedParenthesis));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("9(5)", Usage::PackedDecimal), FieldType::Binary);
        assert_eq!(classify("9(5)", Usage::Binary), FieldType::Binary);
        assert_eq!(classify("9(5)", Usage::Display), FieldType::Number);
        assert_eq!(classify("S9(3)V99", Usage::Display), FieldType::Number);
        assert_eq!(classify("X(10)", Usage::Display), FieldType::String);
        assert_eq!(classify("A(3)", Usage::Display), FieldType::String);
        assert_eq!(classify("X(9)", Usage::Display), FieldType::String);
        assert_eq!(classify("X(19)", Usage::Display), FieldType::String);
    }

    #[test]
    fn test_usage_keywords() {
        assert_eq!(Usage::from_keyword("COMP"), Some(Usage::Binary));
        assert_eq!(Usage::from_keyword("comp-4"), Some(Usage::Binary));
        assert_eq!(Usage::from_keyword("BINARY"), Some(Usage::Binary));
        assert_eq!(Usage::from_keyword("COMP-3"), Some(Usage::PackedDecimal));
        assert_eq!(
            Usage::from_keyword("PACKED-DECIMAL"),
            Some(Usage::PackedDecimal)
        );
        assert_eq!(Usage::from_keyword("DISPLAY"), Some(Usage::Display));
        assert_eq!(Usage::from_keyword("COMP-1"), None);
        assert_eq!(Usage::from_keyword("PIC"), None);
    }
}
