//! COBOL identifier to snake_case conversion.

/// Convert a COBOL identifier to lowercase words joined by underscores.
///
/// Words break at hyphens and other separators, between letters and digits,
/// and at lower-to-upper case changes: `CUST-LINE2` becomes `cust_line_2`.
pub fn snake_case(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_ascii_alphabetic() && ch.is_ascii_digit())
                || (prev.is_ascii_digit() && ch.is_ascii_alphabetic())
                || (prev.is_ascii_lowercase() && ch.is_ascii_uppercase())
                || (prev.is_ascii_uppercase()
                    && ch.is_ascii_uppercase()
                    && next.is_some_and(|n| n.is_ascii_lowercase()));
            if boundary && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(ch.to_ascii_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenated_names() {
        assert_eq!(snake_case("CUSTOMER-RECORD"), "customer_record");
        assert_eq!(snake_case("CUST-OPEN-DATE-R"), "cust_open_date_r");
        assert_eq!(snake_case("FILLER"), "filler");
    }

    #[test]
    fn test_digits_split_words() {
        assert_eq!(snake_case("ADDR-LINE2"), "addr_line_2");
        assert_eq!(snake_case("WS-2ND-ADDR"), "ws_2_nd_addr");
        assert_eq!(snake_case("A1B"), "a_1_b");
    }

    #[test]
    fn test_mixed_case() {
        assert_eq!(snake_case("custName"), "cust_name");
        assert_eq!(snake_case("XMLRecord"), "xml_record");
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(snake_case("--A--B--"), "a_b");
        assert_eq!(snake_case(""), "");
    }
}
