//! ISBN normalization and conversion.

/// Strip hyphens and whitespace from an ISBN string.
pub fn clean_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Convert an ISBN-13 to its ISBN-10 form.
///
/// Only `978`-prefixed ISBN-13 values have an ISBN-10 equivalent; `979`
/// ISBNs and malformed input yield `None`. Check digit weights run 10 down
/// to 2 over the middle nine digits; a check value of 10 renders as `X`.
pub fn isbn13_to_isbn10(isbn13: &str) -> Option<String> {
    let cleaned = clean_isbn(isbn13);
    if cleaned.len() != 13 || !cleaned.starts_with("978") {
        return None;
    }

    let middle = &cleaned[3..12];
    let mut sum: u32 = 0;
    for (i, c) in middle.chars().enumerate() {
        let digit = c.to_digit(10)?;
        sum += (10 - i as u32) * digit;
    }
    let check = (11 - (sum % 11)) % 11;
    let check_char = if check == 10 {
        'X'
    } else {
        char::from_digit(check, 10)?
    };

    let mut isbn10 = String::with_capacity(10);
    isbn10.push_str(middle);
    isbn10.push(check_char);
    Some(isbn10)
}

/// Validate an ISBN-10 check digit. Used only to verify conversions.
pub fn isbn10_check_digit_valid(isbn10: &str) -> bool {
    let cleaned = clean_isbn(isbn10);
    if cleaned.len() != 10 {
        return false;
    }
    let mut sum: u32 = 0;
    for (i, c) in cleaned.chars().enumerate() {
        let value = match c {
            'X' if i == 9 => 10,
            c => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += (10 - i as u32) * value;
    }
    sum % 11 == 0
}

/// Pull a four-digit year out of a catalog `publishedDate` value, which may
/// be `YYYY`, `YYYY-MM`, or `YYYY-MM-DD`.
pub fn extract_year(published_date: &str) -> Option<i32> {
    let head: String = published_date.chars().take(4).collect();
    if head.len() == 4 && head.chars().all(|c| c.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}
