use anyhow::{Result, anyhow, bail};

pub const MAX_ROMAN: u32 = 3999;

const NUMERALS: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Convert a number in `1..=3999` to standard subtractive notation
pub fn to_roman(value: u32) -> Result<String> {
    if value == 0 || value > MAX_ROMAN {
        bail!("Number out of Roman numeral range: {}", value);
    }

    let mut remaining = value;
    let mut result = String::new();
    for (amount, numeral) in NUMERALS {
        while remaining >= amount {
            result.push_str(numeral);
            remaining -= amount;
        }
    }
    Ok(result)
}

fn digit_value(ch: char) -> Option<u32> {
    match ch {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Parse a Roman numeral (case-insensitive). Only the canonical spelling of a
/// number is accepted, so "IIII" or "IC" fail instead of yielding a number.
pub fn from_roman(roman: &str) -> Result<u32> {
    let upper = roman.trim().to_uppercase();
    if upper.is_empty() {
        bail!("Empty Roman numeral");
    }

    let digits = upper
        .chars()
        .map(|ch| digit_value(ch).ok_or_else(|| anyhow!("Invalid Roman numeral character: {}", ch)))
        .collect::<Result<Vec<u32>>>()?;

    let mut total: u32 = 0;
    for (i, &current) in digits.iter().enumerate() {
        match digits.get(i + 1) {
            Some(&next) if current < next => total = total.saturating_sub(current),
            _ => total = total.saturating_add(current),
        }
    }

    if total == 0 || total > MAX_ROMAN || to_roman(total)? != upper {
        bail!("Malformed Roman numeral: {}", roman);
    }
    Ok(total)
}
