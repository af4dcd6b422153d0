//! Money formatting
//!
//! Prices travel as integer minor units and stay that way through the domain;
//! formatting happens only at the display edge.

/// Render an amount of minor units as `1 234.56`.
#[must_use]
pub fn format_minor(amount: u64) -> String {
    let major = amount / 100;
    let cents = amount % 100;

    let mut reversed = String::new();
    for (i, digit) in major.to_string().chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            reversed.push(' ');
        }
        reversed.push(digit);
    }

    let grouped: String = reversed.chars().rev().collect();

    format!("{grouped}.{cents:02}")
}
