use std::fmt;

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount in the **minor units** of its currency.
///
/// The value is signed:
/// - positive = inflow / receivable
/// - negative = outflow / payable
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34, Currency::Myr);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34 MYR");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more decimals than the currency has):
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10", Currency::Myr).unwrap().minor(), 1000);
/// assert_eq!(Money::parse("10,5", Currency::Myr).unwrap().minor(), 1050);
/// assert!(Money::parse("12.345", Currency::Myr).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Parses a decimal string into minor units of `currency`.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = input.trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim().replace(',', ".");
        if rest.is_empty() {
            return Err(empty());
        }

        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(invalid());
        }
        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = usize::from(currency.minor_units());
        if frac_str.len() > digits {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }

        let scale = 10i64.pow(u32::from(currency.minor_units()));
        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{frac_str:0<digits$}");
            padded.parse().map_err(|_| invalid())?
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Self::new(if negative { -total } else { total }, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let digits = u32::from(self.currency.minor_units());
        let scale = 10u64.pow(digits);
        let abs = self.minor.unsigned_abs();
        if digits == 0 {
            return write!(f, "{sign}{abs} {}", self.currency);
        }
        let width = digits as usize;
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / scale,
            abs % scale,
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_with_code() {
        assert_eq!(Money::new(0, Currency::Myr).to_string(), "0.00 MYR");
        assert_eq!(Money::new(1, Currency::Myr).to_string(), "0.01 MYR");
        assert_eq!(Money::new(10, Currency::Eur).to_string(), "0.10 EUR");
        assert_eq!(Money::new(100_000, Currency::Myr).to_string(), "1000.00 MYR");
        assert_eq!(Money::new(-1050, Currency::Sgd).to_string(), "-10.50 SGD");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        let myr = Currency::Myr;
        assert_eq!(Money::parse("10", myr).unwrap().minor(), 1000);
        assert_eq!(Money::parse("10.5", myr).unwrap().minor(), 1050);
        assert_eq!(Money::parse("10,50", myr).unwrap().minor(), 1050);
        assert_eq!(Money::parse("-0.01", myr).unwrap().minor(), -1);
        assert_eq!(Money::parse("+1.00", myr).unwrap().minor(), 100);
        assert_eq!(Money::parse("  2.30 ", myr).unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_garbage() {
        let myr = Currency::Myr;
        assert!(Money::parse("12.345", myr).is_err());
        assert!(Money::parse("", myr).is_err());
        assert!(Money::parse("1.2.3", myr).is_err());
        assert!(Money::parse("abc", myr).is_err());
        assert!(Money::parse("99999999999999999999", myr).is_err());
    }
}
