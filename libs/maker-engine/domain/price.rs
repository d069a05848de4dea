//! Price grid and wire-format conversion
//!
//! Binary-outcome tokens trade on a fixed grid of whole cents. Every price
//! inside the engine is an integer index into that grid; conversion from the
//! exchange's decimal strings happens once at the edge.

use thiserror::Error;

/// Integer price in cents.
pub type Cents = i32;

/// Value of one UP share plus one DOWN share at resolution.
pub const PAYOUT_CENTS: Cents = 100;

/// Number of slots in a book side (indices 0..=100).
pub const GRID_SIZE: usize = 101;

/// Lowest quotable price.
pub const MIN_PRICE_CENTS: Cents = 1;

/// Highest quotable price.
pub const MAX_PRICE_CENTS: Cents = 99;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PriceError {
    #[error("empty price")]
    Empty,

    #[error("malformed price '{0}'")]
    Malformed(String),

    #[error("price '{0}' has sub-cent precision")]
    SubCent(String),

    #[error("price '{0}' outside the grid")]
    OutOfRange(String),

    #[error("malformed size '{0}'")]
    MalformedSize(String),
}

/// Parse a decimal price string (e.g. `"0.47"`) into cents.
///
/// At most two fractional digits are accepted. Longer fractions, even
/// `"0.470"`, are rejected instead of being truncated.
pub fn parse_price_cents(raw: &str) -> Result<Cents, PriceError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(PriceError::Empty);
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(PriceError::Malformed(raw.to_string()));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(PriceError::Malformed(raw.to_string()));
    }
    if frac_part.len() > 2 {
        return Err(PriceError::SubCent(raw.to_string()));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| PriceError::Malformed(raw.to_string()))?
    };

    let mut frac = 0i64;
    for (i, b) in frac_part.bytes().enumerate() {
        let digit = (b - b'0') as i64;
        frac += if i == 0 { digit * 10 } else { digit };
    }

    let cents = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| PriceError::OutOfRange(raw.to_string()))?;

    if cents < 0 || cents > PAYOUT_CENTS as i64 {
        return Err(PriceError::OutOfRange(raw.to_string()));
    }
    Ok(cents as Cents)
}

/// Parse a decimal size string. Negative and non-finite sizes are rejected.
pub fn parse_size(raw: &str) -> Result<f64, PriceError> {
    let size: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PriceError::MalformedSize(raw.to_string()))?;
    if !size.is_finite() || size < 0.0 {
        return Err(PriceError::MalformedSize(raw.to_string()));
    }
    Ok(size)
}

/// Clamp a price into the quotable range `[1, 99]`.
#[inline]
pub fn clamp_quotable(price: Cents) -> Cents {
    price.clamp(MIN_PRICE_CENTS, MAX_PRICE_CENTS)
}

/// Render cents as the exchange's decimal representation.
pub fn cents_to_decimal(price: Cents) -> String {
    format!("{}.{:02}", price / 100, price % 100)
}
