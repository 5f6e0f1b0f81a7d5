//! Monetary amounts for cash donations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`MonetaryAmount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input is not a number.
    #[error("\"{0}\" is not a valid amount")]
    Invalid(String),
    /// Zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// More than two fractional digits.
    #[error("amount must have at most {max} decimal places")]
    TooManyDecimals {
        /// Maximum fractional digits.
        max: u32,
    },
    /// More than ten digits in total.
    #[error("amount must have at most {max} digits in total")]
    TooManyDigits {
        /// Maximum total digits.
        max: u32,
    },
}

/// A strictly positive amount of money with two fractional digits.
///
/// Matches the `NUMERIC(10, 2)` column it is stored in: at most ten digits,
/// two of them after the decimal point. The value is always kept at scale 2,
/// so `10` and `10.0` both become `10.00`.
///
/// ```
/// use doacoes_core::MonetaryAmount;
///
/// let amount = MonetaryAmount::parse("150,5").unwrap();
/// assert_eq!(amount.to_string(), "150.50");
/// assert!(MonetaryAmount::parse("0").is_err());
/// assert!(MonetaryAmount::parse("1.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    /// Fractional digits kept.
    pub const SCALE: u32 = 2;
    /// Total digits allowed.
    pub const MAX_DIGITS: u32 = 10;

    /// Validate a decimal value.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the value is not positive or does not fit
    /// in `NUMERIC(10, 2)`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(AmountError::TooManyDecimals { max: Self::SCALE });
        }

        let mut scaled = normalized;
        scaled.rescale(Self::SCALE);
        let limit = 10_i128.pow(Self::MAX_DIGITS);
        if scaled.mantissa() >= limit {
            return Err(AmountError::TooManyDigits {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(scaled))
    }

    /// Parse an amount from user input.
    ///
    /// Accepts either `.` or `,` as the decimal separator.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Invalid`] if the input is not a number, or any
    /// error from [`MonetaryAmount::new`].
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        let value: Decimal = trimmed
            .replace(',', ".")
            .parse()
            .map_err(|_| AmountError::Invalid(trimmed.to_owned()))?;
        Self::new(value)
    }

    /// The underlying decimal.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Format for display in Brazilian reais, e.g. `R$ 1.234,50`.
    #[must_use]
    pub fn format_brl(&self) -> String {
        let plain = self.0.to_string();
        let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("R$ {grouped},{cents}")
    }
}

impl std::fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MonetaryAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for MonetaryAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonetaryAmount> for Decimal {
    fn from(amount: MonetaryAmount) -> Self {
        amount.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MonetaryAmount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MonetaryAmount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(value)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MonetaryAmount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(MonetaryAmount::parse("10").unwrap().to_string(), "10.00");
        assert_eq!(MonetaryAmount::parse("0.01").unwrap().to_string(), "0.01");
        assert_eq!(MonetaryAmount::parse("99,9").unwrap().to_string(), "99.90");
        assert_eq!(
            MonetaryAmount::parse("12345678.99").unwrap().to_string(),
            "12345678.99"
        );
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(MonetaryAmount::parse("0"), Err(AmountError::NotPositive));
        assert_eq!(MonetaryAmount::parse("0.00"), Err(AmountError::NotPositive));
        assert_eq!(MonetaryAmount::parse("-5"), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            MonetaryAmount::parse("dez reais"),
            Err(AmountError::Invalid(_))
        ));
        assert!(matches!(MonetaryAmount::parse(""), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_precision_limits() {
        assert_eq!(
            MonetaryAmount::parse("1.005"),
            Err(AmountError::TooManyDecimals { max: 2 })
        );
        // trailing zeros are not significant
        assert!(MonetaryAmount::parse("1.500").is_ok());
        assert_eq!(
            MonetaryAmount::parse("123456789.00"),
            Err(AmountError::TooManyDigits { max: 10 })
        );
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(MonetaryAmount::parse("5").unwrap().format_brl(), "R$ 5,00");
        assert_eq!(
            MonetaryAmount::parse("1234.5").unwrap().format_brl(),
            "R$ 1.234,50"
        );
        assert_eq!(
            MonetaryAmount::parse("1234567.89").unwrap().format_brl(),
            "R$ 1.234.567,89"
        );
    }

    #[test]
    fn test_serde_round_trips_through_decimal() {
        let amount: MonetaryAmount = serde_json::from_str("\"25.50\"").unwrap();
        assert_eq!(amount.value(), Decimal::new(2550, 2));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"25.50\"");
        assert!(serde_json::from_str::<MonetaryAmount>("\"0\"").is_err());
    }
}
