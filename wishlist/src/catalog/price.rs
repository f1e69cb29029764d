//! Price text parsing and currency conversion for display

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ExchangeRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Aud,
    Gbp,
    Eur,
    Cny,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Aud => "AUD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Cny => "CNY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A currency code outside the supported set
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "AUD" => Ok(Currency::Aud),
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "CNY" => Ok(Currency::Cny),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// A parsed price in minor units (cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Price {
    pub amount: i64,
    pub currency: Currency,
}

/// Recognised prefixes; longer ones first so "AU$" wins over "$"
const PREFIXES: [(&str, Currency); 4] = [
    ("AU$", Currency::Aud),
    ("$", Currency::Usd),
    ("£", Currency::Gbp),
    ("€", Currency::Eur),
];

/// Parses price text such as `"$64"`, `"AU$140"` or `"£1,299.50"`.
///
/// Returns `None` for unknown prefixes or anything that is not a plain amount.
pub fn parse_price(text: &str) -> Option<Price> {
    let text = text.trim();
    let (rest, currency) = PREFIXES
        .iter()
        .find_map(|(prefix, currency)| text.strip_prefix(prefix).map(|rest| (rest, *currency)))?;

    parse_amount(rest.trim()).map(|amount| Price { amount, currency })
}

fn parse_amount(text: &str) -> Option<i64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };

    if whole.is_empty() || whole.starts_with(',') || whole.ends_with(',') {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return None;
    }
    let whole: i64 = whole.replace(',', "").parse().ok()?;

    let cents = match fraction {
        None => 0,
        Some(f) if (1..=2).contains(&f.len()) && f.chars().all(|c| c.is_ascii_digit()) => {
            let value: i64 = f.parse().ok()?;
            if f.len() == 1 { value * 10 } else { value }
        }
        Some(_) => return None,
    };

    whole.checked_mul(100)?.checked_add(cents)
}

/// Conversion rates, compiled-in defaults overlaid with stored overrides
#[derive(Debug, Clone)]
pub struct ExchangeTable {
    rates: HashMap<(Currency, Currency), f64>,
}

impl Default for ExchangeTable {
    fn default() -> Self {
        let rates = HashMap::from([
            ((Currency::Usd, Currency::Cny), 7.2),
            ((Currency::Aud, Currency::Cny), 4.7),
            ((Currency::Gbp, Currency::Cny), 9.1),
            ((Currency::Eur, Currency::Cny), 7.8),
        ]);
        Self { rates }
    }
}

impl ExchangeTable {
    /// Applies stored rates on top of the defaults; rows naming unknown
    /// currencies or non-positive rates are ignored.
    pub fn with_overrides(rows: &[ExchangeRate]) -> Self {
        let mut table = Self::default();
        for row in rows {
            match (
                row.from_currency.parse::<Currency>(),
                row.to_currency.parse::<Currency>(),
            ) {
                (Ok(from), Ok(to)) if row.rate.is_finite() && row.rate > 0.0 => {
                    table.rates.insert((from, to), row.rate);
                }
                (Err(e), _) | (_, Err(e)) => tracing::warn!(
                    "Ignoring exchange rate {}->{}: {e}",
                    row.from_currency,
                    row.to_currency
                ),
                _ => tracing::warn!(
                    "Ignoring exchange rate {}->{} ({})",
                    row.from_currency,
                    row.to_currency,
                    row.rate
                ),
            }
        }
        table
    }

    pub fn rate(&self, from: Currency, to: Currency) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        self.rates.get(&(from, to)).copied()
    }

    /// Converts to `to`, rounding to the nearest minor unit
    pub fn convert(&self, price: Price, to: Currency) -> Option<Price> {
        let rate = self.rate(price.currency, to)?;
        Some(Price {
            amount: (price.amount as f64 * rate).round() as i64,
            currency: to,
        })
    }

    /// Flat `"FROM->TO": rate` view for the public API
    pub fn as_map(&self) -> HashMap<String, f64> {
        self.rates
            .iter()
            .map(|((from, to), rate)| (format!("{from}->{to}"), *rate))
            .collect()
    }
}

/// Renders the approximate CNY value of a price, e.g. `"≈ ¥461"`
pub fn format_cny_approx(price_text: &str, table: &ExchangeTable) -> Option<String> {
    let price = parse_price(price_text)?;
    let converted = table.convert(price, Currency::Cny)?;
    let yuan = (converted.amount as f64 / 100.0).round() as i64;
    Some(format!("≈ ¥{yuan}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_price_known_prefixes() {
        assert_eq!(
            parse_price("$64"),
            Some(Price {
                amount: 6400,
                currency: Currency::Usd
            })
        );
        assert_eq!(
            parse_price("AU$140"),
            Some(Price {
                amount: 14000,
                currency: Currency::Aud
            })
        );
        assert_eq!(
            parse_price("£1,299.5"),
            Some(Price {
                amount: 129950,
                currency: Currency::Gbp
            })
        );
        assert_eq!(
            parse_price(" €19.99 "),
            Some(Price {
                amount: 1999,
                currency: Currency::Eur
            })
        );
    }

    #[test]
    fn test_parse_price_rejects_unknown_or_malformed() {
        assert_eq!(parse_price("¥500"), None);
        assert_eq!(parse_price("64"), None);
        assert_eq!(parse_price("$"), None);
        assert_eq!(parse_price("$abc"), None);
        assert_eq!(parse_price("$1.999"), None);
        assert_eq!(parse_price("$,100"), None);
        assert_eq!(parse_price("$99999999999999999999"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_currency_codes_parse_case_insensitively() {
        assert_eq!("aud".parse::<Currency>(), Ok(Currency::Aud));
        assert_eq!("CNY".parse::<Currency>(), Ok(Currency::Cny));

        let err = "JPY".parse::<Currency>().unwrap_err();
        assert_eq!(err, UnknownCurrency("JPY".to_string()));
        assert_eq!(err.to_string(), "Unknown currency code: JPY");
    }

    #[test]
    fn test_convert_with_defaults() {
        let table = ExchangeTable::default();
        let price = parse_price("$64").unwrap();
        let cny = table.convert(price, Currency::Cny).unwrap();
        assert_eq!(cny.currency, Currency::Cny);
        assert_eq!(cny.amount, 46080);
        assert_eq!(table.convert(price, Currency::Usd), Some(price));
        // No rate between two foreign currencies
        assert_eq!(table.convert(price, Currency::Eur), None);
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let rows = vec![
            ExchangeRate {
                from_currency: "USD".to_string(),
                to_currency: "CNY".to_string(),
                rate: 7.0,
                updated_at: Utc::now(),
            },
            ExchangeRate {
                from_currency: "XYZ".to_string(),
                to_currency: "CNY".to_string(),
                rate: 2.0,
                updated_at: Utc::now(),
            },
            ExchangeRate {
                from_currency: "AUD".to_string(),
                to_currency: "CNY".to_string(),
                rate: -1.0,
                updated_at: Utc::now(),
            },
        ];
        let table = ExchangeTable::with_overrides(&rows);
        assert_eq!(table.rate(Currency::Usd, Currency::Cny), Some(7.0));
        assert_eq!(table.rate(Currency::Aud, Currency::Cny), Some(4.7));
    }

    #[test]
    fn test_format_cny_approx() {
        let table = ExchangeTable::default();
        assert_eq!(format_cny_approx("$64", &table).as_deref(), Some("≈ ¥461"));
        assert_eq!(format_cny_approx("¥500", &table), None);
        assert_eq!(format_cny_approx("ask me", &table), None);
    }
}
