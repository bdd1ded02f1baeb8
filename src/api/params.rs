//! Query-string helpers shared by the report handlers.
//!
//! List parameters accept both repeated keys (`?ids=1&ids=2`) and
//! comma-separated values (`?ids=1,2`). Unparseable values are a
//! `BadRequest`; values outside the accepted range are a `Validation` error.

use std::str::FromStr;

use chrono::{Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::errors::CostIntelError;

#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    fn raw(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, value)| key == name && !value.trim().is_empty())
            .map(|(_, value)| value.trim())
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .flat_map(|(_, value)| value.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn ids(&self, name: &str) -> Result<Vec<i64>, CostIntelError> {
        self.list(name)
            .iter()
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    CostIntelError::BadRequest(format!("{} must be a list of integers, got '{}'", name, v))
                })
            })
            .collect()
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, CostIntelError> {
        self.raw(name)
            .map(|v| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| {
                    CostIntelError::BadRequest(format!("{} must be a date (YYYY-MM-DD), got '{}'", name, v))
                })
            })
            .transpose()
    }

    pub fn required_date(&self, name: &str) -> Result<NaiveDate, CostIntelError> {
        self.date(name)?
            .ok_or_else(|| CostIntelError::BadRequest(format!("{} is required", name)))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, CostIntelError> {
        match self.raw(name) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(CostIntelError::BadRequest(format!("{} must be a boolean, got '{}'", name, v))),
            },
        }
    }

    pub fn int_in(&self, name: &str, default: i64, min: i64, max: i64) -> Result<i64, CostIntelError> {
        Ok(self.optional_int_in(name, min, max)?.unwrap_or(default))
    }

    pub fn optional_int_in(&self, name: &str, min: i64, max: i64) -> Result<Option<i64>, CostIntelError> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        let value: i64 = raw
            .parse()
            .map_err(|_| CostIntelError::BadRequest(format!("{} must be an integer, got '{}'", name, raw)))?;
        if !(min..=max).contains(&value) {
            return Err(CostIntelError::validation(format!(
                "{} must be between {} and {}",
                name, min, max
            )));
        }
        Ok(Some(value))
    }

    pub fn float_in(&self, name: &str, default: f64, min: f64, max: f64) -> Result<f64, CostIntelError> {
        let Some(raw) = self.raw(name) else {
            return Ok(default);
        };
        let value: f64 = raw
            .parse()
            .map_err(|_| CostIntelError::BadRequest(format!("{} must be a number, got '{}'", name, raw)))?;
        if !value.is_finite() || value < min || value > max {
            return Err(CostIntelError::validation(format!(
                "{} must be between {} and {}",
                name, min, max
            )));
        }
        Ok(value)
    }

    /// Exact decimal parameter for money and percentages. `max: None` leaves
    /// the range open above.
    pub fn decimal_in(
        &self,
        name: &str,
        default: Decimal,
        min: Decimal,
        max: Option<Decimal>,
    ) -> Result<Decimal, CostIntelError> {
        let Some(raw) = self.raw(name) else {
            return Ok(default);
        };
        let value = Decimal::from_str(raw)
            .map_err(|_| CostIntelError::BadRequest(format!("{} must be a number, got '{}'", name, raw)))?;
        let message = match max {
            Some(max) if value < min || value > max => format!("{} must be between {} and {}", name, min, max),
            None if value < min => format!("{} must be >= {}", name, min),
            _ => return Ok(value),
        };
        Err(CostIntelError::validation(message))
    }
}

/// Reporting window ending at `end` and covering `lookback_months`:
/// `end - lookback months + 1 day ..= end`.
pub fn lookback_period(end: NaiveDate, lookback_months: u32) -> Result<(NaiveDate, NaiveDate), CostIntelError> {
    end.checked_sub_months(Months::new(lookback_months))
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|start| (start, end))
        .ok_or_else(|| CostIntelError::BadRequest("end_date is out of range".into()))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
