//! Financial terms of a request and the derived total.

use serde::{Deserialize, Deserializer, Serialize};

/// Unit value, number of allowances and the derived total.
///
/// `total` always equals `unit_value * quantity` once any of the builder
/// methods below has run. No rounding happens here; two decimals are applied
/// only when the value is displayed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Finance {
    pub unit_value: f64,
    pub quantity: f64,
    /// Overflowing products serialize as `null`; they read back as `0` and
    /// are recomputed on load.
    #[serde(deserialize_with = "stored_total")]
    pub total: f64,
}

impl Default for Finance {
    fn default() -> Self {
        Self {
            unit_value: 0.0,
            quantity: 1.0,
            total: 0.0,
        }
    }
}

impl Finance {
    pub fn with_unit_value(mut self, unit_value: f64) -> Self {
        self.unit_value = unit_value;
        self.recomputed()
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self.recomputed()
    }

    pub fn recomputed(mut self) -> Self {
        self.total = self.unit_value * self.quantity;
        self
    }

    /// Apply whichever factors the update carries, unit value first.
    pub fn apply(self, update: FinanceUpdate) -> Self {
        let mut finance = self;
        if let Some(unit_value) = update.unit_value {
            finance = finance.with_unit_value(unit_value);
        }
        if let Some(quantity) = update.quantity {
            finance = finance.with_quantity(quantity);
        }
        finance.recomputed()
    }
}

/// Request body for editing the financial factors.
///
/// Values are taken straight from form inputs, so numbers may arrive as
/// strings. Anything that is not a finite number is coerced to `0`.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinanceUpdate {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: Option<f64>,
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => parse_leading_number(&s),
        _ => 0.0,
    };
    Ok(Some(if amount.is_finite() { amount } else { 0.0 }))
}

fn stored_total<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let total = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(if total.is_finite() { total } else { 0.0 })
}

/// Parse the longest numeric prefix of `input`, `0` when there is none.
///
/// Form inputs like `"12,50"` or `"3 dias"` keep their leading number.
pub fn parse_leading_number(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}
