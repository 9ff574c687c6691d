//! Monthly power-law parameters per ecological zone.
//!
//! Alpha and beta come from two separate tables keyed by EnS name, each
//! holding one value per calendar month. Gaps are filled per coefficient:
//! a missing month first takes the next later month's value, and only
//! months with nothing after them take the previous month's value.

use chrono::Datelike;
use std::collections::HashMap;
use tracing::warn;

use crate::models::Timestamp;

pub const MONTHS: usize = 12;

/// One coefficient for each calendar month, January first
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthlyValues([Option<f64>; MONTHS]);

impl MonthlyValues {
    /// NaN entries are treated as missing
    pub fn new(values: [Option<f64>; MONTHS]) -> Self {
        Self(values.map(|v| v.filter(|x| !x.is_nan())))
    }

    pub fn missing() -> Self {
        Self([None; MONTHS])
    }

    /// Value for a calendar month (1-12)
    pub fn get(&self, month: u32) -> Option<f64> {
        let slot = usize::try_from(month).ok()?.checked_sub(1)?;
        self.0.get(slot).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Fill gaps: a backward pass from December, then a forward pass
    pub fn filled(mut self) -> Self {
        for slot in (0..MONTHS - 1).rev() {
            if self.0[slot].is_none() {
                self.0[slot] = self.0[slot + 1];
            }
        }
        for slot in 1..MONTHS {
            if self.0[slot].is_none() {
                self.0[slot] = self.0[slot - 1];
            }
        }
        self
    }
}

/// Coefficients of one source table (alpha or beta) keyed by EnS name
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    rows: HashMap<String, MonthlyValues>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone; the first row for a zone wins
    pub fn insert(&mut self, ens_name: impl Into<String>, values: MonthlyValues) -> bool {
        let ens_name = ens_name.into();
        if self.rows.contains_key(&ens_name) {
            warn!("Duplicate parameter row for EnS '{}' ignored", ens_name);
            return false;
        }
        self.rows.insert(ens_name, values);
        true
    }

    pub fn get(&self, ens_name: &str) -> Option<&MonthlyValues> {
        self.rows.get(ens_name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolved (alpha, beta) for a month; either may be missing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
}

/// Filled monthly alpha and beta for one zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyParameters {
    pub alpha: MonthlyValues,
    pub beta: MonthlyValues,
}

impl MonthlyParameters {
    pub fn missing() -> Self {
        Self {
            alpha: MonthlyValues::missing(),
            beta: MonthlyValues::missing(),
        }
    }

    pub fn for_month(&self, month: u32) -> PowerLaw {
        PowerLaw {
            alpha: self.alpha.get(month),
            beta: self.beta.get(month),
        }
    }

    /// Parameters for the calendar month of a timestamp
    pub fn at(&self, timestamp: Timestamp) -> PowerLaw {
        self.for_month(timestamp.month())
    }

    /// True when no month can produce an estimate
    pub fn is_unusable(&self) -> bool {
        self.alpha.is_empty() || self.beta.is_empty()
    }
}

/// The alpha and beta source tables
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    pub alpha: ParameterTable,
    pub beta: ParameterTable,
}

impl ParameterSet {
    pub fn new(alpha: ParameterTable, beta: ParameterTable) -> Self {
        Self { alpha, beta }
    }

    /// Filled monthly parameters for a zone. Each coefficient is looked up in
    /// its own table; a zone absent from a table yields missing values.
    pub fn monthly_for(&self, ens_name: &str) -> MonthlyParameters {
        let alpha = self.alpha.get(ens_name).copied();
        let beta = self.beta.get(ens_name).copied();

        if alpha.is_none() || beta.is_none() {
            warn!(
                "No {} parameters for EnS '{}'; erosivity will be missing",
                match (alpha.is_none(), beta.is_none()) {
                    (true, true) => "alpha/beta",
                    (true, false) => "alpha",
                    _ => "beta",
                },
                ens_name
            );
        }

        MonthlyParameters {
            alpha: alpha.unwrap_or_else(MonthlyValues::missing).filled(),
            beta: beta.unwrap_or_else(MonthlyValues::missing).filled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn months(values: [Option<f64>; MONTHS]) -> MonthlyValues {
        MonthlyValues::new(values)
    }

    fn full(start: f64) -> [Option<f64>; MONTHS] {
        std::array::from_fn(|i| Some(start + i as f64))
    }

    #[test]
    fn test_missing_month_takes_later_value() {
        let mut values = full(1.0);
        values[2] = None; // March
        let filled = months(values).filled();

        assert_eq!(filled.get(3), Some(4.0));
        assert!((1..=12).all(|month| filled.get(month).is_some()));
    }

    #[test]
    fn test_missing_december_takes_november() {
        let mut values = full(1.0);
        values[11] = None;
        let filled = months(values).filled();

        assert_eq!(filled.get(12), Some(11.0));
    }

    #[test]
    fn test_backward_fill_has_priority() {
        let mut values = [None; MONTHS];
        values[0] = Some(1.0);
        values[5] = Some(6.0);
        let filled = months(values).filled();

        // Feb-May take June, July-Dec take June via the forward pass
        assert_eq!(filled.get(1), Some(1.0));
        assert_eq!(filled.get(2), Some(6.0));
        assert_eq!(filled.get(5), Some(6.0));
        assert_eq!(filled.get(7), Some(6.0));
        assert_eq!(filled.get(12), Some(6.0));
    }

    #[test]
    fn test_all_missing_stays_missing() {
        let filled = MonthlyValues::missing().filled();
        assert!(filled.is_empty());
        assert_eq!(filled.get(6), None);
    }

    #[test]
    fn test_nan_is_missing() {
        let mut values = full(1.0);
        values[0] = Some(f64::NAN);
        let filled = months(values).filled();
        assert_eq!(filled.get(1), Some(2.0));
    }

    #[test]
    fn test_month_bounds() {
        let values = months(full(1.0));
        assert_eq!(values.get(0), None);
        assert_eq!(values.get(13), None);
        assert_eq!(values.get(1), Some(1.0));
        assert_eq!(values.get(12), Some(12.0));
    }

    #[test]
    fn test_first_duplicate_row_wins() {
        let mut table = ParameterTable::new();
        assert!(table.insert("ATC3", months(full(1.0))));
        assert!(!table.insert("ATC3", months(full(100.0))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("ATC3").unwrap().get(1), Some(1.0));
    }

    #[test]
    fn test_parameter_set_lookup_by_timestamp() {
        let mut alpha = ParameterTable::new();
        alpha.insert("MDN1", months(full(0.1)));
        let mut beta = ParameterTable::new();
        beta.insert("MDN1", months(full(1.0)));
        let set = ParameterSet::new(alpha, beta);

        let params = set.monthly_for("MDN1");
        let august = NaiveDate::from_ymd_opt(2012, 8, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let law = params.at(august);
        assert!((law.alpha.unwrap() - 7.1).abs() < 1e-12);
        assert_eq!(law.beta, Some(8.0));
    }

    #[test]
    fn test_unknown_zone_is_unusable() {
        let set = ParameterSet::default();
        let params = set.monthly_for("XXX9");
        assert!(params.is_unusable());
        assert_eq!(params.for_month(4), PowerLaw { alpha: None, beta: None });
    }

    #[test]
    fn test_zone_missing_from_one_table() {
        let mut alpha = ParameterTable::new();
        alpha.insert("ALS1", months(full(1.0)));
        let set = ParameterSet::new(alpha, ParameterTable::new());

        let params = set.monthly_for("ALS1");
        assert!(params.is_unusable());
        assert_eq!(params.for_month(2).alpha, Some(2.0));
        assert_eq!(params.for_month(2).beta, None);
    }
}
