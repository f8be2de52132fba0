use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::model::SalesData;
use crate::schema::order;

// ── Filter configuration ────────────────────────────────────────────────────

/// Current value of every filter control. The widget layer owns the
/// controls; this is the snapshot it hands over on each interaction.
/// An empty selection means "no restriction" for that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Inclusive calendar-day range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub platforms: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub products: Vec<String>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.platforms.is_empty()
            && self.states.is_empty()
            && self.cities.is_empty()
            && self.products.is_empty()
    }
}

/// The values the UI populates its filter controls from: sorted distinct
/// entries per dimension plus the dataset's date span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub platforms: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub products: Vec<String>,
}

impl FilterOptions {
    pub fn from_data(data: &SalesData) -> Result<Self, DashboardError> {
        Ok(Self {
            date_range: data.date_range()?,
            platforms: data.unique_values(order::PLATFORM)?,
            states: data.unique_values(order::STATE)?,
            cities: data.unique_values(order::CITY)?,
            products: data.unique_values(order::PRODUCT)?,
        })
    }
}

// ── Application ─────────────────────────────────────────────────────────────

/// Apply a filter configuration, producing the working view for one
/// recomputation. Predicates are a conjunction; the source frame is never
/// mutated. An empty result is a valid view, not an error.
pub fn apply(data: &SalesData, config: &FilterConfig) -> Result<DataFrame, DashboardError> {
    let mut lazy = data.frame().clone().lazy();

    if let Some((start, end)) = config.date_range {
        // Inclusive end: compare against midnight of the following day so
        // any time-of-day component in the data stays in range.
        let end_next = end.checked_add_days(chrono::Days::new(1)).ok_or_else(|| {
            DashboardError::Validation(format!("date {end} out of range"))
        })?;
        lazy = lazy.filter(
            col(order::DATE)
                .gt_eq(lit(midnight_us(start)))
                .and(col(order::DATE).lt(lit(midnight_us(end_next)))),
        );
    }

    for (column, selected) in [
        (order::PLATFORM, &config.platforms),
        (order::STATE, &config.states),
        (order::CITY, &config.cities),
        (order::PRODUCT, &config.products),
    ] {
        if selected.is_empty() {
            continue;
        }
        let values = Series::new(column.into(), selected.as_slice());
        lazy = lazy.filter(col(column).is_in(lit(values), false));
    }

    let view = lazy.collect()?;
    tracing::debug!("filter kept {} of {} rows", view.height(), data.height());
    Ok(view)
}

fn midnight_us(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_micros()
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::order;

    fn sample_data() -> SalesData {
        let df = DataFrame::new(vec![
            Column::new(order::ORDER_ID.into(), &["O1", "O2", "O3", "O4"]),
            Column::new(
                order::DATE.into(),
                &["2024-06-01", "2024-06-02", "2024-06-03", "2024-06-04"],
            ),
            Column::new(order::PLATFORM.into(), &["Myntra", "Ajio", "Myntra", "Flipkart"]),
            Column::new(
                order::STATE.into(),
                &["Karnataka", "Maharashtra", "Karnataka", "Delhi"],
            ),
            Column::new(
                order::CITY.into(),
                &["Bengaluru", "Mumbai", "Mysuru", "New Delhi"],
            ),
            Column::new(order::PRODUCT.into(), &["Kurta", "Saree", "Kurta", "Lehenga"]),
            Column::new(order::QUANTITY.into(), &[2i64, 1, 1, 3]),
            Column::new(order::REVENUE.into(), &[100.0f64, 250.0, 120.0, 900.0]),
            Column::new(order::PROFIT.into(), &[30.0f64, 80.0, 35.0, 200.0]),
            Column::new(order::CUSTOMER_ID.into(), &["C1", "C2", "C1", "C3"]),
            Column::new(order::PAYMENT_METHOD.into(), &["UPI", "COD", "UPI", "Card"]),
            Column::new(
                order::STATUS.into(),
                &["Completed", "Completed", "Cancelled", "Completed"],
            ),
        ])
        .unwrap();
        SalesData::from_frame(df).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_config_is_identity() {
        let data = sample_data();
        let view = apply(&data, &FilterConfig::default()).unwrap();
        assert_eq!(view.height(), data.height());
    }

    #[test]
    fn date_range_is_inclusive() {
        let data = sample_data();
        let config = FilterConfig {
            date_range: Some((date(2024, 6, 2), date(2024, 6, 3))),
            ..Default::default()
        };
        let view = apply(&data, &config).unwrap();
        let ids = view.column(order::ORDER_ID).unwrap().str().unwrap();
        let got: Vec<&str> = ids.into_iter().flatten().collect();
        assert_eq!(got, ["O2", "O3"]);
    }

    #[test]
    fn date_range_survives_nanosecond_dates() {
        let data = sample_data();
        let ns = data
            .frame()
            .clone()
            .lazy()
            .with_columns([
                col(order::DATE).cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
            ])
            .collect()
            .unwrap();
        let data = SalesData::from_frame(ns).unwrap();

        let config = FilterConfig {
            date_range: Some((date(2024, 6, 1), date(2024, 6, 2))),
            ..Default::default()
        };
        let view = apply(&data, &config).unwrap();
        let ids = view.column(order::ORDER_ID).unwrap().str().unwrap();
        let got: Vec<&str> = ids.into_iter().flatten().collect();
        assert_eq!(got, ["O1", "O2"]);
    }

    #[test]
    fn reversed_date_range_selects_nothing() {
        let data = sample_data();
        let config = FilterConfig {
            date_range: Some((date(2024, 6, 4), date(2024, 6, 1))),
            ..Default::default()
        };
        let view = apply(&data, &config).unwrap();
        assert_eq!(view.height(), 0);
    }

    #[test]
    fn dimensions_conjoin() {
        let data = sample_data();
        let config = FilterConfig {
            date_range: Some((date(2024, 6, 1), date(2024, 6, 3))),
            platforms: vec!["Myntra".to_string()],
            products: vec!["Kurta".to_string()],
            ..Default::default()
        };
        let view = apply(&data, &config).unwrap();
        let ids = view.column(order::ORDER_ID).unwrap().str().unwrap();
        let got: Vec<&str> = ids.into_iter().flatten().collect();
        assert_eq!(got, ["O1", "O3"]);
    }

    #[test]
    fn unknown_selection_selects_nothing() {
        let data = sample_data();
        let config = FilterConfig {
            cities: vec!["Atlantis".to_string()],
            ..Default::default()
        };
        let view = apply(&data, &config).unwrap();
        assert_eq!(view.height(), 0);
    }

    #[test]
    fn options_list_sorted_uniques() {
        let data = sample_data();
        let options = FilterOptions::from_data(&data).unwrap();
        assert_eq!(options.platforms, ["Ajio", "Flipkart", "Myntra"]);
        assert_eq!(options.products, ["Kurta", "Lehenga", "Saree"]);
        assert_eq!(
            options.date_range,
            Some((date(2024, 6, 1), date(2024, 6, 4)))
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: FilterConfig =
            serde_json::from_str(r#"{"platforms": ["Myntra"]}"#).unwrap();
        assert_eq!(config.platforms, ["Myntra"]);
        assert!(config.date_range.is_none());
        assert!(config.cities.is_empty());
        assert!(!config.is_empty());
        assert!(FilterConfig::default().is_empty());
    }
}
