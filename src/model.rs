use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use polars::datatypes::{AnyValue, TimeUnit};
use polars::prelude::StrptimeOptions;
use polars::prelude::*;

use crate::error::DashboardError;
use crate::schema::{order, status};

/// Source files carry calendar dates only.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Order status ────────────────────────────────────────────────────────────

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Completed,
    Cancelled,
    Returned,
}

impl OrderStatus {
    /// Parse a status label, case-insensitive. Accepts the spelling
    /// variants that show up in real marketplace exports ("Delivered",
    /// "Canceled", "Return", ...). Unknown labels are invalid data.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "delivered" => Some(Self::Completed),
            "cancelled" | "canceled" | "cancel" => Some(Self::Cancelled),
            "returned" | "return" => Some(Self::Returned),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => status::COMPLETED,
            Self::Cancelled => status::CANCELLED,
            Self::Returned => status::RETURNED,
        }
    }

    pub fn is_cancelled_or_returned(self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }
}

// ── Order record ────────────────────────────────────────────────────────────

/// One sales order row, fully typed. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub date: NaiveDate,
    pub platform: String,
    pub state: String,
    pub city: String,
    pub product: String,
    pub sku: Option<String>,
    pub quantity: i64,
    pub revenue: f64,
    pub profit: f64,
    pub customer_id: String,
    pub payment_method: String,
    pub status: OrderStatus,
}

// ── Loaded dataset ──────────────────────────────────────────────────────────

/// The loaded, validated dataset. Read-only for the session; every
/// downstream stage is a pure function of this frame plus a filter
/// configuration.
#[derive(Debug)]
pub struct SalesData {
    frame: DataFrame,
}

impl SalesData {
    /// Load a sales CSV from disk.
    ///
    /// All columns are read as strings, then coerced once: `date` to
    /// Datetime (µs), `revenue`/`profit` to Float64, `quantity` to Int64.
    /// Columns beyond the required set are preserved as strings. A row
    /// that fails coercion, or an unknown status label, is a load-time
    /// error naming the offending column.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let raw = Self::read_csv_as_strings(path)?;
        let data = Self::from_frame(raw)?;
        tracing::info!("loaded {} orders from {}", data.height(), path.display());
        Ok(data)
    }

    /// Validate and coerce an already-materialized frame. Accepts either
    /// string columns (coerced as in `load_csv`) or already-typed ones.
    pub fn from_frame(df: DataFrame) -> Result<Self, DashboardError> {
        let frame = Self::coerce_and_validate(df)?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Earliest and latest order date, `None` on an empty dataset. The UI
    /// seeds its date pickers from this.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, DashboardError> {
        let dates = self.frame.column(order::DATE)?.as_materialized_series();
        let mut min_us: Option<i64> = None;
        let mut max_us: Option<i64> = None;
        for i in 0..self.frame.height() {
            if let Ok(AnyValue::Datetime(us, _, _)) = dates.get(i) {
                min_us = Some(min_us.map_or(us, |m| m.min(us)));
                max_us = Some(max_us.map_or(us, |m| m.max(us)));
            }
        }
        match (min_us, max_us) {
            (Some(lo), Some(hi)) => Ok(Some((date_from_us(lo)?, date_from_us(hi)?))),
            _ => Ok(None),
        }
    }

    /// Sorted distinct values of a string column.
    pub fn unique_values(&self, column: &str) -> Result<Vec<String>, DashboardError> {
        let values = self.frame.column(column)?.str()?;
        let set: BTreeSet<&str> = values.into_iter().flatten().collect();
        Ok(set.into_iter().map(|s| s.to_string()).collect())
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl SalesData {
    /// Read a CSV file with all columns as String dtype.
    /// Trims whitespace from column names.
    fn read_csv_as_strings(path: &Path) -> Result<DataFrame, DashboardError> {
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // all columns as String
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let trimmed: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        df.set_column_names(trimmed.as_slice())?;

        Ok(df)
    }

    fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), DashboardError> {
        for &col_name in required {
            if df.column(col_name).is_err() {
                return Err(DashboardError::MissingColumn(col_name.to_string()));
            }
        }
        Ok(())
    }

    fn coerce_and_validate(df: DataFrame) -> Result<DataFrame, DashboardError> {
        Self::require_columns(&df, &order::REQUIRED)?;

        let df = Self::parse_date_column(df, order::DATE)?;
        if df.column(order::DATE)?.dtype() != &DataType::Datetime(TimeUnit::Microseconds, None) {
            return Err(DashboardError::InvalidData(format!(
                "column '{}' must contain {} dates",
                order::DATE,
                DATE_FORMAT
            )));
        }

        // Numeric coercion. String values are stripped first; anything that
        // does not parse becomes null and is caught by the check below.
        let mut casts: Vec<Expr> = Vec::new();
        for (name, dtype) in [
            (order::REVENUE, DataType::Float64),
            (order::PROFIT, DataType::Float64),
            (order::QUANTITY, DataType::Int64),
        ] {
            let expr = if df.column(name)?.dtype() == &DataType::String {
                col(name).str().strip_chars(lit(" \t\r\n")).cast(dtype)
            } else {
                col(name).cast(dtype)
            };
            casts.push(expr);
        }
        let df = df.lazy().with_columns(casts).collect()?;

        for name in order::REQUIRED {
            let null_count = df.column(name)?.null_count();
            if null_count > 0 {
                return Err(DashboardError::InvalidData(format!(
                    "column '{name}' has {null_count} null or unparseable values"
                )));
            }
        }

        let statuses = df.column(order::STATUS)?.str()?;
        for label in statuses.into_iter().flatten() {
            if OrderStatus::parse(label).is_none() {
                return Err(DashboardError::InvalidData(format!(
                    "column '{}' has unrecognized status '{}'",
                    order::STATUS,
                    label
                )));
            }
        }

        Ok(df)
    }

    /// Parse or rebase the date column to Datetime (µs). Unparseable
    /// string values become null; the caller's null check turns them into
    /// a load error that names the column. An already-typed datetime
    /// column may carry any time unit (pandas interop hands over
    /// nanoseconds); its ticks are rebased to microseconds, not merely
    /// relabeled.
    fn parse_date_column(df: DataFrame, column: &str) -> Result<DataFrame, DashboardError> {
        let dtype = df.column(column)?.dtype().clone();
        let expr = match dtype {
            DataType::String => col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .str()
                .to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    StrptimeOptions {
                        format: Some(DATE_FORMAT.into()),
                        strict: false,
                        ..Default::default()
                    },
                    lit("raise"),
                ),
            DataType::Datetime(_, _) => {
                col(column).cast(DataType::Datetime(TimeUnit::Microseconds, None))
            }
            _ => return Ok(df),
        };
        let df = df.lazy().with_columns([expr]).collect()?;
        Ok(df)
    }
}

// ── Typed extraction ────────────────────────────────────────────────────────

/// Extract typed order records from a (possibly filtered) frame.
///
/// Row order is preserved; every downstream encounter-order tie-break
/// relies on it.
pub fn extract_orders(df: &DataFrame) -> Result<Vec<Order>, DashboardError> {
    let n = df.height();
    let order_ids = df.column(order::ORDER_ID)?.str()?;
    let dates = df.column(order::DATE)?.as_materialized_series();
    let platforms = df.column(order::PLATFORM)?.str()?;
    let states = df.column(order::STATE)?.str()?;
    let cities = df.column(order::CITY)?.str()?;
    let products = df.column(order::PRODUCT)?.str()?;
    let quantities = df.column(order::QUANTITY)?.as_materialized_series().i64()?;
    let revenues = df.column(order::REVENUE)?.as_materialized_series().f64()?;
    let profits = df.column(order::PROFIT)?.as_materialized_series().f64()?;
    let customer_ids = df.column(order::CUSTOMER_ID)?.str()?;
    let payment_methods = df.column(order::PAYMENT_METHOD)?.str()?;
    let statuses = df.column(order::STATUS)?.str()?;
    let skus = df.column(order::SKU).ok().map(|c| c.str()).transpose()?;

    let mut orders = Vec::with_capacity(n);
    for i in 0..n {
        let date_us = match dates.get(i) {
            Ok(AnyValue::Datetime(us, _, _)) => us,
            _ => {
                return Err(DashboardError::InvalidData(format!(
                    "column '{}' has a non-datetime value at row {}",
                    order::DATE,
                    i
                )))
            }
        };
        let status_label = statuses.get(i).unwrap_or("");
        let status = OrderStatus::parse(status_label).ok_or_else(|| {
            DashboardError::InvalidData(format!(
                "column '{}' has unrecognized status '{}'",
                order::STATUS,
                status_label
            ))
        })?;

        orders.push(Order {
            order_id: order_ids.get(i).unwrap_or("").to_string(),
            date: date_from_us(date_us)?,
            platform: platforms.get(i).unwrap_or("").to_string(),
            state: states.get(i).unwrap_or("").to_string(),
            city: cities.get(i).unwrap_or("").to_string(),
            product: products.get(i).unwrap_or("").to_string(),
            sku: skus.and_then(|s| s.get(i)).map(|s| s.to_string()),
            quantity: quantities.get(i).unwrap_or(0),
            revenue: revenues.get(i).unwrap_or(0.0),
            profit: profits.get(i).unwrap_or(0.0),
            customer_id: customer_ids.get(i).unwrap_or("").to_string(),
            payment_method: payment_methods.get(i).unwrap_or("").to_string(),
            status,
        });
    }
    Ok(orders)
}

fn date_from_us(us: i64) -> Result<NaiveDate, DashboardError> {
    chrono::DateTime::from_timestamp_micros(us)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DashboardError::InvalidData(format!("timestamp {us} out of range")))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
order_id,date,platform,state,city,product,sku,quantity,revenue,profit,customer_id,payment_method,status
O1,2024-06-01,Myntra,Karnataka,Bengaluru,Kurta,KU-1,2,100,30,C1,UPI,Completed
O2,2024-06-02,Ajio,Maharashtra,Mumbai,Saree,SA-9,1,250,80,C2,COD,Delivered
O3,2024-06-03,Myntra,Karnataka,Mysuru,Kurta,KU-1,1,120,35,C1,UPI,Cancelled
";

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn load_coerces_and_validates() {
        let file = write_csv(SAMPLE);
        let data = SalesData::load_csv(file.path()).unwrap();
        assert_eq!(data.height(), 3);

        let orders = extract_orders(data.frame()).unwrap();
        assert_eq!(orders[0].order_id, "O1");
        assert_eq!(orders[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(orders[0].quantity, 2);
        assert_eq!(orders[0].revenue, 100.0);
        assert_eq!(orders[0].profit, 30.0);
        assert_eq!(orders[1].status, OrderStatus::Completed);
        assert_eq!(orders[1].sku.as_deref(), Some("SA-9"));
        assert_eq!(orders[2].status, OrderStatus::Cancelled);
    }

    #[test]
    fn extra_columns_are_preserved() {
        let extra = SAMPLE
            .replace(",status\n", ",status,customer_name\n")
            .replace(",Completed\n", ",Completed,Asha\n")
            .replace(",Delivered\n", ",Delivered,Birju\n")
            .replace(",Cancelled\n", ",Cancelled,Asha\n");
        let file = write_csv(&extra);
        let data = SalesData::load_csv(file.path()).unwrap();
        assert!(data.frame().column("customer_name").is_ok());
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let file = write_csv("order_id,date\nO1,2024-06-01\n");
        let err = SalesData::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn(_)));
    }

    #[test]
    fn unparseable_revenue_names_the_column() {
        let bad = SAMPLE.replace("250", "two-fifty");
        let file = write_csv(&bad);
        match SalesData::load_csv(file.path()).unwrap_err() {
            DashboardError::InvalidData(msg) => assert!(msg.contains("revenue")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_date_names_the_column() {
        let bad = SAMPLE.replace("2024-06-02", "02/06/2024");
        let file = write_csv(&bad);
        match SalesData::load_csv(file.path()).unwrap_err() {
            DashboardError::InvalidData(msg) => assert!(msg.contains("date")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_status_is_an_error() {
        let bad = SAMPLE.replace("Cancelled", "Lost");
        let file = write_csv(&bad);
        match SalesData::load_csv(file.path()).unwrap_err() {
            DashboardError::InvalidData(msg) => assert!(msg.contains("Lost")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sku_column_is_optional() {
        let no_sku = SAMPLE
            .replace(",sku", "")
            .replace(",KU-1", "")
            .replace(",SA-9", "");
        let file = write_csv(&no_sku);
        let data = SalesData::load_csv(file.path()).unwrap();
        let orders = extract_orders(data.frame()).unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(|o| o.sku.is_none()));
    }

    #[test]
    fn from_frame_rebases_nanosecond_dates() {
        let file = write_csv(SAMPLE);
        let data = SalesData::load_csv(file.path()).unwrap();
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
        assert_eq!(
            data.frame().column(order::DATE).unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Microseconds, None)
        );

        let orders = extract_orders(data.frame()).unwrap();
        assert_eq!(orders[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let (lo, hi) = data.date_range().unwrap().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[test]
    fn date_range_spans_the_dataset() {
        let file = write_csv(SAMPLE);
        let data = SalesData::load_csv(file.path()).unwrap();
        let (lo, hi) = data.date_range().unwrap().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[test]
    fn date_range_of_empty_dataset_is_none() {
        let header = SAMPLE.lines().next().unwrap();
        let file = write_csv(&format!("{header}\n"));
        let data = SalesData::load_csv(file.path()).unwrap();
        assert_eq!(data.date_range().unwrap(), None);
    }

    #[test]
    fn unique_values_are_sorted() {
        let file = write_csv(SAMPLE);
        let data = SalesData::load_csv(file.path()).unwrap();
        assert_eq!(data.unique_values(order::PLATFORM).unwrap(), ["Ajio", "Myntra"]);
        assert_eq!(
            data.unique_values(order::CITY).unwrap(),
            ["Bengaluru", "Mumbai", "Mysuru"]
        );
    }

    #[test]
    fn status_labels_parse_leniently() {
        assert_eq!(OrderStatus::parse(" Delivered "), Some(OrderStatus::Completed));
        assert_eq!(OrderStatus::parse("CANCELED"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("return"), Some(OrderStatus::Returned));
        assert_eq!(OrderStatus::parse("lost"), None);
    }
}
