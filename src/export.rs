/// Export builders for the four download buttons: the filtered dataset
/// and the three derived customer tables, each as CSV text with a header
/// row. Empty inputs produce a header-only CSV.
use polars::prelude::*;

use crate::aggregation::{CustomerActivity, CustomerPayment, CustomerSegments};
use crate::error::DashboardError;
use crate::model::DATE_FORMAT;
use crate::schema::summary;

/// The full filtered frame, every column preserved, dates rendered as
/// calendar days.
pub fn filtered_orders_csv(view: &DataFrame) -> Result<String, DashboardError> {
    write_csv(view.clone())
}

/// One row per customer with their dominant payment method.
pub fn payment_methods_csv(payments: &[CustomerPayment]) -> Result<String, DashboardError> {
    let customer_ids: Vec<String> = payments.iter().map(|p| p.customer_id.clone()).collect();
    let methods: Vec<String> = payments.iter().map(|p| p.payment_method.clone()).collect();
    let df = DataFrame::new(vec![
        Column::new(summary::CUSTOMER_ID.into(), &customer_ids),
        Column::new(summary::PAYMENT_METHOD.into(), &methods),
    ])?;
    write_csv(df)
}

/// Loyal customers with their distinct order count and revenue.
pub fn loyal_customers_csv(segments: &CustomerSegments) -> Result<String, DashboardError> {
    segment_csv(&segments.loyal)
}

/// One-time customers with their distinct order count and revenue.
pub fn one_time_customers_csv(segments: &CustomerSegments) -> Result<String, DashboardError> {
    segment_csv(&segments.one_time)
}

fn segment_csv(members: &[CustomerActivity]) -> Result<String, DashboardError> {
    let customer_ids: Vec<String> = members.iter().map(|c| c.customer_id.clone()).collect();
    let order_counts: Vec<i64> = members.iter().map(|c| c.order_count as i64).collect();
    let revenues: Vec<f64> = members.iter().map(|c| c.revenue).collect();
    let df = DataFrame::new(vec![
        Column::new(summary::CUSTOMER_ID.into(), &customer_ids),
        Column::new(summary::ORDER_COUNT.into(), &order_counts),
        Column::new(summary::TOTAL_REVENUE.into(), &revenues),
    ])?;
    write_csv(df)
}

fn write_csv(mut df: DataFrame) -> Result<String, DashboardError> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_datetime_format(Some(DATE_FORMAT.to_string()))
        .finish(&mut df)?;
    let text = String::from_utf8(buf).map_err(|e| DashboardError::General(e.to_string()))?;
    tracing::debug!("export of {} rows ready", df.height());
    Ok(text)
}

// ── Tests ───────────────────────────────────────────────────────────────────
