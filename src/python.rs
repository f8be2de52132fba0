/// Python bindings: one `Dashboard` class wrapping the whole pipeline,
/// plus schema constants exported as submodules.
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::error::DashboardError;
use crate::filter::{self, FilterConfig, FilterOptions};
use crate::model::{extract_orders, SalesData};
use crate::presentation::{build_report, ReportOptions};
use crate::{aggregation, export, schema};

/// Rows shown in the data table under the charts.
const PREVIEW_ROWS: usize = 30;

/// A loaded dataset plus the session's current filter and display
/// settings. Every read method re-runs the pure pipeline over the
/// current view.
#[pyclass]
pub struct Dashboard {
    data: SalesData,
    filters: FilterConfig,
    options: ReportOptions,
}

#[pymethods]
impl Dashboard {
    /// Load a sales CSV from disk.
    #[staticmethod]
    fn load_csv(path: &str) -> PyResult<Self> {
        let data = SalesData::load_csv(path)?;
        Ok(Self::with_data(data))
    }

    /// Build from an existing Polars DataFrame (e.g. an upload the host
    /// already read). Applies the same coercion and validation as
    /// `load_csv`.
    #[staticmethod]
    fn from_dataframe(df: PyDataFrame) -> PyResult<Self> {
        let data = SalesData::from_frame(df.0)?;
        Ok(Self::with_data(data))
    }

    // ── Session state ───────────────────────────────────────────────────

    /// Replace the filter configuration from a JSON object, e.g.
    /// `{"platforms": ["Myntra"], "date_range": ["2024-06-01", "2024-06-30"]}`.
    /// Omitted fields fall back to "no restriction".
    fn set_filters(&mut self, json: &str) -> PyResult<()> {
        self.filters = serde_json::from_str(json).map_err(DashboardError::from)?;
        Ok(())
    }

    fn clear_filters(&mut self) {
        self.filters = FilterConfig::default();
    }

    #[pyo3(signature = (currency=None, top_n=None))]
    fn set_options(&mut self, currency: Option<String>, top_n: Option<usize>) {
        if let Some(currency) = currency {
            self.options.currency_symbol = currency;
        }
        if let Some(top_n) = top_n {
            self.options.top_n = top_n;
        }
    }

    // ── Dataset introspection ───────────────────────────────────────────

    /// JSON object with the sorted option lists the filter controls
    /// offer, plus the dataset's date span.
    fn filter_options(&self) -> PyResult<String> {
        let options = FilterOptions::from_data(&self.data)?;
        serde_json::to_string(&options)
            .map_err(DashboardError::from)
            .map_err(PyErr::from)
    }

    /// Earliest and latest order date, or None on an empty dataset.
    fn date_range(&self) -> PyResult<Option<(NaiveDate, NaiveDate)>> {
        Ok(self.data.date_range()?)
    }

    fn row_count(&self) -> usize {
        self.data.height()
    }

    // ── Views ───────────────────────────────────────────────────────────

    /// The current filtered view as a DataFrame.
    fn filtered(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.view()?))
    }

    /// First rows of the current view, for the on-page data table.
    #[pyo3(signature = (rows=PREVIEW_ROWS))]
    fn preview(&self, rows: usize) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.view()?.head(Some(rows))))
    }

    // ── Reporting ───────────────────────────────────────────────────────

    /// The full report for the current view as JSON: KPI set, cards and
    /// every chart payload. `currency` and `top_n` override the session
    /// options for this call only.
    #[pyo3(signature = (currency=None, top_n=None))]
    fn report(&self, currency: Option<String>, top_n: Option<usize>) -> PyResult<String> {
        let mut options = self.options.clone();
        if let Some(currency) = currency {
            options.currency_symbol = currency;
        }
        if let Some(top_n) = top_n {
            options.top_n = top_n;
        }
        let view = self.view()?;
        let orders = extract_orders(&view)?;
        Ok(build_report(&orders, &options).to_json()?)
    }

    /// Just the KPI set for the current view, as JSON.
    fn kpis(&self) -> PyResult<String> {
        let view = self.view()?;
        let orders = extract_orders(&view)?;
        serde_json::to_string(&aggregation::compute_kpis(&orders))
            .map_err(DashboardError::from)
            .map_err(PyErr::from)
    }

    // ── Exports ─────────────────────────────────────────────────────────

    /// The filtered dataset as CSV text.
    fn export_filtered(&self) -> PyResult<String> {
        Ok(export::filtered_orders_csv(&self.view()?)?)
    }

    /// One row per customer with their dominant payment method.
    fn export_payment_methods(&self) -> PyResult<String> {
        let orders = extract_orders(&self.view()?)?;
        Ok(export::payment_methods_csv(
            &aggregation::dominant_payment_methods(&orders),
        )?)
    }

    fn export_loyal_customers(&self) -> PyResult<String> {
        let orders = extract_orders(&self.view()?)?;
        Ok(export::loyal_customers_csv(&aggregation::customer_segments(
            &orders,
        ))?)
    }

    fn export_one_time_customers(&self) -> PyResult<String> {
        let orders = extract_orders(&self.view()?)?;
        Ok(export::one_time_customers_csv(
            &aggregation::customer_segments(&orders),
        )?)
    }
}

impl Dashboard {
    fn with_data(data: SalesData) -> Self {
        Self {
            data,
            filters: FilterConfig::default(),
            options: ReportOptions::default(),
        }
    }

    fn view(&self) -> Result<DataFrame, DashboardError> {
        filter::apply(&self.data, &self.filters)
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Order
    let order = PyModule::new(m.py(), "order")?;
    order.add("ORDER_ID", schema::order::ORDER_ID)?;
    order.add("DATE", schema::order::DATE)?;
    order.add("PLATFORM", schema::order::PLATFORM)?;
    order.add("STATE", schema::order::STATE)?;
    order.add("CITY", schema::order::CITY)?;
    order.add("PRODUCT", schema::order::PRODUCT)?;
    order.add("SKU", schema::order::SKU)?;
    order.add("QUANTITY", schema::order::QUANTITY)?;
    order.add("REVENUE", schema::order::REVENUE)?;
    order.add("PROFIT", schema::order::PROFIT)?;
    order.add("CUSTOMER_ID", schema::order::CUSTOMER_ID)?;
    order.add("PAYMENT_METHOD", schema::order::PAYMENT_METHOD)?;
    order.add("STATUS", schema::order::STATUS)?;
    order.add("REQUIRED", schema::order::REQUIRED.to_vec())?;
    m.add_submodule(&order)?;

    // Status
    let status = PyModule::new(m.py(), "status")?;
    status.add("COMPLETED", schema::status::COMPLETED)?;
    status.add("CANCELLED", schema::status::CANCELLED)?;
    status.add("RETURNED", schema::status::RETURNED)?;
    m.add_submodule(&status)?;

    // Summary
    let summary = PyModule::new(m.py(), "summary")?;
    summary.add("CUSTOMER_ID", schema::summary::CUSTOMER_ID)?;
    summary.add("PAYMENT_METHOD", schema::summary::PAYMENT_METHOD)?;
    summary.add("ORDER_COUNT", schema::summary::ORDER_COUNT)?;
    summary.add("TOTAL_REVENUE", schema::summary::TOTAL_REVENUE)?;
    summary.add("SEGMENT", schema::summary::SEGMENT)?;
    summary.add("LOYAL", schema::summary::LOYAL)?;
    summary.add("ONE_TIME", schema::summary::ONE_TIME)?;
    m.add_submodule(&summary)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Dashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
