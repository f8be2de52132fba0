//! Compute core for a fashion e-commerce sales dashboard.
//!
//! The pipeline is Loader -> Filter -> Aggregation -> Presentation, re-run
//! in full whenever a filter changes. The widget layer and the charting
//! backend live elsewhere; this crate consumes their control values as a
//! [`filter::FilterConfig`] and hands back KPI cards, chart payloads and
//! CSV export text. Every derived value is a pure function of the loaded
//! dataset and the active filters.

pub mod aggregation;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod presentation;
pub mod schema;

#[cfg(feature = "python")]
mod python;

pub use error::DashboardError;
pub use filter::{FilterConfig, FilterOptions};
pub use model::{extract_orders, Order, OrderStatus, SalesData};
pub use presentation::{build_report, DashboardReport, ReportOptions};

// ── Pipeline tests ──────────────────────────────────────────────────────────
