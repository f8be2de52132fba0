/// Presentation stage: formatting and adaptation only.
///
/// Turns aggregation output into the payloads a chart/widget frontend
/// renders: KPI cards, chart series and a state table. No business logic
/// lives here.
use serde::{Deserialize, Serialize};

use crate::aggregation::{self, KpiSet, TrendPoint};
use crate::error::DashboardError;
use crate::model::Order;

pub const TOP_N_MIN: usize = 1;
pub const TOP_N_MAX: usize = 20;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_CURRENCY: &str = "₹";

const TOP_PRODUCTS_COLOR: &str = "#FFFACD";
const TOP_CITIES_COLOR: &str = "#90EE90";
const PROFIT_COLOR: &str = "#FFD580";

// ── Options ─────────────────────────────────────────────────────────────────

/// Display knobs the UI exposes next to the filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub currency_symbol: String,
    pub top_n: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_CURRENCY.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ReportOptions {
    /// Top-N clamped to the range the UI control offers.
    pub fn clamped_top_n(&self) -> usize {
        self.top_n.clamp(TOP_N_MIN, TOP_N_MAX)
    }
}

// ── Display payloads ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub orientation: Orientation,
    /// Fixed series color, `None` for the frontend's default palette.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// One bubble: x = quantity, y = revenue, size scales with revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    pub label: String,
    pub group: String,
    pub x: i64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleChart {
    pub title: String,
    pub points: Vec<BubblePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything one recomputation hands the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub kpis: KpiSet,
    pub cards: Vec<KpiCard>,
    pub revenue_by_platform: BarChart,
    pub profit_by_platform: BarChart,
    pub top_products: BarChart,
    pub top_cities: BarChart,
    pub revenue_trend: LineChart,
    pub quantity_share: PieChart,
    pub revenue_vs_quantity: BubbleChart,
    pub state_gmv: TableSpec,
}

impl DashboardReport {
    pub fn to_json(&self) -> Result<String, DashboardError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── Assembly ────────────────────────────────────────────────────────────────

/// Six KPI cards in display order. Currency cards carry the symbol and
/// two decimals; count cards are grouped integers.
pub fn kpi_cards(kpis: &KpiSet, currency: &str) -> Vec<KpiCard> {
    vec![
        KpiCard {
            label: "GMV".to_string(),
            value: format_money(kpis.gmv, currency),
        },
        KpiCard {
            label: "AOV".to_string(),
            value: format_money(kpis.aov, currency),
        },
        KpiCard {
            label: "Profit".to_string(),
            value: format_money(kpis.total_profit, currency),
        },
        KpiCard {
            label: "Quantity Sold".to_string(),
            value: format_grouped(kpis.total_quantity as f64, 0),
        },
        KpiCard {
            label: "Unique Customers".to_string(),
            value: format_grouped(kpis.unique_customers as f64, 0),
        },
        KpiCard {
            label: "Cancel/Return Orders".to_string(),
            value: format_grouped(kpis.cancelled_or_returned as f64, 0),
        },
    ]
}

/// Build the full report for one view. An empty view yields zero cards
/// and empty series, never an error.
pub fn build_report(orders: &[Order], options: &ReportOptions) -> DashboardReport {
    let n = options.clamped_top_n();
    let kpis = aggregation::compute_kpis(orders);
    let cards = kpi_cards(&kpis, &options.currency_symbol);

    let platforms = aggregation::platform_breakdown(orders);
    let platform_labels: Vec<String> = platforms.iter().map(|p| p.platform.clone()).collect();

    let revenue_by_platform = BarChart {
        title: "Revenue by Platform".to_string(),
        orientation: Orientation::Vertical,
        color: None,
        labels: platform_labels.clone(),
        values: platforms.iter().map(|p| p.revenue).collect(),
    };
    let profit_by_platform = BarChart {
        title: "Profit by Platform".to_string(),
        orientation: Orientation::Vertical,
        color: Some(PROFIT_COLOR.to_string()),
        labels: platform_labels.clone(),
        values: platforms.iter().map(|p| p.profit).collect(),
    };

    let top = aggregation::top_products(orders, n);
    let top_products = BarChart {
        title: format!("Top {n} Products by Revenue"),
        orientation: Orientation::Horizontal,
        color: Some(TOP_PRODUCTS_COLOR.to_string()),
        labels: top.iter().map(|e| e.label.clone()).collect(),
        values: top.iter().map(|e| e.revenue).collect(),
    };
    let top = aggregation::top_cities(orders, n);
    let top_cities = BarChart {
        title: format!("Top {n} Cities by Revenue"),
        orientation: Orientation::Horizontal,
        color: Some(TOP_CITIES_COLOR.to_string()),
        labels: top.iter().map(|e| e.label.clone()).collect(),
        values: top.iter().map(|e| e.revenue).collect(),
    };

    let revenue_trend = LineChart {
        title: "Revenue Trend".to_string(),
        points: aggregation::revenue_trend(orders),
    };

    let quantity_share = PieChart {
        title: "Quantity Share by Platform".to_string(),
        labels: platform_labels,
        values: platforms.iter().map(|p| p.quantity as f64).collect(),
    };

    let revenue_vs_quantity = BubbleChart {
        title: "Revenue vs Quantity".to_string(),
        points: aggregation::sku_breakdown(orders)
            .into_iter()
            .map(|p| BubblePoint {
                label: p.sku,
                group: p.platform,
                x: p.quantity,
                y: p.revenue,
                size: p.revenue,
            })
            .collect(),
    };

    // The table shows the first n of the full descending state list.
    let state_gmv = TableSpec {
        title: "State — Total GMV".to_string(),
        columns: vec!["State".to_string(), "Total GMV".to_string()],
        rows: aggregation::state_gmv(orders)
            .iter()
            .take(n)
            .map(|e| vec![e.label.clone(), format_money(e.revenue, &options.currency_symbol)])
            .collect(),
    };

    DashboardReport {
        kpis,
        cards,
        revenue_by_platform,
        profit_by_platform,
        top_products,
        top_cities,
        revenue_trend,
        quantity_share,
        revenue_vs_quantity,
        state_gmv,
    }
}

// ── Number formatting ───────────────────────────────────────────────────────

/// Currency display: symbol plus grouped two-decimal amount.
pub fn format_money(value: f64, currency: &str) -> String {
    format!("{currency}{}", format_grouped(value, 2))
}

/// Thousands-grouped decimal rendering, e.g. `1234567.891` with two
/// decimals becomes `1,234,567.89`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::new();
    let chars: Vec<char> = integer_part.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 && *c != '-' {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    let integer_grouped: String = grouped.chars().rev().collect();

    match decimal_part {
        Some(d) => format!("{integer_grouped}.{d}"),
        None => integer_grouped,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
