/// Aggregation stage: deterministic summaries over a filtered view.
///
/// Every function here is a pure function of the extracted order slice.
/// Grouped results keep first-encounter order, and descending sorts are
/// stable, so ties resolve by row order of the view.
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::Order;

/// Distinct orders a customer needs to count as loyal. Below this the
/// customer is one-time.
pub const LOYAL_MIN_ORDERS: usize = 2;

// ── Result types ────────────────────────────────────────────────────────────

/// Scalar summaries over a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    /// Gross merchandise value: sum of revenue.
    pub gmv: f64,
    /// Average order value: GMV over distinct orders, 0 on an empty view.
    pub aov: f64,
    pub total_profit: f64,
    pub total_quantity: i64,
    /// Distinct order ids.
    pub order_count: usize,
    /// Distinct customer ids.
    pub unique_customers: usize,
    /// Distinct order ids whose status is cancelled or returned.
    pub cancelled_or_returned: usize,
}

/// One (label, revenue) row of a ranking or breakdown table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub label: String,
    pub revenue: f64,
}

/// Revenue summed per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Per-platform totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStats {
    pub platform: String,
    pub revenue: f64,
    pub profit: f64,
    pub quantity: i64,
}

/// A customer's footprint in the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerActivity {
    pub customer_id: String,
    /// Distinct order ids.
    pub order_count: usize,
    pub revenue: f64,
}

/// Exact partition of the view's customers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegments {
    pub loyal: Vec<CustomerActivity>,
    pub one_time: Vec<CustomerActivity>,
}

/// A customer's most frequent payment method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerPayment {
    pub customer_id: String,
    pub payment_method: String,
}

/// Revenue and quantity per (platform, sku) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkuPoint {
    pub platform: String,
    pub sku: String,
    pub revenue: f64,
    pub quantity: i64,
}

// ── KPIs ────────────────────────────────────────────────────────────────────

pub fn compute_kpis(orders: &[Order]) -> KpiSet {
    let mut order_ids: HashSet<&str> = HashSet::new();
    let mut customers: HashSet<&str> = HashSet::new();
    let mut cancelled: HashSet<&str> = HashSet::new();
    let mut gmv = 0.0;
    let mut total_profit = 0.0;
    let mut total_quantity = 0i64;

    for o in orders {
        gmv += o.revenue;
        total_profit += o.profit;
        total_quantity += o.quantity;
        order_ids.insert(o.order_id.as_str());
        customers.insert(o.customer_id.as_str());
        if o.status.is_cancelled_or_returned() {
            cancelled.insert(o.order_id.as_str());
        }
    }

    let order_count = order_ids.len();
    let aov = if order_count > 0 {
        gmv / order_count as f64
    } else {
        0.0
    };

    KpiSet {
        gmv,
        aov,
        total_profit,
        total_quantity,
        order_count,
        unique_customers: customers.len(),
        cancelled_or_returned: cancelled.len(),
    }
}

// ── Rankings ────────────────────────────────────────────────────────────────

/// Revenue per product, descending, at most `n` entries.
pub fn top_products(orders: &[Order], n: usize) -> Vec<RankEntry> {
    let mut entries = revenue_by_key(orders, |o| o.product.as_str());
    entries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    entries.truncate(n);
    entries
}

/// Revenue per city, descending, at most `n` entries.
pub fn top_cities(orders: &[Order], n: usize) -> Vec<RankEntry> {
    let mut entries = revenue_by_key(orders, |o| o.city.as_str());
    entries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    entries.truncate(n);
    entries
}

/// Revenue per state, descending, untruncated.
pub fn state_gmv(orders: &[Order]) -> Vec<RankEntry> {
    let mut entries = revenue_by_key(orders, |o| o.state.as_str());
    entries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    entries
}

fn revenue_by_key<'a, F>(orders: &'a [Order], key: F) -> Vec<RankEntry>
where
    F: Fn(&'a Order) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<RankEntry> = Vec::new();
    for o in orders {
        let k = key(o);
        match index.get(k) {
            Some(&i) => entries[i].revenue += o.revenue,
            None => {
                index.insert(k, entries.len());
                entries.push(RankEntry {
                    label: k.to_string(),
                    revenue: o.revenue,
                });
            }
        }
    }
    entries
}

// ── Trend ───────────────────────────────────────────────────────────────────

/// Revenue summed per date, ascending, one point per date.
pub fn revenue_trend(orders: &[Order]) -> Vec<TrendPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for o in orders {
        *by_date.entry(o.date).or_insert(0.0) += o.revenue;
    }
    by_date
        .into_iter()
        .map(|(date, revenue)| TrendPoint { date, revenue })
        .collect()
}

// ── Breakdowns ──────────────────────────────────────────────────────────────

/// Revenue, profit and quantity per platform, in encounter order.
pub fn platform_breakdown(orders: &[Order]) -> Vec<PlatformStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut stats: Vec<PlatformStats> = Vec::new();
    for o in orders {
        match index.get(o.platform.as_str()) {
            Some(&i) => {
                stats[i].revenue += o.revenue;
                stats[i].profit += o.profit;
                stats[i].quantity += o.quantity;
            }
            None => {
                index.insert(o.platform.as_str(), stats.len());
                stats.push(PlatformStats {
                    platform: o.platform.clone(),
                    revenue: o.revenue,
                    profit: o.profit,
                    quantity: o.quantity,
                });
            }
        }
    }
    stats
}

/// Revenue and quantity per (platform, sku), in encounter order. Rows
/// without an sku fall back to the product name.
pub fn sku_breakdown(orders: &[Order]) -> Vec<SkuPoint> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut points: Vec<SkuPoint> = Vec::new();
    for o in orders {
        let sku = o.sku.as_deref().unwrap_or(o.product.as_str());
        match index.get(&(o.platform.as_str(), sku)) {
            Some(&i) => {
                points[i].revenue += o.revenue;
                points[i].quantity += o.quantity;
            }
            None => {
                index.insert((o.platform.as_str(), sku), points.len());
                points.push(SkuPoint {
                    platform: o.platform.clone(),
                    sku: sku.to_string(),
                    revenue: o.revenue,
                    quantity: o.quantity,
                });
            }
        }
    }
    points
}

// ── Customers ───────────────────────────────────────────────────────────────

/// Partition the view's customers into loyal (more than one distinct
/// order) and one-time (exactly one). Entries keep customer encounter
/// order.
pub fn customer_segments(orders: &[Order]) -> CustomerSegments {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<(String, HashSet<&str>, f64)> = Vec::new();
    for o in orders {
        let i = match index.get(o.customer_id.as_str()) {
            Some(&i) => i,
            None => {
                index.insert(o.customer_id.as_str(), accs.len());
                accs.push((o.customer_id.clone(), HashSet::new(), 0.0));
                accs.len() - 1
            }
        };
        accs[i].1.insert(o.order_id.as_str());
        accs[i].2 += o.revenue;
    }

    let mut loyal = Vec::new();
    let mut one_time = Vec::new();
    for (customer_id, order_ids, revenue) in accs {
        let activity = CustomerActivity {
            customer_id,
            order_count: order_ids.len(),
            revenue,
        };
        if activity.order_count >= LOYAL_MIN_ORDERS {
            loyal.push(activity);
        } else {
            one_time.push(activity);
        }
    }
    CustomerSegments { loyal, one_time }
}

/// Most frequent payment method per customer. Ties keep the method
/// encountered first; customers keep encounter order.
pub fn dominant_payment_methods(orders: &[Order]) -> Vec<CustomerPayment> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut accs: Vec<(String, Vec<(String, usize)>)> = Vec::new();
    for o in orders {
        let i = match index.get(o.customer_id.as_str()) {
            Some(&i) => i,
            None => {
                index.insert(o.customer_id.as_str(), accs.len());
                accs.push((o.customer_id.clone(), Vec::new()));
                accs.len() - 1
            }
        };
        let methods = &mut accs[i].1;
        match methods.iter_mut().find(|(m, _)| m == &o.payment_method) {
            Some((_, count)) => *count += 1,
            None => methods.push((o.payment_method.clone(), 1)),
        }
    }

    let mut result = Vec::with_capacity(accs.len());
    for (customer_id, methods) in accs {
        // Strictly-greater comparison keeps the first method on ties.
        let mut best: Option<(&String, usize)> = None;
        for (method, count) in &methods {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((method, *count));
            }
        }
        if let Some((method, _)) = best {
            result.push(CustomerPayment {
                customer_id,
                payment_method: method.clone(),
            });
        }
    }
    result
}

// ── Tests ───────────────────────────────────────────────────────────────────
