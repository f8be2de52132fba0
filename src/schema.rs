/// Column-name constants for the fashion-dashkit schema.
/// Single source of truth - exported to Python via PyO3.

// ── Order columns ───────────────────────────────────────────────────────────
pub mod order {
    pub const ORDER_ID: &str = "order_id";
    pub const DATE: &str = "date";
    pub const PLATFORM: &str = "platform";
    pub const STATE: &str = "state";
    pub const CITY: &str = "city";
    pub const PRODUCT: &str = "product";
    pub const SKU: &str = "sku";
    pub const QUANTITY: &str = "quantity";
    pub const REVENUE: &str = "revenue";
    pub const PROFIT: &str = "profit";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const STATUS: &str = "status";

    /// Columns a source file must carry. `sku` is optional.
    pub const REQUIRED: [&str; 12] = [
        ORDER_ID,
        DATE,
        PLATFORM,
        STATE,
        CITY,
        PRODUCT,
        QUANTITY,
        REVENUE,
        PROFIT,
        CUSTOMER_ID,
        PAYMENT_METHOD,
        STATUS,
    ];
}

// ── Order status values ─────────────────────────────────────────────────────
pub mod status {
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
    pub const RETURNED: &str = "returned";
}

// ── Derived summary columns ─────────────────────────────────────────────────
pub mod summary {
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const ORDER_COUNT: &str = "orders";
    pub const TOTAL_REVENUE: &str = "revenue";
    pub const SEGMENT: &str = "segment";

    pub const LOYAL: &str = "loyal";
    pub const ONE_TIME: &str = "one_time";
}
