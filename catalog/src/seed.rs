use serde_json::{json, Value};

pub const DEALS: &str = "deals";
pub const PRODUCTS: &str = "products";

/// Immutable seed records for the catalog collections. The store owns
/// the data once the initializer has written it; this type is only the
/// source.
pub struct SeedData {
    pub deals: Vec<Value>,
    pub products: Vec<Value>,
}

impl SeedData {
    pub fn new(deals: Vec<Value>, products: Vec<Value>) -> Self {
        Self { deals, products }
    }

    /// Collections in initialization order.
    pub fn collections(&self) -> [(&'static str, &Vec<Value>); 2] {
        [(DEALS, &self.deals), (PRODUCTS, &self.products)]
    }

    /// The bundled catalog, loaded on every startup.
    pub fn builtin() -> Self {
        let deals = vec![
            json!({
                "id": "deal-001",
                "title": "Spring clearance: noise-cancelling headphones",
                "product_id": "prod-003",
                "discount_percent": 30,
                "ends_at": "2026-09-30T23:59:59Z"
            }),
            json!({
                "id": "deal-002",
                "title": "Bundle: mechanical keyboard + wrist rest",
                "product_id": "prod-001",
                "discount_percent": 15,
                "ends_at": "2026-10-15T23:59:59Z"
            }),
            json!({
                "id": "deal-003",
                "title": "Weekend flash sale: 4K monitor",
                "product_id": "prod-004",
                "discount_percent": 20,
                "ends_at": "2026-09-07T23:59:59Z"
            }),
        ];

        let products = vec![
            json!({
                "id": "prod-001",
                "name": "Tenkeyless mechanical keyboard",
                "description": "Hot-swappable switches, PBT keycaps",
                "price": 89.99,
                "category": "peripherals"
            }),
            json!({
                "id": "prod-002",
                "name": "Wireless ergonomic mouse",
                "description": "2.4GHz and Bluetooth, 8 buttons",
                "price": 49.99,
                "category": "peripherals"
            }),
            json!({
                "id": "prod-003",
                "name": "Over-ear noise-cancelling headphones",
                "description": "40h battery, USB-C fast charge",
                "price": 199.99,
                "category": "audio"
            }),
            json!({
                "id": "prod-004",
                "name": "27\" 4K IPS monitor",
                "description": "HDR400, USB-C with 90W power delivery",
                "price": 429.99,
                "category": "displays"
            }),
            json!({
                "id": "prod-005",
                "name": "USB-C dock",
                "description": "Dual display out, 2.5GbE, SD reader",
                "price": 149.99,
                "category": "accessories"
            }),
        ];

        Self::new(deals, products)
    }
}
