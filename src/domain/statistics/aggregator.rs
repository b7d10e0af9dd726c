use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::inventory::{InventoryLedger, Product};
use crate::domain::order::{OrderAggregate, OrderCommandHandler, OrderError, OrderStatus, PaymentStatus};
use crate::domain::shared::{round_money, Money};

// ============================================================================
// Statistics Aggregator
// ============================================================================
//
// Pure reads over committed orders and live products. Voided orders count
// towards the status breakdown but never towards revenue or units sold.
//
// Product counts use ledger stock as it stands. A checkout decrements stock
// before its order is persisted, so units held by an in-flight checkout are
// already gone from these counts; a group that rolls back puts them back.
//
// ============================================================================

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCounts {
    pub total: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCounts {
    pub total: usize,
    pub active: usize,
    pub out_of_stock: usize,
    pub low_stock: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub orders: OrderCounts,
    pub delivered_revenue: Money,
    pub paid_revenue: Money,
    pub average_order_value: Money,
    pub top_products: Vec<TopProduct>,
    pub products: ProductCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorStatistics {
    pub vendor_id: Uuid,
    #[serde(flatten)]
    pub summary: SalesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatistics {
    #[serde(flatten)]
    pub summary: SalesSummary,
    pub vendor_count: usize,
    pub shopper_count: usize,
}

pub struct StatisticsAggregator {
    orders: Arc<OrderCommandHandler>,
    ledger: Arc<dyn InventoryLedger>,
    low_stock_threshold: u32,
}

impl StatisticsAggregator {
    pub fn new(orders: Arc<OrderCommandHandler>, ledger: Arc<dyn InventoryLedger>, low_stock_threshold: u32) -> Self {
        Self {
            orders,
            ledger,
            low_stock_threshold,
        }
    }

    pub async fn vendor_stats(&self, vendor_id: Uuid) -> Result<VendorStatistics, OrderError> {
        let orders = self.orders.orders_for_vendor(vendor_id).await?;
        let products = self.ledger.products_for_vendor(vendor_id).await;

        Ok(VendorStatistics {
            vendor_id,
            summary: summarize(&orders, &products, self.low_stock_threshold),
        })
    }

    pub async fn global_stats(&self) -> Result<GlobalStatistics, OrderError> {
        let orders = self.orders.all_orders().await?;
        let products = self.ledger.products().await;

        let vendors: HashSet<Uuid> = products
            .iter()
            .map(|p| p.vendor_id)
            .chain(orders.iter().map(|o| o.vendor_id))
            .collect();
        let shoppers: HashSet<Uuid> = orders.iter().map(|o| o.shopper_id).collect();

        Ok(GlobalStatistics {
            summary: summarize(&orders, &products, self.low_stock_threshold),
            vendor_count: vendors.len(),
            shopper_count: shoppers.len(),
        })
    }
}

fn summarize(orders: &[OrderAggregate], products: &[Product], low_stock_threshold: u32) -> SalesSummary {
    let mut by_status: BTreeMap<OrderStatus, usize> = OrderStatus::ALL.iter().map(|s| (*s, 0)).collect();
    let mut delivered_revenue = Decimal::ZERO;
    let mut paid_revenue = Decimal::ZERO;
    let mut counted_value = Decimal::ZERO;
    let mut counted_orders = 0u32;
    let mut units: HashMap<Uuid, (String, u32)> = HashMap::new();

    for order in orders {
        *by_status.entry(order.status).or_insert(0) += 1;

        if order.status == OrderStatus::Delivered {
            delivered_revenue += order.grand_total;
        }
        if order.payment_status == PaymentStatus::Paid {
            paid_revenue += order.grand_total;
        }
        if order.status.is_voided() {
            continue;
        }

        counted_value += order.grand_total;
        counted_orders += 1;
        for line in &order.lines {
            let entry = units
                .entry(line.product_id)
                .or_insert_with(|| (line.product_name.clone(), 0));
            entry.1 += line.quantity;
        }
    }

    let average_order_value = if counted_orders == 0 {
        Decimal::ZERO
    } else {
        round_money(counted_value / Decimal::from(counted_orders))
    };

    let mut top_products: Vec<TopProduct> = units
        .into_iter()
        .map(|(product_id, (name, units_sold))| TopProduct { product_id, name, units_sold })
        .collect();
    // Ties broken by name then id so the ranking is stable
    top_products.sort_by(|a, b| {
        b.units_sold
            .cmp(&a.units_sold)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    top_products.truncate(TOP_PRODUCTS);

    let product_counts = ProductCounts {
        total: products.len(),
        active: products.iter().filter(|p| p.active).count(),
        out_of_stock: products.iter().filter(|p| p.stock == 0).count(),
        low_stock: products
            .iter()
            .filter(|p| p.stock > 0 && p.stock <= low_stock_threshold)
            .count(),
    };

    SalesSummary {
        orders: OrderCounts {
            total: orders.len(),
            by_status,
        },
        delivered_revenue,
        paid_revenue,
        average_order_value,
        top_products,
        products: product_counts,
    }
}
