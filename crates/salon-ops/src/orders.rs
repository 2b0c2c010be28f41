//! # Order Lifecycle
//!
//! Create, update and delete POS orders, keeping stock and numbering in step.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate(NewOrder)                     ← rejects before any I/O        │
//! │       │                                                                 │
//! │  sequencer lock ─┬─ next_order_id(category)                             │
//! │                  │                                                      │
//! │                  └─ BEGIN                                               │
//! │                       pos_orders          1 row                         │
//! │                       pos_order_items     1 row per line                │
//! │                       sales_history       1 row per product line        │
//! │                        or salon_consumption                             │
//! │                     COMMIT                                              │
//! │       │                                                                 │
//! │  recalculate_product(..)  per product   ← failures logged only          │
//! │       │                                                                 │
//! │  notifier.order_created   if allowed    ← failures logged only          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delete
//! Snapshot, then one transaction removes the ledger rows, the items and
//! the order. Renumbering, stock recalculation and the notification follow;
//! none of them can fail the delete once it has committed.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use salon_core::validation::validate_new_order;
use salon_core::{ItemType, Money, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderUpdate};
use salon_core::{OrderCategory, ValidationError, SALON_CONSUMPTION_CLIENT};
use salon_db::{commit, ConsumptionRepository, Database, DbError, OrderRepository, SaleRepository};

use crate::config::{AutomationSettings, OrderEvent};
use crate::error::{OpsError, OpsResult};
use crate::notify::{NoOpNotifier, OrderNotifier};
use crate::replayer::{ProductRecalc, StockReplayer};
use crate::sequencer::{OrderSequencer, PartitionOutcome};

// =============================================================================
// Results
// =============================================================================

/// A newly recorded order.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub detail: OrderDetail,
    /// Stock of each product the order moved, after recalculation.
    pub stock: Vec<ProductRecalc>,
    pub notified: bool,
}

/// An order after an update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedOrder {
    pub order: Order,
    pub notified: bool,
}

/// What a delete did.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedOrder {
    /// The order as it was before deletion.
    pub order: Order,
    /// `None` if renumbering failed; the delete itself stands.
    pub renumbered: Option<PartitionOutcome>,
    pub stock: Vec<ProductRecalc>,
    pub notified: bool,
}

// =============================================================================
// Order Service
// =============================================================================

/// Runs the order lifecycle against the store.
pub struct OrderService {
    db: Database,
    sequencer: OrderSequencer,
    replayer: StockReplayer,
    notifier: Arc<dyn OrderNotifier>,
    automation: AutomationSettings,
}

impl OrderService {
    /// Creates a service that sends no notifications.
    pub fn new(db: Database, sequencer: OrderSequencer, replayer: StockReplayer) -> Self {
        Self::with_notifier(
            db,
            sequencer,
            replayer,
            Arc::new(NoOpNotifier),
            AutomationSettings::disabled(),
        )
    }

    /// Creates a service with a messaging integration.
    pub fn with_notifier(
        db: Database,
        sequencer: OrderSequencer,
        replayer: StockReplayer,
        notifier: Arc<dyn OrderNotifier>,
        automation: AutomationSettings,
    ) -> Self {
        OrderService {
            db,
            sequencer,
            replayer,
            notifier,
            automation,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Records an order, its items and its ledger rows.
    ///
    /// ## Errors
    /// - Validation errors, before anything is read or written
    /// - Database errors from the insert transaction (nothing is kept)
    pub async fn create_order(&self, request: NewOrder) -> OpsResult<CreatedOrder> {
        validate_new_order(&request)?;

        let now = Utc::now();
        let created_at = request.created_at.unwrap_or(now);
        let category = request.category;
        let order_row_id = Uuid::new_v4().to_string();

        let total: Money = request.items.iter().map(|i| i.line_total()).sum();
        let consumption_purpose = request
            .consumption_purpose
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let items: Vec<OrderItem> = request
            .items
            .iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4().to_string(),
                pos_order_id: order_row_id.clone(),
                item_name: item.item_name.trim().to_string(),
                item_type: item.item_type,
                product_name: item.product_name.as_deref().map(|n| n.trim().to_string()),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                created_at: now,
            })
            .collect();

        let detail = {
            let _numbering = self.sequencer.hold().await;
            let number = self.sequencer.next_order_id(category).await;

            let order = Order {
                id: order_row_id.clone(),
                order_id: Some(number.clone()),
                invoice_number: Some(number),
                client_name: request.client_name.trim().to_string(),
                client_phone: request.client_phone.clone(),
                order_category: Some(category),
                is_salon_consumption: category.is_salon_consumption(),
                order_type: Some(category.as_str().to_string()),
                consumption_purpose,
                total_cents: total.cents(),
                payment_method: request.payment_method,
                status: Default::default(),
                notes: request.notes.clone(),
                created_at,
                updated_at: now,
            };

            let mut tx = self.db.begin().await?;
            OrderRepository::insert_with(&mut tx, &order).await?;
            for item in &items {
                OrderRepository::insert_item_with(&mut tx, item).await?;
                let (Some(product), ItemType::Product) = (&item.product_name, item.item_type)
                else {
                    continue;
                };
                match category {
                    OrderCategory::Sales => {
                        SaleRepository::insert_with(
                            &mut tx,
                            product,
                            item.quantity,
                            created_at,
                            Some(order.id.as_str()),
                        )
                        .await?;
                    }
                    OrderCategory::SalonConsumption => {
                        ConsumptionRepository::insert_with(
                            &mut tx,
                            product,
                            item.quantity,
                            created_at,
                            Some(order.id.as_str()),
                        )
                        .await?;
                    }
                }
            }
            commit(tx).await?;

            OrderDetail { order, items }
        };

        info!(
            order_id = ?detail.order.order_id,
            category = %category,
            items = detail.items.len(),
            total = %total,
            "Order created"
        );

        let stock = self.recalculate(&detail.product_names()).await;
        let notified = self.notify(OrderEvent::Created, &detail.order, None).await;

        Ok(CreatedOrder {
            detail,
            stock,
            notified,
        })
    }

    /// Shorthand for a salon-consumption order booked against the salon.
    pub async fn record_salon_usage(
        &self,
        purpose: &str,
        items: Vec<NewOrderItem>,
    ) -> OpsResult<CreatedOrder> {
        self.create_order(NewOrder {
            client_name: SALON_CONSUMPTION_CLIENT.to_string(),
            client_phone: None,
            category: OrderCategory::SalonConsumption,
            consumption_purpose: Some(purpose.to_string()),
            payment_method: None,
            notes: None,
            items,
            created_at: None,
        })
        .await
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Applies a partial update to status, payment, phone and notes.
    pub async fn update_order(&self, id: &str, update: OrderUpdate) -> OpsResult<UpdatedOrder> {
        if id.trim().is_empty() {
            return Err(ValidationError::required("id").into());
        }
        if update.is_empty() {
            return Err(ValidationError::required("update").into());
        }

        let order = self.db.orders().update(id, &update).await.map_err(|e| match e {
            DbError::NotFound { .. } => OpsError::OrderNotFound(id.to_string()),
            other => other.into(),
        })?;

        info!(order_id = ?order.order_id, status = ?order.status, "Order updated");
        let notified = self.notify(OrderEvent::Updated, &order, None).await;

        Ok(UpdatedOrder { order, notified })
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes an order with its items and ledger rows.
    ///
    /// Later orders in the same partition are renumbered to close the gap
    /// and every product the order touched is recalculated.
    pub async fn delete_order(&self, id: &str, reason: Option<&str>) -> OpsResult<DeletedOrder> {
        if id.trim().is_empty() {
            return Err(ValidationError::required("id").into());
        }

        let detail = self
            .db
            .orders()
            .get_detail(id)
            .await?
            .ok_or_else(|| OpsError::OrderNotFound(id.to_string()))?;

        let sales = self.db.sales().list_for_order(id).await?;
        let consumption = self.db.consumption().list_for_order(id).await?;

        let mut products: BTreeSet<String> = detail.product_names().into_iter().collect();
        products.extend(sales.iter().map(|s| s.product_name.clone()));
        products.extend(consumption.iter().map(|c| c.product_name.clone()));

        let order = detail.order;
        let snapshot = order.sequenced();

        let renumbered = {
            let _numbering = self.sequencer.hold().await;

            let mut tx = self.db.begin().await?;
            SaleRepository::delete_for_order(&mut tx, id).await?;
            ConsumptionRepository::delete_for_order(&mut tx, id).await?;
            OrderRepository::delete_items(&mut tx, id).await?;
            OrderRepository::delete(&mut tx, id).await?;
            commit(tx).await?;

            info!(order_id = ?order.order_id, reason = ?reason, "Order deleted");

            match self.sequencer.renumber_after_deletion_locked(&snapshot).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(order_id = ?order.order_id, error = %e, "Renumbering after delete failed");
                    None
                }
            }
        };

        let products: Vec<String> = products.into_iter().collect();
        let stock = self.recalculate(&products).await;

        let notified = self.notify(OrderEvent::Deleted, &order, reason).await;

        Ok(DeletedOrder {
            order,
            renumbered,
            stock,
            notified,
        })
    }

    // =========================================================================
    // Side effects
    // =========================================================================

    /// Recalculates each product, logging failures.
    async fn recalculate(&self, products: &[String]) -> Vec<ProductRecalc> {
        let mut results = Vec::with_capacity(products.len());
        for product in products {
            match self.replayer.recalculate_product(product).await {
                Ok(recalc) => results.push(recalc),
                Err(e) => error!(product = %product, error = %e, "Stock recalculation failed"),
            }
        }
        results
    }

    /// Sends the message for `event` if it applies. Returns whether a
    /// message went out.
    async fn notify(&self, event: OrderEvent, order: &Order, reason: Option<&str>) -> bool {
        if order.phone().is_none()
            || order.category() != OrderCategory::Sales
            || !self.automation.allows(event)
        {
            return false;
        }

        let result = match event {
            OrderEvent::Created => self.notifier.order_created(order).await,
            OrderEvent::Updated => self.notifier.order_updated(order).await,
            OrderEvent::Deleted => self.notifier.order_deleted(order, reason).await,
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(event = %event, order_id = ?order.order_id, error = %e, "Order notification failed");
                false
            }
        }
    }
}
