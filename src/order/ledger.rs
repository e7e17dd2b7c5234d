//! Order table and its per-user views.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::database::{self, ORDERS_KEY, Storage};
use crate::error::{Error, Result};
use crate::order::{Order, OrderForm, Status, quote, round_cents};
use crate::session::Session;
use crate::telemetry;
use crate::user::UserRepository;

/// Order id prefix.
pub const ORDER_ID_PREFIX: &str = "ORD-";
const ORDER_ID_SPACE: u64 = 1_000_000;

type Table = BTreeMap<String, Order>;

/// Admin edit of an order. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    pub status: Option<Status>,
    pub price: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Status selector of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            status => status.parse().map(StatusFilter::Only),
        }
    }
}

/// Listing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    DateAsc,
    #[default]
    DateDesc,
    PriceAsc,
    PriceDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "date-asc" => Ok(SortKey::DateAsc),
            "date-desc" => Ok(SortKey::DateDesc),
            "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            other => Err(format!("unknown sort key {other:?}")),
        }
    }
}

/// Dashboard counters of one customer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub total_spent: f64,
}

/// Platform-wide counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_orders: usize,
    pub total_users: usize,
    pub total_revenue: f64,
    pub completed_orders: usize,
}

/// Keep the orders matching `filter`, preserving their relative order.
pub fn filter_by_status(orders: &[Order], filter: StatusFilter) -> Vec<Order> {
    match filter {
        StatusFilter::All => orders.to_vec(),
        StatusFilter::Only(status) => orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect(),
    }
}

/// Stable sort. Ties keep their input order.
pub fn sort_by(orders: &[Order], key: SortKey) -> Vec<Order> {
    let mut sorted = orders.to_vec();
    match key {
        SortKey::DateAsc => sorted.sort_by(|a, b| a.date.cmp(&b.date)),
        SortKey::DateDesc => sorted.sort_by(|a, b| b.date.cmp(&a.date)),
        SortKey::PriceAsc => sorted.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => {
            sorted.sort_by(|a, b| b.price.total_cmp(&a.price))
        },
    }
    sorted
}

pub fn summary(orders: &[Order]) -> OrderSummary {
    OrderSummary {
        total_orders: orders.len(),
        completed: count(orders, Status::Completed),
        in_progress: count(orders, Status::InProgress),
        total_spent: round_cents(orders.iter().map(|o| o.price).sum()),
    }
}

fn count(orders: &[Order], status: Status) -> usize {
    orders.iter().filter(|o| o.status == status).count()
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.sequence.cmp(&a.sequence));
    orders
}

/// Single order table keyed by order id.
#[derive(Clone)]
pub struct OrderLedger {
    storage: Arc<dyn Storage>,
    users: UserRepository,
    clock: Arc<dyn Clock>,
}

impl OrderLedger {
    /// Create a new [`OrderLedger`].
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&storage)),
            storage,
            clock,
        }
    }

    fn table(&self) -> Result<Table> {
        Ok(database::read_json(self.storage.as_ref(), ORDERS_KEY)?
            .unwrap_or_default())
    }

    fn save(&self, table: &Table) -> Result<()> {
        Ok(database::write_json(self.storage.as_ref(), ORDERS_KEY, table)?)
    }

    /// Quote and record a new `pending` order owned by `session`.
    pub fn create(&self, session: &Session, form: &OrderForm) -> Result<Order> {
        let details = form.details()?;
        let price = quote(&details);

        let mut table = self.table()?;
        let now = self.clock.now();
        let order = Order {
            id: next_order_id(&table, self.clock.now_millis()),
            owner: session.id.clone(),
            customer: session.name.clone(),
            service: details.category().label().to_owned(),
            kind: details.type_label().to_owned(),
            quantity: details.quantity(),
            price,
            status: Status::Pending,
            date: now.date_naive(),
            description: form.description.trim().to_owned(),
            sequence: table.values().map(|o| o.sequence).max().unwrap_or(0) + 1,
            details,
        };

        table.insert(order.id.clone(), order.clone());
        self.save(&table)?;

        telemetry::record_order_created(
            &order.id,
            order.category().as_str(),
            order.price,
        );
        Ok(order)
    }

    /// Orders of `user_id`, newest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let orders = self
            .table()?
            .into_values()
            .filter(|o| o.owner == user_id)
            .collect();

        Ok(newest_first(orders))
    }

    /// Every order, newest first. Admin only.
    pub fn list_all(&self, session: &Session) -> Result<Vec<Order>> {
        if !session.is_admin() {
            return Err(Error::Forbidden);
        }

        Ok(newest_first(self.table()?.into_values().collect()))
    }

    /// One order, visible to its owner and to administrators.
    ///
    /// Orders of other customers are reported as missing.
    pub fn find(&self, session: &Session, order_id: &str) -> Result<Order> {
        self.table()?
            .remove(order_id)
            .filter(|o| session.is_admin() || o.owner == session.id)
            .ok_or_else(|| Error::OrderNotFound(order_id.to_owned()))
    }

    /// Several orders at once, in the requested order.
    ///
    /// Fails on the first id `session` cannot see.
    pub fn find_many(
        &self,
        session: &Session,
        order_ids: &[String],
    ) -> Result<Vec<Order>> {
        let table = self.table()?;

        order_ids
            .iter()
            .map(|id| {
                table
                    .get(id)
                    .filter(|o| session.is_admin() || o.owner == session.id)
                    .cloned()
                    .ok_or_else(|| Error::OrderNotFound(id.clone()))
            })
            .collect()
    }

    /// Id of the account owning `order_id`.
    pub fn find_owner(&self, order_id: &str) -> Result<String> {
        self.table()?
            .remove(order_id)
            .map(|o| o.owner)
            .ok_or_else(|| Error::OrderNotFound(order_id.to_owned()))
    }

    /// Apply an admin edit in place.
    pub fn update(
        &self,
        session: &Session,
        order_id: &str,
        patch: OrderPatch,
    ) -> Result<Order> {
        if !session.is_admin() {
            return Err(Error::Forbidden);
        }
        if let Some(price) = patch.price {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidPrice);
            }
        }

        let mut table = self.table()?;
        let order = table
            .get_mut(order_id)
            .ok_or_else(|| Error::OrderNotFound(order_id.to_owned()))?;

        if let Some(status) = patch.status {
            if order.status.is_terminal() && status != order.status {
                tracing::warn!(
                    order_id,
                    from = order.status.as_str(),
                    to = status.as_str(),
                    "reopening a closed order"
                );
            }
            order.status = status;
        }
        if let Some(price) = patch.price {
            order.price = round_cents(price);
        }
        if let Some(kind) = patch.kind {
            order.kind = kind;
        }

        let order = order.clone();
        self.save(&table)?;

        telemetry::record_order_updated(&order.id, &session.id);
        Ok(order)
    }

    /// Platform counters. Admin only.
    pub fn stats(&self, session: &Session) -> Result<Stats> {
        if !session.is_admin() {
            return Err(Error::Forbidden);
        }

        let orders: Vec<Order> = self.table()?.into_values().collect();
        Ok(Stats {
            total_orders: orders.len(),
            total_users: self.users.count()?,
            total_revenue: round_cents(orders.iter().map(|o| o.price).sum()),
            completed_orders: count(&orders, Status::Completed),
        })
    }
}

/// `ORD-` and the last six digits of `millis`, moved forward until unused.
fn next_order_id(table: &Table, millis: u64) -> String {
    let start = millis % ORDER_ID_SPACE;

    (0..ORDER_ID_SPACE)
        .map(|offset| {
            format!("{ORDER_ID_PREFIX}{:06}", (start + offset) % ORDER_ID_SPACE)
        })
        .find(|id| !table.contains_key(id))
        .unwrap_or_else(|| format!("{ORDER_ID_PREFIX}{millis}"))
}
