//! Delivery progress of open orders.

use serde::Serialize;

use crate::order::{Order, Status};

/// Where an order stands on its way to the customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub percentage: u8,
    /// 1 received, 2 processing, 3 delivered. 0 when off the track.
    pub step: u8,
    pub label: &'static str,
}

impl Status {
    pub fn progress(&self) -> Progress {
        let (percentage, step, label) = match self {
            Status::Pending => (25, 1, "Order Received"),
            Status::InProgress => (60, 2, "Processing"),
            Status::Completed => (100, 3, "Delivered"),
            Status::Cancelled => (0, 0, "Cancelled"),
        };

        Progress {
            percentage,
            step,
            label,
        }
    }

    /// Still on its way: `pending` or `in-progress`.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Pending | Status::InProgress)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub order_id: String,
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub date: chrono::NaiveDate,
    pub progress: Progress,
}

/// Active orders with their progress, in input order.
pub fn track(orders: &[Order]) -> Vec<Delivery> {
    orders
        .iter()
        .filter(|o| o.status.is_active())
        .map(|o| Delivery {
            order_id: o.id.clone(),
            service: o.service.clone(),
            kind: o.kind.clone(),
            price: o.price,
            date: o.date,
            progress: o.status.progress(),
        })
        .collect()
}
