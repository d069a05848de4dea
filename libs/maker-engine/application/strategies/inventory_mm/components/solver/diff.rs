//! Order reconciliation logic.
//!
//! Diffs the desired quote set against live orders, per tag, and produces a
//! cancel/place [`Plan`]. Running it again with unchanged inputs yields an
//! empty plan.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::application::strategies::inventory_mm::types::{
    BookSnapshot, DesiredOrder, LiveOrders, Plan, SolverConfig,
};
use crate::domain::{Order, OrderTag};

/// Compare live orders with desired quotes and build a plan.
///
/// # Algorithm
/// 1. Live tag not desired: cancel every order under it
/// 2. Several live orders under one tag: keep the one priced closest to the
///    desired price, cancel the rest
/// 3. Maker tags only: cancel the kept order if it now crosses that token's
///    best ask, or has drifted `requote_delta` or more from the desired price
/// 4. Place every desired tag left without a live order, if its price is
///    positive and its size meets the minimum
pub fn reconcile(
    desired: &[DesiredOrder],
    live: &LiveOrders,
    book: &BookSnapshot,
    config: &SolverConfig,
) -> Plan {
    let mut plan = Plan::new();

    // One desired entry per tag; first wins
    let mut desired_by_tag: BTreeMap<&OrderTag, &DesiredOrder> = BTreeMap::new();
    for d in desired {
        desired_by_tag.entry(&d.tag).or_insert(d);
    }

    let mut satisfied: BTreeSet<&OrderTag> = BTreeSet::new();

    for (tag, orders) in live {
        if orders.is_empty() {
            continue;
        }

        let Some(want) = desired_by_tag.get(tag) else {
            for order in orders {
                plan.add_cancel(tag, &order.id);
            }
            continue;
        };

        let keep_idx = closest_to(orders, want);
        for (i, order) in orders.iter().enumerate() {
            if i != keep_idx {
                debug!("[Reconcile] {} duplicate order {} cancelled", tag, order.short_id());
                plan.add_cancel(tag, &order.id);
            }
        }

        let kept = &orders[keep_idx];
        if !tag.is_close() && needs_requote(kept, want, book, config) {
            plan.add_cancel(tag, &kept.id);
            continue;
        }

        satisfied.insert(tag);
    }

    for (tag, want) in desired_by_tag {
        if satisfied.contains(tag) {
            continue;
        }
        if want.price > 0 && want.size >= config.min_order_size {
            plan.place.push(want.clone());
        }
    }

    plan
}

/// Index of the order priced closest to the desired price (first on ties)
fn closest_to(orders: &[Order], want: &DesiredOrder) -> usize {
    orders
        .iter()
        .enumerate()
        .min_by_key(|(i, o)| ((o.price - want.price).abs(), *i))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn needs_requote(order: &Order, want: &DesiredOrder, book: &BookSnapshot, config: &SolverConfig) -> bool {
    if let Some(ask) = book.best_ask_price(want.outcome) {
        if order.price >= ask {
            debug!(
                "[Reconcile] {} at {}c now crosses ask {}c",
                want.tag, order.price, ask
            );
            return true;
        }
    }

    let drift = (order.price - want.price).abs();
    if drift >= config.requote_delta {
        debug!(
            "[Reconcile] {} drifted {}c ({}c -> {}c)",
            want.tag, drift, order.price, want.price
        );
        return true;
    }

    false
}
