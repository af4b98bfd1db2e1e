use super::{new_id, today};
use crate::error::{DomainError, DomainResult};
use crate::schema::collections::{Orders, Teachers};
use crate::schema::Order;
use crate::store::DocumentStore;
use crate::workflow::{Actor, ApprovalStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Essentials teachers can order, with unit prices.
pub const CATALOG: [(&str, f64); 6] = [
    ("Notebook (Pack of 10)", 150.0),
    ("Pen Set (Pack of 5)", 50.0),
    ("Pencil Box", 30.0),
    ("Drawing Book", 45.0),
    ("Geometry Box", 75.0),
    ("Whiteboard Markers (Set of 4)", 100.0),
];

fn unit_price(item: &str) -> Option<f64> {
    CATALOG.iter().find(|(name, _)| *name == item).map(|(_, p)| *p)
}

/// Places an order; zero quantities are ignored and the total is priced from the catalog.
pub fn place(store: &mut DocumentStore, teacher_id: &str, items: BTreeMap<String, u32>) -> DomainResult<Order> {
    if !store.get::<Teachers>()?.contains_key(teacher_id) {
        return Err(DomainError::not_found("teacher", teacher_id));
    }
    let items: BTreeMap<String, u32> = items.into_iter().filter(|(_, q)| *q > 0).collect();
    if items.is_empty() {
        return Err(DomainError::invalid("order has no items"));
    }
    let mut total_cost = 0.0;
    for (item, qty) in &items {
        let price = unit_price(item).ok_or_else(|| DomainError::invalid(format!("'{item}' is not in the catalog")))?;
        total_cost += price * f64::from(*qty);
    }

    let order = Order {
        id: new_id(),
        items,
        total_cost,
        status: ApprovalStatus::Pending,
        order_date: today(),
    };
    let mut all = store.get::<Orders>()?;
    all.entry(teacher_id.to_string())
        .or_default()
        .push(order.clone());
    store.put::<Orders>(all)?;
    Ok(order)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub teacher_id: String,
    #[serde(flatten)]
    pub order: Order,
}

/// One teacher's orders, or everyone's when `teacher_id` is `None`; newest first.
pub fn list(
    store: &mut DocumentStore,
    teacher_id: Option<&str>,
    status: Option<ApprovalStatus>,
) -> DomainResult<Vec<OrderView>> {
    let mut out: Vec<OrderView> = store
        .get::<Orders>()?
        .into_iter()
        .filter(|(owner, _)| teacher_id.map_or(true, |t| owner == t))
        .flat_map(|(owner, orders)| {
            orders.into_iter().map(move |order| OrderView {
                teacher_id: owner.clone(),
                order,
            })
        })
        .filter(|v| status.map_or(true, |s| v.order.status == s))
        .collect();
    out.sort_by(|a, b| b.order.order_date.cmp(&a.order.order_date));
    Ok(out)
}

fn change_status(
    store: &mut DocumentStore,
    owner: Option<&str>,
    order_id: &str,
    to: ApprovalStatus,
    actor: Actor,
) -> DomainResult<Order> {
    let mut all = store.get::<Orders>()?;
    let order = all
        .iter_mut()
        .filter(|(key, _)| owner.map_or(true, |o| key.as_str() == o))
        .flat_map(|(_, list)| list.iter_mut())
        .find(|o| o.id == order_id)
        .ok_or_else(|| DomainError::not_found("order", order_id))?;
    order.status = order.status.transition(to, actor)?;
    let updated = order.clone();
    store.put::<Orders>(all)?;
    Ok(updated)
}

pub fn review(store: &mut DocumentStore, order_id: &str, decision: ApprovalStatus) -> DomainResult<Order> {
    change_status(store, None, order_id, decision, Actor::Reviewer)
}

pub fn cancel(store: &mut DocumentStore, teacher_id: &str, order_id: &str) -> DomainResult<Order> {
    change_status(store, Some(teacher_id), order_id, ApprovalStatus::Canceled, Actor::Submitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::teachers;
    use crate::records::testing::workspace;

    #[test]
    fn total_is_priced_from_catalog() {
        let (ws, mut store) = workspace("academicd-orders-total");
        let t = teachers::list(&mut store).unwrap().remove(0);
        let items = BTreeMap::from([
            ("Pencil Box".to_string(), 2),
            ("Geometry Box".to_string(), 1),
            ("Drawing Book".to_string(), 0),
        ]);
        let order = place(&mut store, &t.id, items).unwrap();
        assert_eq!(order.total_cost, 135.0);
        assert_eq!(order.items.len(), 2);
        assert!(place(&mut store, &t.id, BTreeMap::new()).is_err());
        let unknown = BTreeMap::from([("Laptop".to_string(), 1)]);
        assert!(place(&mut store, &t.id, unknown).is_err());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn approved_order_cannot_be_canceled() {
        let (ws, mut store) = workspace("academicd-orders-flow");
        let t = teachers::list(&mut store).unwrap().remove(0);
        let order = place(&mut store, &t.id, BTreeMap::from([("Pencil Box".to_string(), 1)])).unwrap();
        review(&mut store, &order.id, ApprovalStatus::Approved).unwrap();
        assert_eq!(cancel(&mut store, &t.id, &order.id).unwrap_err().code(), "invalid_transition");
        let pending = list(&mut store, None, Some(ApprovalStatus::Pending)).unwrap();
        assert!(pending.is_empty());
        assert_eq!(list(&mut store, Some(&t.id), None).unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(ws);
    }
}
