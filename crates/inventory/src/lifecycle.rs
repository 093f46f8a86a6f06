//! Movement state machine.
//!
//! Every movement type has its own status lifecycle. A transition is legal
//! only along the edges returned by [`Lifecycle::successors`]; a small subset
//! of edges additionally moves stock, and [`plan_transition`] turns such an
//! edge into the list of signed deltas the engine must apply.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockmaster_core::{ActingPrincipal, DocumentId, ProductId, WarehouseId};

use crate::document::{
    AdjustmentStatus, DeliveryStatus, DocumentBody, DocumentNumber, DocumentStatus, LineItem,
    MovementDocument, MovementKind, NewAdjustment, ReceiptStatus, TransferStatus,
};
use crate::error::MovementError;
use crate::ledger::Endpoint;

/// Status set of one movement type.
pub trait Lifecycle: Copy + Eq + core::fmt::Display + 'static {
    const KIND: MovementKind;

    /// Legal next statuses.
    fn successors(self) -> &'static [Self];

    /// Whether a new document may start in this status.
    fn can_create_in(self) -> bool;

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}

impl Lifecycle for ReceiptStatus {
    const KIND: MovementKind = MovementKind::Receipt;

    fn successors(self) -> &'static [Self] {
        use ReceiptStatus::*;
        match self {
            Draft => &[Pending, Received, Cancelled],
            Pending => &[Received, Cancelled],
            // Received -> Received records a further partial receipt.
            Received => &[Received, Done],
            Done | Cancelled => &[],
        }
    }

    fn can_create_in(self) -> bool {
        matches!(self, ReceiptStatus::Draft | ReceiptStatus::Pending)
    }
}

impl Lifecycle for DeliveryStatus {
    const KIND: MovementKind = MovementKind::Delivery;

    fn successors(self) -> &'static [Self] {
        use DeliveryStatus::*;
        match self {
            Draft => &[Pending, Cancelled],
            Pending => &[Dispatched, Cancelled],
            Dispatched => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    fn can_create_in(self) -> bool {
        matches!(self, DeliveryStatus::Draft | DeliveryStatus::Pending)
    }
}

impl Lifecycle for TransferStatus {
    const KIND: MovementKind = MovementKind::Transfer;

    fn successors(self) -> &'static [Self] {
        use TransferStatus::*;
        match self {
            Draft => &[Pending, Cancelled],
            Pending => &[InTransit, Cancelled],
            InTransit => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    fn can_create_in(self) -> bool {
        matches!(self, TransferStatus::Draft | TransferStatus::Pending)
    }
}

impl Lifecycle for AdjustmentStatus {
    const KIND: MovementKind = MovementKind::Adjustment;

    fn successors(self) -> &'static [Self] {
        &[]
    }

    fn can_create_in(self) -> bool {
        true
    }
}

pub fn ensure_transition<S: Lifecycle>(from: S, to: S) -> Result<(), MovementError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(MovementError::InvalidTransition {
            kind: S::KIND,
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Cumulative quantity received so far for one receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedQuantity {
    pub product_id: ProductId,
    pub received: i64,
}

/// A requested status change.
///
/// `received` is only meaningful for receipts moving into `Received`. Each
/// entry is the cumulative received amount of that line; the applied delta is
/// the difference to what was already received. Without entries, a first
/// receipt is a full receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub status: DocumentStatus,
    pub received: Vec<ReceivedQuantity>,
}

impl TransitionRequest {
    pub fn to(status: DocumentStatus) -> Self {
        Self {
            status,
            received: Vec::new(),
        }
    }

    pub fn with_received(mut self, received: Vec<ReceivedQuantity>) -> Self {
        self.received = received;
        self
    }
}

/// One signed delta the engine must apply, in line-item order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub line_no: usize,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub delta: i64,
    pub from: Endpoint,
    pub to: Endpoint,
}

/// Result of planning: the document as it will look after the transition,
/// plus the stock moves that must commit together with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub document: MovementDocument,
    pub moves: Vec<PlannedMove>,
}

fn mismatch(doc: &MovementDocument, requested: DocumentStatus) -> MovementError {
    MovementError::InvalidTransition {
        kind: doc.kind(),
        from: doc.status().to_string(),
        to: requested.to_string(),
    }
}

/// Validate a transition and compute its stock effect.
///
/// Pure: the input document is not modified and nothing is applied. All
/// rejections happen here, before the engine touches any quantity.
pub fn plan_transition(
    doc: &MovementDocument,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, MovementError> {
    if request.status.kind() != doc.kind() {
        return Err(mismatch(doc, request.status));
    }
    if !request.received.is_empty()
        && request.status != DocumentStatus::Receipt(ReceiptStatus::Received)
    {
        return Err(MovementError::validation(
            "received quantities only apply to receipts moving to Received",
        ));
    }

    let mut document = doc.clone();
    let moves = match (document.body_mut(), request.status) {
        (DocumentBody::Receipt(receipt), DocumentStatus::Receipt(to)) => {
            ensure_transition(receipt.status, to)?;
            let moves = if to == ReceiptStatus::Received {
                let first = receipt.status != ReceiptStatus::Received;
                let endpoint = Endpoint::Supplier(receipt.supplier.clone());
                receive_lines(
                    &mut receipt.items,
                    &request.received,
                    first,
                    receipt.warehouse_id,
                    endpoint,
                )?
            } else {
                Vec::new()
            };
            receipt.status = to;
            moves
        }
        (DocumentBody::Delivery(delivery), DocumentStatus::Delivery(to)) => {
            ensure_transition(delivery.status, to)?;
            let moves = if to == DeliveryStatus::Dispatched {
                let warehouse_id = delivery.warehouse_id;
                let customer = delivery.customer.clone();
                ship_lines(&mut delivery.items, |line_no, line| PlannedMove {
                    line_no,
                    product_id: line.product_id,
                    warehouse_id,
                    delta: -line.quantity,
                    from: Endpoint::Warehouse(warehouse_id),
                    to: Endpoint::Customer(customer.clone()),
                })
            } else {
                Vec::new()
            };
            delivery.status = to;
            moves
        }
        (DocumentBody::Transfer(transfer), DocumentStatus::Transfer(to)) => {
            ensure_transition(transfer.status, to)?;
            let source = transfer.from_warehouse;
            let destination = transfer.to_warehouse;
            let moves = match to {
                TransferStatus::InTransit => ship_lines(&mut transfer.items, |line_no, line| {
                    PlannedMove {
                        line_no,
                        product_id: line.product_id,
                        warehouse_id: source,
                        delta: -line.quantity,
                        from: Endpoint::Warehouse(source),
                        to: Endpoint::Transit,
                    }
                }),
                TransferStatus::Completed => transfer
                    .items
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| line.fulfilled > 0)
                    .map(|(line_no, line)| PlannedMove {
                        line_no,
                        product_id: line.product_id,
                        warehouse_id: destination,
                        delta: line.fulfilled,
                        from: Endpoint::Transit,
                        to: Endpoint::Warehouse(destination),
                    })
                    .collect(),
                _ => Vec::new(),
            };
            transfer.status = to;
            moves
        }
        (DocumentBody::Adjustment(adjustment), DocumentStatus::Adjustment(to)) => {
            ensure_transition(adjustment.status, to)?;
            Vec::new()
        }
        _ => return Err(mismatch(doc, request.status)),
    };

    document.touch(now);
    Ok(TransitionPlan { document, moves })
}

/// Mark every line as fully processed and emit one move per line.
fn ship_lines(
    items: &mut [LineItem],
    mut to_move: impl FnMut(usize, &LineItem) -> PlannedMove,
) -> Vec<PlannedMove> {
    items
        .iter_mut()
        .enumerate()
        .map(|(line_no, line)| {
            line.fulfilled = line.quantity;
            to_move(line_no, line)
        })
        .collect()
}

fn receive_lines(
    items: &mut [LineItem],
    received: &[ReceivedQuantity],
    first_receipt: bool,
    warehouse_id: WarehouseId,
    supplier: Endpoint,
) -> Result<Vec<PlannedMove>, MovementError> {
    let mut cumulative: BTreeMap<ProductId, i64> = BTreeMap::new();
    for entry in received {
        if !items.iter().any(|l| l.product_id == entry.product_id) {
            return Err(MovementError::validation(format!(
                "product {} is not on this receipt",
                entry.product_id
            )));
        }
        if cumulative.insert(entry.product_id, entry.received).is_some() {
            return Err(MovementError::validation(format!(
                "product {} is listed twice in received quantities",
                entry.product_id
            )));
        }
    }

    let mut moves = Vec::new();
    for (line_no, line) in items.iter_mut().enumerate() {
        let target = match cumulative.get(&line.product_id) {
            Some(qty) => *qty,
            None if received.is_empty() && first_receipt => line.quantity,
            None => line.fulfilled,
        };
        if target < line.fulfilled || target > line.quantity {
            return Err(MovementError::validation(format!(
                "received quantity {target} for product {} must be between {} and {}",
                line.product_id, line.fulfilled, line.quantity
            )));
        }

        let delta = target - line.fulfilled;
        line.fulfilled = target;
        if delta > 0 {
            moves.push(PlannedMove {
                line_no,
                product_id: line.product_id,
                warehouse_id,
                delta,
                from: supplier.clone(),
                to: Endpoint::Warehouse(warehouse_id),
            });
        }
    }

    if moves.is_empty() {
        return Err(MovementError::validation("receipt transition receives no new quantity"));
    }
    Ok(moves)
}

/// Build an adjustment and its single stock move.
///
/// `location_qty` is the current quantity of the product at the warehouse; it
/// stands in for the system quantity when the input does not carry one. A zero
/// difference yields no move.
pub fn plan_adjustment(
    id: DocumentId,
    number: DocumentNumber,
    input: NewAdjustment,
    location_qty: i64,
    performed_by: ActingPrincipal,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, MovementError> {
    let system_qty = input.system_qty.unwrap_or(location_qty);
    let (product_id, warehouse_id) = (input.product_id, input.warehouse_id);
    let document = MovementDocument::adjustment(id, number, input, system_qty, performed_by, now)?;

    let difference = match document.body() {
        DocumentBody::Adjustment(a) => a.difference,
        _ => 0,
    };
    let moves = if difference == 0 {
        Vec::new()
    } else {
        let (from, to) = if difference > 0 {
            (Endpoint::Adjustment, Endpoint::Warehouse(warehouse_id))
        } else {
            (Endpoint::Warehouse(warehouse_id), Endpoint::Adjustment)
        };
        vec![PlannedMove {
            line_no: 0,
            product_id,
            warehouse_id,
            delta: difference,
            from,
            to,
        }]
    };

    Ok(TransitionPlan { document, moves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NewDelivery, NewLine, NewReceipt, NewTransfer};

    fn principal() -> ActingPrincipal {
        ActingPrincipal::new("clerk").unwrap()
    }

    fn receipt(lines: &[(ProductId, i64)], status: ReceiptStatus) -> MovementDocument {
        MovementDocument::receipt(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Receipt, 1),
            NewReceipt {
                number: None,
                supplier: "Acme".to_string(),
                warehouse_id: WarehouseId::new(),
                date: None,
                status: Some(status),
                items: lines
                    .iter()
                    .map(|(p, q)| NewLine { product_id: *p, quantity: *q })
                    .collect(),
                notes: None,
            },
            principal(),
            Utc::now(),
        )
        .unwrap()
    }

    fn delivery(product_id: ProductId, qty: i64) -> MovementDocument {
        MovementDocument::delivery(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Delivery, 1),
            NewDelivery {
                number: None,
                customer: "Initech".to_string(),
                warehouse_id: WarehouseId::new(),
                date: None,
                status: Some(DeliveryStatus::Pending),
                items: vec![NewLine { product_id, quantity: qty }],
                notes: None,
            },
            principal(),
            Utc::now(),
        )
        .unwrap()
    }

    fn transfer(product_id: ProductId, qty: i64) -> (MovementDocument, WarehouseId, WarehouseId) {
        let (a, b) = (WarehouseId::new(), WarehouseId::new());
        let doc = MovementDocument::transfer(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Transfer, 1),
            NewTransfer {
                number: None,
                from_warehouse: a,
                to_warehouse: b,
                reason: "rebalance".to_string(),
                date: None,
                status: Some(TransferStatus::Pending),
                items: vec![NewLine { product_id, quantity: qty }],
                notes: None,
            },
            principal(),
            Utc::now(),
        )
        .unwrap();
        (doc, a, b)
    }

    fn receipt_to(status: ReceiptStatus) -> TransitionRequest {
        TransitionRequest::to(DocumentStatus::Receipt(status))
    }

    #[test]
    fn edge_tables() {
        use ReceiptStatus as R;
        assert!(R::Draft.can_transition_to(R::Pending));
        assert!(R::Pending.can_transition_to(R::Received));
        assert!(R::Received.can_transition_to(R::Done));
        assert!(R::Pending.can_transition_to(R::Cancelled));
        assert!(!R::Received.can_transition_to(R::Cancelled));
        assert!(R::Done.is_terminal() && R::Cancelled.is_terminal());

        use DeliveryStatus as D;
        assert!(D::Pending.can_transition_to(D::Dispatched));
        assert!(!D::Draft.can_transition_to(D::Dispatched));
        assert!(!D::Dispatched.can_transition_to(D::Cancelled));
        assert!(D::Delivered.is_terminal());

        use TransferStatus as T;
        assert!(T::Pending.can_transition_to(T::InTransit));
        assert!(T::InTransit.can_transition_to(T::Completed));
        assert!(!T::InTransit.can_transition_to(T::Cancelled));
        assert!(!T::Pending.can_transition_to(T::Completed));

        assert!(AdjustmentStatus::Recorded.is_terminal());
    }

    #[test]
    fn full_receipt_moves_every_line_into_the_warehouse() {
        let p = ProductId::new();
        let doc = receipt(&[(p, 20)], ReceiptStatus::Pending);
        let plan = plan_transition(&doc, &receipt_to(ReceiptStatus::Received), Utc::now()).unwrap();

        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].delta, 20);
        assert_eq!(plan.moves[0].product_id, p);
        assert_eq!(plan.document.items()[0].fulfilled, 20);
        assert_eq!(plan.document.status(), DocumentStatus::Receipt(ReceiptStatus::Received));
        // planning never mutates the input
        assert_eq!(doc.items()[0].fulfilled, 0);
    }

    #[test]
    fn repeated_partial_receipts_apply_only_the_new_amount() {
        let p = ProductId::new();
        let doc = receipt(&[(p, 20)], ReceiptStatus::Pending);

        let first = plan_transition(
            &doc,
            &receipt_to(ReceiptStatus::Received)
                .with_received(vec![ReceivedQuantity { product_id: p, received: 12 }]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(first.moves[0].delta, 12);

        let second = plan_transition(
            &first.document,
            &receipt_to(ReceiptStatus::Received)
                .with_received(vec![ReceivedQuantity { product_id: p, received: 20 }]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(second.moves[0].delta, 8);
        assert_eq!(second.document.items()[0].fulfilled, 20);
    }

    #[test]
    fn receipt_rejects_shrinking_or_overshooting_quantities() {
        let p = ProductId::new();
        let doc = receipt(&[(p, 10)], ReceiptStatus::Pending);
        let over = receipt_to(ReceiptStatus::Received)
            .with_received(vec![ReceivedQuantity { product_id: p, received: 11 }]);
        assert!(matches!(
            plan_transition(&doc, &over, Utc::now()),
            Err(MovementError::Validation(_))
        ));

        let partial = plan_transition(
            &doc,
            &receipt_to(ReceiptStatus::Received)
                .with_received(vec![ReceivedQuantity { product_id: p, received: 6 }]),
            Utc::now(),
        )
        .unwrap();
        let shrink = receipt_to(ReceiptStatus::Received)
            .with_received(vec![ReceivedQuantity { product_id: p, received: 4 }]);
        assert!(matches!(
            plan_transition(&partial.document, &shrink, Utc::now()),
            Err(MovementError::Validation(_))
        ));
    }

    #[test]
    fn received_again_without_new_quantity_is_rejected() {
        let p = ProductId::new();
        let doc = receipt(&[(p, 10)], ReceiptStatus::Pending);
        let received = plan_transition(&doc, &receipt_to(ReceiptStatus::Received), Utc::now()).unwrap();
        let again = plan_transition(&received.document, &receipt_to(ReceiptStatus::Received), Utc::now());
        assert!(matches!(again, Err(MovementError::Validation(_))));
    }

    #[test]
    fn unreceived_lines_produce_no_move() {
        let (p, q) = (ProductId::new(), ProductId::new());
        let doc = receipt(&[(p, 5), (q, 7)], ReceiptStatus::Draft);
        let plan = plan_transition(
            &doc,
            &receipt_to(ReceiptStatus::Received)
                .with_received(vec![ReceivedQuantity { product_id: q, received: 7 }]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].line_no, 1);
        assert_eq!(plan.document.items()[0].fulfilled, 0);
    }

    #[test]
    fn received_entries_on_other_transitions_are_rejected() {
        let p = ProductId::new();
        let doc = receipt(&[(p, 5)], ReceiptStatus::Draft);
        let req = receipt_to(ReceiptStatus::Pending)
            .with_received(vec![ReceivedQuantity { product_id: p, received: 5 }]);
        assert!(matches!(
            plan_transition(&doc, &req, Utc::now()),
            Err(MovementError::Validation(_))
        ));
    }

    #[test]
    fn dispatch_deducts_and_delivery_is_status_only() {
        let p = ProductId::new();
        let doc = delivery(p, 5);
        let dispatched = plan_transition(
            &doc,
            &TransitionRequest::to(DocumentStatus::Delivery(DeliveryStatus::Dispatched)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(dispatched.moves.len(), 1);
        assert_eq!(dispatched.moves[0].delta, -5);
        assert!(matches!(dispatched.moves[0].to, Endpoint::Customer(ref c) if c == "Initech"));

        let delivered = plan_transition(
            &dispatched.document,
            &TransitionRequest::to(DocumentStatus::Delivery(DeliveryStatus::Delivered)),
            Utc::now(),
        )
        .unwrap();
        assert!(delivered.moves.is_empty());
    }

    #[test]
    fn transfer_leaves_source_then_arrives_at_destination() {
        let p = ProductId::new();
        let (doc, a, b) = transfer(p, 10);
        let shipped = plan_transition(
            &doc,
            &TransitionRequest::to(DocumentStatus::Transfer(TransferStatus::InTransit)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(shipped.moves[0].warehouse_id, a);
        assert_eq!(shipped.moves[0].delta, -10);
        assert_eq!(shipped.moves[0].to, Endpoint::Transit);

        let completed = plan_transition(
            &shipped.document,
            &TransitionRequest::to(DocumentStatus::Transfer(TransferStatus::Completed)),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(completed.moves[0].warehouse_id, b);
        assert_eq!(completed.moves[0].delta, 10);
        assert_eq!(completed.moves[0].from, Endpoint::Transit);
    }

    #[test]
    fn illegal_edge_reports_both_statuses() {
        let (doc, _, _) = transfer(ProductId::new(), 1);
        let err = plan_transition(
            &doc,
            &TransitionRequest::to(DocumentStatus::Transfer(TransferStatus::Completed)),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            MovementError::InvalidTransition {
                kind: MovementKind::Transfer,
                from: "Pending".to_string(),
                to: "Completed".to_string(),
            }
        );
    }

    #[test]
    fn status_of_another_type_is_an_invalid_transition() {
        let doc = delivery(ProductId::new(), 1);
        let err = plan_transition(&doc, &receipt_to(ReceiptStatus::Received), Utc::now()).unwrap_err();
        assert!(matches!(err, MovementError::InvalidTransition { .. }));
    }

    #[test]
    fn adjustment_difference_drives_a_single_move() {
        let (p, wh) = (ProductId::new(), WarehouseId::new());
        let input = NewAdjustment {
            number: None,
            product_id: p,
            warehouse_id: wh,
            system_qty: Some(10),
            counted_qty: 8,
            reason: "cycle count".to_string(),
            date: None,
            notes: None,
        };
        let plan = plan_adjustment(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Adjustment, 1),
            input.clone(),
            10,
            principal(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.moves[0].delta, -2);
        assert_eq!(plan.moves[0].to, Endpoint::Adjustment);

        let unchanged = plan_adjustment(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Adjustment, 2),
            NewAdjustment { system_qty: None, counted_qty: 4, ..input },
            4,
            principal(),
            Utc::now(),
        )
        .unwrap();
        assert!(unchanged.moves.is_empty());
    }

    #[test]
    fn adjustment_rejects_negative_counts() {
        let input = NewAdjustment {
            number: None,
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            system_qty: Some(1),
            counted_qty: -1,
            reason: "recount".to_string(),
            date: None,
            notes: None,
        };
        let res = plan_adjustment(
            DocumentId::new(),
            DocumentNumber::generate(MovementKind::Adjustment, 1),
            input,
            1,
            principal(),
            Utc::now(),
        );
        assert!(matches!(res, Err(MovementError::Validation(_))));
    }
}
