//! Restaurant orders on the restaurant and hotel ledgers
//!
//! An order always has its own restaurant folio. A hotel guest's order is
//! also carried on the reservation's hotel folio as one consolidated,
//! untaxed line, so the hotel invoice stays the single bill for the stay.
//! Both folios are located by the `(RestaurantOrder, order_id)` source tag;
//! an update reverses whatever changed and posts the new lines, and a
//! cancellation reverses everything still outstanding. A hotel folio the
//! order no longer targets (the order was re-tagged as a walk-in or moved to
//! another stay) has its lines for the order reversed.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use core_kernel::UserId;

use super::{finish, required, BillingService};
use crate::audit::{AuditAction, AuditEntry};
use crate::charge::{ChargeInput, ChargeSource, FolioCharge, SourceType};
use crate::error::BillingError;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::invoice::Invoice;
use crate::ports::LedgerTransaction;
use crate::producers::restaurant::{price_order, GuestType, OrderPricing, PricedLine, RestaurantOrder};

/// What a sync or cancellation wrote
#[derive(Debug, Clone, Serialize)]
pub struct OrderPosting {
    /// Absent for cancellations
    pub pricing: Option<OrderPricing>,
    pub restaurant_folio: Option<Folio>,
    /// Present when the order was carried to a hotel folio
    pub hotel_folio: Option<Folio>,
    /// Reversals and new charges, in posting order
    pub written: Vec<FolioCharge>,
}

impl BillingService {
    /// Posts a created or updated order to its folios
    ///
    /// Menu items and variants are resolved before the transaction opens;
    /// an unknown item fails with `ReferenceNotFound`, an unavailable one or
    /// a variant of another item with `InvalidInput`. A hotel guest's order
    /// needs a known reservation whose guest matches the order's.
    #[instrument(skip(self, order), fields(order_id = %order.id, guest_type = ?order.guest_type))]
    pub async fn sync_restaurant_order(
        &self,
        order: &RestaurantOrder,
        actor: UserId,
    ) -> Result<OrderPosting, BillingError> {
        order.validate()?;
        self.check_order_guest(order).await?;
        let lines = self.resolve_lines(order).await?;
        let tax_percent = match order.tax_percent {
            Some(rate) => rate,
            None => self.standard_rate(Utc::now())?,
        };
        let pricing = price_order(order, lines, tax_percent, self.currency())?;

        let restaurant_lines = pricing.restaurant_folio_charges();
        let hotel_lines = pricing.hotel_folio_charges();

        let mut tx = self.begin().await?;
        let result = self
            .post_order_tx(tx.as_mut(), order, restaurant_lines, hotel_lines, true, actor)
            .await;
        let (restaurant_folio, hotel_folio, written) = finish(tx, result).await?;

        info!(total = %pricing.total, written = written.len(), "Restaurant order synced");
        Ok(OrderPosting {
            pricing: Some(pricing),
            restaurant_folio,
            hotel_folio,
            written,
        })
    }

    /// Reverses every outstanding charge an order put on either folio
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn cancel_restaurant_order(
        &self,
        order: &RestaurantOrder,
        actor: UserId,
    ) -> Result<OrderPosting, BillingError> {
        let mut tx = self.begin().await?;
        let result = self
            .post_order_tx(tx.as_mut(), order, Vec::new(), Vec::new(), false, actor)
            .await;
        let (restaurant_folio, hotel_folio, written) = finish(tx, result).await?;

        info!(reversed = written.len(), "Restaurant order cancelled");
        Ok(OrderPosting {
            pricing: None,
            restaurant_folio,
            hotel_folio,
            written,
        })
    }

    /// Invoices a walk-in order on the restaurant ledger
    ///
    /// # Errors
    ///
    /// `InvalidState` for hotel guests, whose orders settle on the hotel
    /// invoice; `FolioNotFound` when the order was never synced.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn bill_restaurant_order(
        &self,
        order: &RestaurantOrder,
        actor: UserId,
    ) -> Result<Invoice, BillingError> {
        if order.guest_type == GuestType::HotelGuest {
            return Err(BillingError::InvalidState(format!(
                "order {} belongs to a hotel stay and is billed on the hotel invoice",
                order.id
            )));
        }
        let owner = FolioOwner::RestaurantOrder(order.id);
        let mut tx = self.begin().await?;
        let result = tx.folio_by_owner(owner).await.map_err(BillingError::from);
        let folio = finish(tx, result)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(owner.to_string()))?;
        self.generate_invoice(LedgerKind::Restaurant, folio.id, actor).await
    }

    /// A hotel guest's order must name the reservation's own guest
    async fn check_order_guest(&self, order: &RestaurantOrder) -> Result<(), BillingError> {
        let (GuestType::HotelGuest, Some(reservation_id)) = (order.guest_type, order.reservation_id) else {
            return Ok(());
        };
        let reservation = required(
            self.directory.reservation(reservation_id).await,
            "Reservation",
            reservation_id,
        )?;
        match order.guest_id {
            Some(guest_id) if guest_id != reservation.guest_id => Err(BillingError::InvalidInput(format!(
                "guest {} is not the guest of reservation {}",
                guest_id, reservation_id
            ))),
            _ => Ok(()),
        }
    }

    async fn resolve_lines(&self, order: &RestaurantOrder) -> Result<Vec<PricedLine>, BillingError> {
        let mut priced = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let item = required(self.menu.menu_item(line.menu_item_id).await, "MenuItem", line.menu_item_id)?;
            if !item.is_available {
                return Err(BillingError::InvalidInput(format!("{} is not available", item.name)));
            }
            let variant_price = match line.variant_id {
                Some(variant_id) => {
                    let variant = required(self.menu.variant(variant_id).await, "Variant", variant_id)?;
                    if variant.menu_item_id != item.id {
                        return Err(BillingError::InvalidInput(format!(
                            "variant {} is not a variant of {}",
                            variant.name, item.name
                        )));
                    }
                    variant.price_delta
                }
                None => Decimal::ZERO,
            };
            priced.push(PricedLine {
                menu_item_id: item.id,
                name: item.name,
                unit_price: item.price,
                variant_price,
                quantity: line.quantity,
            });
        }
        Ok(priced)
    }

    /// Brings both folios of an order in line with the given lines
    ///
    /// With `open_missing` unset a missing restaurant folio means there is
    /// nothing to reverse.
    async fn post_order_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        order: &RestaurantOrder,
        restaurant_lines: Vec<ChargeInput>,
        hotel_lines: Vec<ChargeInput>,
        open_missing: bool,
        actor: UserId,
    ) -> Result<(Option<Folio>, Option<Folio>, Vec<FolioCharge>), BillingError> {
        let source = ChargeSource::new(SourceType::RestaurantOrder, order.id);
        let mut written = Vec::new();

        let restaurant_owner = FolioOwner::RestaurantOrder(order.id);
        let restaurant_folio = if open_missing {
            Some(self.open_folio_tx(tx, restaurant_owner, order.guest_id, actor).await?)
        } else {
            tx.lock_folio_by_owner(restaurant_owner).await?
        };
        let restaurant_folio = match restaurant_folio {
            Some(mut folio) => {
                let posted = self
                    .replace_source_charges(tx, &folio, source, restaurant_lines, actor)
                    .await?;
                self.reconcile_locked(tx, &mut folio).await?;
                written.extend(posted);
                Some(folio)
            }
            None => None,
        };

        // Every hotel folio the order was ever carried to, plus the one it
        // targets now, locked in id order
        let target = match (order.guest_type, order.reservation_id) {
            (GuestType::HotelGuest, Some(reservation_id)) => tx
                .folio_by_owner(FolioOwner::Reservation(reservation_id))
                .await?
                .map(|f| f.id),
            _ => None,
        };
        let mut hotel_ids = tx.folios_with_source(LedgerKind::Hotel, source).await?;
        if let Some(id) = target {
            if !hotel_ids.contains(&id) {
                hotel_ids.push(id);
            }
        }
        hotel_ids.sort_by_key(|id| *id.as_uuid());

        let mut hotel_lines = Some(hotel_lines);
        let mut hotel_folio = None;
        for id in hotel_ids {
            let Some(mut folio) = tx.lock_folio(LedgerKind::Hotel, id).await? else {
                continue;
            };
            let is_target = target == Some(id);
            let desired = if is_target {
                hotel_lines.take().unwrap_or_default()
            } else {
                Vec::new()
            };
            let posted = self
                .replace_source_charges(tx, &folio, source, desired, actor)
                .await?;
            if !posted.is_empty() {
                self.reconcile_locked(tx, &mut folio).await?;
            }
            written.extend(posted);
            if is_target {
                hotel_folio = Some(folio);
            }
        }

        let action = if open_missing {
            AuditAction::OrderSynced
        } else {
            AuditAction::OrderCancelled
        };
        tx.record_audit(
            &AuditEntry::new(actor, action, "restaurant_order", order.id).with_details(json!({
                "restaurant_folio_id": restaurant_folio.as_ref().map(|f| f.id),
                "hotel_folio_id": hotel_folio.as_ref().map(|f| f.id),
                "charges_written": written.len(),
            })),
        )
        .await?;

        Ok((restaurant_folio, hotel_folio, written))
    }
}
