//! Folio opening, charge posting and reconciliation

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument};

use core_kernel::{ChargeId, FolioId, GuestId, OrderId, ReservationId, RoomId, UserId};

use super::{finish, required, BillingService};
use crate::audit::{AuditAction, AuditEntry};
use crate::charge::{ChargeInput, ChargeSource, FolioCharge, SourceType};
use crate::error::BillingError;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::ports::{LedgerTransaction, RoomSummary};
use crate::producers::{adjustment, room_stay};
use crate::reconcile::FolioTotals;

impl BillingService {
    /// Opens the hotel folio for a reservation
    ///
    /// Idempotent: returns the existing folio when the reservation already
    /// has one.
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` when the reservation is unknown, `InvalidInput`
    /// when `guest_id` is not the reservation's guest.
    #[instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub async fn create_folio(
        &self,
        reservation_id: ReservationId,
        guest_id: GuestId,
        actor: UserId,
    ) -> Result<Folio, BillingError> {
        let reservation = required(
            self.directory.reservation(reservation_id).await,
            "Reservation",
            reservation_id,
        )?;
        if reservation.guest_id != guest_id {
            return Err(BillingError::InvalidInput(format!(
                "guest {} does not hold reservation {}",
                guest_id, reservation_id
            )));
        }
        self.open_folio(FolioOwner::Reservation(reservation_id), Some(guest_id), actor)
            .await
    }

    /// Opens the restaurant folio for an order; idempotent like `create_folio`
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn open_restaurant_folio(
        &self,
        order_id: OrderId,
        guest_id: Option<GuestId>,
        actor: UserId,
    ) -> Result<Folio, BillingError> {
        self.open_folio(FolioOwner::RestaurantOrder(order_id), guest_id, actor)
            .await
    }

    async fn open_folio(
        &self,
        owner: FolioOwner,
        guest_id: Option<GuestId>,
        actor: UserId,
    ) -> Result<Folio, BillingError> {
        let mut tx = self.begin().await?;
        let result = self.open_folio_tx(tx.as_mut(), owner, guest_id, actor).await;
        match finish(tx, result).await {
            Err(e) if e.is_retryable_conflict() => {
                // Lost a race with a concurrent open of the same owner
                let mut tx = self.begin().await?;
                let existing = tx.folio_by_owner(owner).await;
                let existing = finish(tx, existing.map_err(BillingError::from)).await?;
                existing.ok_or(e)
            }
            other => other,
        }
    }

    pub(super) async fn open_folio_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        owner: FolioOwner,
        guest_id: Option<GuestId>,
        actor: UserId,
    ) -> Result<Folio, BillingError> {
        if let Some(existing) = tx.lock_folio_by_owner(owner).await? {
            return Ok(existing);
        }
        let folio = Folio::open(owner, guest_id, self.currency());
        tx.insert_folio(&folio).await?;
        tx.record_audit(
            &AuditEntry::new(actor, AuditAction::FolioOpened, "folio", folio.id)
                .with_details(json!({ "owner": owner, "guest_id": guest_id })),
        )
        .await?;
        info!(folio_id = %folio.id, %owner, "Folio opened");
        Ok(folio)
    }

    /// Posts a charge and reconciles the folio in one transaction
    ///
    /// # Errors
    ///
    /// `FolioNotFound`, `FolioClosed`, or a validation error from the input.
    #[instrument(skip(self, input), fields(folio_id = %folio_id, charge_type = ?input.charge_type))]
    pub async fn post_charge(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        input: ChargeInput,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        input.validate()?;
        let mut tx = self.begin().await?;
        let result = self.post_charge_tx(tx.as_mut(), kind, folio_id, input, actor).await;
        finish(tx, result).await
    }

    async fn post_charge_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        folio_id: FolioId,
        input: ChargeInput,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let mut folio = tx
            .lock_folio(kind, folio_id)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(folio_id.to_string()))?;
        let charge = self.post_locked(tx, &folio, input, actor).await?;
        self.reconcile_locked(tx, &mut folio).await?;
        Ok(charge)
    }

    /// Posts an ad-hoc service, amenity or correction charge
    pub async fn post_service_charge(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        input: ChargeInput,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let input = adjustment::service_charge(input)?;
        self.post_charge(kind, folio_id, input, actor).await
    }

    /// Posts a non-taxable refund of `amount` (a positive figure)
    pub async fn post_refund(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        amount: Decimal,
        description: &str,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let source = ChargeSource::new(SourceType::Manual, folio_id);
        let input = adjustment::refund(amount, description, Some(source))?;
        self.post_charge(kind, folio_id, input, actor).await
    }

    /// Reverses one earlier charge
    ///
    /// # Errors
    ///
    /// `ChargeNotFound` when the charge is not on the folio, `InvalidState`
    /// when it is a reversal or was already reversed.
    #[instrument(skip(self, reason), fields(folio_id = %folio_id, charge_id = %charge_id))]
    pub async fn reverse_charge(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
        charge_id: ChargeId,
        reason: Option<String>,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let mut tx = self.begin().await?;
        let result = self
            .reverse_charge_tx(tx.as_mut(), kind, folio_id, charge_id, reason.as_deref(), actor)
            .await;
        finish(tx, result).await
    }

    async fn reverse_charge_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        folio_id: FolioId,
        charge_id: ChargeId,
        reason: Option<&str>,
        actor: UserId,
    ) -> Result<FolioCharge, BillingError> {
        let mut folio = tx
            .lock_folio(kind, folio_id)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(folio_id.to_string()))?;
        let charges = tx.list_charges(kind, folio_id).await?;
        let original = charges
            .iter()
            .find(|c| c.id == charge_id)
            .ok_or_else(|| BillingError::ChargeNotFound(charge_id.to_string()))?;
        if charges.iter().any(|c| c.reverses_charge_id == Some(charge_id)) {
            return Err(BillingError::InvalidState(format!(
                "charge {} has already been reversed",
                charge_id
            )));
        }

        let reversal = self.reverse_locked(tx, &folio, original, actor, reason).await?;
        self.reconcile_locked(tx, &mut folio).await?;
        Ok(reversal)
    }

    /// Posts (or re-posts) the room charges of a reservation
    ///
    /// Rooms whose nights and rate are unchanged since the last run are left
    /// alone; changed rooms have their outstanding charges reversed and
    /// reposted. Returns every charge written.
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` for an unknown reservation or room (checked before
    /// any write), `FolioNotFound` when the reservation has no folio.
    #[instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub async fn post_room_stay_charges(
        &self,
        reservation_id: ReservationId,
        actor: UserId,
    ) -> Result<Vec<FolioCharge>, BillingError> {
        let reservation = required(
            self.directory.reservation(reservation_id).await,
            "Reservation",
            reservation_id,
        )?;
        let mut rooms: Vec<RoomSummary> = Vec::with_capacity(reservation.room_ids.len());
        for room_id in &reservation.room_ids {
            rooms.push(required(self.directory.room(*room_id).await, "Room", room_id)?);
        }
        let rate = self.standard_rate(reservation.check_in)?;
        let inputs = room_stay::room_stay_charges(&reservation, &rooms, rate)?;

        let mut tx = self.begin().await?;
        let result = self
            .post_room_stay_tx(tx.as_mut(), reservation_id, &rooms, inputs, actor)
            .await;
        let written = finish(tx, result).await?;
        info!(count = written.len(), "Room stay charges posted");
        Ok(written)
    }

    async fn post_room_stay_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        reservation_id: ReservationId,
        rooms: &[RoomSummary],
        inputs: Vec<ChargeInput>,
        actor: UserId,
    ) -> Result<Vec<FolioCharge>, BillingError> {
        let owner = FolioOwner::Reservation(reservation_id);
        let mut folio = tx
            .lock_folio_by_owner(owner)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(owner.to_string()))?;

        let mut written = Vec::new();
        for (room, input) in rooms.iter().zip(inputs) {
            let source = room_source(room.id);
            written.extend(
                self.replace_source_charges(tx, &folio, source, vec![input], actor)
                    .await?,
            );
        }
        if !written.is_empty() {
            self.reconcile_locked(tx, &mut folio).await?;
        }
        Ok(written)
    }

    /// Recomputes and stores a folio's totals
    ///
    /// Safe to call repeatedly; with no intervening writes the result is the
    /// same every time.
    #[instrument(skip(self), fields(folio_id = %folio_id))]
    pub async fn recompute_totals(
        &self,
        kind: LedgerKind,
        folio_id: FolioId,
    ) -> Result<FolioTotals, BillingError> {
        let mut tx = self.begin().await?;
        let result = self.recompute_totals_tx(tx.as_mut(), kind, folio_id).await;
        finish(tx, result).await
    }

    async fn recompute_totals_tx(
        &self,
        tx: &mut dyn LedgerTransaction,
        kind: LedgerKind,
        folio_id: FolioId,
    ) -> Result<FolioTotals, BillingError> {
        let mut folio = tx
            .lock_folio(kind, folio_id)
            .await?
            .ok_or_else(|| BillingError::FolioNotFound(folio_id.to_string()))?;
        self.reconcile_locked(tx, &mut folio).await
    }
}

fn room_source(room_id: RoomId) -> ChargeSource {
    ChargeSource::new(SourceType::RoomStay, room_id)
}

