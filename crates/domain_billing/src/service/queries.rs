//! Read projections

use tracing::instrument;

use core_kernel::{FolioId, GuestId, InvoiceId, OrderId, ReservationId};

use super::{finish, optional, BillingService};
use crate::charge::FolioCharge;
use crate::detail::{FolioDetail, InvoiceDetail, Page, PageRequest};
use crate::error::BillingError;
use crate::folio::{Folio, FolioOwner, LedgerKind};
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::ports::{GuestSummary, LedgerTransaction, ReservationSummary};

impl BillingService {
    /// A folio with its charges
    #[instrument(skip(self), fields(kind = kind.as_str(), folio_id = %folio_id))]
    pub async fn get_folio(&self, kind: LedgerKind, folio_id: FolioId) -> Result<FolioDetail, BillingError> {
        let mut tx = self.begin().await?;
        let result = folio_with_charges(tx.as_mut(), kind, folio_id).await;
        let (folio, charges) = finish(tx, result).await?;
        self.folio_detail(folio, charges).await
    }

    /// The hotel folio of a reservation, with the reservation and guest
    #[instrument(skip(self), fields(reservation_id = %reservation_id))]
    pub async fn get_folio_by_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<FolioDetail, BillingError> {
        self.owner_folio_detail(FolioOwner::Reservation(reservation_id)).await
    }

    /// The restaurant folio of an order
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_restaurant_folio(&self, order_id: OrderId) -> Result<FolioDetail, BillingError> {
        self.owner_folio_detail(FolioOwner::RestaurantOrder(order_id)).await
    }

    async fn owner_folio_detail(&self, owner: FolioOwner) -> Result<FolioDetail, BillingError> {
        let mut tx = self.begin().await?;
        let result = owner_folio_with_charges(tx.as_mut(), owner).await;
        let (folio, charges) = finish(tx, result).await?;
        self.folio_detail(folio, charges).await
    }

    /// An invoice with its items, payments, reservation and guest
    ///
    /// This is the input contract of the PDF and e-mail collaborators.
    #[instrument(skip(self), fields(kind = kind.as_str(), invoice_id = %invoice_id))]
    pub async fn get_invoice_details(
        &self,
        kind: LedgerKind,
        invoice_id: InvoiceId,
    ) -> Result<InvoiceDetail, BillingError> {
        let mut tx = self.begin().await?;
        let result = invoice_with_payments(tx.as_mut(), kind, invoice_id).await;
        let (invoice, payments) = finish(tx, result).await?;

        let reservation = self.reservation_of(invoice.owner).await?;
        let guest = self.guest_of(invoice.guest_id).await?;
        Ok(InvoiceDetail {
            invoice,
            payments,
            reservation,
            guest,
        })
    }

    /// A guest's payments on one ledger, newest first
    #[instrument(skip(self), fields(kind = kind.as_str(), guest_id = %guest_id, page = request.page))]
    pub async fn get_guest_payment_history(
        &self,
        kind: LedgerKind,
        guest_id: GuestId,
        request: PageRequest,
    ) -> Result<Page<Payment>, BillingError> {
        let request = PageRequest::new(request.page, request.limit)?;
        let mut tx = self.begin().await?;
        let result = tx
            .list_guest_payments(kind, guest_id, request.limit, request.offset())
            .await
            .map_err(BillingError::from);
        let (payments, total) = finish(tx, result).await?;
        Ok(Page::new(payments, request, total))
    }

    async fn folio_detail(
        &self,
        folio: Folio,
        charges: Vec<FolioCharge>,
    ) -> Result<FolioDetail, BillingError> {
        let reservation = self.reservation_of(folio.owner).await?;
        let guest = self.guest_of(folio.guest_id).await?;
        Ok(FolioDetail {
            folio,
            charges,
            reservation,
            guest,
        })
    }

    async fn reservation_of(&self, owner: FolioOwner) -> Result<Option<ReservationSummary>, BillingError> {
        match owner.reservation_id() {
            Some(id) => optional(self.directory.reservation(id).await),
            None => Ok(None),
        }
    }

    async fn guest_of(&self, guest_id: Option<GuestId>) -> Result<Option<GuestSummary>, BillingError> {
        match guest_id {
            Some(id) => optional(self.directory.guest(id).await),
            None => Ok(None),
        }
    }
}

async fn folio_with_charges(
    tx: &mut dyn LedgerTransaction,
    kind: LedgerKind,
    folio_id: FolioId,
) -> Result<(Folio, Vec<FolioCharge>), BillingError> {
    let folio = tx
        .folio(kind, folio_id)
        .await?
        .ok_or_else(|| BillingError::FolioNotFound(folio_id.to_string()))?;
    let charges = tx.list_charges(kind, folio_id).await?;
    Ok((folio, charges))
}

async fn owner_folio_with_charges(
    tx: &mut dyn LedgerTransaction,
    owner: FolioOwner,
) -> Result<(Folio, Vec<FolioCharge>), BillingError> {
    let folio = tx
        .folio_by_owner(owner)
        .await?
        .ok_or_else(|| BillingError::FolioNotFound(owner.to_string()))?;
    let charges = tx.list_charges(folio.kind(), folio.id).await?;
    Ok((folio, charges))
}

async fn invoice_with_payments(
    tx: &mut dyn LedgerTransaction,
    kind: LedgerKind,
    invoice_id: InvoiceId,
) -> Result<(Invoice, Vec<Payment>), BillingError> {
    let invoice = tx
        .invoice(kind, invoice_id)
        .await?
        .ok_or_else(|| BillingError::InvoiceNotFound(invoice_id.to_string()))?;
    let payments = tx.list_invoice_payments(kind, invoice_id).await?;
    Ok((invoice, payments))
}
