//! Read projections and pagination

use serde::{Deserialize, Serialize};

use crate::charge::FolioCharge;
use crate::error::BillingError;
use crate::folio::Folio;
use crate::invoice::Invoice;
use crate::payment::Payment;
use crate::ports::{GuestSummary, ReservationSummary};

/// A folio with its charges and, for hotel folios, the stay it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioDetail {
    pub folio: Folio,
    pub charges: Vec<FolioCharge>,
    pub reservation: Option<ReservationSummary>,
    pub guest: Option<GuestSummary>,
}

/// Everything a renderer needs to print or e-mail an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub reservation: Option<ReservationSummary>,
    pub guest: Option<GuestSummary>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, BillingError> {
        if page == 0 {
            return Err(BillingError::InvalidInput("page starts at 1".into()));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(BillingError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit.max(1));
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}
