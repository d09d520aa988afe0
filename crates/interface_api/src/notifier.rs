//! Invoice notifier used until a rendering service is wired in
//!
//! Logs the invoice that would be rendered and e-mailed.

use async_trait::async_trait;
use tracing::info;

use core_kernel::{DomainPort, PortError};
use domain_billing::{InvoiceDetail, InvoiceNotifier};

#[derive(Debug, Clone, Default)]
pub struct TracingInvoiceNotifier;

impl DomainPort for TracingInvoiceNotifier {}

#[async_trait]
impl InvoiceNotifier for TracingInvoiceNotifier {
    async fn render_and_send(&self, detail: &InvoiceDetail) -> Result<(), PortError> {
        let recipient = detail
            .guest
            .as_ref()
            .and_then(|g| g.email.as_deref())
            .unwrap_or("walk-in");
        info!(
            invoice_number = %detail.invoice.invoice_number,
            total = %detail.invoice.total_amount,
            items = detail.invoice.items.len(),
            payments = detail.payments.len(),
            recipient,
            "Invoice ready for rendering"
        );
        Ok(())
    }
}
