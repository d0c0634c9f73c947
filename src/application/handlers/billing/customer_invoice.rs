//! Event-family handler for customer and invoice events.
//!
//! Customer updates upsert directly. Invoices resolve their product (fatal)
//! and their customer; a customer seen for the first time on an invoice is
//! created from the invoice's customer fields rather than rejected, matching
//! the lazy first-sight lifecycle of customer rows.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::billing::{
    apply_policy, CustomerPayload, EventFamilyHandler, EventKind, IngestOutcome, InvoicePayload,
    ReferencePolicy, Resolved, StripeEvent, WebhookError,
};
use crate::ports::{CustomerRow, CustomerStore, InvoiceStore, ProductStore};

const HANDLED_KINDS: &[EventKind] = &[
    EventKind::CustomerUpdated,
    EventKind::InvoiceCreated,
    EventKind::InvoiceUpdated,
];

/// Handles `customer.updated` and `invoice.*` events.
pub struct CustomerInvoiceHandler {
    customers: Arc<dyn CustomerStore>,
    products: Arc<dyn ProductStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl CustomerInvoiceHandler {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        products: Arc<dyn ProductStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            customers,
            products,
            invoices,
        }
    }

    async fn apply_customer(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        let payload = CustomerPayload::decode(&event.data.object)?;
        let row = self.customers.upsert(payload.record()).await?;
        tracing::info!(customer_id = %row.id, stripe_id = %row.stripe_id, "customer synchronized");
        Ok(IngestOutcome::written("customer", row.stripe_id))
    }

    async fn apply_invoice(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        let payload = InvoicePayload::decode(&event.data.object)?;

        let found = self.products.find_by_stripe_id(&payload.product_id).await?;
        let product = match apply_policy(
            found,
            ReferencePolicy::Fatal,
            "product",
            &payload.product_id,
        )? {
            Resolved::Found(product) => product,
            Resolved::SkipWrite(reason) => return Ok(IngestOutcome::Skipped { reason }),
        };

        let customer = self.resolve_invoice_customer(&payload).await?;

        let row = self.invoices.upsert(payload.record(product.id, customer.id)).await?;
        tracing::info!(
            invoice_id = %row.id,
            stripe_id = %row.stripe_id,
            status = %row.status,
            "invoice synchronized"
        );
        Ok(IngestOutcome::written("invoice", row.stripe_id))
    }

    /// Resolves the billed customer, creating the row on first sight.
    ///
    /// Lookup order: Stripe id, then email (rows created before the Stripe id
    /// was known), then creation from the invoice's own customer fields.
    async fn resolve_invoice_customer(
        &self,
        payload: &InvoicePayload,
    ) -> Result<CustomerRow, WebhookError> {
        if let Some(customer) = self.customers.find_by_stripe_id(&payload.customer).await? {
            return Ok(customer);
        }

        if let Some(email) = &payload.customer_email {
            if let Some(customer) = self.customers.find_by_email(email).await? {
                return Ok(customer);
            }
        }

        tracing::info!(stripe_id = %payload.customer, "creating customer on first sight of invoice");
        Ok(self.customers.upsert(payload.customer_record()).await?)
    }
}

#[async_trait]
impl EventFamilyHandler for CustomerInvoiceHandler {
    fn family(&self) -> &'static str {
        "customer-invoice"
    }

    fn handles(&self) -> &'static [EventKind] {
        HANDLED_KINDS
    }

    async fn apply(&self, event: &StripeEvent) -> Result<IngestOutcome, WebhookError> {
        match event.kind() {
            EventKind::CustomerUpdated => self.apply_customer(event).await,
            EventKind::InvoiceCreated | EventKind::InvoiceUpdated => {
                self.apply_invoice(event).await
            }
            _ => Ok(IngestOutcome::Ignored {
                event_type: event.event_type.clone(),
            }),
        }
    }
}
