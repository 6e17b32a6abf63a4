// Export signal for direct-processing campaigns
//
// The export itself (ERP file, mail) is an external collaborator. The portal
// only signals it once the order is committed.

use async_trait::async_trait;

use crate::campaigns::Campaign;
use crate::orders::{Order, OrderLine};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export dispatch failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ExportDispatcher: Send + Sync {
    async fn dispatch(&self, campaign: &Campaign, order: &Order, lines: &[OrderLine]) -> Result<(), ExportError>;
}

/// Emits a structured event picked up by the export pipeline's log shipper
#[derive(Debug, Default, Clone)]
pub struct TracingExportDispatcher;

#[async_trait]
impl ExportDispatcher for TracingExportDispatcher {
    async fn dispatch(&self, campaign: &Campaign, order: &Order, lines: &[OrderLine]) -> Result<(), ExportError> {
        tracing::info!(
            target: "promo_portal::export",
            order = %order.uuid,
            campaign = %campaign.uuid,
            campaign_type = ?campaign.campaign_type,
            customer = %order.customer_number,
            country = %order.customer_country,
            lines = lines.len(),
            total_items = order.total_items,
            delivery_date = ?campaign.delivery_date,
            "Order queued for export"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use uuid::Uuid;

    use super::*;

    /// Remembers dispatched orders; `fail` makes every dispatch error out
    #[derive(Debug, Default)]
    pub struct RecordingExportDispatcher {
        pub dispatched: Mutex<Vec<Uuid>>,
        pub fail: bool,
    }

    impl RecordingExportDispatcher {
        pub fn failing() -> Self {
            Self {
                dispatched: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn dispatched(&self) -> Vec<Uuid> {
            self.dispatched.lock().map(|v| v.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ExportDispatcher for RecordingExportDispatcher {
        async fn dispatch(&self, _campaign: &Campaign, order: &Order, _lines: &[OrderLine]) -> Result<(), ExportError> {
            if self.fail {
                return Err(ExportError::Failed("export endpoint refused the order".to_string()));
            }
            if let Ok(mut dispatched) = self.dispatched.lock() {
                dispatched.push(order.uuid);
            }
            Ok(())
        }
    }
}
