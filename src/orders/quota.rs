// Quota ledger
//
// Consumption is never stored: it is the SUM of order line quantities, read on
// the admission transaction after the campaign row lock is taken.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use utoipa::ToSchema;

use crate::campaigns::Campaign;
use crate::customers::CustomerNumber;
use crate::models::Country;

/// Which cap an order would overshoot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuotaScope {
    Global,
    PerCustomer,
}

impl QuotaScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaScope::Global => "global",
            QuotaScope::PerCustomer => "per_customer",
        }
    }
}

impl std::fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign caps, `None` meaning unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaLimits {
    pub global: Option<i64>,
    pub per_customer: Option<i64>,
}

impl QuotaLimits {
    pub fn of(campaign: &Campaign) -> Self {
        Self {
            global: campaign.global_quota.map(i64::from),
            per_customer: campaign.quota_per_customer.map(i64::from),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.global.is_none() && self.per_customer.is_none()
    }
}

/// Units already consumed on a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaUsage {
    pub global: i64,
    pub customer: i64,
}

pub struct QuotaLedger;

impl QuotaLedger {
    /// Accept or reject `proposed` more units, global cap first
    pub fn check(limits: QuotaLimits, usage: QuotaUsage, proposed: i64) -> Result<(), QuotaScope> {
        if let Some(cap) = limits.global {
            if usage.global.saturating_add(proposed) > cap {
                return Err(QuotaScope::Global);
            }
        }
        if let Some(cap) = limits.per_customer {
            if usage.customer.saturating_add(proposed) > cap {
                return Err(QuotaScope::PerCustomer);
            }
        }
        Ok(())
    }

    /// Read current consumption on the caller's connection
    ///
    /// Must run inside the admission transaction, after the campaign row is locked.
    pub async fn load_usage(
        conn: &mut PgConnection,
        campaign_id: i32,
        customer_number: &CustomerNumber,
        country: Country,
    ) -> Result<QuotaUsage, sqlx::Error> {
        let (global, customer) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(l.quantity), 0)::BIGINT,
                COALESCE(SUM(l.quantity) FILTER (
                    WHERE o.customer_number = $2 AND o.customer_country = $3
                ), 0)::BIGINT
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE o.campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(customer_number.as_str())
        .bind(country)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!(
            "Quota usage on campaign {}: global={}, {}={}",
            campaign_id,
            global,
            customer_number,
            customer
        );

        Ok(QuotaUsage { global, customer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits(global: Option<i64>, per_customer: Option<i64>) -> QuotaLimits {
        QuotaLimits { global, per_customer }
    }

    #[test]
    fn test_unlimited_accepts_anything() {
        let usage = QuotaUsage { global: 1_000_000, customer: 1_000 };
        assert!(QuotaLedger::check(QuotaLimits::default(), usage, 5_000).is_ok());
        assert!(QuotaLimits::default().is_unlimited());
    }

    #[test]
    fn test_global_cap_is_inclusive() {
        let usage = QuotaUsage { global: 40, customer: 0 };
        assert!(QuotaLedger::check(limits(Some(100), None), usage, 60).is_ok());
        assert_eq!(
            QuotaLedger::check(limits(Some(100), None), usage, 61),
            Err(QuotaScope::Global)
        );
    }

    #[test]
    fn test_per_customer_cap() {
        let usage = QuotaUsage { global: 10, customer: 10 };
        assert_eq!(
            QuotaLedger::check(limits(None, Some(10)), usage, 1),
            Err(QuotaScope::PerCustomer)
        );
        let other_customer = QuotaUsage { global: 10, customer: 0 };
        assert!(QuotaLedger::check(limits(None, Some(10)), other_customer, 10).is_ok());
    }

    #[test]
    fn test_global_reported_before_per_customer() {
        let usage = QuotaUsage { global: 100, customer: 10 };
        assert_eq!(
            QuotaLedger::check(limits(Some(100), Some(10)), usage, 1),
            Err(QuotaScope::Global)
        );
    }

    #[test]
    fn test_scope_serialization() {
        assert_eq!(serde_json::to_string(&QuotaScope::PerCustomer).unwrap(), "\"per_customer\"");
    }

    proptest! {
        #[test]
        fn prop_accepted_orders_stay_within_caps(
            global in proptest::option::of(1i64..10_000),
            per_customer in proptest::option::of(1i64..1_000),
            used_global in 0i64..10_000,
            used_customer in 0i64..1_000,
            proposed in 1i64..2_000,
        ) {
            let limits = limits(global, per_customer);
            let usage = QuotaUsage { global: used_global, customer: used_customer };
            if QuotaLedger::check(limits, usage, proposed).is_ok() {
                if let Some(cap) = global {
                    prop_assert!(used_global + proposed <= cap);
                }
                if let Some(cap) = per_customer {
                    prop_assert!(used_customer + proposed <= cap);
                }
            }
        }

        #[test]
        fn prop_sequential_admissions_never_overshoot(
            cap in 1i64..500,
            requests in proptest::collection::vec(1i64..100, 1..40),
        ) {
            let limits = limits(Some(cap), None);
            let mut consumed = 0i64;
            for proposed in requests {
                let usage = QuotaUsage { global: consumed, customer: 0 };
                if QuotaLedger::check(limits, usage, proposed).is_ok() {
                    consumed += proposed;
                }
            }
            prop_assert!(consumed <= cap);
        }
    }
}
