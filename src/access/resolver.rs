// Campaign Access Resolver
//
// Decides whether a customer (or a representative acting for one) may open a
// campaign. Re-run on every catalog load, checkout preview and submission.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::access::{AccessDecision, AccessGrant, AccessRequest, Actor, DenyReason, PasswordCredential};
use crate::campaigns::{AssignmentMode, Campaign};
use crate::customers::{CustomerDirectory, CustomerList, CustomerNumber, DirectoryError};
use crate::models::Country;

/// Campaign-level checks that need no directory round-trip
///
/// Order: not open, then country, then the assignment mode rule. The password
/// of a protected campaign is checked before the customer is looked up, so a
/// wrong password is reported as such whatever the customer number.
pub fn evaluate_gate(
    campaign: &Campaign,
    number: &CustomerNumber,
    country: Country,
    password: Option<&PasswordCredential>,
    today: NaiveDate,
) -> Result<(), DenyReason> {
    check_open_and_country(campaign, country, today)?;

    match campaign.customer_assignment_mode {
        AssignmentMode::Automatic => Ok(()),
        AssignmentMode::Manual => {
            let list = CustomerList::parse(campaign.customer_list.as_deref().unwrap_or(""));
            if list.contains(number) {
                Ok(())
            } else {
                Err(DenyReason::NotInList)
            }
        }
        AssignmentMode::Protected => check_password(campaign, password),
    }
}

/// First two gate steps, shared with the prospect registration pre-check
pub fn check_open_and_country(campaign: &Campaign, country: Country, today: NaiveDate) -> Result<(), DenyReason> {
    if !campaign.is_open_on(today) {
        return Err(DenyReason::NotOpen);
    }
    if !campaign.country.admits(country) {
        return Err(DenyReason::CountryMismatch);
    }
    Ok(())
}

/// Shared-secret check of protected campaigns; other modes always pass
pub fn check_password(campaign: &Campaign, password: Option<&PasswordCredential>) -> Result<(), DenyReason> {
    if campaign.customer_assignment_mode != AssignmentMode::Protected {
        return Ok(());
    }
    match (campaign.order_password.as_deref(), password) {
        (Some(expected), Some(credential)) if !expected.is_empty() && credential.matches(expected) => Ok(()),
        _ => Err(DenyReason::BadPassword),
    }
}

/// Resolver combining the gate with the live customer directory
#[derive(Clone)]
pub struct AccessResolver {
    directory: Arc<dyn CustomerDirectory>,
}

impl AccessResolver {
    pub fn new(directory: Arc<dyn CustomerDirectory>) -> Self {
        Self { directory }
    }

    /// Decide on `request` for `campaign` as of `today`
    ///
    /// Directory failures are returned as errors, never as a denial.
    pub async fn resolve(
        &self,
        campaign: &Campaign,
        request: &AccessRequest,
        today: NaiveDate,
    ) -> Result<AccessDecision, DirectoryError> {
        if let Err(reason) = evaluate_gate(
            campaign,
            &request.customer_number,
            request.country,
            request.password.as_ref(),
            today,
        ) {
            tracing::debug!(
                "Gate denied {} on campaign {}: {}",
                request.customer_number,
                campaign.uuid,
                reason
            );
            return Ok(AccessDecision::Deny(reason));
        }

        let customer = match self.directory.find(&request.customer_number, request.country).await? {
            Some(customer) => customer,
            None => return Ok(AccessDecision::Deny(DenyReason::CustomerNotFound)),
        };

        if customer.is_prospect && !campaign.allow_prospects {
            return Ok(AccessDecision::Deny(DenyReason::ProspectsNotAllowed));
        }

        if let Actor::Representative { id, .. } = &request.actor {
            if customer.representative_id.as_deref() != Some(id.as_str()) {
                tracing::debug!(
                    "Representative {} acting for {} outside their portfolio",
                    id,
                    customer.customer_number
                );
            }
        }

        let language = request.language.or(customer.language).unwrap_or_default();

        Ok(AccessDecision::Allow(AccessGrant {
            customer,
            language,
            actor: request.actor.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaigns::fixtures;
    use crate::customers::{CustomerIdentity, InMemoryCustomerDirectory};
    use crate::i18n::Language;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()
    }

    fn number(raw: &str) -> CustomerNumber {
        CustomerNumber::parse(raw).unwrap()
    }

    fn identity(raw: &str, country: Country) -> CustomerIdentity {
        CustomerIdentity {
            customer_number: number(raw),
            country,
            name: format!("Customer {}", raw),
            representative_id: Some("R1".to_string()),
            representative_name: Some("Rep One".to_string()),
            cluster: Some("North".to_string()),
            language: Some(Language::Nl),
            is_prospect: number(raw).is_prospect(),
        }
    }

    async fn resolver_with(customers: &[(&str, Country)]) -> (AccessResolver, Arc<InMemoryCustomerDirectory>) {
        let directory = Arc::new(InMemoryCustomerDirectory::new());
        for (raw, country) in customers {
            directory.insert(identity(raw, *country)).await;
        }
        (AccessResolver::new(directory.clone()), directory)
    }

    fn request(raw: &str, country: Country, password: Option<&str>) -> AccessRequest {
        AccessRequest {
            customer_number: number(raw),
            country,
            password: password.map(|p| PasswordCredential::Plain(p.to_string())),
            language: None,
            actor: Actor::Customer,
        }
    }

    fn denial(decision: AccessDecision) -> Option<DenyReason> {
        match decision {
            AccessDecision::Deny(reason) => Some(reason),
            AccessDecision::Allow(_) => None,
        }
    }

    fn manual_campaign(country: Country) -> Campaign {
        let mut campaign = fixtures::campaign(today());
        campaign.country = country;
        campaign.customer_assignment_mode = AssignmentMode::Manual;
        campaign.customer_list = Some("123456\nE99999-CB".to_string());
        campaign
    }

    fn protected_campaign() -> Campaign {
        let mut campaign = fixtures::campaign(today());
        campaign.customer_assignment_mode = AssignmentMode::Protected;
        campaign.order_password = Some("Printemps2026".to_string());
        campaign
    }

    #[tokio::test]
    async fn test_manual_list_membership() {
        let (resolver, _) =
            resolver_with(&[("123456", Country::Be), ("000000", Country::Be), ("123456", Country::Lu)]).await;
        let campaign = manual_campaign(Country::Be);

        let allowed = resolver.resolve(&campaign, &request("123456", Country::Be, None), today()).await.unwrap();
        assert!(matches!(allowed, AccessDecision::Allow(_)));

        let outsider = resolver.resolve(&campaign, &request("000000", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(outsider), Some(DenyReason::NotInList));

        let lu_only = manual_campaign(Country::Lu);
        let wrong_country = resolver.resolve(&lu_only, &request("123456", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(wrong_country), Some(DenyReason::CountryMismatch));
    }

    #[tokio::test]
    async fn test_manual_list_matches_noisy_input() {
        let (resolver, _) = resolver_with(&[("E99999-CB", Country::Be)]).await;
        let campaign = manual_campaign(Country::Be);

        let decision = resolver
            .resolve(&campaign, &request(" e99999-cb ", Country::Be, None), today())
            .await
            .unwrap();
        assert!(matches!(decision, AccessDecision::Allow(_)));
    }

    #[tokio::test]
    async fn test_protected_password_rules() {
        let (resolver, _) = resolver_with(&[("123456", Country::Be)]).await;
        let campaign = protected_campaign();

        let ok = resolver
            .resolve(&campaign, &request("123456", Country::Be, Some("Printemps2026")), today())
            .await
            .unwrap();
        assert!(matches!(ok, AccessDecision::Allow(_)));

        let unknown = resolver
            .resolve(&campaign, &request("777777", Country::Be, Some("Printemps2026")), today())
            .await
            .unwrap();
        assert_eq!(denial(unknown), Some(DenyReason::CustomerNotFound));

        for (customer, password) in [("123456", Some("printemps2026")), ("777777", Some("wrong")), ("123456", None)] {
            let decision = resolver
                .resolve(&campaign, &request(customer, Country::Be, password), today())
                .await
                .unwrap();
            assert_eq!(denial(decision), Some(DenyReason::BadPassword));
        }
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_touch_directory() {
        let (resolver, directory) = resolver_with(&[]).await;
        directory.set_available(false);

        let decision = resolver
            .resolve(&protected_campaign(), &request("123456", Country::Be, Some("nope")), today())
            .await
            .unwrap();
        assert_eq!(denial(decision), Some(DenyReason::BadPassword));
    }

    #[tokio::test]
    async fn test_session_digest_is_accepted() {
        let (resolver, _) = resolver_with(&[("123456", Country::Be)]).await;
        let mut req = request("123456", Country::Be, None);
        req.password = Some(PasswordCredential::Digest(PasswordCredential::digest_of("Printemps2026")));

        let decision = resolver.resolve(&protected_campaign(), &req, today()).await.unwrap();
        assert!(matches!(decision, AccessDecision::Allow(_)));
    }

    #[tokio::test]
    async fn test_closed_campaign_is_denied_first() {
        let (resolver, _) = resolver_with(&[("123456", Country::Be)]).await;

        let mut disabled = manual_campaign(Country::Lu);
        disabled.is_active = false;
        let decision = resolver.resolve(&disabled, &request("999", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(decision), Some(DenyReason::NotOpen));

        let mut ended = fixtures::campaign(today());
        ended.end_date = today() - Duration::days(1);
        ended.start_date = today() - Duration::days(10);
        let decision = resolver.resolve(&ended, &request("123456", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(decision), Some(DenyReason::NotOpen));
    }

    #[tokio::test]
    async fn test_both_campaign_admits_either_country() {
        let (resolver, _) = resolver_with(&[("123456", Country::Lu)]).await;
        let mut campaign = fixtures::campaign(today());
        campaign.country = Country::Both;

        let decision = resolver.resolve(&campaign, &request("123456", Country::Lu, None), today()).await.unwrap();
        assert!(matches!(decision, AccessDecision::Allow(_)));

        let decision = resolver.resolve(&campaign, &request("123456", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(decision), Some(DenyReason::CustomerNotFound));
    }

    #[tokio::test]
    async fn test_directory_outage_is_an_error() {
        let (resolver, directory) = resolver_with(&[("123456", Country::Be)]).await;
        directory.set_available(false);

        let result = resolver
            .resolve(&fixtures::campaign(today()), &request("123456", Country::Be, None), today())
            .await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_prospects_need_campaign_opt_in() {
        let (resolver, _) = resolver_with(&[("*100001", Country::Be)]).await;
        let mut campaign = fixtures::campaign(today());

        let decision = resolver.resolve(&campaign, &request("*100001", Country::Be, None), today()).await.unwrap();
        assert_eq!(denial(decision), Some(DenyReason::ProspectsNotAllowed));

        campaign.allow_prospects = true;
        let decision = resolver.resolve(&campaign, &request("*100001", Country::Be, None), today()).await.unwrap();
        assert!(matches!(decision, AccessDecision::Allow(_)));
    }

    #[tokio::test]
    async fn test_language_preference_order() {
        let (resolver, _) = resolver_with(&[("123456", Country::Be)]).await;
        let campaign = fixtures::campaign(today());

        let from_directory = resolver.resolve(&campaign, &request("123456", Country::Be, None), today()).await.unwrap();
        match from_directory {
            AccessDecision::Allow(grant) => assert_eq!(grant.language, Language::Nl),
            other => panic!("expected allow, got {:?}", other),
        }

        let mut req = request("123456", Country::Be, None);
        req.language = Some(Language::Fr);
        match resolver.resolve(&campaign, &req, today()).await.unwrap() {
            AccessDecision::Allow(grant) => assert_eq!(grant.language, Language::Fr),
            other => panic!("expected allow, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_representative_gets_same_decision() {
        let (resolver, _) = resolver_with(&[("123456", Country::Be), ("000000", Country::Be)]).await;
        let campaign = manual_campaign(Country::Be);

        for raw in ["123456", "000000"] {
            let mut as_rep = request(raw, Country::Be, None);
            as_rep.actor = Actor::Representative { id: "R99".to_string(), name: "Other Rep".to_string() };

            let direct = denial(resolver.resolve(&campaign, &request(raw, Country::Be, None), today()).await.unwrap());
            let via_rep = denial(resolver.resolve(&campaign, &as_rep, today()).await.unwrap());
            assert_eq!(direct, via_rep);
        }
    }
}
