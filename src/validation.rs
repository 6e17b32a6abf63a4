// Validation utilities module
// Cross-field rules that the field-level validator attributes cannot express

use rust_decimal::Decimal;
use validator::ValidationError;

use crate::campaigns::{AssignmentMode, CampaignForm};
use crate::customers::CustomerList;

fn rule(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Campaign invariants checked on create and update
///
/// - internal name and both titles are not blank once trimmed
/// - `end_date >= start_date`
/// - protected mode needs a non-empty password
/// - deferred delivery needs a delivery date
/// - manual mode needs a list with at least one valid number and no malformed entry
pub fn validate_campaign_form(form: &CampaignForm) -> Result<(), ValidationError> {
    for (field, value) in [("name", &form.name), ("title_fr", &form.title_fr), ("title_nl", &form.title_nl)] {
        if value.trim().is_empty() {
            return Err(rule("blank_text", format!("{} must not be blank", field)));
        }
    }

    if form.end_date < form.start_date {
        return Err(rule(
            "end_before_start",
            "End date must be on or after the start date".to_string(),
        ));
    }

    if form.customer_assignment_mode == AssignmentMode::Protected
        && form.order_password.as_deref().map_or(true, |p| p.is_empty())
    {
        return Err(rule(
            "password_required",
            "A password is required for protected campaigns".to_string(),
        ));
    }

    if form.deferred_delivery && form.delivery_date.is_none() {
        return Err(rule(
            "delivery_date_required",
            "A delivery date is required when delivery is deferred".to_string(),
        ));
    }

    if form.customer_assignment_mode == AssignmentMode::Manual {
        validate_customer_list(form.customer_list.as_deref().unwrap_or(""))?;
    }

    Ok(())
}

/// Product prices are informative only but never negative
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Manual customer lists must parse completely
pub fn validate_customer_list(text: &str) -> Result<(), ValidationError> {
    let list = CustomerList::parse(text);

    if !list.rejected().is_empty() {
        return Err(rule(
            "customer_list_invalid",
            format!("Invalid customer numbers: {}", list.rejected().join(", ")),
        ));
    }
    if list.is_empty() {
        return Err(rule(
            "customer_list_empty",
            "The customer list must contain at least one customer number".to_string(),
        ));
    }

    Ok(())
}
