use super::payout::SkipReason;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaymentMethod {
    Ach,
    Wire,
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACH" => Ok(Self::Ach),
            "Wire" => Ok(Self::Wire),
            _ => Err(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EligibilityResult {
    pub eligible: bool,
    pub reason: Option<SkipReason>,
    pub message: String,
}

impl EligibilityResult {
    fn pass() -> Self {
        Self {
            eligible: true,
            reason: None,
            message: String::new(),
        }
    }

    fn skip(reason: SkipReason, message: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: Some(reason),
            message: message.into(),
        }
    }
}

/// Decides whether a payout may be sent to the provider.
///
/// Checks run in a fixed order and the first failure wins. An existing
/// payment order outranks every other violation.
pub fn check_eligibility(
    payment_method: Option<&str>,
    amount: Option<Decimal>,
    external_account_id: Option<&str>,
    country: Option<&str>,
    existing_order_id: Option<&str>,
) -> EligibilityResult {
    if let Some(order_id) = existing_order_id.filter(|id| !id.is_empty()) {
        return EligibilityResult::skip(
            SkipReason::ExistingPaymentOrder,
            format!("Payment order already exists: {order_id}"),
        );
    }

    if payment_method.and_then(|m| m.parse::<PaymentMethod>().ok()).is_none() {
        return EligibilityResult::skip(
            SkipReason::InvalidMethod,
            format!("Invalid payment method: {}", payment_method.unwrap_or("none")),
        );
    }

    if amount.is_none_or(|a| a <= Decimal::ZERO) {
        let shown = amount.map_or_else(|| "none".to_string(), |a| a.to_string());
        return EligibilityResult::skip(
            SkipReason::InvalidAmount,
            format!("Invalid amount: {shown}"),
        );
    }

    if external_account_id.is_none_or(str::is_empty) {
        return EligibilityResult::skip(
            SkipReason::MissingExternalAccount,
            "No external bank account on file",
        );
    }

    if country.is_none_or(str::is_empty) {
        return EligibilityResult::skip(SkipReason::MissingCountry, "Missing country code");
    }

    EligibilityResult::pass()
}
