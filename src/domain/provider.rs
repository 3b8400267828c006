use super::routing::{FxIndicator, RailType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub const ORIGINATING_ACCOUNT: &str = "internal_usd_001";

/// A payment order as submitted to the provider.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentOrderRequest {
    pub rail_type: RailType,
    pub subtype: Option<String>,
    /// Fixed USD source amount in cents.
    pub amount_cents: i64,
    pub currency: String,
    pub direction: String,
    pub originating_account_id: String,
    pub receiving_account_id: String,
    pub effective_date: Option<NaiveDate>,
    pub description: String,
    pub statement_descriptor: String,
    pub purpose: Option<String>,
    pub fx_indicator: Option<FxIndicator>,
    pub metadata: BTreeMap<String, String>,
}

impl PaymentOrderRequest {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentOrderResponse {
    pub order_id: String,
    pub status: String,
    pub provider: String,
    pub message: String,
}

/// Failures a provider can report.
///
/// `RateLimited` and `Transient` are retried; `Permanent` never is.
/// `Unexpected` covers anything the provider adapter did not classify.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("{message}")]
    Transient { message: String, status_code: u16 },
    #[error("{message}")]
    Permanent { message: String, status_code: u16 },
    #[error("{0}")]
    Unexpected(Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    pub fn transient(message: impl Into<String>, status_code: u16) -> Self {
        Self::Transient {
            message: message.into(),
            status_code,
        }
    }

    pub fn permanent(message: impl Into<String>, status_code: u16) -> Self {
        Self::Permanent {
            message: message.into(),
            status_code,
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Transient { status_code, .. } | Self::Permanent { status_code, .. } => {
                Some(*status_code)
            }
            Self::Unexpected(_) => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
