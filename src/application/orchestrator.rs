//! Run orchestrator: one idempotent batch over every recipient of an event.
//!
//! Each payout goes eligibility → routing → provider call, with an audit entry
//! at every transition. The run row and its `run_started` entry are committed
//! first; every other mutation is committed as one unit at the end, so a crash
//! mid-run leaves the run `running` and no payout changes behind.

use super::audit::{AuditTrail, append_note};
use super::event_lock::EventLocks;
use super::retry::{RetryError, RetryPolicy, with_retry};
use crate::domain::audit::AuditAction;
use crate::domain::eligibility::check_eligibility;
use crate::domain::event::LiquidationEvent;
use crate::domain::money::{per_recipient_share, to_minor_units};
use crate::domain::payout::{Payout, PayoutOutcome, PayoutStatus, Run, RunTally, SkipReason};
use crate::domain::ports::{ChangeSet, PaymentProviderRef, PayoutFilter, PayoutStoreRef};
use crate::domain::provider::{
    ORIGINATING_ACCOUNT, PaymentOrderRequest, PaymentOrderResponse, ProviderError,
};
use crate::domain::routing::{RailDecision, select_rail};
use crate::error::Result;
use futures::FutureExt;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;

const STATEMENT_DESCRIPTOR_LEN: usize = 10;

pub struct PayoutOrchestrator {
    store: PayoutStoreRef,
    provider: PaymentProviderRef,
    retry: RetryPolicy,
    locks: EventLocks,
}

impl PayoutOrchestrator {
    pub fn new(store: PayoutStoreRef, provider: PaymentProviderRef) -> Self {
        Self {
            store,
            provider,
            retry: RetryPolicy::default(),
            locks: EventLocks::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shares per-event locks with other orchestrators over the same store.
    pub fn with_event_locks(mut self, locks: EventLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Creates a run for `event_id` and drives every payout of the event.
    ///
    /// Only a missing event fails the run; failed payouts still complete it.
    /// Errors returned here come from the store, not from payouts.
    pub async fn execute_run(&self, event_id: &str) -> Result<Run> {
        let _guard = self.locks.acquire(event_id).await;

        let mut run = Run::start(event_id);
        let mut audit = AuditTrail::new();
        audit.record(
            AuditAction::RunStarted,
            Some(run.id),
            None,
            Some(json!({ "event_id": event_id })),
        );
        self.store
            .commit(ChangeSet {
                runs: vec![run.clone()],
                payouts: Vec::new(),
                audit_entries: audit.take(),
            })
            .await?;

        let Some(event) = self.store.get_event(event_id).await? else {
            tracing::warn!(run = %run.id, event_id, "liquidation event not found");
            run.fail();
            audit.record(
                AuditAction::RunFailed,
                Some(run.id),
                None,
                Some(json!({ "error": format!("Liquidation event not found: {event_id}") })),
            );
            self.store
                .commit(ChangeSet {
                    runs: vec![run.clone()],
                    payouts: Vec::new(),
                    audit_entries: audit.take(),
                })
                .await?;
            return Ok(run);
        };

        let mut payouts = self.load_payouts(&run, &event).await?;
        tracing::info!(run = %run.id, event_id, payouts = payouts.len(), "processing payouts");

        let mut tally = RunTally::default();
        for payout in payouts.iter_mut() {
            let before = payout.clone();
            let outcome = self.process_payout(&run, &event, payout, &mut audit).await;
            if *payout != before {
                payout.touch();
            }
            tally.record(outcome);
        }

        run.complete(tally);
        audit.record(
            AuditAction::RunCompleted,
            Some(run.id),
            None,
            Some(json!({
                "created": run.created_count,
                "skipped": run.skipped_count,
                "failed": run.failed_count,
                "skip_breakdown": run.skip_breakdown,
            })),
        );
        tracing::info!(
            run = %run.id,
            created = run.created_count,
            skipped = run.skipped_count,
            failed = run.failed_count,
            skip_breakdown = %format_breakdown(&run.skip_breakdown),
            "run summary"
        );

        self.store
            .commit(ChangeSet {
                runs: vec![run.clone()],
                payouts,
                audit_entries: audit.take(),
            })
            .await?;
        Ok(run)
    }

    /// One payout per recipient, in recipient-id order.
    ///
    /// Unsettled payouts from earlier runs are attached to `run` and have
    /// their stale routing and skip outputs cleared.
    async fn load_payouts(&self, run: &Run, event: &LiquidationEvent) -> Result<Vec<Payout>> {
        let recipients = self.store.list_recipients().await?;
        let mut existing: HashMap<String, Payout> = self
            .store
            .find_payouts(&PayoutFilter::for_event(&event.id))
            .await?
            .into_iter()
            .map(|p| (p.recipient_id.clone(), p))
            .collect();

        let share = per_recipient_share(event.total_amount, recipients.len());
        let payouts = recipients
            .iter()
            .map(|recipient| match existing.remove(&recipient.id) {
                Some(mut payout) => {
                    if !payout.status.is_settled() {
                        payout.run_id = Some(run.id);
                        payout.clear_attempt_outputs();
                    }
                    payout
                }
                None => Payout::for_recipient(run.id, &event.id, recipient, share),
            })
            .collect();
        Ok(payouts)
    }

    async fn process_payout(
        &self,
        run: &Run,
        event: &LiquidationEvent,
        payout: &mut Payout,
        audit: &mut AuditTrail,
    ) -> PayoutOutcome {
        let check = check_eligibility(
            payout.payment_method.as_deref(),
            Some(payout.amount),
            payout.external_account_id.as_deref(),
            payout.country.as_deref(),
            payout.payment_order_id.as_deref(),
        );
        if let Some(reason) = check.reason {
            payout.status = PayoutStatus::Skipped;
            payout.skip_reason = Some(reason);
            payout.notes = Some(append_note(
                payout.notes.as_deref(),
                &format!("Skipped: {}", check.message),
            ));
            audit.record(
                AuditAction::EligibilityFailed,
                Some(run.id),
                Some(payout.id),
                Some(json!({ "reason": reason, "message": check.message })),
            );
            return PayoutOutcome::Skipped(reason);
        }
        payout.status = PayoutStatus::Eligible;

        let rail = select_rail(
            payout.country.as_deref(),
            payout.payment_method.as_deref(),
            payout.has_us_bank_account,
        );
        payout.apply_rail(&rail);
        audit.record(
            AuditAction::RailSelected,
            Some(run.id),
            Some(payout.id),
            Some(json!({
                "country": payout.country,
                "rail": rail.rail_type,
                "subtype": rail.subtype,
                "currency": rail.currency,
                "fx": rail.fx_indicator,
                "label": rail.label,
            })),
        );

        let Some(request) = build_order_request(payout, event, &rail) else {
            let error = format!("amount {} cannot be expressed in cents", payout.amount);
            return fail(
                run,
                payout,
                audit,
                AuditAction::PaymentFailedUnexpected,
                format!("Unexpected error: {error}"),
                json!({ "error": error }),
            );
        };

        payout.status = PayoutStatus::Processing;
        match self.submit(&request).await {
            Ok(response) => {
                payout.payment_order_id = Some(response.order_id.clone());
                payout.status = PayoutStatus::Completed;
                payout.notes = Some(append_note(
                    payout.notes.as_deref(),
                    &format!("Payment order created: {}", response.order_id),
                ));
                audit.record(
                    AuditAction::PaymentCreated,
                    Some(run.id),
                    Some(payout.id),
                    Some(json!({
                        "payment_order_id": response.order_id,
                        "provider": response.provider,
                        "type": rail.rail_type,
                        "currency": rail.currency,
                        "amount": payout.amount,
                    })),
                );
                PayoutOutcome::Created
            }
            Err(RetryError::Permanent(e)) => fail(
                run,
                payout,
                audit,
                AuditAction::PaymentFailedPermanent,
                format!("Permanent failure: {e}"),
                json!({ "error": e.to_string(), "status_code": e.status_code() }),
            ),
            Err(RetryError::Exhausted { attempts, last }) => fail(
                run,
                payout,
                audit,
                AuditAction::PaymentFailedRetriesExhausted,
                format!("Provider error after retries: {last}"),
                json!({
                    "error": last.to_string(),
                    "status_code": last.status_code(),
                    "attempts": attempts,
                }),
            ),
            Err(RetryError::Unexpected(e)) => fail(
                run,
                payout,
                audit,
                AuditAction::PaymentFailedUnexpected,
                format!("Unexpected error: {e}"),
                json!({ "error": e.to_string() }),
            ),
        }
    }

    /// Provider call through the retry wrapper. A panicking provider is
    /// reported as an unexpected failure instead of unwinding the run.
    async fn submit(
        &self,
        request: &PaymentOrderRequest,
    ) -> std::result::Result<PaymentOrderResponse, RetryError> {
        let provider = self.provider.as_ref();
        let call = with_retry(&self.retry, move || provider.submit_order(request));
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(RetryError::Unexpected(ProviderError::Unexpected(
                panic_message(panic).into(),
            ))),
        }
    }
}

fn fail(
    run: &Run,
    payout: &mut Payout,
    audit: &mut AuditTrail,
    action: AuditAction,
    note: String,
    details: Value,
) -> PayoutOutcome {
    payout.status = PayoutStatus::Failed;
    payout.notes = Some(append_note(payout.notes.as_deref(), &note));
    audit.record(action, Some(run.id), Some(payout.id), Some(details));
    PayoutOutcome::Failed
}

/// Builds the provider order for a routed payout. `None` if the amount does
/// not fit in integer cents.
pub fn build_order_request(
    payout: &Payout,
    event: &LiquidationEvent,
    rail: &RailDecision,
) -> Option<PaymentOrderRequest> {
    let amount_cents = to_minor_units(payout.amount)?;
    let mut metadata = BTreeMap::new();
    metadata.insert("event_id".to_string(), payout.event_id.clone());
    metadata.insert("investor_id".to_string(), payout.recipient_id.clone());
    metadata.insert(
        "country".to_string(),
        payout.country.clone().unwrap_or_default(),
    );

    Some(PaymentOrderRequest {
        rail_type: rail.rail_type,
        subtype: rail.subtype.map(str::to_string),
        amount_cents,
        currency: rail.currency.to_string(),
        direction: "credit".to_string(),
        originating_account_id: ORIGINATING_ACCOUNT.to_string(),
        receiving_account_id: payout.external_account_id.clone().unwrap_or_default(),
        effective_date: event.payout_date,
        description: format!(
            "Payout to {}",
            payout.recipient_name.as_deref().unwrap_or(&payout.recipient_id)
        ),
        statement_descriptor: payout
            .recipient_id
            .chars()
            .take(STATEMENT_DESCRIPTOR_LEN)
            .collect(),
        purpose: rail.purpose.map(str::to_string),
        fx_indicator: rail.fx_indicator,
        metadata,
    })
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("provider panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("provider panicked: {s}")
    } else {
        "provider panicked".to_string()
    }
}

fn format_breakdown(breakdown: &BTreeMap<SkipReason, u32>) -> String {
    if breakdown.is_empty() {
        return "none".to_string();
    }
    breakdown
        .iter()
        .map(|(reason, count)| format!("{reason}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
