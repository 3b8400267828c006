#![allow(dead_code)]

use chrono::NaiveDate;
use payout_engine::application::orchestrator::PayoutOrchestrator;
use payout_engine::application::retry::RetryPolicy;
use payout_engine::domain::event::{LiquidationEvent, Recipient};
use payout_engine::domain::payout::Payout;
use payout_engine::domain::ports::{PaymentProviderRef, PayoutFilter, PayoutStoreRef};
use payout_engine::infrastructure::in_memory::InMemoryPayoutStore;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

pub const EVENT_ID: &str = "LIQ-TEST-001";

/// Eight recipients covering every rail and two skip reasons.
pub fn recipients() -> Vec<Recipient> {
    vec![
        Recipient::new("INV-001", "John Smith")
            .with_country("US")
            .with_method("ACH")
            .with_account("ext_us_001"),
        Recipient::new("INV-010", "Hans Mueller")
            .with_country("DE")
            .with_method("ACH")
            .with_account("ext_de_001"),
        Recipient::new("INV-030", "James Thompson")
            .with_country("GB")
            .with_method("ACH")
            .with_account("ext_gb_001"),
        Recipient::new("INV-038", "Yuki Tanaka")
            .with_country("JP")
            .with_method("ACH")
            .with_account("ext_jp_001"),
        Recipient::new("INV-050", "Kenji Watanabe")
            .with_country("JP")
            .with_method("ACH")
            .with_account("ext_jp_wise")
            .with_us_bank_account(),
        Recipient::new("INV-052", "Omar Al-Rashid")
            .with_country("AE")
            .with_method("Wire")
            .with_account("ext_ae_001"),
        Recipient::new("INV-060", "Ghost Investor")
            .with_country("US")
            .with_method("ACH"),
        Recipient::new("INV-061", "Crypto Only")
            .with_country("US")
            .with_method("Crypto")
            .with_account("ext_c_001"),
    ]
}

pub fn event() -> LiquidationEvent {
    LiquidationEvent::new(EVENT_ID, "Test Liquidation", dec!(800000))
        .with_payout_date(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap())
}

pub async fn seeded_store() -> InMemoryPayoutStore {
    let store = InMemoryPayoutStore::new();
    seed(&store).await;
    store
}

pub async fn seed(store: &InMemoryPayoutStore) {
    use payout_engine::domain::ports::PayoutStore;
    for recipient in recipients() {
        store.save_recipient(recipient).await.unwrap();
    }
    store.save_event(event()).await.unwrap();
}

/// Orchestrator that never sleeps between retries.
pub fn orchestrator(store: PayoutStoreRef, provider: PaymentProviderRef) -> PayoutOrchestrator {
    PayoutOrchestrator::new(store, provider).with_retry_policy(RetryPolicy::immediate(6))
}

pub fn store_ref(store: &InMemoryPayoutStore) -> PayoutStoreRef {
    Arc::new(store.clone())
}

pub async fn payouts_by_recipient(store: &PayoutStoreRef) -> HashMap<String, Payout> {
    store
        .find_payouts(&PayoutFilter::for_event(EVENT_ID))
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.recipient_id.clone(), p))
        .collect()
}

pub fn write_recipients_csv(path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record([
        "id",
        "name",
        "country",
        "payment_method",
        "external_account_id",
        "has_us_bank_account",
    ])?;
    for r in recipients() {
        wtr.write_record([
            r.id.as_str(),
            r.name.as_str(),
            r.country.as_deref().unwrap_or_default(),
            r.payment_method.as_deref().unwrap_or_default(),
            r.external_account_id.as_deref().unwrap_or_default(),
            if r.has_us_bank_account { "1" } else { "0" },
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// `rows` US recipients with valid accounts, for load-style tests.
pub fn generate_recipients_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record([
        "id",
        "name",
        "country",
        "payment_method",
        "external_account_id",
        "has_us_bank_account",
    ])?;

    for i in 1..=rows {
        let id = format!("INV-{i:05}");
        let account = format!("ext_{i:05}");
        wtr.write_record([id.as_str(), "Bulk Recipient", "US", "ACH", account.as_str(), "0"])?;
    }

    wtr.flush()?;
    Ok(())
}
