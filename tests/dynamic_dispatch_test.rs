mod common;

use payout_engine::application::queries::PayoutQueries;
use payout_engine::domain::audit::AuditDetails;
use payout_engine::domain::ports::{PaymentProviderRef, PayoutFilter, PayoutStoreRef};
use payout_engine::domain::payout::PayoutStatus;
use payout_engine::infrastructure::in_memory::InMemoryPayoutStore;
use payout_engine::infrastructure::scripted_provider::ScriptedProvider;
use payout_engine::infrastructure::simulated_provider::SimulatedProvider;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let store: PayoutStoreRef = Arc::new(InMemoryPayoutStore::new());
    let provider: PaymentProviderRef = Arc::new(SimulatedProvider::new(0.0, Duration::ZERO));

    // Verify Send + Sync by spawning tasks
    let store_handle = tokio::spawn({
        let store = store.clone();
        async move {
            for recipient in common::recipients() {
                store.save_recipient(recipient).await.unwrap();
            }
            store.save_event(common::event()).await.unwrap();
            store.list_recipients().await.unwrap().len()
        }
    });
    assert_eq!(store_handle.await.unwrap(), 8);

    let run_handle = tokio::spawn({
        let orch = common::orchestrator(store.clone(), provider);
        async move { orch.execute_run(common::EVENT_ID).await.unwrap() }
    });
    let run = run_handle.await.unwrap();
    assert_eq!(run.created_count, 6);
}

#[tokio::test]
async fn test_queries_report_and_trace() {
    let store = common::store_ref(&common::seeded_store().await);
    let run = common::orchestrator(store.clone(), Arc::new(ScriptedProvider::new()))
        .execute_run(common::EVENT_ID)
        .await
        .unwrap();

    let queries = PayoutQueries::new(store);

    let runs = queries.runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, run.id);

    let report = queries.run_report(run.id).await.unwrap().unwrap();
    assert_eq!(report.payouts.len(), 8);
    assert!(queries.run_report(uuid::Uuid::new_v4()).await.unwrap().is_none());

    let completed = queries
        .payouts(&PayoutFilter {
            status: Some(PayoutStatus::Completed),
            country: Some("jp".to_string()),
            ..PayoutFilter::default()
        })
        .await
        .unwrap();
    let ids: Vec<_> = completed.iter().map(|p| p.recipient_id.as_str()).collect();
    assert_eq!(ids, vec!["INV-038", "INV-050"]);

    let wire = queries
        .payouts(&PayoutFilter {
            rail: Some("wire".to_string()),
            ..PayoutFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(wire.len(), 1);

    let trace = queries.trace(wire[0].id).await.unwrap().unwrap();
    let actions: Vec<_> = trace.audit_trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["rail_selected", "payment_created"]);
    let Some(AuditDetails::Structured(details)) = &trace.audit_trail[1].details else {
        panic!("payment_created details missing");
    };
    assert_eq!(details["payment_order_id"], wire[0].payment_order_id.clone().unwrap());

    let json = serde_json::to_value(&trace).unwrap();
    assert_eq!(json["audit_trail"][0]["details"]["label"], "Wire (International) - AE");

    assert!(queries.trace(uuid::Uuid::new_v4()).await.unwrap().is_none());
}
