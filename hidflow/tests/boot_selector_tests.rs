//! Boot-time selection scenarios, end to end over fake hardware.

mod common;

use std::sync::{Arc, Mutex};

use common::{Fixture, ProbeWorkflow};
use hidflow::engine::{BootSelector, WorkflowId};
use hidflow::store::{StateStore, WORKFLOW_ID_KEY};
use hidflow::trigger::FixedTrigger;
use hidflow::workflows::WorkflowRegistry;

fn probe_registry(runs: &Arc<Mutex<Vec<WorkflowId>>>) -> WorkflowRegistry {
    let mut registry = WorkflowRegistry::new();
    for id in WorkflowId::ALL {
        registry.register(Arc::new(ProbeWorkflow::new(id, runs.clone())));
    }
    registry
}

#[tokio::test]
async fn test_first_boot_dispatches_default_programming() {
    let fixture = Fixture::new();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(false)),
    );

    let dispatched = selector.run().await.unwrap();

    assert_eq!(dispatched, WorkflowId::Programming);
    assert_eq!(*runs.lock().unwrap(), vec![WorkflowId::Programming]);
    // nothing was prompted or persisted
    assert!(fixture.first_set_index(WORKFLOW_ID_KEY).is_none());
    assert!(fixture.chords().is_empty());
}

#[tokio::test]
async fn test_trigger_with_reply_switches_and_persists() {
    let fixture = Fixture::new();
    fixture.lines.push_reply("2");
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(true)),
    );

    let dispatched = selector.run().await.unwrap();

    assert_eq!(dispatched, WorkflowId::Circuits);
    assert_eq!(*runs.lock().unwrap(), vec![WorkflowId::Circuits]);
    assert_eq!(fixture.store.get_u32(WORKFLOW_ID_KEY).unwrap(), 2);

    // sticky on the next boot with the trigger deasserted
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(false)),
    );
    assert_eq!(selector.run().await.unwrap(), WorkflowId::Circuits);
}

#[tokio::test]
async fn test_trigger_timeout_keeps_current_selection() {
    let fixture = Fixture::new();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(true)),
    );

    let dispatched = selector.run().await.unwrap();

    assert_eq!(dispatched, WorkflowId::Programming);
    assert_eq!(*runs.lock().unwrap(), vec![WorkflowId::Programming]);
    assert!(fixture.first_set_index(WORKFLOW_ID_KEY).is_none());
}

#[tokio::test]
async fn test_duplicate_reply_is_not_persisted() {
    let fixture = Fixture::new();
    fixture.lines.push_reply("0");
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(true)),
    );

    assert_eq!(selector.run().await.unwrap(), WorkflowId::Programming);
    assert!(fixture.first_set_index(WORKFLOW_ID_KEY).is_none());
}

#[tokio::test]
async fn test_malformed_reply_keeps_current_selection() {
    let fixture = Fixture::new();
    fixture
        .store
        .set_u32(WORKFLOW_ID_KEY, WorkflowId::Circuits.raw())
        .unwrap();
    fixture.clear_journal();
    fixture.lines.push_reply("banana");
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(true)),
    );

    assert_eq!(selector.run().await.unwrap(), WorkflowId::Circuits);
    assert!(fixture.first_set_index(WORKFLOW_ID_KEY).is_none());
}

#[tokio::test]
async fn test_selection_prompt_is_typed_with_memory_marker() {
    let fixture = Fixture::new();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(true)),
    );

    selector.run().await.unwrap();

    let typed = fixture.typed_text();
    assert!(typed.contains("Select ID: [0:MEM-SEL] Programming"));
    assert!(typed.contains("[1] Dual Boot"));
    assert!(typed.contains("[3] Sys-Admin"));
}

#[tokio::test]
async fn test_corrupt_persisted_id_dispatches_default() {
    let fixture = Fixture::new();
    fixture.store.set_u32(WORKFLOW_ID_KEY, 9).unwrap();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let selector = BootSelector::new(
        fixture.device.clone(),
        probe_registry(&runs),
        Arc::new(FixedTrigger(false)),
    );

    assert_eq!(selector.run().await.unwrap(), WorkflowId::Programming);
    assert_eq!(*runs.lock().unwrap(), vec![WorkflowId::Programming]);
}

#[tokio::test]
async fn test_dispatch_is_idempotent_without_persisted_change() {
    for id in WorkflowId::ALL {
        let fixture = Fixture::new();
        fixture.store.set_u32(WORKFLOW_ID_KEY, id.raw()).unwrap();
        let runs = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let selector = BootSelector::new(
                fixture.device.clone(),
                probe_registry(&runs),
                Arc::new(FixedTrigger(false)),
            );
            assert_eq!(selector.run().await.unwrap(), id);
        }

        assert_eq!(*runs.lock().unwrap(), vec![id, id]);
    }
}

#[tokio::test]
async fn test_missing_handler_is_a_noop() {
    let fixture = Fixture::new();
    fixture
        .store
        .set_u32(WORKFLOW_ID_KEY, WorkflowId::Circuits.raw())
        .unwrap();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let mut registry = WorkflowRegistry::new();
    registry.register(Arc::new(ProbeWorkflow::new(
        WorkflowId::Programming,
        runs.clone(),
    )));
    let selector = BootSelector::new(fixture.device.clone(), registry, Arc::new(FixedTrigger(false)));

    assert_eq!(selector.run().await.unwrap(), WorkflowId::Circuits);
    assert!(runs.lock().unwrap().is_empty());
}
