use std::sync::Arc;

use countdown_keeper::{
    state::{TimerPatch, TimerStatus},
    FileKeyValueStore, JsonGateway, PersistenceGateway, Timer, TimerDraft, TimerStore, TimerUpdate, TracingSink,
};

async fn open(dir: &std::path::Path) -> TimerStore {
    let gateway: Arc<dyn PersistenceGateway> = Arc::new(JsonGateway::new(FileKeyValueStore::new(dir)));
    TimerStore::init(gateway, Arc::new(TracingSink)).await
}

#[tokio::test]
async fn state_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    let store = open(dir.path()).await;
    let draft = TimerDraft {
        name: "Laundry".to_string(),
        category: "Home".to_string(),
        duration: 2,
        halfway_alert: true,
    };
    let laundry = store.add_timer(draft.validate().unwrap()).await.unwrap();
    let oven = store.add_timer(Timer::new("Oven", "Kitchen", 30, false)).await.unwrap();
    store.start_all_in_category("Home").await.unwrap();
    store.tick().unwrap();
    store.tick().unwrap();
    store.persist().await.unwrap();
    drop(store);

    let reopened = open(dir.path()).await;
    let timers = reopened.timers().unwrap();
    assert_eq!(timers.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), vec![laundry.id.as_str(), oven.id.as_str()]);
    assert_eq!(timers[0].status, TimerStatus::Completed);
    assert_eq!(timers[1].remaining, 30);

    let history = reopened.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].name, "Laundry");

    // Acknowledgment state is per session
    assert!(reopened.pending_completions().unwrap().is_empty());
}

#[tokio::test]
async fn history_keeps_the_name_at_completion() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path()).await;

    let timer = store.add_timer(Timer::new("Bread", "Kitchen", 1, false)).await.unwrap();
    store.start_timer(&timer.id).await.unwrap();
    store.tick().unwrap();

    let rename = TimerPatch {
        name: Some("Sourdough".to_string()),
        ..TimerPatch::default()
    };
    store.update_timer(&timer.id, TimerUpdate::SetFields(rename)).await.unwrap();

    assert_eq!(store.history().unwrap()[0].name, "Bread");
    assert_eq!(store.timer(&timer.id).unwrap().unwrap().name, "Sourdough");
}

#[tokio::test]
async fn corrupt_files_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("timers.json"), "[{\"id\":").unwrap();
    std::fs::write(dir.path().join("history.json"), "not json at all").unwrap();

    let store = open(dir.path()).await;
    assert!(store.timers().unwrap().is_empty());
    assert!(store.history().unwrap().is_empty());

    // And the next save replaces the corrupt file
    store.add_timer(Timer::new("Tea", "Kitchen", 60, false)).await.unwrap();
    let reopened = open(dir.path()).await;
    assert_eq!(reopened.timers().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_directory_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("not-created-yet")).await;
    assert!(store.timers().unwrap().is_empty());
}
