use super::*;
use chatdeck_core::tab::NEW_CHAT_LABEL;
use std::sync::Arc;

// Mock requester recording every directive it receives
#[derive(Default)]
struct RecordingRequester {
    received: std::sync::Mutex<Vec<TabDirective>>,
}

impl RecordingRequester {
    fn received(&self) -> Vec<TabDirective> {
        self.received.lock().unwrap().clone()
    }
}

impl ClearRequester for RecordingRequester {
    fn request_clear(&self) {
        self.received
            .lock()
            .unwrap()
            .push(TabDirective::ClearToDefaults);
    }
}

impl SessionLoadRequester for RecordingRequester {
    fn request_session_load(&self, thread_id: &str) {
        self.received
            .lock()
            .unwrap()
            .push(TabDirective::LoadSession(thread_id.to_string()));
    }
}

fn registry() -> (TabRegistry, Arc<RecordingRequester>) {
    let requester = Arc::new(RecordingRequester::default());
    let clear: Weak<dyn ClearRequester> = Arc::downgrade(&requester) as Weak<dyn ClearRequester>;
    let load: Weak<dyn SessionLoadRequester> =
        Arc::downgrade(&requester) as Weak<dyn SessionLoadRequester>;
    (TabRegistry::new(clear, load), requester)
}

fn ids(registry: &TabRegistry) -> Vec<String> {
    registry.open().tabs.into_iter().map(|tab| tab.id).collect()
}

#[test]
fn test_starts_with_new_chat_active() {
    let (registry, requester) = registry();
    let snapshot = registry.open();

    assert_eq!(snapshot.tabs, vec![Tab::new_chat()]);
    assert_eq!(snapshot.active_id, SENTINEL_NEW_CHAT);
    assert_eq!(snapshot.tabs[0].label, NEW_CHAT_LABEL);
    assert!(requester.received().is_empty());
}

#[test]
fn test_select_sequence_ends_on_last_id() {
    let (registry, requester) = registry();
    registry.register_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.register_session_tab("t2", "two", "t1").unwrap();

    for id in ["t1", "t2", "new", "t2", "t1"] {
        registry.select(id).unwrap();
    }

    assert_eq!(registry.active_id(), "t1");
    assert_eq!(
        requester.received().last(),
        Some(&TabDirective::LoadSession("t1".into()))
    );
}

#[test]
fn test_select_active_tab_is_noop() {
    let (registry, requester) = registry();
    assert_eq!(registry.select(SENTINEL_NEW_CHAT).unwrap(), None);
    assert!(requester.received().is_empty());
}

#[test]
fn test_select_emits_clear_for_new_chat() {
    let (registry, requester) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();

    let directive = registry.select(SENTINEL_NEW_CHAT).unwrap();

    assert_eq!(directive, Some(TabDirective::ClearToDefaults));
    assert_eq!(
        requester.received(),
        vec![
            TabDirective::LoadSession("t1".into()),
            TabDirective::ClearToDefaults
        ]
    );
}

#[test]
fn test_select_unknown_tab_is_rejected() {
    let (registry, _) = registry();
    let err = registry.select("missing").unwrap_err();
    assert!(matches!(err, ChatError::InvalidOperation(_)));
    assert_eq!(registry.active_id(), SENTINEL_NEW_CHAT);
}

#[test]
fn test_close_new_chat_is_rejected() {
    let (registry, _) = registry();
    registry.register_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    let before = registry.open();

    let err = registry.close(SENTINEL_NEW_CHAT).unwrap_err();

    assert!(matches!(err, ChatError::InvalidOperation(_)));
    assert_eq!(registry.open(), before);
}

#[test]
fn test_close_active_prefers_left_session_tab() {
    let (registry, requester) = registry();
    registry.register_session_tab("t1", "one", "t0").unwrap();
    registry.register_session_tab("t2", "two", "t1").unwrap();
    registry.register_session_tab("t3", "three", "t2").unwrap();
    registry.select("t2").unwrap();

    let directive = registry.close("t2").unwrap();

    assert_eq!(directive, Some(TabDirective::LoadSession("t1".into())));
    assert_eq!(registry.active_id(), "t1");
    assert_eq!(ids(&registry), vec!["new", "t1", "t3"]);
    assert_eq!(
        requester.received().last(),
        Some(&TabDirective::LoadSession("t1".into()))
    );
}

#[test]
fn test_close_first_session_tab_falls_back_to_new_chat() {
    let (registry, _) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.register_session_tab("t2", "two", "t1").unwrap();

    let directive = registry.close("t1").unwrap();

    assert_eq!(directive, Some(TabDirective::ClearToDefaults));
    assert_eq!(registry.active_id(), SENTINEL_NEW_CHAT);
    assert_eq!(ids(&registry), vec!["new", "t2"]);
}

#[test]
fn test_close_inactive_tab_keeps_active() {
    let (registry, requester) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.register_session_tab("t2", "two", "t1").unwrap();
    let directives_before = requester.received().len();

    assert_eq!(registry.close("t2").unwrap(), None);
    assert_eq!(registry.active_id(), "t1");
    assert_eq!(requester.received().len(), directives_before);
}

#[test]
fn test_close_always_leaves_valid_active_tab() {
    let (registry, _) = registry();
    for id in ["a", "b", "c", "d"] {
        registry.add_session_tab(id, id, "x").unwrap();
    }
    for id in ["c", "d", "a", "b"] {
        registry.select(id).unwrap();
        registry.close(id).unwrap();
        let snapshot = registry.open();
        assert!(snapshot.tabs.iter().any(|tab| tab.id == snapshot.active_id));
        assert!(snapshot.tabs[0].is_sentinel());
    }
    assert_eq!(ids(&registry), vec!["new"]);
}

#[test]
fn test_rename_updates_label_only() {
    let (registry, requester) = registry();
    registry.register_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();

    registry.rename("t1", "renamed").unwrap();

    assert_eq!(registry.open().tabs[1].label, "renamed");
    assert!(requester.received().is_empty());
}

#[test]
fn test_rename_new_chat_is_rejected() {
    let (registry, _) = registry();
    let err = registry.rename(SENTINEL_NEW_CHAT, "x").unwrap_err();
    assert!(matches!(err, ChatError::InvalidOperation(_)));
    assert_eq!(registry.open().tabs[0].label, NEW_CHAT_LABEL);

    assert!(registry.rename("missing", "x").is_err());
}

#[test]
fn test_add_session_tab_is_idempotent() {
    let (registry, _) = registry();
    registry.add_session_tab("t1", "first", SENTINEL_NEW_CHAT).unwrap();
    registry.add_session_tab("t1", "second", SENTINEL_NEW_CHAT).unwrap();

    let snapshot = registry.open();
    let matching: Vec<_> = snapshot.tabs.iter().filter(|tab| tab.id == "t1").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].label, "second");
    assert!(matching[0].closable);
    assert_eq!(snapshot.active_id, "t1");
}

#[test]
fn test_add_session_tab_insertion_position() {
    let (registry, _) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.add_session_tab("t2", "two", "t1").unwrap();
    registry.add_session_tab("t3", "three", SENTINEL_NEW_CHAT).unwrap();

    assert_eq!(ids(&registry), vec!["new", "t3", "t1", "t2"]);
}

#[test]
fn test_add_session_tab_reloads_even_when_active() {
    let (registry, requester) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.add_session_tab("t1", "one", "t1").unwrap();

    assert_eq!(
        requester.received(),
        vec![
            TabDirective::LoadSession("t1".into()),
            TabDirective::LoadSession("t1".into())
        ]
    );
}

#[test]
fn test_add_session_tab_rejects_new_chat_id() {
    let (registry, _) = registry();
    assert!(registry.add_session_tab(SENTINEL_NEW_CHAT, "x", "t1").is_err());
    assert!(registry.register_session_tab("", "x", "t1").is_err());
    assert_eq!(registry.len(), 1);
    assert!(!registry.is_empty());
}

#[test]
fn test_register_session_tab_keeps_active() {
    let (registry, requester) = registry();
    registry.register_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();

    assert_eq!(registry.active_id(), SENTINEL_NEW_CHAT);
    assert!(registry.contains("t1"));
    assert!(requester.received().is_empty());
}

#[test]
fn test_restore_tabs_dedupes_and_ignores_new_chat() {
    let (registry, _) = registry();
    let directive = registry.restore_tabs(vec![
        Tab::session("t1", "one"),
        Tab::new_chat(),
        Tab::session("t2", "two"),
        Tab::session("t1", "dup"),
    ]);

    assert_eq!(directive, None);
    assert_eq!(ids(&registry), vec!["new", "t1", "t2"]);
    assert_eq!(registry.open().tabs[1].label, "one");
}

#[test]
fn test_restore_tabs_resets_missing_active() {
    let (registry, requester) = registry();
    registry.add_session_tab("gone", "x", SENTINEL_NEW_CHAT).unwrap();

    let directive = registry.restore_tabs(vec![Tab::session("t1", "one")]);

    assert_eq!(directive, Some(TabDirective::ClearToDefaults));
    assert_eq!(registry.active_id(), SENTINEL_NEW_CHAT);
    assert_eq!(
        requester.received().last(),
        Some(&TabDirective::ClearToDefaults)
    );
}

#[test]
fn test_reset_to_default_discards_session_tabs() {
    let (registry, requester) = registry();
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    registry.add_session_tab("t2", "two", "t1").unwrap();

    assert_eq!(registry.reset_to_default(), TabDirective::ClearToDefaults);
    assert_eq!(ids(&registry), vec!["new"]);
    assert_eq!(registry.active_id(), SENTINEL_NEW_CHAT);
    assert_eq!(
        requester.received().last(),
        Some(&TabDirective::ClearToDefaults)
    );
}

#[test]
fn test_dropped_requester_is_skipped() {
    let (registry, requester) = registry();
    drop(requester);
    registry.add_session_tab("t1", "one", SENTINEL_NEW_CHAT).unwrap();
    assert_eq!(registry.active_id(), "t1");
}
