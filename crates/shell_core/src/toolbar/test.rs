use std::collections::HashSet;

use dawati_shared_util::PanelName;
use maplit::hashset;
use pretty_assertions::assert_eq;

use super::*;
use crate::test_util::{names, Call, FakeBackend};

fn button_of(toolbar: &Toolbar<FakeBackend>, name: &str) -> u32 {
    toolbar.get(name).map(|item| item.button).unwrap()
}

fn checked_count(toolbar: &Toolbar<FakeBackend>) -> usize {
    toolbar.items.values().filter(|item| item.checked).count()
}

#[test]
fn test_add_then_remove_one() {
    let mut toolbar = Toolbar::new(FakeBackend::default());

    let report = toolbar.reconcile(&names(&["a11y", "volume", "battery"]));
    assert_eq!(report.added, names(&["a11y", "volume", "battery"]));
    assert!(report.removed.is_empty());
    assert_eq!(toolbar.backend().screen_order(), vec!["a11y", "volume", "battery"]);

    let a11y = button_of(&toolbar, "a11y");
    let battery = button_of(&toolbar, "battery");

    let report = toolbar.reconcile(&names(&["a11y", "battery"]));
    assert!(report.added.is_empty());
    assert_eq!(report.removed, names(&["volume"]));
    assert_eq!(button_of(&toolbar, "a11y"), a11y);
    assert_eq!(button_of(&toolbar, "battery"), battery);
    assert_eq!(toolbar.backend().screen_order(), vec!["a11y", "battery"]);
    assert!(!toolbar.contains("volume"));
}

#[test]
fn test_reconcile_is_idempotent() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    let order = names(&["myzone", "status", "people", "internet"]);

    toolbar.reconcile(&order);
    let buttons_before: Vec<u32> = order.iter().map(|name| button_of(&toolbar, name.as_str())).collect();
    let calls_before = toolbar.backend().lifecycle_calls().len();

    let report = toolbar.reconcile(&order);
    assert!(report.is_noop());
    let buttons_after: Vec<u32> = order.iter().map(|name| button_of(&toolbar, name.as_str())).collect();
    assert_eq!(buttons_before, buttons_after);
    assert_eq!(toolbar.backend().lifecycle_calls().len(), calls_before);
}

#[test]
fn test_registry_matches_desired_set() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b", "c"]));
    toolbar.reconcile(&names(&["d", "b", "e", "b"]));

    let registered: HashSet<&str> = toolbar.items.keys().map(|name| name.as_str()).collect();
    assert_eq!(registered, hashset! {"b", "d", "e"});
    assert_eq!(toolbar.names(), names(&["d", "b", "e"]).iter().collect::<Vec<_>>());
}

#[test]
fn test_reorder_keeps_buttons() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b", "c"]));
    let b = button_of(&toolbar, "b");

    let report = toolbar.reconcile(&names(&["c", "b", "a"]));
    assert!(report.is_noop());
    assert_eq!(button_of(&toolbar, "b"), b);
    assert_eq!(toolbar.backend().screen_order(), vec!["c", "b", "a"]);
    assert_eq!(toolbar.order, names(&["c", "b", "a"]));
}

#[test]
fn test_duplicates_create_one_button() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    let report = toolbar.reconcile(&names(&["a", "b", "a"]));

    assert_eq!(report.added, names(&["a", "b"]));
    assert_eq!(toolbar.len(), 2);
    assert_eq!(toolbar.backend().screen_order(), vec!["a", "b"]);
    assert_eq!(toolbar.names(), names(&["a", "b"]).iter().collect::<Vec<_>>());
}

#[test]
fn test_empty_order_removes_everything() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b"]));

    let report = toolbar.reconcile(&[]);
    assert_eq!(report.removed, names(&["a", "b"]));
    assert!(toolbar.is_empty());
    assert!(toolbar.backend().on_screen.is_empty());
}

#[test]
fn test_construction_failure_is_local() {
    let mut backend = FakeBackend::default();
    backend.broken.insert("broken".to_string());
    let mut toolbar = Toolbar::new(backend);

    let report = toolbar.reconcile(&names(&["a", "broken", "b"]));
    assert_eq!(report.added, names(&["a", "b"]));
    assert_eq!(report.failed, vec![ConstructionError::new("broken".into(), "no such panel")]);
    assert!(!toolbar.contains("broken"));
    assert_eq!(toolbar.backend().screen_order(), vec!["a", "b"]);

    // the failed panel is retried on the next pass
    toolbar.backend_mut().broken.clear();
    let report = toolbar.reconcile(&names(&["a", "broken", "b"]));
    assert_eq!(report.added, names(&["broken"]));
    assert_eq!(toolbar.backend().screen_order(), vec!["a", "broken", "b"]);
}

#[test]
fn test_at_most_one_checked() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b", "c"]));
    let a = button_of(&toolbar, "a");

    let clicks = [("a", true), ("b", true), ("b", false), ("c", true), ("a", true), ("a", true), ("c", false)];
    for (name, active) in clicks {
        toolbar.button_toggled(name, active);
        assert!(checked_count(&toolbar) <= 1, "more than one checked after toggling {}", name);
    }
    assert_eq!(toolbar.checked(), Some(&PanelName::from("a")));

    toolbar.backend_mut().calls.clear();
    toolbar.button_toggled("b", true);
    assert_eq!(toolbar.backend().calls, vec![Call::SetChecked(a, false), Call::Show("b".to_string())]);
    assert_eq!(toolbar.checked(), Some(&PanelName::from("b")));
}

#[test]
fn test_toggle_requests_show_and_hide() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a"]));
    toolbar.backend_mut().calls.clear();

    toolbar.button_toggled("a", true);
    // echo from the toolkit after the state was already applied
    toolbar.button_toggled("a", true);
    toolbar.button_toggled("a", false);
    toolbar.button_toggled("a", false);
    toolbar.button_toggled("unknown", true);

    assert_eq!(toolbar.backend().calls, vec![Call::Show("a".to_string()), Call::Hide("a".to_string())]);
}

#[test]
fn test_removing_checked_button_clears_selection() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b"]));
    toolbar.button_toggled("a", true);

    toolbar.reconcile(&names(&["b"]));
    assert_eq!(toolbar.checked(), None);

    toolbar.reconcile(&names(&["a", "b"]));
    assert!(!toolbar.get("a").unwrap().checked);
}

#[test]
fn test_set_unchecked_does_not_request_hide() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a"]));
    let a = button_of(&toolbar, "a");
    toolbar.button_toggled("a", true);
    toolbar.backend_mut().calls.clear();

    toolbar.set_unchecked("a");
    toolbar.set_unchecked("a");
    assert_eq!(toolbar.backend().calls, vec![Call::SetChecked(a, false)]);
    assert_eq!(toolbar.checked(), None);
}

#[test]
fn test_button_state_and_style_forwarding() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a"]));
    let a = button_of(&toolbar, "a");
    toolbar.backend_mut().calls.clear();

    toolbar.apply_button_state("a", ButtonState::from_bits(3));
    toolbar.apply_button_style("a", "state-busy");
    toolbar.apply_button_style("missing", "state-busy");

    assert_eq!(toolbar.backend().calls, vec![Call::State(a, ButtonState::from_bits(3)), Call::Style(a, "state-busy".to_string())]);
    assert!(ButtonState::from_bits(3).is_hidden());
    assert!(ButtonState::from_bits(3).is_insensitive());
    assert!(!ButtonState::NORMAL.is_hidden());
}

#[test]
fn test_activate_updates_the_button_itself() {
    let mut toolbar = Toolbar::new(FakeBackend::default());
    toolbar.reconcile(&names(&["a", "b"]));
    let a = button_of(&toolbar, "a");
    let b = button_of(&toolbar, "b");
    toolbar.backend_mut().calls.clear();

    assert!(toolbar.activate("a", true));
    assert!(toolbar.activate("b", true));
    assert!(!toolbar.activate("missing", true));

    assert_eq!(
        toolbar.backend().calls,
        vec![
            Call::Show("a".to_string()),
            Call::SetChecked(a, true),
            Call::SetChecked(a, false),
            Call::Show("b".to_string()),
            Call::SetChecked(b, true),
        ]
    );
}
