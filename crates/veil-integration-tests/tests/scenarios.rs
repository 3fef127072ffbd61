//! End-to-end unlock scenarios within a single session.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use veil_core::{resolve, MemoryStore, Rejection, Scope, StorageKey, UnlockStore};
use veil_gate::{GateController, GateView, GatedElement, Session};
use veil_integration_tests::{config, no_poll, settle, site_catalog, IQ_SECRET, POLL, SITE_SECRET};

#[tokio::test]
async fn global_unlock_opens_every_shared_scope() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);
    let store = session.store();

    assert!(!resolve(&Scope::global(), None, store));

    let gate = GateController::mount(&tab, GatedElement::new(Scope::global(), ""), &no_poll());
    assert_eq!(gate.submit(SITE_SECRET), Ok(()));
    assert!(store.get(&StorageKey::global()));

    for scope in [
        Scope::global(),
        Scope::named("nimbus"),
        Scope::named("atlas"),
        Scope::named("not-in-catalog"),
    ] {
        assert!(resolve(&scope, None, store), "{} should be unlocked", scope);
    }
    assert!(!resolve(&Scope::isolated("iq-plugin"), None, store));
}

#[tokio::test]
async fn isolated_scope_ignores_global_flag() {
    let session = Session::in_memory(site_catalog());
    session.store().set(&StorageKey::global()).unwrap();
    let tab = session.open_context(true);

    let iq = session.catalog().scope("iq-plugin");
    assert_eq!(iq, Scope::isolated("iq-plugin"));
    assert!(!resolve(&iq, None, session.store()));

    let gate = GateController::mount(&tab, GatedElement::new(iq, "IQ password"), &no_poll());
    assert_eq!(
        gate.view(),
        GateView::Locked {
            prompt: "IQ password".into()
        }
    );

    // The site password does not open an isolated scope.
    assert_eq!(gate.submit(SITE_SECRET), Err(Rejection::IncorrectCredential));
    assert_eq!(gate.submit(IQ_SECRET), Ok(()));
    assert_eq!(gate.view(), GateView::Unlocked);
}

#[tokio::test(start_paused = true)]
async fn hydration_never_flickers() {
    let session = Session::in_memory(site_catalog());
    session.store().set(&StorageKey::global()).unwrap();
    let tab = session.open_context(false);

    let gate = GateController::mount(&tab, GatedElement::new(Scope::named("nimbus"), ""), &config());
    assert!(!gate.is_unlocked(), "first paint must match the server render");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut rx = gate.subscribe();
    let recorder = {
        let seen = Arc::clone(&seen);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let value = *rx.borrow_and_update();
                seen.lock().unwrap().push(value);
            }
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    tab.become_interactive();
    settle().await;
    assert!(gate.is_unlocked());

    // Several poll ticks later nothing has moved back.
    for _ in 0..4 {
        tokio::time::sleep(POLL).await;
        settle().await;
        assert!(gate.is_unlocked());
    }

    drop(gate);
    settle().await;
    recorder.abort();
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

#[tokio::test(start_paused = true)]
async fn late_storage_is_picked_up_by_poll() {
    let store = Arc::new(MemoryStore::unavailable());
    store.restore(StorageKey::global());
    let session = Session::new(store.clone(), site_catalog());
    let tab = session.open_context(true);

    let gate = GateController::mount(&tab, GatedElement::new(Scope::named("atlas"), ""), &config());
    settle().await;
    assert!(!gate.is_unlocked());

    tokio::time::sleep(Duration::from_millis(50)).await;
    store.make_available();

    let started = Instant::now();
    tokio::time::sleep(POLL).await;
    settle().await;
    assert!(gate.is_unlocked());
    assert!(started.elapsed() <= POLL + Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn same_tab_gates_flip_without_a_tick() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);
    let element = GatedElement::new(Scope::named("nimbus"), "");

    let first = GateController::mount(&tab, element.clone(), &no_poll());
    let second = GateController::mount(&tab, element, &no_poll());
    settle().await;

    let started = Instant::now();
    assert_eq!(first.submit(SITE_SECRET), Ok(()));
    settle().await;

    assert!(first.is_unlocked());
    assert!(second.is_unlocked());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn unlock_request_does_not_touch_other_scopes_when_isolated() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);

    let iq = GateController::mount(&tab, GatedElement::new(Scope::isolated("iq-plugin"), ""), &no_poll());
    let nimbus = GateController::mount(&tab, GatedElement::new(Scope::named("nimbus"), ""), &no_poll());

    iq.submit(IQ_SECRET).unwrap();
    settle().await;
    assert!(iq.is_unlocked());
    assert!(!nimbus.is_unlocked());
    assert!(!session.store().get(&StorageKey::global()));
}

#[tokio::test]
async fn second_write_mode_sets_both_flags() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);
    let nimbus = GateController::mount(&tab, GatedElement::new(Scope::named("nimbus"), ""), &no_poll());

    tab.write_named_and_global(&Scope::isolated("iq-plugin")).unwrap();
    settle().await;

    assert!(session.store().get(&StorageKey::named(&"iq-plugin".into())));
    assert!(nimbus.is_unlocked());
}

#[tokio::test]
async fn forced_preview_stays_locked_through_signals() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);
    let preview = GateController::mount(
        &tab,
        GatedElement::new(Scope::named("nimbus"), "").with_override(false),
        &no_poll(),
    );
    let live = GateController::mount(&tab, GatedElement::new(Scope::named("nimbus"), ""), &no_poll());

    live.submit(SITE_SECRET).unwrap();
    settle().await;
    preview.force_tick();
    settle().await;

    assert!(live.is_unlocked());
    assert!(!preview.is_unlocked());
    assert!(preview.set_override(None));
}

#[tokio::test]
async fn empty_and_wrong_submissions_are_recoverable() {
    let session = Session::in_memory(site_catalog());
    let tab = session.open_context(true);
    let gate = GateController::mount(&tab, GatedElement::new(Scope::named("atlas"), ""), &no_poll());

    assert_eq!(gate.submit(""), Err(Rejection::InputRequired));
    assert_eq!(gate.submit("nope"), Err(Rejection::IncorrectCredential));
    assert!(session.store().is_available());
    assert!(!gate.is_unlocked());

    assert_eq!(gate.submit("  OPEN SESAME "), Ok(()));
    assert!(gate.is_unlocked());
}
