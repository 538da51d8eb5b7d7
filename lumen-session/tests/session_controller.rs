mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config, item, server_error, FakeBackend};
use lumen_api::HistoryEntry;
use lumen_net::{NoCredentials, StaticToken};
use lumen_query::{backend_pairs, MediaType, ParamsPatch, SearchParams};
use lumen_session::{Identity, MemoryLocation, SearchSession, SessionError, SessionMode, SortOrder};

fn signed_in(backend: &Arc<FakeBackend>) -> (SearchSession, Arc<MemoryLocation>) {
    let location = Arc::new(MemoryLocation::new());
    let session = SearchSession::new(
        backend.clone(),
        Arc::new(StaticToken::new("jwt")),
        location.clone(),
        &config(),
    );
    (session, location)
}

#[tokio::test]
async fn submit_search_fetches_first_page_and_reports_totals() {
    let backend = FakeBackend::new();
    let (session, location) = signed_in(&backend);

    session
        .submit_search(ParamsPatch::query("forest").media_type(MediaType::Audio))
        .await
        .unwrap();

    let log = backend.search_log();
    assert_eq!(log.len(), 1);
    assert_eq!(
        backend_pairs(&log[0]),
        vec![
            ("query", "forest".to_string()),
            ("media_type", "audio".to_string()),
            ("page", "1".to_string()),
            ("page_size", "20".to_string()),
        ]
    );

    let view = session.view();
    assert_eq!(view.mode, SessionMode::Searching);
    assert_eq!(view.total_count, 45);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.current_page, 1);
    assert!(!view.auth_error);
    assert!(!view.loading);
    assert_eq!(view.items.len(), 3);
    assert_eq!(location.current().as_deref(), Some("q=forest&type=audio"));
}

#[tokio::test]
async fn anonymous_read_sets_auth_error_but_still_shows_items() {
    let backend = FakeBackend::new();
    backend.set_authenticated(false);
    let (session, _) = signed_in(&backend);

    session
        .submit_search(ParamsPatch::query("forest").media_type(MediaType::Audio))
        .await
        .unwrap();

    let view = session.view();
    assert!(view.auth_error);
    assert_eq!(view.items.len(), 3);

    let first = view.items[0].item.clone();
    let err = session.toggle_bookmark(&first).await.unwrap_err();
    assert_eq!(err, SessionError::Unauthenticated);
    assert_eq!(backend.create_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reset_returns_to_default_params_in_idle() {
    let backend = FakeBackend::new();
    backend.set_authenticated(false);
    let (session, location) = signed_in(&backend);

    session
        .submit_search(ParamsPatch::query("forest").media_type(MediaType::Audio).creator("ann"))
        .await
        .unwrap();
    session.change_page(2).await.unwrap();
    session.set_sort(SortOrder::TitleDesc);
    session.reset().await.unwrap();

    let view = session.view();
    assert_eq!(view.mode, SessionMode::Idle);
    assert_eq!(view.params, SearchParams::default());
    assert_eq!(view.params.page_size, 20);
    assert!(!view.auth_error);
    assert_eq!(view.sort, SortOrder::Relevance);
    assert_eq!(view.item_ids(), vec!["popular-images"]);
    assert_eq!(location.current().as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn slow_superseded_response_does_not_replace_newer_page() {
    let backend = FakeBackend::new();
    backend.delay("slow", Duration::from_millis(500));
    backend.delay("fast", Duration::from_millis(10));
    let (session, _) = signed_in(&backend);

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.submit_search(ParamsPatch::query("slow")).await })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    session.submit_search(ParamsPatch::query("fast")).await.unwrap();
    assert_eq!(session.view().params.query, "fast");

    first.await.unwrap().unwrap();
    let view = session.view();
    assert_eq!(view.params.query, "fast");
    assert!(view.item_ids().iter().all(|id| id.starts_with("fast-")));
    assert!(!view.loading);
}

#[tokio::test]
async fn repeated_change_page_is_served_from_cache() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("forest")).await.unwrap();
    session.change_page(2).await.unwrap();
    let first = session.view();
    session.change_page(2).await.unwrap();
    let second = session.view();

    assert_eq!(backend.searches(), 2);
    assert_eq!(first.items, second.items);
    assert_eq!(second.current_page, 2);
    assert_eq!(second.item_ids()[0], "forest-2-0");
}

#[tokio::test]
async fn empty_query_is_rejected_before_any_request() {
    let backend = FakeBackend::new();
    let (session, location) = signed_in(&backend);

    let err = session.submit_search(ParamsPatch::query("   ")).await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(backend.searches(), 0);
    assert_eq!(session.mode(), SessionMode::Idle);
    assert!(location.history().is_empty());
}

#[tokio::test]
async fn change_page_requires_an_active_search() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);
    let err = session.change_page(3).await.unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    assert_eq!(backend.searches(), 0);
}

#[tokio::test]
async fn restore_from_location_does_not_publish_back() {
    let backend = FakeBackend::new();
    let (session, location) = signed_in(&backend);

    session
        .restore_from_location("?q=cats&type=audio&page=2&utm_source=mail")
        .await
        .unwrap();

    let params = session.params();
    assert_eq!(params.query, "cats");
    assert_eq!(params.media_type, MediaType::Audio);
    assert_eq!(params.page, 2);
    assert_eq!(session.mode(), SessionMode::Searching);
    assert!(location.history().is_empty());

    session.change_page(3).await.unwrap();
    assert_eq!(location.history(), vec!["q=cats&type=audio&page=3".to_string()]);
}

#[tokio::test]
async fn restore_without_query_stays_idle_with_popular_feed() {
    let backend = FakeBackend::new();
    backend.set_popular(MediaType::Audio, vec![item("song", "Song", "band")]);
    let (session, _) = signed_in(&backend);

    session.restore_from_location("type=audio").await.unwrap();
    let view = session.view();
    assert_eq!(view.mode, SessionMode::Idle);
    assert_eq!(view.item_ids(), vec!["song"]);
    assert_eq!(backend.searches(), 0);
}

#[tokio::test]
async fn change_filter_resets_page_and_keeps_query() {
    let backend = FakeBackend::new();
    let (session, location) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("forest")).await.unwrap();
    session.change_page(2).await.unwrap();
    session
        .change_filter(ParamsPatch::default().license_type("cc0"))
        .await
        .unwrap();

    let params = session.params();
    assert_eq!(params.page, 1);
    assert_eq!(params.query, "forest");
    assert_eq!(params.license_type, "cc0");
    assert_eq!(location.current().as_deref(), Some("q=forest&license=cc0"));
    assert_eq!(backend.search_log().last().map(|p| p.license_type.as_str()), Some("cc0"));
}

#[tokio::test]
async fn media_type_switch_in_idle_reloads_popular_only() {
    let backend = FakeBackend::new();
    let (session, location) = signed_in(&backend);

    session.change_media_type(MediaType::Audio).await.unwrap();
    let view = session.view();
    assert_eq!(view.mode, SessionMode::Idle);
    assert_eq!(view.item_ids(), vec!["popular-audio"]);
    assert_eq!(backend.searches(), 0);
    assert_eq!(location.current().as_deref(), Some("type=audio"));
}

#[tokio::test]
async fn media_type_switch_while_searching_refetches() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("rain")).await.unwrap();
    session.change_page(3).await.unwrap();
    session.change_media_type(MediaType::Audio).await.unwrap();

    let last = backend.search_log().pop().unwrap();
    assert_eq!(last.media_type, MediaType::Audio);
    assert_eq!(last.page, 1);
    assert_eq!(last.query, "rain");
}

#[tokio::test]
async fn network_failure_is_visible_and_retried_on_next_request() {
    let backend = FakeBackend::new();
    backend.fail("storm", server_error(503));
    let (session, _) = signed_in(&backend);

    let err = session.submit_search(ParamsPatch::query("storm")).await.unwrap_err();
    assert!(matches!(err, SessionError::Network(_)));
    let view = session.view();
    assert!(view.error.is_some());
    assert!(view.items.is_empty());

    backend.recover("storm");
    session.submit_search(ParamsPatch::query("storm")).await.unwrap();
    let view = session.view();
    assert!(view.error.is_none());
    assert_eq!(view.items.len(), 3);
    assert_eq!(backend.searches(), 2);
}

#[tokio::test(start_paused = true)]
async fn stale_page_is_shown_while_revalidating() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("x")).await.unwrap();
    assert_eq!(session.view().total_count, 45);

    tokio::time::advance(Duration::from_secs(61)).await;
    backend.set_count("x", 50);
    backend.delay("x", Duration::from_millis(100));
    session.submit_search(ParamsPatch::query("x")).await.unwrap();

    let view = session.view();
    assert!(view.stale);
    assert_eq!(view.total_count, 45);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let view = session.view();
    assert!(!view.stale);
    assert_eq!(view.total_count, 50);
    assert_eq!(view.total_pages, 3);
}

#[tokio::test(start_paused = true)]
async fn failed_revalidation_keeps_prior_page_with_error() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("x")).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    backend.fail("x", server_error(500));
    session.submit_search(ParamsPatch::query("x")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let view = session.view();
    assert_eq!(view.items.len(), 3);
    assert!(view.error.is_some());
}

#[tokio::test]
async fn bookmark_toggle_round_trip() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);
    session.submit_search(ParamsPatch::query("forest")).await.unwrap();

    let target = session.view().items[1].item.clone();
    assert!(session.toggle_bookmark(&target).await.unwrap());
    assert!(session.view().items[1].bookmarked);
    assert_eq!(backend.server_bookmarks(), vec![target.id.clone()]);

    assert!(!session.toggle_bookmark(&target).await.unwrap());
    assert!(!session.view().items[1].bookmarked);
    assert!(backend.server_bookmarks().is_empty());
}

#[tokio::test]
async fn failed_toggle_leaves_membership_unchanged() {
    let backend = FakeBackend::new();
    backend.fail_next_create(server_error(500));
    let (session, _) = signed_in(&backend);
    session.submit_search(ParamsPatch::query("forest")).await.unwrap();

    let target = session.view().items[0].item.clone();
    let err = session.toggle_bookmark(&target).await.unwrap_err();
    assert!(matches!(err, SessionError::Network(_)));
    assert!(!session.view().items[0].bookmarked);
    assert!(!session.bookmarks().contains(&target.id));
}

#[tokio::test]
async fn toggle_without_credential_sets_auth_error_without_request() {
    let backend = FakeBackend::new();
    let location = Arc::new(MemoryLocation::new());
    let session = SearchSession::new(backend.clone(), Arc::new(NoCredentials), location, &config());
    session.submit_search(ParamsPatch::query("forest")).await.unwrap();
    assert!(!session.auth_error());

    let target = session.view().items[0].item.clone();
    let err = session.toggle_bookmark(&target).await.unwrap_err();
    assert_eq!(err, SessionError::Unauthenticated);
    assert!(session.auth_error());
    assert_eq!(backend.create_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sort_applies_to_displayed_page_only() {
    let backend = FakeBackend::new();
    backend.set_items(
        "letters",
        vec![item("1", "b", "z"), item("2", "a", "y"), item("3", "a", "x")],
    );
    let (session, _) = signed_in(&backend);
    session.submit_search(ParamsPatch::query("letters")).await.unwrap();

    session.set_sort(SortOrder::TitleAsc);
    assert_eq!(session.view().item_ids(), vec!["2", "3", "1"]);
    session.set_sort(SortOrder::CreatorAsc);
    assert_eq!(session.view().item_ids(), vec!["3", "2", "1"]);
    session.set_sort(SortOrder::Relevance);
    assert_eq!(session.view().item_ids(), vec!["1", "2", "3"]);
    assert_eq!(backend.searches(), 1);
}

#[tokio::test]
async fn replaying_history_runs_a_fresh_search() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);
    session.submit_search(ParamsPatch::query("old").creator("bob")).await.unwrap();
    session.change_page(2).await.unwrap();

    let entry: HistoryEntry = serde_json::from_value(serde_json::json!({
        "id": 7,
        "search_query": "waves",
        "search_params": {"media_type": "audio", "license_type": "by"},
        "result_count": 12
    }))
    .unwrap();
    session.replay_history(&entry).await.unwrap();

    let params = session.params();
    assert_eq!(params.query, "waves");
    assert_eq!(params.media_type, MediaType::Audio);
    assert_eq!(params.license_type, "by");
    assert_eq!(params.creator, "");
    assert_eq!(params.page, 1);
}

#[tokio::test]
async fn history_log_lists_deletes_and_clears() {
    let backend = FakeBackend::new();
    let entries: Vec<HistoryEntry> = serde_json::from_value(serde_json::json!([
        {"id": "a1", "search_query": "forest"},
        {"id": 2, "search_query": "rain"}
    ]))
    .unwrap();
    backend.set_history(entries);
    let (session, _) = signed_in(&backend);
    let history = session.history();

    assert_eq!(history.list().await.unwrap().len(), 2);
    history.delete("2").await.unwrap();
    assert_eq!(history.list().await.unwrap()[0].id, "a1");
    assert!(matches!(history.delete("missing").await, Err(SessionError::Network(_))));
    history.clear().await.unwrap();
    assert!(history.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_read_flags_auth_instead_of_failing() {
    let backend = FakeBackend::new();
    backend.fail("private", lumen_net::ApiError::Unauthenticated);
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("private")).await.unwrap();
    let view = session.view();
    assert!(view.auth_error);
    assert!(view.error.is_none());
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn restore_with_malformed_page_size_uses_configured_size() {
    let backend = FakeBackend::new();
    let mut cfg = config();
    cfg.page_size = 30;
    let session = SearchSession::new(
        backend.clone(),
        Arc::new(StaticToken::new("jwt")),
        Arc::new(MemoryLocation::new()),
        &cfg,
    );

    session.restore_from_location("q=cats&page_size=abc").await.unwrap();
    assert_eq!(session.params().page_size, 30);
    assert_eq!(backend.search_log()[0].page_size, 30);

    session.restore_from_location("q=cats&page%5Fsize=50").await.unwrap();
    assert_eq!(session.params().page_size, 50);
}

#[tokio::test(start_paused = true)]
async fn background_revalidation_updates_auth_state() {
    let backend = FakeBackend::new();
    let (session, _) = signed_in(&backend);

    session.submit_search(ParamsPatch::query("x")).await.unwrap();
    assert_eq!(session.identity(), Identity::Authenticated);

    tokio::time::advance(Duration::from_secs(61)).await;
    backend.set_authenticated(false);
    backend.delay("x", Duration::from_millis(100));
    session.submit_search(ParamsPatch::query("x")).await.unwrap();
    assert!(!session.view().auth_error);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let view = session.view();
    assert!(view.auth_error);
    assert!(!view.stale);
    assert_eq!(session.identity(), Identity::Anonymous);
}
