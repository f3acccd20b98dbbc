mod support;

use axum::http::StatusCode;
use time::{Duration, OffsetDateTime};

use support::{TestApp, body_text};

fn days_ago(days: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() - Duration::days(days)
}

#[tokio::test]
async fn empty_index_shows_no_posts_message() {
    let app = TestApp::new().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("No posts are available."));
}

#[tokio::test]
async fn future_post_is_hidden_from_index() {
    let app = TestApp::new().await;
    app.store.add_post(
        "Scheduled Piece",
        "scheduled-piece",
        "later",
        OffsetDateTime::now_utc() + Duration::days(30),
    );

    let body = body_text(app.get("/").await).await;
    assert!(body.contains("No posts are available."));
    assert!(!body.contains("Scheduled Piece"));
}

#[tokio::test]
async fn past_and_future_posts_list_only_the_past_one() {
    let app = TestApp::new().await;
    app.store
        .add_post("Past Question", "past-question", "", days_ago(30));
    app.store.add_post(
        "Future Question",
        "future-question",
        "",
        OffsetDateTime::now_utc() + Duration::days(30),
    );

    let body = body_text(app.get("/").await).await;
    assert!(body.contains("Past Question"));
    assert!(!body.contains("Future Question"));
    assert!(!body.contains("No posts are available."));
}

#[tokio::test]
async fn index_lists_newest_first() {
    let app = TestApp::new().await;
    app.store.add_post("Older Entry", "older-entry", "", days_ago(5));
    app.store.add_post("Newer Entry", "newer-entry", "", days_ago(1));

    let body = body_text(app.get("/").await).await;
    let newer = body.find("Newer Entry").expect("newer listed");
    let older = body.find("Older Entry").expect("older listed");
    assert!(newer < older);
}

#[tokio::test]
async fn future_post_detail_is_not_found() {
    let app = TestApp::new().await;
    app.store.add_post(
        "Not Yet",
        "not-yet",
        "",
        OffsetDateTime::now_utc() + Duration::days(5),
    );

    let response = app.get("/post/not-yet/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn past_post_detail_shows_title_and_tags() {
    let app = TestApp::new().await;
    let post = app
        .store
        .add_post("Past Entry", "past-entry", "Body text here", days_ago(5));
    let tag = app.store.add_tag("Rust", "rust");
    app.store.link(&post, &tag);

    let response = app.get("/post/past-entry/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Past Entry"));
    assert!(body.contains("Body text here"));
    assert!(body.contains("/tags/rust/"));
}

#[tokio::test]
async fn post_detail_lookup_ignores_case() {
    let app = TestApp::new().await;
    app.store
        .add_post("Mixed Case", "mixed-case", "", days_ago(1));

    let response = app.get("/post/Mixed-Case/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_paths_render_not_found_page() {
    let app = TestApp::new().await;

    for uri in ["/post/missing/", "/tags/missing/", "/no/such/page"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = body_text(response).await;
        assert!(body.contains("Page Not Found"), "{uri}");
    }
}

#[tokio::test]
async fn search_filters_by_title_and_body() {
    let app = TestApp::new().await;
    app.store
        .add_post("Rust Tips", "rust-tips", "ownership", days_ago(3));
    app.store
        .add_post("Gardening", "gardening", "tomatoes and rust fungus", days_ago(2));
    app.store.add_post("Cooking", "cooking", "pasta", days_ago(1));

    let body = body_text(app.get("/?search=RUST").await).await;
    assert!(body.contains("Rust Tips"));
    assert!(body.contains("Gardening"));
    assert!(!body.contains("Cooking"));
}

#[tokio::test]
async fn search_without_matches_shows_message() {
    let app = TestApp::new().await;
    app.store.add_post("Cooking", "cooking", "pasta", days_ago(1));

    let body = body_text(app.get("/?search=quantum").await).await;
    assert!(body.contains("No posts are available."));
    assert!(body.contains("value=\"quantum\""));
}

#[tokio::test]
async fn blank_search_lists_everything() {
    let app = TestApp::new().await;
    app.store.add_post("First", "first", "", days_ago(2));
    app.store.add_post("Second", "second", "", days_ago(1));

    let body = body_text(app.get("/?search=+++").await).await;
    assert!(body.contains("First"));
    assert!(body.contains("Second"));
}

#[tokio::test]
async fn search_never_reveals_future_posts() {
    let app = TestApp::new().await;
    app.store.add_post(
        "Secret Launch",
        "secret-launch",
        "",
        OffsetDateTime::now_utc() + Duration::days(1),
    );

    let body = body_text(app.get("/?search=secret").await).await;
    assert!(!body.contains("Secret Launch"));
}

#[tokio::test]
async fn pagination_splits_and_clamps_pages() {
    let app = TestApp::new().await;
    for day in 1..=4 {
        let title = format!("Entry {day}");
        let slug = format!("entry-{day}");
        app.store.add_post(&title, &slug, "", days_ago(day));
    }

    let first = body_text(app.get("/").await).await;
    assert!(first.contains("Entry 1"));
    assert!(first.contains("Entry 3"));
    assert!(!first.contains("Entry 4"));
    assert!(first.contains("Page 1 of 2"));
    assert!(first.contains("?page=2"));

    let second = body_text(app.get("/?page=2").await).await;
    assert!(second.contains("Entry 4"));
    assert!(!second.contains("Entry 1"));

    let beyond = body_text(app.get("/?page=99").await).await;
    assert!(beyond.contains("Page 2 of 2"));

    let garbage = body_text(app.get("/?page=abc").await).await;
    assert!(garbage.contains("Page 1 of 2"));

    let overflowing = body_text(app.get("/?page=99999999999999999999").await).await;
    assert!(overflowing.contains("Page 2 of 2"));
}

#[tokio::test]
async fn pagination_links_keep_the_search_term() {
    let app = TestApp::with_page_size(1).await;
    app.store.add_post("Rust One", "rust-one", "", days_ago(2));
    app.store.add_post("Rust Two", "rust-two", "", days_ago(1));

    let body = body_text(app.get("/?search=rust").await).await;
    assert!(body.contains("?page=2&#38;search=rust"));
}

#[tokio::test]
async fn tag_list_is_sorted_by_title() {
    let app = TestApp::new().await;
    app.store.add_tag("zeta", "zeta");
    app.store.add_tag("Alpha", "alpha");

    let response = app.get("/tags/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    let alpha = body.find("Alpha").expect("alpha listed");
    let zeta = body.find("zeta").expect("zeta listed");
    assert!(alpha < zeta);
}

#[tokio::test]
async fn tag_detail_lists_only_published_posts() {
    let app = TestApp::new().await;
    let tag = app.store.add_tag("Rust", "rust");
    let live = app.store.add_post("Live Post", "live-post", "", days_ago(1));
    let pending = app.store.add_post(
        "Pending Post",
        "pending-post",
        "",
        OffsetDateTime::now_utc() + Duration::days(1),
    );
    app.store.link(&live, &tag);
    app.store.link(&pending, &tag);

    let response = app.get("/tags/rust/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Live Post"));
    assert!(!body.contains("Pending Post"));
}

#[tokio::test]
async fn anonymous_pages_hide_authoring_links() {
    let app = TestApp::new().await;
    app.store.add_post("Public", "public", "", days_ago(1));

    let body = body_text(app.get("/post/public/").await).await;
    assert!(!body.contains("/post/public/update/"));
    assert!(body.contains("/login/"));
}

#[tokio::test]
async fn database_health_reports_no_content() {
    let app = TestApp::new().await;

    let response = app.get("/_health/db").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn null_character_in_slug_is_not_found() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/post/%00/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/post/a%00b/").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/tags/%00/").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_character_in_search_is_ignored() {
    let app = TestApp::new().await;
    app.store.add_post("Rust tips", "rust-tips", "", days_ago(1));

    let response = app.get("/?search=%00").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Rust tips"));

    let response = app.get("/?search=ru%00st").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Rust tips"));
}
