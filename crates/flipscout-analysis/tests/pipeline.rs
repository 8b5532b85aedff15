//! Integration tests for the fetch orchestrator: pagination ceilings,
//! fallback ordering, and partial-result assembly, all against wiremock.

use chrono::Utc;
use flipscout_analysis::sources::{OrdersClient, ShoppingClient, SocialClient};
use flipscout_analysis::types::{ProductInsight, VolumeLevel};
use flipscout_analysis::{AnalysisEngine, EngineOptions};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options() -> EngineOptions {
    EngineOptions {
        shopping_quote_limit: 5,
        orders_listing_limit: 10,
        social_page_size: 30,
        social_max_pages: 50,
        social_max_posts: 2_000,
        social_inter_page_delay_ms: 0,
    }
}

fn engine(server: &MockServer, options: EngineOptions) -> AnalysisEngine {
    AnalysisEngine::with_clients(
        ShoppingClient::with_base_url("test-key", 30, 0, 0, &server.uri())
            .expect("shopping client"),
        SocialClient::with_base_url("test-key", 30, 0, 0, &server.uri()).expect("social client"),
        OrdersClient::with_base_url("test-token", 30, 0, 0, &server.uri())
            .expect("orders client"),
        options,
    )
}

/// A search page of `count` posts timestamped half an hour ago, with an
/// optional continuation cursor.
fn search_page(count: usize, cursor: Option<&str>) -> serde_json::Value {
    let ts = Utc::now().timestamp() - 1_800;
    let posts: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "item": {
                    "createTime": ts - i as i64,
                    "stats": { "diggCount": 100, "commentCount": 10, "shareCount": 1 }
                }
            })
        })
        .collect();
    match cursor {
        Some(c) => serde_json::json!({ "data": posts, "nextCursor": c }),
        None => serde_json::json!({ "data": posts }),
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pagination_halts_at_page_ceiling() {
    let server = MockServer::start().await;

    // The provider always offers another page; only the ceiling stops us.
    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(2, Some("again"))))
        .expect(3)
        .mount(&server)
        .await;

    let engine = engine(
        &server,
        EngineOptions {
            social_max_pages: 3,
            ..options()
        },
    );

    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("engagement should succeed")
        .expect("posts were found");

    assert_eq!(windows.day.total_posts, 6, "3 pages x 2 posts");
}

#[tokio::test]
async fn pagination_never_exceeds_post_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(2, Some("again"))))
        .expect(3)
        .mount(&server)
        .await;

    let engine = engine(
        &server,
        EngineOptions {
            social_max_posts: 5,
            ..options()
        },
    );

    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("engagement should succeed")
        .expect("posts were found");

    assert_eq!(
        windows.day.total_posts, 5,
        "accumulation must stop at the absolute ceiling"
    );
}

#[tokio::test]
async fn pagination_stops_when_cursor_is_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(4, None)))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("engagement should succeed")
        .expect("posts were found");

    assert_eq!(windows.day.total_posts, 4);
}

// ---------------------------------------------------------------------------
// Fallback ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_primary_triggers_hashtag_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(0, None)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .and(query_param("name", "toothbrush sterilizer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "challengeInfo": { "challenge": { "id": "777" } }
        })))
        .mount(&server)
        .await;

    let ts = Utc::now().timestamp() - 900;
    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .and(query_param("id", "777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "itemList": [
                { "item": { "createTime": ts, "stats": { "diggCount": 9 } } },
                { "item": { "createTime": ts - 60, "stats": { "diggCount": 7 } } }
            ]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("fallback should succeed")
        .expect("hashtag posts were found");

    assert_eq!(windows.day.total_posts, 2);
}

#[tokio::test]
async fn failed_primary_triggers_hashtag_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .and(query_param("name", "toothbrush sterilizer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "challengeInfo": { "challenge": { "id": "777" } }
        })))
        .mount(&server)
        .await;

    let ts = Utc::now().timestamp() - 900;
    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .and(query_param("id", "777"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "itemList": [ { "item": { "createTime": ts, "stats": { "diggCount": 3 } } } ]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("fallback should absorb the primary failure")
        .expect("hashtag posts were found");

    assert_eq!(windows.day.total_posts, 1);
}

#[tokio::test]
async fn successful_primary_never_touches_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(3, None)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("primary should succeed")
        .expect("posts were found");

    assert_eq!(windows.day.total_posts, 3);
}

#[tokio::test]
async fn unknown_hashtag_is_no_data_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(0, None)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await
        .expect("unknown hashtag must not be an error");

    assert!(windows.is_none());
}

#[tokio::test]
async fn fallback_transport_failure_is_terminal_for_engagement() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(0, None)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let result = engine
        .engagement_metrics("toothbrush sterilizer", Utc::now())
        .await;

    assert!(result.is_err(), "non-404 fallback failures are surfaced");
}

#[tokio::test]
async fn weak_query_skips_the_provider_entirely() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(1, None)))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let windows = engine
        .engagement_metrics("a 1 2", Utc::now())
        .await
        .expect("weak query is a clean no-data outcome");

    assert!(windows.is_none());
}

// ---------------------------------------------------------------------------
// Assembly and partial results
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_assembles_partial_results_when_sections_fail() {
    let server = MockServer::start().await;

    // Shopping succeeds for both marketplaces.
    Mock::given(method("GET"))
        .and(query_param("engine", "google_shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "shopping_results": [
                { "title": "A", "price": "$5.00" },
                { "title": "B", "price": "$6.00" },
                { "title": "C", "price": "$7.00" }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    // Social has no data anywhere.
    Mock::given(method("GET"))
        .and(path("/public/search/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_page(0, None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/hashtag"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // The order-volume provider is down.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let insight = ProductInsight::from_description("uv toothbrush sterilizer");
    let metrics = engine.analyze(&insight).await;

    let resale = metrics.resale_value.expect("resale section should survive");
    assert!(resale.ali_express_average > 0.0);
    assert!(metrics.engagement.is_none());
    assert!(metrics.order_volume.is_none());
}

#[tokio::test]
async fn order_volume_classifies_fetched_counts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v2/acts/piotrv1001~aliexpress-listings-scraper/run-sync-get-dataset-items",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "totalSold": "5,000 sold" },
            { "totalSold": "10" }
        ])))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let volume = engine
        .order_volume("uv sterilizer")
        .await
        .expect("order volume should succeed")
        .expect("listings were found");

    assert_eq!(volume.volume_level, VolumeLevel::High);
    assert_eq!(volume.metrics.top_listing_orders, 5_000);
    assert_eq!(volume.metrics.total_orders, 5_010);
}

#[tokio::test]
async fn order_volume_with_no_listings_is_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let engine = engine(&server, options());
    let volume = engine
        .order_volume("uv sterilizer")
        .await
        .expect("empty dataset is not an error");

    assert!(volume.is_none());
}
