use std::time::Duration;

use biograf_fetch::mock::MockClient;
use biograf_fetch::{
    CHUNK_SIZE, Error, FetchOptions, Fetcher, ManifestRef, SegmentPlanner, planned_bytes,
};

const ORIGIN: &str = "https://media.example.com/";

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn fetcher(client: &MockClient) -> Fetcher<MockClient> {
    Fetcher::new(client.clone(), ORIGIN)
        .unwrap()
        .with_options(FetchOptions::default().max_retries(0))
}

#[tokio::test]
async fn test_fetch_range_honored() {
    let client = MockClient::new();
    let body = pattern(10_000);
    client.insert("https://media.example.com/a.mp4", body.clone(), Some("video/mp4"));

    let fetcher = fetcher(&client);
    let url = fetcher.resolve("a.mp4").unwrap();
    let bytes = fetcher.fetch_range(&url, 100, 4_196).await.unwrap();

    assert_eq!(&bytes[..], &body[100..4_196]);
    assert_eq!(
        client.requests(),
        vec![(url.to_string(), Some("bytes=100-4195".to_string()))]
    );
}

#[tokio::test]
async fn test_fetch_range_when_origin_ignores_range() {
    let client = MockClient::new();
    let body = pattern(300_000);
    client.insert("https://media.example.com/a.mp4", body.clone(), None);
    client.ignore_range(true);

    let fetcher = fetcher(&client);
    let url = fetcher.resolve("a.mp4").unwrap();
    let bytes = fetcher.fetch_range(&url, 70_000, 200_000).await.unwrap();

    assert_eq!(bytes.len(), 130_000);
    assert_eq!(&bytes[..], &body[70_000..200_000]);
}

#[tokio::test]
async fn test_fetch_range_short_body() {
    let client = MockClient::new();
    client.insert("https://media.example.com/a.mp4", pattern(1_000), None);
    client.ignore_range(true);

    let fetcher = fetcher(&client);
    let url = fetcher.resolve("a.mp4").unwrap();
    let err = fetcher.fetch_range(&url, 500, 2_000).await.unwrap_err();

    assert!(matches!(
        err,
        Error::UnexpectedLength {
            expected: 1_500,
            actual: 500,
            ..
        }
    ));
}

#[tokio::test]
async fn test_fetch_range_missing_resource() {
    let client = MockClient::new();
    let fetcher = fetcher(&client);
    let url = fetcher.resolve("missing.mp4").unwrap();

    let err = fetcher.fetch_range(&url, 0, 10).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_range_retries_transient_failures() {
    let client = MockClient::new();
    client.insert("https://media.example.com/a.mp4", pattern(100), None);
    client.fail_next(2);

    let fetcher = Fetcher::new(client.clone(), ORIGIN).unwrap().with_options(
        FetchOptions::default()
            .max_retries(2)
            .retry_backoff(Duration::from_millis(1)),
    );
    let url = fetcher.resolve("a.mp4").unwrap();
    let bytes = fetcher.fetch_range(&url, 0, 100).await.unwrap();

    assert_eq!(bytes.len(), 100);
    assert_eq!(client.requests().len(), 3);
}

#[tokio::test]
async fn test_fetch_range_gives_up_after_retries() {
    let client = MockClient::new();
    client.insert("https://media.example.com/a.mp4", pattern(100), None);
    client.fail_next(5);

    let fetcher = Fetcher::new(client.clone(), ORIGIN).unwrap().with_options(
        FetchOptions::default()
            .max_retries(1)
            .retry_backoff(Duration::from_millis(1)),
    );
    let url = fetcher.resolve("a.mp4").unwrap();
    let err = fetcher.fetch_range(&url, 0, 100).await.unwrap_err();

    assert!(matches!(err, Error::MaxRetriesExceeded { count: 2, .. }));
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let client = MockClient::new();
    client.insert("https://media.example.com/a.mp4", pattern(10), None);

    let fetcher = Fetcher::new(client.clone(), ORIGIN)
        .unwrap()
        .with_options(FetchOptions::default().header("X-Token", "abc"));
    let url = fetcher.resolve("a.mp4").unwrap();
    let response = fetcher.send(&url, &[]).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("Content-Length"), Some("10"));
}

#[tokio::test]
async fn test_plan_full_resources() {
    let client = MockClient::new();
    client.insert(
        "https://media.example.com/show/ep-1/mp4/offline-720p.mpd",
        pattern(2_000),
        Some("application/dash+xml"),
    );
    client.insert(
        "https://media.example.com/show/ep-1/mp4/v-0720p-2500k-libx264.mp4",
        pattern(1_224_576),
        None,
    );

    let fetcher = fetcher(&client);
    let refs = [
        ManifestRef::renamed("mp4/offline-720p.mpd", "mp4/dash.mpd"),
        ManifestRef::new("mp4/v-0720p-2500k-libx264.mp4"),
    ];
    let plan = SegmentPlanner::default()
        .plan(&fetcher, "show/ep-1", &refs)
        .await
        .unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].path, "show/ep-1/mp4/dash.mpd");
    assert_eq!(plan[0].content_type.as_deref(), Some("application/dash+xml"));
    assert_eq!(plan[0].segments.len(), 1);

    assert_eq!(plan[1].length, 1_224_576);
    assert_eq!(plan[1].content_type.as_deref(), Some("video/mp4"));
    let sizes: Vec<u64> = plan[1].segments.iter().map(|s| s.len()).collect();
    assert_eq!(sizes, vec![CHUNK_SIZE, CHUNK_SIZE, 176_000]);
    assert!(!plan[1].is_partial());
    assert_eq!(planned_bytes(&plan), 1_226_576);
}

#[tokio::test]
async fn test_plan_prefix_limits_large_resources() {
    let client = MockClient::new();
    client.insert("https://media.example.com/show/ep-1/mp4/dash.mpd", pattern(2_000), None);
    client.insert(
        "https://media.example.com/show/ep-1/mp4/v-0480p-1000k-libx264.mp4",
        pattern(5 * CHUNK_SIZE as usize),
        None,
    );

    let fetcher = fetcher(&client);
    let refs = [
        ManifestRef::new("mp4/dash.mpd"),
        ManifestRef::new("mp4/v-0480p-1000k-libx264.mp4"),
    ];
    let plan = SegmentPlanner::default()
        .plan_prefix(&fetcher, "show/ep-1", &refs, CHUNK_SIZE + 1)
        .await
        .unwrap();

    assert_eq!(plan[0].planned, 2_000);
    assert!(!plan[0].is_partial());
    assert_eq!(plan[1].planned, 2 * CHUNK_SIZE);
    assert_eq!(plan[1].segments.len(), 2);
    assert!(plan[1].is_partial());
}

#[tokio::test]
async fn test_plan_unknown_length() {
    let client = MockClient::new();
    let url = "https://media.example.com/show/ep-1/poster.jpg";
    client.insert(url, pattern(10), None);
    client.hide_length(url);

    let fetcher = fetcher(&client);
    let err = SegmentPlanner::default()
        .plan(&fetcher, "show/ep-1", &[ManifestRef::new("poster.jpg")])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownLength { .. }));
}

#[tokio::test]
async fn test_plan_empty_resource() {
    let client = MockClient::new();
    client.insert("https://media.example.com/e/empty.vtt", Vec::<u8>::new(), None);

    let fetcher = fetcher(&client);
    let plan = SegmentPlanner::default()
        .plan(&fetcher, "e", &[ManifestRef::new("empty.vtt")])
        .await
        .unwrap();

    assert_eq!(plan[0].length, 0);
    assert!(plan[0].segments.is_empty());
}
