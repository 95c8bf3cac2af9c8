//! API integration tests.
//!
//! Drive the router in-process with `tower::ServiceExt::oneshot` against an
//! in-memory job store and scripted pipeline collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use reclip_api::{create_router, ApiConfig, AppState};
use reclip_models::{CandidateSegment, Clip, ClipEnrichment, Constraints, Job};
use reclip_storage::InMemoryObjectStore;
use reclip_store::InMemoryJobRepository;
use reclip_worker::{
    ClipEnricher, EnrichmentContext, IngestedMedia, JobExecutor, JobOrchestrator,
    MediaIngestor, ProcessingContext, ScoringOutcome, SegmentScorer, WorkerConfig, WorkerResult,
};

struct PassThroughIngestor;

#[async_trait]
impl MediaIngestor for PassThroughIngestor {
    async fn ingest(&self, job: &Job) -> WorkerResult<IngestedMedia> {
        Ok(IngestedMedia {
            file_uri: job.media_reference(),
            mime_type: "video/mp4".to_string(),
        })
    }
}

struct FixedScorer;

#[async_trait]
impl SegmentScorer for FixedScorer {
    async fn score(
        &self,
        _media: &IngestedMedia,
        _constraints: &Constraints,
    ) -> WorkerResult<ScoringOutcome> {
        Ok(ScoringOutcome {
            segments: vec![
                CandidateSegment::new(10.0, 40.0, 9.2),
                CandidateSegment::new(20.0, 50.0, 8.0),
                CandidateSegment::new(60.0, 90.0, 7.5),
            ],
            transcript: None,
        })
    }
}

struct TitleEnricher;

#[async_trait]
impl ClipEnricher for TitleEnricher {
    async fn enrich(&self, clip: &Clip, _context: &EnrichmentContext) -> WorkerResult<ClipEnrichment> {
        Ok(ClipEnrichment {
            title: format!("Moment at {}s", clip.start_time),
            description: "A highlight".to_string(),
            hook_text: "Watch this".to_string(),
            captions: Vec::new(),
            hashtags: vec!["clips".to_string()],
        })
    }
}

fn app_with(repo: &InMemoryJobRepository, config: ApiConfig) -> Router {
    let ctx = ProcessingContext::new(
        Arc::new(repo.clone()),
        Arc::new(PassThroughIngestor),
        Arc::new(FixedScorer),
        Arc::new(TitleEnricher),
    );
    let executor = Arc::new(JobExecutor::new(WorkerConfig::default(), ctx));
    let orchestrator = Arc::new(JobOrchestrator::new(Arc::new(repo.clone()), executor));
    let state = AppState::new(config, orchestrator, Arc::new(InMemoryObjectStore::new()));
    create_router(state, None)
}

fn app(repo: &InMemoryJobRepository) -> Router {
    app_with(repo, ApiConfig::default())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn create_body() -> Value {
    json!({
        "action": "create_job",
        "owner": "user-1",
        "source": { "kind": "url", "url": "https://example.com/talk.mp4" },
        "constraints": { "targetClipCount": 5 }
    })
}

async fn wait_terminal(app: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send(
            app,
            post_json("/api/jobs", json!({ "action": "get_status", "jobId": job_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        if matches!(body["state"].as_str(), Some("completed" | "failed" | "cancelled")) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {} did not finish", job_id);
}

#[tokio::test]
async fn test_health() {
    let repo = InMemoryJobRepository::new();
    let (status, body) = send(&app(&repo), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_checks() {
    let repo = InMemoryJobRepository::new();
    let (status, body) = send(&app(&repo), get("/ready")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["job_store"]["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_create_job_returns_queued_then_completes() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);

    let (status, body) = send(&app, post_json("/api/jobs", create_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "queued");
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let job = wait_terminal(&app, &job_id).await;
    assert_eq!(job["state"], "completed");
    assert_eq!(job["progress"], 100);

    // 20-50 overlaps the better 10-40 pick and is rejected.
    let clips = job["result"]["clips"].as_array().unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0]["title"], "Moment at 10s");
    assert_eq!(clips[0]["viralityScore"], 92);
    assert_eq!(clips[1]["title"], "Moment at 60s");
}

#[tokio::test]
async fn test_create_job_missing_source_is_rejected() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);

    let (status, body) = send(
        &app,
        post_json("/api/jobs", json!({ "action": "create_job", "owner": "user-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_create_job_missing_owner_is_rejected() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);

    let (status, _) = send(
        &app,
        post_json(
            "/api/jobs/create",
            json!({ "source": { "kind": "url", "url": "https://example.com/talk.mp4" } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_invalid_constraints_are_rejected() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);

    let mut body = create_body();
    body["constraints"] = json!({ "minDurationSeconds": 90, "maxDurationSeconds": 30 });
    let (status, _) = send(&app, post_json("/api/jobs", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let repo = InMemoryJobRepository::new();
    let (status, body) = send(
        &app(&repo),
        post_json("/api/jobs", json!({ "action": "delete_job", "jobId": "abcd1234" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);
    let unknown = "550e8400-e29b-41d4-a716-446655440000";

    let (status, body) = send(
        &app,
        post_json("/api/jobs", json!({ "action": "get_status", "jobId": unknown })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = send(&app, get(&format!("/api/jobs/{}", unknown))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        post_json(&format!("/api/jobs/{}/cancel", unknown), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_job_id_is_bad_request() {
    let repo = InMemoryJobRepository::new();
    let (status, _) = send(&app(&repo), get("/api/jobs/not%20an%20id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_completed_job_is_conflict() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);

    let (_, body) = send(&app, post_json("/api/jobs", create_body())).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    wait_terminal(&app, &job_id).await;

    let (status, body) = send(
        &app,
        post_json("/api/jobs", json!({ "action": "cancel_job", "jobId": job_id })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_state");
}

#[tokio::test]
async fn test_cancel_queued_job() {
    let repo = InMemoryJobRepository::new();
    let app = app(&repo);
    let job = Job::new(
        "user-1",
        reclip_models::MediaSource::url("https://example.com/talk.mp4"),
        Constraints::default(),
    );
    reclip_store::JobRepository::put(&repo, &job).await.unwrap();

    let (status, body) = send(
        &app,
        post_json(&format!("/api/jobs/{}/cancel", job.id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get(&format!("/api/jobs/{}", job.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "cancelled");
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let repo = InMemoryJobRepository::new();
    let app = app_with(
        &repo,
        ApiConfig {
            rate_limit_rps: 1,
            rate_limit_burst: 1,
            ..ApiConfig::default()
        },
    );
    let from = |ip: &str| {
        Request::builder()
            .uri("/api/jobs/550e8400-e29b-41d4-a716-446655440000")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, from("203.0.113.7")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, from("203.0.113.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");

    let (status, _) = send(&app, from("203.0.113.8")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Probes are not rate limited.
    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let repo = InMemoryJobRepository::new();
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app(&repo).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["X-Request-ID"], "req-123");
}
