pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::prediction::handlers as prediction;
use crate::recommendation::handlers as recommendation;
use crate::scoring::handlers as scoring;
use crate::state::AppState;
use crate::tracking::handlers as tracking;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles and postings
        .route("/api/v1/resumes/parse", post(extraction::handle_parse_resume))
        .route(
            "/api/v1/resumes/:candidate_id",
            get(extraction::handle_get_resume),
        )
        .route("/api/v1/jobs", post(extraction::handle_create_job))
        .route("/api/v1/jobs/parse", post(extraction::handle_parse_job))
        // Scoring
        .route("/api/v1/match", post(scoring::handle_match))
        .route(
            "/api/v1/recommendations",
            post(recommendation::handle_recommendations),
        )
        // Applications
        .route("/api/v1/applications", post(tracking::handle_apply))
        .route(
            "/api/v1/applications/bulk-transition",
            post(tracking::handle_bulk_transition),
        )
        .route(
            "/api/v1/applications/:id/transition",
            post(tracking::handle_transition),
        )
        .route(
            "/api/v1/applications/:id/history",
            get(tracking::handle_history),
        )
        .route(
            "/api/v1/applications/:id/prediction",
            get(prediction::handle_get_prediction),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::matching::SkillMatchMode;
    use crate::prediction::PredictorConfig;
    use crate::scoring::ScoreWeights;
    use crate::state::Repositories;
    use crate::store::MemoryStore;

    fn test_config() -> Config {
        Config {
            database_url: None,
            redis_url: None,
            anthropic_api_key: None,
            port: 0,
            rust_log: "debug".to_string(),
            llm_timeout: Duration::from_secs(1),
            llm_max_retries: 0,
            score_weights: ScoreWeights::default(),
            skill_match_mode: SkillMatchMode::Exact,
            recommendation_workers: 4,
            recommendation_deadline: Duration::from_secs(5),
            recommendation_top_n: 10,
            match_cache_ttl: Duration::from_secs(60),
            predictor: PredictorConfig::default(),
        }
    }

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories {
            resumes: store.clone(),
            jobs: store.clone(),
            applications: store,
        };
        build_router(AppState::new(test_config(), repos, None, None))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seed(app: &Router) -> (Uuid, Uuid) {
        let candidate_id = Uuid::new_v4();
        let (status, _) = call(
            app,
            Method::POST,
            "/api/v1/resumes/parse",
            Some(json!({
                "candidate_id": candidate_id,
                "text": "Ada Lovelace\n\nSkills\nPython, SQL\n"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/jobs",
            Some(json!({"posting": {
                "title": "Data Engineer",
                "company": "Acme Corp",
                "skills_required": ["Python", "Go"]
            }})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let job_id: Uuid = serde_json::from_value(body["job"]["id"].clone()).unwrap();
        (candidate_id, job_id)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_application_lifecycle() {
        let app = app();
        let (candidate_id, job_id) = seed(&app).await;
        let apply = json!({"candidate_id": candidate_id, "job_id": job_id});

        let (status, body) =
            call(&app, Method::POST, "/api/v1/applications", Some(apply.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["created"], true);
        assert_eq!(body["application"]["status"], "pending");
        assert!(body["application"]["score_snapshot"].is_number());
        let id = body["application"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::POST, "/api/v1/applications", Some(apply)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], false);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{id}/transition"),
            Some(json!({"new_status": "ai_screening", "metadata": {"notes": "auto"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["application"]["version"], 2);

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/applications/{id}/transition"),
            Some(json!({"new_status": "hired"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/applications/{id}/history"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let statuses: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses, vec!["ai_screening", "pending"]);

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/applications/{id}/prediction"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let p = body["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(!body["explanations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_transition_reports_per_item() {
        let app = app();
        let (candidate_id, job_id) = seed(&app).await;
        call(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({"candidate_id": candidate_id, "job_id": job_id})),
        )
        .await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/applications/bulk-transition",
            Some(json!({"items": [
                {"candidate_id": candidate_id, "job_id": job_id, "new_status": "ai_screening"},
                {"candidate_id": candidate_id, "job_id": Uuid::new_v4(), "new_status": "ai_screening"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["results"][1]["error_code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bulk_transition_bad_status_fails_only_its_item() {
        let app = app();
        let (candidate_id, job_id) = seed(&app).await;
        let (_, body) = call(
            &app,
            Method::POST,
            "/api/v1/applications",
            Some(json!({"candidate_id": candidate_id, "job_id": job_id})),
        )
        .await;
        let id = body["application"]["id"].clone();

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/applications/bulk-transition",
            Some(json!({"items": [
                {"application_id": id, "new_status": "ai_screening"},
                {"application_id": id, "new_status": "archived"},
                {"application_id": id, "new_status": "rejected"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 2);
        assert_eq!(body["failed"], 1);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["status"], "ai_screening");
        assert_eq!(results[1]["success"], false);
        assert_eq!(results[1]["error_code"], "VALIDATION_ERROR");
        assert_eq!(results[2]["status"], "rejected");
    }

    #[tokio::test]
    async fn test_match_inline_and_stored() {
        let app = app();
        let (candidate_id, job_id) = seed(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/match",
            Some(json!({"candidate_id": candidate_id, "job_id": job_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skill_score"], 50.0);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/match",
            Some(json!({"profile": "not an object", "job": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_recommendations() {
        let app = app();
        let (candidate_id, job_id) = seed(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/recommendations",
            Some(json!({"candidate_id": candidate_id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["recommendations"][0]["job_id"], job_id.to_string());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/recommendations",
            Some(json!({"candidate_id": Uuid::new_v4()})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_resume_includes_experience() {
        let app = app();
        let (candidate_id, _) = seed(&app).await;

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/api/v1/resumes/{candidate_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resume"]["profile"]["name"], "Ada Lovelace");
        assert_eq!(body["experience"]["total_months"], 0);

        let (status, _) = call(
            &app,
            Method::GET,
            &format!("/api/v1/resumes/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_resume_text_is_rejected() {
        let (status, body) = call(
            &app(),
            Method::POST,
            "/api/v1/resumes/parse",
            Some(json!({"candidate_id": Uuid::new_v4(), "text": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
