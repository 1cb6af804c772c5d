//! HTTP Endpoints
//!
//! REST API for the store agent.

use std::time::{Duration, Instant};

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use sari_sari_agent::ProductDescription;
use sari_sari_core::{Degradation, IntentKind, NlpMetrics, ProviderDescriptor, TurnRole};

use crate::metrics::{record_chat, record_error};
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_origins, state.config.server.cors_enabled);
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Conversation
        .route("/api/chat/:session_id", post(chat))
        .route("/api/products/describe", post(describe_product))
        // Router status
        .route("/api/nlp/metrics", get(nlp_metrics))
        .route("/api/nlp/metrics/reset", post(reset_nlp_metrics))
        .route("/api/providers", get(list_providers))
        .route("/api/providers/refresh", post(refresh_providers))
        // Health and Prometheus
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// CORS from configured origins, localhost:3000 when none are usable
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if parsed.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        return layer.allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN));
    }
    tracing::info!("CORS configured with {} origins", parsed.len());
    layer.allow_origin(parsed)
}

async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, ServerError> {
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.id,
            "greeting": state.generator.personality().greeting(&state.catalog.store_name),
        })),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::Session(format!("Unknown session {}", id)))?;
    let context = session.snapshot();

    Ok(Json(serde_json::json!({
        "session_id": session.id,
        "turn_count": context.history.len(),
        "current_intent": context.current_intent.as_ref().map(|i| i.name),
        "entities": context.entities,
        "dislikes": context.preferences.dislikes,
    })))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    intent: IntentKind,
    confidence: f32,
    provider: String,
    degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    degradation: Option<String>,
    negations: Vec<String>,
    latency_ms: u64,
}

/// One conversational turn: analyze, update the session, reply
async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let session = state.sessions.get(&session_id).ok_or_else(|| {
        record_error("chat");
        ServerError::Session(format!("Unknown session {}", session_id))
    })?;
    session.touch();

    let started = Instant::now();
    let analysis = state.nlp.analyze(&request.message, &session.snapshot()).await;
    let intent = analysis.intent.value().clone();
    let degradation = analysis.intent.outcome.degradation().cloned();

    let reply = {
        let mut context = session.context.lock();
        context.add_turn(TurnRole::Customer, request.message.trim());
        context.set_intent(intent.clone());
        for negation in &analysis.negations {
            context.add_dislike(&negation.negated_term);
        }

        let reply = state.generator.generate(&intent, &state.catalog, &context, Utc::now());
        context.add_turn(TurnRole::Agent, reply.text.clone());
        if let Some(attempt) = &reply.upsell {
            context.record_upsell(attempt.clone());
        }
        if let Some(attempt) = &reply.negotiation {
            context.record_negotiation(attempt.clone());
        }
        reply
    };

    let latency_ms = started.elapsed().as_millis() as u64;
    record_chat(
        intent.name.as_str(),
        &analysis.intent.provider,
        degradation.as_ref().map(Degradation::kind),
        latency_ms,
    );
    tracing::debug!(
        session_id = %session.id,
        intent = %intent.name,
        provider = %analysis.intent.provider,
        latency_ms,
        "Chat turn"
    );

    Ok(Json(ChatResponse {
        response: reply.text,
        intent: intent.name,
        confidence: intent.confidence,
        provider: analysis.intent.provider,
        degraded: degradation.is_some(),
        degradation: degradation.map(|d| d.to_string()),
        negations: analysis.negations.into_iter().map(|n| n.negated_term).collect(),
        latency_ms,
    }))
}

#[derive(Debug, Deserialize)]
struct DescribeRequest {
    message: String,
}

async fn describe_product(
    State(state): State<AppState>,
    Json(request): Json<DescribeRequest>,
) -> Result<Json<ProductDescription>, ServerError> {
    state
        .nlp
        .extract_product_description(&request.message)
        .await
        .map(Json)
        .map_err(|e| {
            record_error("describe");
            e.into()
        })
}

async fn nlp_metrics(State(state): State<AppState>) -> Json<NlpMetrics> {
    Json(state.nlp.metrics())
}

async fn reset_nlp_metrics(State(state): State<AppState>) -> StatusCode {
    state.nlp.reset_metrics();
    tracing::info!("NLP metrics reset");
    StatusCode::NO_CONTENT
}

async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderDescriptor>> {
    Json(state.nlp.router().descriptors())
}

async fn refresh_providers(State(state): State<AppState>) -> Json<Vec<ProviderDescriptor>> {
    state.nlp.router().refresh_availability().await;
    Json(state.nlp.router().descriptors())
}

/// Always 200: with no provider up the fallback classifier still answers
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let providers = state.nlp.router().descriptors();
    let available = providers.iter().filter(|p| p.available).count();
    let selected = state.nlp.router().select_provider().ok().map(|d| d.name);

    Json(serde_json::json!({
        "status": if available > 0 { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "providers": {
                "available": available,
                "registered": providers.len(),
                "selected": selected,
            },
            "sessions": {
                "count": state.sessions.count(),
            },
            "search": {
                "configured": state.config.search.endpoint.is_some(),
            },
        }
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics export disabled".to_string()),
    }
}
