use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::BackendKind;
use crate::error::{ProveError, VerifyError};
use crate::field::{self, FIELD_ELEMENT_BYTES};
use crate::prover::ProverService;
use crate::recording::RecordingVerifier;
use crate::relation::PUBLIC_INPUT_COUNT;
use crate::types::{
    ErrorResponse, HealthResponse, ProveRequest, ProveResponse, RecordResponse, VerifyRequest,
    VerifyResponse,
};
use crate::verifier::{verify_encoded, Verifier};

/// Shared application state passed to all route handlers.
///
/// The recording verifier sits behind a Mutex: one `verify-and-store`
/// completes, record update and audit event included, before the next starts.
pub struct AppState {
    pub backend: BackendKind,
    pub prover: ProverService,
    pub verifier: Arc<dyn Verifier>,
    pub recorder: Mutex<RecordingVerifier>,
}

impl AppState {
    pub fn new(backend: crate::backend::Backend) -> Self {
        Self {
            backend: backend.kind,
            prover: ProverService::new(backend.prover),
            recorder: Mutex::new(RecordingVerifier::new(backend.verifier.clone())),
            verifier: backend.verifier,
        }
    }
}

fn reply<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

fn error_reply(status: StatusCode, error: impl ToString) -> Response {
    reply(
        status,
        ErrorResponse {
            error: error.to_string(),
        },
    )
}

fn prove_error_status(e: &ProveError) -> StatusCode {
    match e {
        ProveError::Witness(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn verify_error_status(e: &VerifyError) -> StatusCode {
    match e {
        VerifyError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Decode the hex proof, and the public inputs into their concatenated word encoding.
fn decode_verify_request(req: &VerifyRequest) -> Result<(Vec<u8>, Vec<u8>), VerifyError> {
    let digits = req.proof.strip_prefix("0x").unwrap_or(&req.proof);
    let proof = hex::decode(digits)
        .map_err(|e| VerifyError::MalformedProof(format!("invalid hex: {}", e)))?;
    let mut words = Vec::with_capacity(req.public_inputs.len() * FIELD_ELEMENT_BYTES);
    for input in &req.public_inputs {
        words.extend(field::word_from_hex(input)?);
    }
    Ok((proof, words))
}

/// POST /prove: Generate a proof for a private witness.
///
/// Request body: ProveRequest { base, exponent, modulus }
/// Response: ProveResponse { proof, publicInputs } (hex-encoded)
pub async fn prove_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProveRequest>,
) -> Response {
    match state.prover.prove(req.base, req.exponent, req.modulus).await {
        Ok(artifact) => reply(
            StatusCode::OK,
            ProveResponse {
                proof: artifact.proof_hex(),
                public_inputs: artifact.public_inputs_hex(),
            },
        ),
        Err(e) => {
            tracing::warn!("Prove request failed: {}", e);
            error_reply(prove_error_status(&e), e)
        }
    }
}

/// POST /verify: Verify a proof without touching the record.
///
/// Request body: VerifyRequest { proof, publicInputs }
/// Response: VerifyResponse { isValid: bool }
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let outcome = decode_verify_request(&req)
        .and_then(|(proof, words)| verify_encoded(state.verifier.as_ref(), &proof, &words));

    match outcome {
        Ok(is_valid) => {
            tracing::info!("Verification result: {}", is_valid);
            reply(StatusCode::OK, VerifyResponse { is_valid })
        }
        Err(e) => error_reply(verify_error_status(&e), e),
    }
}

/// POST /verify-and-store: Verify a proof and record the outcome.
///
/// Request body: VerifyRequest { proof, publicInputs }
/// Response: VerifyResponse { isValid: bool }
pub async fn verify_and_store_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let decoded = decode_verify_request(&req)
        .and_then(|(proof, words)| Ok((proof, field::decode_all(&words)?)));
    let (proof, inputs) = match decoded {
        Ok(decoded) => decoded,
        Err(e) => return error_reply(verify_error_status(&e), e),
    };

    let mut recorder = state.recorder.lock().await;
    match recorder.verify_and_store(&proof, &inputs) {
        Ok(is_valid) => reply(StatusCode::OK, VerifyResponse { is_valid }),
        Err(e) => error_reply(verify_error_status(&e), e),
    }
}

/// GET /record: The most recent stored verification.
pub async fn record_handler(State(state): State<Arc<AppState>>) -> Response {
    let recorder = state.recorder.lock().await;
    reply(
        StatusCode::OK,
        RecordResponse {
            last_result: recorder.last_result(),
            last_public_inputs: recorder
                .last_public_inputs()
                .iter()
                .map(field::to_hex)
                .collect(),
        },
    )
}

/// GET /health: Health check endpoint.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    reply(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
            backend: state.backend.as_str().to_string(),
            public_input_count: PUBLIC_INPUT_COUNT,
        },
    )
}

/// Build the axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/prove", post(prove_handler))
        .route("/verify", post(verify_handler))
        .route("/verify-and-store", post(verify_and_store_handler))
        .route("/record", get(record_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}
