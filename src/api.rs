// API module for headless mode - HTTP endpoints to drive the growth simulation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::environment::{ControlInput, EnvironmentSample};
use crate::error::GrowthError;
use crate::export::DrawPrimitive;
use crate::simulation::{Simulation, Status};
use ::rand::rngs::StdRng;
use ::rand::SeedableRng;

/// Upper bound on `steps` per request so one call cannot stall the server.
pub const MAX_STEPS_PER_REQUEST: usize = 10_000;

#[derive(Serialize, Clone)]
pub struct SimulationStateResponse {
    pub status: Status,
    pub environment: EnvironmentSample,
    pub controls: ControlInput,
    pub primitives: Vec<DrawPrimitive>,
}

#[derive(Deserialize)]
pub struct StepQuery {
    pub steps: Option<usize>,
    pub dt: Option<f32>,
}

#[derive(Deserialize)]
pub struct ArchetypeRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, err: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn lock_error<E>(_: E) -> (StatusCode, Json<ErrorResponse>) {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "simulation lock poisoned")
}

fn growth_error(err: GrowthError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        GrowthError::InvalidArchetype(_) | GrowthError::InvalidConfig(_) => {
            api_error(StatusCode::BAD_REQUEST, err)
        }
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

// Shared state for the API server
#[derive(Clone)]
pub struct ApiState {
    pub simulation: Arc<Mutex<Simulation>>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl ApiState {
    pub fn new(sim: Simulation) -> Self {
        let rng = match sim.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(sim, rng)
    }

    pub fn with_rng(sim: Simulation, rng: StdRng) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(sim)),
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}

// Helper function to convert simulation state to API response
pub fn simulation_to_response(sim: &Simulation) -> SimulationStateResponse {
    SimulationStateResponse {
        status: sim.status(),
        environment: sim.environment,
        controls: sim.environment.to_controls(),
        primitives: sim.primitives(),
    }
}

// GET /state - Get current simulation state
async fn get_state(State(api_state): State<ApiState>) -> ApiResult<SimulationStateResponse> {
    let sim = api_state.simulation.lock().map_err(lock_error)?;
    Ok(Json(simulation_to_response(&sim)))
}

// GET /stats - Get simulation status
async fn get_stats(State(api_state): State<ApiState>) -> ApiResult<Status> {
    let sim = api_state.simulation.lock().map_err(lock_error)?;
    Ok(Json(sim.status()))
}

// POST /step - Step the simulation forward
async fn step_simulation(
    Query(params): Query<StepQuery>,
    State(api_state): State<ApiState>,
) -> ApiResult<SimulationStateResponse> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    let mut rng = api_state.rng.lock().map_err(lock_error)?;

    let steps = params.steps.unwrap_or(1).min(MAX_STEPS_PER_REQUEST);
    let dt = params.dt.unwrap_or(1.0);
    if !dt.is_finite() || dt < 0.0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "dt must be a non-negative number"));
    }

    for _ in 0..steps {
        sim.step(dt, &mut *rng);
    }

    Ok(Json(simulation_to_response(&sim)))
}

// POST /reset - Reset the simulation
async fn reset_simulation(State(api_state): State<ApiState>) -> ApiResult<SimulationStateResponse> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    let mut rng = api_state.rng.lock().map_err(lock_error)?;

    sim.reset(&mut *rng);

    Ok(Json(simulation_to_response(&sim)))
}

// POST /pause - Toggle pause
async fn pause_simulation(State(api_state): State<ApiState>) -> ApiResult<serde_json::Value> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    sim.toggle_pause();
    Ok(Json(serde_json::json!({ "paused": sim.paused })))
}

// POST /speed - Toggle fast growth
async fn toggle_speed(State(api_state): State<ApiState>) -> ApiResult<serde_json::Value> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    sim.toggle_fast_growth();
    Ok(Json(serde_json::json!({ "speed_multiplier": sim.speed_multiplier })))
}

// PUT /environment - Replace the control values (raw UI scale)
async fn put_environment(
    State(api_state): State<ApiState>,
    Json(input): Json<ControlInput>,
) -> ApiResult<SimulationStateResponse> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    sim.set_controls(&input);
    Ok(Json(simulation_to_response(&sim)))
}

// PUT /archetype - Switch archetype and reset
async fn put_archetype(
    State(api_state): State<ApiState>,
    Json(request): Json<ArchetypeRequest>,
) -> ApiResult<SimulationStateResponse> {
    let mut sim = api_state.simulation.lock().map_err(lock_error)?;
    let mut rng = api_state.rng.lock().map_err(lock_error)?;
    sim.set_archetype(&request.name, &mut *rng).map_err(growth_error)?;
    Ok(Json(simulation_to_response(&sim)))
}

// GET /config - Get simulation configuration
async fn get_config(State(api_state): State<ApiState>) -> ApiResult<SimulationConfig> {
    let sim = api_state.simulation.lock().map_err(lock_error)?;
    Ok(Json(sim.config.clone()))
}

// Create the API router
pub fn create_router(api_state: ApiState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/stats", get(get_stats))
        .route("/step", post(step_simulation))
        .route("/reset", post(reset_simulation))
        .route("/pause", post(pause_simulation))
        .route("/speed", post(toggle_speed))
        .route("/environment", put(put_environment))
        .route("/archetype", put(put_archetype))
        .route("/config", get(get_config))
        .layer(CorsLayer::permissive())
        .with_state(api_state)
}

// Run the API server with automatic simulation stepping
pub async fn run_server(api_state: ApiState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(api_state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port, "sproutsim headless API server running on http://localhost:{}", port);
    info!("  GET  /state        - organism status, environment and draw primitives");
    info!("  GET  /stats        - status only");
    info!("  POST /step?steps=N&dt=X - step N times with dt X (defaults 1, 1.0)");
    info!("  POST /reset        - fresh organism of the current archetype");
    info!("  POST /pause        - toggle pause");
    info!("  POST /speed        - toggle fast growth");
    info!("  PUT  /environment  - set light/spectrum/humidity (0..100) and temperature (°C)");
    info!("  PUT  /archetype    - switch archetype ({{\"name\": \"tree\"}})");
    info!("  GET  /config       - simulation configuration");
    info!("Simulation is advancing automatically at ~60 FPS (respects pause state)");

    // Spawn background task to continuously step the simulation
    let simulation_task = tokio::spawn(simulation_loop(api_state.clone()));

    // Run the server
    let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

    // Wait for either task to complete
    tokio::select! {
        result = server_handle => {
            result??;
        }
        _ = simulation_task => {
            warn!("simulation loop ended unexpectedly");
        }
    }

    Ok(())
}

// Background task that continuously advances the simulation in frame mode
async fn simulation_loop(api_state: ApiState) {
    const TARGET_FPS: f32 = 60.0;
    let frame_duration = std::time::Duration::from_secs_f32(1.0 / TARGET_FPS);
    let mut last = std::time::Instant::now();

    loop {
        let start = std::time::Instant::now();
        let elapsed_ms = start.duration_since(last).as_secs_f32() * 1000.0;
        last = start;

        {
            let mut sim = match api_state.simulation.lock() {
                Ok(sim) => sim,
                Err(_) => break,
            };
            let mut rng = match api_state.rng.lock() {
                Ok(rng) => rng,
                Err(_) => break,
            };
            sim.advance_frame(elapsed_ms, &mut *rng);
        }

        // Sleep to maintain target FPS
        let elapsed = start.elapsed();
        if elapsed < frame_duration {
            tokio::time::sleep(frame_duration - elapsed).await;
        }
    }
}
