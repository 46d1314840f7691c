//! # API REST
//!
//! REST API for the report-template engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! All report logic lives in `report-core`; handlers only translate between JSON and the
//! core service. The server binary is the workspace's `report-run`.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::{
    definition_from_dtos, dtos_from_definition, BuildTemplateReq, DecodeTemplateReq,
    DecodeTemplateRes, FieldDto, FormDataRes, HealthRes, MarkupRes, RenderResultReq,
    RenderResultRes, ResultRecordRes, SaveResultReq, SeedResultReq, TemplateRes,
};
use report_core::{
    build_document, codec, render_form_data, RecordKey, ReportError, ReportService, ResultForm,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ReportService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        build_template,
        decode_template,
        get_template,
        put_template,
        seed_result,
        render_result,
        put_result,
        get_result,
    ),
    components(schemas(
        HealthRes,
        FieldDto,
        BuildTemplateReq,
        MarkupRes,
        DecodeTemplateReq,
        DecodeTemplateRes,
        TemplateRes,
        SeedResultReq,
        FormDataRes,
        RenderResultReq,
        RenderResultRes,
        SaveResultReq,
        ResultRecordRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router, including Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/templates/build", post(build_template))
        .route("/templates/decode", post(decode_template))
        .route("/templates/:test_id", get(get_template).put(put_template))
        .route("/results/seed", post(seed_result))
        .route("/results/render", post(render_result))
        .route("/results/:test_id/:token", get(get_result).put(put_result))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

/// Maps core errors onto HTTP status codes. Internal details are logged, not returned.
fn api_error(e: ReportError) -> ApiError {
    match e {
        ReportError::TemplateNotFound(_) | ReportError::ResultNotFound(_) => {
            (StatusCode::NOT_FOUND, e.to_string())
        }
        ReportError::InvalidInput(_)
        | ReportError::Key(_)
        | ReportError::FieldIndexOutOfRange { .. }
        | ReportError::PartOutOfRange { .. } => (StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            tracing::error!("report service error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
        }
    }
}

fn parse_key(raw: &str) -> Result<RecordKey, ApiError> {
    RecordKey::parse(raw).map_err(|e| api_error(ReportError::Key(e)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Report API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/templates/build",
    request_body = BuildTemplateReq,
    responses(
        (status = 200, description = "Template markup", body = MarkupRes)
    )
)]
/// Builds template markup from a field list without storing it.
#[axum::debug_handler]
async fn build_template(
    State(_state): State<AppState>,
    Json(req): Json<BuildTemplateReq>,
) -> Json<MarkupRes> {
    let definition = definition_from_dtos(req.fields);
    Json(MarkupRes {
        markup: build_document(&definition),
    })
}

#[utoipa::path(
    post,
    path = "/templates/decode",
    request_body = DecodeTemplateReq,
    responses(
        (status = 200, description = "Decoded fields, or null for free-form markup", body = DecodeTemplateRes)
    )
)]
/// Decodes the field definition embedded in template markup.
#[axum::debug_handler]
async fn decode_template(
    State(_state): State<AppState>,
    Json(req): Json<DecodeTemplateReq>,
) -> Json<DecodeTemplateRes> {
    let fields = codec::decode(&req.markup).map(|d| dtos_from_definition(&d));
    Json(DecodeTemplateRes { fields })
}

#[utoipa::path(
    get,
    path = "/templates/{test_id}",
    params(("test_id" = String, Path, description = "Test identifier")),
    responses(
        (status = 200, description = "Stored template", body = TemplateRes),
        (status = 400, description = "Invalid test identifier"),
        (status = 404, description = "No template stored for this test")
    )
)]
/// Fetches the stored template for a test along with its decoded fields.
#[axum::debug_handler]
async fn get_template(
    State(state): State<AppState>,
    AxumPath(test_id): AxumPath<String>,
) -> Result<Json<TemplateRes>, ApiError> {
    let test_id = parse_key(&test_id)?;
    let view = state.service.template(&test_id).map_err(api_error)?;
    Ok(Json(TemplateRes {
        test_id: test_id.to_string(),
        markup: view.markup,
        fields: view.definition.as_ref().map(dtos_from_definition),
    }))
}

#[utoipa::path(
    put,
    path = "/templates/{test_id}",
    params(("test_id" = String, Path, description = "Test identifier")),
    request_body = BuildTemplateReq,
    responses(
        (status = 200, description = "Template built and stored", body = MarkupRes),
        (status = 400, description = "Invalid test identifier"),
        (status = 500, description = "Internal server error")
    )
)]
/// Builds a template from a field list and stores it for the test.
#[axum::debug_handler]
async fn put_template(
    State(state): State<AppState>,
    AxumPath(test_id): AxumPath<String>,
    Json(req): Json<BuildTemplateReq>,
) -> Result<Json<MarkupRes>, ApiError> {
    let test_id = parse_key(&test_id)?;
    let definition = definition_from_dtos(req.fields);
    let markup = state
        .service
        .build_template(&test_id, &definition)
        .map_err(api_error)?;
    Ok(Json(MarkupRes { markup }))
}

#[utoipa::path(
    post,
    path = "/results/seed",
    request_body = SeedResultReq,
    responses(
        (status = 200, description = "Initial form data for result entry", body = FormDataRes)
    )
)]
/// Derives the starting form data for result entry from template markup and any prior result.
#[axum::debug_handler]
async fn seed_result(
    State(_state): State<AppState>,
    Json(req): Json<SeedResultReq>,
) -> Json<FormDataRes> {
    let form = ResultForm::start(&req.markup, req.prior);
    Json(FormDataRes {
        form_data: form.into_form_data(),
    })
}

#[utoipa::path(
    post,
    path = "/results/render",
    request_body = RenderResultReq,
    responses(
        (status = 200, description = "Print-ready markup", body = RenderResultRes)
    )
)]
/// Renders form data to print-ready markup.
#[axum::debug_handler]
async fn render_result(
    State(_state): State<AppState>,
    Json(req): Json<RenderResultReq>,
) -> Json<RenderResultRes> {
    Json(RenderResultRes {
        html: render_form_data(&req.form_data),
    })
}

#[utoipa::path(
    put,
    path = "/results/{test_id}/{token}",
    params(
        ("test_id" = String, Path, description = "Test identifier"),
        ("token" = String, Path, description = "Order token")
    ),
    request_body = SaveResultReq,
    responses(
        (status = 200, description = "Result stored", body = ResultRecordRes),
        (status = 400, description = "Invalid identifier"),
        (status = 500, description = "Internal server error")
    )
)]
/// Stores a filled-in result.
#[axum::debug_handler]
async fn put_result(
    State(state): State<AppState>,
    AxumPath((test_id, token)): AxumPath<(String, String)>,
    Json(req): Json<SaveResultReq>,
) -> Result<Json<ResultRecordRes>, ApiError> {
    let test_id = parse_key(&test_id)?;
    let token = parse_key(&token)?;
    let record = state
        .service
        .save_result(&test_id, &token, req.form_data, req.patient_ref)
        .map_err(api_error)?;
    let html = render_form_data(&record.form_data);
    Ok(Json(ResultRecordRes::new(record, html)))
}

#[utoipa::path(
    get,
    path = "/results/{test_id}/{token}",
    params(
        ("test_id" = String, Path, description = "Test identifier"),
        ("token" = String, Path, description = "Order token")
    ),
    responses(
        (status = 200, description = "Stored result with rendering", body = ResultRecordRes),
        (status = 400, description = "Invalid identifier"),
        (status = 404, description = "No result stored")
    )
)]
/// Fetches a stored result and its print rendering.
#[axum::debug_handler]
async fn get_result(
    State(state): State<AppState>,
    AxumPath((test_id, token)): AxumPath<(String, String)>,
) -> Result<Json<ResultRecordRes>, ApiError> {
    let test_id = parse_key(&test_id)?;
    let token = parse_key(&token)?;
    let record = state
        .service
        .load_result(&test_id, &token)
        .map_err(api_error)?;
    let html = render_form_data(&record.form_data);
    Ok(Json(ResultRecordRes::new(record, html)))
}
