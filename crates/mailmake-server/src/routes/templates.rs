//! Template management routes

use crate::{
    AppState,
    error::Result,
    models::{ApiResponse, SaveTemplateRequest, TemplateSummary, UpdateTemplateRequest},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use mailmake::{Template, TemplateId};
use tracing::{debug, info};

/// Create template routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(save_template))
        // Must win over the id route
        .route("/new", get(new_draft))
        .route("/{id}", get(get_template).put(update_template))
}

/// List all templates, most recently updated first
async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TemplateSummary>>>> {
    let templates = state.store.list().await?;
    debug!(count = templates.len(), "listed templates");
    Ok(Json(ApiResponse::new(
        templates.into_iter().map(TemplateSummary::from).collect(),
    )))
}

/// A fresh draft; nothing is stored until it is saved
async fn new_draft(State(state): State<AppState>) -> Json<ApiResponse<Template>> {
    Json(ApiResponse::new(state.store.create_draft()))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Template>>> {
    let id = TemplateId::new(id)?;
    let template = state.store.get(&id).await?;
    Ok(Json(ApiResponse::new(template)))
}

/// Insert a draft or update an existing template
async fn save_template(
    State(state): State<AppState>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Template>>)> {
    let inserting = request.id.is_unsaved();
    let template = Template::builder()
        .id(request.id)
        .title(request.title)
        .content(request.content)
        .build();

    let saved = state.store.save(&template).await?;
    info!(id = %saved.id, inserting, "template saved via API");

    let status = if inserting {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ApiResponse::with_message(
            saved,
            "Your changes have been saved successfully.",
        )),
    ))
}

async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<ApiResponse<Template>>> {
    let id = TemplateId::new(id)?;
    let content = match request.content {
        Some(content) => content,
        None => state.store.get(&id).await?.content,
    };
    let template = Template::builder()
        .id(id)
        .title(request.title)
        .content(content)
        .build();

    let saved = state.store.save(&template).await?;
    info!(id = %saved.id, "template updated via API");
    Ok(Json(ApiResponse::new(saved)))
}
