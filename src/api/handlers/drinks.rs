/*
 * Responsibility
 * - /drinks 系 handler
 * - GET /drinks 以外は route 側で permission gate が掛かっている前提
 *   (handler は Claims extractor で検証済み claims を受け取るだけ)
 * - body / path の形式エラーは JSON envelope (400 / 422 / 404) に寄せる
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    api::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkLong, DrinkShort, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::Claims,
    },
    error::AppError,
    state::AppState,
};

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        match rejection {
            // valid JSON, wrong drink shape (missing field, negative parts, ...)
            JsonRejection::JsonDataError(_) => AppError::Unprocessable,
            _ => AppError::BadRequest,
        }
    })
}

fn parse_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    // /drinks/abc is a missing resource, not a malformed request
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<DrinkShort>>, AppError> {
    let rows = state.drinks.list().await;
    if rows.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(Json(DrinksResponse::new(
        rows.into_iter().map(DrinkShort::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    State(state): State<AppState>,
    Claims(claims): Claims,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    tracing::debug!(sub = ?claims.sub, "drinks detail requested");

    let rows = state.drinks.list().await;

    Ok(Json(DrinksResponse::new(
        rows.into_iter().map(DrinkLong::from).collect(),
    )))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let req = parse_body(payload)?;
    req.validate().map_err(|reason| {
        tracing::debug!(reason, "invalid drink");
        AppError::Unprocessable
    })?;

    let (Some(title), Some(recipe)) = (req.title, req.recipe) else {
        return Err(AppError::Unprocessable);
    };

    let row = state
        .drinks
        .create(title.trim(), recipe.into_ingredients())
        .await?;

    tracing::info!(sub = ?claims.sub, drink_id = row.id, "drink created");

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(row)])))
}

pub async fn update_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let id = parse_id(path)?;
    let req = parse_body(payload)?;
    req.validate().map_err(|reason| {
        tracing::debug!(reason, "invalid drink update");
        AppError::Unprocessable
    })?;

    let title = req.title.as_deref().map(str::trim);
    let recipe = req.recipe.map(|r| r.into_ingredients());

    let row = state
        .drinks
        .update(id, title, recipe)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(sub = ?claims.sub, drink_id = id, "drink updated");

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(row)])))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    let id = parse_id(path)?;

    if !state.drinks.delete(id).await {
        return Err(AppError::NotFound);
    }

    tracing::info!(sub = ?claims.sub, drink_id = id, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
