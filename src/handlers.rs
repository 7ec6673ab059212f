use crate::{
    auth::Claims,
    error::ApiError,
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinkChanges, DrinkDetailResponse,
        DrinkSummaryResponse, ErrorResponse, NewDrink, UpdateDrinkRequest,
    },
    repository::RepositoryState,
};
use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

const INVALID_BODY: &str = "Request does not contain a valid JSON body";

// A non-numeric id can never match a row.
fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        ApiError::bad_request(INVALID_BODY)
    })
}

/// get_drinks
///
/// [Public Route] Lists every drink in its short representation.
#[utoipa::path(
    get,
    path = "/drinks",
    responses(
        (status = 200, description = "Drink summaries", body = DrinkSummaryResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_drinks(
    State(repo): State<RepositoryState>,
) -> Result<Json<DrinkSummaryResponse>, ApiError> {
    let drinks = repo.list_drinks().await?;
    Ok(Json(DrinkSummaryResponse {
        success: true,
        drinks: drinks.iter().map(|d| d.short()).collect(),
    }))
}

/// get_drinks_detail
///
/// [Protected Route: `get:drinks-detail`] Lists every drink with its full recipe.
#[utoipa::path(
    get,
    path = "/drinks-detail",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Drink details", body = DrinkDetailResponse),
        (status = 401, description = "Credential rejected", body = ErrorResponse),
        (status = 403, description = "Permission missing", body = ErrorResponse)
    )
)]
pub async fn get_drinks_detail(
    Extension(claims): Extension<Claims>,
    State(repo): State<RepositoryState>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    tracing::debug!(subject = claims.subject(), "listing drink details");
    let drinks = repo.list_drinks().await?;
    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks,
    }))
}

/// create_drink
///
/// [Protected Route: `post:drinks`] Adds a drink to the menu. A duplicate title is
/// answered with 422.
#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Created drink", body = DrinkDetailResponse),
        (status = 400, description = "Missing title or recipe", body = ErrorResponse),
        (status = 401, description = "Credential rejected", body = ErrorResponse),
        (status = 403, description = "Permission missing", body = ErrorResponse),
        (status = 422, description = "Title already taken", body = ErrorResponse)
    )
)]
pub async fn create_drink(
    Extension(claims): Extension<Claims>,
    State(repo): State<RepositoryState>,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let new_drink = NewDrink::try_from(json_body(payload)?).map_err(ApiError::bad_request)?;

    let drink = repo.insert_drink(new_drink).await?;
    tracing::info!(subject = claims.subject(), drink_id = drink.id, "drink created");

    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// update_drink
///
/// [Protected Route: `patch:drinks`] Changes the title and/or recipe of an existing
/// drink. Responds 404 when no drink has the given id.
#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    params(("id" = i64, Path, description = "Drink ID")),
    request_body = UpdateDrinkRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated drink", body = DrinkDetailResponse),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 422, description = "Title already taken", body = ErrorResponse)
    )
)]
pub async fn update_drink(
    Extension(claims): Extension<Claims>,
    State(repo): State<RepositoryState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let id = drink_id(id)?;
    let changes = DrinkChanges::try_from(json_body(payload)?).map_err(ApiError::bad_request)?;

    let drink = repo
        .update_drink(id, changes)
        .await?
        .ok_or(ApiError::NotFound)?;
    tracing::info!(subject = claims.subject(), drink_id = id, "drink updated");

    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// delete_drink
///
/// [Protected Route: `delete:drinks`] Removes a drink. Responds 404 when no drink has
/// the given id.
#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    params(("id" = i64, Path, description = "Drink ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted", body = DeleteDrinkResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_drink(
    Extension(claims): Extension<Claims>,
    State(repo): State<RepositoryState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    let id = drink_id(id)?;

    if !repo.delete_drink(id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(subject = claims.subject(), drink_id = id, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}

/// not_found
///
/// Router fallback: any unmatched path gets the JSON 404 envelope.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// method_not_allowed
///
/// Known path, unsupported method: same envelope as every other failure.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
