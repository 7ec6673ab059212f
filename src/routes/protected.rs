use crate::{
    AppState,
    auth::{
        DELETE_DRINKS, GET_DRINKS_DETAIL, GateState, PATCH_DRINKS, POST_DRINKS, RouteGuard,
        require_permission,
    },
    handlers,
};
use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

/// Protected Router Module
///
/// Every method route here carries its own `route_layer` running the authorization
/// gate with the permission named at registration. The gate runs before any handler
/// extractor, so a rejected request never touches the body or the repository.
pub fn protected_routes(gate: &GateState) -> Router<AppState> {
    Router::new()
        // GET /drinks-detail
        // Every drink with full recipe, quantities included.
        .route(
            "/drinks-detail",
            get(handlers::get_drinks_detail).route_layer(middleware::from_fn_with_state(
                RouteGuard::new(gate.clone(), GET_DRINKS_DETAIL.clone()),
                require_permission,
            )),
        )
        // POST /drinks
        // Adds a drink; merged with the public GET /drinks.
        .route(
            "/drinks",
            post(handlers::create_drink).route_layer(middleware::from_fn_with_state(
                RouteGuard::new(gate.clone(), POST_DRINKS.clone()),
                require_permission,
            )),
        )
        // PATCH/DELETE /drinks/{id}
        // Each method is guarded by its own permission.
        .route(
            "/drinks/{id}",
            patch(handlers::update_drink)
                .route_layer(middleware::from_fn_with_state(
                    RouteGuard::new(gate.clone(), PATCH_DRINKS.clone()),
                    require_permission,
                ))
                .merge(delete(handlers::delete_drink).route_layer(
                    middleware::from_fn_with_state(
                        RouteGuard::new(gate.clone(), DELETE_DRINKS.clone()),
                        require_permission,
                    ),
                )),
        )
}
