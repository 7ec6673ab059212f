/// Router Module Index
///
/// Splits the drink routes by access level. Both routers register `/drinks`; Axum
/// merges their method routers, so `GET /drinks` stays public while `POST /drinks`
/// sits behind the authorization gate.

/// Routes accessible to anyone, no credential required.
pub mod public;

/// Routes guarded per registration by the `AuthGate` with an explicit permission.
pub mod protected;
