// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here runs behind `jwt_auth_middleware`, which resolves the
// caller to their stored account. Admin routes add `require_role(Admin)`.
pub mod admin; // Admin probe
pub mod auth;  // Caller profile and role changes
pub mod users; // Listings and leaderboard
