// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration and login, the only way to obtain a session token.
pub mod auth;
