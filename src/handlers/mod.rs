// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) -> Protected (JWT auth, some routes additionally gated by role)
pub mod public;    // Token acquisition: /auth/*
pub mod protected; // JWT authentication required: /api/*
