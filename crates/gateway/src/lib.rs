//! Gateway: HTTP server, route handlers and HTML views.
//!
//! Request flow:
//! 1. Read the carrier cookie, decode (tamper fails closed to "no session")
//! 2. Build a request-scoped client handle and resolve the session
//! 3. Dispatch to the external client through the messaging adapter
//! 4. Render, and write the (possibly refreshed) carrier back into the
//!    response cookie
//!
//! No client instance or per-user state outlives a request; the only
//! durable state is the cookie itself.

pub mod messaging;
pub mod routes;
pub mod server;
pub mod state;
pub mod views;
