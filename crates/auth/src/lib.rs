//! Session-credential lifecycle across the request/response boundary.
//!
//! igdm keeps no server-side session storage. Authentication state rides in
//! a signed client-side cookie: either a reusable settings bundle issued by
//! the external client, raw credentials, or both. The carrier makes that
//! token tamper-evident; the resolver turns whatever the cookie held into a
//! ready-to-use client handle, performing at most one fresh login per
//! request.
//!
//! The token is signed, not encrypted. Raw credentials carried this way are
//! readable by anyone holding the signing key. That is an accepted
//! trade-off of the cookie-only design (it lets an expired bundle
//! self-heal without re-prompting for the password), not an oversight.

pub mod carrier;
pub mod resolver;

pub use {
    carrier::{Carrier, CarrierPayload},
    resolver::{AuthError, Resolved, SessionRecord, resolve},
};
