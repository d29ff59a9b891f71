//! End-to-end integration tests.
//!
//! Each test starts the identity provider on an ephemeral port and drives it
//! over HTTP the way a browser and a service provider would.

mod common;
mod login_flows;
mod saml_endpoints;
