//! Test utilities for QueryLite integration tests
//!
//! `StubBackend` stands in for the backend execution service; `TestFixture`
//! wires it to a coordinator together with a channel sink and a recording
//! error sink. Tests must not access internal components - use only the
//! public QueryCoordinator API.

pub mod stub_backend;
pub mod test_fixture;
