//! Integration tests for iban-probe
//!
//! These tests use wiremock to stand in for the lookup site and drive
//! resolution and batch cross-checks end-to-end.

mod batch_tests;
mod common;
mod lookup_tests;
