//! World-level integration tests

mod world_integration;
