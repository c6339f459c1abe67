//! Test helpers para stash-server.

#![allow(dead_code, unused_imports)]

pub mod assertions;
pub mod client;
pub mod store;

pub use assertions::*;
pub use client::{
    CacheFixture, TestClient, TestResponse, cache_fixture, cache_fixture_on, client,
};
pub use store::FailingStore;
