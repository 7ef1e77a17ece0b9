//! Test doubles shared by unit tests.

pub mod scripted_fetcher;
pub mod socket_guard;
