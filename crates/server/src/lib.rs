//! Comic claim server library.
//!
//! This crate provides the HTTP API as a library, allowing it to be tested
//! in-process and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
