//! VMS Site - backend for the Validation Management Solutions website
//!
//! This crate serves the single-page front end and a small JSON API:
//! a password-gated article store, image uploads, and an aggregated
//! industry news feed merged round-robin from several RSS sources.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod news;
pub mod routes;
pub mod upload;
