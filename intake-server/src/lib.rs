//! intake-server: encrypted applicant registration over HTTP
//!
//! Clients fetch the per-process RSA public key, seal a JSON record with
//! [`intake_core::seal`] and POST the envelope to `/register`. The server
//! opens it, labels the record with the level classifier and stores it.
//! Administrative routes under `/api` list, edit and delete records and
//! relabel the whole collection.

pub mod config;
pub mod error;
pub mod registration;
pub mod routes;
pub mod state;
