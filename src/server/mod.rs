pub mod app;
pub mod auth;
pub mod deserializers;
pub mod error;
pub mod routes;
