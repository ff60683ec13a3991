pub mod functions;
pub mod models;
pub mod routes;
