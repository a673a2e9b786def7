pub mod configuration;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod startup;
pub mod store;
pub mod telementry;
pub mod version;
