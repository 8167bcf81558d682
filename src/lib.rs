/// Concern Desk
///
/// State layer of the citizen-concern moderation dashboard:
/// - `api` talks to the concern backend
/// - `state` holds the store, resolver, mutators, aggregator and popup
/// - `dashboard` ties them together behind the UI's action entry points
/// - `config` loads settings and the session

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod state;
