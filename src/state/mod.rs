/// State management module
///
/// This module holds all concern state, including:
/// - Shared data structures mirrored from the backend (data.rs)
/// - The concern store and its view window (store.rs)
/// - Filter/search resolution (resolver.rs)
/// - Per-item mutations and UI buffers (mutators.rs)
/// - Status counts for the summary bar (aggregate.rs)
/// - The upload / role popup (popup.rs)
/// - The signed-in session (session.rs)

pub mod aggregate;
pub mod data;
pub mod mutators;
pub mod popup;
pub mod resolver;
pub mod session;
pub mod store;
