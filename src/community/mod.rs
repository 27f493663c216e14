//! Client-side model of the Travelers Community service: domain types,
//! the REST client, the document-store seam, and the feed interaction
//! machinery (like toggles, deletes, the authoritative feed store).

pub mod api_types;
pub mod client;
pub mod feed;
pub mod interactions;
pub mod store;
pub mod types;

pub use client::CommunityClient;
pub use store::ResponseStore;
