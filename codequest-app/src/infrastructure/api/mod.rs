mod client;
mod endpoints;
mod envelope;
mod types;

pub use client::{ApiClient, AuthPayload};
pub use endpoints::{Endpoints, PageRequest, Resource};
pub use envelope::{normalize_entity, normalize_list, Envelope, Listing};
pub use types::{PostPayload, SignupRequest};
