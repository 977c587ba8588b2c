mod slot;
mod store;

pub use slot::{FileSlot, MemorySlot, SessionSlot, StoredValue};
pub use store::{SessionStore, COOKIE_NAME, SESSION_TTL_DAYS};
