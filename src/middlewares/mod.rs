pub mod identity;

pub use identity::{GUEST_ID_HEADER, identity_middleware};
