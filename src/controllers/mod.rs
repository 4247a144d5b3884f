pub mod home;
pub mod progress;
pub mod proxy;
pub mod search;
