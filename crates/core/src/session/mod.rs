//! Session state: the credential pair and identity of the logged-in user
//!
//! The [`store::SessionStore`] is the only owner of credentials. It is
//! hydrated explicitly at startup and torn down explicitly on logout or when a
//! refresh fails.

pub mod memory;
pub mod ports;
pub mod store;
