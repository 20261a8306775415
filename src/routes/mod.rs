//! Page route handlers.

pub mod home;
