mod auth;
mod client;
pub mod domain;
mod toggl_url;

pub use toggl_url::{TogglURL, DEFAULT_API_URL};

pub use auth::*;
pub use client::*;
pub use domain::*;
