use serde::{Deserialize, Deserializer};

mod me;
mod project;
mod tag;
mod time_entry;

pub use me::*;
pub use project::*;
pub use tag::*;
pub use time_entry::*;

/// Toggl sends `null` for empty lists; read it as the default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
