//! JSON helpers shared by the stores.

use serde::Serialize;
use serde::de::DeserializeOwned;

use converter_types::{KeyValueStore, RepoError};

/// Reads and decodes `key`. A missing key is `Ok(None)`, undecodable data is an error.
pub(crate) async fn read_json<T, S>(kv: &S, key: &str) -> Result<Option<T>, RepoError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match kv.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encodes `value` and overwrites `key` with it.
pub(crate) async fn write_json<T, S>(kv: &S, key: &str, value: &T) -> Result<(), RepoError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let bytes = serde_json::to_vec(value)?;
    kv.set(key, bytes).await
}
