//! Device identifier sent with every query.

use std::sync::Arc;
use ziahr_core::error::Result;
use ziahr_core::storage::{read_json, write_json, KeyValueStore, DEVICE_ID_KEY};

/// Returns the stored device id, generating and storing one on first use.
pub fn device_id(storage: &Arc<dyn KeyValueStore>) -> Result<String> {
    if let Some(id) = read_json::<String>(storage.as_ref(), DEVICE_ID_KEY)? {
        if !id.trim().is_empty() {
            return Ok(id);
        }
    }

    let id = format!("device_{}", uuid::Uuid::new_v4());
    write_json(storage.as_ref(), DEVICE_ID_KEY, &id)?;
    tracing::info!("[Device] Generated new device id");
    Ok(id)
}
