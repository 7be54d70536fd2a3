//! Background removal of idle-expired token records.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::auth::store::TokenStore;

/// Purge once. Store faults are logged; the next tick retries.
pub async fn sweep_once(store: &dyn TokenStore) -> u64 {
    match store.purge_expired().await {
        Ok(0) => {
            debug!("no expired tokens");
            0
        }
        Ok(removed) => {
            info!(removed, "purged expired tokens");
            removed
        }
        Err(err) => {
            warn!(error = ?err, "token purge failed");
            0
        }
    }
}

pub fn spawn(store: Arc<dyn TokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            sweep_once(store.as_ref()).await;
        }
    })
}
