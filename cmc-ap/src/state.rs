//! Shared application state
//!
//! Owns the grid store and the event broadcaster. The grid is mutated only
//! here; the compiler and scheduler work from published snapshots.

use std::sync::Arc;

use chrono::Utc;
use cmc_common::events::CmcEvent;
use cmc_common::{GridDimensions, GridSnapshot, GridStore};
use rand::Rng;
use tokio::sync::{broadcast, RwLock};

/// Buffered events per SSE subscriber before it starts lagging
const EVENT_CHANNEL_CAPACITY: usize = 100;

pub struct SharedState {
    grid: RwLock<GridStore>,

    /// Event broadcaster for SSE events
    pub event_tx: broadcast::Sender<CmcEvent>,
}

impl SharedState {
    pub fn new(dimensions: GridDimensions) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            grid: RwLock::new(GridStore::new(dimensions)),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: CmcEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CmcEvent> {
        self.event_tx.subscribe()
    }

    /// Current grid snapshot
    pub async fn grid(&self) -> Arc<GridSnapshot> {
        self.grid.read().await.snapshot()
    }

    /// Place a note and publish the new snapshot
    pub async fn place_cell(
        &self,
        row: usize,
        column: usize,
        color_index: usize,
    ) -> cmc_common::Result<Arc<GridSnapshot>> {
        let snapshot = self.grid.write().await.place(row, column, color_index)?;
        self.announce(&snapshot);
        Ok(snapshot)
    }

    /// Clear the grid, then scatter up to `demo_notes` random notes
    pub async fn reset_grid<R: Rng + ?Sized>(&self, demo_notes: usize, rng: &mut R) -> Arc<GridSnapshot> {
        let snapshot = {
            let mut store = self.grid.write().await;
            store.clear();
            if demo_notes > 0 {
                store.seed(demo_notes, rng)
            } else {
                store.snapshot()
            }
        };
        self.announce(&snapshot);
        snapshot
    }

    fn announce(&self, snapshot: &GridSnapshot) {
        self.broadcast_event(CmcEvent::GridChanged {
            version: snapshot.version,
            total: snapshot.grid.occupied_count(),
            timestamp: Utc::now(),
        });
    }
}
