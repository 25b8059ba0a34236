use uuid::Uuid;

use super::storage::LocalStorage;

pub const FAVORITES_KEY: &str = "favorites";

/// Favorite product ids, in the order they were added.
pub struct FavoritesStore<S> {
    storage: S,
    ids: Vec<Uuid>,
}

impl<S: LocalStorage> FavoritesStore<S> {
    pub fn load(storage: S) -> Self {
        let ids = match storage.get_item(FAVORITES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable saved favorites: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Could not read saved favorites: {e}");
                Vec::new()
            }
        };
        Self { storage, ids }
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn is_favorite(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    /// Adds or removes `id`; returns whether it is a favorite afterwards.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        let now_favorite = match self.ids.iter().position(|f| *f == id) {
            Some(idx) => {
                self.ids.remove(idx);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        };
        self.persist();
        now_favorite
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.ids)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .set_item(FAVORITES_KEY, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            log::warn!("Failed to save favorites: {e}");
        }
    }
}
