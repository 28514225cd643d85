//! Favorites ledger: a user's to-visit list

use crate::domain::{Favorite, RemoveOutcome, StringUuid};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::repository::{FavoriteRepository, ItineraryRepository};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::info;

pub struct FavoriteService<F: FavoriteRepository, I: ItineraryRepository> {
    repo: Arc<F>,
    itinerary_repo: Arc<I>,
}

impl<F: FavoriteRepository, I: ItineraryRepository> FavoriteService<F, I> {
    pub fn new(repo: Arc<F>, itinerary_repo: Arc<I>) -> Self {
        Self {
            repo,
            itinerary_repo,
        }
    }

    /// Idempotent: adding an itinerary already on the list succeeds without
    /// creating a second entry and returns the original one.
    pub async fn add(&self, user: &AuthUser, itinerary_id: StringUuid) -> Result<Favorite> {
        if self.itinerary_repo.find_by_id(itinerary_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Itinerary {} not found",
                itinerary_id
            )));
        }

        let inserted = self.repo.add(user.user_id, itinerary_id).await?;
        info!(
            user_id = %user.user_id,
            itinerary_id = %itinerary_id,
            inserted,
            "Itinerary added to to-visit list"
        );

        self.repo
            .find(user.user_id, itinerary_id)
            .await?
            .ok_or_else(|| anyhow!("to-visit entry missing after insert").into())
    }

    pub async fn remove(&self, user: &AuthUser, itinerary_id: StringUuid) -> Result<RemoveOutcome> {
        let removed = self.repo.remove(user.user_id, itinerary_id).await?;
        if removed {
            info!(
                user_id = %user.user_id,
                itinerary_id = %itinerary_id,
                "Itinerary removed from to-visit list"
            );
        }
        Ok(RemoveOutcome { removed })
    }
}
