//! Read side: browse, to-visit list and single itinerary presentation

use crate::domain::{
    Destination, ItineraryDetails, ItineraryFilter, ItineraryPage, ItineraryRecord,
    ItinerarySort, ItineraryView, StringUuid,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::repository::{FavoriteRepository, ItineraryRepository};
use crate::storage::ImageStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct ListingService<I: ItineraryRepository, F: FavoriteRepository, S: ImageStore> {
    itinerary_repo: Arc<I>,
    favorite_repo: Arc<F>,
    images: Arc<S>,
    per_page: u32,
}

impl<I: ItineraryRepository, F: FavoriteRepository, S: ImageStore> ListingService<I, F, S> {
    pub fn new(itinerary_repo: Arc<I>, favorite_repo: Arc<F>, images: Arc<S>, per_page: u32) -> Self {
        Self {
            itinerary_repo,
            favorite_repo,
            images,
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    fn offset(&self, page: u32) -> i64 {
        i64::from(page.max(1) - 1) * i64::from(self.per_page)
    }

    /// Filtered, sorted page of all itineraries
    pub async fn browse(
        &self,
        filter: &ItineraryFilter,
        sort: ItinerarySort,
        page: u32,
        viewer: Option<&AuthUser>,
    ) -> Result<ItineraryPage> {
        let page = page.max(1);
        let total = self.itinerary_repo.count(filter).await?;
        let records = self
            .itinerary_repo
            .list(filter, sort, self.offset(page), i64::from(self.per_page))
            .await?;

        Ok(ItineraryPage {
            items: self.present_many(records, viewer).await?,
            page,
            per_page: self.per_page,
            total,
        })
    }

    /// The user's favorited itineraries, most recently added first
    pub async fn to_visit(&self, user: &AuthUser, page: u32) -> Result<ItineraryPage> {
        let page = page.max(1);
        let total = self.favorite_repo.count_for_user(user.user_id).await?;
        let records = self
            .favorite_repo
            .list_for_user(user.user_id, self.offset(page), i64::from(self.per_page))
            .await?;

        Ok(ItineraryPage {
            items: self.present_many(records, Some(user)).await?,
            page,
            per_page: self.per_page,
            total,
        })
    }

    pub async fn show(&self, id: StringUuid, viewer: Option<&AuthUser>) -> Result<ItineraryView> {
        let record = self
            .itinerary_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Itinerary {} not found", id)))?;

        let mut views = self.present_many(vec![record], viewer).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Itinerary view missing")))
    }

    /// Render an already loaded aggregate for `viewer`
    pub async fn present(
        &self,
        details: ItineraryDetails,
        viewer: Option<&AuthUser>,
    ) -> Result<ItineraryView> {
        let favorited = self.favorited_set(viewer, &[details.record.id]).await?;
        let is_favorited = favorited.contains(&details.record.id);
        Ok(ItineraryView::build(details, |p| self.images.url(p), is_favorited))
    }

    /// One destinations query and one favorites query per page, whatever its size
    async fn present_many(
        &self,
        records: Vec<ItineraryRecord>,
        viewer: Option<&AuthUser>,
    ) -> Result<Vec<ItineraryView>> {
        let ids: Vec<StringUuid> = records.iter().map(|r| r.id).collect();
        let favorited = self.favorited_set(viewer, &ids).await?;

        let mut destinations: HashMap<StringUuid, Vec<Destination>> = HashMap::new();
        for destination in self.itinerary_repo.find_destinations(&ids).await? {
            destinations
                .entry(destination.itinerary_id)
                .or_default()
                .push(destination);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let is_favorited = favorited.contains(&record.id);
                let details = ItineraryDetails {
                    destinations: destinations.remove(&record.id).unwrap_or_default(),
                    record,
                };
                ItineraryView::build(details, |p| self.images.url(p), is_favorited)
            })
            .collect())
    }

    async fn favorited_set(
        &self,
        viewer: Option<&AuthUser>,
        ids: &[StringUuid],
    ) -> Result<HashSet<StringUuid>> {
        match viewer {
            Some(user) if !ids.is_empty() => Ok(self
                .favorite_repo
                .favorited_ids(user.user_id, ids)
                .await?
                .into_iter()
                .collect()),
            _ => Ok(HashSet::new()),
        }
    }
}
