//! Itinerary aggregate manager: create, update and destroy with image lifecycle

use crate::domain::{
    CreateItineraryInput, ImageChange, ItineraryChanges, ItineraryDetails, ItineraryRecord,
    NewItinerary, StringUuid, UpdateItineraryInput,
};
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::auth::AuthUser;
use crate::policy::{self, Authorized, PolicyAction};
use crate::repository::ItineraryRepository;
use crate::storage::{ImageStore, ImageUpload};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ItineraryService<I: ItineraryRepository, S: ImageStore> {
    repo: Arc<I>,
    images: Arc<S>,
    max_image_bytes: usize,
}

impl<I: ItineraryRepository, S: ImageStore> ItineraryService<I, S> {
    pub fn new(repo: Arc<I>, images: Arc<S>, max_image_bytes: usize) -> Self {
        Self {
            repo,
            images,
            max_image_bytes,
        }
    }

    /// Every field error a create payload would raise, image included
    pub fn check_create(&self, input: &CreateItineraryInput, image: Option<&ImageUpload>) -> FieldErrors {
        let mut errors = input.field_errors();
        self.check_image(image, &mut errors);
        errors
    }

    /// Every field error an update payload would raise, image included
    pub fn check_update(&self, input: &UpdateItineraryInput, image: Option<&ImageUpload>) -> FieldErrors {
        let mut errors = input.field_errors();
        self.check_image(image, &mut errors);
        errors
    }

    fn check_image(&self, image: Option<&ImageUpload>, errors: &mut FieldErrors) {
        if let Some(Err(message)) = image.map(|i| i.check(self.max_image_bytes)) {
            errors.add("image", message);
        }
    }

    /// Store the upload under a fresh path, returning that path
    async fn store_image(&self, image: &ImageUpload) -> Result<String> {
        let format = image
            .check(self.max_image_bytes)
            .map_err(|message| AppError::field("image", message))?;
        let path = ImageUpload::storage_path(format);
        self.images.put(&path, &image.bytes).await?;
        Ok(path)
    }

    /// Best-effort blob removal; failures are logged for later reconciliation.
    async fn discard_image(&self, path: &str, itinerary_id: Option<StringUuid>) {
        if let Err(e) = self.images.delete(path).await {
            warn!(
                path = %path,
                itinerary_id = ?itinerary_id.map(|id| id.to_string()),
                error = %e,
                "Failed to delete image blob"
            );
        }
    }

    pub async fn create(
        &self,
        owner: &AuthUser,
        input: CreateItineraryInput,
        image: Option<ImageUpload>,
    ) -> Result<ItineraryDetails> {
        policy::enforce(Some(owner), PolicyAction::ItineraryCreate, None)?;
        self.check_create(&input, image.as_ref()).into_result()?;

        let image_path = match &image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        let created = self
            .repo
            .create(&NewItinerary {
                user_id: owner.user_id,
                title: input.title,
                category: input.category,
                duration: input.duration,
                image_path: image_path.clone(),
                destinations: input.destinations,
            })
            .await;

        let record = match created {
            Ok(record) => record,
            Err(e) => {
                if let Some(path) = &image_path {
                    self.discard_image(path, None).await;
                }
                return Err(e);
            }
        };

        info!(itinerary_id = %record.id, user_id = %owner.user_id, "Itinerary created");
        self.with_destinations(record).await
    }

    pub async fn find(&self, id: StringUuid) -> Result<ItineraryRecord> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Itinerary {} not found", id)))
    }

    pub async fn get(&self, id: StringUuid) -> Result<ItineraryDetails> {
        let record = self.find(id).await?;
        self.with_destinations(record).await
    }

    /// Load the target and check `action` for `actor` in one step
    pub async fn authorize(
        &self,
        actor: &AuthUser,
        id: StringUuid,
        action: PolicyAction,
    ) -> Result<Authorized<ItineraryRecord>> {
        let record = self.find(id).await?;
        policy::authorize(actor, action, record)
    }

    pub async fn update(
        &self,
        target: Authorized<ItineraryRecord>,
        input: UpdateItineraryInput,
        image: Option<ImageUpload>,
    ) -> Result<ItineraryDetails> {
        require_action(&target, PolicyAction::ItineraryUpdate)?;
        self.check_update(&input, image.as_ref()).into_result()?;

        let current = target.into_inner();
        let old_path = current.image_path.clone();

        let image_change = match &image {
            Some(image) => ImageChange::Replace(self.store_image(image).await?),
            None if input.remove_image && old_path.is_some() => ImageChange::Clear,
            None => ImageChange::Keep,
        };

        let changes = ItineraryChanges {
            title: input.title,
            category: input.category,
            duration: input.duration,
            image: image_change,
            destinations: input.destinations,
        };

        let updated = match self.repo.update(current.id, &changes).await {
            Ok(record) => record,
            Err(e) => {
                if let ImageChange::Replace(path) = &changes.image {
                    self.discard_image(path, Some(current.id)).await;
                }
                return Err(e);
            }
        };

        if changes.image != ImageChange::Keep {
            if let Some(old) = &old_path {
                self.discard_image(old, Some(current.id)).await;
            }
        }

        info!(
            itinerary_id = %updated.id,
            user_id = %updated.user_id,
            destinations_replaced = changes.destinations.is_some(),
            "Itinerary updated"
        );
        self.with_destinations(updated).await
    }

    /// Delete the image blob, then the row; destinations and favorites cascade.
    pub async fn destroy(&self, target: Authorized<ItineraryRecord>) -> Result<()> {
        require_action(&target, PolicyAction::ItineraryDelete)?;
        let record = target.into_inner();

        if let Some(path) = &record.image_path {
            self.discard_image(path, Some(record.id)).await;
        }

        if !self.repo.delete(record.id).await? {
            return Err(AppError::NotFound(format!(
                "Itinerary {} not found",
                record.id
            )));
        }

        info!(itinerary_id = %record.id, user_id = %record.user_id, "Itinerary deleted");
        Ok(())
    }

    async fn with_destinations(&self, record: ItineraryRecord) -> Result<ItineraryDetails> {
        let destinations = self.repo.find_destinations(&[record.id]).await?;
        Ok(ItineraryDetails {
            record,
            destinations,
        })
    }
}

fn require_action(target: &Authorized<ItineraryRecord>, expected: PolicyAction) -> Result<()> {
    if target.action() == expected {
        Ok(())
    } else {
        Err(AppError::Internal(anyhow::anyhow!(
            "authorization for {:?} used for {:?}",
            target.action(),
            expected
        )))
    }
}
