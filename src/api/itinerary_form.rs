//! Decoding of the `multipart/form-data` itinerary payload
//!
//! Destinations arrive as flat keys, either `destinations[0][name]` or
//! `destinations.0.name`, and are reassembled ordered by index. Decode
//! problems are collected as field errors so they can be reported together
//! with the semantic validation errors.

use crate::domain::{CreateItineraryInput, DestinationInput, UpdateItineraryInput};
use crate::error::{AppError, FieldErrors, Result};
use crate::storage::ImageUpload;
use axum::extract::multipart::{Multipart, MultipartRejection};
use std::collections::BTreeMap;

const DESTINATIONS: &str = "destinations";

/// Raw itinerary form, as sent by the client
#[derive(Debug, Default)]
pub struct ItineraryForm {
    title: Option<String>,
    category: Option<String>,
    duration: Option<String>,
    remove_image: Option<String>,
    destinations: Option<BTreeMap<usize, DestinationInput>>,
    image: Option<ImageUpload>,
    errors: FieldErrors,
}

/// A decoded payload with the decode errors found along the way
#[derive(Debug)]
pub struct DecodedForm<T> {
    pub input: T,
    pub image: Option<ImageUpload>,
    pub errors: FieldErrors,
    destination_keys: Vec<usize>,
}

impl<T> DecodedForm<T> {
    /// Combine decode errors with the semantic ones and release the payload.
    ///
    /// Semantic errors address destinations by position; they are mapped back
    /// to the indices the client sent before merging.
    pub fn finish(self, semantic: FieldErrors) -> Result<(T, Option<ImageUpload>)> {
        let mut errors = self.errors;
        errors.merge_absent(semantic.reindex(DESTINATIONS, &self.destination_keys));
        errors.into_result()?;
        Ok((self.input, self.image))
    }
}

impl ItineraryForm {
    /// Read every part of the request body
    pub async fn read(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Self> {
        let mut multipart = multipart.map_err(|rejection| {
            AppError::BadRequest(format!(
                "Expected a multipart/form-data body: {}",
                rejection.body_text()
            ))
        })?;

        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => form.accept_file(&name, file_name, content_type, bytes.to_vec()),
                    Err(_) => form.errors.add("image", "The image failed to upload."),
                }
            } else {
                match field.text().await {
                    Ok(value) => form.accept_text(&name, value),
                    Err(_) => form.errors.add(field_path(&name), "The field could not be read."),
                }
            }
        }
        Ok(form)
    }

    /// Record one text part; unknown names are ignored.
    pub fn accept_text(&mut self, name: &str, value: String) {
        let value = value.trim().to_string();
        match name {
            "title" => self.title = Some(value),
            "category" => self.category = Some(value),
            "duration" => self.duration = Some(value),
            "remove_image" => self.remove_image = Some(value),
            // A bare empty `destinations` part is an explicitly empty list
            DESTINATIONS => {
                if value.is_empty() {
                    self.destinations.get_or_insert_with(BTreeMap::new);
                } else {
                    self.errors.add(
                        DESTINATIONS,
                        "The destinations must be sent as destinations[i][name].",
                    );
                }
            }
            _ => {
                if let Some((index, key)) = parse_destination_key(name) {
                    let destination = self
                        .destinations
                        .get_or_insert_with(BTreeMap::new)
                        .entry(index)
                        .or_default();
                    match key {
                        "name" => destination.name = value,
                        "lodging" => destination.lodging = non_empty(value),
                        "things_to_do" => destination.things_to_do = non_empty(value),
                        "id" => destination.id = non_empty(value),
                        _ => {}
                    }
                }
            }
        }
    }

    /// Record the image part. An empty part without a file name means no
    /// file was chosen.
    pub fn accept_file(
        &mut self,
        name: &str,
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) {
        if name != "image" {
            return;
        }
        let unnamed = file_name.as_deref().map_or(true, str::is_empty);
        if bytes.is_empty() && unnamed {
            return;
        }
        self.image = Some(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    /// Build a create payload. Missing required fields are reported here;
    /// the decode errors take precedence over semantic validation.
    pub fn into_create(mut self) -> DecodedForm<CreateItineraryInput> {
        let title = self.take_required("title", |f| f.title.take());
        let category = self.take_required("category", |f| f.category.take());
        let duration = match self.duration.take() {
            Some(raw) => self.parse_duration(&raw),
            None => {
                self.errors.add("duration", "The duration field is required.");
                None
            }
        };
        let (destinations, destination_keys) = match self.take_destinations() {
            Some(destinations) => destinations,
            None => {
                self.errors
                    .add(DESTINATIONS, "The destinations field is required.");
                (Vec::new(), Vec::new())
            }
        };
        self.check_remove_image();

        DecodedForm {
            input: CreateItineraryInput {
                title: title.unwrap_or_default(),
                category: category.unwrap_or_default(),
                duration: duration.unwrap_or_default(),
                destinations,
            },
            image: self.image,
            errors: self.errors,
            destination_keys,
        }
    }

    /// Build an update payload; absent fields keep their stored values.
    pub fn into_update(mut self) -> DecodedForm<UpdateItineraryInput> {
        let duration = self
            .duration
            .take()
            .and_then(|raw| self.parse_duration(&raw));
        let remove_image = self.check_remove_image();
        let (destinations, destination_keys) = match self.take_destinations() {
            Some((destinations, keys)) => (Some(destinations), keys),
            None => (None, Vec::new()),
        };

        DecodedForm {
            input: UpdateItineraryInput {
                title: self.title.take(),
                category: self.category.take(),
                duration,
                destinations,
                remove_image,
            },
            image: self.image,
            errors: self.errors,
            destination_keys,
        }
    }

    /// Destinations in index order, with the index each one was sent under
    fn take_destinations(&mut self) -> Option<(Vec<DestinationInput>, Vec<usize>)> {
        let destinations = self.destinations.take()?;
        let keys = destinations.keys().copied().collect();
        Some((destinations.into_values().collect(), keys))
    }

    fn take_required(
        &mut self,
        field: &str,
        take: impl FnOnce(&mut Self) -> Option<String>,
    ) -> Option<String> {
        let value = take(self).filter(|v| !v.is_empty());
        if value.is_none() {
            self.errors.add(field, format!("The {} field is required.", field));
        }
        value
    }

    fn parse_duration(&mut self, raw: &str) -> Option<i32> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.errors.add("duration", "The duration field is required.");
            return None;
        }
        match raw.parse::<i32>() {
            Ok(duration) => Some(duration),
            Err(_) => {
                self.errors.add("duration", "The duration must be an integer.");
                None
            }
        }
    }

    fn check_remove_image(&mut self) -> bool {
        match self.remove_image.as_deref().map(parse_flag) {
            None => false,
            Some(Some(flag)) => flag,
            Some(None) => {
                self.errors
                    .add("remove_image", "The remove image field must be true or false.");
                false
            }
        }
    }
}

/// Parse `destinations[3][name]` or `destinations.3.name`
fn parse_destination_key(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix(DESTINATIONS)?;
    let (index, key) = if let Some(rest) = rest.strip_prefix('[') {
        let (index, rest) = rest.split_once(']')?;
        let key = rest.strip_prefix('[')?.strip_suffix(']')?;
        (index, key)
    } else {
        rest.strip_prefix('.')?.split_once('.')?
    };
    Some((index.parse().ok()?, key))
}

/// Error path for a raw form key (`destinations[0][name]` → `destinations.0.name`)
fn field_path(name: &str) -> String {
    match parse_destination_key(name) {
        Some((index, key)) => format!("{}.{}.{}", DESTINATIONS, index, key),
        None => name.to_string(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "off" | "no" => Some(false),
        "1" | "true" | "on" | "yes" => Some(true),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
