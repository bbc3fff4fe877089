use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    notification::NotificationKind,
    product::{self, Entity as Product, ProductStatus},
    product_image::{self, Entity as ProductImage},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::notifications::push_notification;

/// Input for a product submission.
#[derive(Debug, Clone)]
pub struct SubmitProductInput {
    pub name: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub release_date: Option<DateTime<Utc>>,
    pub image_urls: Vec<String>,
}

/// Partial update applied by the owner or an admin.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub release_date: Option<DateTime<Utc>>,
}

/// Filters for the public/admin product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    pub status: Option<ProductStatus>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: u64,
    pub per_page: u64,
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Service for product submission, listing, editing and moderation.
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Submits a new product. It enters moderation as PENDING and stays out
    /// of public listings until approved.
    #[instrument(skip(self, input))]
    pub async fn submit_product(
        &self,
        owner_id: Uuid,
        input: SubmitProductInput,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db;

        let slug = slugify(&input.name);
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name must contain at least one alphanumeric character".to_string(),
            ));
        }

        let existing = Product::find()
            .filter(product::Column::Slug.eq(&slug))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A product with slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            slug: Set(slug),
            tagline: Set(input.tagline),
            description: Set(input.description),
            website_url: Set(input.website_url),
            logo_url: Set(input.logo_url),
            status: Set(ProductStatus::Pending),
            category_id: Set(input.category_id),
            subcategory_id: Set(input.subcategory_id),
            user_id: Set(owner_id),
            release_date: Set(input.release_date),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create product");
            ServiceError::db_error(e)
        })?;

        for (position, url) in input.image_urls.into_iter().enumerate() {
            product_image::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(created.id),
                url: Set(url),
                position: Set(position as i32),
            }
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        }

        self.event_sender
            .send(Event::ProductSubmitted(created.id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(product_id = %created.id, name = %created.name, "Product submitted");
        Ok(created)
    }

    /// Fetches a product with its gallery images.
    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<(product::Model, Vec<product_image::Model>), ServiceError> {
        let product = Product::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))?;

        let images = product
            .find_related(ProductImage)
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((product, images))
    }

    /// Paginated listing with optional status/category/search filters.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut select = Product::find();

        if let Some(status) = query.status {
            select = select.filter(product::Column::Status.eq(status));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            select = select.filter(
                Condition::any()
                    .add(product::Column::Name.like(&pattern))
                    .add(product::Column::Tagline.like(&pattern)),
            );
        }

        let paginator = select
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, query.per_page.max(1));

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let items = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((items, total))
    }

    /// Applies a partial update. Bumping `updated_at` is what lets an edited
    /// product re-enter the trending window.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_is_admin: bool,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db;

        let existing = Product::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))?;

        if existing.user_id != actor_id && !actor_is_admin {
            return Err(ServiceError::Forbidden(
                "Only the owner or an admin can edit a product".to_string(),
            ));
        }

        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(tagline) = input.tagline {
            active.tagline = Set(Some(tagline));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(website_url) = input.website_url {
            active.website_url = Set(Some(website_url));
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(Some(logo_url));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(subcategory_id) = input.subcategory_id {
            active.subcategory_id = Set(Some(subcategory_id));
        }
        if let Some(release_date) = input.release_date {
            active.release_date = Set(Some(release_date));
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to update product");
            ServiceError::db_error(e)
        })?;

        self.event_sender
            .send(Event::ProductUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(product_id = %updated.id, "Product updated");
        Ok(updated)
    }

    /// Moderation decision: approve (ACTIVE) or reject (REJECTED). Notifies
    /// the owner of the outcome.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        new_status: ProductStatus,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db;

        let existing = Product::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))?;

        let old_status = existing.status;
        if old_status == new_status {
            return Ok(existing);
        }

        let owner_id = existing.user_id;
        let name = existing.name.clone();

        let mut active: product::ActiveModel = existing.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to update product status");
            ServiceError::db_error(e)
        })?;

        push_notification(
            db,
            owner_id,
            None,
            Some(id),
            NotificationKind::StatusChange,
            format!("Your product '{}' is now {}", name, new_status),
        )
        .await?;

        self.event_sender
            .send(Event::ProductStatusChanged {
                product_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        info!(product_id = %id, %old_status, %new_status, "Product status changed");
        Ok(updated)
    }

    /// Deletes a product (owner or admin).
    #[instrument(skip(self))]
    pub async fn delete_product(
        &self,
        id: Uuid,
        actor_id: Uuid,
        actor_is_admin: bool,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let existing = Product::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {} not found", id)))?;

        if existing.user_id != actor_id && !actor_is_admin {
            return Err(ServiceError::Forbidden(
                "Only the owner or an admin can delete a product".to_string(),
            ));
        }

        existing.delete(db).await.map_err(|e| {
            error!(product_id = %id, error = %e, "Failed to delete product");
            ServiceError::db_error(e)
        })?;

        self.event_sender
            .send(Event::ProductDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_and_lowercases() {
        assert_eq!(slugify("My Great App!"), "my-great-app");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("CamelCase2"), "camelcase2");
    }

    #[test]
    fn slugify_of_symbols_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}
