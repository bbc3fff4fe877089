use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    alternative::{self, Entity as Alternative},
    category::{self, Entity as Category},
    product::{self, Entity as Product, ProductStatus},
    product_alternative::{self, Entity as ProductAlternative},
    subcategory::{self, Entity as Subcategory},
};
use crate::errors::ServiceError;

/// A category with its subcategories, as browsed on the directory page.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: category::Model,
    pub subcategories: Vec<subcategory::Model>,
}

/// An alternative with the ACTIVE products positioned against it.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeWithProducts {
    #[serde(flatten)]
    pub alternative: alternative::Model,
    pub products: Vec<product::Model>,
}

/// Read-only lookups over the category and alternative directories.
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All categories with their subcategories, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryTree>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut out = Vec::with_capacity(categories.len());
        for category in categories {
            let subcategories = category
                .find_related(Subcategory)
                .order_by_asc(subcategory::Column::Name)
                .all(&*self.db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            out.push(CategoryTree {
                category,
                subcategories,
            });
        }
        Ok(out)
    }

    /// All alternatives, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_alternatives(&self) -> Result<Vec<alternative::Model>, ServiceError> {
        Alternative::find()
            .order_by_asc(alternative::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// An alternative together with the ACTIVE products linked against it.
    #[instrument(skip(self))]
    pub async fn get_alternative(
        &self,
        id: Uuid,
    ) -> Result<AlternativeWithProducts, ServiceError> {
        let alternative = Alternative::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Alternative with ID {} not found", id))
            })?;

        let links = ProductAlternative::find()
            .filter(product_alternative::Column::AlternativeId.eq(id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let product_ids: Vec<Uuid> = links.iter().map(|l| l.product_id).collect();
        let products = if product_ids.is_empty() {
            Vec::new()
        } else {
            Product::find()
                .filter(product::Column::Id.is_in(product_ids))
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .order_by_asc(product::Column::Name)
                .all(&*self.db)
                .await
                .map_err(ServiceError::DatabaseError)?
        };

        Ok(AlternativeWithProducts {
            alternative,
            products,
        })
    }
}
