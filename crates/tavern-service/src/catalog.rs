//! Catalog setup: products, tech cards, ingredients, warehouses.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use tavern_core::validation::{validate_amount_cents, validate_name};
use tavern_core::{CoreError, Ingredient, Money, Product, TechCard, Warehouse};
use tavern_db::{CatalogRepository, Database, EstablishmentRepository};

use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy)]
pub struct CatalogService<'a> {
    db: &'a Database,
}

impl<'a> CatalogService<'a> {
    pub fn new(db: &'a Database) -> Self {
        CatalogService { db }
    }

    pub async fn create_product(
        &self,
        establishment_id: &str,
        name: &str,
        price: Money,
    ) -> ServiceResult<Product> {
        validate_name("name", name)?;
        validate_amount_cents("price", price.cents())?;

        let mut conn = self.db.acquire().await?;
        ensure_establishment(&mut conn, establishment_id).await?;

        let product = Product {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            name: name.trim().to_string(),
            price_cents: price.cents(),
            is_active: true,
            created_at: Utc::now(),
        };
        CatalogRepository::new(&mut conn).insert_product(&product).await?;

        info!(product_id = %product.id, price = %price, "Product created");
        Ok(product)
    }

    pub async fn create_tech_card(
        &self,
        establishment_id: &str,
        name: &str,
        price: Money,
    ) -> ServiceResult<TechCard> {
        validate_name("name", name)?;
        validate_amount_cents("price", price.cents())?;

        let mut conn = self.db.acquire().await?;
        ensure_establishment(&mut conn, establishment_id).await?;

        let card = TechCard {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            name: name.trim().to_string(),
            price_cents: price.cents(),
            is_active: true,
            created_at: Utc::now(),
        };
        CatalogRepository::new(&mut conn).insert_tech_card(&card).await?;

        info!(tech_card_id = %card.id, price = %price, "Tech card created");
        Ok(card)
    }

    /// `unit` is free text such as `kg`, `l` or `pcs`.
    pub async fn create_ingredient(
        &self,
        establishment_id: &str,
        name: &str,
        unit: &str,
    ) -> ServiceResult<Ingredient> {
        validate_name("name", name)?;
        validate_name("unit", unit)?;

        let mut conn = self.db.acquire().await?;
        ensure_establishment(&mut conn, establishment_id).await?;

        let ingredient = Ingredient {
            id: Uuid::new_v4().to_string(),
            establishment_id: establishment_id.to_string(),
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            created_at: Utc::now(),
        };
        CatalogRepository::new(&mut conn).insert_ingredient(&ingredient).await?;

        info!(ingredient_id = %ingredient.id, "Ingredient created");
        Ok(ingredient)
    }

    pub async fn create_warehouse(&self, establishment_id: &str, name: &str) -> ServiceResult<Warehouse> {
        validate_name("name", name)?;

        let mut conn = self.db.acquire().await?;
        ensure_establishment(&mut conn, establishment_id).await?;

        let warehouse = new_warehouse(establishment_id, name);
        CatalogRepository::new(&mut conn).insert_warehouse(&warehouse).await?;

        info!(warehouse_id = %warehouse.id, "Warehouse created");
        Ok(warehouse)
    }

    pub async fn get_product(&self, establishment_id: &str, id: &str) -> ServiceResult<Product> {
        let mut conn = self.db.acquire().await?;
        let product = CatalogRepository::new(&mut conn)
            .get_product(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        Ok(product)
    }

    pub async fn get_tech_card(&self, establishment_id: &str, id: &str) -> ServiceResult<TechCard> {
        let mut conn = self.db.acquire().await?;
        let card = CatalogRepository::new(&mut conn)
            .get_tech_card(id, establishment_id)
            .await?
            .ok_or_else(|| CoreError::TechCardNotFound(id.to_string()))?;

        Ok(card)
    }

    pub async fn list_warehouses(&self, establishment_id: &str) -> ServiceResult<Vec<Warehouse>> {
        let mut conn = self.db.acquire().await?;
        Ok(CatalogRepository::new(&mut conn)
            .list_warehouses(establishment_id)
            .await?)
    }
}

pub(crate) fn new_warehouse(establishment_id: &str, name: &str) -> Warehouse {
    Warehouse {
        id: Uuid::new_v4().to_string(),
        establishment_id: establishment_id.to_string(),
        name: name.trim().to_string(),
        created_at: Utc::now(),
    }
}

async fn ensure_establishment(conn: &mut SqliteConnection, establishment_id: &str) -> ServiceResult<()> {
    if EstablishmentRepository::new(conn)
        .get_by_id(establishment_id)
        .await?
        .is_none()
    {
        return Err(CoreError::EstablishmentNotFound(establishment_id.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{onboard, tavern};

    #[tokio::test]
    async fn test_products_are_scoped() {
        let tavern = tavern().await;
        let first = onboard(&tavern).await;
        let second = onboard(&tavern).await;

        let product = tavern
            .catalog()
            .create_product(&first.establishment.id, "  Lemonade ", Money::from_cents(350))
            .await
            .unwrap();
        assert_eq!(product.name, "Lemonade");

        let found = tavern.catalog().get_product(&first.establishment.id, &product.id).await.unwrap();
        assert_eq!(found.price_cents, 350);

        let err = tavern
            .catalog()
            .get_product(&second.establishment.id, &product.id)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_establishment() {
        let tavern = tavern().await;

        let err = tavern
            .catalog()
            .create_warehouse("missing", "Cellar")
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::EstablishmentNotFound(_))));
    }

    #[tokio::test]
    async fn test_extra_warehouse_listed() {
        let tavern = tavern().await;
        let setup = onboard(&tavern).await;
        let est = &setup.establishment.id;

        tavern.catalog().create_warehouse(est, "Bar").await.unwrap();
        let warehouses = tavern.catalog().list_warehouses(est).await.unwrap();
        assert_eq!(warehouses.len(), 2);
    }
}
