//! # Catalog Repository
//!
//! Minimal persistence for what orders and stock reference: products, tech
//! cards, ingredients and warehouses. Price lookups only see active rows.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use tavern_core::{Ingredient, Product, TechCard, Warehouse};

/// Repository for catalog entries.
#[derive(Debug)]
pub struct CatalogRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CatalogRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CatalogRepository { conn }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn insert_product(&mut self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, establishment_id, name, price_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.establishment_id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_product(&mut self, id: &str, establishment_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, establishment_id, name, price_cents, is_active, created_at
            FROM products
            WHERE id = ?1 AND establishment_id = ?2 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(product)
    }

    // =========================================================================
    // Tech cards
    // =========================================================================

    pub async fn insert_tech_card(&mut self, card: &TechCard) -> DbResult<()> {
        debug!(id = %card.id, name = %card.name, "Inserting tech card");

        sqlx::query(
            r#"
            INSERT INTO tech_cards (id, establishment_id, name, price_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&card.id)
        .bind(&card.establishment_id)
        .bind(&card.name)
        .bind(card.price_cents)
        .bind(card.is_active)
        .bind(card.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_tech_card(&mut self, id: &str, establishment_id: &str) -> DbResult<Option<TechCard>> {
        let card = sqlx::query_as::<_, TechCard>(
            r#"
            SELECT id, establishment_id, name, price_cents, is_active, created_at
            FROM tech_cards
            WHERE id = ?1 AND establishment_id = ?2 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(card)
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    pub async fn insert_ingredient(&mut self, ingredient: &Ingredient) -> DbResult<()> {
        debug!(id = %ingredient.id, name = %ingredient.name, "Inserting ingredient");

        sqlx::query(
            r#"
            INSERT INTO ingredients (id, establishment_id, name, unit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&ingredient.id)
        .bind(&ingredient.establishment_id)
        .bind(&ingredient.name)
        .bind(&ingredient.unit)
        .bind(ingredient.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_ingredient(&mut self, id: &str, establishment_id: &str) -> DbResult<Option<Ingredient>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r#"
            SELECT id, establishment_id, name, unit, created_at
            FROM ingredients
            WHERE id = ?1 AND establishment_id = ?2
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(ingredient)
    }

    // =========================================================================
    // Warehouses
    // =========================================================================

    pub async fn insert_warehouse(&mut self, warehouse: &Warehouse) -> DbResult<()> {
        debug!(id = %warehouse.id, name = %warehouse.name, "Inserting warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, establishment_id, name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.establishment_id)
        .bind(&warehouse.name)
        .bind(warehouse.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn get_warehouse(&mut self, id: &str, establishment_id: &str) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, establishment_id, name, created_at
            FROM warehouses
            WHERE id = ?1 AND establishment_id = ?2
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(warehouse)
    }

    pub async fn list_warehouses(&mut self, establishment_id: &str) -> DbResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, establishment_id, name, created_at
            FROM warehouses
            WHERE establishment_id = ?1
            ORDER BY created_at, name
            "#,
        )
        .bind(establishment_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(warehouses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_price_lookup_is_scoped_and_active_only() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;
        let other = fixtures::establishment(&mut conn).await;

        let mut retired = fixtures::new_product(&est.id, 900);
        retired.is_active = false;
        let card = fixtures::new_tech_card(&est.id, 1_250);

        let mut repo = CatalogRepository::new(&mut conn);
        repo.insert_product(&retired).await.unwrap();
        repo.insert_tech_card(&card).await.unwrap();

        assert!(repo.get_product(&retired.id, &est.id).await.unwrap().is_none());

        let loaded = repo.get_tech_card(&card.id, &est.id).await.unwrap().unwrap();
        assert_eq!(loaded.price().cents(), 1_250);
        assert!(repo.get_tech_card(&card.id, &other.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_warehouses_and_ingredients() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let est = fixtures::establishment(&mut conn).await;
        let warehouse = fixtures::warehouse(&mut conn, &est.id).await;
        let flour = fixtures::ingredient(&mut conn, &est.id, "Flour", "kg").await;

        let mut repo = CatalogRepository::new(&mut conn);
        assert_eq!(repo.list_warehouses(&est.id).await.unwrap().len(), 1);
        assert_eq!(
            repo.get_warehouse(&warehouse.id, &est.id).await.unwrap().unwrap().name,
            warehouse.name
        );
        assert_eq!(
            repo.get_ingredient(&flour.id, &est.id).await.unwrap().unwrap().unit,
            "kg"
        );
    }
}
