use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A row in the user's food library. Nutrition values are per serving.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FoodRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: String,
    pub barcode: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewFood<'a> {
    pub name: &'a str,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub serving_size: &'a str,
    pub barcode: Option<&'a str>,
}

pub async fn create(db: &PgPool, user_id: Uuid, food: NewFood<'_>) -> anyhow::Result<FoodRecord> {
    let row = sqlx::query_as::<_, FoodRecord>(
        r#"
        INSERT INTO foods (user_id, name, calories, protein, carbs, fats, serving_size, barcode)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, user_id, name, calories, protein, carbs, fats, serving_size, barcode, created_at
        "#,
    )
    .bind(user_id)
    .bind(food.name)
    .bind(food.calories)
    .bind(food.protein)
    .bind(food.carbs)
    .bind(food.fats)
    .bind(food.serving_size)
    .bind(food.barcode)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list(
    db: &PgPool,
    user_id: Uuid,
    name_filter: Option<&str>,
) -> anyhow::Result<Vec<FoodRecord>> {
    let rows = sqlx::query_as::<_, FoodRecord>(
        r#"
        SELECT id, user_id, name, calories, protein, carbs, fats, serving_size, barcode, created_at
        FROM foods
        WHERE user_id = $1
          AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
        ORDER BY name ASC
        "#,
    )
    .bind(user_id)
    .bind(name_filter)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<FoodRecord>> {
    let row = sqlx::query_as::<_, FoodRecord>(
        r#"
        SELECT id, user_id, name, calories, protein, carbs, fats, serving_size, barcode, created_at
        FROM foods
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Delete a food. Log entries that referenced it keep a NULL food reference
/// (ON DELETE SET NULL) and aggregate as zero from then on.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM foods
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
