use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::Date;
use uuid::Uuid;

use crate::nutrition::{FoodFact, LogEntry, MealSlot};

/// A log entry joined to its food, if the food still exists.
#[derive(Debug, Clone)]
pub struct LoggedFood {
    pub entry: LogEntry,
    pub food: Option<FoodFact>,
}

#[derive(Debug, FromRow)]
struct JoinedRow {
    id: Uuid,
    food_id: Option<Uuid>,
    meal_slot: String,
    log_date: Date,
    quantity: f64,
    food_name: Option<String>,
    food_calories: Option<f64>,
    food_protein: Option<f64>,
    food_carbs: Option<f64>,
    food_fats: Option<f64>,
    food_serving_size: Option<String>,
}

impl JoinedRow {
    fn into_logged_food(self) -> anyhow::Result<LoggedFood> {
        let meal_slot: MealSlot = self
            .meal_slot
            .parse()
            .with_context(|| format!("log entry {}", self.id))?;
        // The LEFT JOIN misses when the food was deleted; food_id itself may
        // also already be NULL. Either way the entry carries no facts.
        let food = match (self.food_id, self.food_name) {
            (Some(food_id), Some(name)) => Some(FoodFact {
                id: food_id,
                name,
                calories: self.food_calories.unwrap_or(0.0),
                protein: self.food_protein.unwrap_or(0.0),
                carbs: self.food_carbs.unwrap_or(0.0),
                fats: self.food_fats.unwrap_or(0.0),
                serving_size: self.food_serving_size.unwrap_or_default(),
            }),
            _ => None,
        };
        Ok(LoggedFood {
            entry: LogEntry {
                id: self.id,
                food_id: self.food_id,
                meal_slot,
                log_date: self.log_date,
                quantity: self.quantity,
            },
            food,
        })
    }
}

const JOINED_SELECT: &str = r#"
    SELECT l.id, l.food_id, l.meal_slot, l.log_date, l.quantity,
           f.name AS food_name, f.calories AS food_calories,
           f.protein AS food_protein, f.carbs AS food_carbs,
           f.fats AS food_fats, f.serving_size AS food_serving_size
    FROM meal_logs l
    LEFT JOIN foods f ON f.id = l.food_id
"#;

pub async fn list_for_date(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<Vec<LoggedFood>> {
    let rows = sqlx::query_as::<_, JoinedRow>(&format!(
        "{JOINED_SELECT} WHERE l.user_id = $1 AND l.log_date = $2 ORDER BY l.created_at ASC"
    ))
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    rows.into_iter().map(JoinedRow::into_logged_food).collect()
}

pub async fn list_in_range(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<LoggedFood>> {
    let rows = sqlx::query_as::<_, JoinedRow>(&format!(
        "{JOINED_SELECT} WHERE l.user_id = $1 AND l.log_date BETWEEN $2 AND $3 \
         ORDER BY l.log_date DESC, l.created_at ASC"
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    rows.into_iter().map(JoinedRow::into_logged_food).collect()
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    food_id: Uuid,
    meal_slot: MealSlot,
    log_date: Date,
    quantity: f64,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO meal_logs (user_id, food_id, meal_slot, log_date, quantity)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(food_id)
    .bind(meal_slot.as_str())
    .bind(log_date)
    .bind(quantity)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn update_quantity(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    quantity: f64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE meal_logs
        SET quantity = $1
        WHERE id = $2 AND user_id = $3
        "#,
    )
    .bind(quantity)
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM meal_logs
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
