use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_CALORIE_GOAL: f64 = 2200.0;
pub const DEFAULT_PROTEIN_GOAL: f64 = 150.0;
pub const DEFAULT_CARB_GOAL: f64 = 250.0;
pub const DEFAULT_FAT_GOAL: f64 = 70.0;

/// Daily nutrition targets. Users who never saved a profile get the
/// documented defaults.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Goals {
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carb_goal: f64,
    pub fat_goal: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            calorie_goal: DEFAULT_CALORIE_GOAL,
            protein_goal: DEFAULT_PROTEIN_GOAL,
            carb_goal: DEFAULT_CARB_GOAL,
            fat_goal: DEFAULT_FAT_GOAL,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRecord {
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_key: Option<String>,
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carb_goal: f64,
    pub fat_goal: f64,
    pub updated_at: OffsetDateTime,
}

impl ProfileRecord {
    pub fn goals(&self) -> Goals {
        Goals {
            calorie_goal: self.calorie_goal,
            protein_goal: self.protein_goal,
            carb_goal: self.carb_goal,
            fat_goal: self.fat_goal,
        }
    }
}

pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<ProfileRecord>> {
    let row = sqlx::query_as::<_, ProfileRecord>(
        r#"
        SELECT user_id, first_name, last_name, avatar_key,
               calorie_goal, protein_goal, carb_goal, fat_goal, updated_at
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Goals for the stats endpoints: stored row if present, defaults otherwise.
pub async fn goals(db: &PgPool, user_id: Uuid) -> anyhow::Result<Goals> {
    Ok(get(db, user_id)
        .await?
        .map(|p| p.goals())
        .unwrap_or_default())
}

pub struct ProfileUpdate<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub calorie_goal: f64,
    pub protein_goal: f64,
    pub carb_goal: f64,
    pub fat_goal: f64,
}

pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    update: ProfileUpdate<'_>,
) -> anyhow::Result<ProfileRecord> {
    let row = sqlx::query_as::<_, ProfileRecord>(
        r#"
        INSERT INTO profiles (user_id, first_name, last_name,
                              calorie_goal, protein_goal, carb_goal, fat_goal)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            calorie_goal = EXCLUDED.calorie_goal,
            protein_goal = EXCLUDED.protein_goal,
            carb_goal = EXCLUDED.carb_goal,
            fat_goal = EXCLUDED.fat_goal,
            updated_at = now()
        RETURNING user_id, first_name, last_name, avatar_key,
                  calorie_goal, protein_goal, carb_goal, fat_goal, updated_at
        "#,
    )
    .bind(user_id)
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(update.calorie_goal)
    .bind(update.protein_goal)
    .bind(update.carb_goal)
    .bind(update.fat_goal)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn set_avatar_key(
    db: &PgPool,
    user_id: Uuid,
    avatar_key: &str,
) -> anyhow::Result<Option<String>> {
    // Returns the previous key so the caller can clean up the old object.
    let previous: Option<(Option<String>,)> = sqlx::query_as(
        r#"
        SELECT avatar_key FROM profiles WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, avatar_key)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET
            avatar_key = EXCLUDED.avatar_key,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(avatar_key)
    .execute(db)
    .await?;

    Ok(previous.and_then(|(key,)| key))
}
