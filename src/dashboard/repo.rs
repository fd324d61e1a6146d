use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// The stored goal, or `None` if the user has no row yet.
    async fn calorie_goal(&self, user_id: Uuid) -> anyhow::Result<Option<i32>>;
    async fn set_calorie_goal(&self, user_id: Uuid, goal: i32) -> anyhow::Result<()>;
}

pub struct PgGoalStore {
    db: PgPool,
}

impl PgGoalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Makes sure the implicit user has a row so meals and custom foods can
    /// reference it.
    pub async fn ensure_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (id, device_id) VALUES ($1, $1::text) ON CONFLICT (id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("ensure user")?;
        Ok(())
    }
}

#[async_trait]
impl GoalStore for PgGoalStore {
    async fn calorie_goal(&self, user_id: Uuid) -> anyhow::Result<Option<i32>> {
        let goal: Option<i32> =
            sqlx::query_scalar("SELECT daily_calorie_goal FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .context("get calorie goal")?;
        Ok(goal)
    }

    async fn set_calorie_goal(&self, user_id: Uuid, goal: i32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, device_id, daily_calorie_goal)
            VALUES ($1, $1::text, $2)
            ON CONFLICT (id) DO UPDATE
               SET daily_calorie_goal = EXCLUDED.daily_calorie_goal,
                   updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(goal)
        .execute(&self.db)
        .await
        .context("set calorie goal")?;
        Ok(())
    }
}
