use sqlx::FromRow;
use uuid::Uuid;

/// Database model for user profiles (read-only author lookup)
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
}
