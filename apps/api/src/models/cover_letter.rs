use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoverLetter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub job_description: Option<String>,
    pub company_name: String,
    pub job_title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
