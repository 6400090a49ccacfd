//! Onboarding: a user picks an industry, and that industry's insight row is
//! created if it does not exist yet. The insight is generated before the
//! transaction opens so a slow model never holds a connection; insert and
//! profile update then commit together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::insights::generator::{find_insight, generate_insights_or_fallback, insert_insight};
use crate::llm_client::normalize::{cap_strings, clamp_str};
use crate::llm_client::TextGenerator;
use crate::models::user::User;

const MAX_SKILLS: usize = 50;
const MAX_SKILL_CHARS: usize = 80;
const MAX_INDUSTRY_CHARS: usize = 120;
const MAX_BIO_CHARS: usize = 2_000;
const MAX_EXPERIENCE_YEARS: i32 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub industry: String,
    #[serde(default)]
    pub experience: Option<i32>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "skills_list")]
    pub skills: Vec<String>,
}

// The onboarding form submits skills as "React, Node.js"; API clients send a list.
fn skills_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Skills {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Skills::deserialize(deserializer)? {
        Skills::List(list) => list,
        Skills::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    })
}

impl ProfileUpdate {
    /// Trims and bounds every field, rejecting an empty industry.
    pub fn validated(self) -> Result<ProfileUpdate, AppError> {
        let industry = clamp_str(self.industry.trim().to_string(), MAX_INDUSTRY_CHARS);
        if industry.is_empty() {
            return Err(AppError::Validation("industry is required".to_string()));
        }
        if let Some(years) = self.experience {
            if !(0..=MAX_EXPERIENCE_YEARS).contains(&years) {
                return Err(AppError::Validation(format!(
                    "experience must be between 0 and {MAX_EXPERIENCE_YEARS} years"
                )));
            }
        }
        let bio = self
            .bio
            .map(|b| clamp_str(b.trim().to_string(), MAX_BIO_CHARS))
            .filter(|b| !b.is_empty());

        Ok(ProfileUpdate {
            industry,
            experience: self.experience,
            bio,
            skills: cap_strings(self.skills, MAX_SKILLS, MAX_SKILL_CHARS),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardingStatus {
    pub is_onboarded: bool,
}

pub fn onboarding_status(user: &User) -> OnboardingStatus {
    OnboardingStatus {
        is_onboarded: user
            .industry
            .as_deref()
            .is_some_and(|i| !i.trim().is_empty()),
    }
}

pub async fn update_profile(
    pool: &PgPool,
    llm: &Arc<dyn TextGenerator>,
    user: &User,
    update: ProfileUpdate,
    timeout: Duration,
) -> Result<User, AppError> {
    let update = update.validated()?;

    let pending_insight = match find_insight(pool, &update.industry).await? {
        Some(_) => None,
        None => {
            info!("Generating insight for new industry '{}'", update.industry);
            let generated = generate_insights_or_fallback(llm, &update.industry, timeout).await;
            Some(generated.into_insight(&update.industry, Utc::now()))
        }
    };

    let mut tx = pool.begin().await?;
    if let Some(insight) = &pending_insight {
        insert_insight(&mut *tx, insight).await?;
    }
    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET industry = $2, experience = $3, bio = $4, skills = $5, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&update.industry)
    .bind(update.experience)
    .bind(&update.bio)
    .bind(&update.skills)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::Unauthorized)?;
    tx.commit().await?;

    info!("User {} onboarded into '{}'", updated.id, update.industry);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user(industry: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            external_id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            name: None,
            industry: industry.map(str::to_string),
            experience: None,
            bio: None,
            skills: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_onboarding_requires_industry() {
        assert!(!onboarding_status(&user(None)).is_onboarded);
        assert!(!onboarding_status(&user(Some(""))).is_onboarded);
        assert!(onboarding_status(&user(Some("Healthcare"))).is_onboarded);
    }

    #[test]
    fn test_blank_industry_rejected() {
        let update = ProfileUpdate {
            industry: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(update.validated(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_experience_range_checked() {
        let update = ProfileUpdate {
            industry: "Tech".to_string(),
            experience: Some(-1),
            ..Default::default()
        };
        assert!(matches!(update.validated(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let update = ProfileUpdate {
            industry: " Tech ".to_string(),
            experience: Some(4),
            bio: Some("  ".to_string()),
            skills: vec![" Rust ".to_string(), "".to_string(), "Go".to_string()],
        }
        .validated()
        .unwrap();
        assert_eq!(update.industry, "Tech");
        assert_eq!(update.bio, None);
        assert_eq!(update.skills, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_skills_accept_list_or_comma_string() {
        let from_list: ProfileUpdate =
            serde_json::from_str(r#"{"industry": "Tech", "skills": ["Rust", "Go"]}"#).unwrap();
        let from_csv: ProfileUpdate =
            serde_json::from_str(r#"{"industry": "Tech", "skills": "Rust, Go,"}"#).unwrap();
        assert_eq!(
            from_list.validated().unwrap().skills,
            from_csv.validated().unwrap().skills
        );
    }

    #[test]
    fn test_skills_optional() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"industry": "Tech"}"#).unwrap();
        assert!(update.skills.is_empty());
    }
}
