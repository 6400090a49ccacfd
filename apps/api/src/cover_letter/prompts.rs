use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::user::User;

/// Caller-supplied details for one letter. Contact fields override the profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverLetterRequest {
    pub job_title: String,
    pub company_name: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// "October 7, 2025"
pub fn format_letter_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn build_cover_letter_prompt(req: &CoverLetterRequest, user: &User, today: NaiveDate) -> String {
    let date = format_letter_date(today);
    let company = req.company_name.trim();
    let name = non_blank(req.full_name.as_deref())
        .or(non_blank(user.name.as_deref()))
        .unwrap_or("");
    let email = non_blank(req.email.as_deref())
        .or(non_blank(Some(user.email.as_str())))
        .unwrap_or("");
    let greeting = if company.is_empty() {
        "Dear Hiring Manager,".to_string()
    } else {
        format!("Dear Hiring Manager at {company},")
    };
    let experience = user
        .experience
        .map(|years| years.to_string())
        .unwrap_or_default();

    format!(
        r#"Write a professional cover letter for a {job_title} position at {company}.

Include a contact header at the top using these values if provided, otherwise leave blank lines:
- Name: {name}
- Address: {address}
- Phone: {phone}
- Email: {email}

About the candidate:
- Industry: {industry}
- Years of Experience: {experience}
- Skills: {skills}
- Professional Background: {bio}

Job Description:
{job_description}

Requirements:
1. Use a professional, enthusiastic tone.
2. Highlight relevant skills and experience with 2-3 concise bullet points for key achievements.
3. Show understanding of the company's needs and tailor to the role.
4. Keep it concise (max 400 words total).
5. Use clean, standards-compliant business letter formatting in markdown (no HTML).
6. Do NOT wrap the output in triple backticks.
7. Relate the candidate's background to job requirements.
8. Start with the contact header, then date, greeting, body, closing signature including the same name.

Today's date is: {date}. Use exactly this date in the letter.

Use this EXACT markdown structure (no headings unless specified, and one blank line between blocks):

[Full Name]
[Address]
[Phone]
[Email]

{date}

{greeting}

[Opening paragraph: 2-3 sentences summarizing fit and interest.]

- [Achievement bullet 1: quantified, role-relevant]
- [Achievement bullet 2: quantified, role-relevant]
- [Achievement bullet 3 (optional): quantified, role-relevant]

[Closing paragraph: reaffirm fit, appreciation, and call to action.]

Sincerely,
[Full Name]"#,
        job_title = req.job_title.trim(),
        address = non_blank(req.address.as_deref()).unwrap_or(""),
        phone = non_blank(req.phone.as_deref()).unwrap_or(""),
        industry = user.industry.as_deref().unwrap_or(""),
        skills = user.skills.join(", "),
        bio = user.bio.as_deref().unwrap_or(""),
        job_description = req.job_description.as_deref().unwrap_or("").trim(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            external_id: "user_1".to_string(),
            email: "ada@example.com".to_string(),
            name: Some("Ada Lovelace".to_string()),
            industry: Some("Software Development".to_string()),
            experience: Some(6),
            bio: Some("Backend engineer.".to_string()),
            skills: vec!["Rust".to_string(), "Postgres".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request() -> CoverLetterRequest {
        CoverLetterRequest {
            job_title: "Platform Engineer".to_string(),
            company_name: "Acme".to_string(),
            job_description: Some("Build internal tooling.".to_string()),
            ..Default::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 7).unwrap()
    }

    #[test]
    fn test_date_format_has_no_padding() {
        assert_eq!(format_letter_date(date()), "October 7, 2025");
        let new_year = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(format_letter_date(new_year), "January 15, 2026");
    }

    #[test]
    fn test_prompt_uses_profile_when_contact_missing() {
        let prompt = build_cover_letter_prompt(&request(), &user(), date());
        assert!(prompt.contains("for a Platform Engineer position at Acme."));
        assert!(prompt.contains("- Name: Ada Lovelace"));
        assert!(prompt.contains("- Email: ada@example.com"));
        assert!(prompt.contains("- Skills: Rust, Postgres"));
        assert!(prompt.contains("- Years of Experience: 6"));
        assert!(prompt.contains("Today's date is: October 7, 2025."));
        assert!(prompt.contains("Dear Hiring Manager at Acme,"));
    }

    #[test]
    fn test_request_contact_overrides_profile() {
        let req = CoverLetterRequest {
            full_name: Some("A. Lovelace".to_string()),
            email: Some("  ".to_string()),
            phone: Some("555-0100".to_string()),
            ..request()
        };
        let prompt = build_cover_letter_prompt(&req, &user(), date());
        assert!(prompt.contains("- Name: A. Lovelace"));
        assert!(prompt.contains("- Email: ada@example.com"));
        assert!(prompt.contains("- Phone: 555-0100"));
    }

    #[test]
    fn test_greeting_without_company() {
        let req = CoverLetterRequest {
            company_name: " ".to_string(),
            ..request()
        };
        let prompt = build_cover_letter_prompt(&req, &user(), date());
        assert!(prompt.contains("\nDear Hiring Manager,\n"));
    }
}
