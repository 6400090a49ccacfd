// Prompt templates for the dashboard insights.

/// Industry insight prompt. Replace `{industry}` before sending.
pub const INSIGHTS_PROMPT_TEMPLATE: &str = r#"Provide {industry} industry insights in this exact JSON format:
{
  "salaryRanges": [
    {"role": "Junior Developer", "min": 50000, "max": 80000, "median": 65000, "location": "US"},
    {"role": "Senior Developer", "min": 80000, "max": 120000, "median": 100000, "location": "US"},
    {"role": "Lead Developer", "min": 100000, "max": 150000, "median": 125000, "location": "US"},
    {"role": "Manager", "min": 90000, "max": 140000, "median": 115000, "location": "US"},
    {"role": "Director", "min": 120000, "max": 200000, "median": 160000, "location": "US"}
  ],
  "growthRate": 15,
  "demandLevel": "High",
  "topSkills": ["JavaScript", "Python", "React", "Node.js", "AWS"],
  "marketOutlook": "Positive",
  "keyTrends": ["Remote Work", "AI Integration", "Cloud Migration", "DevOps", "Security"],
  "recommendedSkills": ["TypeScript", "Docker", "Kubernetes", "GraphQL", "Machine Learning"]
}

Use roles, salaries and skills that are typical for the {industry} industry.
demandLevel must be one of "Low", "Medium", "High".
marketOutlook must be one of "Negative", "Neutral", "Positive".
growthRate is an annual percentage.
Include at least 5 roles, 5 skills and 5 trends.

{json_only}"#;

/// Tech stack listing prompt. Replace `{json_only}` before sending.
pub const TECH_STACKS_PROMPT_TEMPLATE: &str = r#"Generate a JSON object with a single field "stacks": an array listing popular software tech stacks used by teams today.
Each item must have this exact shape:
{
  "name": "React + Node + AWS",
  "items": ["React", "Node.js", "AWS"],
  "description": "One sentence on typical use cases and strengths"
}
Include 8-10 stacks spanning web, mobile, backend, cloud-native, data/ML.

{json_only}"#;
