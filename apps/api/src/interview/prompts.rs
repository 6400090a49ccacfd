// Prompt templates for the interview module.

/// Quiz prompt. Replace `{industry}`, `{skills_clause}`, `{count}`, `{json_only}`.
pub const QUIZ_PROMPT_TEMPLATE: &str = r#"Generate {count} technical interview questions for a {industry} professional{skills_clause}.

Each question should be multiple choice with 4 options.

IMPORTANT: Do NOT include explanations. Explanations will be requested later per question.

Return strictly JSON with this schema:
{
  "questions": [
    {
      "question": "string",
      "options": ["string", "string", "string", "string"],
      "correctAnswer": "string"
    }
  ]
}
correctAnswer must be copied verbatim from options.

{json_only}"#;

/// Improvement tip prompt. Replace `{industry}`, `{wrong_answers}`.
pub const IMPROVEMENT_TIP_PROMPT_TEMPLATE: &str = r#"The user got the following {industry} technical interview questions wrong:

{wrong_answers}

Based on these mistakes, provide a concise, specific improvement tip.
Focus on the knowledge gaps revealed by these wrong answers.
Keep the response under 5 sentences and make it encouraging.
Don't explicitly mention the mistakes, instead focus on what to learn/practice."#;

/// Explanation prompt. Replace `{industry}`, `{question}`, `{correct_answer}`.
pub const EXPLANATION_PROMPT_TEMPLATE: &str = r#"Provide a concise explanation for why the following answer is correct in a {industry} interview context.
Keep under 4 sentences, practical and clear.

Question: {question}
Correct Answer: {correct_answer}"#;
