// All oracle prompt constants for theme clustering and action plans.
// Reuses cross-cutting fragments from llm_client::prompts.

pub const CLUSTER_SYSTEM: &str =
    "You are an expert at analyzing app user feedback and clustering related issues.";

/// Replace `{json_only}` and `{reviews_json}` before sending.
pub const CLUSTER_PROMPT_TEMPLATE: &str = r#"You are analyzing app reviews to identify common themes and issues.
Below are high-priority app reviews in JSON format that need to be clustered into themes.

Each review has:
- id: unique identifier for the review
- text: the review content
- rating: star rating (1-5)
- sentiment: Positive, Neutral or Negative
- priority: priority level (1-5, 1 being most urgent)
- categories: categories assigned to the review

Analyze these reviews and cluster them into 2-5 common themes or issues.
For each theme, provide:
1. A short, descriptive title (max 5 words)
2. A brief summary of the issue (1-2 sentences)
3. The ids of the reviews that belong to this theme

Return a JSON array with this EXACT schema:
[
  {
    "title": "Theme Title",
    "summary": "Brief description of the issue",
    "review_ids": ["id1", "id2"]
  }
]

Be specific and practical in your themes. Focus on actionable issues.
{json_only}

REVIEWS:
{reviews_json}"#;

pub const PLAN_SYSTEM: &str =
    "You are an expert product manager who creates actionable plans for app issues.";

pub const NEW_PLAN_INSTRUCTION: &str = "Create a comprehensive action plan for this issue.";

/// Replace `{reference}` before use.
pub const UPDATE_PLAN_INSTRUCTION: &str = "Here is an existing workflow for this type of issue:

{reference}

Update or adapt the action plan based on the current reviews and the existing workflow. Add any missing steps.";

/// Replace `{title}`, `{summary}`, `{instruction}`, `{json_only}` and `{reviews}` before sending.
pub const PLAN_PROMPT_TEMPLATE: &str = r#"You are creating an action plan for a theme of high-priority app reviews.

Theme: {title}
Summary: {summary}

{instruction}

Provide:
1. An internal action plan (4-6 bullet points) with concrete technical steps the development team should take
2. A suggested user response (2-3 sentences) that customer support can send to these users

Return a JSON object with this EXACT schema:
{
  "action_steps": ["step one", "step two"],
  "user_response": "Response to users"
}
{json_only}

Reviews in this theme:
{reviews}"#;
