// All oracle prompt constants for the triage stages.

pub const SENTIMENT_SYSTEM: &str = "You are a sentiment analysis expert.";

/// Replace `{rating}` and `{review_text}` before sending.
pub const SENTIMENT_PROMPT_TEMPLATE: &str = r#"You are analyzing the sentiment of a mobile app review.
Classify the sentiment as one of: "Positive", "Neutral", or "Negative".
Consider both the rating and the review text in your analysis.

Rating: {rating} out of 5 stars
Review text: {review_text}

Respond with only a single word: Positive, Neutral, or Negative."#;

pub const CATEGORY_SYSTEM: &str = "You are an expert at categorizing app reviews.";

/// Replace `{categories}`, `{rating}` and `{review_text}` before sending.
pub const CATEGORY_PROMPT_TEMPLATE: &str = r#"You are categorizing a mobile app review into relevant topics.
Assign relevant categories from the following list:
{categories}

A review can belong to multiple categories if it mentions multiple issues.
Pick a maximum of 3 most relevant categories.

Rating: {rating} out of 5 stars
Review: "{review_text}"

Respond with ONLY the category names, separated by commas.
Example: UI/UX, Performance, Bugs/Crashes"#;
