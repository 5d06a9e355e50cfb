use super::TaskTemplate;

/// (category, name, content)
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "research",
        "news_summarization",
        "Summarize the latest news about '{topic}' from multiple sources.",
    ),
    (
        "data_collection",
        "data_scrape",
        "Collect data related to '{query}' from '{website}'.",
    ),
    (
        "e-commerce",
        "price_comparison",
        "Compare prices for '{product}' across popular e-commerce sites.",
    ),
    (
        "social_media",
        "monitoring",
        "Monitor social media for posts mentioning '{keyword}' and summarize insights.",
    ),
];

pub(super) fn builtin_templates() -> impl Iterator<Item = TaskTemplate> {
    BUILTIN
        .iter()
        .map(|(category, name, content)| TaskTemplate::new(*name, *content).with_category(*category))
}
