//! Versioned, named task-description templates with `{variable}` placeholders.

mod catalog;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

lazy_static! {
    static ref VAR_PATTERN: Regex =
        Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("valid template variable regex");
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub name: String,
    pub content: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            version: default_version(),
            category: None,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Variables referenced by the template, sorted.
    pub fn variables(&self) -> BTreeSet<String> {
        VAR_PATTERN
            .captures_iter(&self.content)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Substitutes every `{name}`. Extra variables are ignored.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
        let missing: Vec<String> = self
            .variables()
            .into_iter()
            .filter(|v| !vars.contains_key(v))
            .collect();
        if !missing.is_empty() {
            return Err(TemplateError::MissingVariables(missing));
        }

        let rendered = VAR_PATTERN.replace_all(&self.content, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }

    /// Checks the template renders when every variable is supplied.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let dummy: HashMap<String, String> = self
            .variables()
            .into_iter()
            .map(|v| (v, "x".to_string()))
            .collect();
        self.render(&dummy).map(|_| ())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<String, TaskTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with the stock research / scraping / shopping /
    /// social templates.
    pub fn builtin() -> Self {
        let mut lib = Self::new();
        for template in catalog::builtin_templates() {
            lib.templates.insert(template.name.clone(), template);
        }
        lib
    }

    /// Registers `template`. Replacing an existing name requires a strictly
    /// greater version.
    pub fn add(&mut self, template: TaskTemplate) -> Result<(), TemplateError> {
        if let Some(existing) = self.templates.get(&template.name) {
            if template.version <= existing.version {
                return Err(TemplateError::VersionNotIncreased {
                    name: template.name,
                    existing: existing.version,
                    proposed: template.version,
                });
            }
        }
        template.validate()?;

        tracing::debug!(name = %template.name, version = template.version, "Registered template");
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&TaskTemplate, TemplateError> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    pub fn render(
        &self,
        name: &str,
        vars: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        self.get(name)?.render(vars)
    }

    /// Renders each template in order and joins them with a single space.
    pub fn compose<S: AsRef<str>>(
        &self,
        names: &[S],
        vars: &HashMap<String, String>,
    ) -> Result<String, TemplateError> {
        let parts = names
            .iter()
            .map(|n| self.render(n.as_ref(), vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" "))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn templates(&self) -> impl Iterator<Item = &TaskTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn export_json(&self) -> Result<String, TemplateError> {
        let items: Vec<&TaskTemplate> = self.templates.values().collect();
        Ok(serde_json::to_string_pretty(&items)?)
    }

    /// Builds a library from a JSON array of templates, applying the same
    /// rules as `add`.
    pub fn import_json(data: &str) -> Result<Self, TemplateError> {
        let items: Vec<TaskTemplate> = serde_json::from_str(data)?;
        let mut lib = Self::new();
        for item in items {
            lib.add(item)?;
        }
        Ok(lib)
    }

    /// Adds every template from `other`, keeping whichever side has the
    /// higher version.
    pub fn merge(&mut self, other: TemplateLibrary) {
        for (name, template) in other.templates {
            match self.templates.get(&name) {
                Some(existing) if existing.version >= template.version => {}
                _ => {
                    self.templates.insert(name, template);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_substitutes_variables() {
        let mut lib = TemplateLibrary::new();
        lib.add(TaskTemplate::new("news", "Find {topic} news")).unwrap();

        let out = lib.render("news", &vars(&[("topic", "AI")])).unwrap();
        assert_eq!(out, "Find AI news");
    }

    #[test]
    fn render_reports_missing_variable_name() {
        let mut lib = TemplateLibrary::new();
        lib.add(TaskTemplate::new("news", "Find {topic} news")).unwrap();

        let err = lib.render("news", &HashMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariables(ref v) if v == &["topic"]));
        assert!(err.to_string().contains("topic"));
    }

    #[test]
    fn variables_are_collected_once() {
        let t = TaskTemplate::new("t", "{b} then {a} then {b} and {not valid}");
        let found: Vec<String> = t.variables().into_iter().collect();
        assert_eq!(found, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn add_requires_strictly_greater_version() {
        let mut lib = TemplateLibrary::new();
        lib.add(TaskTemplate::new("t", "old {x}")).unwrap();

        let same = lib.add(TaskTemplate::new("t", "same {x}"));
        assert!(matches!(
            same,
            Err(TemplateError::VersionNotIncreased { existing: 1, proposed: 1, .. })
        ));
        let lower = lib.add(TaskTemplate::new("t", "lower {x}").with_version(0));
        assert!(lower.is_err());
        assert_eq!(lib.render("t", &vars(&[("x", "1")])).unwrap(), "old 1");

        lib.add(TaskTemplate::new("t", "new {x}").with_version(2)).unwrap();
        assert_eq!(lib.render("t", &vars(&[("x", "1")])).unwrap(), "new 1");
    }

    #[test]
    fn compose_joins_with_single_space() {
        let mut lib = TemplateLibrary::new();
        lib.add(TaskTemplate::new("search", "Search {topic}.")).unwrap();
        lib.add(TaskTemplate::new("summarize", "Summarize findings."))
            .unwrap();

        let out = lib
            .compose(&["search", "summarize"], &vars(&[("topic", "rust")]))
            .unwrap();
        assert_eq!(out, "Search rust. Summarize findings.");
    }

    #[test]
    fn unknown_template_is_not_found() {
        let lib = TemplateLibrary::new();
        assert!(matches!(
            lib.render("nope", &HashMap::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn json_export_and_import_preserve_templates() {
        let mut lib = TemplateLibrary::new();
        lib.add(
            TaskTemplate::new("scrape", "Collect {query} from {website}")
                .with_version(3)
                .with_category("data_collection"),
        )
        .unwrap();

        let restored = TemplateLibrary::import_json(&lib.export_json().unwrap()).unwrap();
        assert_eq!(
            restored.get("scrape").unwrap(),
            lib.get("scrape").unwrap()
        );
    }

    #[test]
    fn import_applies_version_rule() {
        let data = r#"[
            {"name": "t", "content": "a", "version": 2},
            {"name": "t", "content": "b", "version": 2}
        ]"#;
        assert!(matches!(
            TemplateLibrary::import_json(data),
            Err(TemplateError::VersionNotIncreased { .. })
        ));
    }

    #[test]
    fn builtin_catalog_is_categorised() {
        let lib = TemplateLibrary::builtin();
        assert_eq!(lib.len(), 4);
        let scrape = lib.get("data_scrape").unwrap();
        assert_eq!(scrape.category.as_deref(), Some("data_collection"));
        assert_eq!(
            lib.render(
                "news_summarization",
                &vars(&[("topic", "quantum computing")])
            )
            .unwrap(),
            "Summarize the latest news about 'quantum computing' from multiple sources."
        );
    }

    #[test]
    fn merge_keeps_higher_version() {
        let mut lib = TemplateLibrary::builtin();
        let mut extra = TemplateLibrary::new();
        extra
            .add(TaskTemplate::new("monitoring", "Watch {keyword}").with_version(5))
            .unwrap();
        extra.add(TaskTemplate::new("custom", "Do it")).unwrap();

        lib.merge(extra);
        assert_eq!(lib.get("monitoring").unwrap().content, "Watch {keyword}");
        assert!(lib.get("custom").is_ok());
    }
}
