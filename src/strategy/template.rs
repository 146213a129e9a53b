use crate::config::ConfigError;
use crate::strategy::{Result, StrategyError};
use handlebars::Handlebars;
use serde::Serialize;

/// Named command-line templates of one strategy, compiled up front
pub struct CommandTemplates {
    handlebars: Handlebars<'static>,
}

impl CommandTemplates {
    /// `migrator` names the owning migrator in configuration errors.
    pub fn new(migrator: &str, templates: &[(&str, &str)]) -> std::result::Result<Self, ConfigError> {
        let mut handlebars = Handlebars::new();
        // command lines, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        for (name, template) in templates {
            handlebars
                .register_template_string(name, *template)
                .map_err(|e| ConfigError::InvalidMigratorSettings {
                    name: migrator.to_string(),
                    reason: format!("{name}: {e}"),
                })?;
        }

        Ok(Self { handlebars })
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| StrategyError::Template {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }
}
