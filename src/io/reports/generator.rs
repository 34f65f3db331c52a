//! Template and serde backed report writers.

use std::fs;
use std::path::Path;

use handlebars::Handlebars;
use serde_json::Value;
use tracing::warn;

use super::document::ReportDocument;
use super::error::ReportError;
use super::helpers::register_helpers;

pub(super) const MARKDOWN_TEMPLATE_NAME: &str = "markdown_report";
pub(super) const HTML_TEMPLATE_NAME: &str = "html_report";

#[derive(Debug)]
pub struct ReportGenerator {
    handlebars: Handlebars<'static>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        let mut handlebars = Handlebars::new();
        register_helpers(&mut handlebars);
        register_builtin_templates(&mut handlebars);
        Self { handlebars }
    }
}

fn register_builtin_templates(handlebars: &mut Handlebars<'static>) {
    if let Err(err) = handlebars.register_template_string(
        MARKDOWN_TEMPLATE_NAME,
        include_str!("./templates/report.md.hbs"),
    ) {
        warn!("Failed to register Markdown template: {}", err);
    }

    if let Err(err) = handlebars
        .register_template_string(HTML_TEMPLATE_NAME, include_str!("./templates/report.html.hbs"))
    {
        warn!("Failed to register HTML template: {}", err);
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a built-in template with the `.hbs` file at `path`.
    pub fn with_template_file<P: AsRef<Path>>(
        mut self,
        template_name: &str,
        path: P,
    ) -> Result<Self, ReportError> {
        let content = fs::read_to_string(path)?;
        self.handlebars
            .register_template_string(template_name, content)?;
        Ok(self)
    }

    pub fn render_markdown(&self, document: &ReportDocument) -> Result<String, ReportError> {
        self.render_template(MARKDOWN_TEMPLATE_NAME, document)
    }

    pub fn render_html(&self, document: &ReportDocument) -> Result<String, ReportError> {
        self.render_template(HTML_TEMPLATE_NAME, document)
    }

    pub fn render_json(&self, document: &ReportDocument) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(document)?)
    }

    pub fn render_yaml(&self, document: &ReportDocument) -> Result<String, ReportError> {
        Ok(serde_yaml::to_string(document)?)
    }

    fn render_template(
        &self,
        template_name: &str,
        document: &ReportDocument,
    ) -> Result<String, ReportError> {
        let data: Value = serde_json::to_value(document)?;
        let rendered = self.handlebars.render(template_name, &data)?;
        Ok(rendered)
    }
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
