use handlebars::Handlebars;
use handlebars::{Helper, HelperResult, RenderContext, RenderError};

#[cfg(test)]
#[path = "helpers_tests.rs"]
mod tests;

/// Register all Handlebars helpers used by DuckyCoder reports.
pub fn register_helpers(handlebars: &mut Handlebars<'static>) {
    register_json_helper(handlebars);
    register_format_helper(handlebars);
    register_percentage_helper(handlebars);

    // Helper: capitalize the first letter of a string
    register_string_transform_helper(handlebars, "capitalize", |value| {
        let mut chars = value.chars();
        if let Some(first) = chars.next() {
            format!("{}{}", first.to_uppercase(), chars.as_str())
        } else {
            value.to_string()
        }
    });

    register_string_transform_helper(handlebars, "upper", str::to_uppercase);

    // Helper: map a severity label to its CSS badge class
    register_string_transform_helper(handlebars, "severity_class", |severity| {
        match severity {
            "critical" | "high" => "badge-danger",
            "medium" => "badge-warning",
            _ => "badge-info",
        }
        .to_string()
    });

    // Helper: map the overall status to its CSS class
    register_string_transform_helper(handlebars, "status_class", |status| {
        match status {
            "good" => "status-good",
            "needs_attention" => "status-warning",
            _ => "status-critical",
        }
        .to_string()
    });
}

/// Register the JSON pretty-print helper
fn register_json_helper(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper(
        "json",
        Box::new(
            |h: &Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut RenderContext,
             out: &mut dyn handlebars::Output|
             -> HelperResult {
                let value = h
                    .param(0)
                    .map(|v| v.value())
                    .ok_or_else(|| RenderError::new("json helper requires a parameter"))?;
                let json_str = serde_json::to_string_pretty(value)
                    .map_err(|e| RenderError::new(&format!("JSON serialization error: {}", e)))?;
                out.write(&json_str)?;
                Ok(())
            },
        ),
    );
}

/// Register the format number helper
fn register_format_helper(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper(
        "format",
        Box::new(
            |h: &Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut RenderContext,
             out: &mut dyn handlebars::Output|
             -> HelperResult {
                let value = h.param(0).and_then(|v| v.value().as_f64()).ok_or_else(|| {
                    RenderError::new("format helper requires a numeric parameter")
                })?;
                let format_str = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("0.1");
                let rendered = match format_str {
                    "0.0" => format!("{:.0}", value),
                    "0.2" => format!("{:.2}", value),
                    _ => format!("{:.1}", value),
                };
                out.write(&rendered)?;
                Ok(())
            },
        ),
    );
}

/// Register the percentage helper
fn register_percentage_helper(handlebars: &mut Handlebars<'static>) {
    handlebars.register_helper(
        "percentage",
        Box::new(
            |h: &Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut RenderContext,
             out: &mut dyn handlebars::Output|
             -> HelperResult {
                let value = h.param(0).and_then(|v| v.value().as_f64()).ok_or_else(|| {
                    RenderError::new("percentage helper requires a numeric parameter")
                })?;
                out.write(&format!("{:.0}", value * 100.0))?;
                Ok(())
            },
        ),
    );
}

/// Register a helper that transforms a single string parameter.
fn register_string_transform_helper<F>(handlebars: &mut Handlebars<'static>, name: &str, transform: F)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let helper_name = name.to_string();
    handlebars.register_helper(
        name,
        Box::new(
            move |h: &Helper,
                  _: &Handlebars,
                  _: &handlebars::Context,
                  _: &mut RenderContext,
                  out: &mut dyn handlebars::Output|
                  -> HelperResult {
                let value = h.param(0).and_then(|v| v.value().as_str()).ok_or_else(|| {
                    RenderError::new(&format!("{} helper requires a string parameter", helper_name))
                })?;
                out.write(&transform(value))?;
                Ok(())
            },
        ),
    );
}
