//! Compose template rendering.
//!
//! Rendering is a pure function of the template text and a [`Configuration`]:
//!
//! 1. conditional elision rules cut template text that must not appear for
//!    this configuration, dropping lines the cut leaves blank;
//! 2. a single left-to-right scan replaces every `${NAME}` token from the
//!    [`Bindings`] table. Replaced text is never rescanned.
//!
//! [`render_to`] wraps the pure step with a template read and an atomic
//! descriptor write, so a failed render never touches the previous
//! descriptor.

mod bindings;

pub use bindings::{Binding, Bindings};

use crate::config::Configuration;
use crate::util::fs as fsutil;
use ambar_shared::errors::{AmbarError, AmbarResult};
use std::collections::BTreeSet;
use std::path::Path;

/// Removes template text when its condition holds for the configuration.
#[derive(Clone, Copy, Debug)]
pub struct ElisionRule {
    pub name: &'static str,
    pub applies: fn(&Configuration) -> bool,
    /// Removed wherever they occur, in order. A line left blank by a
    /// removal is dropped entirely.
    pub patterns: &'static [&'static str],
}

impl ElisionRule {
    fn elide(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        for line in template.split_inclusive('\n') {
            let mut kept = line.to_string();
            for pattern in self.patterns {
                kept = kept.replace(pattern, "");
            }
            if kept.len() != line.len() && kept.trim().is_empty() {
                continue;
            }
            out.push_str(&kept);
        }
        out
    }
}

/// Two services cannot bind the same host port; when the API shares the
/// frontend port its own mapping is dropped.
pub const API_PORT_SHARED_WITH_FRONTEND: ElisionRule = ElisionRule {
    name: "api-port-shared-with-frontend",
    applies: Configuration::shares_external_port,
    patterns: &["- \"${API_EXT_PORT}:${API_EXT_PORT}\"", "- ${API_EXT_PORT}"],
};

/// Ordered elision rules plus placeholder substitution.
#[derive(Clone, Debug)]
pub struct Renderer {
    rules: Vec<ElisionRule>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            rules: vec![API_PORT_SHARED_WITH_FRONTEND],
        }
    }
}

impl Renderer {
    /// Render `template` for `config` entirely in memory.
    pub fn render(&self, template: &str, config: &Configuration) -> AmbarResult<String> {
        let mut text = template.to_string();
        for rule in &self.rules {
            if (rule.applies)(config) {
                tracing::debug!(rule = rule.name, "Applying elision rule");
                text = rule.elide(&text);
            }
        }
        substitute(&text, &Bindings::from_config(config))
    }
}

/// Render with the default rule set.
pub fn render(template: &str, config: &Configuration) -> AmbarResult<String> {
    Renderer::default().render(template, config)
}

/// Read the template, render, then atomically replace the descriptor.
pub fn render_to(
    template_path: &Path,
    descriptor_path: &Path,
    config: &Configuration,
) -> AmbarResult<()> {
    let template = std::fs::read_to_string(template_path).map_err(|e| {
        AmbarError::Render(format!(
            "failed to read template {}: {}",
            template_path.display(),
            e
        ))
    })?;
    let descriptor = render(&template, config)?;
    fsutil::write_atomic(descriptor_path, descriptor.as_bytes())?;
    tracing::info!(path = %descriptor_path.display(), "Rendered deployment descriptor");
    Ok(())
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Replace `${NAME}` tokens in one pass.
///
/// Tokens with no binding (or not shaped like a placeholder, such as
/// `${VAR:-x}`) are copied through untouched.
pub fn substitute(template: &str, bindings: &Bindings) -> AmbarResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut unknown = BTreeSet::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}').filter(|&end| is_placeholder_name(&after[..end])) else {
            out.push_str("${");
            rest = after;
            continue;
        };

        let name = &after[..end];
        match bindings.get(name) {
            Some(Binding::Value(value)) => {
                if value.contains("${") {
                    return Err(AmbarError::UnsafeValue {
                        placeholder: name.to_string(),
                        value: value.clone(),
                    });
                }
                out.push_str(value);
            }
            Some(Binding::Missing(field)) => {
                return Err(AmbarError::KeyMissing {
                    placeholder: name.to_string(),
                    field,
                });
            }
            None => {
                unknown.insert(name);
                out.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    if !unknown.is_empty() {
        tracing::warn!(placeholders = ?unknown, "Template contains placeholders with no binding");
    }
    Ok(out)
}
