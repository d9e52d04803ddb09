//! Markdown body rendering for citation notes.
//!
//! Templates use Mustache sections: `{{#name}}..{{/name}}` renders once per
//! item of a list, once with an object pushed as scope, once for any other
//! truthy value, and not at all for false, null, empty strings or empty
//! lists. `{{^name}}..{{/name}}` renders only when `name` is falsy and
//! `{{&name}}` writes a value unchanged. Handlebars helpers such as `#if` and
//! `#each` keep working, since sections are served through handlebars'
//! `blockHelperMissing` hook.
//!
//! The context is built from a serializable entry by [`template_context`]:
//! every list of scalars becomes a list of `{"elt": value}` records and every
//! list or mapping field `name` gains a companion boolean `_bln_name`, so a
//! template can render a section header once and only when the section has
//! content.

use std::path::Path;
use std::sync::LazyLock;

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, JsonTruthy, Output,
    RenderContext, Renderable,
};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

const TEMPLATE_NAME: &str = "note";

/// Prefix of the presence flag added for each list or mapping field.
pub const PRESENCE_PREFIX: &str = "_bln_";

/// Template used when none is configured or the configured one is unreadable.
pub const DEFAULT_TEMPLATE: &str = r#"


{{#_bln_author_tags}}# Authors
{{/_bln_author_tags}}
{{#author_tags}}
 - [[{{str_name}} | tags.{{tag_name}}]]
{{/author_tags}}

{{#_bln_links}}# Links
{{/_bln_links}}
{{#links}}
 - [`{{elt}}`]({{elt}})
{{/links}}

{{#_bln_keywords}}# Keywords
{{/_bln_keywords}}
{{#keywords}}
 - #{{elt}}
{{/keywords}}

{{#_bln_files}}# Files
{{/_bln_files}}
{{#files}}
 - [`{{elt}}`]({{elt}})
{{/files}}

{{#abstract}}
# Abstract
{{&abstract}}
{{/abstract}}

{{#note}}
# Notes
{{&note}}
{{/note}}
"#;

static SECTION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(~?)\s*([#^/])\s*([^\s{}~]+)([^{}]*?)(~?)\}\}")
        .expect("section tag pattern is valid")
});

/// Rewrite Mustache inverted sections `{{^name}}..{{/name}}` into
/// `{{#unless name}}..{{/unless}}`. Handlebars `{{^}}` else tags are kept.
fn rewrite_inverted_sections(template: &str) -> String {
    let mut open: Vec<(String, bool)> = Vec::new();
    SECTION_TAG
        .replace_all(template, |caps: &Captures<'_>| {
            let (pre, sigil, name, rest, post) =
                (&caps[1], &caps[2], &caps[3], &caps[4], &caps[5]);
            match sigil {
                "^" if rest.trim().is_empty() => {
                    open.push((name.to_string(), true));
                    format!("{{{{{}#unless {}{}}}}}", pre, name, post)
                }
                "#" => {
                    open.push((name.to_string(), false));
                    caps[0].to_string()
                }
                "/" => {
                    let Some(pos) = open.iter().rposition(|(open_name, _)| open_name == name)
                    else {
                        return caps[0].to_string();
                    };
                    let inverted = open[pos].1;
                    open.truncate(pos);
                    if inverted {
                        format!("{{{{{}/unless{}}}}}", pre, post)
                    } else {
                        caps[0].to_string()
                    }
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Mustache section semantics for `{{#name}}` blocks that don't name a helper.
#[derive(Clone, Copy)]
struct MustacheSection;

impl HelperDef for MustacheSection {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let scoped = rc.evaluate(ctx, h.name())?;
        let path = scoped.context_path().cloned();
        let value = scoped.as_json().clone();

        if !value.is_truthy(false) {
            if let Some(inverse) = h.inverse() {
                inverse.render(r, ctx, rc, out)?;
            }
            return Ok(());
        }
        let Some(template) = h.template() else {
            return Ok(());
        };

        match value {
            Value::Array(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    rc.push_block(section_block(path.as_deref(), Some(index), item));
                    let rendered = template.render(r, ctx, rc, out);
                    rc.pop_block();
                    rendered?;
                }
                Ok(())
            }
            Value::Object(fields) => {
                rc.push_block(section_block(path.as_deref(), None, Value::Object(fields)));
                let rendered = template.render(r, ctx, rc, out);
                rc.pop_block();
                rendered
            }
            _ => template.render(r, ctx, rc, out),
        }
    }
}

/// Scope for one pass over a section body. Values reached through the
/// context keep their path so lookups can fall back to enclosing scopes.
fn section_block<'rc>(
    path: Option<&[String]>,
    index: Option<usize>,
    value: Value,
) -> BlockContext<'rc> {
    let mut block = BlockContext::new();
    match path {
        Some(path) => {
            let base = block.base_path_mut();
            base.extend(path.iter().cloned());
            base.extend(index.map(|i| i.to_string()));
        }
        None => block.set_base_value(value),
    }
    block
}

/// Read the template at `path`, falling back to [`DEFAULT_TEMPLATE`] with a
/// warning when it is missing or unreadable.
pub fn load_template(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_TEMPLATE.to_string();
    };
    if !path.is_file() {
        tracing::warn!(
            "template file {} not found, using the default template",
            path.display()
        );
        return DEFAULT_TEMPLATE.to_string();
    }
    match std::fs::read_to_string(path) {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!(
                "couldn't read template file {}: {}, using the default template",
                path.display(),
                e
            );
            DEFAULT_TEMPLATE.to_string()
        }
    }
}

/// Build the template context for `data`, which must serialize to an object.
pub fn template_context<T: Serialize>(data: &T) -> Result<Value> {
    let Value::Object(fields) = serde_json::to_value(data)? else {
        return Err(Error::Template(
            "template context must be an object".to_string(),
        ));
    };

    let mut context = Map::with_capacity(fields.len() * 2);
    for (key, value) in fields {
        let present = match &value {
            Value::Array(items) => Some(!items.is_empty()),
            Value::Object(map) => Some(!map.is_empty()),
            _ => None,
        };

        let value = match value {
            Value::Array(items) if items.iter().all(is_scalar) => Value::Array(
                items
                    .into_iter()
                    .map(|item| {
                        let mut record = Map::new();
                        record.insert("elt".to_string(), item);
                        Value::Object(record)
                    })
                    .collect(),
            ),
            other => other,
        };

        if let Some(present) = present {
            context.insert(format!("{}{}", PRESENCE_PREFIX, key), Value::Bool(present));
        }
        context.insert(key, value);
    }
    Ok(Value::Object(context))
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// A compiled note template.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Compile `template`. Output is not HTML-escaped.
    pub fn new(template: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_recursive_lookup(true);
        registry.register_helper("blockHelperMissing", Box::new(MustacheSection));
        registry
            .register_template_string(TEMPLATE_NAME, rewrite_inverted_sections(template))
            .map_err(|e| Error::Template(e.to_string()))?;
        Ok(Self { registry })
    }

    /// Compile the template at `path`, or the default one.
    pub fn from_path(path: Option<&Path>) -> Result<Self> {
        Self::new(&load_template(path))
    }

    /// Render an already built context.
    pub fn render(&self, context: &Value) -> Result<String> {
        self.registry
            .render(TEMPLATE_NAME, context)
            .map_err(|e| Error::Template(e.to_string()))
    }

    /// Build the context for `data` and render it.
    pub fn render_data<T: Serialize>(&self, data: &T) -> Result<String> {
        self.render(&template_context(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_context_wraps_scalar_lists() {
        let ctx = template_context(&json!({
            "links": ["a", "b"],
            "files": [],
            "title": "T",
        }))
        .unwrap();
        assert_eq!(ctx["links"], json!([{"elt": "a"}, {"elt": "b"}]));
        assert_eq!(ctx["_bln_links"], json!(true));
        assert_eq!(ctx["_bln_files"], json!(false));
        assert_eq!(ctx["title"], json!("T"));
        assert!(ctx.get("_bln_title").is_none());
    }

    #[test]
    fn test_context_keeps_record_lists() {
        let ctx = template_context(&json!({
            "author_tags": [{"tag_name": "author.J-Doe", "str_name": "Jane Doe"}],
            "meta": {"k": "v"},
        }))
        .unwrap();
        assert_eq!(ctx["author_tags"][0]["tag_name"], json!("author.J-Doe"));
        assert_eq!(ctx["_bln_author_tags"], json!(true));
        assert_eq!(ctx["_bln_meta"], json!(true));
    }

    #[test]
    fn test_context_rejects_non_objects() {
        assert!(matches!(
            template_context(&json!(["x"])),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_default_template_sections() {
        let renderer = TemplateRenderer::new(DEFAULT_TEMPLATE).unwrap();
        let out = renderer
            .render_data(&json!({
                "author_tags": [{"tag_name": "author.J-Doe", "str_name": "Jane Doe"}],
                "links": [],
                "keywords": ["nlp"],
                "files": [],
                "abstract": "We <b>study</b> things.",
                "note": null,
            }))
            .unwrap();
        assert!(out.contains("# Authors\n"));
        assert!(out.contains(" - [[Jane Doe | tags.author.J-Doe]]"));
        assert!(out.contains(" - #nlp"));
        assert!(!out.contains("# Links"));
        assert!(!out.contains("# Files"));
        assert!(out.contains("We <b>study</b> things."));
        assert!(!out.contains("# Notes"));
    }

    #[test]
    fn test_mustache_sections() {
        let renderer = TemplateRenderer::new(
            "{{#_bln_links}}# Links\n{{/_bln_links}}{{#links}} - {{elt}}\n{{/links}}{{#abstract}}{{&abstract}}{{/abstract}}",
        )
        .unwrap();
        let out = renderer
            .render_data(&json!({"links": ["a", "b"], "abstract": "X & <y>"}))
            .unwrap();
        assert_eq!(out, "# Links\n - a\n - b\nX & <y>");

        let out = renderer
            .render_data(&json!({"links": [], "abstract": ""}))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_sections_see_enclosing_scope() {
        let renderer =
            TemplateRenderer::new("{{#keywords}}{{bib_key}}:{{elt}};{{/keywords}}").unwrap();
        let out = renderer
            .render_data(&json!({"bib_key": "k", "keywords": ["x", "y"]}))
            .unwrap();
        assert_eq!(out, "k:x;k:y;");
    }

    #[test]
    fn test_object_and_bool_sections() {
        let renderer =
            TemplateRenderer::new("{{#meta}}{{year}}{{/meta}}|{{#flag}}on{{/flag}}").unwrap();
        assert_eq!(
            renderer
                .render(&json!({"meta": {"year": 2020}, "flag": true}))
                .unwrap(),
            "2020|on"
        );
        assert_eq!(
            renderer
                .render(&json!({"meta": {}, "flag": false}))
                .unwrap(),
            "|"
        );
    }

    #[test]
    fn test_inverted_sections() {
        let renderer = TemplateRenderer::new(
            "{{#note}}{{&note}}{{/note}}{{^note}}no notes{{/note}}|{{^links}}none{{/links}}",
        )
        .unwrap();
        assert_eq!(
            renderer.render_data(&json!({"note": null, "links": []})).unwrap(),
            "no notes|none"
        );
        assert_eq!(
            renderer
                .render_data(&json!({"note": "N", "links": ["a"]}))
                .unwrap(),
            "N|"
        );
    }

    #[test]
    fn test_handlebars_helpers_still_work() {
        let renderer = TemplateRenderer::new(
            "{{#if _bln_keywords}}K:{{/if}}{{#each keywords}}{{elt}}{{^}}-{{/each}}",
        )
        .unwrap();
        assert_eq!(
            renderer.render_data(&json!({"keywords": ["a", "b"]})).unwrap(),
            "K:ab"
        );
    }

    #[test]
    fn test_rewrite_inverted_sections() {
        assert_eq!(
            rewrite_inverted_sections("{{^a}}x{{#b}}y{{/b}}{{/a}}"),
            "{{#unless a}}x{{#b}}y{{/b}}{{/unless}}"
        );
        assert_eq!(
            rewrite_inverted_sections("{{#if a}}x{{^}}y{{/if}}"),
            "{{#if a}}x{{^}}y{{/if}}"
        );
    }

    #[test]
    fn test_renders_full_mustache_note_template() {
        let template = "\n\n{{#_bln_author_tags}}# Authors\n{{/_bln_author_tags}}\n{{#author_tags}}\n - [[{{str_name}} | tags.{{tag_name}}]]\n{{/author_tags}}\n\n{{#_bln_links}}# Links\n{{/_bln_links}}\n{{#links}}\n - [`{{elt}}`]({{elt}})\n{{/links}}\n\n{{#abstract}}\n# Abstract  \n{{&abstract}}\n{{/abstract}}\n\n{{#note}}\n# Notes\n{{&note}}\n{{/note}}\n";
        let renderer = TemplateRenderer::new(template).unwrap();
        let out = renderer
            .render_data(&json!({
                "author_tags": [
                    {"tag_name": "author.J-Doe", "str_name": "Jane Doe"},
                    {"tag_name": "author.J-Smith", "str_name": "John Smith"},
                ],
                "links": ["https://a.example"],
                "abstract": "An abstract.",
                "note": null,
            }))
            .unwrap();
        assert!(out.contains(
            "# Authors\n - [[Jane Doe | tags.author.J-Doe]]\n - [[John Smith | tags.author.J-Smith]]\n"
        ));
        assert!(out.contains("# Links\n - [`https://a.example`](https://a.example)\n"));
        assert!(out.contains("# Abstract  \nAn abstract.\n"));
        assert!(!out.contains("# Notes"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_bad_template_is_error() {
        assert!(matches!(
            TemplateRenderer::new("{{#if x}}unclosed"),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_load_template_falls_back() {
        assert_eq!(load_template(None), DEFAULT_TEMPLATE);
        assert_eq!(
            load_template(Some(Path::new("/nonexistent/template.md"))),
            DEFAULT_TEMPLATE
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.md");
        std::fs::write(&path, "{{title}}").unwrap();
        assert_eq!(load_template(Some(&path)), "{{title}}");
    }
}
