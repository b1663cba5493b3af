//! HTML documentation of a project.
//!
//! The project is first written out as Markdown (overview per group, team
//! table, cycle report), converted with `pulldown-cmark`, and substituted
//! into a template at `{{title}}` and `{{content}}`.

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use pulldown_cmark::{Options, Parser, html};
use tracing::debug;

use crate::error::{ArchError, Result};
use crate::graph::{Cycle, find_cycles};
use crate::grouping::{GroupNode, GroupingKey, applications_by_group, grouped_dependencies};
use crate::model::{Application, Project};
use crate::render::IconLookup;

/// Template used when no `--template-path` is given.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/documentation.html");

/// Inputs for [`render_documentation`] beyond the project itself.
pub struct DocumentationOptions<'a> {
    /// Replaces [`DEFAULT_TEMPLATE`].
    pub template_path: Option<&'a Path>,
    pub icons: &'a dyn IconLookup,
    pub grouping_key: GroupingKey,
}

/// Render the full HTML page.
///
/// # Errors
///
/// [`ArchError::Template`] when a custom template cannot be read.
pub fn render_documentation(project: &Project, options: &DocumentationOptions<'_>) -> Result<String> {
    let template = match options.template_path {
        Some(path) => fs::read_to_string(path).map_err(|source| ArchError::Template {
            path: path.to_path_buf(),
            source,
        })?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let cycles = find_cycles(project);
    let markdown = project_markdown(project, &cycles, options.grouping_key, options.icons);
    let content = markdown_to_html(&markdown);
    debug!(
        markdown_bytes = markdown.len(),
        html_bytes = content.len(),
        "rendered documentation"
    );

    Ok(fill_template(&template, &html_escape(&project.name), &content))
}

/// Substitute `{{title}}` and `{{content}}` in one pass. Substituted text is
/// never scanned again.
fn fill_template(template: &str, title: &str, content: &str) -> String {
    let mut out = String::with_capacity(template.len() + title.len() + content.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{{title}}") {
            out.push_str(title);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{{content}}") {
            out.push_str(content);
            rest = after;
        } else {
            out.push_str("{{");
            rest = &tail[2..];
        }
    }
    out.push_str(rest);
    out
}

/// Convert Markdown (with tables) to an HTML fragment.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Markdown overview of `project`.
#[must_use]
pub fn project_markdown(
    project: &Project,
    cycles: &[Cycle],
    key: GroupingKey,
    icons: &dyn IconLookup,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", project.name);

    let _ = writeln!(out, "## Applications\n");
    let tree = applications_by_group(project);
    if !tree.applications.is_empty() {
        let _ = writeln!(out, "### Ungrouped\n");
        for id in &tree.applications {
            write_application(&mut out, project, id, key, icons);
        }
    }
    for group in &tree.groups {
        write_group(&mut out, project, group, key, icons);
    }

    let _ = writeln!(out, "## Teams\n");
    if project.teams().is_empty() {
        let _ = writeln!(out, "No teams declared.\n");
    } else {
        let _ = writeln!(out, "| Team | Applications | Description |");
        let _ = writeln!(out, "|---|---|---|");
        for team in project.teams() {
            let owned: Vec<&str> = project
                .applications()
                .iter()
                .filter(|a| a.team.as_deref() == Some(team.name.as_str()))
                .map(|a| a.name.as_str())
                .collect();
            let _ = writeln!(
                out,
                "| {} | {} | {} |",
                cell(&team.name),
                cell(&owned.join(", ")),
                cell(team.description.as_deref().unwrap_or_default())
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Dependency cycles\n");
    if cycles.is_empty() {
        let _ = writeln!(out, "No dependency cycles.");
    } else {
        for cycle in cycles {
            let _ = writeln!(out, "- {cycle}");
        }
    }
    out
}

fn write_group(
    out: &mut String,
    project: &Project,
    node: &GroupNode,
    key: GroupingKey,
    icons: &dyn IconLookup,
) {
    if node.is_empty() {
        return;
    }
    match &node.title {
        Some(title) => {
            let _ = writeln!(out, "### {title} (`{}`)\n", node.path);
        }
        None => {
            let _ = writeln!(out, "### `{}`\n", node.path);
        }
    }
    for id in &node.applications {
        write_application(out, project, id, key, icons);
    }
    for child in &node.groups {
        write_group(out, project, child, key, icons);
    }
}

fn write_application(
    out: &mut String,
    project: &Project,
    id: &str,
    key: GroupingKey,
    icons: &dyn IconLookup,
) {
    let Some(app) = project.application(id) else {
        return;
    };

    let icon = icons
        .icon_for(app)
        .map(|path| format!("<img src=\"{}\" alt=\"\" width=\"32\"> ", html_escape(&path.display().to_string())))
        .unwrap_or_default();
    let _ = writeln!(out, "#### {icon}{} (`{}`)\n", app.name, app.id);

    let _ = writeln!(out, "- **Status:** {}", app.status);
    write_field(out, "Team", app.team.as_deref());
    write_field(out, "Technology", app.technology.as_deref());
    write_field(out, "Category", app.category.as_deref());
    for (name, value) in &app.properties {
        let _ = writeln!(out, "- **{name}:** {value}");
    }
    let _ = writeln!(out);

    for text in [app.summary.as_deref(), app.description.as_deref()]
        .into_iter()
        .flatten()
    {
        let _ = writeln!(out, "{}\n", text.trim());
    }

    write_dependencies(out, project, app, key);
}

fn write_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(out, "- **{label}:** {value}");
    }
}

fn write_dependencies(out: &mut String, project: &Project, app: &Application, key: GroupingKey) {
    let buckets = grouped_dependencies(project, app, key);
    if buckets.is_empty() {
        return;
    }
    let _ = writeln!(out, "**Dependencies**\n");
    for bucket in buckets {
        let heading = match (bucket.dangling, bucket.key.as_str()) {
            (true, _) => "undeclared".to_string(),
            (false, "") => match key {
                GroupingKey::Group => "ungrouped".to_string(),
                GroupingKey::Relation => "unlabeled".to_string(),
            },
            (false, other) => other.to_string(),
        };
        let targets: Vec<String> = bucket
            .dependencies
            .iter()
            .map(|d| match &d.relation {
                Some(relation) if key == GroupingKey::Group => {
                    format!("{} (`{}`, {relation})", d.target_name, d.target)
                }
                _ => format!("{} (`{}`)", d.target_name, d.target),
            })
            .collect();
        let _ = writeln!(out, "- _{heading}_: {}", targets.join(", "));
    }
    let _ = writeln!(out);
}

/// Escape a value for a Markdown table cell.
fn cell(raw: &str) -> String {
    raw.replace('|', "\\|").replace('\n', " ")
}

fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
