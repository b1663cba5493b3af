//! DOT emitters for the three rendering modes.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as FmtWrite;

use tracing::debug;

use super::{IconLookup, RenderOptions, TeamRenderOptions};
use crate::error::RenderError;
use crate::model::{Application, DependencyRef, Project, Status};

/// Escape text for use inside a double-quoted DOT string.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

fn quoted(raw: &str) -> String {
    format!("\"{}\"", escape(raw))
}

/// `[key="value", ...]`, or nothing when empty.
#[derive(Default)]
struct Attrs(Vec<(&'static str, String)>);

impl Attrs {
    fn set(&mut self, key: &'static str, value: impl Into<String>) -> &mut Self {
        self.0.push((key, value.into()));
        self
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{k}={}", quoted(v)))
            .collect();
        format!(" [{}]", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

struct Edge<'a> {
    from: &'a str,
    to: &'a str,
    dep: &'a DependencyRef,
    to_ghost: bool,
    to_planned: bool,
}

/// Nodes and edges chosen for one render, in declaration order.
struct Selection<'a> {
    nodes: Vec<&'a Application>,
    ghosts: Vec<&'a str>,
    edges: Vec<Edge<'a>>,
}

impl<'a> Selection<'a> {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ghosts: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Record `app → dep.target` unless the target is hidden.
    fn link(
        &mut self,
        project: &'a Project,
        app: &'a Application,
        dep: &'a DependencyRef,
        hide_planned: bool,
    ) {
        let target = project.application(&dep.target);
        if target.is_some_and(|t| hide_planned && t.status.is_planned()) {
            return;
        }
        if target.is_none() && !self.ghosts.contains(&dep.target.as_str()) {
            self.ghosts.push(&dep.target);
        }
        self.edges.push(Edge {
            from: &app.id,
            to: &dep.target,
            dep,
            to_ghost: target.is_none(),
            to_planned: target.is_some_and(|t| t.status.is_planned()),
        });
    }
}

fn whole_system(project: &Project, hide_planned: bool) -> Selection<'_> {
    let mut selection = Selection::new();
    for app in project.applications() {
        if hide_planned && app.status.is_planned() {
            continue;
        }
        selection.nodes.push(app);
        for dep in &app.dependencies {
            selection.link(project, app, dep, hide_planned);
        }
    }
    selection
}

fn neighborhood<'a>(
    project: &'a Project,
    id: &str,
    hide_planned: bool,
) -> Result<Selection<'a>, RenderError> {
    let center = project
        .application(id)
        .ok_or_else(|| RenderError::UnknownApplication { id: id.to_string() })?;
    if hide_planned && center.status.is_planned() {
        return Err(RenderError::InvalidOption {
            reason: format!("application '{id}' is planned and planned applications are hidden"),
        });
    }

    let mut selection = Selection::new();
    let mut members: HashSet<&str> = HashSet::from([center.id.as_str()]);

    for dep in &center.dependencies {
        selection.link(project, center, dep, hide_planned);
    }
    for edge in &selection.edges {
        members.insert(edge.to);
    }

    for app in project.applications() {
        if app.id == center.id || (hide_planned && app.status.is_planned()) {
            continue;
        }
        for dep in app.dependencies.iter().filter(|d| d.target == center.id) {
            members.insert(&app.id);
            selection.link(project, app, dep, hide_planned);
        }
    }

    selection.nodes = project
        .applications()
        .iter()
        .filter(|app| members.contains(app.id.as_str()))
        .collect();
    Ok(selection)
}

// ---------------------------------------------------------------------------
// Application graph
// ---------------------------------------------------------------------------

/// Render the whole system, or one application's neighborhood when
/// `options.application` is set.
///
/// # Errors
///
/// [`RenderError::UnknownApplication`] when the requested application is not
/// in the project, [`RenderError::InvalidOption`] when it is planned and
/// planned applications are hidden.
pub fn render_graph(
    project: &Project,
    options: &RenderOptions,
    icons: &dyn IconLookup,
) -> Result<String, RenderError> {
    let selection = match options.application.as_deref() {
        Some(id) => neighborhood(project, id, options.hide_planned)?,
        None => whole_system(project, options.hide_planned),
    };
    debug!(
        nodes = selection.nodes.len(),
        ghosts = selection.ghosts.len(),
        edges = selection.edges.len(),
        "rendering application graph"
    );

    let mut out = String::with_capacity(4096);
    let _ = writeln!(out, "digraph {} {{", quoted(&project.name));
    let _ = writeln!(out, "  rankdir={};", options.rankdir);
    let _ = writeln!(out, "  node [shape=box, fontname=\"Helvetica\"];");
    let _ = writeln!(out, "  edge [fontname=\"Helvetica\", fontsize=10];");
    let _ = writeln!(out);

    if options.cluster_groups {
        write_clustered(&mut out, project, &selection.nodes, icons);
    } else {
        for app in &selection.nodes {
            write_node(&mut out, 1, app, icons);
        }
    }

    for ghost in &selection.ghosts {
        let mut attrs = Attrs::default();
        attrs
            .set("label", *ghost)
            .set("style", "dashed")
            .set("color", "red")
            .set("fontcolor", "red");
        let _ = writeln!(out, "  {}{};", quoted(ghost), attrs.render());
    }

    if !selection.edges.is_empty() {
        let _ = writeln!(out);
    }
    for edge in &selection.edges {
        let mut attrs = Attrs::default();
        if let Some(label) = edge_label(edge.dep) {
            attrs.set("label", label);
        }
        if edge.to_ghost {
            attrs.set("style", "dashed").set("color", "red");
        } else if edge.to_planned {
            attrs.set("style", "dashed");
        }
        let _ = writeln!(
            out,
            "  {} -> {}{};",
            quoted(edge.from),
            quoted(edge.to),
            attrs.render()
        );
    }

    let _ = writeln!(out, "}}");
    Ok(out)
}

fn edge_label(dep: &DependencyRef) -> Option<String> {
    match (dep.relation.as_deref(), dep.interface.as_deref()) {
        (Some(relation), Some(interface)) => Some(format!("{relation} ({interface})")),
        (Some(label), None) | (None, Some(label)) => Some(label.to_string()),
        (None, None) => None,
    }
}

fn write_node(out: &mut String, depth: usize, app: &Application, icons: &dyn IconLookup) {
    let indent = "  ".repeat(depth);
    let mut style = vec!["rounded"];
    let mut attrs = Attrs::default();
    attrs.set("label", app.name.as_str());

    match app.status {
        Status::Planned => style.push("dashed"),
        Status::Deprecated => {
            attrs.set("fontcolor", "gray50");
            if app.display.border_color.is_none() {
                attrs.set("color", "gray50");
            }
        }
        Status::Active => {}
    }
    if let Some(color) = &app.display.color {
        style.push("filled");
        attrs.set("fillcolor", color.as_str());
    }
    if let Some(border) = &app.display.border_color {
        attrs.set("color", border.as_str());
    }
    attrs.set("style", style.join(","));

    if let Some(icon) = icons.icon_for(app) {
        attrs
            .set("image", icon.display().to_string())
            .set("labelloc", "b");
    }
    if let Some(summary) = app.summary.as_deref().or(app.description.as_deref()) {
        attrs.set("tooltip", summary);
    }

    let _ = writeln!(out, "{indent}{}{};", quoted(&app.id), attrs.render());
}

fn write_clustered(
    out: &mut String,
    project: &Project,
    nodes: &[&Application],
    icons: &dyn IconLookup,
) {
    let groups = project.groups();
    let mut by_group: HashMap<usize, Vec<&Application>> = HashMap::new();
    let mut keep: HashSet<usize> = HashSet::new();

    for app in nodes {
        match app.group.as_deref().and_then(|p| groups.index_of(p)) {
            Some(idx) => {
                by_group.entry(idx).or_default().push(app);
                keep.insert(idx);
                if let Some(chain) = groups.ancestors(idx) {
                    keep.extend(chain);
                }
            }
            None => write_node(out, 1, app, icons),
        }
    }

    for idx in groups.children(None) {
        if keep.contains(&idx) {
            write_cluster(out, project, idx, 1, &by_group, &keep, icons);
        }
    }
}

fn write_cluster(
    out: &mut String,
    project: &Project,
    idx: usize,
    depth: usize,
    by_group: &HashMap<usize, Vec<&Application>>,
    keep: &HashSet<usize>,
    icons: &dyn IconLookup,
) {
    let Some(group) = project.groups().get(idx) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let label = group.title.as_deref().unwrap_or(&group.name);

    let _ = writeln!(out, "{indent}subgraph cluster_{idx} {{");
    let _ = writeln!(out, "{indent}  label={};", quoted(label));
    let _ = writeln!(out, "{indent}  style=\"rounded\";");
    for app in by_group.get(&idx).into_iter().flatten() {
        write_node(out, depth + 1, app, icons);
    }
    for child in project.groups().children(Some(idx)) {
        if keep.contains(&child) {
            write_cluster(out, project, child, depth + 1, by_group, keep, icons);
        }
    }
    let _ = writeln!(out, "{indent}}}");
}

// ---------------------------------------------------------------------------
// Team graph
// ---------------------------------------------------------------------------

/// Render team-to-team relations derived from cross-team dependencies.
///
/// Applications without a team are ignored. Declared teams are always
/// drawn; implicit teams only while they own a visible application.
#[must_use]
pub fn render_team_graph(project: &Project, options: &TeamRenderOptions) -> String {
    let visible = |app: &Application| !(options.hide_planned && app.status.is_planned());

    let owners: HashSet<&str> = project
        .applications()
        .iter()
        .filter(|app| visible(app))
        .filter_map(|app| app.team.as_deref())
        .collect();

    // (from team, to team) in first-seen order, with one label per dependency.
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut relations: HashMap<(&str, &str), Vec<String>> = HashMap::new();

    for app in project.applications().iter().filter(|a| visible(a)) {
        let Some(from_team) = app.team.as_deref() else {
            continue;
        };
        for dep in &app.dependencies {
            let Some(target) = project.application(&dep.target).filter(|t| visible(t)) else {
                continue;
            };
            let Some(to_team) = target.team.as_deref() else {
                continue;
            };
            if to_team == from_team {
                continue;
            }
            let labels = relations.entry((from_team, to_team)).or_insert_with(|| {
                order.push((from_team, to_team));
                Vec::new()
            });
            labels.push(format!("{} → {}", app.name, target.name));
        }
    }
    debug!(
        teams = owners.len(),
        relations = order.len(),
        summarize = options.summarize_relations,
        "rendering team graph"
    );

    let mut out = String::with_capacity(1024);
    let _ = writeln!(out, "digraph {} {{", quoted(&format!("{} teams", project.name)));
    let _ = writeln!(out, "  rankdir={};", options.rankdir);
    let _ = writeln!(
        out,
        "  node [shape=box, style=\"rounded,filled\", fillcolor=\"lightyellow\", fontname=\"Helvetica\"];"
    );
    let _ = writeln!(out, "  edge [fontname=\"Helvetica\", fontsize=10];");
    let _ = writeln!(out);

    for team in project.teams() {
        if team.implicit && !owners.contains(team.name.as_str()) {
            continue;
        }
        let mut attrs = Attrs::default();
        attrs.set("label", team.name.as_str());
        if let Some(description) = &team.description {
            attrs.set("tooltip", description.as_str());
        }
        let _ = writeln!(out, "  {}{};", quoted(&team.name), attrs.render());
    }

    if !order.is_empty() {
        let _ = writeln!(out);
    }
    for pair in &order {
        let labels = relations.get(pair).map_or(&[][..], Vec::as_slice);
        let (from, to) = (quoted(pair.0), quoted(pair.1));
        if options.summarize_relations {
            let label = match labels.len() {
                1 => "1 dependency".to_string(),
                n => format!("{n} dependencies"),
            };
            let mut attrs = Attrs::default();
            attrs.set("label", label).set("penwidth", pen_width(labels.len()));
            let _ = writeln!(out, "  {from} -> {to}{};", attrs.render());
        } else {
            for label in labels {
                let mut attrs = Attrs::default();
                attrs.set("label", label.as_str());
                let _ = writeln!(out, "  {from} -> {to}{};", attrs.render());
            }
        }
    }

    let _ = writeln!(out, "}}");
    out
}

/// Edge weight grows with the number of summarized dependencies, capped.
fn pen_width(count: usize) -> String {
    count.clamp(1, 5).to_string()
}
