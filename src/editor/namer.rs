//! Human-readable names for setup items. An explicit `name` in the setup
//! always wins; otherwise the name is derived from what the tile renders.

use crate::editor::locator;
use crate::list::{ListId, TileList, Workspace};
use crate::model::dom::{ElementId, ElementTree};
use crate::model::setup::SetupKey;

/// Labels longer than this are cut back to the nearest word boundary.
pub const LABEL_LIMIT: usize = 18;

const CONTROL_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// Full display name for a setup item, untruncated.
pub fn display_name<L: TileList>(ws: &Workspace<L>, list: ListId, key: SetupKey) -> String {
    let tree = ws.list(list).setup();
    if let Some(name) = &tree.data(key).name {
        return name.clone();
    }
    if tree.is_group(key) {
        return group_name(ws, list, key);
    }
    leaf_name(ws, list, key)
}

/// Shortened form of a display name, fit for breadcrumbs and item rows.
pub fn setup_label(name: &str) -> String {
    let name = name.trim();
    let chars: Vec<char> = name.chars().collect();
    let cut: String = if chars.len() > LABEL_LIMIT {
        let head: String = chars[..LABEL_LIMIT].iter().collect();
        match head.rfind(' ') {
            Some(at) => head[..at].to_owned(),
            None => head,
        }
    } else {
        name.to_owned()
    };
    let cut = cut.trim_end().trim_end_matches('&').trim_end();
    if cut.is_empty() {
        "Empty tile".to_owned()
    } else {
        cut.to_owned()
    }
}

/// Name shown for a layout root itself.
pub fn list_label<L: TileList>(ws: &Workspace<L>, list: ListId) -> String {
    let el = ws.list(list).element();
    ws.dom
        .attr(el, "id")
        .or_else(|| ws.dom.attr(el, "name"))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| ws.dom.tag(el).to_owned())
}

fn group_name<L: TileList>(ws: &Workspace<L>, list: ListId, key: SetupKey) -> String {
    let tree = ws.list(list).setup();
    let children = tree.children_by_priority(key, true);
    if children.is_empty() {
        return "Empty group".to_owned();
    }
    let joined = children
        .iter()
        .map(|&child| display_name(ws, list, child))
        .collect::<Vec<_>>()
        .join(" & ");
    // Only a parentless node (the synthetic root shown during multi-root
    // display) reads as a partial slice rather than a contained group.
    let prefix = if tree.parent(key).is_some() { "Group: " } else { "Partial: " };
    format!("{prefix}{joined}")
}

fn leaf_name<L: TileList>(ws: &Workspace<L>, list: ListId, key: SetupKey) -> String {
    let id = ws.list(list).setup().id(key).clone();

    // A leaf hosting another layout root is named after that root's content.
    if let Some(nested) = locator::nested_list(&ws.dom, &ws.lists, &id) {
        return nested_root_name(ws, nested);
    }

    let Some(el) = ws.list(list).tile(&id) else {
        return "Empty element".to_owned();
    };
    let dom = &ws.dom;
    if let Some(text) = label_text(dom, el) {
        return text;
    }
    if let Some(text) = control_name(dom, el) {
        return text;
    }
    if let Some(text) = image_name(dom, el) {
        return text;
    }
    let text = dom.text_content(el);
    if !text.is_empty() {
        return text;
    }
    "Empty element".to_owned()
}

fn nested_root_name<L: TileList>(ws: &Workspace<L>, list: ListId) -> String {
    let tree = ws.list(list).setup();
    let root = tree.root();
    if let Some(name) = &tree.data(root).name {
        return name.clone();
    }
    let children = tree.children_by_priority(root, true);
    if children.is_empty() {
        return "Empty group".to_owned();
    }
    children
        .iter()
        .map(|&child| display_name(ws, list, child))
        .collect::<Vec<_>>()
        .join(" & ")
}

fn find_first(
    dom: &ElementTree,
    el: ElementId,
    pred: impl Fn(&ElementTree, ElementId) -> bool,
) -> Option<ElementId> {
    if pred(dom, el) {
        return Some(el);
    }
    dom.descendants(el).find(|&d| pred(dom, d))
}

fn nonempty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_owned()) }
}

fn label_text(dom: &ElementTree, el: ElementId) -> Option<String> {
    let label = find_first(dom, el, |d, e| {
        let tag = d.tag(e);
        tag == "label" || tag == "legend"
    })?;
    nonempty(&dom.text_content(label))
}

fn control_name(dom: &ElementTree, el: ElementId) -> Option<String> {
    let control = find_first(dom, el, |d, e| CONTROL_TAGS.contains(&d.tag(e)))?;
    if let Some(text) = dom.attr(control, "placeholder").and_then(nonempty) {
        return Some(text);
    }
    if let Some(text) = dom.attr(control, "title").and_then(nonempty) {
        return Some(text);
    }
    if dom.tag(control) == "select"
        && let Some(option) = find_first(dom, control, |d, e| d.tag(e) == "option")
        && let Some(text) = nonempty(&dom.text_content(option))
    {
        return Some(text);
    }
    dom.attr(control, "value").and_then(nonempty)
}

fn image_name(dom: &ElementTree, el: ElementId) -> Option<String> {
    let img = find_first(dom, el, |d, e| d.tag(e) == "img")?;
    let by_attrs = dom
        .attr(img, "alt")
        .and_then(nonempty)
        .or_else(|| dom.attr(img, "title").and_then(nonempty))
        .or_else(|| {
            dom.attr(img, "src")
                .filter(|src| !src.starts_with("data:"))
                .and_then(nonempty)
        });
    Some(by_attrs.unwrap_or_else(|| "Empty image".to_owned()))
}
