use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;

use crate::common::collections::HashSet;

slotmap::new_key_type! {
    /// A setup node somewhere in the tree. Keys stay valid across renders;
    /// only structural mutations (ungroup, setup replacement) invalidate them.
    pub struct SetupKey;
}

/// Identifier of a tile within one layout root. Ids survive a hard refresh,
/// rendered element identities do not, so all persistent state is keyed by id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileId {
    Number(i64),
    Text(String),
}

impl TileId {
    /// Parses a marker attribute value. Numeric strings collapse to the
    /// numeric form so `"0"` matches the id `0` from the setup JSON.
    pub fn from_attr(value: &str) -> TileId {
        match value.parse::<i64>() {
            Ok(n) => TileId::Number(n),
            Err(_) => TileId::Text(value.to_owned()),
        }
    }

    pub(crate) fn root() -> TileId { TileId::Text("root".to_owned()) }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileId::Number(n) => write!(f, "{n}"),
            TileId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for TileId {
    fn from(n: i64) -> Self { TileId::Number(n) }
}

impl From<&str> for TileId {
    fn from(s: &str) -> Self { TileId::Text(s.to_owned()) }
}

/// A width or height: absolute pixels or a percentage string like `"50%"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Pixels(f64),
    Text(String),
}

impl SizeValue {
    pub fn percent(value: u32) -> SizeValue { SizeValue::Text(format!("{value}%")) }
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Pixels(p) if p.fract() == 0.0 => write!(f, "{}", *p as i64),
            SizeValue::Pixels(p) => write!(f, "{p}"),
            SizeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowDirection {
    #[default]
    Horizontal,
    Vertical,
}

/// Per-node layout fields, shared by leaves, groups, and the root.
/// Field names follow the wire shape consumed by the sync collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetupData {
    pub priority: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<SizeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<SizeValue>,
    pub width_flexible: bool,
    pub height_dynamic: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gutter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<FlowDirection>,
    pub tight_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversize: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Nested wire shape of a setup tree, the only format the persistence
/// collaborator sees. `items` present marks a group; absent marks a leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetupValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TileId>,
    #[serde(flatten)]
    pub data: SetupData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SetupValues>>,
}

impl SetupValues {
    pub fn group(id: impl Into<TileId>, data: SetupData, items: Vec<SetupValues>) -> Self {
        SetupValues {
            id: Some(id.into()),
            data,
            items: Some(items),
        }
    }

    pub fn leaf(id: impl Into<TileId>, data: SetupData) -> Self {
        SetupValues {
            id: Some(id.into()),
            data,
            items: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("setup item is missing an id")]
    MissingId,
    #[error("duplicate tile id in setup: {0}")]
    DuplicateId(TileId),
}

struct SetupNode {
    id: TileId,
    data: SetupData,
    parent: Option<SetupKey>,
    /// `Some` for groups (possibly empty), `None` for leaves.
    children: Option<Vec<SetupKey>>,
}

/// Arena-backed setup tree with parent back-references. The parent link is a
/// key, never a second ownership path; walking up is always safe.
pub struct SetupTree {
    nodes: SlotMap<SetupKey, SetupNode>,
    root: SetupKey,
}

impl SetupTree {
    pub fn new(root_data: SetupData) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SetupNode {
            id: TileId::root(),
            data: root_data,
            parent: None,
            children: Some(Vec::new()),
        });
        SetupTree { nodes, root }
    }

    pub fn from_values(values: &SetupValues) -> Result<Self, SetupError> {
        let mut tree = SetupTree::new(values.data.clone());
        let mut seen = HashSet::default();
        for item in values.items.as_deref().unwrap_or_default() {
            tree.insert_values(item, tree.root, &mut seen)?;
        }
        Ok(tree)
    }

    fn insert_values(
        &mut self,
        values: &SetupValues,
        parent: SetupKey,
        seen: &mut HashSet<TileId>,
    ) -> Result<SetupKey, SetupError> {
        let id = values.id.clone().ok_or(SetupError::MissingId)?;
        if !seen.insert(id.clone()) {
            return Err(SetupError::DuplicateId(id));
        }
        let key = self.nodes.insert(SetupNode {
            id,
            data: values.data.clone(),
            parent: Some(parent),
            children: values.items.as_ref().map(|_| Vec::new()),
        });
        self.nodes[parent]
            .children
            .as_mut()
            .expect("parent node is a leaf")
            .push(key);
        for item in values.items.as_deref().unwrap_or_default() {
            self.insert_values(item, key, seen)?;
        }
        Ok(key)
    }

    pub fn to_values(&self) -> SetupValues { self.values_of(self.root) }

    fn values_of(&self, key: SetupKey) -> SetupValues {
        let node = &self.nodes[key];
        SetupValues {
            id: (key != self.root).then(|| node.id.clone()),
            data: node.data.clone(),
            items: node
                .children
                .as_ref()
                .map(|children| children.iter().map(|&c| self.values_of(c)).collect()),
        }
    }

    pub fn root(&self) -> SetupKey { self.root }

    pub fn contains(&self, key: SetupKey) -> bool { self.nodes.contains_key(key) }

    pub fn id(&self, key: SetupKey) -> &TileId { &self.nodes[key].id }

    pub fn data(&self, key: SetupKey) -> &SetupData { &self.nodes[key].data }

    pub fn data_mut(&mut self, key: SetupKey) -> &mut SetupData { &mut self.nodes[key].data }

    pub fn parent(&self, key: SetupKey) -> Option<SetupKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn is_group(&self, key: SetupKey) -> bool {
        self.nodes.get(key).map(|n| n.children.is_some()).unwrap_or(false)
    }

    pub fn children(&self, key: SetupKey) -> &[SetupKey] {
        self.nodes
            .get(key)
            .and_then(|n| n.children.as_deref())
            .unwrap_or_default()
    }

    /// Children ordered by priority; rendering order is descending.
    /// `sort_by` is stable, so equal priorities keep their array order.
    pub fn children_by_priority(&self, key: SetupKey, descending: bool) -> Vec<SetupKey> {
        let mut children = self.children(key).to_vec();
        children.sort_by(|&a, &b| {
            let (pa, pb) = (self.data(a).priority, self.data(b).priority);
            if descending { cmp_priority_desc(pa, pb) } else { cmp_priority(pa, pb) }
        });
        children
    }

    /// Finds a node by tile id anywhere below the root.
    pub fn find(&self, id: &TileId) -> Option<SetupKey> {
        self.descendants(self.root).find(|&key| self.nodes[key].id == *id)
    }

    /// All ancestors of `key`, including itself, walking parent links up.
    pub fn ancestors(&self, key: SetupKey) -> impl Iterator<Item = SetupKey> + '_ {
        let mut next = self.contains(key).then_some(key);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| self.parent(n));
            node
        })
    }

    /// Preorder traversal of the subtree below `key` (excluding `key`).
    pub fn descendants(&self, key: SetupKey) -> impl Iterator<Item = SetupKey> + '_ {
        let mut stack: Vec<SetupKey> = self.children(key).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.children(node).iter().rev());
            Some(node)
        })
    }

    /// Walks up from `key` to the node that is an immediate child of `limit`
    /// (the scope when given, the root otherwise). Returns `None` when `key`
    /// does not live under `limit` at all.
    pub fn top_child_under(&self, key: SetupKey, limit: Option<SetupKey>) -> Option<SetupKey> {
        let limit = limit.unwrap_or(self.root);
        let mut cur = key;
        loop {
            match self.parent(cur) {
                Some(parent) if parent == limit => return Some(cur),
                Some(parent) => cur = parent,
                None => return None,
            }
        }
    }

    /// Creates a detached node; attach it with [`SetupTree::attach`].
    pub fn new_item(&mut self, id: TileId, data: SetupData, group: bool) -> SetupKey {
        self.nodes.insert(SetupNode {
            id,
            data,
            parent: None,
            children: group.then(Vec::new),
        })
    }

    pub fn attach(&mut self, child: SetupKey, parent: SetupKey, at_front: bool) {
        debug_assert!(self.is_group(parent), "attach target is a leaf");
        if child == parent || !self.contains(child) || !self.is_group(parent) {
            return;
        }
        // Reject attaching a node under its own subtree.
        if self.ancestors(parent).any(|a| a == child) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        let children = self.nodes[parent].children.as_mut().expect("group checked above");
        if at_front {
            children.insert(0, child);
        } else {
            children.push(child);
        }
    }

    pub fn detach(&mut self, key: SetupKey) {
        let Some(parent) = self.parent(key) else { return };
        if let Some(children) = self.nodes[parent].children.as_mut() {
            children.retain(|&c| c != key);
        }
        self.nodes[key].parent = None;
    }

    /// Removes a group node, merging its children back into its parent at
    /// the group's position. A leaf is simply removed. The root cannot be
    /// dissolved.
    pub fn dissolve(&mut self, key: SetupKey) {
        let Some(parent) = self.parent(key) else { return };
        let orphans = self.nodes[key].children.take().unwrap_or_default();
        let siblings = self.nodes[parent].children.as_mut().expect("parent is a group");
        let at = siblings.iter().position(|&c| c == key).unwrap_or(siblings.len());
        siblings.retain(|&c| c != key);
        for (offset, &child) in orphans.iter().enumerate() {
            self.nodes[parent]
                .children
                .as_mut()
                .expect("parent is a group")
                .insert(at + offset, child);
        }
        for &child in &orphans {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes.remove(key);
    }

    /// Swaps priorities with the adjacent sibling: the next higher priority
    /// when `up`, the next lower otherwise. Returns false at the boundary.
    pub fn reprioritize(&mut self, key: SetupKey, up: bool) -> bool {
        let Some(parent) = self.parent(key) else { return false };
        let ordered = self.children_by_priority(parent, false);
        let Some(at) = ordered.iter().position(|&c| c == key) else { return false };
        let partner = if up {
            if at + 1 >= ordered.len() {
                return false;
            }
            ordered[at + 1]
        } else {
            if at == 0 {
                return false;
            }
            ordered[at - 1]
        };
        let own = self.data(key).priority;
        let other = self.data(partner).priority;
        self.data_mut(key).priority = other;
        self.data_mut(partner).priority = own;
        true
    }

    /// Next free `group_N` id for a freshly packed group.
    pub fn next_group_id(&self) -> TileId {
        let taken: HashSet<u64> = self
            .nodes
            .values()
            .filter_map(|n| match &n.id {
                TileId::Text(s) => s.strip_prefix("group_").and_then(|n| n.parse().ok()),
                TileId::Number(_) => None,
            })
            .collect();
        let mut n = 1;
        while taken.contains(&n) {
            n += 1;
        }
        TileId::Text(format!("group_{n}"))
    }
}

pub fn cmp_priority(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn cmp_priority_desc(a: f64, b: f64) -> Ordering { cmp_priority(b, a) }

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn leaf(id: i64, priority: f64) -> SetupValues {
        SetupValues::leaf(
            id,
            SetupData {
                priority,
                width: Some(SizeValue::percent(100)),
                width_flexible: true,
                height_dynamic: true,
                ..Default::default()
            },
        )
    }

    fn sample() -> SetupValues {
        SetupValues {
            id: None,
            data: SetupData {
                gutter: Some(10.0),
                width: Some(SizeValue::Pixels(480.0)),
                direction: Some(FlowDirection::Horizontal),
                ..Default::default()
            },
            items: Some(vec![
                SetupValues::group(
                    "group_1",
                    SetupData { priority: 1.0, ..Default::default() },
                    vec![leaf(0, 0.9), leaf(1, 0.81)],
                ),
                leaf(2, 0.7),
                leaf(3, 0.6),
            ]),
        }
    }

    mod wire_shape {
        use pretty_assertions::assert_eq;
        use super::*;

        #[test]
        fn values_round_trip_through_tree() {
            let values = sample();
            let tree = SetupTree::from_values(&values).unwrap();
            assert_eq!(tree.to_values(), values);
        }

        #[test]
        fn values_round_trip_through_json() {
            let json = serde_json::json!({
                "gutter": 0.0,
                "width": 480.0,
                "direction": "horizontal",
                "items": [
                    { "width": "100%", "widthFlexible": true, "id": 0,
                      "hidden": false, "heightDynamic": true, "height": 1.0, "priority": 1.0 },
                    { "width": "100%", "widthFlexible": true, "id": 1,
                      "hidden": false, "heightDynamic": true, "height": 1.0, "priority": 0.9 },
                ],
            });
            let values: SetupValues = serde_json::from_value(json).unwrap();
            let tree = SetupTree::from_values(&values).unwrap();
            let ids: Vec<_> =
                tree.children(tree.root()).iter().map(|&k| tree.id(k).clone()).collect();
            assert_eq!(ids, vec![TileId::Number(0), TileId::Number(1)]);
            assert_eq!(
                tree.data(tree.find(&0.into()).unwrap()).width,
                Some(SizeValue::Text("100%".to_owned()))
            );
        }

        #[test]
        fn missing_id_is_rejected() {
            let values = SetupValues {
                id: None,
                data: SetupData::default(),
                items: Some(vec![SetupValues {
                    id: None,
                    data: SetupData::default(),
                    items: None,
                }]),
            };
            assert!(matches!(
                SetupTree::from_values(&values),
                Err(SetupError::MissingId)
            ));
        }

        #[test]
        fn duplicate_id_is_rejected() {
            let values = SetupValues {
                id: None,
                data: SetupData::default(),
                items: Some(vec![leaf(1, 1.0), leaf(1, 0.9)]),
            };
            assert!(matches!(
                SetupTree::from_values(&values),
                Err(SetupError::DuplicateId(TileId::Number(1)))
            ));
        }
    }

    mod structure {
        use pretty_assertions::assert_eq;
        use super::*;

        #[test]
        fn find_descends_into_groups() {
            let tree = SetupTree::from_values(&sample()).unwrap();
            let key = tree.find(&1.into()).unwrap();
            assert_eq!(tree.data(key).priority, 0.81);
            let group = tree.find(&"group_1".into()).unwrap();
            assert_eq!(tree.parent(key), Some(group));
            assert!(tree.find(&99.into()).is_none());
        }

        #[test]
        fn ancestors_walk_to_root() {
            let tree = SetupTree::from_values(&sample()).unwrap();
            let key = tree.find(&1.into()).unwrap();
            let chain: Vec<_> = tree.ancestors(key).collect();
            assert_eq!(chain.len(), 3);
            assert_eq!(chain[2], tree.root());
        }

        #[test]
        fn top_child_under_scope_and_root() {
            let tree = SetupTree::from_values(&sample()).unwrap();
            let group = tree.find(&"group_1".into()).unwrap();
            let inner = tree.find(&0.into()).unwrap();
            // Unscoped: the packed leaf resolves to its top-level group.
            assert_eq!(tree.top_child_under(inner, None), Some(group));
            // Scoped into the group: the leaf resolves to itself.
            assert_eq!(tree.top_child_under(inner, Some(group)), Some(inner));
            // A node outside the scope yields nothing.
            let outside = tree.find(&2.into()).unwrap();
            assert_eq!(tree.top_child_under(outside, Some(group)), None);
        }

        #[test]
        fn dissolve_merges_children_into_parent() {
            let mut tree = SetupTree::from_values(&sample()).unwrap();
            let group = tree.find(&"group_1".into()).unwrap();
            tree.dissolve(group);
            assert!(!tree.contains(group));
            let ids: Vec<_> =
                tree.children(tree.root()).iter().map(|&k| tree.id(k).clone()).collect();
            assert_eq!(
                ids,
                vec![
                    TileId::Number(0),
                    TileId::Number(1),
                    TileId::Number(2),
                    TileId::Number(3)
                ]
            );
            let leaf = tree.find(&0.into()).unwrap();
            assert_eq!(tree.parent(leaf), Some(tree.root()));
        }

        #[test]
        fn attach_rejects_cycles() {
            let mut tree = SetupTree::from_values(&sample()).unwrap();
            let group = tree.find(&"group_1".into()).unwrap();
            let root = tree.root();
            tree.attach(root, group, false);
            assert_eq!(tree.parent(root), None);
            assert_eq!(tree.children(group).len(), 2);
        }

        #[test]
        fn next_group_id_skips_taken_names() {
            let tree = SetupTree::from_values(&sample()).unwrap();
            assert_eq!(tree.next_group_id(), TileId::Text("group_2".to_owned()));
        }
    }

    mod priorities {
        use pretty_assertions::assert_eq;
        use super::*;

        #[test]
        fn comparators_are_consistent() {
            let pairs = [(1.0, 0.9), (0.5, 0.5), (0.0, 1.0)];
            for (a, b) in pairs {
                assert_eq!(cmp_priority(a, b), cmp_priority(b, a).reverse());
                assert_eq!(cmp_priority_desc(a, b), cmp_priority_desc(b, a).reverse());
                assert_eq!(cmp_priority(a, a), Ordering::Equal);
            }
            assert_eq!(cmp_priority(0.9, 1.0), Ordering::Less);
            assert_eq!(cmp_priority_desc(0.9, 1.0), Ordering::Greater);
        }

        #[test]
        fn reprioritize_swaps_with_neighbor() {
            let mut tree = SetupTree::from_values(&sample()).unwrap();
            let two = tree.find(&2.into()).unwrap();
            let three = tree.find(&3.into()).unwrap();
            assert!(tree.reprioritize(three, true));
            assert_eq!(tree.data(three).priority, 0.7);
            assert_eq!(tree.data(two).priority, 0.6);
        }

        #[test]
        fn reprioritize_stops_at_boundary() {
            let mut tree = SetupTree::from_values(&sample()).unwrap();
            let group = tree.find(&"group_1".into()).unwrap();
            // Already the highest priority sibling.
            assert!(!tree.reprioritize(group, true));
            assert_eq!(tree.data(group).priority, 1.0);
        }

        #[test]
        fn children_by_priority_orders_descending() {
            let tree = SetupTree::from_values(&sample()).unwrap();
            let ordered = tree.children_by_priority(tree.root(), true);
            let ids: Vec<_> = ordered.iter().map(|&k| tree.id(k).clone()).collect();
            assert_eq!(
                ids,
                vec![
                    TileId::Text("group_1".to_owned()),
                    TileId::Number(2),
                    TileId::Number(3)
                ]
            );
        }
    }
}
