//! Node synthesis for networks whose channels have no declared nodes.
//!
//! Channel endpoints are resolved against explicit node points first, then
//! against endpoints of channels already processed, and finally a new node
//! named `<channel>.<1|2>` is created. Wherever several candidates meet at
//! one location the lowest elevation wins.

use std::collections::{HashMap, HashSet};

use geo::Coord;
use swmm_core::geometry::{distance, SnapIndex};
use swmm_core::Feedback;

/// Upstream (`1`) or downstream (`2`) end of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Upstream,
    Downstream,
}

impl End {
    pub fn suffix(&self) -> u8 {
        match self {
            End::Upstream => 1,
            End::Downstream => 2,
        }
    }
}

/// Outcome of resolving one channel endpoint; each resolved state carries
/// the node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Unresolved,
    SnappedToExplicitNode(usize),
    SnappedToSiblingEndpoint(usize),
    Automatic(usize),
}

impl EndpointState {
    pub fn node(&self) -> Option<usize> {
        match *self {
            EndpointState::Unresolved => None,
            EndpointState::SnappedToExplicitNode(n)
            | EndpointState::SnappedToSiblingEndpoint(n)
            | EndpointState::Automatic(n) => Some(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub name: String,
    pub coord: Coord<f64>,
    pub elev: Option<f64>,
    /// Elevation came from the source data and is not adjusted.
    pub fixed_elev: bool,
    pub explicit: bool,
}

/// Hands out names that are unique within one namespace, appending `_1`,
/// `_2`, ... to repeats.
#[derive(Debug, Default, Clone)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `name` or the first free suffixed variant of it.
    pub fn claim(&mut self, name: &str) -> String {
        if self.taken.insert(name.to_string()) {
            return name.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", name, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

#[derive(Debug)]
pub struct NodeSet {
    tolerance: f64,
    nodes: Vec<NodeRecord>,
    explicit: SnapIndex,
    explicit_nodes: Vec<usize>,
    automatic: SnapIndex,
    automatic_nodes: Vec<usize>,
    by_name: HashMap<String, usize>,
    lowest_invert: Vec<Option<f64>>,
    names: UniqueNames,
}

impl NodeSet {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            nodes: Vec::new(),
            explicit: SnapIndex::new(tolerance),
            explicit_nodes: Vec::new(),
            automatic: SnapIndex::new(tolerance),
            automatic_nodes: Vec::new(),
            by_name: HashMap::new(),
            lowest_invert: Vec::new(),
            names: UniqueNames::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> &NodeRecord {
        &self.nodes[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &NodeRecord)> {
        self.nodes.iter().enumerate()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    fn push(&mut self, mut record: NodeRecord) -> usize {
        record.name = self.names.claim(&record.name);
        let index = self.nodes.len();
        self.by_name.insert(record.name.clone(), index);
        self.nodes.push(record);
        self.lowest_invert.push(None);
        index
    }

    /// Adds a declared node. A node that coincides with one already added
    /// is merged into it: the first name is kept with the lower elevation.
    /// Returns the index of the node that represents the point.
    pub fn add_explicit(
        &mut self,
        name: &str,
        coord: Coord<f64>,
        elev: Option<f64>,
        feedback: &mut dyn Feedback,
    ) -> usize {
        if let Some((hit, _)) = self.explicit.nearest_within(coord, self.tolerance) {
            let index = self.explicit_nodes[hit];
            let existing = &mut self.nodes[index];
            feedback.push_warning(&format!(
                "Node {} coincides with node {} and was merged into it",
                name, existing.name
            ));
            if let Some(e) = elev {
                existing.elev = Some(existing.elev.map_or(e, |cur| cur.min(e)));
                existing.fixed_elev = true;
            }
            self.by_name.entry(name.to_string()).or_insert(index);
            return index;
        }
        let claimed_from = name.to_string();
        let index = self.push(NodeRecord {
            name: name.to_string(),
            coord,
            elev,
            fixed_elev: elev.is_some(),
            explicit: true,
        });
        if self.nodes[index].name != claimed_from {
            feedback.push_warning(&format!(
                "Node name {} is used more than once; renamed to {}",
                claimed_from, self.nodes[index].name
            ));
        }
        self.explicit.insert(coord);
        self.explicit_nodes.push(index);
        index
    }

    /// Resolves a channel endpoint. `invert` is the channel invert at that
    /// end and becomes the elevation of a node created for it.
    pub fn resolve(
        &mut self,
        channel: &str,
        end: End,
        coord: Coord<f64>,
        invert: Option<f64>,
        auto_create: bool,
    ) -> EndpointState {
        let state = if let Some((hit, _)) = self.explicit.nearest_within(coord, self.tolerance) {
            EndpointState::SnappedToExplicitNode(self.explicit_nodes[hit])
        } else if let Some((hit, _)) = self.automatic.nearest_within(coord, self.tolerance) {
            EndpointState::SnappedToSiblingEndpoint(self.automatic_nodes[hit])
        } else if auto_create {
            let index = self.push(NodeRecord {
                name: format!("{}.{}", channel, end.suffix()),
                coord,
                elev: None,
                fixed_elev: false,
                explicit: false,
            });
            self.automatic.insert(coord);
            self.automatic_nodes.push(index);
            EndpointState::Automatic(index)
        } else {
            EndpointState::Unresolved
        };
        if let (Some(index), Some(invert)) = (state.node(), invert) {
            self.record_invert(index, invert);
        }
        state
    }

    /// Notes a channel invert at a node; the lowest one is kept.
    pub fn record_invert(&mut self, index: usize, invert: f64) {
        let slot = &mut self.lowest_invert[index];
        *slot = Some(slot.map_or(invert, |cur| cur.min(invert)));
    }

    /// Lowers a node to `elev` if that is below its current elevation.
    pub fn lower_to(&mut self, index: usize, elev: f64) {
        let node = &mut self.nodes[index];
        node.elev = Some(node.elev.map_or(elev, |cur| cur.min(elev)));
    }

    /// Gives every node without a fixed elevation the lowest invert of the
    /// channels connected to it. Nodes with nothing to go on are set to 0.
    pub fn finalize_elevations(&mut self, feedback: &mut dyn Feedback) {
        for (node, lowest) in self.nodes.iter_mut().zip(&self.lowest_invert) {
            if node.fixed_elev {
                continue;
            }
            match (node.elev, *lowest) {
                (Some(e), Some(l)) => node.elev = Some(e.min(l)),
                (None, Some(l)) => node.elev = Some(l),
                (Some(_), None) => {}
                (None, None) => {
                    feedback.push_warning(&format!(
                        "Node {} has no elevation and no connected invert; using 0",
                        node.name
                    ));
                    node.elev = Some(0.0);
                }
            }
        }
    }

    pub fn elevation(&self, index: usize) -> f64 {
        self.nodes[index].elev.unwrap_or(0.0)
    }

    /// Height of a channel invert above its node, never negative. An unknown
    /// invert sits on the node.
    pub fn offset(&self, index: usize, invert: Option<f64>) -> f64 {
        invert.map_or(0.0, |inv| (inv - self.elevation(index)).max(0.0))
    }

    /// Nearest node of any kind within `tolerance` of `coord`.
    pub fn nearest(&self, coord: Coord<f64>, tolerance: f64) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, distance(n.coord, coord)))
            .filter(|(_, d)| *d <= tolerance)
            .fold(None, |best: Option<(usize, f64)>, cand| match best {
                Some(b) if b.1 <= cand.1 => Some(b),
                _ => Some(cand),
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use swmm_core::CapturingFeedback;

    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn endpoints_prefer_explicit_nodes() {
        let mut fb = CapturingFeedback::new();
        let mut nodes = NodeSet::new(0.5);
        let pit = nodes.add_explicit("Pit1", c(0.0, 0.0), None, &mut fb);
        let a = nodes.resolve("P1", End::Upstream, c(0.2, 0.0), Some(10.0), true);
        assert_eq!(a, EndpointState::SnappedToExplicitNode(pit));
        let b = nodes.resolve("P1", End::Downstream, c(10.0, 0.0), Some(9.5), true);
        let auto = b.node().unwrap();
        assert_eq!(b, EndpointState::Automatic(auto));
        assert_eq!(nodes.get(auto).name, "P1.2");
        let d = nodes.resolve("P2", End::Upstream, c(10.1, 0.0), Some(9.2), true);
        assert_eq!(d, EndpointState::SnappedToSiblingEndpoint(auto));
        assert_eq!(
            nodes.resolve("P3", End::Upstream, c(50.0, 0.0), None, false),
            EndpointState::Unresolved
        );
    }

    #[test]
    fn lowest_invert_sets_elevation_and_offsets_clip() {
        let mut fb = CapturingFeedback::new();
        let mut nodes = NodeSet::new(0.1);
        let n = nodes
            .resolve("P1", End::Downstream, c(5.0, 5.0), Some(9.5), true)
            .node()
            .unwrap();
        nodes.resolve("P2", End::Upstream, c(5.0, 5.0), Some(9.2), true);
        let lonely = nodes
            .resolve("P3", End::Upstream, c(90.0, 5.0), None, true)
            .node()
            .unwrap();
        nodes.finalize_elevations(&mut fb);
        assert_eq!(nodes.elevation(n), 9.2);
        assert!((nodes.offset(n, Some(9.5)) - 0.3).abs() < 1e-9);
        assert_eq!(nodes.offset(n, Some(9.0)), 0.0);
        assert_eq!(nodes.elevation(lonely), 0.0);
        assert!(fb.mentions("P3.1 has no elevation"));
    }

    #[test]
    fn coincident_explicit_nodes_merge_to_lowest() {
        let mut fb = CapturingFeedback::new();
        let mut nodes = NodeSet::new(0.01);
        let a = nodes.add_explicit("N1", c(1.0, 1.0), Some(5.0), &mut fb);
        let b = nodes.add_explicit("N2", c(1.0, 1.0), Some(4.0), &mut fb);
        assert_eq!(a, b);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.get(a).name, "N1");
        assert_eq!(nodes.get(a).elev, Some(4.0));
        assert_eq!(nodes.index_of("N2"), Some(a));
        assert!(fb.mentions("N2 coincides with node N1"));
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("A"), "A");
        assert_eq!(names.claim("A"), "A_1");
        assert_eq!(names.claim("A"), "A_2");
        assert!(names.contains("A_1"));
    }
}
