//! Drainage network graph used to validate node/link topology.
//!
//! Nodes come from every node section (Junctions, Outfalls, Storage,
//! Dividers) and links from every link section. Names share one namespace
//! per kind, so a junction and an outfall with the same name are reported as
//! a duplicate.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::diagnostics::{DiagnosticIssue, Severity};
use crate::feedback::Feedback;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    pub name: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLink {
    pub name: String,
    pub section: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEnd {
    From,
    To,
}

impl fmt::Display for LinkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEnd::From => f.write_str("From Node"),
            LinkEnd::To => f.write_str("To Node"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopologyIssue {
    DuplicateNode {
        name: String,
        first: String,
        second: String,
    },
    DuplicateLink {
        name: String,
        first: String,
        second: String,
    },
    DanglingReference {
        link: String,
        section: String,
        end: LinkEnd,
        node: String,
    },
}

impl TopologyIssue {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, TopologyIssue::DanglingReference { .. })
    }

    /// Name of the node or link the issue is about.
    pub fn entity(&self) -> &str {
        match self {
            TopologyIssue::DuplicateNode { name, .. } | TopologyIssue::DuplicateLink { name, .. } => {
                name
            }
            TopologyIssue::DanglingReference { link, .. } => link,
        }
    }
}

impl fmt::Display for TopologyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyIssue::DuplicateNode { name, first, second } => write!(
                f,
                "Node name {} is used in both {} and {}",
                name, first, second
            ),
            TopologyIssue::DuplicateLink { name, first, second } => write!(
                f,
                "Link name {} is used in both {} and {}",
                name, first, second
            ),
            TopologyIssue::DanglingReference {
                link,
                section,
                end,
                node,
            } => write!(
                f,
                "{} {} references unknown {} {}",
                section, link, end, node
            ),
        }
    }
}

/// Directed graph of nodes and links keyed by name.
#[derive(Debug, Default)]
pub struct DrainageNetwork {
    pub graph: DiGraph<NetworkNode, NetworkLink>,
    node_index: HashMap<String, NodeIndex>,
    link_sections: HashMap<String, String>,
    issues: Vec<TopologyIssue>,
}

impl DrainageNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from node tables (key in the first column) and link
    /// tables (key first, `From Node` and `To Node` columns).
    pub fn from_tables(nodes: &[&Table], links: &[&Table]) -> Self {
        let mut network = Self::new();
        for table in nodes {
            for key in table.keys() {
                if !key.is_empty() {
                    network.add_node(&key, &table.name);
                }
            }
        }
        for table in links {
            for row in 0..table.len() {
                let name = table.key(row);
                if name.is_empty() {
                    continue;
                }
                let from = table.get_text(row, "From Node");
                let to = table.get_text(row, "To Node");
                network.add_link(&name, &table.name, &from, &to);
            }
        }
        network
    }

    /// Adds a node; returns false and records an issue on duplicates.
    pub fn add_node(&mut self, name: &str, section: &str) -> bool {
        if let Some(&idx) = self.node_index.get(name) {
            let first = self.graph[idx].section.clone();
            self.issues.push(TopologyIssue::DuplicateNode {
                name: name.to_string(),
                first,
                second: section.to_string(),
            });
            return false;
        }
        let idx = self.graph.add_node(NetworkNode {
            name: name.to_string(),
            section: section.to_string(),
        });
        self.node_index.insert(name.to_string(), idx);
        true
    }

    /// Adds a link between two existing nodes. Duplicate names and unknown
    /// endpoints are recorded and the link is left out of the graph.
    pub fn add_link(&mut self, name: &str, section: &str, from: &str, to: &str) -> bool {
        if let Some(first) = self.link_sections.get(name) {
            self.issues.push(TopologyIssue::DuplicateLink {
                name: name.to_string(),
                first: first.clone(),
                second: section.to_string(),
            });
            return false;
        }
        self.link_sections
            .insert(name.to_string(), section.to_string());

        let mut ends = [None, None];
        for (slot, (end, node)) in ends
            .iter_mut()
            .zip([(LinkEnd::From, from), (LinkEnd::To, to)])
        {
            match self.node_index.get(node) {
                Some(&idx) => *slot = Some(idx),
                None => self.issues.push(TopologyIssue::DanglingReference {
                    link: name.to_string(),
                    section: section.to_string(),
                    end,
                    node: node.to_string(),
                }),
            }
        }
        match ends {
            [Some(a), Some(b)] => {
                self.graph.add_edge(
                    a,
                    b,
                    NetworkLink {
                        name: name.to_string(),
                        section: section.to_string(),
                    },
                );
                true
            }
            _ => false,
        }
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn issues(&self) -> &[TopologyIssue] {
        &self.issues
    }

    pub fn duplicates(&self) -> impl Iterator<Item = &TopologyIssue> {
        self.issues.iter().filter(|i| i.is_duplicate())
    }

    pub fn dangling(&self) -> impl Iterator<Item = &TopologyIssue> {
        self.issues.iter().filter(|i| !i.is_duplicate())
    }

    /// Nodes with no incident link, in insertion order.
    pub fn isolated_nodes(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors_undirected(n).next().is_none())
            .map(|n| self.graph[n].name.as_str())
            .collect()
    }

    /// Number of connected parts that contain at least one link. Isolated
    /// nodes are not counted.
    pub fn island_count(&self) -> usize {
        connected_components(&self.graph) - self.isolated_nodes().len()
    }

    /// Reports every topology finding to `feedback` and returns the number
    /// of errors. Duplicates are errors. Dangling references are errors
    /// unless `allow_dangling` is set. Isolated nodes and a network split
    /// into several parts are warnings.
    pub fn validate_into(&self, allow_dangling: bool, feedback: &mut dyn Feedback) -> usize {
        let mut errors = 0;
        for issue in &self.issues {
            let severity = if allow_dangling && !issue.is_duplicate() {
                Severity::Warning
            } else {
                errors += 1;
                Severity::Error
            };
            feedback.push_issue(
                DiagnosticIssue::new(severity, "topology", issue.to_string())
                    .with_entity(issue.entity()),
            );
        }
        for name in self.isolated_nodes() {
            feedback.push_issue(
                DiagnosticIssue::new(
                    Severity::Warning,
                    "topology",
                    format!("Node {} is not connected to any link", name),
                )
                .with_entity(name),
            );
        }
        let islands = self.island_count();
        if islands > 1 {
            feedback.push_issue(DiagnosticIssue::new(
                Severity::Warning,
                "topology",
                format!("The network is split into {} disconnected parts", islands),
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::CapturingFeedback;
    use crate::table::{Column, Value};

    fn table(name: &str, cols: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::with_columns(name, cols.iter().map(|c| Column::text(*c)).collect());
        for r in rows {
            t.push_values(r.iter().map(|v| Value::from(*v)).collect());
        }
        t
    }

    #[test]
    fn detects_duplicate_nodes_across_sections() {
        let j = table("Junctions", &["Name"], &[&["A"], &["B"]]);
        let o = table("Outfalls", &["Name"], &[&["B"]]);
        let net = DrainageNetwork::from_tables(&[&j, &o], &[]);
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.duplicates().count(), 1);
        assert!(net.issues()[0].to_string().contains("Junctions and Outfalls"));
    }

    #[test]
    fn detects_dangling_links_and_islands() {
        let j = table("Junctions", &["Name"], &[&["A"], &["B"], &["C"]]);
        let c = table(
            "Conduits",
            &["Name", "From Node", "To Node"],
            &[&["C1", "A", "B"], &["C2", "B", "Z"]],
        );
        let net = DrainageNetwork::from_tables(&[&j], &[&c]);
        assert_eq!(net.link_count(), 1);
        let dangling: Vec<String> = net.dangling().map(|i| i.to_string()).collect();
        assert_eq!(dangling, vec!["Conduits C2 references unknown To Node Z"]);
        assert_eq!(net.isolated_nodes(), vec!["C"]);
        assert_eq!(net.island_count(), 1);

        let mut fb = CapturingFeedback::new();
        assert_eq!(net.validate_into(false, &mut fb), 1);
        assert_eq!(fb.warnings(), vec!["Node C is not connected to any link"]);
        assert_eq!(fb.in_category("topology")[0].entity.as_deref(), Some("C2"));

        let mut fb = CapturingFeedback::new();
        assert_eq!(net.validate_into(true, &mut fb), 0);
        assert_eq!(fb.warnings().len(), 2);
    }

    #[test]
    fn separate_parts_are_warned() {
        let j = table("Junctions", &["Name"], &[&["A"], &["B"], &["C"], &["D"]]);
        let c = table(
            "Conduits",
            &["Name", "From Node", "To Node"],
            &[&["C1", "A", "B"], &["C2", "C", "D"]],
        );
        let net = DrainageNetwork::from_tables(&[&j], &[&c]);
        assert!(net.isolated_nodes().is_empty());
        assert_eq!(net.island_count(), 2);

        let mut fb = CapturingFeedback::new();
        assert_eq!(net.validate_into(false, &mut fb), 0);
        assert!(fb.mentions("split into 2 disconnected parts"));
    }
}
