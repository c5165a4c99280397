//! Process tree construction and manipulation.
//!
//! Builds a hierarchical forest from a flat snapshot. Nodes live in an arena
//! owned by the [`Forest`] and refer to each other by index, so a parent link
//! is only a navigation aid and never keeps anything alive.

use super::metrics::{display_name, parse_elapsed, MemoryDetail, MetricKey, ProcessRecord};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Index of a node inside its [`Forest`]
pub type NodeId = usize;

/// A node in the process tree
#[derive(Debug, Clone)]
pub struct ProcessNode {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub command: String,
    pub rss_kb: u64,
    pub vsz_kb: u64,
    pub detail: MemoryDetail,
    pub elapsed: String,
    pub started: String,
    pub expanded: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    total_rss_kb: u64,
}

impl ProcessNode {
    fn from_record(record: ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            ppid: record.ppid,
            name: display_name(&record.command),
            rss_kb: record.rss_kb,
            vsz_kb: record.vsz_kb,
            command: record.command,
            detail: MemoryDetail::default(),
            elapsed: record.elapsed,
            started: record.started,
            expanded: false,
            parent: None,
            children: Vec::new(),
            total_rss_kb: record.rss_kb,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Own RSS plus the RSS of every descendant
    pub fn total_rss_kb(&self) -> u64 {
        self.total_rss_kb
    }

    pub fn age_seconds(&self) -> u64 {
        parse_elapsed(&self.elapsed)
    }

    /// Own value of the given metric, normalised to a sortable integer
    pub fn metric(&self, key: MetricKey) -> u64 {
        match key {
            MetricKey::Rss => self.rss_kb,
            MetricKey::Virtual => self.vsz_kb,
            MetricKey::Dirty => self.detail.dirty_bytes,
            MetricKey::Swap => self.detail.swap_bytes,
            MetricKey::Age => self.age_seconds(),
        }
    }
}

/// All nodes of one refresh cycle plus the ordered list of roots
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: Vec<ProcessNode>,
    roots: Vec<NodeId>,
    by_pid: HashMap<u32, NodeId>,
}

impl Forest {
    /// Build a forest from a flat list of records.
    ///
    /// Never fails: a record whose parent is missing, is itself, or would close
    /// a cycle becomes a root.
    pub fn build(records: Vec<ProcessRecord>) -> Self {
        let mut nodes = Vec::with_capacity(records.len());
        let mut by_pid = HashMap::with_capacity(records.len());

        for record in records {
            if by_pid.contains_key(&record.pid) {
                log::trace!("dropping duplicate record for pid {}", record.pid);
                continue;
            }
            by_pid.insert(record.pid, nodes.len());
            nodes.push(ProcessNode::from_record(record));
        }

        let mut forest = Self {
            nodes,
            roots: Vec::new(),
            by_pid,
        };

        for id in 0..forest.nodes.len() {
            let ppid = forest.nodes[id].ppid;
            match forest.by_pid.get(&ppid).copied() {
                Some(parent) if parent != id && !forest.would_cycle(id, parent) => {
                    forest.nodes[id].parent = Some(parent);
                    forest.nodes[parent].children.push(id);
                }
                Some(parent) if parent != id => {
                    log::debug!(
                        "pid {} declares parent {} which would close a cycle; treating as root",
                        forest.nodes[id].pid,
                        ppid
                    );
                    forest.roots.push(id);
                }
                _ => forest.roots.push(id),
            }
        }

        forest.compute_totals();

        let nodes = &forest.nodes;
        forest.roots.sort_by(|&a, &b| {
            nodes[b]
                .total_rss_kb
                .cmp(&nodes[a].total_rss_kb)
                .then(nodes[a].pid.cmp(&nodes[b].pid))
        });

        forest
    }

    /// Walk upward from `parent` through already established links and report
    /// whether `child` shows up, or whether the chain loops on itself.
    fn would_cycle(&self, child: NodeId, parent: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(parent);

        while let Some(id) = current {
            if id == child || !visited.insert(id) {
                return true;
            }
            current = self.nodes[id].parent;
        }

        false
    }

    /// Fill `total_rss_kb` bottom-up using an explicit stack
    fn compute_totals(&mut self) {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.clone();

        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend_from_slice(&self.nodes[id].children);
        }

        // Children always appear after their parent in `order`
        for &id in order.iter().rev() {
            let children_total: u64 = self.nodes[id]
                .children
                .iter()
                .map(|&c| self.nodes[c].total_rss_kb)
                .sum();
            self.nodes[id].total_rss_kb = self.nodes[id].rss_kb + children_total;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &ProcessNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ProcessNode {
        &mut self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&ProcessNode> {
        self.nodes.get(id)
    }

    pub fn find(&self, pid: u32) -> Option<NodeId> {
        self.by_pid.get(&pid).copied()
    }

    pub fn find_node(&self, pid: u32) -> Option<&ProcessNode> {
        self.find(pid).map(|id| &self.nodes[id])
    }

    pub fn find_node_mut(&mut self, pid: u32) -> Option<&mut ProcessNode> {
        let id = self.find(pid)?;
        Some(&mut self.nodes[id])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProcessNode> {
        self.nodes.iter()
    }

    /// Number of ancestors above the node
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// Children of a node ordered by the given metric (descending, ties by pid)
    pub fn sorted_children(&self, id: NodeId, key: MetricKey) -> Vec<NodeId> {
        let mut children = self.nodes[id].children.clone();
        children.sort_by(|&a, &b| self.compare_by(a, b, key));
        children
    }

    fn compare_by(&self, a: NodeId, b: NodeId, key: MetricKey) -> Ordering {
        let (a, b) = (&self.nodes[a], &self.nodes[b]);
        b.metric(key).cmp(&a.metric(key)).then(a.pid.cmp(&b.pid))
    }

    /// Pids of every expanded node
    pub fn expanded_pids(&self) -> HashSet<u32> {
        self.nodes
            .iter()
            .filter(|n| n.expanded)
            .map(|n| n.pid)
            .collect()
    }

    /// Carry expansion over from a previous cycle, matched by pid.
    /// Pids that no longer exist are ignored.
    pub fn restore_expanded(&mut self, pids: &HashSet<u32>) {
        for pid in pids {
            if let Some(node) = self.find_node_mut(*pid) {
                node.expanded = true;
            }
        }
    }

    pub fn expand_all(&mut self) {
        for node in &mut self.nodes {
            if !node.children.is_empty() {
                node.expanded = true;
            }
        }
    }

    /// Ancestor display names from the root down to the node's parent
    pub fn breadcrumb(&self, id: NodeId) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.nodes[id].parent;

        while let Some(parent) = current {
            if !visited.insert(parent) {
                break;
            }
            chain.push(self.nodes[parent].name.as_str());
            current = self.nodes[parent].parent;
        }

        chain.reverse();
        chain
    }
}
