//! Structural validation of a tree definition.
//!
//! A version that fails any check is never activated.

use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::{NodeKind, TreeDefinition};
use crate::domain::foundation::{CoachingRef, ErrorCode, NodeId, SkillId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Tree has no nodes")]
    EmptyTree,

    #[error("Node {0} is declared more than once")]
    DuplicateNode(NodeId),

    #[error("Declared root {0} does not exist")]
    MissingRoot(NodeId),

    #[error("Declared root {0} has incoming edges")]
    RootHasIncomingEdges(NodeId),

    #[error("Tree has more than one root: {0:?}")]
    MultipleRoots(Vec<NodeId>),

    #[error("Nodes unreachable from root: {0:?}")]
    UnreachableNodes(Vec<NodeId>),

    #[error("Edge from {from} points to missing node {to}")]
    DanglingEdge { from: NodeId, to: NodeId },

    #[error("Branch {node} has no edges")]
    NoEdges { node: NodeId },

    #[error("Branch {node} has edge for {outcome:?}, outside its predicate's domain")]
    UnknownOutcome { node: NodeId, outcome: String },

    #[error("Branch {node} has more than one edge for {outcome:?}")]
    DuplicateEdge { node: NodeId, outcome: String },

    #[error("Branch {node} does not cover outcomes {missing:?}")]
    IncompleteCoverage { node: NodeId, missing: Vec<String> },

    #[error("Cycle through nodes {0:?}")]
    Cycle(Vec<NodeId>),

    #[error("Terminal {node} references unknown coaching template {coaching_ref}")]
    UnresolvedCoachingRef { node: NodeId, coaching_ref: CoachingRef },

    #[error("Terminal {node} selects {skill} but template {coaching_ref} is for another skill")]
    TemplateSkillMismatch {
        node: NodeId,
        skill: SkillId,
        coaching_ref: CoachingRef,
    },

    #[error("Coaching template {0} is declared more than once")]
    DuplicateTemplate(CoachingRef),

    #[error("Coaching template {coaching_ref} is invalid: {source}")]
    InvalidTemplate {
        coaching_ref: CoachingRef,
        source: ValidationError,
    },

    #[error("Tree definition could not be encoded: {0}")]
    Encoding(String),
}

impl StructuralError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::StructuralError
    }
}

/// Runs every structural check, stopping at the first failure.
///
/// Checks run in declaration order so the reported error is stable.
pub fn validate(definition: &TreeDefinition) -> Result<(), StructuralError> {
    if definition.nodes.is_empty() {
        return Err(StructuralError::EmptyTree);
    }

    let mut index: HashMap<&NodeId, usize> = HashMap::new();
    for (i, node) in definition.nodes.iter().enumerate() {
        if index.insert(&node.id, i).is_some() {
            return Err(StructuralError::DuplicateNode(node.id.clone()));
        }
    }

    let mut templates = HashMap::new();
    for template in &definition.templates {
        template
            .validate()
            .map_err(|source| StructuralError::InvalidTemplate {
                coaching_ref: template.coaching_ref.clone(),
                source,
            })?;
        if templates.insert(&template.coaching_ref, template).is_some() {
            return Err(StructuralError::DuplicateTemplate(
                template.coaching_ref.clone(),
            ));
        }
    }

    if !index.contains_key(&definition.root) {
        return Err(StructuralError::MissingRoot(definition.root.clone()));
    }

    for node in &definition.nodes {
        match &node.kind {
            NodeKind::Branch {
                predicate, edges, ..
            } => {
                if edges.is_empty() {
                    return Err(StructuralError::NoEdges {
                        node: node.id.clone(),
                    });
                }
                let mut covered = HashSet::new();
                for edge in edges {
                    let outcome = predicate.parse_outcome(&edge.when).ok_or_else(|| {
                        StructuralError::UnknownOutcome {
                            node: node.id.clone(),
                            outcome: edge.when.clone(),
                        }
                    })?;
                    if !covered.insert(outcome) {
                        return Err(StructuralError::DuplicateEdge {
                            node: node.id.clone(),
                            outcome: edge.when.clone(),
                        });
                    }
                    if !index.contains_key(&edge.to) {
                        return Err(StructuralError::DanglingEdge {
                            from: node.id.clone(),
                            to: edge.to.clone(),
                        });
                    }
                }
                let missing: Vec<String> = predicate
                    .domain()
                    .into_iter()
                    .filter(|o| !covered.contains(o))
                    .map(|o| o.label().to_string())
                    .collect();
                if !missing.is_empty() {
                    return Err(StructuralError::IncompleteCoverage {
                        node: node.id.clone(),
                        missing,
                    });
                }
            }
            NodeKind::Terminal {
                skill,
                coaching_ref,
            } => {
                let template = templates.get(coaching_ref).ok_or_else(|| {
                    StructuralError::UnresolvedCoachingRef {
                        node: node.id.clone(),
                        coaching_ref: coaching_ref.clone(),
                    }
                })?;
                if &template.skill_id != skill {
                    return Err(StructuralError::TemplateSkillMismatch {
                        node: node.id.clone(),
                        skill: skill.clone(),
                        coaching_ref: coaching_ref.clone(),
                    });
                }
            }
        }
    }

    let mut in_degree = vec![0usize; definition.nodes.len()];
    for node in &definition.nodes {
        for edge in node.edges() {
            in_degree[index[&edge.to]] += 1;
        }
    }
    if in_degree[index[&definition.root]] > 0 {
        return Err(StructuralError::RootHasIncomingEdges(
            definition.root.clone(),
        ));
    }
    let extra_roots: Vec<NodeId> = definition
        .nodes
        .iter()
        .zip(&in_degree)
        .filter(|(n, d)| **d == 0 && n.id != definition.root)
        .map(|(n, _)| n.id.clone())
        .collect();
    if !extra_roots.is_empty() {
        let mut roots = vec![definition.root.clone()];
        roots.extend(extra_roots);
        return Err(StructuralError::MultipleRoots(roots));
    }

    if let Some(cycle) = find_cycle(definition, &index) {
        return Err(StructuralError::Cycle(cycle));
    }

    let reachable = reachable_from_root(definition, &index);
    let unreachable: Vec<NodeId> = definition
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, _)| !reachable[*i])
        .map(|(_, n)| n.id.clone())
        .collect();
    if !unreachable.is_empty() {
        return Err(StructuralError::UnreachableNodes(unreachable));
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Iterative DFS; returns the nodes of the first cycle found.
fn find_cycle(definition: &TreeDefinition, index: &HashMap<&NodeId, usize>) -> Option<Vec<NodeId>> {
    let nodes = &definition.nodes;
    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, next edge to try)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::OnPath;

        while let Some(top) = stack.last_mut() {
            let current = top.0;
            let edges = nodes[current].edges();
            if top.1 < edges.len() {
                let target = index[&edges[top.1].to];
                top.1 += 1;
                match marks[target] {
                    Mark::OnPath => {
                        let from = stack.iter().position(|(n, _)| *n == target).unwrap_or(0);
                        return Some(
                            stack[from..]
                                .iter()
                                .map(|(n, _)| nodes[*n].id.clone())
                                .collect(),
                        );
                    }
                    Mark::Unvisited => {
                        marks[target] = Mark::OnPath;
                        stack.push((target, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[current] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}

fn reachable_from_root(definition: &TreeDefinition, index: &HashMap<&NodeId, usize>) -> Vec<bool> {
    let mut seen = vec![false; definition.nodes.len()];
    let mut queue = VecDeque::from([index[&definition.root]]);
    seen[index[&definition.root]] = true;
    while let Some(i) = queue.pop_front() {
        for edge in definition.nodes[i].edges() {
            let j = index[&edge.to];
            if !seen[j] {
                seen[j] = true;
                queue.push_back(j);
            }
        }
    }
    seen
}
