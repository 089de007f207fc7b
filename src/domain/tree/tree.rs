//! Published tree versions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use super::validation::{validate, StructuralError};
use super::DecisionNode;
use crate::domain::foundation::{CoachingRef, NodeId, TreeVersion};
use crate::domain::personalization::CoachingTemplate;

/// Catalog file shape for one tree version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDefinition {
    pub version: TreeVersion,
    #[serde(default)]
    pub description: Option<String>,
    pub root: NodeId,
    pub nodes: Vec<DecisionNode>,
    #[serde(default)]
    pub templates: Vec<CoachingTemplate>,
}

/// A validated, immutable tree version.
///
/// Only constructible through [`DecisionTree::from_definition`], so every
/// instance has passed structural validation. Shared as `Arc<DecisionTree>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTree {
    version: TreeVersion,
    description: Option<String>,
    root: NodeId,
    nodes: HashMap<NodeId, DecisionNode>,
    order: Vec<NodeId>,
    templates: HashMap<CoachingRef, CoachingTemplate>,
    fingerprint: String,
}

impl DecisionTree {
    /// Validates a definition and freezes it.
    ///
    /// # Errors
    ///
    /// - Any [`StructuralError`] found by validation
    pub fn from_definition(definition: TreeDefinition) -> Result<Self, StructuralError> {
        validate(&definition)?;

        let encoded = serde_json::to_vec(&definition)
            .map_err(|e| StructuralError::Encoding(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let fingerprint = format!("{:x}", hasher.finalize());

        let order = definition.nodes.iter().map(|n| n.id.clone()).collect();
        let nodes = definition
            .nodes
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        let templates = definition
            .templates
            .into_iter()
            .map(|t| (t.coaching_ref.clone(), t))
            .collect();

        Ok(Self {
            version: definition.version,
            description: definition.description,
            root: definition.root,
            nodes,
            order,
            templates,
            fingerprint,
        })
    }

    pub fn version(&self) -> &TreeVersion {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    pub fn node(&self, id: &NodeId) -> Option<&DecisionNode> {
        self.nodes.get(id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &DecisionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn template(&self, coaching_ref: &CoachingRef) -> Option<&CoachingTemplate> {
        self.templates.get(coaching_ref)
    }

    /// SHA-256 of the canonical definition. Equal content, equal fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SkillId;
    use crate::domain::signal::PatternFlag;
    use crate::domain::tree::test_support::{node_id, sample_definition};
    use crate::domain::tree::{Edge, Predicate};

    #[test]
    fn sample_definition_is_valid() {
        let tree = DecisionTree::from_definition(sample_definition()).unwrap();
        assert_eq!(tree.root().as_str(), "root");
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = DecisionTree::from_definition(sample_definition()).unwrap();
        let b = DecisionTree::from_definition(sample_definition()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut changed = sample_definition();
        changed.description = Some("edited".to_string());
        let c = DecisionTree::from_definition(changed).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn rejects_duplicate_node() {
        let mut def = sample_definition();
        let dup = def.nodes[5].clone();
        def.nodes.push(dup);
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::DuplicateNode(_))
        ));
    }

    #[test]
    fn rejects_missing_root() {
        let mut def = sample_definition();
        def.root = node_id("nowhere");
        assert_eq!(
            DecisionTree::from_definition(def),
            Err(StructuralError::MissingRoot(node_id("nowhere")))
        );
    }

    #[test]
    fn rejects_incomplete_coverage() {
        let mut def = sample_definition();
        if let crate::domain::tree::NodeKind::Branch { edges, .. } = &mut def.nodes[1].kind {
            edges.retain(|e| e.when != "unknown");
        }
        match DecisionTree::from_definition(def) {
            Err(StructuralError::IncompleteCoverage { node, missing }) => {
                assert_eq!(node.as_str(), "time");
                assert_eq!(missing, vec!["unknown".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_outcome_outside_domain() {
        let mut def = sample_definition();
        if let crate::domain::tree::NodeKind::Branch { edges, .. } = &mut def.nodes[1].kind {
            edges.push(Edge::new("whenever", node_id("tipp-leaf")));
        }
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::UnknownOutcome { .. })
        ));
    }

    #[test]
    fn rejects_dangling_edge() {
        let mut def = sample_definition();
        if let crate::domain::tree::NodeKind::Branch { edges, .. } = &mut def.nodes[1].kind {
            edges[0].to = node_id("ghost");
        }
        assert_eq!(
            DecisionTree::from_definition(def),
            Err(StructuralError::DanglingEdge {
                from: node_id("time"),
                to: node_id("ghost"),
            })
        );
    }

    #[test]
    fn rejects_second_root() {
        let mut def = sample_definition();
        def.nodes.push(DecisionNode::terminal(
            node_id("orphan"),
            SkillId::new("tipp").unwrap(),
            CoachingRef::new("tipp-coaching").unwrap(),
        ));
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::MultipleRoots(roots)) if roots.len() == 2
        ));
    }

    #[test]
    fn rejects_cycle() {
        let mut def = sample_definition();
        // loop-a <-> loop-b, entered from the root's rumination edge
        def.nodes.push(DecisionNode::branch(
            node_id("loop-a"),
            Predicate::Pattern {
                flag: PatternFlag::Catastrophizing,
            },
            vec![
                Edge::new("present", node_id("loop-b")),
                Edge::new("absent", node_id("tipp-leaf")),
            ],
        ));
        def.nodes.push(DecisionNode::branch(
            node_id("loop-b"),
            Predicate::Pattern {
                flag: PatternFlag::Catastrophizing,
            },
            vec![
                Edge::new("present", node_id("loop-a")),
                Edge::new("absent", node_id("tipp-leaf")),
            ],
        ));
        if let crate::domain::tree::NodeKind::Branch { edges, .. } = &mut def.nodes[0].kind {
            for edge in edges.iter_mut().filter(|e| e.when == "rumination") {
                edge.to = node_id("loop-a");
            }
        }
        match DecisionTree::from_definition(def) {
            Err(StructuralError::Cycle(path)) => {
                assert!(path.contains(&node_id("loop-a")));
                assert!(path.contains(&node_id("loop-b")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unreachable_island() {
        let mut def = sample_definition();
        // Two nodes pointing at each other's terminal, neither reachable from root.
        def.nodes.push(DecisionNode::branch(
            node_id("island"),
            Predicate::Pattern {
                flag: PatternFlag::Catastrophizing,
            },
            vec![
                Edge::new("present", node_id("island-leaf")),
                Edge::new("absent", node_id("island-leaf")),
            ],
        ));
        def.nodes.push(DecisionNode::terminal(
            node_id("island-leaf"),
            SkillId::new("tipp").unwrap(),
            CoachingRef::new("tipp-coaching").unwrap(),
        ));
        // The island's head has no parent, so it is reported as an extra root.
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::MultipleRoots(_))
        ));
    }

    #[test]
    fn rejects_unresolved_coaching_ref() {
        let mut def = sample_definition();
        def.templates.retain(|t| t.coaching_ref.as_str() != "stop-coaching");
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::UnresolvedCoachingRef { .. })
        ));
    }

    #[test]
    fn rejects_template_for_another_skill() {
        let mut def = sample_definition();
        for t in def.templates.iter_mut().filter(|t| t.coaching_ref.as_str() == "stop-coaching") {
            t.skill_id = SkillId::new("wise-mind").unwrap();
        }
        assert!(matches!(
            DecisionTree::from_definition(def),
            Err(StructuralError::TemplateSkillMismatch { .. })
        ));
    }

    #[test]
    fn definition_round_trips_through_yaml() {
        let def = sample_definition();
        let yaml = serde_yaml::to_string(&def).unwrap();
        let parsed: TreeDefinition = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, def);
    }
}
