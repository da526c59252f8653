//! EER -> ARM mapping.

use super::{ForwardOptions, Transformed};
use crate::arm::{ArmAttribute, ArmConstraint, ArmEntity, ArmModel, SELF_ATTRIBUTE};
use crate::eer::{EerEntity, EerModel, EerRelationship};
use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::index::EntityId;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// How a binary relationship is realised in the relational schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    /// FK on entity1 referencing entity2.
    OneToOne,
    /// FK on entity1 referencing entity2.
    ManyToOne,
    /// FK on entity2 referencing entity1.
    OneToMany,
    /// A junction relation named after the relationship.
    ManyToMany,
}

/// Classify `rel` by which sides are "many"; `None` if a multiplicity is unset.
pub fn classify(rel: &EerRelationship) -> Option<RelationshipKind> {
    let (m1, m2) = (rel.mult1.as_ref()?, rel.mult2.as_ref()?);
    Some(match (m1.is_many(), m2.is_many()) {
        (false, false) => RelationshipKind::OneToOne,
        (true, false) => RelationshipKind::ManyToOne,
        (false, true) => RelationshipKind::OneToMany,
        (true, true) => RelationshipKind::ManyToMany,
    })
}

pub fn eer_to_arm(eer: &EerModel) -> Result<Transformed<ArmModel>> {
    eer_to_arm_with(eer, &ForwardOptions::default())
}

pub fn eer_to_arm_with(eer: &EerModel, options: &ForwardOptions) -> Result<Transformed<ArmModel>> {
    let mut build = BuildArm {
        eer,
        arm: ArmModel::new(),
        diagnostics: Vec::new(),
    };

    build.declare_relations()?;
    build.apply_inheritance()?;
    for rel in eer.relationships() {
        build.map_relationship(rel)?;
    }
    if options.implicit_disjointness {
        build.apply_implicit_disjointness();
    }

    info!(
        entities = eer.entities().len(),
        relationships = eer.relationships().len(),
        relations = build.arm.len(),
        diagnostics = build.diagnostics.len(),
        "mapped EER schema to ARM"
    );

    Ok(Transformed {
        model: build.arm,
        diagnostics: build.diagnostics,
    })
}

/// State of one EER -> ARM run.
struct BuildArm<'a> {
    eer: &'a EerModel,
    arm: ArmModel,
    diagnostics: Vec<Diagnostic>,
}

impl BuildArm<'_> {
    fn diagnose(&mut self, kind: DiagnosticKind, subject: &str, message: String) {
        warn!(kind = kind.as_str(), subject, "{message}");
        self.diagnostics.push(Diagnostic::new(kind, subject, message));
    }

    fn relation_id(&self, name: &str, context: impl FnOnce() -> String) -> Result<EntityId> {
        self.arm.index().resolve(name, context)
    }

    /// One relation per entity: surrogate key, flattened attributes, natural key.
    fn declare_relations(&mut self) -> Result<()> {
        let eer = self.eer;
        for entity in eer.entities() {
            let identifier = eer.resolved_identifier(&entity.name)?.to_vec();

            let mut relation = ArmEntity::new(&entity.name)
                .with_attribute(ArmAttribute::oid(SELF_ATTRIBUTE));
            for attr in &entity.attributes {
                relation.add_attribute(ArmAttribute::untyped(&attr.name));
            }
            relation.add_constraint(ArmConstraint::primary_key(SELF_ATTRIBUTE));
            relation.add_constraint(ArmConstraint::path_fd(identifier, SELF_ATTRIBUTE));

            debug!(entity = %entity.name, weak = entity.weak, "declared relation");
            self.arm.add_relation(relation)?;
        }
        Ok(())
    }

    fn apply_inheritance(&mut self) -> Result<()> {
        let eer = self.eer;
        for entity in eer.entities() {
            if let Some(inh) = &entity.inheritance {
                self.relation_id(&inh.parent, || format!("inheritance of entity {}", entity.name))?;
                let child = self.relation_id(&entity.name, || "inheritance".into())?;
                self.arm
                    .relation_mut(child)
                    .add_constraint(ArmConstraint::inheritance(&inh.parent));
            }
        }

        let children = children_by_parent(eer);

        // Lists are filled only after every child carries its `isa`, so the
        // constraint order of a relation does not depend on sibling order.
        for entity in eer.entities() {
            let Some(inh) = &entity.inheritance else {
                continue;
            };
            let child = self.relation_id(&entity.name, || "inheritance".into())?;

            if inh.disjoint {
                let siblings = children
                    .get(inh.parent.as_str())
                    .into_iter()
                    .flatten()
                    .filter(|sibling| sibling.name != entity.name);
                for sibling in siblings {
                    let sibling_id = self.relation_id(&sibling.name, || "disjointness".into())?;
                    self.arm.relation_mut(child).add_disjoint_with(&sibling.name);
                    self.arm.relation_mut(sibling_id).add_disjoint_with(&entity.name);
                }
            }

            if inh.covering {
                let parent = self.relation_id(&inh.parent, || {
                    format!("inheritance of entity {}", entity.name)
                })?;
                self.arm.relation_mut(parent).add_covered_by(&entity.name);
            }

            debug!(
                entity = %entity.name,
                parent = %inh.parent,
                disjoint = inh.disjoint,
                covering = inh.covering,
                "mapped specialization"
            );
        }
        Ok(())
    }

    fn map_relationship(&mut self, rel: &EerRelationship) -> Result<()> {
        let eer = self.eer;
        let context = || format!("relationship {}", rel.name);
        let e1 = eer.entity(eer.index().resolve(&rel.entity1, context)?);
        let e2 = eer.entity(eer.index().resolve(&rel.entity2, context)?);

        if rel.weak {
            self.extend_weak_identifier(rel, e1, e2)?;
        }

        let Some(kind) = classify(rel) else {
            let side = if rel.mult1.is_none() { &rel.entity1 } else { &rel.entity2 };
            self.diagnose(
                DiagnosticKind::UnclassifiableRelationship,
                &rel.name,
                format!("multiplicity of {} is unset; no foreign key emitted", side),
            );
            return Ok(());
        };

        debug!(relationship = %rel.name, ?kind, "classified relationship");
        match kind {
            RelationshipKind::OneToOne | RelationshipKind::ManyToOne => {
                self.place_foreign_key(rel, &e1.name, &e2.name)
            }
            RelationshipKind::OneToMany => self.place_foreign_key(rel, &e2.name, &e1.name),
            RelationshipKind::ManyToMany => self.add_junction(rel),
        }
    }

    /// The weak participant's natural key also takes the owner's reference.
    fn extend_weak_identifier(
        &mut self,
        rel: &EerRelationship,
        e1: &EerEntity,
        e2: &EerEntity,
    ) -> Result<()> {
        let (weak, owner) = match (e1.weak, e2.weak) {
            (true, _) => (e1, e2),
            (false, true) => (e2, e1),
            (false, false) => {
                self.diagnose(
                    DiagnosticKind::OrphanWeakRelationship,
                    &rel.name,
                    format!("neither {} nor {} is a weak entity", e1.name, e2.name),
                );
                return Ok(());
            }
        };

        let weak_id = self.relation_id(&weak.name, || format!("relationship {}", rel.name))?;
        let owner_ref = owner.name.to_lowercase();
        let extended = match self.arm.relation_mut(weak_id).path_fd_to_self_mut() {
            Some(attributes) => {
                if !attributes.contains(&owner_ref) {
                    attributes.push(owner_ref);
                }
                true
            }
            None => false,
        };
        if !extended {
            self.diagnose(
                DiagnosticKind::OrphanWeakRelationship,
                &rel.name,
                format!("weak entity {} has no natural key to extend", weak.name),
            );
        }
        Ok(())
    }

    fn place_foreign_key(&mut self, rel: &EerRelationship, holder: &str, referenced: &str) -> Result<()> {
        let holder_id = self.relation_id(holder, || format!("relationship {}", rel.name))?;
        let fk = referenced.to_lowercase();
        let relation = self.arm.relation_mut(holder_id);

        if relation.find_attribute(&fk).is_none() {
            relation.add_attribute(ArmAttribute::oid(&fk));
        }
        let shared = relation.foreign_keys().any(|(_, attribute, _)| attribute == fk);
        let constraint = ArmConstraint::foreign_key(&fk, &fk, referenced);
        if !relation.constraints.contains(&constraint) {
            relation.add_constraint(constraint);
        }
        for attr in &rel.attributes {
            if relation.find_attribute(&attr.name).is_none() {
                relation.add_attribute(ArmAttribute::untyped(&attr.name));
            }
        }

        if shared {
            self.diagnose(
                DiagnosticKind::SharedForeignKey,
                &rel.name,
                format!("{holder}.{fk} already references a relation; both relationships share it"),
            );
        }
        debug!(relationship = %rel.name, holder, referenced, "placed foreign key");
        Ok(())
    }

    fn add_junction(&mut self, rel: &EerRelationship) -> Result<()> {
        let left = rel.entity1.to_lowercase();
        let mut right = rel.entity2.to_lowercase();
        if right == left {
            right.push_str("_2");
        }

        let mut junction = ArmEntity::new(&rel.name)
            .with_attribute(ArmAttribute::oid(SELF_ATTRIBUTE))
            .with_attribute(ArmAttribute::untyped(&left))
            .with_attribute(ArmAttribute::untyped(&right));
        for attr in &rel.attributes {
            junction.add_attribute(ArmAttribute::untyped(&attr.name));
        }
        junction.add_constraint(ArmConstraint::primary_key(SELF_ATTRIBUTE));
        junction.add_constraint(ArmConstraint::path_fd([left.as_str(), right.as_str()], SELF_ATTRIBUTE));
        junction.add_constraint(ArmConstraint::foreign_key(&left, &left, &rel.entity1));
        junction.add_constraint(ArmConstraint::foreign_key(&right, &right, &rel.entity2));

        debug!(relationship = %rel.name, "synthesized junction relation");
        self.arm.add_relation(junction)?;
        Ok(())
    }

    /// Relations outside any hierarchy are pairwise disjoint.
    fn apply_implicit_disjointness(&mut self) {
        let roots: Vec<(EntityId, String)> = self
            .arm
            .relations()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.parent().is_none())
            .map(|(i, r)| (EntityId(i), r.name.clone()))
            .collect();
        if roots.len() < 2 {
            return;
        }

        for (id, name) in &roots {
            let relation = self.arm.relation_mut(*id);
            for (_, other) in roots.iter().filter(|(_, other)| other != name) {
                relation.add_disjoint_with(other);
            }
        }
        debug!(roots = roots.len(), "applied implicit disjointness");
    }
}

/// Entities specializing each parent, in model order.
fn children_by_parent(eer: &EerModel) -> IndexMap<&str, Vec<&EerEntity>> {
    let mut children: IndexMap<&str, Vec<&EerEntity>> = IndexMap::new();
    for entity in eer.entities() {
        if let Some(inh) = &entity.inheritance {
            children.entry(inh.parent.as_str()).or_default().push(entity);
        }
    }
    children
}
