//! Attribute-Relation Mapping (logical) schema model.

use crate::error::Result;
use crate::index::{EntityId, EntityIndex};

/// Name of the surrogate key attribute.
pub const SELF_ATTRIBUTE: &str = "self";
pub const OID_TYPE: &str = "OID";
pub const ANY_TYPE: &str = "anyType";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArmModel {
    relations: Vec<ArmEntity>,
    index: EntityIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmEntity {
    pub name: String,
    pub attributes: Vec<ArmAttribute>,
    /// Attachment order is kept for rendering.
    pub constraints: Vec<ArmConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmAttribute {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmConstraint {
    PrimaryKey {
        attribute: String,
    },
    ForeignKey {
        name: String,
        attribute: String,
        references: String,
    },
    /// `attributes` functionally determine `target`.
    PathFd {
        attributes: Vec<String>,
        target: String,
    },
    Inheritance {
        parent: String,
    },
    Cover {
        covered_by: Vec<String>,
    },
    Disjointness {
        disjoint_with: Vec<String>,
    },
}

impl ArmModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_relation(&mut self, relation: ArmEntity) -> Result<EntityId> {
        let id = self.index.insert("relation", &relation.name)?;
        self.relations.push(relation);
        Ok(id)
    }

    pub fn relations(&self) -> &[ArmEntity] {
        &self.relations
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub fn relation(&self, id: EntityId) -> &ArmEntity {
        &self.relations[id.0]
    }

    /// Relation names stay fixed once indexed, so mutable access is crate-internal.
    pub(crate) fn relation_mut(&mut self, id: EntityId) -> &mut ArmEntity {
        &mut self.relations[id.0]
    }

    pub fn find_entity(&self, name: &str) -> Option<&ArmEntity> {
        self.index.get(name).map(|id| self.relation(id))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl ArmEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: ArmAttribute) {
        self.attributes.push(attribute);
    }

    pub fn with_attribute(mut self, attribute: ArmAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    pub fn add_constraint(&mut self, constraint: ArmConstraint) {
        self.constraints.push(constraint);
    }

    pub fn with_constraint(mut self, constraint: ArmConstraint) -> Self {
        self.add_constraint(constraint);
        self
    }

    pub fn find_attribute(&self, name: &str) -> Option<&ArmAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Determining attributes of the first `pathfd(...) -> self`.
    pub fn path_fd_to_self(&self) -> Option<&[String]> {
        self.constraints.iter().find_map(|c| match c {
            ArmConstraint::PathFd { attributes, target } if target == SELF_ATTRIBUTE => {
                Some(attributes.as_slice())
            }
            _ => None,
        })
    }

    pub fn path_fd_to_self_mut(&mut self) -> Option<&mut Vec<String>> {
        self.constraints.iter_mut().find_map(|c| match c {
            ArmConstraint::PathFd { attributes, target } if target == SELF_ATTRIBUTE => {
                Some(attributes)
            }
            _ => None,
        })
    }

    /// `(name, attribute, references)` of every foreign key, in attachment order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.constraints.iter().filter_map(|c| match c {
            ArmConstraint::ForeignKey {
                name,
                attribute,
                references,
            } => Some((name.as_str(), attribute.as_str(), references.as_str())),
            _ => None,
        })
    }

    pub fn parent(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            ArmConstraint::Inheritance { parent } => Some(parent.as_str()),
            _ => None,
        })
    }

    pub fn disjoint_with(&self) -> Option<&[String]> {
        self.constraints.iter().find_map(|c| match c {
            ArmConstraint::Disjointness { disjoint_with } => Some(disjoint_with.as_slice()),
            _ => None,
        })
    }

    pub fn covered_by(&self) -> Option<&[String]> {
        self.constraints.iter().find_map(|c| match c {
            ArmConstraint::Cover { covered_by } => Some(covered_by.as_slice()),
            _ => None,
        })
    }

    /// Add `name` to this relation's disjointness list, creating the constraint on first use.
    pub fn add_disjoint_with(&mut self, name: &str) {
        let existing = self.constraints.iter_mut().find_map(|c| match c {
            ArmConstraint::Disjointness { disjoint_with } => Some(disjoint_with),
            _ => None,
        });
        match existing {
            Some(list) => {
                if !list.iter().any(|n| n == name) {
                    list.push(name.to_string());
                }
            }
            None => self.add_constraint(ArmConstraint::Disjointness {
                disjoint_with: vec![name.to_string()],
            }),
        }
    }

    /// Add `name` to this relation's cover list, creating the constraint on first use.
    pub fn add_covered_by(&mut self, name: &str) {
        let existing = self.constraints.iter_mut().find_map(|c| match c {
            ArmConstraint::Cover { covered_by } => Some(covered_by),
            _ => None,
        });
        match existing {
            Some(list) => {
                if !list.iter().any(|n| n == name) {
                    list.push(name.to_string());
                }
            }
            None => self.add_constraint(ArmConstraint::Cover {
                covered_by: vec![name.to_string()],
            }),
        }
    }
}

impl ArmAttribute {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// An attribute of type `anyType`.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ANY_TYPE)
    }

    pub fn oid(name: impl Into<String>) -> Self {
        Self::new(name, OID_TYPE)
    }
}

impl ArmConstraint {
    pub fn primary_key(attribute: impl Into<String>) -> Self {
        Self::PrimaryKey {
            attribute: attribute.into(),
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        attribute: impl Into<String>,
        references: impl Into<String>,
    ) -> Self {
        Self::ForeignKey {
            name: name.into(),
            attribute: attribute.into(),
            references: references.into(),
        }
    }

    pub fn path_fd<I, S>(attributes: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::PathFd {
            attributes: attributes.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    pub fn inheritance(parent: impl Into<String>) -> Self {
        Self::Inheritance {
            parent: parent.into(),
        }
    }
}
