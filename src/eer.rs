//! Enhanced Entity-Relationship (conceptual) schema model.

use crate::error::{ModelError, Result};
use crate::index::{EntityId, EntityIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EerModel {
    entities: Vec<EerEntity>,
    entity_index: EntityIndex,
    relationships: Vec<EerRelationship>,
    relationship_index: EntityIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EerEntity {
    pub name: String,
    pub attributes: Vec<EerAttribute>,
    pub weak: bool,
    /// At most one identifier and one inheritance constraint per entity.
    pub identifier: Option<Identifier>,
    pub inheritance: Option<Inheritance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EerAttribute {
    pub name: String,
    pub multi_valued: bool,
    pub derived: bool,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EerRelationship {
    pub name: String,
    pub entity1: String,
    pub entity2: String,
    pub mult1: Option<Multiplicity>,
    pub mult2: Option<Multiplicity>,
    pub weak: bool,
    pub attributes: Vec<EerAttribute>,
}

/// A `(lower, upper)` pair; `"n"` in either slot means "many".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiplicity {
    pub lower: String,
    pub upper: Option<String>,
}

/// The (possibly partial) key of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inheritance {
    pub parent: String,
    pub disjoint: bool,
    pub covering: bool,
}

impl EerModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: EerEntity) -> Result<EntityId> {
        let id = self.entity_index.insert("entity", &entity.name)?;
        self.entities.push(entity);
        Ok(id)
    }

    pub fn add_relationship(&mut self, relationship: EerRelationship) -> Result<EntityId> {
        let id = self
            .relationship_index
            .insert("relationship", &relationship.name)?;
        self.relationships.push(relationship);
        Ok(id)
    }

    pub fn entities(&self) -> &[EerEntity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[EerRelationship] {
        &self.relationships
    }

    pub fn index(&self) -> &EntityIndex {
        &self.entity_index
    }

    pub fn entity(&self, id: EntityId) -> &EerEntity {
        &self.entities[id.0]
    }

    pub fn find_entity(&self, name: &str) -> Option<&EerEntity> {
        self.entity_index.get(name).map(|id| self.entity(id))
    }

    pub fn find_relationship(&self, name: &str) -> Option<&EerRelationship> {
        self.relationship_index
            .get(name)
            .map(|id| &self.relationships[id.0])
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Identifier of `name`, falling back to the nearest ancestor that declares one.
    pub fn resolved_identifier(&self, name: &str) -> Result<&[String]> {
        let mut current = self.entity(self.entity_index.resolve(name, || "identifier lookup".into())?);
        let mut visited: HashSet<&str> = HashSet::new();

        loop {
            if let Some(id) = current.identifier() {
                return Ok(id);
            }
            if !visited.insert(current.name.as_str()) {
                return Err(ModelError::PreconditionViolation(format!(
                    "inheritance cycle through `{}`",
                    current.name
                )));
            }
            let Some(inheritance) = &current.inheritance else {
                return Err(ModelError::PreconditionViolation(format!(
                    "entity `{}` has no identifier and no parent to inherit one from",
                    current.name
                )));
            };
            let parent = self.entity_index.resolve(&inheritance.parent, || {
                format!("inheritance of entity {}", current.name)
            })?;
            current = self.entity(parent);
        }
    }
}

impl EerEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            weak: false,
            identifier: None,
            inheritance: None,
        }
    }

    pub fn weak(name: impl Into<String>) -> Self {
        Self {
            weak: true,
            ..Self::new(name)
        }
    }

    pub fn set_weak(&mut self, weak: bool) {
        self.weak = weak;
    }

    pub fn add_attribute(&mut self, attribute: EerAttribute) {
        self.attributes.push(attribute);
    }

    pub fn with_attribute(mut self, attribute: EerAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    pub fn set_identifier<I, S>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier = Some(Identifier {
            attributes: attributes.into_iter().map(Into::into).collect(),
        });
    }

    pub fn with_identifier<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_identifier(attributes);
        self
    }

    pub fn set_inheritance(&mut self, parent: impl Into<String>, disjoint: bool, covering: bool) {
        self.inheritance = Some(Inheritance {
            parent: parent.into(),
            disjoint,
            covering,
        });
    }

    pub fn with_inheritance(mut self, parent: impl Into<String>, disjoint: bool, covering: bool) -> Self {
        self.set_inheritance(parent, disjoint, covering);
        self
    }

    /// The declared identifier only; see [`EerModel::resolved_identifier`] for inherited ones.
    pub fn identifier(&self) -> Option<&[String]> {
        self.identifier.as_ref().map(|id| id.attributes.as_slice())
    }

    pub fn is_inherited_from(&self) -> bool {
        self.inheritance.is_some()
    }

    pub fn inheritance_constraint(&self) -> Result<&Inheritance> {
        self.inheritance.as_ref().ok_or_else(|| {
            ModelError::PreconditionViolation(format!(
                "entity `{}` has no inheritance constraint",
                self.name
            ))
        })
    }
}

impl EerAttribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multi_valued: false,
            derived: false,
            optional: false,
        }
    }

    pub fn multi_valued(mut self) -> Self {
        self.multi_valued = true;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl EerRelationship {
    pub fn new(
        name: impl Into<String>,
        entity1: impl Into<String>,
        entity2: impl Into<String>,
        mult1: Option<Multiplicity>,
        mult2: Option<Multiplicity>,
        weak: bool,
    ) -> Self {
        Self {
            name: name.into(),
            entity1: entity1.into(),
            entity2: entity2.into(),
            mult1,
            mult2,
            weak,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: EerAttribute) {
        self.attributes.push(attribute);
    }

    pub fn with_attribute(mut self, attribute: EerAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }
}

impl Multiplicity {
    pub fn new(lower: impl Into<String>, upper: Option<String>) -> Self {
        Self {
            lower: lower.into(),
            upper,
        }
    }

    /// `(lower)`
    pub fn one(lower: impl Into<String>) -> Self {
        Self::new(lower, None)
    }

    /// `(lower, upper)`
    pub fn range(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self::new(lower, Some(upper.into()))
    }

    pub fn many() -> Self {
        Self::range("0", "n")
    }

    pub fn is_many(&self) -> bool {
        self.lower == "n" || self.upper.as_deref() == Some("n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags() {
        let attr = EerAttribute::new("name").optional();
        assert_eq!(attr.name, "name");
        assert!(!attr.multi_valued);
        assert!(!attr.derived);
        assert!(attr.optional);
    }

    #[test]
    fn test_entity_constraints() {
        let mut entity = EerEntity::weak("Professor");
        assert!(entity.weak);
        entity.set_weak(false);
        assert!(!entity.weak);

        entity.add_attribute(EerAttribute::new("name"));
        entity.add_attribute(EerAttribute::new("pid"));
        assert_eq!(entity.attributes.len(), 2);

        assert_eq!(entity.identifier(), None);
        entity.set_identifier(["pid", "name"]);
        assert_eq!(entity.identifier(), Some(&["pid".to_string(), "name".to_string()][..]));

        assert!(!entity.is_inherited_from());
        assert!(matches!(
            entity.inheritance_constraint(),
            Err(ModelError::PreconditionViolation(_))
        ));

        entity.set_inheritance("Person", true, false);
        let inh = entity.inheritance_constraint().unwrap();
        assert_eq!(inh.parent, "Person");
        assert!(inh.disjoint);
        assert!(!inh.covering);
    }

    #[test]
    fn test_multiplicity_many() {
        assert!(Multiplicity::range("0", "n").is_many());
        assert!(Multiplicity::one("n").is_many());
        assert!(!Multiplicity::one("1").is_many());
        assert!(!Multiplicity::range("0", "1").is_many());
    }

    #[test]
    fn test_model_rejects_duplicates() {
        let mut model = EerModel::new();
        model.add_entity(EerEntity::new("Professor")).unwrap();
        assert!(matches!(
            model.add_entity(EerEntity::new("Professor")),
            Err(ModelError::DuplicateName { .. })
        ));

        let rel = EerRelationship::new(
            "WORK",
            "Professor",
            "Department",
            Some(Multiplicity::range("0", "n")),
            Some(Multiplicity::one("1")),
            true,
        );
        model.add_relationship(rel.clone()).unwrap();
        assert!(model.add_relationship(rel).is_err());
        assert_eq!(model.relationships()[0].name, "WORK");
        assert_eq!(model.entities()[0].name, "Professor");
    }

    #[test]
    fn test_resolved_identifier_inherits() {
        let mut model = EerModel::new();
        model
            .add_entity(EerEntity::new("Person").with_identifier(["ssn"]))
            .unwrap();
        model
            .add_entity(EerEntity::new("Student").with_inheritance("Person", true, false))
            .unwrap();
        model
            .add_entity(EerEntity::new("Postgrad").with_inheritance("Student", false, false))
            .unwrap();

        assert_eq!(model.resolved_identifier("Postgrad").unwrap(), &["ssn".to_string()]);
    }

    #[test]
    fn test_resolved_identifier_missing() {
        let mut model = EerModel::new();
        model.add_entity(EerEntity::new("Orphan")).unwrap();
        assert!(matches!(
            model.resolved_identifier("Orphan"),
            Err(ModelError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_resolved_identifier_cycle() {
        let mut model = EerModel::new();
        model
            .add_entity(EerEntity::new("A").with_inheritance("B", false, false))
            .unwrap();
        model
            .add_entity(EerEntity::new("B").with_inheritance("A", false, false))
            .unwrap();
        let err = model.resolved_identifier("A").unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_resolved_identifier_unknown_parent() {
        let mut model = EerModel::new();
        model
            .add_entity(EerEntity::new("Student").with_inheritance("Person", false, false))
            .unwrap();
        assert!(matches!(
            model.resolved_identifier("Student"),
            Err(ModelError::UnresolvedReference { .. })
        ));
    }
}
