//! ARM -> EER mapping.
//!
//! Only the structure encoded by natural keys and foreign keys is recovered.
//! Inheritance, cover and disjointness constraints are not mapped back, and
//! relationship multiplicities are defaults rather than discovered facts.

use super::Transformed;
use crate::arm::{ArmEntity, ArmModel, OID_TYPE, SELF_ATTRIBUTE};
use crate::eer::{EerAttribute, EerEntity, EerModel, EerRelationship, Multiplicity};
use crate::error::{Diagnostic, DiagnosticKind, Result};
use tracing::{debug, info, warn};

pub fn arm_to_eer(arm: &ArmModel) -> Result<Transformed<EerModel>> {
    for relation in arm.relations() {
        for (name, _, references) in relation.foreign_keys() {
            arm.index().resolve(references, || {
                format!("foreign key {} of relation {}", name, relation.name)
            })?;
        }
    }

    let mut eer = EerModel::new();
    let mut diagnostics = Vec::new();

    for relation in arm.relations() {
        map_relation(relation, &mut eer, &mut diagnostics)?;
    }

    info!(
        relations = arm.len(),
        entities = eer.entities().len(),
        relationships = eer.relationships().len(),
        diagnostics = diagnostics.len(),
        "mapped ARM schema to EER"
    );

    Ok(Transformed {
        model: eer,
        diagnostics,
    })
}

fn diagnose(diagnostics: &mut Vec<Diagnostic>, kind: DiagnosticKind, subject: &str, message: String) {
    warn!(kind = kind.as_str(), subject, "{message}");
    diagnostics.push(Diagnostic::new(kind, subject, message));
}

struct ForeignKey<'a> {
    name: &'a str,
    attribute: &'a str,
    references: &'a str,
}

fn map_relation(relation: &ArmEntity, eer: &mut EerModel, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
    let pk: Vec<&str> = match relation.path_fd_to_self() {
        Some(attributes) => attributes.iter().map(|s| s.as_str()).collect(),
        None => {
            diagnose(
                diagnostics,
                DiagnosticKind::MissingNaturalKey,
                &relation.name,
                "no pathfd targets self; mapped as an entity without identifier".into(),
            );
            Vec::new()
        }
    };

    let fks: Vec<ForeignKey<'_>> = relation
        .foreign_keys()
        .map(|(name, attribute, references)| ForeignKey {
            name,
            attribute,
            references,
        })
        .collect();
    let is_fk = |attr: &str| fks.iter().any(|fk| fk.attribute == attr);

    let (identifying, plain_fks): (Vec<&ForeignKey<'_>>, Vec<&ForeignKey<'_>>) =
        fks.iter().partition(|fk| pk.contains(&fk.attribute));

    let k = pk.len();
    let h = pk.iter().filter(|a| is_fk(a)).count();

    let attributes: Vec<EerAttribute> = relation
        .attributes
        .iter()
        .filter(|a| a.name != SELF_ATTRIBUTE && a.data_type != OID_TYPE && !is_fk(&a.name))
        .map(|a| EerAttribute::new(&a.name))
        .collect();

    if h == 0 {
        debug!(relation = %relation.name, k, "strong entity");
        let mut entity = EerEntity::new(&relation.name);
        entity.attributes = attributes;
        if k > 0 {
            entity.set_identifier(pk.iter().copied());
        }
        eer.add_entity(entity)?;
    } else if h == k {
        debug!(relation = %relation.name, k, "relationship");
        let mut tables: Vec<&str> = Vec::new();
        for fk in &identifying {
            if !tables.contains(&fk.references) {
                tables.push(fk.references);
            }
        }
        if tables.len() > 2 {
            diagnose(
                diagnostics,
                DiagnosticKind::UnsupportedArity,
                &relation.name,
                format!("identifier references {} relations; only binary relationships are mapped", tables.len()),
            );
            return Ok(());
        }
        let entity1 = tables[0];
        let entity2 = tables.get(1).copied().unwrap_or(entity1);

        let mut rel = EerRelationship::new(
            &relation.name,
            entity1,
            entity2,
            Some(Multiplicity::many()),
            Some(Multiplicity::many()),
            false,
        );
        rel.attributes = attributes;

        // A relationship cannot hold a reference of its own.
        for fk in &plain_fks {
            rel.add_attribute(EerAttribute::new(fk.attribute));
            diagnose(
                diagnostics,
                DiagnosticKind::UnmappedForeignKey,
                &relation.name,
                format!(
                    "foreign key {} to {} kept as plain attribute {}",
                    fk.name, fk.references, fk.attribute
                ),
            );
        }
        eer.add_relationship(rel)?;
        return Ok(());
    } else {
        debug!(relation = %relation.name, k, h, "weak entity");
        let mut entity = EerEntity::weak(&relation.name);
        entity.attributes = attributes;
        entity.set_identifier(pk.iter().copied().filter(|a| !is_fk(a)));
        eer.add_entity(entity)?;

        for fk in &identifying {
            eer.add_relationship(EerRelationship::new(
                format!("{}_{}", relation.name, fk.name),
                &relation.name,
                fk.references,
                Some(Multiplicity::many()),
                Some(Multiplicity::one("1")),
                true,
            ))?;
        }
    }

    for fk in &plain_fks {
        eer.add_relationship(EerRelationship::new(
            format!("{}_{}", relation.name, fk.name),
            &relation.name,
            fk.references,
            Some(Multiplicity::many()),
            Some(Multiplicity::one("1")),
            false,
        ))?;
    }
    Ok(())
}
