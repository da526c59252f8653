//! Serializer for rendering schema models as text documents.
//!
//! The output is the same block syntax the parser reads, so a rendered model
//! loads back into an equal model.

use crate::arm::{ArmConstraint, ArmEntity, ArmModel};
use crate::eer::{EerAttribute, EerEntity, EerModel, EerRelationship, Multiplicity};
use crate::measure::ColumnMetrics;
use crate::parser::Document;
use std::fmt;

/// Render an EER model: entities first, then relationships.
pub fn render_eer(model: &EerModel) -> String {
    let metrics = ColumnMetrics::default();
    let mut blocks: Vec<String> = Vec::new();

    for entity in model.entities() {
        blocks.push(render_entity(&metrics, entity));
    }
    for rel in model.relationships() {
        blocks.push(render_relationship(&metrics, rel));
    }

    blocks.join("\n")
}

/// Render an ARM model, one block per relation.
pub fn render_arm(model: &ArmModel) -> String {
    let metrics = ColumnMetrics::default();
    model
        .relations()
        .iter()
        .map(|r| render_relation(&metrics, r))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_entity(metrics: &ColumnMetrics, entity: &EerEntity) -> String {
    let mut output = String::new();
    if entity.weak {
        output.push_str("weak ");
    }
    output.push_str(&format!("entity {} {{\n", entity.name));

    render_eer_attributes(&mut output, metrics, &entity.attributes);

    if let Some(id) = entity.identifier() {
        output.push_str(&format!("    identifier({})\n", id.join(", ")));
    }
    if let Some(inh) = &entity.inheritance {
        output.push_str(&format!("    isa({})", inh.parent));
        if inh.disjoint {
            output.push_str(" disjoint");
        }
        if inh.covering {
            output.push_str(" covering");
        }
        output.push('\n');
    }

    output.push_str("}\n");
    output
}

fn render_relationship(metrics: &ColumnMetrics, rel: &EerRelationship) -> String {
    let mut output = String::new();
    if rel.weak {
        output.push_str("weak ");
    }
    output.push_str(&format!("rel {} {{\n", rel.name));

    for (entity, mult) in [(&rel.entity1, &rel.mult1), (&rel.entity2, &rel.mult2)] {
        output.push_str(&format!("    ent({})", entity));
        if let Some(mult) = mult {
            output.push(' ');
            output.push_str(&render_multiplicity(mult));
        }
        output.push('\n');
    }

    render_eer_attributes(&mut output, metrics, &rel.attributes);

    output.push_str("}\n");
    output
}

fn render_eer_attributes(output: &mut String, metrics: &ColumnMetrics, attributes: &[EerAttribute]) {
    let width = metrics.name_column_width(attributes.iter().map(|a| a.name.as_str()));
    for attr in attributes {
        let mut flags: Vec<&str> = Vec::new();
        if attr.multi_valued {
            flags.push("multi_valued");
        }
        if attr.derived {
            flags.push("derived");
        }
        if attr.optional {
            flags.push("optional");
        }
        output.push_str(&metrics.row(&attr.name, &flags.join(" "), width));
        output.push('\n');
    }
}

pub fn render_multiplicity(mult: &Multiplicity) -> String {
    match &mult.upper {
        Some(upper) => format!("({}, {})", mult.lower, upper),
        None => format!("({})", mult.lower),
    }
}

fn render_relation(metrics: &ColumnMetrics, relation: &ArmEntity) -> String {
    let mut output = format!("relation {} {{\n", relation.name);

    let width = metrics.name_column_width(relation.attributes.iter().map(|a| a.name.as_str()));
    for attr in &relation.attributes {
        output.push_str(&metrics.row(&attr.name, &attr.data_type, width));
        output.push('\n');
    }

    for constraint in &relation.constraints {
        render_constraint(&mut output, constraint);
    }

    output.push_str("}\n");
    output
}

fn render_constraint(output: &mut String, constraint: &ArmConstraint) {
    match constraint {
        ArmConstraint::PrimaryKey { attribute } => {
            output.push_str(&format!("    primary_key({})\n", attribute));
        }
        ArmConstraint::ForeignKey {
            name,
            attribute,
            references,
        } => {
            output.push_str(&format!(
                "    foreign_key {}({}) references {}\n",
                name, attribute, references
            ));
        }
        ArmConstraint::PathFd { attributes, target } => {
            output.push_str(&format!("    pathfd({}) -> {}\n", attributes.join(", "), target));
        }
        ArmConstraint::Inheritance { parent } => {
            output.push_str(&format!("    isa({})\n", parent));
        }
        ArmConstraint::Cover { covered_by } => {
            output.push_str(&format!("    cover({})\n", covered_by.join(", ")));
        }
        ArmConstraint::Disjointness { disjoint_with } => {
            output.push_str(&format!("    disjoint({})\n", disjoint_with.join(", ")));
        }
    }
}

impl fmt::Display for EerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_eer(self))
    }
}

impl fmt::Display for ArmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_arm(self))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Eer(model) => model.fmt(f),
            Document::Arm(model) => model.fmt(f),
        }
    }
}
