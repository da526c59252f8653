use pretty_assertions::assert_eq;
use viker::arm::{ArmAttribute, ArmConstraint, ArmModel};
use viker::eer::EerModel;
use viker::error::{DiagnosticKind, ModelError};
use viker::parser::{parse_arm, parse_eer};
use viker::transform::{ForwardOptions, arm_to_eer, eer_to_arm, eer_to_arm_with};

fn forward(source: &str) -> ArmModel {
    let eer = parse_eer(source).unwrap();
    let out = eer_to_arm(&eer).unwrap();
    assert!(out.is_clean(), "unexpected diagnostics: {:?}", out.diagnostics);
    out.model
}

fn reverse(source: &str) -> EerModel {
    let arm = parse_arm(source).unwrap();
    arm_to_eer(&arm).unwrap().model
}

#[test]
fn test_one_to_many_department_references_professor() {
    let arm = forward(
        r#"
        entity Professor {
            pnum
            identifier(pnum)
        }
        entity Department {
            dcode
            identifier(dcode)
        }
        rel Works {
            ent(Department) (1, n)
            ent(Professor) (1)
        }
        "#,
    );

    let expected = "\
relation Professor {
    self OID
    pnum anyType
    primary_key(self)
    pathfd(pnum) -> self
    disjoint(Department)
}

relation Department {
    self      OID
    dcode     anyType
    professor OID
    primary_key(self)
    pathfd(dcode) -> self
    foreign_key professor(professor) references Professor
    disjoint(Professor)
}
";
    assert_eq!(arm.to_string(), expected);
}

#[test]
fn test_one_to_many_key_follows_listed_many_side() {
    let arm = forward(
        r#"
        entity Professor {
            pnum
            identifier(pnum)
        }
        entity Department {
            dcode
            identifier(dcode)
        }
        rel Works {
            ent(Professor) (1, n)
            ent(Department) (1)
        }
        "#,
    );

    let professor = arm.find_entity("Professor").unwrap();
    assert_eq!(professor.find_attribute("department"), Some(&ArmAttribute::oid("department")));
    assert_eq!(
        professor.foreign_keys().collect::<Vec<_>>(),
        vec![("department", "department", "Department")]
    );

    let department = arm.find_entity("Department").unwrap();
    assert_eq!(department.foreign_keys().count(), 0);
    assert!(department.find_attribute("professor").is_none());
}

#[test]
fn test_part_supplier_rendering() {
    let arm = forward(
        r#"
        entity Supplier {
            sname
            identifier(sname)
        }
        entity Part {
            pid
            identifier(pid)
        }
        rel Supplies {
            ent(Supplier) (0, n)
            ent(Part) (0, n)
            price
        }
        "#,
    );

    let expected = "\
relation Supplier {
    self  OID
    sname anyType
    primary_key(self)
    pathfd(sname) -> self
    disjoint(Part, Supplies)
}

relation Part {
    self OID
    pid  anyType
    primary_key(self)
    pathfd(pid) -> self
    disjoint(Supplier, Supplies)
}

relation Supplies {
    self     OID
    supplier anyType
    part     anyType
    price    anyType
    primary_key(self)
    pathfd(supplier, part) -> self
    foreign_key supplier(supplier) references Supplier
    foreign_key part(part) references Part
    disjoint(Supplier, Part)
}
";
    assert_eq!(arm.to_string(), expected);
    assert_eq!(parse_arm(expected).unwrap(), arm);
}

#[test]
fn test_weak_entity_key_includes_owner() {
    let source = r#"
        entity Loan {
            lid
            identifier(lid)
        }
        weak entity Payment {
            paytime
            amount
            identifier(paytime)
        }
        weak rel Pays {
            ent(Payment) (1, n)
            ent(Loan) (1)
        }
    "#;
    let arm = forward(source);

    let payment = arm.find_entity("Payment").unwrap();
    assert_eq!(
        payment.path_fd_to_self().unwrap(),
        &["paytime".to_string(), "loan".to_string()]
    );
    assert_eq!(
        payment.foreign_keys().collect::<Vec<_>>(),
        vec![("loan", "loan", "Loan")]
    );

    // The weak structure comes back when the output is mapped in reverse.
    let eer = arm_to_eer(&arm).unwrap().model;
    let payment = eer.find_entity("Payment").unwrap();
    assert!(payment.weak);
    assert_eq!(payment.identifier().unwrap(), &["paytime".to_string()]);
    let pays = eer.find_relationship("Payment_loan").unwrap();
    assert!(pays.weak);
    assert_eq!((pays.entity1.as_str(), pays.entity2.as_str()), ("Payment", "Loan"));
}

#[test]
fn test_disjointness_is_symmetric() {
    let arm = forward(
        r#"
        entity Person {
            ssn
            identifier(ssn)
        }
        entity Student {
            sid
            isa(Person) disjoint covering
        }
        entity Lecturer {
            room
            isa(Person) disjoint
        }
        entity Tutor {
            hours
            isa(Person) disjoint
        }
        "#,
    );

    for relation in arm.relations() {
        for other in relation.disjoint_with().unwrap_or_default() {
            let other = arm.find_entity(other).unwrap();
            assert!(
                other.disjoint_with().unwrap_or_default().contains(&relation.name),
                "{} lists {} but not the reverse",
                relation.name,
                other.name
            );
        }
    }

    let person = arm.find_entity("Person").unwrap();
    assert_eq!(person.covered_by().unwrap(), &["Student".to_string()]);
    assert_eq!(person.disjoint_with(), None);

    let student = arm.find_entity("Student").unwrap();
    assert_eq!(student.parent(), Some("Person"));
    assert_eq!(student.path_fd_to_self().unwrap(), &["ssn".to_string()]);
}

#[test]
fn test_every_relation_has_surrogate_key() {
    let arm = forward(
        r#"
        entity A {
            a
            identifier(a)
        }
        entity B {
            b
            identifier(b)
        }
        rel Links {
            ent(A) (0, n)
            ent(B) (0, n)
        }
        rel Owns {
            ent(A) (1)
            ent(B) (0, n)
        }
        "#,
    );

    assert_eq!(arm.len(), 3);
    for relation in arm.relations() {
        assert_eq!(relation.attributes[0], ArmAttribute::oid("self"));
        assert!(
            relation.constraints.contains(&ArmConstraint::primary_key("self")),
            "{} lacks primary_key(self)",
            relation.name
        );
        assert!(relation.path_fd_to_self().is_some());
    }
}

#[test]
fn test_open_world_skips_implicit_disjointness() {
    let eer = parse_eer("entity A { a identifier(a) }\nentity B { b identifier(b) }").unwrap();

    let closed = eer_to_arm(&eer).unwrap().model;
    assert_eq!(closed.find_entity("A").unwrap().disjoint_with().unwrap(), &["B".to_string()]);

    let open = eer_to_arm_with(
        &eer,
        &ForwardOptions {
            implicit_disjointness: false,
        },
    )
    .unwrap()
    .model;
    assert_eq!(open.find_entity("A").unwrap().disjoint_with(), None);
}

#[test]
fn test_unset_multiplicity_is_reported() {
    let eer = parse_eer(
        r#"
        entity A {
            a
            identifier(a)
        }
        entity B {
            b
            identifier(b)
        }
        rel R {
            ent(A)
            ent(B) (1)
        }
        "#,
    )
    .unwrap();
    let out = eer_to_arm(&eer).unwrap();
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnclassifiableRelationship);
    assert_eq!(out.diagnostics[0].subject, "R");
    assert_eq!(out.model.find_entity("A").unwrap().foreign_keys().count(), 0);
    assert_eq!(out.model.find_entity("B").unwrap().foreign_keys().count(), 0);
}

#[test]
fn test_reverse_classification_by_key_shape() {
    let eer = reverse(
        r#"
        relation Part {
            self  OID
            pid   anyType
            pname anyType
            primary_key(self)
            pathfd(pid, pname) -> self
        }
        relation Supplier {
            self  OID
            sname anyType
            primary_key(self)
            pathfd(sname) -> self
        }
        relation Supplies {
            self     OID
            supplier OID
            part     OID
            price    anyType
            primary_key(self)
            pathfd(supplier, part) -> self
            foreign_key supplier(supplier) references Supplier
            foreign_key part(part) references Part
        }
        relation Shipment {
            self     OID
            shipno   anyType
            supplier OID
            primary_key(self)
            pathfd(shipno, supplier) -> self
            foreign_key supplier(supplier) references Supplier
        }
        "#,
    );

    let part = eer.find_entity("Part").unwrap();
    assert!(!part.weak);
    assert_eq!(part.identifier().unwrap().len(), 2);

    assert!(eer.find_entity("Supplies").is_none());
    let supplies = eer.find_relationship("Supplies").unwrap();
    assert_eq!((supplies.entity1.as_str(), supplies.entity2.as_str()), ("Supplier", "Part"));
    assert_eq!(supplies.attributes.len(), 1);

    let shipment = eer.find_entity("Shipment").unwrap();
    assert!(shipment.weak);
    assert_eq!(shipment.identifier().unwrap(), &["shipno".to_string()]);
}

#[test]
fn test_reverse_rendering() {
    let eer = reverse(
        r#"
        relation Loan {
            self OID
            lid  anyType
            primary_key(self)
            pathfd(lid) -> self
        }
        relation Payment {
            self    OID
            paytime anyType
            loan    OID
            primary_key(self)
            pathfd(paytime, loan) -> self
            foreign_key loan(loan) references Loan
        }
        "#,
    );

    let expected = "\
entity Loan {
    lid
    identifier(lid)
}

weak entity Payment {
    paytime
    identifier(paytime)
}

weak rel Payment_loan {
    ent(Payment) (0, n)
    ent(Loan) (1)
}
";
    assert_eq!(eer.to_string(), expected);
}

#[test]
fn test_reverse_unresolved_foreign_key() {
    let arm = parse_arm(
        r#"
        relation Payment {
            self OID
            loan OID
            primary_key(self)
            pathfd(loan) -> self
            foreign_key loan(loan) references Loan
        }
        "#,
    )
    .unwrap();
    assert_eq!(
        arm_to_eer(&arm).unwrap_err(),
        ModelError::UnresolvedReference {
            context: "foreign key loan of relation Payment".to_string(),
            name: "Loan".to_string(),
        }
    );
}

#[test]
fn test_missing_identifier_aborts_forward() {
    let eer = parse_eer("entity Orphan { x }").unwrap();
    assert!(matches!(
        eer_to_arm(&eer),
        Err(ModelError::PreconditionViolation(_))
    ));
}

#[test]
fn test_keyword_named_entities_reload() {
    let arm = forward(
        r#"
        entity Isa {
            ent
            identifier(ent)
        }
        entity Item {
            code
            identifier(code)
        }
        rel Tags {
            ent(Item) (0, n)
            ent(Isa) (1)
        }
        "#,
    );

    let item = arm.find_entity("Item").unwrap();
    assert_eq!(item.parent(), None);
    assert_eq!(item.find_attribute("isa"), Some(&ArmAttribute::oid("isa")));
    assert_eq!(item.foreign_keys().collect::<Vec<_>>(), vec![("isa", "isa", "Isa")]);
    assert_eq!(parse_arm(&arm.to_string()).unwrap(), arm);

    let eer = arm_to_eer(&arm).unwrap().model;
    assert_eq!(parse_eer(&eer.to_string()).unwrap(), eer);
}
