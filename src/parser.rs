use crate::arm::{ANY_TYPE, ArmAttribute, ArmConstraint, ArmEntity, ArmModel};
use crate::eer::{EerAttribute, EerEntity, EerModel, EerRelationship, Multiplicity};
use crate::error::ModelError;
use crate::lexer::{LexError, Lexeme, Lexer, Token};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token {found:?} on line {line}, expected {expected}")]
    Unexpected {
        found: Token,
        expected: &'static str,
        line: usize,
    },
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("Line {0}: EER and ARM blocks cannot be mixed in one document")]
    MixedDocument(usize),
    #[error("Document contains no entity, rel or relation block")]
    EmptyDocument,
    #[error("Entity {entity} declares more than one {constraint} constraint")]
    DuplicateConstraint {
        entity: String,
        constraint: &'static str,
    },
    #[error("Relationship {relationship} must have exactly two participants, found {found}")]
    Participants { relationship: String, found: usize },
}

/// A loaded schema of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Eer(EerModel),
    Arm(ArmModel),
}

impl Document {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Eer(_) => "EER",
            Self::Arm(_) => "ARM",
        }
    }

    pub fn into_eer(self) -> Result<EerModel, ModelError> {
        match self {
            Self::Eer(model) => Ok(model),
            other => Err(ModelError::TypeMismatch {
                expected: "EER",
                found: other.kind(),
            }),
        }
    }

    pub fn into_arm(self) -> Result<ArmModel, ModelError> {
        match self {
            Self::Arm(model) => Ok(model),
            other => Err(ModelError::TypeMismatch {
                expected: "ARM",
                found: other.kind(),
            }),
        }
    }
}

pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    Parser::new(input)?.parse()
}

pub fn parse_eer(input: &str) -> Result<EerModel, ParseError> {
    Ok(parse_document(input)?.into_eer()?)
}

pub fn parse_arm(input: &str) -> Result<ArmModel, ParseError> {
    Ok(parse_document(input)?.into_arm()?)
}

static EOF: Lexeme = Lexeme {
    token: Token::Eof,
    line: 0,
};

pub struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn lexeme(&self, offset: usize) -> &Lexeme {
        self.tokens.get(self.pos + offset).unwrap_or(&EOF)
    }

    fn peek(&self) -> &Token {
        &self.lexeme(0).token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.lexeme(offset).token
    }

    fn line(&self) -> usize {
        self.lexeme(0).line
    }

    fn advance(&mut self) -> Lexeme {
        let lexeme = self.lexeme(0).clone();
        self.pos += 1;
        lexeme
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            found: self.peek().clone(),
            expected,
            line: self.line(),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), ParseError> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn check_ident(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s == name)
    }

    /// The next token is an identifier that starts on `line`.
    fn ident_on_line(&self, line: usize) -> Option<&str> {
        match self.lexeme(0) {
            Lexeme {
                token: Token::Ident(s),
                line: l,
            } if *l == line => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn parse(&mut self) -> Result<Document, ParseError> {
        let mut document: Option<Document> = None;

        while *self.peek() != Token::Eof {
            let line = self.line();
            if self.check_ident("relation") {
                self.advance();
                let relation = self.parse_relation()?;
                arm_document(&mut document, line)?.add_relation(relation)?;
                continue;
            }

            let weak = self.check_ident("weak");
            if weak {
                self.advance();
            }
            if self.check_ident("entity") {
                self.advance();
                let entity = self.parse_entity(weak)?;
                eer_document(&mut document, line)?.add_entity(entity)?;
            } else if self.check_ident("rel") {
                self.advance();
                let relationship = self.parse_relationship(weak)?;
                eer_document(&mut document, line)?.add_relationship(relationship)?;
            } else if weak {
                return Err(self.unexpected("entity or rel after weak"));
            } else {
                return Err(self.unexpected("entity, weak, rel or relation"));
            }
        }

        document.ok_or(ParseError::EmptyDocument)
    }

    fn parse_entity(&mut self, weak: bool) -> Result<EerEntity, ParseError> {
        let name = self.expect_ident("entity name")?;
        self.expect(Token::LBrace, "`{`")?;

        let mut entity = if weak {
            EerEntity::weak(name)
        } else {
            EerEntity::new(name)
        };

        while *self.peek() != Token::RBrace {
            if self.check_ident("identifier") && *self.peek_at(1) == Token::LParen {
                self.advance();
                if entity.identifier.is_some() {
                    return Err(ParseError::DuplicateConstraint {
                        entity: entity.name,
                        constraint: "identifier",
                    });
                }
                let attributes = self.parse_name_list()?;
                entity.set_identifier(attributes);
            } else if self.check_ident("isa") && *self.peek_at(1) == Token::LParen {
                let line = self.line();
                self.advance();
                if entity.inheritance.is_some() {
                    return Err(ParseError::DuplicateConstraint {
                        entity: entity.name,
                        constraint: "inheritance",
                    });
                }
                let parent = self.parse_parenthesized("parent entity name")?;
                let mut disjoint = false;
                let mut covering = false;
                while let Some(flag) = self.ident_on_line(line) {
                    match flag {
                        "disjoint" => disjoint = true,
                        "covering" => covering = true,
                        _ => break,
                    }
                    self.advance();
                }
                entity.set_inheritance(parent, disjoint, covering);
            } else {
                entity.add_attribute(self.parse_eer_attribute()?);
            }
        }

        self.expect(Token::RBrace, "`}`")?;
        Ok(entity)
    }

    fn parse_eer_attribute(&mut self) -> Result<EerAttribute, ParseError> {
        let line = self.line();
        let mut attribute = EerAttribute::new(self.expect_ident("attribute name")?);

        while let Some(flag) = self.ident_on_line(line) {
            match flag {
                "multi_valued" => attribute.multi_valued = true,
                "derived" => attribute.derived = true,
                "optional" => attribute.optional = true,
                _ => break,
            }
            self.advance();
        }

        Ok(attribute)
    }

    fn parse_relationship(&mut self, weak: bool) -> Result<EerRelationship, ParseError> {
        let name = self.expect_ident("relationship name")?;
        self.expect(Token::LBrace, "`{`")?;

        let mut participants: Vec<(String, Option<Multiplicity>)> = Vec::new();
        let mut attributes = Vec::new();

        while *self.peek() != Token::RBrace {
            if self.check_ident("ent") && *self.peek_at(1) == Token::LParen {
                self.advance();
                let entity = self.parse_parenthesized("participant entity name")?;
                let multiplicity = if *self.peek() == Token::LParen {
                    Some(self.parse_multiplicity()?)
                } else {
                    None
                };
                participants.push((entity, multiplicity));
            } else {
                attributes.push(self.parse_eer_attribute()?);
            }
        }

        self.expect(Token::RBrace, "`}`")?;

        let [(entity1, mult1), (entity2, mult2)]: [_; 2] =
            participants.try_into().map_err(|p: Vec<_>| ParseError::Participants {
                relationship: name.clone(),
                found: p.len(),
            })?;

        let mut relationship = EerRelationship::new(name, entity1, entity2, mult1, mult2, weak);
        relationship.attributes = attributes;
        Ok(relationship)
    }

    fn parse_multiplicity(&mut self) -> Result<Multiplicity, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let lower = self.parse_bound()?;
        let upper = if *self.peek() == Token::Comma {
            self.advance();
            Some(self.parse_bound()?)
        } else {
            None
        };
        self.expect(Token::RParen, "`)`")?;
        Ok(Multiplicity::new(lower, upper))
    }

    fn parse_bound(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Num(n) => {
                self.advance();
                Ok(n.to_string())
            }
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("multiplicity bound (number or n)")),
        }
    }

    fn parse_relation(&mut self) -> Result<ArmEntity, ParseError> {
        let name = self.expect_ident("relation name")?;
        self.expect(Token::LBrace, "`{`")?;

        let mut relation = ArmEntity::new(name);

        while *self.peek() != Token::RBrace {
            let next_is_paren = *self.peek_at(1) == Token::LParen;

            if self.check_ident("primary_key") && next_is_paren {
                self.advance();
                let attribute = self.parse_parenthesized("primary key attribute")?;
                relation.add_constraint(ArmConstraint::primary_key(attribute));
            } else if self.check_ident("foreign_key") && self.at_foreign_key_name() {
                self.advance();
                let fk_name = self.expect_ident("foreign key name")?;
                self.expect(Token::LParen, "`(`")?;
                let attribute = self.expect_ident("foreign key attribute")?;
                self.expect(Token::RParen, "`)`")?;
                if !self.check_ident("references") {
                    return Err(self.unexpected("references"));
                }
                self.advance();
                let references = self.expect_ident("referenced relation")?;
                relation.add_constraint(ArmConstraint::foreign_key(fk_name, attribute, references));
            } else if self.check_ident("pathfd") && next_is_paren {
                self.advance();
                let attributes = self.parse_name_list()?;
                self.expect(Token::Arrow, "`->`")?;
                let target = self.expect_ident("pathfd target")?;
                relation.add_constraint(ArmConstraint::PathFd { attributes, target });
            } else if self.check_ident("isa") && next_is_paren {
                self.advance();
                let parent = self.parse_parenthesized("parent relation")?;
                relation.add_constraint(ArmConstraint::inheritance(parent));
            } else if self.check_ident("cover") && next_is_paren {
                self.advance();
                let covered_by = self.parse_name_list()?;
                relation.add_constraint(ArmConstraint::Cover { covered_by });
            } else if self.check_ident("disjoint") && next_is_paren {
                self.advance();
                let disjoint_with = self.parse_name_list()?;
                relation.add_constraint(ArmConstraint::Disjointness { disjoint_with });
            } else {
                let line = self.line();
                let name = self.expect_ident("attribute name")?;
                let data_type = match self.ident_on_line(line) {
                    Some(t) if !self.at_relation_clause() => {
                        let t = t.to_string();
                        self.advance();
                        t
                    }
                    _ => ANY_TYPE.to_string(),
                };
                relation.add_attribute(ArmAttribute::new(name, data_type));
            }
        }

        self.expect(Token::RBrace, "`}`")?;
        Ok(relation)
    }

    /// Whether the upcoming tokens open a constraint line rather than an attribute.
    ///
    /// Attribute rows never contain `(`, so a keyword only starts a clause
    /// when a parenthesis follows it.
    fn at_relation_clause(&self) -> bool {
        let Token::Ident(word) = self.peek() else {
            return false;
        };
        match word.as_str() {
            "primary_key" | "pathfd" | "isa" | "cover" | "disjoint" => {
                *self.peek_at(1) == Token::LParen
            }
            "foreign_key" => self.at_foreign_key_name(),
            _ => false,
        }
    }

    /// `foreign_key NAME(` with NAME on the keyword's line.
    fn at_foreign_key_name(&self) -> bool {
        let line = self.line();
        matches!(self.lexeme(1), Lexeme { token: Token::Ident(_), line: l } if *l == line)
            && *self.peek_at(2) == Token::LParen
    }

    /// `( NAME )`
    fn parse_parenthesized(&mut self, expected: &'static str) -> Result<String, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let name = self.expect_ident(expected)?;
        self.expect(Token::RParen, "`)`")?;
        Ok(name)
    }

    /// `( [NAME {, NAME}] )`
    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(Token::LParen, "`(`")?;
        let mut list = Vec::new();
        if *self.peek() != Token::RParen {
            list.push(self.expect_ident("name")?);
            while *self.peek() == Token::Comma {
                self.advance();
                list.push(self.expect_ident("name")?);
            }
        }
        self.expect(Token::RParen, "`)`")?;
        Ok(list)
    }
}

fn eer_document(document: &mut Option<Document>, line: usize) -> Result<&mut EerModel, ParseError> {
    match document.get_or_insert_with(|| Document::Eer(EerModel::new())) {
        Document::Eer(model) => Ok(model),
        Document::Arm(_) => Err(ParseError::MixedDocument(line)),
    }
}

fn arm_document(document: &mut Option<Document>, line: usize) -> Result<&mut ArmModel, ParseError> {
    match document.get_or_insert_with(|| Document::Arm(ArmModel::new())) {
        Document::Arm(model) => Ok(model),
        Document::Eer(_) => Err(ParseError::MixedDocument(line)),
    }
}
