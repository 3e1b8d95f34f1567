//! Substitution context: everything a run knows, turned into token values.
//!
//! [`SubstitutionContext::to_substitutions`] is pure: the same context always
//! yields the same [`SubstitutionSet`]. Every date token derives from the one
//! captured instant, so they agree with each other within a run.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use quill_core::timestamp;
use quill_core::types::{ChainedFields, EntityName, Identity, TemplateKind};

use crate::token::{SubstitutionSet, Token};

pub const TIME_STAMP: &str = "TIME STAMP";
pub const LONG_DATE: &str = "LONG DATE";
pub const SHORT_DATE: &str = "SHORT DATE";
pub const YEAR: &str = "YEAR";
pub const FIRST_NAME: &str = "FIRST_NAME";
pub const LAST_NAME: &str = "LAST_NAME";
pub const CONTACT: &str = "CONTACT";
pub const ENTITY: &str = "ENTITY";
pub const LAST_WE_SPOKE: &str = "LAST WE SPOKE";
pub const GOALS: &str = "GOALS";
pub const PROPOSED_ACTIONS: &str = "PROPOSED ACTIONS";
pub const ENV_NAME: &str = "ENV_NAME";

const LONG_DATE_FORMAT: &str = "%A, %d %B %Y";
const SHORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Inputs to the placeholder resolver.
#[derive(Debug, Clone)]
pub struct SubstitutionContext {
    pub kind: TemplateKind,
    /// The single instant captured at the start of the run.
    pub captured_at: NaiveDateTime,
    pub identity: Identity,
    /// Target entity for chained kinds.
    pub entity: Option<EntityName>,
    /// Project name for scaffolds.
    pub project_name: Option<String>,
    /// Fields carried from the predecessor; `None` means first of series.
    pub chained: Option<ChainedFields>,
    /// Extra literal tokens from configuration, `NAME` → value.
    pub extra: BTreeMap<String, String>,
}

impl SubstitutionContext {
    pub fn new(kind: TemplateKind, captured_at: NaiveDateTime, identity: Identity) -> Self {
        SubstitutionContext {
            kind,
            captured_at,
            identity,
            entity: None,
            project_name: None,
            chained: None,
            extra: BTreeMap::new(),
        }
    }

    /// Build the ordered substitution set for this context.
    pub fn to_substitutions(&self) -> SubstitutionSet {
        let mut set = SubstitutionSet::new();
        let at = &self.captured_at;

        set.push(Token::named(TIME_STAMP), timestamp::format(at));
        set.push(Token::named(LONG_DATE), at.format(LONG_DATE_FORMAT).to_string());
        set.push(Token::named(SHORT_DATE), at.format(SHORT_DATE_FORMAT).to_string());
        set.push(Token::named(YEAR), at.format("%Y").to_string());
        set.push(Token::named(FIRST_NAME), self.identity.first_name.clone());
        set.push(Token::named(LAST_NAME), self.identity.last_name.clone());
        set.push(Token::named(CONTACT), self.identity.contact.clone());

        match self.kind {
            TemplateKind::RelationshipLog => {
                let entity = self.entity.as_ref().map(|e| e.0.clone()).unwrap_or_default();
                let fields = self.chained.clone().unwrap_or_default();
                set.push(Token::named(ENTITY), entity);
                set.push(Token::named(LAST_WE_SPOKE), fields.last_we_spoke);
                set.push(Token::named(GOALS), fields.goals);
                set.push(Token::named(PROPOSED_ACTIONS), fields.proposed_actions);
            }
            TemplateKind::ProjectScaffold => {
                set.push(
                    Token::named(ENV_NAME),
                    self.project_name.clone().unwrap_or_default(),
                );
            }
            TemplateKind::Meeting | TemplateKind::Daily => {}
        }

        for (name, value) in &self.extra {
            set.push(Token::named(name), value.clone());
        }
        set
    }
}
