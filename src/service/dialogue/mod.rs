pub mod model;

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use model::{Action, CHOSE_ROLE_PREFIX, SET_LANGUAGE_PREFIX, VIEW_FAQ_ANSWER_PREFIX};

use crate::service::language::Language;

static ROLE_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*([a-z_]+)\*$").expect("static regex"));

enum Pattern {
    /// Payload must equal the prefix.
    Exact(Action),
    /// Payload is the prefix followed by a parameter.
    Suffixed(fn(&str) -> Option<Action>),
}

struct Route {
    prefix: &'static str,
    pattern: Pattern,
}

impl Route {
    fn specificity(&self) -> usize {
        self.prefix.len()
    }

    fn resolve(&self, data: &str) -> Option<Action> {
        let suffix = data.strip_prefix(self.prefix)?;
        match &self.pattern {
            Pattern::Exact(action) if suffix.is_empty() => Some(action.clone()),
            Pattern::Exact(_) => None,
            Pattern::Suffixed(parse) => parse(suffix),
        }
    }
}

fn parse_language(suffix: &str) -> Option<Action> {
    Language::from_str(suffix).ok().map(Action::SetLanguage)
}

fn parse_faq_id(suffix: &str) -> Option<Action> {
    suffix.parse::<i64>().ok().filter(|id| *id > 0).map(Action::ViewFaqAnswer)
}

fn parse_role(suffix: &str) -> Option<Action> {
    ROLE_SUFFIX_REGEX
        .captures(suffix)
        .map(|caps| Action::ChoseUserToAddRole(caps[1].to_string()))
}

/// Callback payload table, ordered once so the most specific pattern is tried first.
pub struct CallbackRegistry {
    routes: Vec<Route>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        let mut routes: Vec<Route> = Action::FIXED
            .iter()
            .map(|action| Route {
                prefix: action.tag().as_str(),
                pattern: Pattern::Exact(action.clone()),
            })
            .collect();

        routes.push(Route {
            prefix: SET_LANGUAGE_PREFIX,
            pattern: Pattern::Suffixed(parse_language),
        });
        routes.push(Route {
            prefix: VIEW_FAQ_ANSWER_PREFIX,
            pattern: Pattern::Suffixed(parse_faq_id),
        });
        routes.push(Route {
            prefix: CHOSE_ROLE_PREFIX,
            pattern: Pattern::Suffixed(parse_role),
        });

        routes.sort_by(|a, b| b.specificity().cmp(&a.specificity()));

        Self { routes }
    }

    pub fn resolve(&self, data: &str) -> Option<Action> {
        self.routes.iter().find_map(|route| route.resolve(data))
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}
