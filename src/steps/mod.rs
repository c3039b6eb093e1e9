//! Step registry binding scenario text to handlers.
//!
//! Each definition pairs an anchored regular expression with a handler that
//! receives the capture groups positionally. A step must match exactly one
//! definition; the suite binds every step up front so undefined or ambiguous
//! steps surface before any process runs.

use std::fmt;

use regex::Regex;

use crate::context::World;
use crate::runner::CommandRunner;

mod error;
mod pgo;

pub use error::{FailureKind, RegistryError, StepError};
pub use pgo::{delete_all_clusters_args, pgo_steps};

/// Handler invoked with the world and the captured arguments.
pub type StepHandler<R> = Box<dyn Fn(&mut World<R>, &[String]) -> Result<(), StepError>>;

/// An immutable pattern/handler pair.
pub struct StepDefinition<R: CommandRunner> {
    source: String,
    regex: Regex,
    handler: StepHandler<R>,
}

impl<R: CommandRunner> StepDefinition<R> {
    /// Pattern text as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Number of arguments the handler receives.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    fn captures(&self, text: &str) -> Option<Vec<String>> {
        let captures = self.regex.captures(text)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_owned()))
                .collect(),
        )
    }
}

impl<R: CommandRunner> fmt::Debug for StepDefinition<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.source)
            .finish_non_exhaustive()
    }
}

/// A step line resolved to its definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundStep {
    /// Step text with the Gherkin keyword removed.
    pub text: String,
    /// Index of the matched definition.
    pub definition: usize,
    /// Captured arguments in pattern order.
    pub args: Vec<String>,
}

/// Table of step definitions owned by a suite.
pub struct StepRegistry<R: CommandRunner> {
    definitions: Vec<StepDefinition<R>>,
}

impl<R: CommandRunner> Default for StepRegistry<R> {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }
}

impl<R: CommandRunner> fmt::Debug for StepRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.definitions).finish()
    }
}

impl<R: CommandRunner> StepRegistry<R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `pattern`.
    ///
    /// The pattern is anchored at both ends whether or not it already
    /// carries `^` and `$`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPattern`] when the regex does not
    /// compile and [`RegistryError::ArityMismatch`] when its capture count
    /// differs from `arity`.
    pub fn register<F>(&mut self, pattern: &str, arity: usize, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut World<R>, &[String]) -> Result<(), StepError> + 'static,
    {
        let body = pattern.strip_prefix('^').unwrap_or(pattern);
        let inner = body.strip_suffix('$').unwrap_or(body);
        let regex = Regex::new(&format!("^(?:{inner})$")).map_err(|err| {
            RegistryError::InvalidPattern {
                pattern: pattern.to_owned(),
                message: err.to_string(),
            }
        })?;

        let definition = StepDefinition {
            source: pattern.to_owned(),
            regex,
            handler: Box::new(handler),
        };
        if definition.arity() != arity {
            return Err(RegistryError::ArityMismatch {
                pattern: pattern.to_owned(),
                expected: arity,
                found: definition.arity(),
            });
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterates over the registered pattern texts.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(StepDefinition::pattern)
    }

    /// Resolves `text` to exactly one definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Undefined`] when nothing matches and
    /// [`RegistryError::Ambiguous`] when more than one definition does.
    pub fn bind(&self, text: &str) -> Result<BoundStep, RegistryError> {
        let mut matches = self
            .definitions
            .iter()
            .enumerate()
            .filter_map(|(index, def)| def.captures(text).map(|args| (index, args)))
            .collect::<Vec<_>>();

        if matches.len() > 1 {
            return Err(RegistryError::Ambiguous {
                step: text.to_owned(),
                patterns: matches
                    .iter()
                    .filter_map(|(index, _)| self.definitions.get(*index))
                    .map(|def| def.pattern().to_owned())
                    .collect(),
            });
        }
        let (definition, args) = matches.pop().ok_or_else(|| RegistryError::Undefined {
            step: text.to_owned(),
        })?;
        Ok(BoundStep {
            text: text.to_owned(),
            definition,
            args,
        })
    }

    /// Runs the handler behind `step`.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns, or [`StepError::Unbound`] when
    /// the step came from a different registry.
    pub fn dispatch(&self, world: &mut World<R>, step: &BoundStep) -> Result<(), StepError> {
        let definition = self
            .definitions
            .get(step.definition)
            .ok_or(StepError::Unbound(step.definition))?;
        (definition.handler)(world, &step.args)
    }
}
