use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::{CommandError, RegistryError};
use crate::application::messaging::{CommandContext, Precondition};
use super::options::OptionSpec;

/// Slash command segments are limited to this depth (command, group, subcommand)
pub const MAX_SLASH_DEPTH: usize = 3;

/// Ordered command segments, e.g. `["admin", "grant"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPath(Vec<String>);

impl CommandPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `self` is a strict prefix of `other`
    pub fn is_parent_of(&self, other: &CommandPath) -> bool {
        self.depth() < other.depth() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

impl From<&[&str]> for CommandPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

/// Which family of interactions a descriptor answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    SlashCommand,
    Component,
    Modal,
    Autocomplete,
}

/// Body of a command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError>;
}

/// Adapter turning an async closure into a [`CommandHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        (self.0)(ctx).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Registered definition of a command
pub struct CommandDescriptor {
    pub path: CommandPath,
    pub route: RouteKind,
    pub description: String,
    pub options: Vec<OptionSpec>,
    pub preconditions: Vec<Arc<dyn Precondition>>,
    pub handler: Arc<dyn CommandHandler>,
    /// Send the platform's "thinking" acknowledgment before the body runs
    pub defer: bool,
}

impl CommandDescriptor {
    pub fn new(route: RouteKind, path: CommandPath, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            path,
            route,
            description: String::new(),
            options: Vec::new(),
            preconditions: Vec::new(),
            handler,
            defer: false,
        }
    }

    pub fn slash(path: &[&str], handler: Arc<dyn CommandHandler>) -> Self {
        Self::new(RouteKind::SlashCommand, CommandPath::from(path), handler)
    }

    pub fn component(custom_id: &[&str], handler: Arc<dyn CommandHandler>) -> Self {
        Self::new(RouteKind::Component, CommandPath::from(custom_id), handler)
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_precondition(mut self, check: Arc<dyn Precondition>) -> Self {
        self.preconditions.push(check);
        self
    }

    pub fn deferred(mut self) -> Self {
        self.defer = true;
        self
    }

    /// Human readable name for logs, e.g. `/admin grant`
    pub fn display_name(&self) -> String {
        match self.route {
            RouteKind::SlashCommand | RouteKind::Autocomplete => format!("/{}", self.path),
            RouteKind::Component | RouteKind::Modal => self.path.to_string(),
        }
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.path.is_empty() {
            return Err(RegistryError::InvalidDefinition("empty command path".to_string()));
        }
        if self.route == RouteKind::SlashCommand {
            if self.path.depth() > MAX_SLASH_DEPTH {
                return Err(RegistryError::InvalidDefinition(format!(
                    "`{}` is nested deeper than {} levels",
                    self.path, MAX_SLASH_DEPTH
                )));
            }
            let bad = self.path.segments().iter().find(|s| {
                s.is_empty() || s.len() > 32 || s.chars().any(|c| c.is_uppercase() || c.is_whitespace())
            });
            if let Some(segment) = bad {
                return Err(RegistryError::InvalidDefinition(format!(
                    "invalid segment `{}` in `{}`",
                    segment, self.path
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("path", &self.path)
            .field("route", &self.route)
            .field("options", &self.options.len())
            .field("preconditions", &self.preconditions.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("defer", &self.defer)
            .finish()
    }
}

type RouteKey = (RouteKind, CommandPath);

/// Maps `(route, path)` to the descriptor that handles it.
///
/// Filled once at startup and read-only afterwards.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<RouteKey, Arc<CommandDescriptor>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(descriptors: Vec<CommandDescriptor>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(descriptors)?;
        Ok(registry)
    }

    /// Register the full descriptor set.
    ///
    /// Nothing is inserted unless the whole batch is valid. Registering the same
    /// set of paths again is a no-op; any other second batch is rejected.
    pub fn register(&mut self, descriptors: Vec<CommandDescriptor>) -> Result<(), RegistryError> {
        let mut batch: HashMap<RouteKey, Arc<CommandDescriptor>> = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            descriptor.validate()?;
            let key = (descriptor.route, descriptor.path.clone());
            if batch.contains_key(&key) {
                return Err(RegistryError::DuplicatePath(descriptor.path));
            }
            batch.insert(key, Arc::new(descriptor));
        }

        // A slash command cannot be both invokable and a group
        for (route, path) in batch.keys().filter(|(r, _)| *r == RouteKind::SlashCommand) {
            if let Some((_, child)) = batch.keys().find(|(r, p)| r == route && path.is_parent_of(p)) {
                return Err(RegistryError::InvalidDefinition(format!(
                    "`{}` is both a command and the parent of `{}`",
                    path, child
                )));
            }
        }

        if !self.commands.is_empty() {
            let same_keys = batch.len() == self.commands.len()
                && batch.keys().all(|k| self.commands.contains_key(k));
            return if same_keys {
                Ok(())
            } else {
                Err(RegistryError::AlreadyRegistered)
            };
        }

        tracing::info!("Registered {} commands", batch.len());
        self.commands = batch;
        Ok(())
    }

    /// Exact segment match; no prefix or fuzzy matching.
    pub fn resolve(&self, route: RouteKind, path: &[String]) -> Option<Arc<CommandDescriptor>> {
        self.commands.get(&(route, CommandPath::new(path.iter().cloned()))).cloned()
    }

    /// Slash command descriptors ordered by path
    pub fn slash_commands(&self) -> Vec<&Arc<CommandDescriptor>> {
        let mut commands: Vec<_> = self
            .commands
            .values()
            .filter(|d| d.route == RouteKind::SlashCommand)
            .collect();
        commands.sort_by(|a, b| a.path.cmp(&b.path));
        commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
