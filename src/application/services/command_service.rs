use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::errors::RegistryError;
use crate::domain::entities::{CommandDescriptor, CommandRegistry, OptionSpec};
use crate::domain::traits::{CommandManifest, CommandScope, ManifestOption, Platform};

const CHAT_INPUT: u8 = 1;
const SUB_COMMAND: u8 = 1;
const SUB_COMMAND_GROUP: u8 = 2;
const DEFAULT_DESCRIPTION: &str = "No description";

/// A registry whose command set has been published to the platform.
///
/// The dispatcher only accepts this type, so no interaction can be routed
/// before publishing finished.
pub struct ReadyRegistry {
    registry: Arc<CommandRegistry>,
    scope: CommandScope,
}

impl ReadyRegistry {
    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    pub fn into_registry(self) -> Arc<CommandRegistry> {
        self.registry
    }
}

impl CommandRegistry {
    /// Slash commands folded into the platform's command/group/subcommand tree
    pub fn manifest(&self) -> Vec<CommandManifest> {
        let mut roots: BTreeMap<String, CommandManifest> = BTreeMap::new();

        for descriptor in self.slash_commands() {
            let segments = descriptor.path.segments();
            let Some(root) = segments.first() else { continue };

            let entry = roots.entry(root.clone()).or_insert_with(|| CommandManifest {
                name: root.clone(),
                description: format!("{} commands", root),
                kind: CHAT_INPUT,
                options: Vec::new(),
            });

            match segments {
                [_] => {
                    entry.description = description_of(descriptor);
                    entry.options = descriptor.options.iter().map(option_manifest).collect();
                }
                [_, sub] => entry.options.push(subcommand(sub, descriptor)),
                [_, group, sub] => {
                    let position = entry
                        .options
                        .iter()
                        .position(|o| o.kind == SUB_COMMAND_GROUP && &o.name == group);
                    let group_option = match position {
                        Some(i) => &mut entry.options[i],
                        None => {
                            entry.options.push(ManifestOption {
                                kind: SUB_COMMAND_GROUP,
                                name: group.clone(),
                                description: format!("{} commands", group),
                                required: false,
                                options: Vec::new(),
                            });
                            let last = entry.options.len() - 1;
                            &mut entry.options[last]
                        }
                    };
                    group_option.options.push(subcommand(sub, descriptor));
                }
                _ => {}
            }
        }

        roots.into_values().collect()
    }

    /// Upload the command set to `scope`. Failure here must abort startup.
    pub async fn publish(self, platform: &dyn Platform, scope: CommandScope) -> Result<ReadyRegistry, RegistryError> {
        let manifest = self.manifest();
        tracing::info!("Publishing {} commands to {}", manifest.len(), scope);

        platform.register_commands(scope, &manifest).await?;

        tracing::info!("Commands published to {}", scope);
        Ok(ReadyRegistry {
            registry: Arc::new(self),
            scope,
        })
    }
}

fn description_of(descriptor: &CommandDescriptor) -> String {
    if descriptor.description.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        descriptor.description.clone()
    }
}

fn subcommand(name: &str, descriptor: &CommandDescriptor) -> ManifestOption {
    ManifestOption {
        kind: SUB_COMMAND,
        name: name.to_string(),
        description: description_of(descriptor),
        required: false,
        options: descriptor.options.iter().map(option_manifest).collect(),
    }
}

fn option_manifest(option: &OptionSpec) -> ManifestOption {
    ManifestOption {
        kind: option.kind.manifest_type(),
        name: option.name.clone(),
        description: if option.description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            option.description.clone()
        },
        required: option.required,
        options: Vec::new(),
    }
}
