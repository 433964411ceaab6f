//! Command execution against a directory-backed settings store.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8Path;
use serde::Serialize;
use serde_json::Value;
use settings_variants::events::{ConfigEvents, TagLog};
use settings_variants::forms::{
    ConfigForm, ConfigSubmission, FormErrors, VariationForm, VariationSubmission,
};
use settings_variants::nested::{Tree, path};
use settings_variants::plugin::SettingsPlugin;
use settings_variants::registry::SettingsRegistry;
use settings_variants::repository::{RequestContext, Scope, SettingsRepository};
use settings_variants::store::{ConfigStore, DirectoryStore, VariationQuery, VariationStore};
use settings_variants::variation::{
    SaveStatus, VariationEntity, VariationManager, sort_variations,
};
use tracing::info;

use crate::cli::{ActiveArgs, Command, ConfigArgs, DiffArgs, SaveArgs};
use crate::error::CtlError;
use crate::registration::load_registrations;

/// Resolved instance printed by `active`.
#[derive(Debug, Serialize)]
struct ActiveReport<'a> {
    id: &'a str,
    plugin: &'a str,
    variation: bool,
    values: &'a Tree,
}

/// Registry, manager and config events over one store directory.
#[derive(Debug)]
pub struct Workspace {
    events: ConfigEvents,
}

impl Workspace {
    /// Open the store at `root` with the plugin types registered in
    /// `registrations`.
    ///
    /// # Errors
    ///
    /// Propagates store and registration failures.
    pub fn open(root: &Utf8Path, registrations: &Utf8Path) -> Result<Self, CtlError> {
        let store = Arc::new(DirectoryStore::open(root)?);
        let config: Arc<dyn ConfigStore> = store.clone();
        let mut registry = SettingsRegistry::new(config);
        for registration in load_registrations(registrations)? {
            registry.register(registration.into_descriptor());
        }
        let variations: Arc<dyn VariationStore> = store;
        let manager = VariationManager::new(Arc::new(registry), variations);
        Ok(Self {
            events: ConfigEvents::new(manager, Arc::new(TagLog::new())),
        })
    }

    /// Variation manager over the store.
    #[must_use]
    pub const fn manager(&self) -> &VariationManager {
        self.events.manager()
    }

    /// Run `command`, writing its report to `out`.
    ///
    /// # Errors
    ///
    /// Propagates settings failures, rejected submissions and write
    /// failures.
    pub fn execute<W: Write>(&self, command: &Command, out: &mut W) -> Result<(), CtlError> {
        match command {
            Command::List(args) => self.list(&args.plugin, out),
            Command::Active(args) => self.active(args, out),
            Command::Diff(args) => self.diff(args, out),
            Command::Save(args) => self.save(args, out),
            Command::Config(args) => self.config(args, out),
        }
    }

    fn list<W: Write>(&self, plugin: &str, out: &mut W) -> Result<(), CtlError> {
        self.manager().registry().definition(plugin)?;
        let mut entities = self
            .manager()
            .store()
            .load_by_properties(&VariationQuery::plugin(plugin))?;
        sort_variations(&mut entities);
        for entity in entities {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                entity.id,
                entity.label,
                if entity.status { "enabled" } else { "disabled" },
                entity.weight,
                entity.parent_id().unwrap_or("-"),
            )
            .map_err(CtlError::stdout)?;
        }
        Ok(())
    }

    fn active<W: Write>(&self, args: &ActiveArgs, out: &mut W) -> Result<(), CtlError> {
        let mut context = RequestContext::default();
        if let Some(id) = &args.variation {
            context = context.with_bound_variation(self.variation(&args.plugin, id)?);
        }
        if let Some(scope) = args.scope {
            context = context.with_scope(scope.into());
        }
        if args.is_core_only {
            context = context.core_only();
        }
        let mut repository = SettingsRepository::new(self.manager().clone(), &args.plugin, context)?;
        let active = repository.get_active(true)?;
        let report = ActiveReport {
            id: active.id(),
            plugin: active.plugin_id(),
            variation: active.is_variation(),
            values: active.values(),
        };
        write_json(out, &report)
    }

    fn diff<W: Write>(&self, args: &DiffArgs, out: &mut W) -> Result<(), CtlError> {
        let Some(id) = &args.variation else {
            let core = self
                .manager()
                .registry()
                .create_instance(&args.plugin, Tree::new(), None)?;
            return write_json(out, &core.diff_config_values());
        };
        let entity = self.variation(&args.plugin, id)?;
        let diff = self
            .manager()
            .plugin_for(&entity)?
            .as_ref()
            .map_or_else(Tree::new, SettingsPlugin::diff_values);
        write_json(out, &diff)
    }

    fn config<W: Write>(&self, args: &ConfigArgs, out: &mut W) -> Result<(), CtlError> {
        let mut form = ConfigForm::new(&self.events, &args.plugin)?;
        if args.is_reset {
            let written = form.reset()?;
            return write_json(out, &written);
        }
        let mut submission = ConfigSubmission {
            base: Tree::new(),
            instance: args
                .settings
                .as_deref()
                .map(parse_settings)
                .transpose()?
                .unwrap_or_default(),
            scope_front: args
                .scope_front
                .clone()
                .or_else(|| stored_scope(form.plugin(), Scope::Front)),
            scope_back: args
                .scope_back
                .clone()
                .or_else(|| stored_scope(form.plugin(), Scope::Back)),
        };
        let errors = form.validate(&mut submission, false);
        if !errors.is_empty() {
            return Err(rejected(&errors));
        }
        let written = form.submit(&submission)?;
        info!(config = form.config_name(), "saved config from the command line");
        write_json(out, &written)
    }

    fn save<W: Write>(&self, args: &SaveArgs, out: &mut W) -> Result<(), CtlError> {
        let settings = args.settings.as_deref().map(parse_settings).transpose()?;
        let lookup_id = args
            .id
            .clone()
            .unwrap_or_else(|| VariationEntity::new(&args.plugin, &args.label).generate_id());
        let existing = self.manager().load(&lookup_id)?;
        if let Some(found) = &existing
            && found.plugin != args.plugin
        {
            return Err(CtlError::UnknownVariation {
                plugin: args.plugin.clone(),
                id: lookup_id,
            });
        }
        let entity = existing.unwrap_or_else(|| {
            VariationEntity::new(&args.plugin, &args.label).with_id(args.id.clone().unwrap_or_default())
        });

        let mut submission = VariationSubmission {
            label: args.label.clone(),
            status: args.enabled.unwrap_or(entity.status),
            parent: entity.parent.clone(),
            weight: args.weight.unwrap_or(entity.weight),
            settings: settings.unwrap_or_else(|| entity.settings.clone()),
            use_default: args.use_default.iter().map(|dotted| path(dotted.split('.'))).collect(),
            visibility: entity.visibility.clone(),
        };
        let mut form = VariationForm::new(self.manager(), entity)?;
        if let Some(parent) = &args.parent {
            form.apply_parent(Some(parent.as_str()), &mut submission)?;
        }
        let errors = form.validate(&mut submission);
        if !errors.is_empty() {
            return Err(rejected(&errors));
        }
        let status = form.save(&submission)?;
        let verb = match status {
            SaveStatus::New => "created",
            SaveStatus::Updated => "updated",
        };
        info!(variation = %form.entity().id, verb, "saved variation from the command line");
        writeln!(out, "{verb} {}", form.entity().id).map_err(CtlError::stdout)
    }

    fn variation(&self, plugin: &str, id: &str) -> Result<VariationEntity, CtlError> {
        self.manager()
            .load(id)?
            .filter(|entity| entity.plugin == plugin)
            .ok_or_else(|| CtlError::UnknownVariation {
                plugin: plugin.to_owned(),
                id: id.to_owned(),
            })
    }
}

fn stored_scope(core: &SettingsPlugin, scope: Scope) -> Option<String> {
    core.scope_selection(scope).map(str::to_owned)
}

fn rejected(errors: &FormErrors) -> CtlError {
    let messages: Vec<String> = errors
        .iter()
        .map(|error| format!("{}: {}", error.key, error.message))
        .collect();
    CtlError::Rejected(messages.join("; "))
}

fn parse_settings(raw: &str) -> Result<Tree, CtlError> {
    match serde_json::from_str(raw).map_err(CtlError::SettingsJson)? {
        Value::Object(tree) => Ok(tree),
        _ => Err(CtlError::SettingsNotObject),
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), CtlError> {
    let rendered = serde_json::to_string_pretty(value)?;
    writeln!(out, "{rendered}").map_err(CtlError::stdout)
}
