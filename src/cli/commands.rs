//! Command dispatch: load the document, run one index operation, print the result

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{DocumentFormat, DocumentService};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{IndexedTree, Item, ItemId, ItemPatch, TreeDisplay};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".to_string()));
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| CliError::Usage(e.to_string()))?,
    };
    let settings = Settings::load(Some(dir.as_path()))?;
    let container = ServiceContainer::new(settings);
    let ctx = Context {
        container: &container,
        format: cli.format,
    };

    match command {
        Commands::List { file } => ctx.list(file),
        Commands::Children { file, id } => ctx.children(file, id),
        Commands::Descendants { file, id } => ctx.descendants(file, id),
        Commands::Ancestors { file, id } => ctx.ancestors(file, id),
        Commands::Tree { file } => ctx.tree(file),
        Commands::Insert {
            file,
            id,
            parent,
            label,
            fields,
        } => {
            let item = fields
                .iter()
                .cloned()
                .fold(Item::new(id.clone(), parent.clone(), label.clone()), |item, (k, v)| {
                    item.with_field(k, v)
                });
            ctx.insert(file, item)
        }
        Commands::Update {
            file,
            id,
            parent,
            root,
            label,
            fields,
        } => {
            let mut patch = ItemPatch::new(id.clone());
            if *root {
                patch = patch.parent(None);
            } else if let Some(parent) = parent {
                patch = patch.parent(Some(parent.clone()));
            }
            if let Some(label) = label {
                patch = patch.label(label.clone());
            }
            let patch = fields
                .iter()
                .cloned()
                .fold(patch, |patch, (k, v)| patch.field(k, v));
            ctx.update(file, patch)
        }
        Commands::Remove { file, id } => ctx.remove(file, id),
        Commands::Check { file } => ctx.check(file),
        Commands::Config { command } => ctx.config(command, &dir),
        Commands::Completion { .. } => Ok(()),
    }
}

struct Context<'a> {
    container: &'a ServiceContainer,
    format: Option<DocumentFormat>,
}

impl Context<'_> {
    fn load(&self, file: &Path) -> CliResult<IndexedTree<Item>> {
        Ok(self.container.documents.load(file, self.format)?)
    }

    fn print_items<'i>(&self, items: impl IntoIterator<Item = &'i Item>) {
        for item in items {
            output::item(&item.label, &item.id);
        }
    }

    fn warn_unknown(&self, tree: &IndexedTree<Item>, id: &ItemId) {
        if !tree.contains(id) {
            output::warning(&format!("no item with id {id}"));
        }
    }

    /// Print the whole document after a mutation.
    fn print_document(&self, file: &Path, tree: &IndexedTree<Item>) -> CliResult<()> {
        let settings = &self.container.settings;
        let format = self.format.unwrap_or(self.container.documents.format_for(file, None));
        let text = DocumentService::render(tree.get_all(), format, settings.pretty)?;
        output::info(text.trim_end());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn list(&self, file: &Path) -> CliResult<()> {
        let tree = self.load(file)?;
        self.print_items(tree.get_all());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn children(&self, file: &Path, id: &ItemId) -> CliResult<()> {
        let tree = self.load(file)?;
        self.warn_unknown(&tree, id);
        self.print_items(tree.get_children(id));
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn descendants(&self, file: &Path, id: &ItemId) -> CliResult<()> {
        let tree = self.load(file)?;
        self.warn_unknown(&tree, id);
        self.print_items(tree.get_all_children(id));
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn ancestors(&self, file: &Path, id: &ItemId) -> CliResult<()> {
        let tree = self.load(file)?;
        self.warn_unknown(&tree, id);
        self.print_items(tree.get_all_parents(id));
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn tree(&self, file: &Path) -> CliResult<()> {
        let tree = self.load(file)?;
        let settings = &self.container.settings.tree;
        let rendered = tree.to_tree_string(&settings.root_label, settings.max_depth);
        output::info(rendered.to_string().trim_end());
        Ok(())
    }

    #[instrument(level = "debug", skip(self, item))]
    fn insert(&self, file: &Path, item: Item) -> CliResult<()> {
        let mut tree = self.load(file)?;
        let inserted = tree.insert(item)?;
        output::action("inserted", inserted);
        self.print_document(file, &tree)
    }

    #[instrument(level = "debug", skip(self, patch))]
    fn update(&self, file: &Path, patch: ItemPatch) -> CliResult<()> {
        let mut tree = self.load(file)?;
        let updated = tree.update(patch)?;
        output::action("updated", updated);
        self.print_document(file, &tree)
    }

    #[instrument(level = "debug", skip(self))]
    fn remove(&self, file: &Path, id: &ItemId) -> CliResult<()> {
        let mut tree = self.load(file)?;
        let removed = tree.remove(id);
        if removed.is_empty() {
            output::warning(&format!("nothing removed, no item with id {id}"));
        } else {
            output::action("removed", &removed.iter().join(", "));
        }
        self.print_document(file, &tree)
    }

    #[instrument(level = "debug", skip(self))]
    fn check(&self, file: &Path) -> CliResult<()> {
        let tree = self.load(file)?;
        let violations = tree.validate();
        debug!("check: {} violations", violations.len());
        if violations.is_empty() {
            output::success(&format!("{} items, no problems", tree.len()));
            return Ok(());
        }
        for violation in &violations {
            output::failure(violation);
        }
        Err(CliError::Violations(violations.len()))
    }

    fn config(&self, command: &ConfigCommands, dir: &Path) -> CliResult<()> {
        match command {
            ConfigCommands::Show => output::info(self.container.settings.to_toml()?.trim_end()),
            ConfigCommands::Path => {
                let global = global_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<no config dir>".to_string());
                output::info(&format!("global: {global}"));
                output::info(&format!("local:  {}", local_config_path(dir).display()));
            }
            ConfigCommands::Template => output::info(Settings::template().trim_end()),
        }
        Ok(())
    }
}
