//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use serde_json::Value;

use crate::application::services::DocumentFormat;
use crate::domain::{is_reserved_field, ItemId};

/// In-memory hierarchical index over flat item documents
#[derive(Parser, Debug)]
#[command(name = "treestore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Directory holding .treestore.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Document format, overrides file extension and config
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<DocumentFormat>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all items in document order
    List {
        /// Item document
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List direct children of an item
    Children {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: ItemId,
    },

    /// List every item below an item
    Descendants {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: ItemId,
    },

    /// Show the chain from an item up to its root
    Ancestors {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: ItemId,
    },

    /// Show the hierarchy as a tree
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Insert an item and print the resulting document
    Insert {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Identifier of the new item
        #[arg(long)]
        id: ItemId,
        /// Parent identifier (root if omitted)
        #[arg(short, long)]
        parent: Option<ItemId>,
        #[arg(short, long)]
        label: String,
        /// Extra field as key=value (value parsed as JSON when possible)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Update an item and print the resulting document
    Update {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: ItemId,
        /// Move under this parent
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<ItemId>,
        /// Move to the root
        #[arg(long)]
        root: bool,
        #[arg(short, long)]
        label: Option<String>,
        /// Extra field as key=value (value parsed as JSON when possible)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Remove an item with its subtree and print the resulting document
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        id: ItemId,
    },

    /// Report duplicate ids, dangling parents and cycles
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config file locations
    Path,

    /// Print a config template
    Template,
}

/// Parse `key=value`; the value is JSON if it parses, a string otherwise.
pub fn parse_field(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    if is_reserved_field(key) {
        return Err(format!("'{key}' is reserved, set it with its own argument"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_field_arguments_when_parsing_then_detects_json_values() {
        assert_eq!(parse_field("size=10").unwrap(), ("size".into(), Value::from(10)));
        assert_eq!(parse_field("color=red").unwrap(), ("color".into(), Value::from("red")));
        assert_eq!(parse_field("note=a=b").unwrap(), ("note".into(), Value::from("a=b")));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn given_reserved_key_when_parsing_field_then_rejects_it() {
        for arg in ["id=9", "parent=2", "label=x"] {
            let err = parse_field(arg).unwrap_err();
            assert!(err.contains("is reserved"), "{err}");
        }
        let result = Cli::try_parse_from([
            "treestore", "update", "items.json", "3", "--field", "parent=2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn given_update_with_parent_and_root_when_parsing_then_conflicts() {
        let result = Cli::try_parse_from([
            "treestore", "update", "items.json", "3", "--parent", "2", "--root",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn given_insert_arguments_when_parsing_then_ids_are_typed() {
        let cli = Cli::try_parse_from([
            "treestore", "insert", "items.json", "--id", "5", "--parent", "abc", "--label", "x",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Insert { id, parent, .. }) => {
                assert_eq!(id, ItemId::Int(5));
                assert_eq!(parent, Some(ItemId::Str("abc".into())));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
