//! `viewlinks` command-line tool

use std::path::{Path as FsPath, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value as JsonValue;
use tracing::info;
use viewlinks_form::{decompose_route, recompose, Action, EditorConfig, FormReducer, Route};
use viewlinks_session::{FileStore, SaveOutcome, StoreError, ViewSession, ViewStore};
use viewlinks_tree::{apply_patch, compute_diff, parse, ConfigTree, Node, Patch};

mod logging;

fn cli() -> Command {
    let tree_arg = |name: &'static str, help: &'static str| {
        Arg::new(name)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };

    Command::new("viewlinks")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect, edit, diff and save search-view link configurations")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Editor config file (TOML or .json)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("get")
                .about("Print the node at a path")
                .arg(tree_arg("tree", "Tree file (JSON or YAML)"))
                .arg(Arg::new("path").required(true).help("e.g. links[c].fields[f]")),
        )
        .subcommand(
            Command::new("set")
                .about("Set a node and print the normalized tree")
                .arg(tree_arg("tree", "Tree file (JSON or YAML)"))
                .arg(Arg::new("path").required(true).help("e.g. links[c].fields[f]"))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .help("JSON value; null deletes"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Print the patch from one tree to another")
                .arg(tree_arg("baseline", "Baseline tree file"))
                .arg(tree_arg("working", "Working tree file")),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply a patch file to a tree")
                .arg(tree_arg("tree", "Tree file (JSON or YAML)"))
                .arg(tree_arg("patch", "Patch file (JSON)")),
        )
        .subcommand(
            Command::new("route")
                .about("Translate between UI routes and paths")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .help("Route like view/link/field, or a path with --reverse"),
                )
                .arg(
                    Arg::new("reverse")
                        .long("reverse")
                        .action(ArgAction::SetTrue)
                        .help("Treat input as a path and print its route segments"),
                ),
        )
        .subcommand(
            Command::new("save")
                .about("Save a working tree into a directory-backed view store")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Store directory"),
                )
                .arg(Arg::new("view").long("view").required(true).help("View name"))
                .arg(tree_arg("working", "Working tree file"))
                .arg(
                    Arg::new("create")
                        .long("create")
                        .action(ArgAction::SetTrue)
                        .help("Create the view if it does not exist"),
                ),
        )
}

fn read_tree(path: &FsPath) -> Result<ConfigTree> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let tree = if is_yaml {
        ConfigTree::from_yaml(&text)
    } else {
        ConfigTree::from_json(&text)
    };
    tree.with_context(|| format!("invalid tree in {}", path.display()))
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing <{name}>"))
}

fn str_arg<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{name}>"))
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(matches: &ArgMatches) -> Result<EditorConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn cmd_get(args: &ArgMatches) -> Result<()> {
    let tree = read_tree(path_arg(args, "tree")?)?;
    let path = parse(str_arg(args, "path")?)?;
    match tree.get(&path)? {
        Some(node) => print_json(&node.to_json_value()),
        None => bail!("nothing at {path}"),
    }
}

fn cmd_set(args: &ArgMatches, config: &EditorConfig) -> Result<()> {
    let tree = read_tree(path_arg(args, "tree")?)?;
    let path = parse(str_arg(args, "path")?)?;
    let raw: JsonValue =
        serde_json::from_str(str_arg(args, "value")?).context("value must be JSON")?;
    let value = Node::try_from(raw)?;

    let mut form = FormReducer::with_normalizer(tree, config.normalize);
    form.dispatch(Action::set_field(path, value))?;
    print_json(&form.working_copy().to_value())
}

fn cmd_diff(args: &ArgMatches) -> Result<()> {
    let baseline = read_tree(path_arg(args, "baseline")?)?;
    let working = read_tree(path_arg(args, "working")?)?;
    let patch = compute_diff(&baseline, &working);
    let summary = patch.summary();
    info!(
        removals = summary.removals,
        assignments = summary.assignments,
        links = summary.touched_links.len(),
        "diff computed"
    );
    print_json(&patch.to_value())
}

fn cmd_apply(args: &ArgMatches) -> Result<()> {
    let tree = read_tree(path_arg(args, "tree")?)?;
    let patch_path = path_arg(args, "patch")?;
    let text = std::fs::read_to_string(patch_path)
        .with_context(|| format!("failed to read {}", patch_path.display()))?;
    let patch: Patch = serde_json::from_str(&text)
        .with_context(|| format!("invalid patch in {}", patch_path.display()))?;
    let applied = apply_patch(&tree, &patch);
    applied.validate()?;
    print_json(&applied.to_value())
}

fn cmd_route(args: &ArgMatches) -> Result<()> {
    let input = str_arg(args, "input")?;
    if args.get_flag("reverse") {
        let path = parse(input)?;
        println!("{}", recompose(&path).join("/"));
        return Ok(());
    }
    let route: Route = input.parse()?;
    let path = decompose_route(&route.segments)?;
    println!("{path}");
    Ok(())
}

async fn save_view(
    dir: &FsPath,
    view: &str,
    working: ConfigTree,
    create: bool,
    config: EditorConfig,
) -> Result<SaveOutcome> {
    let store = FileStore::open(dir).await?;
    if create {
        match store.load(view).await {
            Ok(_) => {}
            Err(StoreError::ViewNotFound(_)) => {
                store.create_view(view, &ConfigTree::new()).await?;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot load existing view {view}"));
            }
        }
    }

    let mut session = ViewSession::open(store, view, config).await?;
    session.dispatch(Action::set_form_state(working))?;
    Ok(session.save().await?)
}

async fn cmd_save(args: &ArgMatches, config: EditorConfig) -> Result<()> {
    let dir = path_arg(args, "dir")?;
    let view = str_arg(args, "view")?;
    let working = read_tree(path_arg(args, "working")?)?;

    match save_view(dir, view, working, args.get_flag("create"), config).await? {
        SaveOutcome::Unchanged => println!("{view}: no changes"),
        SaveOutcome::Saved {
            revision,
            summary,
            mode,
        } => println!(
            "{view}: saved ({mode:?}, {} removals, {} assignments) revision {revision}",
            summary.removals, summary.assignments
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("verbose"), matches.get_flag("log-json"));
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("get", args)) => cmd_get(args),
        Some(("set", args)) => cmd_set(args, &config),
        Some(("diff", args)) => cmd_diff(args),
        Some(("apply", args)) => cmd_apply(args),
        Some(("route", args)) => cmd_route(args),
        Some(("save", args)) => cmd_save(args, config).await,
        _ => bail!("unknown command"),
    }
}
