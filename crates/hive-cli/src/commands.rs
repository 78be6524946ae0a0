use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use hive_access::{ChildCursor, NodeHandle};
use hive_store::{InMemoryNodeStore, StoreConfig};
use hive_types::{AccessMask, ValueType};
use serde_json::json;

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let store = open_store(&cli.store, config)?;

    match cli.command {
        Command::Mkdir(args) => {
            cmd_mkdir(&store, args, cli.format)?;
            save_store(&store, &cli.store)
        }
        Command::Ls(args) => cmd_ls(&store, args, cli.format),
        Command::Get(args) => cmd_get(&store, args, cli.format),
        Command::Set(args) => {
            cmd_set(&store, args, cli.format)?;
            save_store(&store, &cli.store)
        }
        Command::Export(args) => cmd_export(&store, args),
    }
}

fn open_store(path: &Path, config: StoreConfig) -> anyhow::Result<Arc<InMemoryNodeStore>> {
    let store = if path.exists() {
        InMemoryNodeStore::load(path, config)
            .with_context(|| format!("loading store {}", path.display()))?
    } else {
        InMemoryNodeStore::with_config(config)
    };
    Ok(Arc::new(store))
}

fn save_store(store: &InMemoryNodeStore, path: &Path) -> anyhow::Result<()> {
    store
        .save(path)
        .with_context(|| format!("saving store {}", path.display()))
}

fn cmd_mkdir(
    store: &Arc<InMemoryNodeStore>,
    args: MkdirArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if args.path.trim_matches(|c: char| c == '/' || c == '\\').is_empty() {
        bail!("refusing to create the root");
    }
    let mut handle = NodeHandle::empty(store.clone());
    let disposition = handle.create(None, &args.path, AccessMask::ALL)?;
    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "path": args.path, "disposition": disposition.to_string() }))
        }
        OutputFormat::Text => println!(
            "{} {} {}",
            "✓".green().bold(),
            disposition.to_string().cyan(),
            args.path.bold()
        ),
    }
    Ok(())
}

fn cmd_ls(store: &Arc<InMemoryNodeStore>, args: LsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let cursor = ChildCursor::new(store.clone(), None, &args.path);
    if !cursor.is_valid() && cursor.snapshot_count() == 0 {
        // Either missing or childless; tell the two apart.
        NodeHandle::new(store.clone(), None, &args.path, AccessMask::READ)
            .with_context(|| format!("no node at {:?}", args.path))?;
    }
    let names = cursor.collect::<Result<Vec<_>, _>>()?;
    match format {
        OutputFormat::Json => println!("{}", json!(names)),
        OutputFormat::Text => {
            for name in &names {
                println!("{}", name.blue().bold());
            }
        }
    }
    Ok(())
}

fn cmd_get(store: &Arc<InMemoryNodeStore>, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let handle = NodeHandle::new(store.clone(), None, &args.path, AccessMask::READ)
        .with_context(|| format!("opening {:?}", args.path))?;
    let value = handle
        .read_value(&args.name, None)
        .with_context(|| format!("reading {:?}", args.name))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "name": args.name,
                "type": value.value_type.name(),
                "size": value.size(),
                "data": render::to_json(&value)?,
            })
        ),
        OutputFormat::Text => println!(
            "{} ({}) = {}",
            args.name.bold(),
            value.value_type.to_string().cyan(),
            render::to_text(&value)?
        ),
    }
    Ok(())
}

fn cmd_set(store: &Arc<InMemoryNodeStore>, args: SetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut handle = NodeHandle::empty(store.clone());
    handle
        .create(None, &args.path, AccessMask::ALL)
        .with_context(|| format!("creating {:?}", args.path))?;
    let name = args.name.as_str();
    let value_type = args.value_type;

    match value_type {
        ValueType::Integer32 => {
            let n = render::parse_int(render::single(value_type, &args.values)?)?;
            let n = u32::try_from(n).context("value does not fit in 32 bits")?;
            handle.write_u32(name, n)?;
        }
        ValueType::Integer64 => {
            let n = render::parse_int(render::single(value_type, &args.values)?)?;
            handle.write_u64(name, n)?;
        }
        ValueType::String => handle.write_string(name, render::single(value_type, &args.values)?)?,
        ValueType::ExpandableString => {
            handle.write_expandable_string(name, render::single(value_type, &args.values)?)?
        }
        ValueType::MultiString => handle.write_multi_string(name, &args.values)?,
        ValueType::Binary | ValueType::Unspecified => {
            let data = hex::decode(render::single(value_type, &args.values)?)
                .context("binary values are given as hex")?;
            handle.write_raw(name, &data, value_type)?;
        }
    }

    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "path": args.path, "name": name, "type": value_type.name() }))
        }
        OutputFormat::Text => println!(
            "{} {}\\{} ({})",
            "✓".green().bold(),
            args.path,
            name.bold(),
            value_type.to_string().cyan()
        ),
    }
    Ok(())
}

fn cmd_export(store: &InMemoryNodeStore, args: ExportArgs) -> anyhow::Result<()> {
    let root = match &args.path {
        Some(path) => store
            .snapshot_at(path)
            .with_context(|| format!("no node at {path:?}"))?,
        None => store.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&render::export(&root)?)?);
    Ok(())
}
