use std::{collections::BTreeMap, path::PathBuf};

use clap::Args;
use tablecart::{
    catalog::Menu,
    fingerprint::Fingerprint,
    menu::{MenuItem, SelectedOption},
};
use tablecart_client::context::CartContext;
use tracing::warn;

use super::{describe, show};

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    /// Menu YAML file
    #[arg(long)]
    menu: PathBuf,

    /// Menu item id
    #[arg(long)]
    item: String,

    /// Units to add
    #[arg(short, long, default_value_t = 1_u32)]
    quantity: u32,

    /// Chosen option as OPTION=CHOICE; repeat for more choices
    #[arg(long = "choice", value_parser = parse_choice)]
    choices: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub(crate) struct UpdateArgs {
    /// Line fingerprint
    fingerprint: String,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    /// Line fingerprint
    fingerprint: String,
}

pub(crate) fn add(ctx: &CartContext, args: AddArgs) -> Result<(), String> {
    let menu = Menu::from_file(&args.menu).map_err(|error| describe(&error))?;

    if menu.currency() != ctx.currency() {
        warn!(menu = menu.currency().iso_alpha_code, "menu currency differs from cart currency");
    }

    let item = menu
        .item(&args.item)
        .cloned()
        .ok_or_else(|| format!("menu has no item '{}'", args.item))?;

    let selected = selections(&item, &args.choices)?;

    let fingerprint = ctx
        .add_item(item, args.quantity, selected)
        .map_err(|error| describe(&error))?;

    println!("added {fingerprint}");

    show::run(ctx)
}

pub(crate) fn update(ctx: &CartContext, args: &UpdateArgs) -> Result<(), String> {
    let fingerprint = resolve(ctx, &args.fingerprint)?;

    ctx.update_quantity(&fingerprint, args.quantity)
        .map_err(|error| describe(&error))?;

    show::run(ctx)
}

pub(crate) fn remove(ctx: &CartContext, args: &RemoveArgs) -> Result<(), String> {
    let fingerprint = resolve(ctx, &args.fingerprint)?;

    ctx.remove_item(&fingerprint).map_err(|error| describe(&error))?;

    show::run(ctx)
}

pub(crate) fn clear(ctx: &CartContext) -> Result<(), String> {
    ctx.clear_cart().map_err(|error| describe(&error))?;

    println!("cart cleared");

    Ok(())
}

/// Expand a fingerprint prefix, as printed by `show`, to a full fingerprint.
fn resolve(ctx: &CartContext, prefix: &str) -> Result<Fingerprint, String> {
    let matches: Vec<Fingerprint> = ctx
        .lines()
        .into_iter()
        .map(|line| line.fingerprint)
        .filter(|fingerprint| fingerprint.as_str().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [fingerprint] => Ok(fingerprint.clone()),
        [] => Ok(Fingerprint::from_string(prefix)),
        _ => Err(format!("fingerprint prefix '{prefix}' is ambiguous")),
    }
}

fn parse_choice(value: &str) -> Result<(String, String), String> {
    let (option, choice) = value
        .split_once('=')
        .ok_or_else(|| format!("expected OPTION=CHOICE, got '{value}'"))?;

    let (option, choice) = (option.trim(), choice.trim());

    if option.is_empty() || choice.is_empty() {
        return Err(format!("expected OPTION=CHOICE, got '{value}'"));
    }

    Ok((option.to_string(), choice.to_string()))
}

fn selections(item: &MenuItem, choices: &[(String, String)]) -> Result<Vec<SelectedOption>, String> {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (option_id, choice_id) in choices {
        if item.choice(option_id, choice_id).is_none() {
            return Err(format!("'{}' has no choice {option_id}={choice_id}", item.id));
        }

        grouped.entry(option_id.as_str()).or_default().push(choice_id.as_str());
    }

    if let Some(missing) = item
        .options
        .iter()
        .find(|option| option.required && !grouped.contains_key(option.id.as_str()))
    {
        return Err(format!("option '{}' is required for '{}'", missing.id, item.id));
    }

    Ok(grouped
        .into_iter()
        .map(|(option_id, choice_ids)| SelectedOption::new(option_id, choice_ids))
        .collect())
}
