use std::io::{self, Write};

use rusty_money::{Money, iso::Currency};
use tablecart::cart::{LineItem, PendingOperation};
use tablecart_client::context::CartContext;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

const FINGERPRINT_WIDTH: usize = 12;

pub(crate) fn run(ctx: &CartContext) -> Result<(), String> {
    let mut out = io::stdout().lock();

    writeln!(out, "cart: {}", ctx.namespace())
        .and_then(|()| write_cart(&mut out, &ctx.lines(), &ctx.total_amount(), ctx.currency()))
        .and_then(|()| write_operations(&mut out, &ctx.pending_operations()))
        .map_err(|error| error.to_string())
}

fn write_cart(
    out: &mut impl Write,
    lines: &[LineItem],
    total: &Money<'static, Currency>,
    currency: &'static Currency,
) -> io::Result<()> {
    if lines.is_empty() {
        return writeln!(out, "(empty)");
    }

    let mut builder = Builder::default();

    builder.push_record(["Fingerprint", "Item", "Options", "Qty", "Unit", "Total"]);

    for line in lines {
        builder.push_record([
            short(line.fingerprint.as_str()),
            line.menu_item.name.clone(),
            describe_options(line),
            line.quantity.to_string(),
            line.unit_price(currency).to_string(),
            line.total(currency).to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "{table}")?;
    writeln!(out, "total: {total}")
}

fn write_operations(out: &mut impl Write, operations: &[PendingOperation]) -> io::Result<()> {
    if operations.is_empty() {
        return writeln!(out, "pending: none");
    }

    writeln!(out, "pending:")?;

    for operation in operations {
        match operation {
            PendingOperation::AddItem {
                fingerprint,
                menu_item_id,
                quantity,
                ..
            } => writeln!(out, "  add_item {} {menu_item_id} x{quantity}", short(fingerprint.as_str()))?,
            PendingOperation::UpdateItem {
                fingerprint,
                quantity,
            } => writeln!(out, "  update_item {} x{quantity}", short(fingerprint.as_str()))?,
            PendingOperation::RemoveItem { fingerprint } => {
                writeln!(out, "  remove_item {}", short(fingerprint.as_str()))?;
            }
        }
    }

    Ok(())
}

/// Choice names per option, e.g. `Size: Large; Extras: Bacon, Cheese`.
fn describe_options(line: &LineItem) -> String {
    line.selected_options
        .iter()
        .filter(|selected| !selected.choice_ids.is_empty())
        .map(|selected| {
            let option = line.menu_item.option(&selected.option_id);

            let choices: Vec<&str> = selected
                .choice_ids
                .iter()
                .map(|choice_id| {
                    option
                        .and_then(|option| option.choice(choice_id))
                        .map_or(choice_id.as_str(), |choice| choice.name.as_str())
                })
                .collect();

            let option_name = option.map_or(selected.option_id.as_str(), |option| option.name.as_str());

            format!("{option_name}: {}", choices.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn short(fingerprint: &str) -> String {
    fingerprint.chars().take(FINGERPRINT_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use tablecart::menu::{MenuItem, MenuOption, OptionChoice, SelectedOption};
    use testresult::TestResult;

    use super::*;

    fn burger_line() -> LineItem {
        let burger = MenuItem::new("burger", "Burger", 8_50).with_option(
            MenuOption::new("size", "Size", true)
                .with_choice(OptionChoice::new("large", "Large", 1_00)),
        );

        LineItem::new(burger, 2, vec![SelectedOption::new("size", ["large"])])
    }

    #[test]
    fn options_use_display_names() {
        assert_eq!(describe_options(&burger_line()), "Size: Large");
    }

    #[test]
    fn unknown_choices_fall_back_to_ids() {
        let mut line = burger_line();
        line.selected_options = vec![SelectedOption::new("sauce", ["bbq"])];

        assert_eq!(describe_options(&line), "sauce: bbq");
    }

    #[test]
    fn renders_lines_and_total() -> TestResult {
        let line = burger_line();
        let mut out = Vec::new();

        write_cart(&mut out, &[line.clone()], &line.total(GBP), GBP)?;

        let rendered = String::from_utf8(out)?;
        assert!(rendered.contains("Burger"), "item name missing:\n{rendered}");
        assert!(rendered.contains(&short(line.fingerprint.as_str())), "fingerprint missing");
        assert!(rendered.contains(&format!("total: {}", Money::from_minor(19_00, GBP))));

        Ok(())
    }

    #[test]
    fn renders_empty_cart() -> TestResult {
        let mut out = Vec::new();

        write_cart(&mut out, &[], &Money::from_minor(0, GBP), GBP)?;
        write_operations(&mut out, &[])?;

        assert_eq!(String::from_utf8(out)?, "(empty)\npending: none\n");

        Ok(())
    }
}
