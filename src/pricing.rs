//! Pricing
//!
//! Line and cart totals. Selections that reference options or choices the
//! menu item snapshot no longer has are priced at zero so the cart keeps
//! rendering when the catalog drifts.

use rusty_money::{Money, iso::Currency};

use crate::{
    cart::LineItem,
    fingerprint::normalize,
    menu::{MenuItem, SelectedOption},
};

/// Price of one unit: base price plus the surcharge of every selected choice,
/// in minor units. A choice is charged once however often it is listed, the
/// same way it counts once towards the line's fingerprint.
pub fn unit_price_minor(menu_item: &MenuItem, selected: &[SelectedOption]) -> u64 {
    normalize(selected)
        .into_iter()
        .flat_map(|(option_id, choice_ids)| {
            choice_ids
                .into_iter()
                .map(move |choice_id| (option_id, choice_id))
        })
        .filter_map(|(option_id, choice_id)| menu_item.choice(option_id, choice_id))
        .fold(menu_item.price, |acc, choice| acc.saturating_add(choice.price))
}

/// Price of one unit as money.
pub fn unit_price(
    menu_item: &MenuItem,
    selected: &[SelectedOption],
    currency: &'static Currency,
) -> Money<'static, Currency> {
    to_money(unit_price_minor(menu_item, selected), currency)
}

/// Price of `quantity` units of a configured menu item.
pub fn line_total(
    menu_item: &MenuItem,
    selected: &[SelectedOption],
    quantity: u32,
    currency: &'static Currency,
) -> Money<'static, Currency> {
    to_money(line_total_minor(menu_item, selected, quantity), currency)
}

/// Sum of every line total in the cart.
pub fn cart_total<'l>(
    lines: impl IntoIterator<Item = &'l LineItem>,
    currency: &'static Currency,
) -> Money<'static, Currency> {
    let total = lines.into_iter().fold(0_u64, |acc, line| {
        acc.saturating_add(line_total_minor(
            &line.menu_item,
            &line.selected_options,
            line.quantity,
        ))
    });

    to_money(total, currency)
}

fn line_total_minor(menu_item: &MenuItem, selected: &[SelectedOption], quantity: u32) -> u64 {
    unit_price_minor(menu_item, selected).saturating_mul(u64::from(quantity))
}

fn to_money(minor: u64, currency: &'static Currency) -> Money<'static, Currency> {
    Money::from_minor(i64::try_from(minor).unwrap_or(i64::MAX), currency)
}
