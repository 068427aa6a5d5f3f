//! Integration tests for offline cart edits surviving restarts and submissions

use std::sync::Arc;

use rusty_money::{Money, iso::GBP};
use tempfile::TempDir;
use testresult::TestResult;

use tablecart::prelude::*;

const MENU: &str = r#"
currency: GBP
items:
  burger:
    name: Burger
    price: "8.50 GBP"
    options:
      - id: size
        name: Size
        required: true
        choices:
          - id: regular
            name: Regular
          - id: large
            name: Large
            price: "1.00 GBP"
      - id: extras
        name: Extras
        choices:
          - id: cheese
            name: Cheese
            price: "0.75 GBP"
          - id: bacon
            name: Bacon
            price: "1.25 GBP"
  fries:
    name: Fries
    price: "3.00 GBP"
"#;

fn burger(menu: &Menu) -> Result<MenuItem, &'static str> {
    menu.item("burger").cloned().ok_or("burger missing from menu")
}

fn loaded_burger() -> Vec<SelectedOption> {
    vec![
        SelectedOption::new("extras", ["bacon", "cheese"]),
        SelectedOption::new("size", ["large"]),
    ]
}

#[test]
fn offline_edits_survive_restart() -> TestResult {
    let dir = TempDir::new()?;
    let menu = Menu::from_yaml_str(MENU)?;
    let namespace = CartNamespace::table("table-7");

    let fp = {
        let store = Arc::new(FileStore::new(dir.path()));
        let mut cart = LocalCart::load(namespace.clone(), store, GBP);

        let fp = cart.add_item(burger(&menu)?, 1, loaded_burger())?;
        cart.add_item(
            burger(&menu)?,
            1,
            vec![
                SelectedOption::new("size", ["large"]),
                SelectedOption::new("extras", ["cheese", "bacon"]),
            ],
        )?;

        fp
    };

    let store = Arc::new(FileStore::new(dir.path()));
    let cart = LocalCart::load(namespace, store, GBP);

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.get_item_by_fingerprint(&fp).map(|l| l.quantity), Some(2));
    assert!(matches!(
        cart.pending_operations(),
        [PendingOperation::AddItem { quantity: 2, .. }]
    ));
    // (8.50 + 1.00 + 0.75 + 1.25) * 2
    assert_eq!(cart.total_amount(), Money::from_minor(23_00, GBP));

    Ok(())
}

#[test]
fn table_sessions_do_not_share_carts() -> TestResult {
    let menu = Menu::from_yaml_str(MENU)?;
    let store = Arc::new(MemoryStore::new());
    let fries = menu.item("fries").cloned().ok_or("fries missing")?;

    let mut table_one = LocalCart::load(CartNamespace::table("1"), store.clone(), GBP);
    table_one.add_item(fries, 3, Vec::new())?;

    let table_two = LocalCart::load(CartNamespace::table("2"), store.clone(), GBP);
    let pickup = LocalCart::load(CartNamespace::Pickup, store, GBP);

    assert!(table_two.is_empty());
    assert!(pickup.is_empty());
    assert!(!table_two.has_pending_operations());

    Ok(())
}

#[test]
fn add_then_remove_before_submit_sends_nothing() -> TestResult {
    let menu = Menu::from_yaml_str(MENU)?;
    let mut cart = LocalCart::new(CartNamespace::Pickup, Arc::new(MemoryStore::new()), GBP);

    let fp = cart.add_item(burger(&menu)?, 1, loaded_burger())?;
    cart.update_quantity(&fp, 4)?;
    cart.update_quantity(&fp, 0)?;

    assert!(cart.is_empty());
    assert!(!cart.has_pending_operations());
    assert_eq!(cart.capture_pending(), None);

    Ok(())
}

#[test]
fn crash_during_submission_keeps_captured_operations() -> TestResult {
    let dir = TempDir::new()?;
    let menu = Menu::from_yaml_str(MENU)?;
    let namespace = CartNamespace::table("9");

    {
        let store = Arc::new(FileStore::new(dir.path()));
        let mut cart = LocalCart::load(namespace.clone(), store, GBP);

        cart.add_item(burger(&menu)?, 1, loaded_burger())?;
        let captured = cart.capture_pending().ok_or("nothing captured")?;
        assert_eq!(captured.len(), 1);

        let fries = menu.item("fries").cloned().ok_or("fries missing")?;
        cart.add_item(fries, 2, Vec::new())?;
        // dropped without settling the submission
    }

    let store = Arc::new(FileStore::new(dir.path()));
    let cart = LocalCart::load(namespace, store, GBP);

    assert_eq!(cart.pending_operations().len(), 2);
    assert!(!cart.is_submitting());
    assert!(cart.validate_pending().is_ok());

    Ok(())
}

#[test]
fn server_snapshot_replaces_lines_with_local_fingerprints() -> TestResult {
    let menu = Menu::from_yaml_str(MENU)?;
    let mut cart = LocalCart::new(CartNamespace::table("3"), Arc::new(MemoryStore::new()), GBP);

    let mut from_server = LineItem::new(burger(&menu)?, 2, loaded_burger());
    from_server.fingerprint = Fingerprint::from_string("srv_123");

    cart.replace_lines([from_server])?;

    let expected = fingerprint("burger", &loaded_burger());
    assert_eq!(cart.get_item_by_fingerprint(&expected).map(|l| l.quantity), Some(2));
    assert_eq!(cart.total_amount(), Money::from_minor(23_00, GBP));

    Ok(())
}

#[test]
fn session_ids_with_punctuation_persist() -> TestResult {
    let dir = TempDir::new()?;
    let menu = Menu::from_yaml_str(MENU)?;
    let fries = menu.item("fries").cloned().ok_or("fries missing from menu")?;

    for session in ["terrace.4", "bar/2", "room 101?"] {
        let namespace = CartNamespace::table(session);

        let store = Arc::new(FileStore::new(dir.path()));
        let mut cart = LocalCart::load(namespace.clone(), store, GBP);
        cart.add_item(fries.clone(), 2, Vec::new())?;

        let reloaded = LocalCart::load(namespace, Arc::new(FileStore::new(dir.path())), GBP);

        assert_eq!(reloaded.len(), 1, "{session} did not persist");
        assert_eq!(reloaded.total_amount(), Money::from_minor(6_00, GBP));
    }

    Ok(())
}
