//! Integration tests for submitting offline edits across restarts

use std::sync::Arc;

use rusty_money::iso::GBP;
use tablecart::{
    cart::PendingOperation,
    catalog::Menu,
    menu::SelectedOption,
    storage::{CartNamespace, FileStore},
};
use tablecart_client::{
    api::{ApiError, CartAction, MockCartApi, ServerCartSnapshot},
    context::CartContext,
    submission::{RetryPolicy, SubmissionError},
};
use tempfile::TempDir;
use testresult::TestResult;

const MENU: &str = r#"
currency: GBP
items:
  pasta:
    name: Pasta
    price: "10.00 GBP"
    options:
      - id: sauce
        name: Sauce
        required: true
        choices:
          - id: pesto
            name: Pesto
            price: "2.50 GBP"
"#;

fn context(dir: &TempDir, api: MockCartApi) -> CartContext {
    CartContext::new(
        CartNamespace::table("21"),
        Arc::new(FileStore::new(dir.path())),
        GBP,
        Arc::new(api),
        RetryPolicy::none(),
    )
}

#[tokio::test]
async fn failed_submission_is_retried_after_restart() -> TestResult {
    let dir = TempDir::new()?;
    let menu = Menu::from_yaml_str(MENU)?;
    let pasta = menu.item("pasta").cloned().ok_or("pasta missing")?;

    {
        let mut api = MockCartApi::new();
        api.expect_submit_batch()
            .once()
            .returning(|_, _| Err(ApiError::Status {
                status: 502,
                body: String::new(),
            }));

        let ctx = context(&dir, api);
        ctx.add_item(pasta.clone(), 2, vec![SelectedOption::new("sauce", ["pesto"])])?;
        ctx.add_item(pasta, 1, vec![SelectedOption::new("sauce", ["pesto"])])?;

        let result = ctx.submit_pending_operations().await;
        assert!(matches!(result, Err(SubmissionError::Network { attempts: 1, .. })));
    }

    let mut api = MockCartApi::new();
    api.expect_submit_batch()
        .once()
        .withf(|batch, namespace| {
            *namespace == CartNamespace::table("21")
                && matches!(
                    batch.actions.as_slice(),
                    [CartAction::AddItem { quantity: 3, .. }]
                )
        })
        .return_once(|_, _| Ok(ServerCartSnapshot::default()));

    let ctx = context(&dir, api);
    assert!(matches!(
        ctx.pending_operations().as_slice(),
        [PendingOperation::AddItem { quantity: 3, .. }]
    ));

    ctx.submit_pending_operations().await?;

    assert!(!ctx.has_pending_operations());
    assert_eq!(ctx.lines().len(), 1);

    Ok(())
}
