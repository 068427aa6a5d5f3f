use clap::Args;
use rusty_money::Money;
use tablecart_client::{api::ServerCartSnapshot, context::CartContext};

use super::{describe, show};

#[derive(Debug, Args)]
pub(crate) struct SubmitArgs {
    /// Replace local lines with the server cart afterwards
    #[arg(long)]
    pub(crate) sync: bool,
}

pub(crate) async fn submit(ctx: &CartContext, args: SubmitArgs) -> Result<(), String> {
    let result = if args.sync {
        ctx.submit_and_sync().await
    } else {
        ctx.submit_pending_operations().await
    };

    let snapshot = result.map_err(|error| describe(&error))?;

    println!("{}", summary("submitted", ctx, &snapshot));

    show::run(ctx)
}

pub(crate) async fn sync(ctx: &CartContext) -> Result<(), String> {
    let snapshot = ctx.sync_from_server().await.map_err(|error| describe(&error))?;

    println!("{}", summary("synced", ctx, &snapshot));

    show::run(ctx)
}

fn summary(verb: &str, ctx: &CartContext, snapshot: &ServerCartSnapshot) -> String {
    let lines = snapshot.items.len();

    match snapshot.total {
        Some(total) => {
            let total = Money::from_minor(i64::try_from(total).unwrap_or(i64::MAX), ctx.currency());

            format!("{verb}: server cart has {lines} line(s), total {total}")
        }
        None => format!("{verb}: server cart has {lines} line(s)"),
    }
}
