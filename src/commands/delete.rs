use serde::Serialize;

use crate::cli::DeleteArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct DeleteResult {
    item_id: String,
    remaining: usize,
}

pub async fn run(ctx: &AppContext, args: DeleteArgs) -> AppResult<()> {
    let store = ctx.mail_store()?;
    store.load_all().await?;

    let known = store
        .snapshot()
        .items()
        .iter()
        .any(|item| item.item_id == args.id);
    if !known {
        return Err(AppError::InvalidInput(format!(
            "no mail item with id `{}`; run `mailsched list` to see ids",
            args.id
        )));
    }

    store.delete(&args.id).await?;

    let result = DeleteResult {
        item_id: args.id,
        remaining: store.snapshot().items().len(),
    };
    let text = format!(
        "deleted mail item {} ({} remaining)",
        result.item_id, result.remaining
    );
    ctx.output.emit(&text, &result)
}
