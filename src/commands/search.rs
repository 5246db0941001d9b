use crate::cli::SearchArgs;
use crate::context::AppContext;
use crate::error::AppResult;

use super::list;

pub async fn run(ctx: &AppContext, args: SearchArgs) -> AppResult<()> {
    let store = ctx.mail_store()?;
    store.set_search_key(args.key);
    store.run_search().await?;
    list::show(ctx, &store.snapshot())
}
