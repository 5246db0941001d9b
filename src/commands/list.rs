use crate::context::AppContext;
use crate::error::AppResult;
use crate::mail::ListState;
use crate::output::mails;

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let store = ctx.mail_store()?;
    store.load_all().await?;
    show(ctx, &store.snapshot())
}

pub(crate) fn show(ctx: &AppContext, state: &ListState) -> AppResult<()> {
    ctx.output.emit_lines(&mails::render_list(state), &state.items())
}
