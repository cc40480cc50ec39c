mod app;
mod entry;

use probe_runner::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
