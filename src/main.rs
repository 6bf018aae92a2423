//! Binary entrypoint that lists a user's conversations through the sync core.

use std::process::ExitCode;

use chat_sync_core::start_chat_sync;

fn main() -> ExitCode {
    start_chat_sync::run()
}
