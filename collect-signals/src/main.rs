//! Collect health signals for a list of repositories.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use collect_signals_lib::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};
use tokio_util::sync::CancellationToken;

/// Default host that writes to the real standard streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    }));

    run(&mut RealHost, std::env::args(), &cancel).await
}
