//! `fetchgate check`: validate and screen only.

use anyhow::Result;
use fetchgate_core::FetchGate;

pub async fn run_check(gate: &FetchGate, url: &str) -> Result<()> {
    match gate.admit(url).await {
        Ok(admitted) => {
            tracing::debug!(host = %admitted.host(), addrs = ?admitted.addrs(), "check passed");
            println!("safe");
        }
        Err(e) => println!("unsafe: {}", e),
    }
    Ok(())
}
