//! Basic GCRA rate limiting example.
//!
//! Run with:
//! ```text
//! cargo run --example basic_gcra --features memory
//! ```

use std::time::Duration;

use rush_rs::{GCRALimiter, MemoryStore, Quota, Throttle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let throttle = Throttle::new(Quota::per_second(10, 5), GCRALimiter::new(MemoryStore::new()));

    println!("=== Basic GCRA Rate Limiting Demo ===\n");
    println!("Quota: 10 requests/second, burst: 5\n");

    for i in 1..=15 {
        let result = throttle.check("user:123", 1).await?;

        if !result.limited {
            println!("Request {i}: allowed (remaining: {})", result.remaining);
        } else {
            println!(
                "Request {i}: denied (retry after: {:?})",
                result.retry_after
            );
        }
    }

    println!("\n--- Waiting 1 second for recovery ---\n");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let result = throttle.check("user:123", 1).await?;
    println!(
        "After recovery: {} (remaining: {})",
        if !result.limited { "allowed" } else { "denied" },
        result.remaining
    );

    println!("\n--- Rate Limit Headers ---");
    for (name, value) in rush_rs::headers::RateLimitHeaders::from(&result).to_vec() {
        println!("{name}: {value}");
    }

    Ok(())
}
