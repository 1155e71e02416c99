//! Ward linkage on four points.
//!
//! Run with `RUST_LOG=debug cargo run --example linkage` to see the fit logged.

use rust_fast_cluster::linkage;
use tracing_subscriber::EnvFilter;

fn main() -> rust_fast_cluster::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Condensed distance matrix for 4 points (length = 6)
    let d = vec![
        0.1, // dist(0,1)
        0.2, // dist(0,2)
        0.3, // dist(0,3)
        0.4, // dist(1,2)
        0.5, // dist(1,3)
        0.6, // dist(2,3)
    ];

    let z = linkage(&d, "ward")?;

    println!("Linkage matrix (Z):\n{}", z);
    Ok(())
}
