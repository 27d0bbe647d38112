//! Cucumber scenarios for document assembly
//!
//! Feature files live in `features/` at the workspace root. Set
//! `AKTE_FEATURE` to the file name of one feature to run only that file:
//!
//! ```bash
//! AKTE_FEATURE=sections.feature cargo test --test bdd
//! ```

#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

mod helpers;
mod steps;
mod world;

use cucumber::World;
use std::path::PathBuf;

fn features_path() -> PathBuf {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(|p| p.join("features"))
        .expect("package lives two levels below the workspace root");

    match std::env::var("AKTE_FEATURE") {
        Ok(name) if !name.is_empty() => root.join(name),
        _ => root,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .init();

    let features = features_path();
    assert!(
        features.exists(),
        "no features at {}",
        features.display()
    );

    world::AssemblyWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run_and_exit(features)
        .await;
}
