// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::future::Future;
use std::path::Path;

use thiserror::Error;
use tokio::time::Instant;
use tracing_subscriber::layer::SubscriberExt;

use bpd::dump::Value;
use bpd::BehaviorProviderDefinition;

pub mod report;

/// Shared entry point of the command line tools: the tokio runtime, a
/// stderr subscriber filtered by `RUST_LOG`, panics routed through
/// tracing, and a total wall time print.
#[tokio::main]
pub async fn application_main<Fut>(main: impl FnOnce() -> Fut)
where
    Fut: Future,
{
    tracing::subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(tracing_subscriber::filter::EnvFilter::from_default_env()),
    )
    .expect("set up the subscriber");
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));

    let start = Instant::now();

    main().await;

    let elapsed = start.elapsed();
    eprintln!("(in {:?})", elapsed);
}

/// Everything that can go wrong bringing one dumped object from disk into
/// the editing model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] bpd::sequence::DecodeError),
}

/// Read one dump tree in the JSON interchange form.
pub async fn load_dump(path: &Path) -> Result<Value, LoadError> {
    let data = tokio::fs::read(path).await?;
    let json: serde_json::Value = serde_json::from_slice(&data)?;
    Ok(Value::from_json(&json))
}

/// Read and fully decode one dumped object.
pub async fn load_object(path: &Path) -> Result<BehaviorProviderDefinition, LoadError> {
    Ok(BehaviorProviderDefinition::from_dump(&load_dump(path).await?)?)
}
