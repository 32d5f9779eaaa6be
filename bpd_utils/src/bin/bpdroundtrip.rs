// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use clap::Parser;
use futures::{stream, StreamExt};
use walkdir::WalkDir;

use bpd::dump::multiline;
use bpd::BehaviorProviderDefinition;
use bpd_utils::report::{round_trip, RoundTrip};
use bpd_utils::{application_main, load_object, LoadError};

#[derive(Parser)]
#[command(
    version,
    about = "Re-export dumped BehaviorProviderDefinition objects and verify the round trip"
)]
struct Args {
    /// Print the canonical object text of every clean object.
    #[arg(short, long)]
    text: bool,

    /// Break printed object lines over indented lines.
    #[arg(short, long)]
    multiline: bool,

    #[arg(required = true)]
    file_or_directory: Vec<PathBuf>,
}

async fn check_file(path: &Path) -> Result<(BehaviorProviderDefinition, RoundTrip), LoadError> {
    let object = load_object(path).await?;
    let outcome = round_trip(&object)?;
    Ok((object, outcome))
}

fn print_text(object: &mut BehaviorProviderDefinition, multiline_output: bool) {
    object.reconsolidate();
    let text = object.to_text();
    if multiline_output {
        for line in text.lines() {
            println!("{}", multiline(line));
        }
    } else {
        println!("{text}");
    }
}

fn main() {
    let args = Args::parse();

    application_main(|| async {
        let paths: Vec<_> = args
            .file_or_directory
            .iter()
            .flat_map(|arg| {
                WalkDir::new(arg).into_iter().filter_map(|entry| {
                    let entry = entry.ok()?;
                    (entry.file_type().is_file()
                        && entry.path().extension() == Some(OsStr::new("json")))
                    .then(|| entry.path().to_path_buf())
                })
            })
            .collect();

        let mut outcomes = stream::iter(
            paths
                .into_iter()
                .map(|path| async move { (path.clone(), check_file(&path).await) }),
        )
        .buffered(16);

        let mut clean = 0usize;
        let mut reconsolidated = 0usize;
        let mut diverged = 0usize;
        let mut failed = 0usize;
        while let Some((path, outcome)) = outcomes.next().await {
            match outcome {
                Ok((mut object, RoundTrip::Clean)) => {
                    clean += 1;
                    if args.text {
                        print_text(&mut object, args.multiline);
                    }
                }
                Ok((mut object, RoundTrip::Reconsolidated { diff })) => {
                    reconsolidated += 1;
                    tracing::warn!("{}: not in canonical form", path.display());
                    println!("{diff}");
                    if args.text {
                        print_text(&mut object, args.multiline);
                    }
                }
                Ok((_, RoundTrip::Diverged { diff })) => {
                    diverged += 1;
                    tracing::error!("{}: round trip diverged", path.display());
                    println!("{diff}");
                }
                Err(err) => {
                    failed += 1;
                    tracing::error!("{}: {err}", path.display());
                }
            }
        }
        println!(
            "{clean} clean, {reconsolidated} reconsolidated, {diverged} diverged, {failed} failed"
        );
    });
}
