// SPDX-FileCopyrightText: 2026 The bpd developers
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::ffi::OsStr;
use std::path::PathBuf;

use clap::Parser;
use walkdir::WalkDir;

use bpd_utils::report::Summary;
use bpd_utils::{application_main, load_object};

#[derive(Parser)]
#[command(version, about = "Decode dumped BehaviorProviderDefinition objects")]
struct Args {
    #[arg(required = true)]
    file_or_directory: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();

    application_main(|| async {
        let mut objects = 0usize;
        let mut failed = 0usize;
        let mut totals = Summary::default();
        let paths = args.file_or_directory.into_iter().flat_map(|arg| {
            WalkDir::new(arg).into_iter().filter_map(|entry| {
                let entry = entry.ok()?;
                (entry.file_type().is_file()
                    && entry.path().extension() == Some(OsStr::new("json")))
                .then(|| entry.path().to_path_buf())
            })
        });
        for path in paths {
            objects += 1;
            match load_object(&path).await {
                Ok(object) => {
                    let summary = Summary::of(&object);
                    tracing::info!("{}: {summary}", path.display());
                    totals += summary;
                }
                Err(err) => {
                    failed += 1;
                    tracing::error!("{}: {err}", path.display());
                }
            }
        }
        println!("{objects} objects ({failed} failed): {totals}");
    });
}
