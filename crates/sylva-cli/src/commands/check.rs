//! `sylva check`: load an assembly and report what it contains.

use std::path::Path;

use sylva_runtime::{CheckpointOutcome, Runtime, RuntimeOptions};

pub fn execute(file: &Path, options: RuntimeOptions) -> anyhow::Result<i32> {
    let runtime = Runtime::with_options(options);
    match runtime.check_file(file) {
        CheckpointOutcome::Completed(loaded) => {
            println!("{}: ok", file.display());
            println!("{}", loaded.program.summary());
            if !loaded.pending.is_empty() {
                println!("deferred constants: {}", loaded.pending.len());
                for pending in &loaded.pending {
                    let name = loaded
                        .program
                        .names()
                        .invoke_name(pending.ikey)
                        .unwrap_or("?");
                    println!(
                        "  @{:<6} {} : {}",
                        pending.offset,
                        name,
                        loaded.program.display_type(pending.tid)
                    );
                }
            }
            Ok(0)
        }
        CheckpointOutcome::Trapped { code, message, .. } => {
            eprintln!("{}: {}", file.display(), message);
            Ok(code)
        }
    }
}
