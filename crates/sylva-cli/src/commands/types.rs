//! `sylva types`: print the type table.

use std::path::Path;

use serde_json::json;
use sylva_engine::{LoadedProgram, TypeDescriptor};
use sylva_runtime::{Runtime, RuntimeOptions};

pub fn execute(
    file: &Path,
    options: RuntimeOptions,
    all: bool,
    as_json: bool,
) -> anyhow::Result<i32> {
    let loaded = Runtime::with_options(options).load_file(file)?;
    let program = &loaded.program;

    if as_json {
        let rows: Vec<_> = program.types().iter().map(describe).collect();
        let missing: Vec<_> = program
            .types()
            .missing()
            .map(|tid| program.display_type(tid))
            .collect();
        let mut out = json!({ "types": rows });
        if all {
            out["undeclared"] = json!(missing);
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(0);
    }

    println!(
        "{:>6}  {:<14} {:>6} {:>6} {:>6}  {:<8} {:<8}  name",
        "tid", "kind", "inline", "assign", "heap", "imask", "hmask"
    );
    for desc in program.types().iter() {
        println!(
            "{:>6}  {:<14} {:>6} {:>6} {:>6}  {:<8} {:<8}  {}",
            desc.tid.as_u32(),
            desc.kind.kind_name(),
            desc.size.inlinedatasize,
            desc.size.assigndatasize,
            desc.size.heapsize,
            desc.size.inlinedmask.to_string(),
            heapmask(desc),
            desc.name
        );
    }
    if all {
        print_missing(program);
    }
    Ok(0)
}

fn heapmask(desc: &TypeDescriptor) -> String {
    desc.size
        .heapmask
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

fn describe(desc: &TypeDescriptor) -> serde_json::Value {
    json!({
        "tid": desc.tid.as_u32(),
        "name": desc.name,
        "kind": desc.kind.kind_name(),
        "layout": desc.layout().to_string(),
        "heapsize": desc.size.heapsize,
        "inlinedatasize": desc.size.inlinedatasize,
        "assigndatasize": desc.size.assigndatasize,
        "heapmask": desc.size.heapmask.as_ref().map(ToString::to_string),
        "inlinedmask": desc.size.inlinedmask.to_string(),
    })
}

fn print_missing(program: &LoadedProgram) {
    for tid in program.types().missing() {
        println!(
            "{:>6}  {:<14} {:>6} {:>6} {:>6}  {:<8} {:<8}  {}",
            tid.as_u32(),
            "(undeclared)",
            "-",
            "-",
            "-",
            "-",
            "-",
            program.display_type(tid)
        );
    }
}
