//! dts CLI - Tool for inspecting and re-encoding DTS shapes.

use std::env;
use std::path::Path;
use std::process;

use dts::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Usage: dts info <file.dts>");
                process::exit(1);
            }
            cmd_info(filtered_args[1]);
        }
        "tree" | "t" => {
            if filtered_args.len() < 2 {
                eprintln!("Usage: dts tree <file.dts>");
                process::exit(1);
            }
            cmd_tree(filtered_args[1]);
        }
        "roundtrip" | "r" => {
            if filtered_args.len() < 3 {
                eprintln!("Usage: dts roundtrip <input.dts> <output.dts>");
                process::exit(1);
            }
            cmd_roundtrip(filtered_args[1], filtered_args[2]);
        }
        "version" | "--version" => println!("{}", dts::library_version()),
        "help" | "h" | "-h" | "--help" => print_help(),
        _ => {
            // Assume it's a file path
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0]);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                process::exit(1);
            }
        }
    }
}

/// `DTS_LOG` overrides the level chosen on the command line.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("DTS_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_help() {
    println!("dts - DTS shape toolkit");
    println!();
    println!("USAGE:");
    println!("    dts [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info      <file>        Show version, counts, details and materials");
    println!("    t, tree      <file>        Show node hierarchy with attached objects");
    println!("    r, roundtrip <in> <out>    Decode, re-encode and compare bytes");
    println!("    version                    Show library version");
    println!("    h, help                    Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (guard checkpoints)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("ENVIRONMENT:");
    println!("    DTS_LOG          Log filter, e.g. DTS_LOG=dts=debug");
}

fn open(path: &str) -> Model {
    info!("Opening shape: {}", path);
    match Model::open(path) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn fail(path: &str, e: Error) -> ! {
    eprintln!("Failed to read {}: {}", path, e);
    process::exit(1);
}

fn cmd_info(path: &str) {
    let model = open(path);
    let version = model.read_version.map_or(0, |v| v.0);

    println!("Shape: {}", path);
    println!("Version: {} (exporter {})", version, model.exporter_version);
    println!("Arena: {} bytes", model.arena().len());
    println!();
    println!("Nodes:      {}", model.nodes.len());
    println!("Objects:    {}", model.objects.len());
    println!("Sub-shapes: {}", model.num_sub_shapes());
    println!("Meshes:     {} ({} present)", model.meshes.len(), model.meshes.iter().flatten().count());
    println!("Sequences:  {}", model.sequences.len());
    println!("Triggers:   {}", model.triggers.len());
    println!("Names:      {}", model.names.len());
    println!();
    println!("Radius: {}  Tube radius: {}", model.radius, model.tube_radius);
    println!("Bounds: {:?}", model.bounds);

    let details = model.details().unwrap_or_else(|e| fail(path, e));
    println!();
    println!("Details:");
    for (i, d) in details.iter().enumerate() {
        let marker = if i as i32 == model.smallest_visible_dl { "*" } else { " " };
        println!(
            " {}{:3}  {:<20} size {:>8.2}  sub-shape {:>2}  object detail {:>2}  polys {:>6}",
            marker,
            i,
            model.name(d.name_index).unwrap_or("?"),
            d.size,
            d.sub_shape_num,
            d.object_detail_num,
            d.poly_count
        );
    }

    if !model.sequences.is_empty() {
        println!();
        println!("Sequences:");
        for seq in &model.sequences {
            println!(
                "  {:<20} {:>4} keys  {:>6.2}s  priority {}{}",
                model.name(seq.name_index).unwrap_or("?"),
                seq.num_keyframes,
                seq.duration,
                seq.priority,
                if seq.is_cyclic() { "  cyclic" } else { "" }
            );
        }
    }

    if !model.materials.is_empty() {
        println!();
        println!("Materials:");
        for (i, m) in model.materials.iter().enumerate() {
            println!("  {:3}  {:<24} flags {:#06x}", i, m.name, m.flags);
        }
    }
}

fn cmd_tree(path: &str) {
    let model = open(path);
    let nodes = model.nodes().unwrap_or_else(|e| fail(path, e));
    let objects = model.objects().unwrap_or_else(|e| fail(path, e));
    debug!("{} nodes, {} objects", nodes.len(), objects.len());

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match usize::try_from(node.parent_index).ok().filter(|&p| p < nodes.len()) {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    println!("Shape: {}", path);
    let print_objects = |node: i32, depth: usize| {
        for o in objects.iter().filter(|o| o.node_index == node) {
            println!("{}[{}] ({} meshes)", "  ".repeat(depth), model.name(o.name_index).unwrap_or("?"), o.num_meshes);
        }
    };

    // depth-first, guarded against cycles by the visit count
    let mut stack: Vec<(usize, usize)> = roots.iter().rev().map(|&r| (r, 1)).collect();
    let mut visited = 0;
    while let Some((index, depth)) = stack.pop() {
        visited += 1;
        if visited > nodes.len() {
            break;
        }
        println!("{}{}", "  ".repeat(depth), model.name(nodes[index].name_index).unwrap_or("?"));
        print_objects(index as i32, depth + 1);
        stack.extend(children[index].iter().rev().map(|&c| (c, depth + 1)));
    }

    // skinned objects hang off no node
    print_objects(-1, 1);
}

fn cmd_roundtrip(input: &str, output: &str) {
    let original = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input, e);
            process::exit(1);
        }
    };
    let model = Model::decode(&original).unwrap_or_else(|e| fail(input, e));
    let encoded = match model.encode() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to encode {}: {}", input, e);
            process::exit(1);
        }
    };
    if let Err(e) = std::fs::write(output, &encoded) {
        eprintln!("Failed to write {}: {}", output, e);
        process::exit(1);
    }

    if encoded == original {
        println!("{} -> {}: identical ({} bytes)", input, output, encoded.len());
    } else {
        let first = encoded.iter().zip(&original).position(|(a, b)| a != b).unwrap_or(encoded.len().min(original.len()));
        println!(
            "{} -> {}: differs at byte {} ({} bytes in, {} bytes out)",
            input,
            output,
            first,
            original.len(),
            encoded.len()
        );
        if model.read_version != Some(Version::CURRENT) {
            println!("note: input was version {:?}, output is version {}", model.read_version.map(|v| v.0), Version::CURRENT.0);
        }
    }
}
