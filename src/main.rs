//! msa-sim: execution-time estimator for memory placement plans

use std::env;

use msa_sim::cost::{AnalyticCostModel, TripCounts};
use msa_sim::estimator::{AllocationSequence, TimelineEstimator};
use msa_sim::program::{MemorySpace, Opcode, PrimitiveType, Program, Shape};
use msa_sim::Config;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "--sample-config") {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = Config::get();

    if args.iter().any(|a| a == "--show-config") {
        println!("{}", toml::to_string_pretty(config)?);
        if let Some(path) = Config::user_config_path() {
            println!("# user config: {}", path.display());
        }
        return Ok(());
    }

    let costs = AnalyticCostModel::from_config(config)?;
    let options = config.estimator_options();

    println!("flops/s: {:e}  bytes/s: {:e}", config.flops_per_second(), config.bytes_per_second());
    println!();

    let (program, trips) = contended_copies(options.alternate_memory_space)?;
    let mut estimator = TimelineEstimator::new(&costs, &trips, options);
    let elapsed = estimator.compute_estimated_elapsed_time(&program, &AllocationSequence::new())?;
    let stats = estimator.tracker().stats();
    println!("{}", program.name());
    println!("  elapsed:        {:.6e} s", elapsed);
    println!("  contended time: {:.6e} s", stats.contended_time);

    let (program, trips) = counted_loop()?;
    let mut estimator = TimelineEstimator::new(&costs, &trips, options);
    let elapsed = estimator.compute_estimated_elapsed_time(&program, &AllocationSequence::new())?;
    println!("{}", program.name());
    println!("  elapsed:        {:.6e} s", elapsed);

    Ok(())
}

fn print_usage() {
    println!("Usage: msa-sim [--sample-config | --show-config]");
    println!();
    println!("Without options, runs the built-in scenarios with the resolved config.");
}

/// Prefetch of 1 MiB overlapping an eviction of 256 KiB, with a matmul in between.
fn contended_copies(alternate: MemorySpace) -> anyhow::Result<(Program, TripCounts)> {
    let mut p = Program::new("contended-copies");
    let entry = p.add_computation("entry");
    p.set_entry(entry)?;

    let big = Shape::array(PrimitiveType::F32, &[256, 1024]);
    let small = Shape::array(PrimitiveType::F32, &[256, 256]);

    let weights = p.add_instruction(entry, "weights", Opcode::Parameter(0), big.clone(), &[])?;
    let acts = p.add_instruction(
        entry,
        "activations",
        Opcode::Parameter(1),
        small.clone().in_memory_space(alternate),
        &[],
    )?;
    let prefetch = p.add_instruction(
        entry,
        "prefetch",
        Opcode::CopyStart,
        big.clone().in_memory_space(alternate),
        &[weights],
    )?;
    let evict = p.add_instruction(entry, "evict", Opcode::CopyStart, small.clone(), &[acts])?;
    let dot = p.add_instruction(
        entry,
        "dot",
        Opcode::Dot { contracting_dim: 1 },
        small.clone().in_memory_space(alternate),
        &[acts, acts],
    )?;
    p.add_instruction(entry, "evict-done", Opcode::CopyDone, small, &[evict])?;
    let fast = p.add_instruction(
        entry,
        "prefetch-done",
        Opcode::CopyDone,
        big.in_memory_space(alternate),
        &[prefetch],
    )?;
    p.add_instruction(entry, "out", Opcode::Tuple, Shape::tuple(vec![]), &[dot, fast])?;

    Ok((p, TripCounts::new()))
}

/// Scalar loop of 42 iterations.
fn counted_loop() -> anyhow::Result<(Program, TripCounts)> {
    let mut p = Program::new("counted-loop");
    let s32 = Shape::scalar(PrimitiveType::S32);

    let cond = p.add_computation("condition");
    let limit = p.add_instruction(cond, "limit", Opcode::Constant, s32.clone(), &[])?;
    let i = p.add_instruction(cond, "i", Opcode::Parameter(0), s32.clone(), &[])?;
    p.add_instruction(cond, "lt", Opcode::Compare, Shape::scalar(PrimitiveType::Pred), &[i, limit])?;

    let body = p.add_computation("body");
    let one = p.add_instruction(body, "one", Opcode::Constant, s32.clone(), &[])?;
    let i = p.add_instruction(body, "i.b", Opcode::Parameter(0), s32.clone(), &[])?;
    p.add_instruction(body, "next", Opcode::Add, s32.clone(), &[i, one])?;

    let entry = p.add_computation("entry");
    p.set_entry(entry)?;
    let zero = p.add_instruction(entry, "zero", Opcode::Constant, s32.clone(), &[])?;
    let while_id = p.add_instruction(entry, "while", Opcode::While { condition: cond, body }, s32, &[zero])?;

    let mut trips = TripCounts::new();
    trips.set(while_id, 42);
    Ok((p, trips))
}
