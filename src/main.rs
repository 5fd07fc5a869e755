//! PLONK Circuit Demo
//!
//! Builds the cube-root circuit `y³ = x` (y private, x public) twice, once as a
//! setup pass and once as a proving pass, and prints the resulting constraint
//! system.

use plonk_circuit::{Circuit, CircuitConfig, CompiledCircuit, Fp, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn cube_root(config: CircuitConfig, y: u64, x: u64) -> Result<CompiledCircuit<Fp>> {
    let circuit = Circuit::with_config(config);
    let x = circuit.new_public_variable(|| Ok(Fp::from_u64(x)))?;
    let y = circuit.new_variable(|| Ok(Fp::from_u64(y)))?;
    y.mul(&y)?.mul(&y)?.assert_equal(&x)?;
    Ok(circuit.finish())
}

fn run(y: u64, x: u64) -> Result<()> {
    let setup = cube_root(CircuitConfig::setup("cube-root"), y, x)?;
    let proving = cube_root(CircuitConfig::prover("cube-root"), y, x)?;
    info!(
        same_shape = setup.constraint_system == proving.constraint_system,
        "compared setup and proving passes"
    );

    let cs = &proving.constraint_system;
    println!("Constraint system ({} gates, {} private, {} public):", cs.num_gates(), cs.num_private, cs.num_public);
    for (i, gate) in cs.gates.iter().enumerate() {
        println!("  [{}] {:<8} {}", i, gate.origin, gate.constraint_string());
    }
    println!();

    if let Some(witness) = &proving.witness {
        for (i, value) in witness.public.iter().enumerate() {
            let shown = value.map_or_else(|| "unset".to_string(), |v| v.to_short_hex());
            println!("  public x-{} = {}", i + 1, shown);
        }
    }

    let unsatisfied = proving.unsatisfied_gates();
    if unsatisfied.is_empty() {
        println!("Witness satisfies all gates");
    } else {
        println!("Witness fails gates {:?}", unsatisfied);
    }
    println!();

    match serde_json::to_string_pretty(cs) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("failed to serialize constraint system: {}", e),
    }
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let y: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(2);
    let x: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(8);

    println!("Proving knowledge of y with y^3 = x  (y = {}, x = {})", y, x);
    println!();

    if let Err(e) = run(y, x) {
        error!("circuit construction failed: {}", e);
        std::process::exit(1);
    }
}
