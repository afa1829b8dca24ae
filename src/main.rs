use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use parafoil_sim::dynamics::state::{OMEGA, X, Y};
use parafoil_sim::io::csv;
use parafoil_sim::io::json::{self, FlightSummary, read_scenario_file};
use parafoil_sim::sim::Parafoil;
use parafoil_sim::vehicle::{presets, ScenarioParams};
use parafoil_sim::ControlStrategy;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyKind {
    Zero,
    Random,
    Fitted,
    Homing,
}

/// Simulate a parafoil descent and print the trajectory.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Guidance law
    #[arg(long, value_enum, default_value = "homing")]
    strategy: StrategyKind,

    /// Turn-rate limit, deg/s
    #[arg(long, default_value_t = 10.0)]
    max_rate_deg: f64,

    /// Collocation knots for the random and fitted laws
    #[arg(long, default_value_t = 12)]
    knots: usize,

    /// Output samples over the descent
    #[arg(long, default_value_t = 1000)]
    samples: usize,

    /// Seed for the random collocation values
    #[arg(long)]
    seed: Option<u64>,

    /// Scenario JSON file (defaults to the demo drop)
    #[arg(long)]
    scenario: Option<String>,

    /// Write the trajectory as CSV
    #[arg(long)]
    csv: Option<String>,

    /// Write a JSON flight summary
    #[arg(long)]
    summary: Option<String>,
}

fn build_strategy(args: &Args) -> anyhow::Result<ControlStrategy> {
    let max_rate = args.max_rate_deg.to_radians();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let strategy = match args.strategy {
        StrategyKind::Zero => ControlStrategy::zero(max_rate)?,
        StrategyKind::Homing => ControlStrategy::homing(max_rate)?,
        StrategyKind::Random => ControlStrategy::random_collocation_with(&mut rng, max_rate, args.knots)?,
        StrategyKind::Fitted => {
            ControlStrategy::random_fitted_collocation_with(&mut rng, max_rate, args.knots)?
        }
    };
    Ok(strategy)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let params: ScenarioParams = match &args.scenario {
        Some(path) => read_scenario_file(path)
            .with_context(|| format!("failed to load scenario from {path}"))?,
        None => presets::demo_drop(),
    };

    let strategy = build_strategy(&args)?;
    let mut parafoil = Parafoil::new(params)?.with_strategy(strategy);

    // -----------------------------------------------------------------------
    // Run simulation
    // -----------------------------------------------------------------------
    let trajectory = parafoil.simulate(args.samples)?;
    let name = parafoil.strategy().name().to_string();
    let summary = FlightSummary::from_trajectory(&name, &trajectory)
        .context("trajectory is empty, request at least one sample")?;

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  PARAFOIL DESCENT — {} guidance", name);
    println!("====================================================================");
    println!();
    println!("  Scenario");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Release:       ({:>7.1}, {:>7.1}) m   Heading:    {:>7.1} deg",
        params.x0,
        params.y0,
        params.omega0.to_degrees()
    );
    println!(
        "  Airspeed:      {:>8.2} m/s         Sink rate:  {:>7.2} m/s",
        params.v, params.vz
    );
    println!(
        "  Altitude:      {:>8.1} m           Duration:   {:>7.2} s",
        params.h0,
        parafoil.t_max()
    );
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Initial distance: {:>8.1} m", summary.initial_distance);
    println!(
        "  Landing point:    ({:.1}, {:.1}) m",
        summary.landing_x, summary.landing_y
    );
    println!("  Miss distance:    {:>8.1} m", summary.miss_distance);
    println!(
        "  Max turn rate:    {:>8.2} deg/s",
        summary.max_turn_rate.to_degrees()
    );
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>8}  {:>8}  {:>8}",
        "t (s)", "x (m)", "y (m)", "hdg(deg)", "alt (m)", "u(deg/s)"
    );
    println!("  {}", "─".repeat(58));

    let sample_interval = (trajectory.len() / 25).max(1);
    for (i, (t, s)) in trajectory.iter().enumerate() {
        if i % sample_interval != 0 && i != trajectory.len() - 1 {
            continue;
        }
        println!(
            "  {:>7.2}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.2}",
            t,
            s.state[X],
            s.state[Y],
            s.state[OMEGA].to_degrees(),
            s.altitude,
            s.control.to_degrees()
        );
    }
    println!("====================================================================");
    println!();

    if let Some(path) = &args.csv {
        csv::write_trajectory_file(path, &trajectory)
            .with_context(|| format!("failed to write {path}"))?;
        println!("Exported: {path}");
    }
    if let Some(path) = &args.summary {
        json::write_summary_file(path, &params, &summary)
            .with_context(|| format!("failed to write {path}"))?;
        println!("Exported: {path}");
    }

    Ok(())
}
