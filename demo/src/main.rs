use clap::Parser;
use ntree::{AbsoluteDifference, NTree};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exercise an integer NTree: a fixed smoke scenario, then a random workload.
#[derive(Parser, Debug)]
#[command(name = "demo", version)]
struct Args {
    /// Maximum number of children per node
    #[arg(short, long, default_value_t = 4)]
    branching: usize,

    /// Number of random insertions
    #[arg(short, long, default_value_t = 10_000)]
    items: usize,

    /// Number of random nearest neighbor queries
    #[arg(short, long, default_value_t = 5)]
    queries: usize,

    /// Neighbors reported per query
    #[arg(short, default_value_t = 3)]
    k: usize,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    // Smoke scenario
    let mut tree = NTree::with_root_and_branching(10_i64, AbsoluteDifference, args.branching)?;
    for key in [2, 5, 9, 6, 15, 10] {
        let added = tree.add_data(key);
        info!(key, added, "insert");
    }
    for key in [5, 12, 6] {
        println!("contains {key}: {}", tree.contains_item(&key));
    }
    if let Some(nearest) = tree.get_nearest_neighbour(&7) {
        println!("nearest to 7: {nearest}");
    }

    // Random workload
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut tree = NTree::with_branching(AbsoluteDifference, args.branching)?;
    let mut duplicates = 0;
    for _ in 0..args.items {
        let key: i64 = rng.gen_range(0..1_000_000);
        if !tree.add_data(key) {
            duplicates += 1;
        }
    }

    let stats = tree.stats();
    println!("Insertions: {}", stats.size);
    println!("Duplicates: {duplicates}");
    println!("Tree height: {}", stats.height);
    println!("Leaves: {}", stats.leaves);
    println!("Average fanout: {:.2}", stats.average_fanout);

    for _ in 0..args.queries {
        let query: i64 = rng.gen_range(0..1_000_000);
        let neighbors = tree
            .nearest_neighbours(&query, args.k)
            .into_iter()
            .map(|(key, distance)| format!("{key} ({distance})"))
            .collect::<Vec<_>>();
        println!("{query}: {}", neighbors.join(", "));
    }

    Ok(())
}
