use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use log::info;

use basic_cleaning::artifact::local::LocalArtifactStore;
use basic_cleaning::artifact::{ArtifactSink, NewArtifact};
use basic_cleaning::logging;

/// Write a synthetic listings CSV and register it as the raw input artifact.
#[derive(Parser)]
#[command(name = "generate-sample", version)]
struct Args {
    /// Root directory of the artifact store
    #[arg(long, env = "ARTIFACT_ROOT", default_value = "artifacts")]
    artifact_root: PathBuf,

    /// Artifact name to publish under
    #[arg(long, default_value = "sample.csv")]
    name: String,

    /// Number of listings to generate
    #[arg(long, default_value_t = 500)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const NEIGHBOURHOODS: [(&str, &str, f64, f64); 5] = [
    ("Manhattan", "Midtown", 40.7549, -73.9840),
    ("Brooklyn", "Williamsburg", 40.7081, -73.9571),
    ("Queens", "Astoria", 40.7644, -73.9235),
    ("Bronx", "Mott Haven", 40.8091, -73.9229),
    ("Staten Island", "St. George", 40.6437, -74.0736),
];

const ROOM_TYPES: [(&str, f64); 3] = [
    ("Entire home/apt", 1.0),
    ("Private room", 0.55),
    ("Shared room", 0.35),
];

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init("info");

    let mut rng = SimpleRng::new(args.seed);
    let first_review = NaiveDate::from_ymd_opt(2011, 1, 1).context("valid epoch date")?;

    let csv_path = std::env::temp_dir()
        .join(format!("generate-sample-{}", std::process::id()))
        .join(&args.name);
    if let Some(dir) = csv_path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    writer.write_record([
        "id",
        "name",
        "host_id",
        "neighbourhood_group",
        "neighbourhood",
        "latitude",
        "longitude",
        "room_type",
        "price",
        "minimum_nights",
        "number_of_reviews",
        "last_review",
        "reviews_per_month",
    ])?;

    for i in 0..args.rows {
        let &(group, hood, lat, lon) = rng.pick(&NEIGHBOURHOODS);
        let &(room, factor) = rng.pick(&ROOM_TYPES);

        // Log-normal prices with a thin tail of free and luxury outliers.
        let roll = rng.next_f64();
        let price = if roll < 0.01 {
            0
        } else if roll < 0.03 {
            2_000 + (rng.next_f64() * 8_000.0) as i64
        } else {
            (rng.gauss(4.7, 0.5).exp() * factor).round().max(10.0) as i64
        };

        let reviews = (rng.gauss(20.0, 25.0).max(0.0)) as u32;
        let (last_review, per_month) = if reviews == 0 {
            (String::new(), String::new())
        } else {
            let day = first_review + Duration::days((rng.next_f64() * 3_100.0) as i64);
            let text = if rng.next_f64() < 0.02 {
                "unknown".to_string()
            } else {
                day.format("%Y-%m-%d").to_string()
            };
            (text, format!("{:.2}", rng.next_f64() * 4.0))
        };

        writer.write_record([
            (2_539 + i * 7).to_string(),
            format!("{room} in {hood}"),
            (2_787 + rng.next_u64() % 250_000_000).to_string(),
            group.to_string(),
            hood.to_string(),
            format!("{:.5}", lat + rng.gauss(0.0, 0.01)),
            format!("{:.5}", lon + rng.gauss(0.0, 0.01)),
            room.to_string(),
            price.to_string(),
            (1 + rng.next_u64() % 30).to_string(),
            reviews.to_string(),
            last_review,
            per_month,
        ])?;
    }
    writer.flush().context("flushing sample CSV")?;
    drop(writer);

    let store = LocalArtifactStore::new(&args.artifact_root);
    let artifact = NewArtifact {
        name: args.name.clone(),
        artifact_type: "raw_data".to_string(),
        description: format!("{} synthetic listings (seed {})", args.rows, args.seed),
    };
    let published = store.publish(&artifact, &csv_path);
    if let Some(dir) = csv_path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
    let published = published?;

    info!("Wrote {} listings to {published}", args.rows);
    Ok(())
}
