//! Writes a synthetic truth/prediction CSV pair shaped like the damage-grade
//! data the evaluator expects.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Index drawn from unnormalised `weights`.
    fn categorical(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        let mut u = self.next_f64() * total;
        for (i, &w) in weights.iter().enumerate() {
            if u < w {
                return i;
            }
            u -= w;
        }
        weights.len() - 1
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let m = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&z| (z - m).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[derive(Parser, Debug)]
#[command(about = "Write synthetic truth.csv and predictions.csv")]
struct Args {
    /// Directory for the two files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(long, default_value_t = 1000)]
    rows: usize,
    /// Class priors; one class per entry, labelled 1..=n
    #[arg(long, value_delimiter = ',', default_values_t = [0.1, 0.57, 0.33])]
    priors: Vec<f64>,
    /// Logit boost of the true class; higher means a better model
    #[arg(long, default_value_t = 1.5)]
    signal: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let k = args.priors.len();

    let truth_path = args.out_dir.join("truth.csv");
    let pred_path = args.out_dir.join("predictions.csv");
    let mut truth = csv::Writer::from_path(&truth_path)
        .with_context(|| format!("creating {}", truth_path.display()))?;
    let mut pred = csv::Writer::from_path(&pred_path)
        .with_context(|| format!("creating {}", pred_path.display()))?;

    truth.write_record(["building_id", "damage_grade"])?;
    let mut header = vec!["building_id".to_string(), "damage_grade_pred".to_string()];
    header.extend((1..=k).map(|c| c.to_string()));
    pred.write_record(&header)?;

    for row in 0..args.rows {
        let id = (100_000 + row).to_string();
        let class = rng.categorical(&args.priors);
        let logits: Vec<f64> = (0..k)
            .map(|c| {
                let boost = if c == class { args.signal } else { 0.0 };
                rng.gauss(boost, 1.0)
            })
            .collect();
        let probs = softmax(&logits);
        let predicted = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);

        truth.write_record([id.clone(), (class + 1).to_string()])?;
        let mut record = vec![id, (predicted + 1).to_string()];
        record.extend(probs.iter().map(|p| format!("{p}")));
        pred.write_record(&record)?;
    }
    truth.flush()?;
    pred.flush()?;

    println!(
        "Wrote {} rows ({k} classes) to {} and {}",
        args.rows,
        truth_path.display(),
        pred_path.display()
    );
    println!("Rows share a building_id; evaluate with --id-column building_id");
    Ok(())
}
