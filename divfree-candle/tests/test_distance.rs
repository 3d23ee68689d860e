use anyhow::Result;
use divfree_candle::{
    divergence_free_distance, DivergenceFree, DivergenceFreeConfig, DivergenceFreeDistance,
    PotentialConfig, StopReason, TrainingConfig,
};
use divfree_core::{
    BoxSpace, Canonicalizer, CoverageSampler, DatasetSampler, Distance, PearsonAggregator,
    ProductSampler, RewardFunction, SharedReward,
};
use ndarray::ArrayD;
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn product_sampler(seed: u64) -> ProductSampler {
    ProductSampler::new(
        BoxSpace::scalar(-1.0, 1.0).unwrap(),
        BoxSpace::scalar(-1.0, 1.0).unwrap(),
        seed,
    )
    .unwrap()
}

fn sampler(seed: u64) -> Arc<dyn CoverageSampler> {
    Arc::new(product_sampler(seed))
}

/// Sampler over `n` fixed transitions. Every canonicalization drawing `n` rows trains on
/// the same transitions, whatever was drawn before.
fn dataset_sampler(seed: u64, n: usize) -> Result<Arc<dyn CoverageSampler>> {
    let data = product_sampler(seed).sample(n)?;
    Ok(Arc::new(DatasetSampler::new(data, seed)?))
}

fn small_config(max_epochs: usize) -> DivergenceFreeConfig {
    DivergenceFreeConfig::default()
        .potential(PotentialConfig::default().hidden_dim(32))
        .training(
            TrainingConfig::default()
                .max_epochs(max_epochs)
                .log_interval(50)
                .seed(7),
        )
}

fn distance_with(
    sampler: Arc<dyn CoverageSampler>,
    discount_factor: f64,
    config: DivergenceFreeConfig,
) -> Result<DivergenceFreeDistance> {
    let canonicalizer = DivergenceFree::new(discount_factor, sampler.clone(), config)?;
    Ok(Distance::new(canonicalizer, PearsonAggregator::new(sampler)))
}

fn distance(
    seed: u64,
    discount_factor: f64,
    config: DivergenceFreeConfig,
) -> Result<DivergenceFreeDistance> {
    distance_with(sampler(seed), discount_factor, config)
}

fn potential_difference() -> SharedReward {
    Arc::new(|s: &ArrayD<f32>, _: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| s_ - s)
}

fn action_dominated() -> SharedReward {
    Arc::new(|s: &ArrayD<f32>, a: &ArrayD<f32>, s_: &ArrayD<f32>, _: &[i8]| {
        a * 10f32 + (s_ - s)
    })
}

fn constant(c: f32) -> SharedReward {
    Arc::new(move |s: &ArrayD<f32>, _: &ArrayD<f32>, _: &ArrayD<f32>, _: &[i8]| {
        ArrayD::from_elem(&s.shape()[..1], c)
    })
}

#[test]
fn test_deterministic_under_fixed_seeds() -> Result<()> {
    init_logger();
    let held_out = sampler(99).sample(100)?;

    let run = || -> Result<(f64, ArrayD<f32>)> {
        let dist = distance(3, 0.9, small_config(100))?;
        let canonical = dist
            .canonicalizer()
            .canonicalize(action_dominated(), Some(100))?;
        let d = dist.distance(potential_difference(), action_dominated(), Some(200), Some(100))?;
        Ok((d, canonical.evaluate_sample(&held_out)?))
    };

    let (d1, out1) = run()?;
    let (d2, out2) = run()?;
    assert!((d1 - d2).abs() < 1e-4);
    assert!(out1
        .iter()
        .zip(out2.iter())
        .all(|(a, b)| (a - b).abs() < 1e-4));
    Ok(())
}

#[test]
fn test_identical_rewards() -> Result<()> {
    init_logger();
    let r = action_dominated();
    let d = distance_with(dataset_sampler(5, 200)?, 1.0, small_config(200))?.distance(
        r.clone(),
        r,
        Some(200),
        Some(200),
    )?;
    assert!(d < 0.05);
    Ok(())
}

#[test]
fn test_parallel_canonicalization() -> Result<()> {
    init_logger();
    let r = action_dominated();
    let d = distance_with(dataset_sampler(6, 200)?, 1.0, small_config(200))?
        .parallel(true)
        .distance(r.clone(), r, Some(200), Some(200))?;
    assert!(d < 0.05);
    Ok(())
}

#[test]
fn test_potential_difference() -> Result<()> {
    init_logger();
    let r = potential_difference();
    let dist = distance_with(dataset_sampler(9, 200)?, 1.0, small_config(300))?;

    let canonical = dist.canonicalizer().canonicalize(r.clone(), Some(200))?;
    let losses = canonical.loss_history().as_slice();
    assert_eq!(losses.len(), 300);
    assert!(losses[losses.len() - 1] < losses[0]);

    let d = dist.distance(r.clone(), r, Some(200), Some(200))?;
    assert!(d < 0.05);
    Ok(())
}

#[test]
fn test_constant_vs_potential_difference() -> Result<()> {
    init_logger();
    let d = distance(8, 0.9, small_config(200))?.distance(
        potential_difference(),
        constant(0.3),
        Some(300),
        Some(100),
    )?;
    assert_eq!(d, 0.5);
    Ok(())
}

#[test]
#[ignore]
fn test_potential_difference_end_to_end() -> Result<()> {
    init_logger();
    let r = potential_difference();
    let dist = distance(10, 1.0, DivergenceFreeConfig::default())?;
    let canonical = dist.canonicalizer().canonicalize(r.clone(), Some(500))?;
    assert!(canonical.loss_history().last().unwrap() < 1e-3);
    assert!(matches!(
        canonical.stop_reason(),
        Some(StopReason::EarlyStopped { .. }) | Some(StopReason::MaxEpochsReached)
    ));

    let d = dist.distance(r.clone(), r, Some(500), Some(500))?;
    assert!(d < 0.1);
    Ok(())
}

#[test]
#[ignore]
fn test_constant_vs_potential_difference_end_to_end() -> Result<()> {
    init_logger();
    let d = divergence_free_distance(
        constant(1.0),
        potential_difference(),
        sampler(11),
        0.5,
        Some(500),
        Some(500),
    )?;
    assert_eq!(d, 0.5);
    Ok(())
}
