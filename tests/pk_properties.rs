use approx::assert_relative_eq;
use pharmtrack::prelude::pk::*;
use pharmtrack::prelude::*;
use pharmtrack::pk::single_dose_concentration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HOUR: i64 = 3_600_000;
const HOUR_F: f64 = 3_600_000.0;
const BW: f64 = 70.0;

fn random_params(rng: &mut StdRng) -> PkParameters {
    PkParameters::new(
        rng.random_range(0.5..72.0),
        rng.random_range(0.1..30.0),
        rng.random_range(0.05..=1.0),
        rng.random_range(0.05..5.0),
    )
}

fn reference_medication() -> Medication {
    Medication::new("ref", "Reference", PkParameters::new(30.0, 20.0, 0.8, 1.0))
}

// =============================================================================
// SINGLE-DOSE PROPERTIES
// =============================================================================

#[test]
fn zero_before_the_dose_and_decays_to_zero() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let params = random_params(&mut rng);
        let amount = rng.random_range(1.0..500.0);
        for elapsed in [-100.0, -1.0, -1e-9] {
            assert_eq!(single_dose_concentration(&params, amount, elapsed, BW).unwrap(), 0.0);
        }
        let peak = peak_concentration(&params, amount, BW).unwrap();
        let horizon = 200.0 * params.half_life.max(1.0 / params.absorption_rate);
        let late = single_dose_concentration(&params, amount, horizon, BW).unwrap();
        assert!(late < peak * 1e-6, "{params:?}: late {late} vs peak {peak}");
    }
}

#[test]
fn single_dose_curve_is_unimodal() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let params = random_params(&mut rng);
        let tmax = time_to_peak(&params).unwrap();
        let horizon = 10.0 * tmax.max(params.half_life);
        let samples: Vec<f64> = (1..=400)
            .map(|i| {
                single_dose_concentration(&params, 100.0, horizon * i as f64 / 400.0, BW).unwrap()
            })
            .collect();

        // The slope changes sign at most once: rising, then never rising again
        let mut sign_changes = 0;
        let mut rising = true;
        for w in samples.windows(2) {
            let now_rising = w[1] > w[0];
            if now_rising != rising {
                sign_changes += 1;
                rising = now_rising;
            }
        }
        assert!(sign_changes <= 1, "{params:?}: {sign_changes} slope sign changes");

        let max = samples.iter().cloned().fold(0.0, f64::max);
        let peak = peak_concentration(&params, 100.0, BW).unwrap();
        assert!(max <= peak * (1.0 + 1e-9), "{params:?}: sample {max} above peak {peak}");
    }
}

#[test]
fn superposition_is_linear() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..50 {
        let med = Medication::new("m", "M", random_params(&mut rng));
        let mut dose = |id: &str| {
            MedicationDose::new(id, "m", rng.random_range(0..48) * HOUR, rng.random_range(1.0..100.0))
        };
        let (a, b) = (dose("a"), dose("b"));
        let t = rng.random_range(0.0..96.0) * HOUR_F;

        let both = compute_concentration(&med, &[a.clone(), b.clone()], t, None).unwrap();
        let only_a = compute_concentration(&med, &[a], t, None).unwrap();
        let only_b = compute_concentration(&med, &[b], t, None).unwrap();
        assert_relative_eq!(both, only_a + only_b, max_relative = 1e-12, epsilon = 1e-15);
    }
}

#[test]
fn dose_order_does_not_matter() {
    let med = reference_medication();
    let doses: Vec<MedicationDose> = (0..6)
        .map(|i| MedicationDose::new(format!("d{i}"), "ref", i * 12 * HOUR, 20.0 + i as f64))
        .collect();
    let mut shuffled = doses.clone();
    shuffled.reverse();
    shuffled.swap(1, 4);
    let forward = build_concentration_curve(&med, &doses, 0.0, 96.0 * HOUR_F, None, None).unwrap();
    let backward = build_concentration_curve(&med, &shuffled, 0.0, 96.0 * HOUR_F, None, None).unwrap();
    assert_eq!(forward, backward);
}

// =============================================================================
// REFERENCE SCENARIOS
// =============================================================================

#[test]
fn reference_medication_single_dose() {
    let med = reference_medication();
    let doses = vec![MedicationDose::new("d1", "ref", 0, 20.0)];

    assert_eq!(compute_concentration(&med, &doses, 0.0, Some(70.0)).unwrap(), 0.0);
    let early = compute_concentration(&med, &doses, 0.1 * HOUR_F, Some(70.0)).unwrap();
    let later = compute_concentration(&med, &doses, 0.5 * HOUR_F, Some(70.0)).unwrap();
    assert!(early > 0.0);
    assert!(later > early);

    let curve = build_concentration_curve(&med, &doses, 0.0, 72.0 * HOUR_F, Some(100), Some(70.0)).unwrap();
    assert_eq!(curve.len(), 100);
    assert_eq!(curve[0].time, 0.0);
    assert_eq!(curve[99].time, 72.0 * HOUR_F);
    assert!(curve.windows(2).all(|w| w[1].time > w[0].time));
    for point in &curve {
        if let Some(c) = point.concentration {
            assert!(c.is_finite() && c >= 0.0);
        }
    }
}

#[test]
fn two_doses_a_day_apart() {
    let med = reference_medication();
    let doses = vec![
        MedicationDose::new("d1", "ref", 0, 20.0),
        MedicationDose::new("d2", "ref", 24 * HOUR, 20.0),
    ];
    let combined = compute_concentration(&med, &doses, 30.0 * HOUR_F, None).unwrap();
    let first = single_dose_concentration(&med.pk, 20.0, 30.0, BW).unwrap();
    let second = single_dose_concentration(&med.pk, 20.0, 6.0, BW).unwrap();
    assert_relative_eq!(combined, first + second, max_relative = 1e-12);
}

#[test]
fn invalid_parameters_fail_fast() {
    let mut med = reference_medication();
    med.pk.bioavailability = 1.2;
    let err = compute_concentration(&med, &[], 0.0, None).unwrap_err();
    assert!(matches!(err, PharmtrackError::InvalidParameter { .. }));
    assert!(err.to_string().contains("bioavailability"));

    let med = reference_medication();
    assert!(matches!(
        build_concentration_curve(&med, &[], 10.0, 5.0, None, None),
        Err(PharmtrackError::InvalidWindow { .. })
    ));
    assert!(matches!(
        build_concentration_curve(&med, &[], 0.0, 5.0, Some(1), None),
        Err(PharmtrackError::InvalidPoints { points: 1 })
    ));
}

#[test]
fn empty_history_yields_absent_samples() {
    let curve = build_concentration_curve(&reference_medication(), &[], 0.0, HOUR_F, Some(10), None).unwrap();
    assert_eq!(curve.len(), 10);
    assert!(curve.iter().all(|p| p.concentration.is_none()));
}
