//! Hand-rolled Beta/Gamma numerics shared by the probabilistic analyzer and
//! the recovery learner (spec.md §2 flow: "F ... uses the same Bayesian
//! primitives as D"; spec.md §9, "Numerical code").
//!
//! These are bespoke implementations rather than a dependency on a stats
//! crate, matching this codebase's posture of writing its own numeric
//! solvers in-house rather than wrapping a library (the teacher's
//! `andersen_solver`, `wave_propagation`, and `steensgaard_solver` are all
//! hand-rolled in the same spirit).

use rand::Rng;

/// Safety cap on rejection-sampling loops (spec.md §4.F, "Numerical
/// contracts"): bounds Marsaglia-Tsang's accept/reject step so sampling
/// always terminates.
const REJECTION_SAMPLING_CAP: usize = 1000;

const NEWTON_RAPHSON_TOLERANCE: f64 = 1e-8;
const NEWTON_RAPHSON_MAX_ITERATIONS: usize = 20;
const QUANTILE_CLAMP_LO: f64 = 1e-3;
const QUANTILE_CLAMP_HI: f64 = 1.0 - 1e-3;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the Gamma function via the Lanczos approximation.
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula: Γ(x)Γ(1-x) = π / sin(πx)
        (std::f64::consts::PI / (std::f64::consts::PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let mut a = LANCZOS_COEFFICIENTS[0];
        let t = x + LANCZOS_G + 0.5;
        for (i, coeff) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
            a += coeff / (x + i as f64);
        }
        0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}

fn ln_beta_fn(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Probability density of Beta(a, b) at x.
pub fn beta_pdf(x: f64, a: f64, b: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return 0.0;
    }
    if x == 0.0 || x == 1.0 {
        return 0.0;
    }
    ((a - 1.0) * x.ln() + (b - 1.0) * (1.0 - x).ln() - ln_beta_fn(a, b)).exp()
}

/// Regularized incomplete beta function `I_x(a, b)`, i.e. the Beta(a, b)
/// CDF, via the continued-fraction method (Numerical Recipes' `betacf`).
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_beta = ln_beta_fn(a, b);
    let front = (a * x.ln() + b * (1.0 - x).ln() - ln_beta).exp();

    // Symmetry I_x(a,b) = 1 - I_{1-x}(b,a) improves convergence of the
    // continued fraction for x close to 1.
    if x < (a + 1.0) / (a + b + 2.0) {
        front * betacf(x, a, b) / a
    } else {
        1.0 - front * betacf(1.0 - x, b, a) / b
    }
}

fn betacf(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        let aa = m_f * (b - m_f) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m_f) * (qab + m_f) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Invert the Beta(a, b) CDF at probability `p` via Newton-Raphson,
/// starting from the distribution's mean and clamping each step to
/// `(1e-3, 1-1e-3)` (spec.md §4.D, "Point estimates"). Falls back to the
/// mean on non-convergence (spec.md §7, numerical-failure policy).
pub fn inverse_regularized_incomplete_beta(p: f64, a: f64, b: f64) -> f64 {
    let mean = a / (a + b);
    if !(0.0..=1.0).contains(&p) {
        return mean;
    }

    let mut x = mean.clamp(QUANTILE_CLAMP_LO, QUANTILE_CLAMP_HI);
    for _ in 0..NEWTON_RAPHSON_MAX_ITERATIONS {
        let cdf = regularized_incomplete_beta(x, a, b);
        let density = beta_pdf(x, a, b);
        if density <= 0.0 || !density.is_finite() {
            tracing::warn!(
                p,
                a,
                b,
                "Newton-Raphson quantile inversion hit a non-finite density, falling back to the posterior mean"
            );
            return mean;
        }
        let step = (cdf - p) / density;
        let next = (x - step).clamp(QUANTILE_CLAMP_LO, QUANTILE_CLAMP_HI);
        if (next - x).abs() < NEWTON_RAPHSON_TOLERANCE {
            return next;
        }
        x = next;
    }
    tracing::warn!(
        p,
        a,
        b,
        iterations = NEWTON_RAPHSON_MAX_ITERATIONS,
        "Newton-Raphson quantile inversion did not converge, falling back to the posterior mean"
    );
    mean
}

/// Standard normal variate via Box-Muller.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Sample from Gamma(shape, 1) via Marsaglia-Tsang for `shape >= 1`, and
/// via the boost trick (`Gamma(1+shape) * U^(1/shape)`) for `shape < 1`
/// (spec.md §4.F, "Numerical contracts").
pub fn sample_gamma(shape: f64, rng: &mut impl Rng) -> f64 {
    if shape < 1.0 {
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        return sample_gamma(1.0 + shape, rng) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    for _ in 0..REJECTION_SAMPLING_CAP {
        let mut x;
        let mut v;
        loop {
            x = standard_normal(rng);
            v = 1.0 + c * x;
            if v > 0.0 {
                break;
            }
        }
        let v3 = v * v * v;
        let u: f64 = rng.gen_range(0.0..1.0);
        if u < 1.0 - 0.0331 * x * x * x * x {
            return d * v3;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v3 + v3.ln()) {
            return d * v3;
        }
    }
    // Exceedingly unlikely with the acceptance rates above; fall back to
    // the distribution's mean rather than loop forever.
    tracing::warn!(
        shape,
        cap = REJECTION_SAMPLING_CAP,
        "gamma rejection sampling hit its cap without accepting, falling back to the shape mean"
    );
    shape
}

/// Sample θ ~ Beta(alpha, beta) via the ratio-of-gammas method
/// (Marsaglia-Tsang): draw `x ~ Gamma(alpha)`, `y ~ Gamma(beta)`, return
/// `x / (x+y)` (spec.md §4.F, "selectStrategy" step 3).
pub fn sample_beta(alpha: f64, beta: f64, rng: &mut impl Rng) -> f64 {
    let x = sample_gamma(alpha, rng);
    let y = sample_gamma(beta, rng);
    if x + y <= 0.0 {
        return 0.5;
    }
    x / (x + y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn ln_gamma_matches_known_factorials() {
        // Γ(5) = 4! = 24
        assert!((ln_gamma(5.0).exp() - 24.0).abs() < 1e-6);
        // Γ(1) = 1
        assert!((ln_gamma(1.0).exp() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cdf_is_monotone_and_bounded() {
        let mut prev = 0.0;
        for i in 1..10 {
            let x = i as f64 / 10.0;
            let cdf = regularized_incomplete_beta(x, 9.0, 3.0);
            assert!(cdf >= prev);
            assert!((0.0..=1.0).contains(&cdf));
            prev = cdf;
        }
    }

    #[test]
    fn quantile_inverts_cdf() {
        let (a, b) = (9.0, 3.0);
        let p = 0.5;
        let x = inverse_regularized_incomplete_beta(p, a, b);
        let back = regularized_incomplete_beta(x, a, b);
        assert!((back - p).abs() < 1e-4);
    }

    #[test]
    fn credible_interval_brackets_mean() {
        let (a, b) = (9.0, 3.0);
        let mean = a / (a + b);
        let lo = inverse_regularized_incomplete_beta(0.025, a, b);
        let hi = inverse_regularized_incomplete_beta(0.975, a, b);
        assert!(lo > 0.0 && lo <= mean);
        assert!(hi < 1.0 && hi >= mean);
    }

    #[test]
    fn gamma_samples_are_positive_and_roughly_scaled() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let samples: Vec<f64> = (0..2000).map(|_| sample_gamma(5.0, &mut rng)).collect();
        assert!(samples.iter().all(|&s| s > 0.0));
        let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        // Gamma(shape=5, scale=1) has mean 5.
        assert!((mean - 5.0).abs() < 0.5);
    }

    #[test]
    fn beta_samples_stay_in_unit_interval() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let s = sample_beta(2.0, 5.0, &mut rng);
            assert!((0.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn boost_trick_handles_shape_below_one() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let s = sample_gamma(0.3, &mut rng);
            assert!(s >= 0.0 && s.is_finite());
        }
    }
}
