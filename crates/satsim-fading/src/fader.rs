//! Time-correlated sum-of-sinusoids faders.
//!
//! Each link owns a [`Fader`] whose oscillator phases are drawn once from the
//! link's RNG. Evaluating it at successive times yields a correlated sample
//! path whose statistics follow the parameters of the current Markov state.

use crate::provider::{FaderFamily, LooConf, RayleighConf};
use crate::{FadingError, Result};
use rand::Rng;
use std::f64::consts::PI;

/// Largest oscillator count a parameter tuple may ask for.
pub const MAX_OSCILLATORS: usize = 64;

/// Floor applied to every sample so a zero channel gain never yields -inf.
pub const MIN_FADING_DB: f64 = -60.0;

/// Random phases for one bank of oscillators.
#[derive(Debug, Clone)]
struct OscillatorBank {
    theta: f64,
    in_phase: Vec<f64>,
    quadrature: Vec<f64>,
}

impl OscillatorBank {
    fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            theta: rng.gen_range(-PI..PI),
            in_phase: (0..MAX_OSCILLATORS).map(|_| rng.gen_range(-PI..PI)).collect(),
            quadrature: (0..MAX_OSCILLATORS).map(|_| rng.gen_range(-PI..PI)).collect(),
        }
    }

    /// Arrival angle of oscillator `n` out of `count`.
    fn angle(&self, n: usize, count: usize) -> f64 {
        (2.0 * PI * (n + 1) as f64 - PI + self.theta) / (4.0 * count as f64)
    }

    /// Complex gain with unit mean power.
    fn complex_gain(&self, count: usize, doppler_hz: f64, t: f64) -> (f64, f64) {
        let w = 2.0 * PI * doppler_hz * t;
        let (mut re, mut im) = (0.0, 0.0);
        for n in 0..count {
            let alpha = self.angle(n, count);
            re += (w * alpha.cos() + self.in_phase[n]).cos();
            im += (w * alpha.sin() + self.quadrature[n]).cos();
        }
        let scale = (count as f64).sqrt().recip();
        (re * scale, im * scale)
    }

    /// Zero-mean process with unit variance.
    fn gaussian(&self, count: usize, doppler_hz: f64, t: f64) -> f64 {
        let w = 2.0 * PI * doppler_hz * t;
        let sum: f64 = (0..count)
            .map(|n| (w * self.angle(n, count).cos() + self.in_phase[n]).cos())
            .sum();
        sum * (2.0 / count as f64).sqrt()
    }
}

/// Per-link fader evaluating Rayleigh or Loo parameter tuples.
#[derive(Debug, Clone)]
pub struct Fader {
    multipath: OscillatorBank,
    direct: OscillatorBank,
}

impl Fader {
    /// Draw oscillator phases from `rng`.
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            multipath: OscillatorBank::new(rng),
            direct: OscillatorBank::new(rng),
        }
    }

    /// Channel power gain in dB at time `t_s` for one parameter tuple.
    ///
    /// The tuple layout follows [`RayleighConf`] or [`LooConf`]. The result is
    /// finite and never below [`MIN_FADING_DB`]. A tuple of the wrong length
    /// is a configuration error.
    pub fn sample_db(&self, family: FaderFamily, params: &[f64], t_s: f64) -> Result<f64> {
        check_tuple(family, params)?;
        let power = match family {
            FaderFamily::Rayleigh => {
                let count = oscillators(params[RayleighConf::OSCILLATORS]);
                let (re, im) =
                    self.multipath
                        .complex_gain(count, params[RayleighConf::DOPPLER_HZ], t_s);
                re * re + im * im
            }
            FaderFamily::Loo => {
                let direct_count = oscillators(params[LooConf::DIRECT_OSCILLATORS]);
                let shadow = self
                    .direct
                    .gaussian(direct_count, params[LooConf::DIRECT_DOPPLER_HZ], t_s);
                let direct_db = params[LooConf::DIRECT_MEAN_DB] + params[LooConf::DIRECT_STD_DB] * shadow;
                let direct = db_to_amplitude(direct_db);

                let multipath_count = oscillators(params[LooConf::MULTIPATH_OSCILLATORS]);
                let sigma = db_to_amplitude(params[LooConf::MULTIPATH_POWER_DB]);
                let (re, im) = self.multipath.complex_gain(
                    multipath_count,
                    params[LooConf::MULTIPATH_DOPPLER_HZ],
                    t_s,
                );
                let re = direct + sigma * re;
                let im = sigma * im;
                re * re + im * im
            }
        };
        Ok((10.0 * power.log10()).max(MIN_FADING_DB))
    }
}

/// Largest value [`Fader::sample_db`] can return for a parameter tuple.
pub fn upper_bound_db(family: FaderFamily, params: &[f64]) -> Result<f64> {
    check_tuple(family, params)?;
    let bound = match family {
        FaderFamily::Rayleigh => {
            let count = oscillators(params[RayleighConf::OSCILLATORS]) as f64;
            10.0 * (2.0 * count).log10()
        }
        FaderFamily::Loo => {
            let direct_count = oscillators(params[LooConf::DIRECT_OSCILLATORS]) as f64;
            let multipath_count = oscillators(params[LooConf::MULTIPATH_OSCILLATORS]) as f64;
            let direct_max = db_to_amplitude(
                params[LooConf::DIRECT_MEAN_DB]
                    + params[LooConf::DIRECT_STD_DB] * (2.0 * direct_count).sqrt(),
            );
            let multipath_max =
                db_to_amplitude(params[LooConf::MULTIPATH_POWER_DB]) * (2.0 * multipath_count).sqrt();
            20.0 * (direct_max + multipath_max).log10()
        }
    };
    Ok(bound)
}

fn check_tuple(family: FaderFamily, params: &[f64]) -> Result<()> {
    if params.len() == family.parameter_count() {
        Ok(())
    } else {
        Err(FadingError::Configuration(format!(
            "{:?} fader expects {} parameters, got {}",
            family,
            family.parameter_count(),
            params.len()
        )))
    }
}

fn oscillators(value: f64) -> usize {
    (value.round() as usize).clamp(1, MAX_OSCILLATORS)
}

fn db_to_amplitude(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rayleigh_mean_power_near_unity() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        // Average over many independent faders at a fixed time.
        let params = [16.0, 50.0];
        let mean: f64 = (0..2000)
            .map(|_| {
                let db = Fader::new(&mut rng)
                    .sample_db(FaderFamily::Rayleigh, &params, 0.37)
                    .unwrap();
                10f64.powf(db / 10.0)
            })
            .sum::<f64>()
            / 2000.0;
        assert!((mean - 1.0).abs() < 0.1, "mean power {mean}");
    }

    #[test]
    fn test_samples_within_support() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let fader = Fader::new(&mut rng);
        let rayleigh = [10.0, 30.0];
        let loo = [-6.0, 3.0, -12.0, 10.0, 10.0, 0.5, 30.0];
        for step in 0..500 {
            let t = step as f64 * 0.01;
            let r = fader.sample_db(FaderFamily::Rayleigh, &rayleigh, t).unwrap();
            assert!(r.is_finite() && r >= MIN_FADING_DB);
            assert!(r <= upper_bound_db(FaderFamily::Rayleigh, &rayleigh).unwrap() + 1e-9);

            let l = fader.sample_db(FaderFamily::Loo, &loo, t).unwrap();
            assert!(l.is_finite() && l >= MIN_FADING_DB);
            assert!(l <= upper_bound_db(FaderFamily::Loo, &loo).unwrap() + 1e-9);
        }
    }

    #[test]
    fn test_samples_vary_over_time() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let fader = Fader::new(&mut rng);
        let params = [10.0, 30.0];
        let a = fader.sample_db(FaderFamily::Rayleigh, &params, 0.0).unwrap();
        let b = fader.sample_db(FaderFamily::Rayleigh, &params, 0.05).unwrap();
        assert_ne!(a, b);
        // Deterministic for a given time.
        assert_eq!(a, fader.sample_db(FaderFamily::Rayleigh, &params, 0.0).unwrap());
    }

    #[test]
    fn test_loo_tracks_direct_mean() {
        // With weak multipath and no shadowing spread the sample sits at the direct mean.
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let fader = Fader::new(&mut rng);
        let params = [-3.0, 0.0, -80.0, 8.0, 8.0, 1.0, 10.0];
        let db = fader.sample_db(FaderFamily::Loo, &params, 1.0).unwrap();
        assert!((db + 3.0).abs() < 0.01, "sample {db}");
    }

    #[test]
    fn test_short_tuple_is_configuration_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let fader = Fader::new(&mut rng);
        assert!(matches!(
            fader.sample_db(FaderFamily::Loo, &[-3.0, 1.0], 0.0),
            Err(FadingError::Configuration(_))
        ));
        assert!(matches!(
            upper_bound_db(FaderFamily::Rayleigh, &[8.0]),
            Err(FadingError::Configuration(_))
        ));
    }
}
