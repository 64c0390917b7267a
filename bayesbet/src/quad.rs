//! Adaptive numerical integration.
//!
//! Uses the 7-point Gauss/15-point Kronrod pair on each subinterval. The subinterval with
//! the largest error estimate is repeatedly bisected until the aggregate error estimate
//! meets the requested tolerance or the subinterval limit is reached. At least one bisection
//! is always performed: the two rules can agree exactly on an even or aliased integrand
//! whose features fall between the nodes of the initial grid.

use std::ops::Range;

use anyhow::bail;

/// Kronrod abscissae on [-1, 1]; odd indices are shared with the Gauss rule.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_225,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_18,
    0.140_653_259_715_525_92,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_41,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_83,
];

/// Gauss weights for `XGK[1]`, `XGK[3]`, `XGK[5]` and `XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

#[derive(Debug, Clone, PartialEq)]
pub struct QuadConfig {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub limit: usize,
    pub initial_subdivisions: usize,
}
impl QuadConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.abs_tol < 0.0 || self.rel_tol < 0.0 {
            bail!("tolerances must be non-negative")
        }
        if self.abs_tol == 0.0 && self.rel_tol == 0.0 {
            bail!("at least one of the tolerances must be positive")
        }
        if self.initial_subdivisions == 0 {
            bail!("at least one initial subdivision is required")
        }
        if self.limit < self.initial_subdivisions {
            bail!(
                "subinterval limit {} cannot be less than the initial subdivisions {}",
                self.limit,
                self.initial_subdivisions
            )
        }
        Ok(())
    }
}

impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1.49e-8,
            rel_tol: 1.49e-8,
            limit: 200,
            initial_subdivisions: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Integral {
    pub value: f64,
    pub error: f64,
    pub subintervals: usize,
}

#[derive(Debug, Clone)]
struct Segment {
    range: Range<f64>,
    value: f64,
    error: f64,
}

fn kronrod(f: &mut impl FnMut(f64) -> f64, range: Range<f64>) -> Segment {
    let centre = 0.5 * (range.start + range.end);
    let half_length = 0.5 * (range.end - range.start);

    let f_centre = f(centre);
    let mut kronrod = f_centre * WGK[7];
    let mut gauss = f_centre * WG[3];
    for (j, (&x, &wk)) in XGK.iter().zip(WGK.iter()).take(7).enumerate() {
        let offset = half_length * x;
        let pair = f(centre - offset) + f(centre + offset);
        kronrod += wk * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Segment {
        range,
        value: kronrod * half_length,
        error: ((kronrod - gauss) * half_length).abs(),
    }
}

/// Integrates `f` over the interval `[a, b]`.
pub fn integrate(mut f: impl FnMut(f64) -> f64, a: f64, b: f64, config: &QuadConfig) -> Integral {
    debug_assert!(config.validate().is_ok(), "{:?}", config.validate());
    if a == b {
        return Integral {
            value: 0.0,
            error: 0.0,
            subintervals: 0,
        };
    }

    let step = (b - a) / config.initial_subdivisions as f64;
    let mut segments = (0..config.initial_subdivisions)
        .map(|index| {
            let start = a + step * index as f64;
            let end = if index + 1 == config.initial_subdivisions {
                b
            } else {
                start + step
            };
            kronrod(&mut f, start..end)
        })
        .collect::<Vec<_>>();

    let mut bisected = false;
    loop {
        let (value, error) = segments
            .iter()
            .fold((0.0, 0.0), |(value, error), segment| {
                (value + segment.value, error + segment.error)
            });
        let tolerance = f64::max(config.abs_tol, config.rel_tol * value.abs());
        if (bisected && error <= tolerance) || segments.len() >= config.limit {
            return Integral {
                value,
                error,
                subintervals: segments.len(),
            };
        }

        let (worst, _) = segments
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(worst, worst_error), (index, segment)| {
                if segment.error > worst_error {
                    (index, segment.error)
                } else {
                    (worst, worst_error)
                }
            });
        let Segment { range, .. } = segments.swap_remove(worst);
        let midpoint = 0.5 * (range.start + range.end);
        segments.push(kronrod(&mut f, range.start..midpoint));
        segments.push(kronrod(&mut f, midpoint..range.end));
        bisected = true;
    }
}

/// Integrates `f(x, y)` over the rectangle `x_range × y_range`, by adaptively integrating over
/// `y` for each `x` visited by the adaptive integration over `x`.
pub fn integrate_2d(
    mut f: impl FnMut(f64, f64) -> f64,
    x_range: Range<f64>,
    y_range: Range<f64>,
    config: &QuadConfig,
) -> Integral {
    let mut inner_error = 0.0_f64;
    let mut outer = integrate(
        |x| {
            let inner = integrate(|y| f(x, y), y_range.start, y_range.end, config);
            inner_error = inner_error.max(inner.error);
            inner.value
        },
        x_range.start,
        x_range.end,
        config,
    );
    outer.error += inner_error * (x_range.end - x_range.start).abs();
    outer
}

#[cfg(test)]
mod tests;
