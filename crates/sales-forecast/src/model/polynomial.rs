//! Lag polynomials in the backshift operator `B`.
//!
//! A polynomial is stored densely as `[c0, c1, ..., cn]` meaning
//! `c0 + c1 B + ... + cn B^n`; every polynomial built here has `c0 = 1`.

/// Dense lag polynomial with a cached list of its non-zero lags.
#[derive(Debug, Clone, PartialEq)]
pub struct LagPolynomial {
    coeffs: Vec<f64>,
    terms: Vec<(usize, f64)>,
}

impl LagPolynomial {
    pub fn new(coeffs: Vec<f64>) -> Self {
        let terms = coeffs
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| **c != 0.0)
            .map(|(lag, c)| (lag, *c))
            .collect();
        Self { coeffs, terms }
    }

    pub fn one() -> Self {
        Self::new(vec![1.0])
    }

    /// `1 + sign * (c1 B^step + c2 B^(2 step) + ...)`.
    pub fn from_lags(values: &[f64], step: usize, sign: f64) -> Self {
        let mut coeffs = vec![0.0; values.len() * step + 1];
        coeffs[0] = 1.0;
        for (i, v) in values.iter().enumerate() {
            coeffs[(i + 1) * step] = sign * v;
        }
        Self::new(coeffs)
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Non-zero `(lag, coefficient)` pairs, excluding lag 0.
    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn multiply(&self, other: &LagPolynomial) -> LagPolynomial {
        let mut out = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if *a == 0.0 {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        LagPolynomial::new(out)
    }

    /// Apply to a series, keeping only outputs with a full history:
    /// `out[t - degree] = Σ c_k y[t - k]` for `t >= degree`.
    pub fn apply(&self, y: &[f64]) -> Vec<f64> {
        let degree = self.degree();
        if y.len() <= degree {
            return Vec::new();
        }
        (degree..y.len())
            .map(|t| {
                y[t] + self
                    .terms
                    .iter()
                    .map(|(lag, c)| c * y[t - lag])
                    .sum::<f64>()
            })
            .collect()
    }
}

/// `(1 - B)^d (1 - B^s)^D`.
pub fn differencing(d: usize, seasonal_d: usize, period: usize) -> LagPolynomial {
    let mut poly = LagPolynomial::one();
    let first = LagPolynomial::new(vec![1.0, -1.0]);
    for _ in 0..d {
        poly = poly.multiply(&first);
    }
    if period > 0 {
        let seasonal = LagPolynomial::from_lags(&[1.0], period, -1.0);
        for _ in 0..seasonal_d {
            poly = poly.multiply(&seasonal);
        }
    }
    poly
}

/// `(1 - φ1 B - ...)(1 - Φ1 B^s - ...)`.
pub fn autoregressive(ar: &[f64], seasonal_ar: &[f64], period: usize) -> LagPolynomial {
    let regular = LagPolynomial::from_lags(ar, 1, -1.0);
    if seasonal_ar.is_empty() {
        return regular;
    }
    regular.multiply(&LagPolynomial::from_lags(seasonal_ar, period, -1.0))
}

/// `(1 + θ1 B + ...)(1 + Θ1 B^s + ...)`.
pub fn moving_average(ma: &[f64], seasonal_ma: &[f64], period: usize) -> LagPolynomial {
    let regular = LagPolynomial::from_lags(ma, 1, 1.0);
    if seasonal_ma.is_empty() {
        return regular;
    }
    regular.multiply(&LagPolynomial::from_lags(seasonal_ma, period, 1.0))
}

/// First `n` coefficients of `ma(B) / ar(B)`.
pub fn psi_weights(ar: &LagPolynomial, ma: &LagPolynomial, n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = ma.coeffs().get(j).copied().unwrap_or(0.0);
        for &(lag, c) in ar.terms() {
            if lag > j {
                break;
            }
            value -= c * psi[j - lag];
        }
        psi.push(value);
    }
    psi
}

/// Map unconstrained values onto coefficients of a stationary AR polynomial.
///
/// Each value becomes a partial autocorrelation `x / sqrt(1 + x^2)` in
/// `(-1, 1)`; Durbin-Levinson turns those into AR coefficients.
pub fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let partial: Vec<f64> = unconstrained
        .iter()
        .map(|x| x / (1.0 + x * x).sqrt())
        .collect();

    let mut coeffs: Vec<f64> = Vec::with_capacity(partial.len());
    for (k, r) in partial.iter().enumerate() {
        let previous = coeffs.clone();
        for i in 0..k {
            coeffs[i] = previous[i] - r * previous[k - 1 - i];
        }
        coeffs.push(*r);
    }
    coeffs
}
