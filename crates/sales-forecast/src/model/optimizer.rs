//! Derivative-free Nelder-Mead simplex minimizer.

use tracing::trace;

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead with the standard reflection, expansion, contraction and
/// shrink coefficients (1, 2, 0.5, 0.5).
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    /// Initial simplex offset along each axis.
    step: f64,
    x_tolerance: f64,
    f_tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            step: 0.1,
            x_tolerance: 1e-6,
            f_tolerance: 1e-10,
        }
    }
}

impl NelderMead {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..Default::default()
        }
    }

    /// Minimize `objective` from `start`. Non-finite objective values are
    /// treated as `f64::MAX`.
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let f = |x: &[f64]| {
            let v = objective(x);
            if v.is_finite() { v } else { f64::MAX }
        };
        let n = start.len();
        if n == 0 {
            return Minimum {
                point: Vec::new(),
                value: f(start),
                iterations: 0,
                converged: true,
            };
        }

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(start.to_vec());
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += if vertex[i] == 0.0 {
                self.step
            } else {
                self.step * vertex[i].abs().max(1.0)
            };
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|x| f(x)).collect();

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.max_iterations {
            iterations += 1;

            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
            simplex = order.iter().map(|i| simplex[*i].clone()).collect();
            values = order.iter().map(|i| values[*i]).collect();

            if self.has_converged(&simplex, &values) {
                converged = true;
                break;
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|x| x[j]).sum::<f64>() / n as f64)
                .collect();
            let worst = simplex[n].clone();
            let along = |t: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&worst)
                    .map(|(c, w)| c + t * (c - w))
                    .collect()
            };

            let reflected = along(1.0);
            let f_reflected = f(&reflected);

            if f_reflected < values[0] {
                let expanded = along(2.0);
                let f_expanded = f(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, f_contracted) = if f_reflected < values[n] {
                let outside = along(0.5);
                let v = f(&outside);
                (outside, v)
            } else {
                let inside = along(-0.5);
                let v = f(&inside);
                (inside, v)
            };
            if f_contracted < values[n].min(f_reflected) {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = best
                    .iter()
                    .zip(&simplex[i])
                    .map(|(b, x)| b + 0.5 * (x - b))
                    .collect();
                values[i] = f(&simplex[i]);
            }
        }

        let best = (0..=n)
            .min_by(|a, b| values[*a].total_cmp(&values[*b]))
            .unwrap_or(0);
        trace!(
            "Nelder-Mead finished after {} iterations (converged: {})",
            iterations, converged
        );
        Minimum {
            point: simplex[best].clone(),
            value: values[best],
            iterations,
            converged,
        }
    }

    /// Run twice: the second run restarts from the first run's best point.
    pub fn minimize_with_restart<F>(&self, objective: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let first = self.minimize(&objective, start);
        let second = self.minimize(&objective, &first.point);
        let iterations = first.iterations + second.iterations;
        if second.value <= first.value {
            Minimum {
                iterations,
                ..second
            }
        } else {
            Minimum { iterations, ..first }
        }
    }

    fn has_converged(&self, simplex: &[Vec<f64>], values: &[f64]) -> bool {
        let best = values[0];
        let worst = values[values.len() - 1];
        if worst == f64::MAX {
            return false;
        }
        let f_spread = (worst - best).abs() <= self.f_tolerance * best.abs().max(1e-300);
        let x_spread = simplex[1..].iter().all(|x| {
            x.iter()
                .zip(&simplex[0])
                .all(|(a, b)| (a - b).abs() <= self.x_tolerance)
        });
        f_spread || x_spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_minimum() {
        let objective = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let result = NelderMead::default().minimize_with_restart(objective, &[0.0, 0.0]);
        assert!(result.converged);
        assert!((result.point[0] - 3.0).abs() < 1e-3);
        assert!((result.point[1] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_rosenbrock() {
        let objective =
            |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let result = NelderMead::new(5000).minimize_with_restart(objective, &[-1.2, 1.0]);
        assert!((result.point[0] - 1.0).abs() < 1e-2, "{:?}", result.point);
        assert!((result.point[1] - 1.0).abs() < 2e-2, "{:?}", result.point);
    }

    #[test]
    fn test_non_finite_values_are_avoided() {
        let objective = |x: &[f64]| {
            if x[0] > 1.0 {
                f64::NAN
            } else {
                (x[0] - 0.5).powi(2)
            }
        };
        let result = NelderMead::default().minimize(objective, &[0.0]);
        assert!(result.value.is_finite());
        assert!((result.point[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_empty_start() {
        let result = NelderMead::default().minimize(|_| 4.0, &[]);
        assert_eq!(result.value, 4.0);
        assert!(result.point.is_empty());
    }
}
