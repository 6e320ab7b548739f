// Reference distributions for the hypothesis tests
//
// Tail probabilities only; everything here is f64 and allocation-free.
//
// - Normal: complementary error function with Chebyshev fit (fractional
//   error < 1.2e-7 everywhere, so small tail probabilities stay accurate)
// - Student t: regularised incomplete beta (continued fraction)
// - Chi-square: regularised upper incomplete gamma (series / continued fraction)

const EPS: f64 = 1e-14;
const FPMIN: f64 = 1e-300;
const MAX_ITER: usize = 500;

/// Complementary error function
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal survival function P(Z > z)
pub fn normal_sf(z: f64) -> f64 {
    0.5 * erfc(z / std::f64::consts::SQRT_2)
}

/// Standard normal CDF P(Z <= z)
pub fn normal_cdf(z: f64) -> f64 {
    normal_sf(-z)
}

/// Natural log of the gamma function (Lanczos approximation), x > 0
pub fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];

    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Regularised upper incomplete gamma Q(a, x)
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut del = 1.0 / a;
    let mut sum = del;
    for _ in 0..MAX_ITER {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
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
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Regularised incomplete beta I_x(a, b)
pub fn beta_inc(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let clamp = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Student t survival function P(T > t) with `df` degrees of freedom
pub fn student_t_sf(t: f64, df: f64) -> f64 {
    let tail = 0.5 * beta_inc(df / 2.0, 0.5, df / (df + t * t));
    if t >= 0.0 {
        tail
    } else {
        1.0 - tail
    }
}

/// Chi-square survival function P(X > x) with `df` degrees of freedom
pub fn chi2_sf(x: f64, df: f64) -> f64 {
    gamma_q(df / 2.0, x / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_normal_reference_points() {
        assert!(close(normal_sf(0.0), 0.5, 1e-7));
        assert!(close(normal_sf(1.959_963_985), 0.025, 1e-6));
        assert!(close(normal_cdf(-1.644_853_627), 0.05, 1e-6));
        assert!(close(normal_sf(-3.0), 0.998_650_1, 1e-6));
    }

    #[test]
    fn test_normal_far_tail_stays_positive() {
        let p = normal_sf(10.0);
        assert!(p > 0.0 && p < 1e-20, "p = {p}");
    }

    #[test]
    fn test_ln_gamma_factorials() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-9));
        assert!(close(ln_gamma(5.0), (24.0f64).ln(), 1e-9));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-9));
    }

    #[test]
    fn test_chi2_two_df_is_exponential() {
        for x in [0.5, 2.0, 7.2, 15.0] {
            assert!(close(chi2_sf(x, 2.0), (-x / 2.0).exp(), 1e-8), "x = {x}");
        }
        assert_eq!(chi2_sf(0.0, 2.0), 1.0);
    }

    #[test]
    fn test_chi2_reference_quantiles() {
        assert!(close(chi2_sf(3.841_458_82, 1.0), 0.05, 1e-6));
        assert!(close(chi2_sf(11.070_497_69, 5.0), 0.05, 1e-6));
    }

    #[test]
    fn test_student_t_closed_forms() {
        use std::f64::consts::PI;
        for t in [0.3_f64, 1.0, 2.5, 3.464_101_6, 6.0, 40.0] {
            // df = 1: Cauchy
            let df1 = 0.5 - t.atan() / PI;
            assert!(close(student_t_sf(t, 1.0), df1, 1e-10), "df 1, t = {t}");

            // df = 2: (1 - t / sqrt(t^2 + 2)) / 2
            let df2 = 0.5 * (1.0 - t / (t * t + 2.0f64).sqrt());
            assert!(close(student_t_sf(t, 2.0), df2, 1e-10), "df 2, t = {t}");

            // df = 4: F(t) = 1/2 + 3/8 (t / sqrt(u)) (1 - t^2 / (12 u)), u = 1 + t^2 / 4
            let u = 1.0 + t * t / 4.0;
            let df4 = 0.5 - 0.375 * (t / u.sqrt()) * (1.0 - t * t / (12.0 * u));
            assert!(close(student_t_sf(t, 4.0), df4, 1e-10), "df 4, t = {t}");
        }
        assert!(close(student_t_sf(0.0, 7.0), 0.5, 1e-12));
    }

    #[test]
    fn test_student_t_symmetry() {
        let upper = student_t_sf(1.7, 9.0);
        let lower = student_t_sf(-1.7, 9.0);
        assert!(close(upper + lower, 1.0, 1e-10));
    }

    #[test]
    fn test_beta_inc_bounds() {
        assert_eq!(beta_inc(2.0, 3.0, 0.0), 0.0);
        assert_eq!(beta_inc(2.0, 3.0, 1.0), 1.0);
        // I_x(1, 1) = x
        assert!(close(beta_inc(1.0, 1.0, 0.3), 0.3, 1e-12));
    }

    #[test]
    fn test_beta_inc_closed_forms() {
        for a in [0.5, 2.0, 3.5, 7.0] {
            for x in [0.05, 0.3, 0.6, 0.9, 0.99] {
                // I_x(a, 1) = x^a and I_x(1, b) = 1 - (1 - x)^b
                assert!(close(beta_inc(a, 1.0, x), x.powf(a), 1e-10), "a = {a}, x = {x}");
                assert!(close(beta_inc(1.0, a, x), 1.0 - (1.0 - x).powf(a), 1e-10), "b = {a}, x = {x}");
            }
        }
    }
}
