//! Glicko-2 rating updates and performance-rating estimation (C1).
//!
//! A faithful port of the reference formulas (Glickman's "Example of the
//! Glicko-2 system"), centered at 1500, scaled by `GLICKO2_SCALE`. Pure
//! functions only — no I/O, no clock reads — so the arena engine and
//! finalization routine can call this freely inside a transaction.

use std::f64::consts::PI;

pub const GLICKO2_SCALE: f64 = 173.7178;
const TAU: f64 = 0.5;
const EPSILON: f64 = 1e-6;
const DEFAULT_RATING: f64 = 500.0;
const DEFAULT_RD: f64 = 250.0;
const DEFAULT_VOLATILITY: f64 = 0.06;
const MIN_RD: f64 = 30.0;
const MAX_RD: f64 = 350.0;
const PROVISIONAL_GAMES: u32 = 20;

/// The Glicko-2 triple carried on a `Player`. Defaults match spec §3.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rating {
    pub rating: f64,
    pub rd: f64,
    pub volatility: f64,
}

impl Default for Rating {
    fn default() -> Rating {
        Rating {
            rating: DEFAULT_RATING,
            rd: DEFAULT_RD,
            volatility: DEFAULT_VOLATILITY,
        }
    }
}

/// One opponent's contribution to a rating update: their rating, their RD,
/// and the score this player earned against them (1.0 win, 0.5 draw, 0.0
/// loss).
#[derive(Debug, Copy, Clone)]
pub struct Opponent {
    pub rating: f64,
    pub rd: f64,
    pub score: f64,
}

fn to_glicko2(rating: f64, rd: f64) -> (f64, f64) {
    (
        (rating - 1500.0) / GLICKO2_SCALE,
        rd / GLICKO2_SCALE,
    )
}

fn to_original(mu: f64, phi: f64) -> (f64, f64) {
    (mu * GLICKO2_SCALE + 1500.0, phi * GLICKO2_SCALE)
}

fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

fn expected(mu: f64, mu_j: f64, phi_j: f64) -> f64 {
    1.0 / (1.0 + (-g(phi_j) * (mu - mu_j)).exp())
}

fn compute_v(mu: f64, opponents: &[(f64, f64, f64)]) -> f64 {
    let mut v = 0.0;
    for &(mu_j, phi_j, _) in opponents {
        let g_j = g(phi_j);
        let e_j = expected(mu, mu_j, phi_j);
        v += g_j * g_j * e_j * (1.0 - e_j);
    }
    if v != 0.0 {
        1.0 / v
    } else {
        f64::INFINITY
    }
}

fn compute_delta(mu: f64, opponents: &[(f64, f64, f64)], v: f64) -> f64 {
    let sum: f64 = opponents
        .iter()
        .map(|&(mu_j, phi_j, s_j)| g(phi_j) * (s_j - expected(mu, mu_j, phi_j)))
        .sum();
    v * sum
}

/// Illinois variant of regula falsi, solving Glickman's `f(x) = 0` for the
/// new volatility. Converges to within `EPSILON` of the root.
fn update_volatility(phi: f64, sigma: f64, delta: f64, v: f64) -> f64 {
    let a = (sigma * sigma).ln();
    let delta_sq = delta * delta;
    let phi_sq = phi * phi;

    let f = |x: f64| -> f64 {
        let ex = x.exp();
        let num = ex * (delta_sq - phi_sq - v - ex);
        let den = 2.0 * (phi_sq + v + ex).powi(2);
        num / den - (x - a) / (TAU * TAU)
    };

    let mut big_a = a;
    let mut big_b = if delta_sq > phi_sq + v {
        (delta_sq - phi_sq - v).ln()
    } else {
        let mut k = 1.0;
        while f(a - k * TAU) < 0.0 {
            k += 1.0;
        }
        a - k * TAU
    };

    let mut fa = f(big_a);
    let mut fb = f(big_b);
    while (big_b - big_a).abs() > EPSILON {
        let big_c = big_a + (big_a - big_b) * fa / (fb - fa);
        let fc = f(big_c);
        if fc * fb < 0.0 {
            big_a = big_b;
            fa = fb;
        } else {
            fa /= 2.0;
        }
        big_b = big_c;
        fb = fc;
    }

    (big_a / 2.0).exp()
}

/// Applies a batch of completed games to a player's Glicko-2 triple. An
/// empty batch is a well-defined no-op on `(rating, volatility)` — only the
/// RD inflates, per spec §4.1/§8.
pub fn update_rating(current: Rating, opponents: &[Opponent]) -> Rating {
    if opponents.is_empty() {
        let (_, phi) = to_glicko2(current.rating, current.rd);
        let phi_star = (phi * phi + current.volatility * current.volatility).sqrt();
        let new_rd = (phi_star * GLICKO2_SCALE).min(MAX_RD);
        return Rating {
            rating: current.rating,
            rd: new_rd,
            volatility: current.volatility,
        };
    }

    let (mu, phi) = to_glicko2(current.rating, current.rd);
    let scaled: Vec<(f64, f64, f64)> = opponents
        .iter()
        .map(|o| {
            let (mu_j, phi_j) = to_glicko2(o.rating, o.rd);
            (mu_j, phi_j, o.score)
        })
        .collect();

    let v = compute_v(mu, &scaled);
    let delta = compute_delta(mu, &scaled, v);
    let new_sigma = update_volatility(phi, current.volatility, delta, v);

    let phi_star = (phi * phi + new_sigma * new_sigma).sqrt();
    let new_phi = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / v).sqrt();

    let new_mu = mu
        + new_phi * new_phi
            * scaled
                .iter()
                .map(|&(mu_j, phi_j, s_j)| g(phi_j) * (s_j - expected(mu, mu_j, phi_j)))
                .sum::<f64>();

    let (new_rating, new_rd) = to_original(new_mu, new_phi);

    Rating {
        rating: new_rating,
        rd: new_rd.clamp(MIN_RD, MAX_RD),
        volatility: new_sigma,
    }
}

/// `games_played < 20 ⇒ provisional` per spec §3.
pub fn is_provisional(games_played: u32) -> bool {
    games_played < PROVISIONAL_GAMES
}

const PERF_PRIOR_GAMES: f64 = 6.0;
const PERF_MAX_DELTA: f64 = 800.0;

/// Estimates a performance rating over a batch of (opponent rating, score)
/// pairs, Bayesian-smoothed by a small prior so a handful of games cannot
/// produce an extreme estimate. Mirrors `glicko2.performance_rating` in the
/// original source, capped at +/-800 Elo from the average opponent rating.
pub fn performance_rating(
    opponent_ratings: &[f64],
    scores: &[f64],
    prior_rating: Option<f64>,
) -> f64 {
    if opponent_ratings.is_empty() {
        return prior_rating.map(|r| r.round()).unwrap_or(0.0);
    }

    let n = opponent_ratings.len() as f64;
    let avg_opp = opponent_ratings.iter().sum::<f64>() / n;
    let mut actual = scores.iter().sum::<f64>().clamp(0.0, n);

    let prior_n = PERF_PRIOR_GAMES.max(0.0);
    let n_eff = if prior_n > 0.0 {
        let anchor = prior_rating.unwrap_or(avg_opp);
        let prior_expected = 1.0 / (1.0 + 10f64.powf((avg_opp - anchor) / 400.0));
        actual += prior_n * prior_expected;
        n + prior_n
    } else {
        n
    };

    let score_frac = (actual / n_eff).clamp(1e-6, 1.0 - 1e-6);
    let delta = (-400.0 * ((1.0 / score_frac) - 1.0).log10()).clamp(-PERF_MAX_DELTA, PERF_MAX_DELTA);
    (avg_opp + delta).round()
}
