use iai::black_box;

use arena_tourney::rating::{update_rating, Opponent, Rating};

fn bench_update_rating_single_opponent() -> Rating {
    let current = black_box(Rating::default());
    let opponents = black_box(vec![Opponent {
        rating: 1700.0,
        rd: 80.0,
        score: 1.0,
    }]);
    update_rating(current, &opponents)
}

fn bench_update_rating_full_arena_round() -> Rating {
    let current = black_box(Rating {
        rating: 1600.0,
        rd: 60.0,
        volatility: 0.06,
    });
    let opponents: Vec<Opponent> = black_box(
        (0..12)
            .map(|i| Opponent {
                rating: 1400.0 + (i as f64) * 30.0,
                rd: 70.0,
                score: if i % 3 == 0 { 0.0 } else { 1.0 },
            })
            .collect(),
    );
    update_rating(current, &opponents)
}

iai::main!(
    bench_update_rating_single_opponent,
    bench_update_rating_full_arena_round
);
