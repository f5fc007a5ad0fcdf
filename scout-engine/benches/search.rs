use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::str::FromStr;

use chess::ChessMove;
use scout_engine::search::search_to_depth;
use scout_engine::{Game, TranspositionTable};

pub fn criterion_startpos_depth_5(c: &mut Criterion) {
    let game = Game::start_position();

    c.bench_function("startpos_depth_5", |b| {
        b.iter(|| {
            let mut tt = TranspositionTable::with_mb(8);
            let result = search_to_depth(black_box(&game), black_box(5), &mut tt).unwrap();
            assert!(!result.stopped);
        })
    });
}

pub fn criterion_mates_3_sac_knight(c: &mut Criterion) {
    let game =
        Game::from_fen("r4rk1/1b3ppp/pp2p3/2p5/P1B1NR1Q/3P3P/2q3P1/7K w - - 0 24").unwrap();
    let bm = ChessMove::from_str("e4f6").unwrap();

    c.bench_function("mates_3_sac_knight_depth_6", |b| {
        b.iter(|| {
            let mut tt = TranspositionTable::with_mb(8);
            let result = search_to_depth(black_box(&game), black_box(6), &mut tt).unwrap();
            assert_eq!(result.best_move, bm);
        })
    });
}

pub fn criterion_middlegame_depth_5(c: &mut Criterion) {
    let game =
        Game::from_fen("r2qk2r/p1pp1ppp/1p2pn2/8/2P1b3/2B5/PPP1QPPP/2KR2NR w kq - 0 11").unwrap();

    c.bench_function("middlegame_depth_5", |b| {
        b.iter(|| {
            let mut tt = TranspositionTable::with_mb(8);
            let result = search_to_depth(black_box(&game), black_box(5), &mut tt).unwrap();
            assert!(!result.stopped);
        })
    });
}

criterion_group!(
    benches,
    criterion_startpos_depth_5,
    criterion_mates_3_sac_knight,
    criterion_middlegame_depth_5
);
criterion_main!(benches);
