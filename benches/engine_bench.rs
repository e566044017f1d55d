use chain_reaction::board::Board;
use chain_reaction::engine::GameState;
use chain_reaction::eval::Evaluator;
use chain_reaction::search::{SearchAlgorithm, SearchEngine};
use chain_reaction::types::Color;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn saturated_board() -> Board {
    let mut board = Board::new(9, 6).unwrap();
    for row in 0..9 {
        for col in 0..6 {
            let mass = board.critical_mass(row, col);
            board.force_set_cell(row, col, Some(Color::Red), mass - 1).unwrap();
        }
    }
    board.force_set_cell(8, 5, Some(Color::Blue), 1).unwrap();
    board
}

fn opening() -> GameState {
    let mut game = GameState::new(5, 6).unwrap();
    for (row, col) in [(0, 0), (4, 5), (2, 2), (2, 3), (1, 0), (3, 5)] {
        game.apply_move(row, col).unwrap();
    }
    game
}

fn bench_cascade(c: &mut Criterion) {
    let board = saturated_board();
    c.bench_function("cascade_saturated_9x6", |ben| {
        ben.iter(|| {
            let mut b = board.clone();
            let p = b.place_orb(black_box(0), black_box(0), Color::Red).unwrap();
            black_box(p.explosions)
        })
    });
}

fn bench_eval(c: &mut Criterion) {
    let game = opening();
    let eval = Evaluator::default();
    c.bench_function("eval_opening_5x6", |ben| {
        ben.iter(|| black_box(eval.evaluate(black_box(game.board()), Color::Red)))
    });
}

fn bench_search(c: &mut Criterion) {
    let game = opening();
    for depth in [2u8, 3] {
        for (name, algorithm) in [("alpha_beta", SearchAlgorithm::AlphaBeta), ("minimax", SearchAlgorithm::Minimax)] {
            let engine = SearchEngine::new(Color::Red, depth)
                .with_immediate_win_check(false)
                .with_algorithm(algorithm);
            c.bench_function(&format!("search_{}_depth_{}_opening", name, depth), |ben| {
                ben.iter(|| {
                    let r = engine.search(black_box(&game)).unwrap();
                    black_box(r.nodes)
                })
            });
        }
    }
}

criterion_group!(benches, bench_cascade, bench_eval, bench_search);
criterion_main!(benches);
