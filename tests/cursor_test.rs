//! Integration tests: cursor movement limits and selection upkeep.

mod common;

use common::{child_paths, game, san};
use game_tree::{Controller, ControllerOptions, GoTo, StandardRules};
use proptest::prelude::*;

const GAME: &str = "1. e4 e5 (1... c5 2. Nf3 d6 3. d4) 2. Nf3 Nc6 3. Bb5 a6 *";

fn open(pgn: &str) -> Controller<StandardRules> {
    Controller::new(game(pgn), StandardRules, ControllerOptions::default())
}

#[test]
fn test_prev_and_next_limits() {
    let mut ctrl = open(GAME);
    assert!(!ctrl.can_go_to(GoTo::Prev));
    assert!(!ctrl.can_go_to(GoTo::First));
    assert!(ctrl.can_go_to(GoTo::Next));

    ctrl.go_to(GoTo::Last, false);
    assert_eq!(san(ctrl.node()), "a6");
    assert!(ctrl.can_go_to(GoTo::Prev));
    assert!(!ctrl.can_go_to(GoTo::Next));
    assert!(!ctrl.can_go_to(GoTo::Last));
}

#[test]
fn test_next_follows_mainline_of_a_variation() {
    let mut ctrl = open(GAME);
    let e4 = ctrl.game().mainline().next().unwrap().path().clone();
    let c5 = child_paths(ctrl.game(), &e4).remove(1);

    assert!(ctrl.to_path(&c5, false));
    ctrl.go_to(GoTo::Next, false);
    ctrl.go_to(GoTo::Next, false);
    assert_eq!(san(ctrl.node()), "d6");
    assert!(ctrl.can_go_to(GoTo::Last));

    // Last always means the end of the game's mainline.
    ctrl.go_to(GoTo::Last, false);
    assert_eq!(san(ctrl.node()), "a6");
}

#[test]
fn test_deleting_selected_line_keeps_cursor_valid() {
    let mut ctrl = open(GAME);
    let e4 = ctrl.game().mainline().next().unwrap().path().clone();
    let c5 = child_paths(ctrl.game(), &e4).remove(1);
    ctrl.to_path(&c5, false);
    ctrl.go_to(GoTo::Next, false);
    ctrl.go_to(GoTo::Next, false);

    ctrl.delete_from(&c5);
    assert_eq!(ctrl.path(), &e4);

    ctrl.go_to(GoTo::Last, false);
    ctrl.truncate_after(&e4);
    assert_eq!(ctrl.path(), &e4);
    assert!(!ctrl.can_go_to(GoTo::Next));
}

proptest! {
    #[test]
    fn prop_prev_reaches_root_in_depth_steps(steps in 0usize..8) {
        let mut ctrl = open(GAME);
        for _ in 0..steps {
            ctrl.go_to(GoTo::Next, false);
        }
        let depth = ctrl.path().depth();
        prop_assert_eq!(depth, steps.min(6));

        for _ in 0..depth {
            prop_assert!(ctrl.can_go_to(GoTo::Prev));
            prop_assert!(ctrl.go_to(GoTo::Prev, false));
        }
        prop_assert!(ctrl.path().is_root());
        prop_assert!(!ctrl.go_to(GoTo::Prev, false));
        prop_assert!(ctrl.path().is_root());
    }
}
