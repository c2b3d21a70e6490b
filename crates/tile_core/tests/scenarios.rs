use tile_core::{
    Catalog, EdgeAssignment, EdgePrototype, Generator, GeneratorConfig, NullSink, Position,
    PossibilityId, RunRecorder, SchedulerState, StepOutcome, TilePrototype,
};

fn generator(seed: u64) -> Generator {
    Generator::new(GeneratorConfig {
        seed,
        tick_interval_ms: 0,
        ..Default::default()
    })
}

#[test]
fn test_single_blank_tile_fills_grid() {
    let catalog = Catalog::new(
        Vec::new(),
        vec![TilePrototype::uniform("blank", 1, EdgeAssignment::unassigned())],
    )
    .unwrap();

    let mut generator = generator(0);
    generator.start(2, 2, &catalog).unwrap();
    let outcome = generator.run_to_completion(&mut NullSink).unwrap();

    assert_eq!(outcome, StepOutcome::Resolved);
    assert_eq!(generator.state(), Some(SchedulerState::Resolved));
    let views = generator.cell_views();
    assert_eq!(views.len(), 4);
    assert!(views.iter().all(|v| v.resolved == Some(PossibilityId(0))));
}

#[test]
fn test_incompatible_tiles_contradict_on_first_step() {
    // Asymmetrical sides only match a reversed partner, and no side is reversed.
    let catalog = Catalog::new(
        vec![
            EdgePrototype::asymmetrical("ramp"),
            EdgePrototype::asymmetrical("stair"),
        ],
        vec![
            TilePrototype::uniform("ramp", 1, EdgeAssignment::typed("ramp")),
            TilePrototype::uniform("stair", 1, EdgeAssignment::typed("stair")),
        ],
    )
    .unwrap();

    let mut generator = generator(0);
    generator.start(2, 1, &catalog).unwrap();
    let mut recorder = RunRecorder::new(2, 1, 0);
    let outcome = generator.run_to_completion(&mut recorder).unwrap();

    assert!(matches!(outcome, StepOutcome::Contradicted { .. }));
    let recording = recorder.into_recording();
    assert_eq!(recording.frame_count(), 1);
    assert_eq!(recording.frames[0].label(), "contradicted");
}

#[test]
fn test_weights_bias_choices() {
    let x = EdgeAssignment::typed("x");
    let catalog = Catalog::new(
        vec![EdgePrototype::symmetrical("x")],
        vec![
            TilePrototype::uniform("A", 10, x.clone()),
            TilePrototype::uniform("B", 1, x),
        ],
    )
    .unwrap();

    let mut a_count = 0usize;
    let mut b_count = 0usize;
    for seed in 0..200 {
        let mut generator = generator(seed);
        generator.start(3, 3, &catalog).unwrap();
        let outcome = generator.run_to_completion(&mut NullSink).unwrap();
        assert_eq!(outcome, StepOutcome::Resolved, "seed {} contradicted", seed);

        for view in generator.cell_views() {
            match view.resolved {
                Some(PossibilityId(0)) => a_count += 1,
                Some(PossibilityId(1)) => b_count += 1,
                other => panic!("unexpected cell state {:?}", other),
            }
        }
    }

    assert_eq!(a_count + b_count, 200 * 9);
    let ratio = a_count as f64 / b_count.max(1) as f64;
    assert!((6.0..16.0).contains(&ratio), "A/B ratio {}", ratio);
}

#[test]
fn test_restart_with_new_seed_after_contradiction() {
    let land = EdgeAssignment::typed("land");
    let sea = EdgeAssignment::typed("sea");
    let catalog = Catalog::new(
        vec![
            EdgePrototype::symmetrical("land"),
            EdgePrototype::symmetrical("sea"),
        ],
        vec![
            TilePrototype::uniform("land", 2, land.clone()),
            TilePrototype::uniform("sea", 2, sea.clone()),
            TilePrototype::new("coast", 1, [land.clone(), land, sea.clone(), sea]),
        ],
    )
    .unwrap();

    let mut generator = generator(1);
    let mut resolved = false;
    for seed in 1..=30 {
        generator.set_seed(seed);
        generator.start(5, 5, &catalog).unwrap();
        if generator.run_to_completion(&mut NullSink).unwrap() == StepOutcome::Resolved {
            resolved = true;
            break;
        }
    }
    assert!(resolved);

    let grid = generator.grid().unwrap();
    assert!(grid.is_fully_resolved());
    assert!(tile_core::is_arc_consistent(grid));
    assert!(grid.cell(Position::new(4, 4)).unwrap().resolved().is_some());
}
