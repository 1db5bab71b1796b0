//! End-to-end growth scenarios driven through the public world surface.

use std::cell::RefCell;
use std::rc::Rc;

use furrow_bus::EventBus;
use furrow_core::{
    CropAdvanced, CropConfig, CropHarvested, CropId, CropKind, CropState, GridCoord, HarvestEffect,
    MarkCommand, Position, StageVisual, WorldConfig,
};
use furrow_world::{query, World};

fn corn_config() -> CropConfig {
    CropConfig::new(
        CropKind::Corn,
        10,
        25,
        3,
        2,
        [
            StageVisual::new("corn_seed"),
            StageVisual::new("corn_sprout"),
            StageVisual::new("corn_ripe"),
        ],
    )
}

fn tomato_config() -> CropConfig {
    CropConfig::new(
        CropKind::Tomato,
        25,
        60,
        5,
        4,
        [
            StageVisual::new("tomato_seed"),
            StageVisual::new("tomato_sprout"),
            StageVisual::new("tomato_ripe"),
        ],
    )
}

fn farm(initial_money: i64) -> (World, Rc<EventBus>) {
    let bus = Rc::new(EventBus::new());
    let config = WorldConfig::new(2, 2, 1.0, initial_money, HarvestEffect::new("harvest_burst"));
    let projector_config = config.clone();
    let world = World::new(
        config,
        vec![corn_config(), tomato_config()],
        Rc::clone(&bus),
        Box::new(move |position| projector_config.world_to_grid(position)),
    );
    (world, bus)
}

fn recorded_states(bus: &EventBus) -> Rc<RefCell<Vec<(CropId, CropState)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _ = bus.subscribe(move |event: &CropAdvanced| {
        sink.borrow_mut().push((event.crop, event.state));
    });
    log
}

#[test]
fn corn_runs_the_full_cycle_and_nets_fifteen() {
    let (mut world, bus) = farm(100);
    let states = recorded_states(&bus);
    let harvests: Rc<RefCell<Vec<CropHarvested>>> = Rc::new(RefCell::new(Vec::new()));
    let harvest_sink = Rc::clone(&harvests);
    let _ = bus.subscribe(move |event: &CropHarvested| {
        harvest_sink.borrow_mut().push(event.clone());
    });

    let coord = GridCoord::new(0, 0);
    assert!(world.place_crop(coord, CropKind::Corn));
    assert_eq!(query::money(&world), 90);
    let id = query::crop_at(&world, coord).expect("cell occupied after placement");
    assert_eq!(query::crop_state(&world, id), Some(CropState::Seed));

    // Seed holds for two ticks, then needs water on the third.
    world.tick();
    world.tick();
    assert_eq!(query::crop_state(&world, id), Some(CropState::Seed));
    world.tick();
    assert_eq!(query::crop_state(&world, id), Some(CropState::WaterNeeded));

    // Further ticks do nothing while the crop waits on a command.
    world.tick();
    assert_eq!(query::crop_state(&world, id), Some(CropState::WaterNeeded));

    assert!(world.mark_cell(coord, MarkCommand::Water));
    assert_eq!(query::crop_state(&world, id), Some(CropState::WaterMarked));
    assert!(world.advance_crop(id, CropState::Sprout));
    assert_eq!(query::crop_state(&world, id), Some(CropState::Sprout));

    world.tick();
    assert_eq!(query::crop_state(&world, id), Some(CropState::Sprout));
    world.tick();
    assert_eq!(query::crop_state(&world, id), Some(CropState::HarvestNeeded));

    assert!(world.mark_cell(coord, MarkCommand::Harvest));
    assert!(world.advance_crop(id, CropState::None));

    // Settlement happened in the same transaction as the terminal
    // transition: money credited, cell vacated, crop back in the pool.
    assert_eq!(query::money(&world), 115);
    assert_eq!(query::crop_at(&world, coord), None);
    assert_eq!(query::placed_count(&world), 0);
    assert_eq!(query::pool(&world).leased_len(), 0);
    assert_eq!(query::pool(&world).available_len(), 4);

    let recorded = states.borrow().clone();
    assert_eq!(
        recorded,
        vec![
            (id, CropState::Seed),
            (id, CropState::WaterNeeded),
            (id, CropState::WaterMarked),
            (id, CropState::Sprout),
            (id, CropState::HarvestNeeded),
            (id, CropState::HarvestMarked),
            (id, CropState::None),
        ],
        "exactly one notification per transition, in order"
    );

    let harvested = harvests.borrow().clone();
    assert_eq!(harvested.len(), 1, "exactly one harvest notification");
    assert_eq!(harvested[0].crop, id);
    assert_eq!(harvested[0].kind, CropKind::Corn);
    assert_eq!(harvested[0].value, 25);
    assert_eq!(harvested[0].effect.key(), "harvest_burst");
}

#[test]
fn refused_operations_are_idempotent() {
    let (mut world, bus) = farm(100);
    let states = recorded_states(&bus);

    let coord = GridCoord::new(0, 0);
    assert!(world.place_crop(coord, CropKind::Corn));
    let id = query::crop_at(&world, coord).expect("cell occupied");
    let baseline = states.borrow().len();

    for _ in 0..3 {
        assert!(!world.place_crop(coord, CropKind::Tomato));
        assert!(!world.mark_cell(coord, MarkCommand::Harvest));
        assert!(!world.advance_crop(id, CropState::Sprout));
    }

    assert_eq!(query::money(&world), 90);
    assert_eq!(query::crop_state(&world, id), Some(CropState::Seed));
    assert_eq!(
        states.borrow().len(),
        baseline,
        "refusals publish no notifications"
    );
}

#[test]
fn money_is_conserved_across_cycles() {
    let (mut world, _bus) = farm(100);
    let coord = GridCoord::new(-1, -1);

    for _ in 0..3 {
        assert!(world.place_crop(coord, CropKind::Corn));
        let id = query::crop_at(&world, coord).expect("cell occupied");
        for _ in 0..3 {
            world.tick();
        }
        assert!(world.mark_cell(coord, MarkCommand::Water));
        assert!(world.advance_crop(id, CropState::Sprout));
        for _ in 0..2 {
            world.tick();
        }
        assert!(world.mark_cell(coord, MarkCommand::Harvest));
        assert!(world.advance_crop(id, CropState::None));
    }

    // Each cycle nets harvest_value - plant_cost = 15.
    assert_eq!(query::money(&world), 145);
    assert_eq!(query::pool(&world).leased_len(), 0);
}

#[test]
fn crops_grow_independently() {
    let (mut world, _bus) = farm(100);
    let corn_cell = GridCoord::new(0, 0);
    let tomato_cell = GridCoord::new(-1, 0);

    assert!(world.place_crop(corn_cell, CropKind::Corn));
    world.tick();
    assert!(world.place_crop(tomato_cell, CropKind::Tomato));
    let corn = query::crop_at(&world, corn_cell).expect("corn placed");
    let tomato = query::crop_at(&world, tomato_cell).expect("tomato placed");

    world.tick();
    world.tick();
    assert_eq!(query::crop_state(&world, corn), Some(CropState::WaterNeeded));
    assert_eq!(query::crop_state(&world, tomato), Some(CropState::Seed));

    world.tick();
    world.tick();
    world.tick();
    assert_eq!(query::crop_state(&world, corn), Some(CropState::WaterNeeded));
    assert_eq!(
        query::crop_state(&world, tomato),
        Some(CropState::WaterNeeded)
    );
}

#[test]
fn pool_identifiers_are_recycled_after_harvest() {
    let (mut world, _bus) = farm(100);
    let coord = GridCoord::new(0, -1);

    assert!(world.place_crop(coord, CropKind::Corn));
    let first = query::crop_at(&world, coord).expect("cell occupied");
    for _ in 0..3 {
        world.tick();
    }
    assert!(world.mark_cell(coord, MarkCommand::Water));
    assert!(world.advance_crop(first, CropState::Sprout));
    for _ in 0..2 {
        world.tick();
    }
    assert!(world.mark_cell(coord, MarkCommand::Harvest));
    assert!(world.advance_crop(first, CropState::None));

    assert!(world.place_crop(coord, CropKind::Corn));
    let second = query::crop_at(&world, coord).expect("cell reoccupied");
    assert_eq!(second, first, "the pool hands back the recycled slot");
    assert_eq!(query::crop_state(&world, second), Some(CropState::Seed));
    assert_eq!(
        query::pool(&world).constructed_len(),
        4,
        "no construction beyond the prewarmed capacity"
    );
}

#[test]
fn snapshot_view_lists_crops_in_id_order() {
    let (mut world, _bus) = farm(100);
    assert!(world.place_crop(GridCoord::new(0, 0), CropKind::Corn));
    assert!(world.place_crop(GridCoord::new(-1, 0), CropKind::Tomato));
    assert!(world.place_crop(GridCoord::new(0, -1), CropKind::Corn));

    let view = query::crop_view(&world);
    let snapshots = view.into_vec();
    assert_eq!(snapshots.len(), 3);
    for pair in snapshots.windows(2) {
        assert!(pair[0].id < pair[1].id, "snapshots sorted by id");
    }
    for snapshot in &snapshots {
        assert_eq!(snapshot.state, CropState::Seed);
        assert_eq!(
            query::crop_at(&world, snapshot.coord),
            Some(snapshot.id),
            "snapshot coordinates agree with the spatial index"
        );
    }
}

#[test]
fn leased_set_matches_the_spatial_index() {
    let (mut world, _bus) = farm(100);
    assert!(world.place_crop(GridCoord::new(0, 0), CropKind::Corn));
    assert!(world.place_crop(GridCoord::new(-1, -1), CropKind::Corn));

    let mut leased: Vec<CropId> = query::pool(&world).leased_ids().collect();
    leased.sort_unstable();
    let mut placed: Vec<CropId> = query::crop_view(&world)
        .iter()
        .map(|snapshot| snapshot.id)
        .collect();
    placed.sort_unstable();
    assert_eq!(leased, placed);
    assert_eq!(query::pool(&world).active_crops().len(), 2);
}

#[test]
fn drag_drop_session_places_through_commands() {
    use furrow_core::{Command, PlacementMode};
    use furrow_world::apply;

    let (mut world, _bus) = farm(100);
    apply(
        &mut world,
        Command::SetMode {
            mode: PlacementMode::Plant,
        },
    );
    apply(
        &mut world,
        Command::SelectCrop {
            kind: CropKind::Corn,
        },
    );
    apply(
        &mut world,
        Command::PointerDrag {
            position: Position::new(0.5, 0.5),
        },
    );
    world.update_marker();
    assert!(query::marker(&world).visible());

    apply(
        &mut world,
        Command::PointerDrop {
            position: Position::new(0.5, 0.5),
        },
    );
    assert!(query::crop_at(&world, GridCoord::new(0, 0)).is_some());
    assert_eq!(query::money(&world), 90);
    assert!(!query::marker(&world).visible());

    apply(&mut world, Command::Tick);
    let id = query::crop_at(&world, GridCoord::new(0, 0)).expect("cell occupied");
    assert_eq!(query::crop_state(&world, id), Some(CropState::Seed));
}
