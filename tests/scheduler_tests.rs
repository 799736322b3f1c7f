//! Match scheduler integration tests.
//!
//! These drive whole matches through `MatchScheduler` and watch the
//! observable surface: variables, zone contents, callback firings.

use std::cell::RefCell;
use std::rc::Rc;

use tabletop_engine::{
    ComponentId, ComponentSpec, MatchScheduler, MatchSetup, RuleSpec, SetupError, Tick,
    TriggerContext, TriggerLabel, ZoneId, ZoneSpec,
};

/// A single-phase match whose only rule ends the phase from "phase
/// started" terminates its first phase with zero externally enqueued
/// commands.
#[test]
fn test_single_phase_self_terminates() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_rule(
                RuleSpec::new("skipMain", TriggerLabel::PhaseStarted)
                    .with_commands("EndCurrentPhase"),
            )
            .with_rule(
                RuleSpec::new("oneTurnOnly", TriggerLabel::TurnEnded).with_commands("EndTheMatch"),
            ),
    )
    .unwrap();

    assert_eq!(scheduler.run_until_idle(), Tick::Ended);
    assert!(scheduler.is_ended());
    assert_eq!(scheduler.turn_number(), 1);
}

/// Moving 3 components into 1 zone fires exactly 3 "entered zone" events
/// and, for each component with a prior zone, exactly one matching "left
/// zone" event, in the components' selection order.
#[test]
fn test_move_fires_zone_events_in_selection_order() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("Start"))
            .with_zone(ZoneSpec::new().with_tag("Target"))
            // Two components start in Start; the third starts nowhere.
            .with_component(ComponentSpec::new().with_tag("Mover").in_zone(0))
            .with_component(ComponentSpec::new().with_tag("Mover").in_zone(0))
            .with_component(ComponentSpec::new().with_tag("Mover")),
    )
    .unwrap();

    let entered: Rc<RefCell<Vec<(ComponentId, ZoneId)>>> = Rc::new(RefCell::new(Vec::new()));
    let left: Rc<RefCell<Vec<(ComponentId, ZoneId)>>> = Rc::new(RefCell::new(Vec::new()));

    let entered_log = Rc::clone(&entered);
    scheduler.on(TriggerLabel::ComponentEnteredZone, move |ctx, _state| {
        entered_log
            .borrow_mut()
            .push((ctx.component.unwrap(), ctx.zone.unwrap()));
    });
    let left_log = Rc::clone(&left);
    scheduler.on(TriggerLabel::ComponentLeftZone, move |ctx, _state| {
        left_log
            .borrow_mut()
            .push((ctx.component.unwrap(), ctx.zone.unwrap()));
    });

    scheduler.run_until_idle();
    scheduler.enqueue("MoveComponentToZone(c(t:Mover),z(t:Target))");
    scheduler.run_until_idle();

    let start = ZoneId::new(0);
    let target = ZoneId::new(1);
    let ids: Vec<ComponentId> = (0..3).map(ComponentId::new).collect();

    // Exactly 3 entries, in selection (pool) order.
    assert_eq!(
        entered.borrow().as_slice(),
        &[(ids[0], target), (ids[1], target), (ids[2], target)]
    );
    // Exactly one "left" per component that had a prior zone.
    assert_eq!(
        left.borrow().as_slice(),
        &[(ids[0], start), (ids[1], start)]
    );

    // And the zone contents agree.
    let state = scheduler.state();
    assert_eq!(state.zone(target).unwrap().components(), ids.as_slice());
    assert!(state.zone(start).unwrap().is_empty());
}

/// `Shuffle` on a zone with 0 or 1 occupants leaves occupant order
/// unchanged.
#[test]
fn test_shuffle_small_zones_stable() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("Empty"))
            .with_zone(ZoneSpec::new().with_tag("Single"))
            .with_component(ComponentSpec::new().in_zone(1)),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("Shuffle(z(t:Empty));Shuffle(z(t:Single))");
    scheduler.run_until_idle();

    let state = scheduler.state();
    assert!(state.zone(ZoneId::new(0)).unwrap().is_empty());
    assert_eq!(
        state.zone(ZoneId::new(1)).unwrap().components(),
        &[ComponentId::new(0)]
    );
}

#[test]
fn test_shuffle_deck_reorders_deterministically() {
    let build = |seed: u64| {
        let mut setup = MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("Deck"))
            .with_seed(seed);
        for _ in 0..12 {
            setup = setup.with_component(ComponentSpec::new().in_zone(0));
        }
        let mut scheduler = MatchScheduler::start(setup).unwrap();
        scheduler.run_until_idle();
        scheduler.enqueue("Shuffle(z(t:Deck))");
        scheduler.run_until_idle();
        scheduler
            .state()
            .zone(ZoneId::new(0))
            .unwrap()
            .components()
            .to_vec()
    };

    let first = build(42);
    let second = build(42);
    let different_seed = build(43);

    assert_eq!(first, second, "same seed must replay the same shuffle");
    assert_ne!(first, different_seed);
    assert_ne!(first, (0..12).map(ComponentId::new).collect::<Vec<_>>());
}

/// Moving with `ordered` preserves the selection's relative order at a
/// bottom-inserting destination.
#[test]
fn test_move_ordered_to_bottom_preserves_relative_order() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("Start"))
            .with_zone(ZoneSpec::new().with_tag("Pile"))
            .with_component(ComponentSpec::new().with_tag("M").in_zone(0))
            .with_component(ComponentSpec::new().with_tag("M").in_zone(0))
            .with_component(ComponentSpec::new().with_tag("M").in_zone(0)),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("MoveComponentToZone(c(t:M),z(t:Pile),bottom,ordered)");
    scheduler.run_until_idle();

    let pile = scheduler.state().zone(ZoneId::new(1)).unwrap();
    assert_eq!(
        pile.components(),
        &[
            ComponentId::new(0),
            ComponentId::new(1),
            ComponentId::new(2)
        ]
    );
}

#[test]
fn test_reserved_variable_collision_aborts_start() {
    for name in ["phase", "turnNumber", "usedComponent", "this"] {
        let result = MatchScheduler::start(MatchSetup::new(["Main"]).with_variable(name, "x"));
        assert_eq!(
            result.err(),
            Some(SetupError::ReservedVariable(name.to_string())),
            "{name} must be rejected"
        );
    }
}

#[test]
fn test_empty_queue_idles_then_accepts_input() {
    let mut scheduler = MatchScheduler::start(MatchSetup::new(["Main"])).unwrap();

    assert_eq!(scheduler.run_until_idle(), Tick::Idle);
    assert_eq!(scheduler.current_phase(), "Main");

    // The match waits for input indefinitely; polling stays idle.
    for _ in 0..5 {
        assert_eq!(scheduler.tick(), Tick::Idle);
    }

    scheduler.enqueue("SendMessage(ping);EndTheMatch");
    assert_eq!(scheduler.run_until_idle(), Tick::Ended);
    assert_eq!(
        scheduler.variable(tabletop_engine::reserved::MESSAGE),
        Some("ping")
    );
}

/// A broken rule is dropped quietly; its siblings keep running.
#[test]
fn test_broken_rule_degrades_gracefully() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_rule(
                RuleSpec::new("broken", TriggerLabel::MatchStarted)
                    .with_commands("Explode(everything);SetVariable(ok,1)"),
            )
            .with_rule(
                RuleSpec::new("alsoBroken", TriggerLabel::MatchStarted)
                    .with_condition("((((")
                    .with_commands("SetVariable(never,1)"),
            ),
    )
    .unwrap();

    scheduler.run_until_idle();
    // The unknown keyword was dropped, the rest of that rule ran.
    assert_eq!(scheduler.variable("ok"), Some("1"));
    // The rule with the broken condition never matched.
    assert!(!scheduler.has_variable("never"));
}

/// Phases run in declaration order within a turn, and phase context
/// variables track the loop.
#[test]
fn test_phase_sequence_and_variables() {
    let order: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&order);

    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Draw", "Main", "End"])
            .with_rule(
                RuleSpec::new("advance", TriggerLabel::PhaseStarted)
                    .with_commands("EndCurrentPhase"),
            )
            .with_rule(
                RuleSpec::new("stop", TriggerLabel::TurnEnded).with_commands("EndTheMatch"),
            ),
    )
    .unwrap();
    scheduler.on(TriggerLabel::PhaseStarted, move |ctx: &TriggerContext, _| {
        log.borrow_mut().push(ctx.phase.clone().unwrap());
    });

    assert_eq!(scheduler.run_until_idle(), Tick::Ended);
    assert_eq!(order.borrow().as_slice(), &["Draw", "Main", "End"]);
}

/// A component-level rule sees `this` bound to its owner.
#[test]
fn test_component_rule_this_binding() {
    let relic = ComponentSpec::new().with_tag("Relic").with_rule(
        RuleSpec::new("announce", TriggerLabel::MatchStarted)
            .with_commands("SetVariable(owner,this)"),
    );
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_component(ComponentSpec::new().with_tag("Decoy"))
            .with_component(relic),
    )
    .unwrap();

    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("owner"), Some("1"));
}

/// Variable assignment fires "variable changed" only on an actual change.
///
/// The watched name stays undefined at compile time on purpose: a defined
/// name on the right-hand side would compile as a variable reference, not
/// a literal.
#[test]
fn test_variable_changed_fires_on_change_only() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"]).with_rule(
            RuleSpec::new("countChanges", TriggerLabel::VariableChanged)
                .with_condition("variable=score")
                .with_commands("SetVariable(changes,+1)"),
        ),
    )
    .unwrap();
    scheduler.run_until_idle();

    // Creating the variable is a change.
    scheduler.enqueue("SetVariable(score,1)");
    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("changes"), Some("1"));

    // Re-assigning the same value is not.
    scheduler.enqueue("SetVariable(score,1)");
    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("changes"), Some("1"));

    scheduler.enqueue("SetVariable(score,2)");
    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("changes"), Some("2"));
    assert_eq!(
        scheduler.variable(tabletop_engine::reserved::NEW_VALUE),
        Some("2")
    );
}

/// An action name routes through "action used" with its context variable.
#[test]
fn test_action_used() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"]).with_rule(
            RuleSpec::new("onDraw", TriggerLabel::ActionUsed)
                .with_condition("actionName=DrawCard")
                .with_commands("SetVariable(drawn,+1)"),
        ),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("UseAction(DrawCard);UseAction(Discard);UseAction(DrawCard)");
    scheduler.run_until_idle();

    assert_eq!(scheduler.variable("drawn"), Some("2"));
}

/// `UseZone` fires "zone used" per selected zone and records the context
/// variable.
#[test]
fn test_zone_used() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("DrawPile"))
            .with_zone(ZoneSpec::new().with_tag("DiscardPile"))
            .with_rule(
                RuleSpec::new("onZone", TriggerLabel::ZoneUsed)
                    .with_commands("SetVariable(uses,+1)"),
            ),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("UseZone(z(t:DiscardPile))");
    scheduler.run_until_idle();

    assert_eq!(scheduler.variable("uses"), Some("1"));
    assert_eq!(
        scheduler.variable(tabletop_engine::reserved::USED_ZONE),
        Some("1")
    );
}

/// Grid destinations assign slots; pops free them.
#[test]
fn test_move_into_grid_zone() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_zone(ZoneSpec::new().with_tag("Board").grid(2, 2))
            .with_component(ComponentSpec::new().with_tag("Pawn"))
            .with_component(ComponentSpec::new().with_tag("Pawn")),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("MoveComponentToZone(c(i:0),z(t:Board),grid(1,0))");
    scheduler.enqueue("MoveComponentToZone(c(i:1),z(t:Board))");
    scheduler.run_until_idle();

    let board = scheduler.state().zone(ZoneId::new(0)).unwrap();
    assert_eq!(board.slot_of(ComponentId::new(0)), Some((1, 0)));
    assert_eq!(board.slot_of(ComponentId::new(1)), Some((0, 0)));
}

/// Tag edits through commands are visible to later selectors.
#[test]
fn test_tag_commands_roundtrip() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_component(ComponentSpec::new().with_tag("Unit"))
            .with_variable("exhaustedCount", "0"),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("AddTagToComponent(c(t:Unit),Exhausted)");
    scheduler.enqueue("SetVariable(exhaustedCount,nc(t:Exhausted))");
    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("exhaustedCount"), Some("1"));

    scheduler.enqueue("RemoveTagFromComponent(c(t:Unit),Exhausted)");
    scheduler.enqueue("SetVariable(exhaustedCount,nc(t:Exhausted))");
    scheduler.run_until_idle();
    assert_eq!(scheduler.variable("exhaustedCount"), Some("0"));
}

/// Field writes through commands are visible to conditions and getters.
#[test]
fn test_set_component_field() {
    let mut scheduler = MatchScheduler::start(
        MatchSetup::new(["Main"])
            .with_component(
                ComponentSpec::new().with_tag("Hero").with_field("Health", 20),
            )
            .with_variable("reading", "0"),
    )
    .unwrap();
    scheduler.run_until_idle();

    scheduler.enqueue("SetComponentFieldValue(c(t:Hero),Health,cf(Health,t:Hero)-6)");
    scheduler.enqueue("SetVariable(reading,cf(Health,t:Hero))");
    scheduler.run_until_idle();

    assert_eq!(scheduler.variable("reading"), Some("14"));
}
