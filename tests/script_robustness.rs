//! Parser robustness: arbitrary clause text must never panic a compiler.
//!
//! The error model is warn-and-drop; whatever garbage arrives as rule
//! text, the worst outcome is a `ScriptError` (or a clause silently
//! compiling to a literal).

use proptest::prelude::*;

use tabletop_engine::{
    CommandRegistry, ComponentSelector, ComponentSpec, Condition, Getter, MatchState, RuleSpec,
    TriggerLabel, ZoneSelector, ZoneSpec,
};

fn populated_state() -> MatchState {
    let mut state = MatchState::new(0);
    let zone = state.add_zone(&ZoneSpec::new().with_tag("Play"));
    let id = state.add_component(
        &ComponentSpec::new()
            .with_tag("Creature")
            .with_field("Power", 3),
    );
    state.attach(id, zone, tabletop_engine::Placement::Top);
    state.vars_mut().set("score", "10");
    state
}

proptest! {
    /// Printable-ASCII garbage through every compiler entry point.
    #[test]
    fn compilers_never_panic(text in "[ -~]{0,64}") {
        let state = populated_state();
        let _ = Getter::compile(&text, &state);
        let _ = Condition::parse(&text, &state);
        let _ = ComponentSelector::parse(&text, &state);
        let _ = ZoneSelector::parse(&text, &state);
        let _ = CommandRegistry::standard().compile_sequence(&text, &state);
    }

    /// Structured-looking clauses built from the language's own alphabet.
    #[test]
    fn language_shaped_text_never_panics(text in "[a-z0-9cznrftxbi:&|!()=<>,;+*/%^. -]{0,64}") {
        let state = populated_state();
        let _ = Getter::compile(&text, &state);
        let _ = Condition::parse(&text, &state);
        let _ = ComponentSelector::parse(&text, &state);
        let _ = CommandRegistry::standard().compile_sequence(&text, &state);
    }

    /// Whatever compiles must also evaluate without panicking.
    #[test]
    fn compiled_getters_evaluate(text in "[a-z0-9()+*/%^:,.]{0,32}") {
        let state = populated_state();
        if let Ok(getter) = Getter::compile(&text, &state) {
            let _ = getter.evaluate(&state);
        }
    }

    /// Rule initialization swallows arbitrary text into a working (or
    /// quietly disabled) rule.
    #[test]
    fn rules_initialize_from_garbage(condition in "[ -~]{0,40}", commands in "[ -~]{0,40}") {
        let mut state = populated_state();
        let id = state.add_rule(
            &RuleSpec::new("fuzz", TriggerLabel::PhaseStarted)
                .with_condition(condition)
                .with_commands(commands),
            None,
        );
        let mut rules = vec![state.rule(id).unwrap().clone()];
        rules[0].initialize(&state);
        let _ = rules[0].is_enabled();
    }
}
