//! QA tests for a two-player session from character creation to narration.
//!
//! Run with: `cargo test -p dnd-rules --test qa_basic_flow`

use async_trait::async_trait;
use dnd_rules::{
    ActionRequest, CharacterBuilder, CharacterClass, DiceRoller, GameSession, Narration, Narrator,
    NarratorError, RaceType, RestKind, SessionConfig, SessionError, SummaryNarrator, TurnContext,
};

fn party() -> GameSession {
    let mut dice = DiceRoller::seeded(42);
    let mut session = GameSession::new(SessionConfig::new().with_seed(42));
    session
        .add_character(
            CharacterBuilder::new()
                .name("Thorin")
                .race(RaceType::Dwarf)
                .class(CharacterClass::Fighter)
                .build(&mut dice)
                .unwrap(),
        )
        .unwrap();
    session
        .add_character(
            CharacterBuilder::new()
                .name("Elara")
                .race(RaceType::Elf)
                .class(CharacterClass::Wizard)
                .build(&mut dice)
                .unwrap(),
        )
        .unwrap();
    session
}

struct OfflineNarrator;

#[async_trait]
impl Narrator for OfflineNarrator {
    async fn narrate(&self, _context: &TurnContext) -> Result<Narration, NarratorError> {
        Err(NarratorError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

// =============================================================================
// TEST 1: Party setup
// =============================================================================

#[test]
fn test_party_holds_two_players() {
    let mut session = party();
    let mut dice = DiceRoller::seeded(1);
    let extra = CharacterBuilder::new()
        .name("Pip")
        .race(RaceType::Halfling)
        .class(CharacterClass::Rogue)
        .build(&mut dice)
        .unwrap();
    assert!(matches!(session.add_character(extra), Err(SessionError::RosterFull)));
    assert_eq!(session.characters().len(), 2);
}

#[test]
fn test_builder_equips_starting_kit() {
    let session = party();
    let thorin = session.character("thorin").unwrap();
    assert!(thorin.equipped_weapon().is_some());
    assert!(thorin.armor_class > 10);
}

// =============================================================================
// TEST 2: Turns
// =============================================================================

#[test]
fn test_natural_twenty_is_an_exceptional_success() {
    let mut session = party();
    let report = session.play_turn("Thorin", "search the ruined chapel", 20, None).unwrap();
    assert_eq!(report.turn, 1);
    assert!(report.consequences.success);
    assert!(!report.consequences.consequences.is_empty());
    assert!(report.action.is_none());
}

#[test]
fn test_attack_between_party_members() {
    let mut session = party();
    let request = ActionRequest::attack("Elara");
    let result = session.resolve_action("Thorin", &request).unwrap();
    assert!(
        result.message.starts_with("Thorin hits Elara") || result.message == "Thorin misses Elara!",
        "{}",
        result.message
    );
    let elara = session.character("Elara").unwrap();
    assert_eq!(
        elara.hit_points.maximum - elara.hit_points.current,
        result.damage.unwrap_or(0).min(elara.hit_points.maximum)
    );
}

#[test]
fn test_bad_targets_fail_softly() {
    let mut session = party();

    let ghost = ActionRequest::attack("Ghost");
    let result = session.resolve_action("Thorin", &ghost).unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "No character named Ghost");

    let selfish = ActionRequest::attack("Thorin");
    let result = session.resolve_action("Thorin", &selfish).unwrap();
    assert_eq!(result.message, "No target specified for attack");

    let unknown = ActionRequest::new("dance");
    let result = session.resolve_action("Thorin", &unknown).unwrap();
    assert_eq!(result.message, "Unknown action type: dance");
}

#[test]
fn test_unknown_actor_is_an_error() {
    let mut session = party();
    let err = session.play_turn("Nobody", "look around", 12, None).unwrap_err();
    assert!(matches!(err, SessionError::CharacterNotFound(_)));
    assert_eq!(session.turn(), 0);
}

#[test]
fn test_party_levels_every_five_turns() {
    let mut session = party();
    let mut last = None;
    for _ in 0..5 {
        last = Some(session.play_turn("Elara", "talk to the innkeeper", 15, None).unwrap());
    }
    let report = last.unwrap();
    assert!(session.characters().iter().all(|c| c.level == 2));
    assert!(report.progression.contains(&"Thorin: Level up! Now level 2".to_string()));
    assert!(report.progression.contains(&"Elara: Level up! Now level 2".to_string()));
}

#[test]
fn test_rest_through_session() {
    let mut session = party();
    session.character_mut("Thorin").unwrap().hit_points.current = 1;
    let messages = session.rest("Thorin", RestKind::Long).unwrap();
    let thorin = session.character("Thorin").unwrap();
    assert_eq!(thorin.hit_points.current, thorin.hit_points.maximum);
    assert!(messages[0].starts_with("Recovered"));
}

// =============================================================================
// TEST 3: Narration
// =============================================================================

#[tokio::test]
async fn test_summary_narration_of_a_turn() {
    let mut session = party();
    let report = session.play_turn("Thorin", "search the crypt", 16, None).unwrap();
    let narration = session.narrate(&SummaryNarrator, &report).await.unwrap();
    assert!(narration
        .text
        .starts_with("Turn 1: Thorin tries to search the crypt (rolled 16)."));
    assert_eq!(narration.suggested_actions, report.suggestions);
}

#[tokio::test]
async fn test_narrator_failure_leaves_state_untouched() {
    let mut session = party();
    let report = session.play_turn("Elara", "look for a way across", 12, None).unwrap();
    let before = serde_json::to_string(session.characters()).unwrap();

    let err = session.narrate(&OfflineNarrator, &report).await.unwrap_err();
    assert!(matches!(err, SessionError::Narrator(NarratorError::Unavailable(_))));
    assert_eq!(serde_json::to_string(session.characters()).unwrap(), before);
    assert_eq!(session.turn(), 1);
}
