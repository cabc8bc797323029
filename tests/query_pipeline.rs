//! Query Pipeline Integration Tests
//!
//! Tests for filter composition, sorting, limits and their algebraic
//! properties over a realistic merged view.

use std::collections::BTreeSet;

use backlog::core::{query, FilterSpec, LibraryView, PlaytimeRange, Query, SortKey};
use backlog::domain::{GameEntry, GameId, ManualStatus, Source, Status};
use backlog::library::StoreState;
use backlog::LibraryError;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn library() -> LibraryView {
    let now = as_of();
    let mut state = StoreState::new();

    let catalog = [
        GameEntry::catalog(10, "Portal 2"),
        GameEntry::catalog(20, "Celeste")
            .with_playtime(600)
            .with_last_played(now - Duration::days(3)),
        GameEntry::catalog(30, "Hollow Knight")
            .with_playtime(2400)
            .with_last_played(now - Duration::days(60)),
        GameEntry::catalog(40, "Dark Souls")
            .with_playtime(90)
            .with_last_played(now - Duration::days(400)),
        GameEntry::catalog(50, "Celeste Classic").with_playtime(90),
        GameEntry::catalog(60, "Elden Ring")
            .with_playtime(6000)
            .with_last_played(now - Duration::days(1)),
    ];
    for game in catalog {
        state.games.insert(game.id, game);
    }

    state.manual.push(
        GameEntry::manual(GameId::Local(1), "Hades", "Switch")
            .with_playtime(120)
            .with_last_played(now - Duration::days(10)),
    );
    state
        .manual
        .push(GameEntry::manual(GameId::Local(2), "Outer Wilds", "PS5"));

    state
        .tags
        .insert(GameId::App(30), BTreeSet::from(["metroidvania".to_string(), "indie".to_string()]));
    state
        .tags
        .insert(GameId::App(20), BTreeSet::from(["indie".to_string()]));
    state
        .tags
        .insert(GameId::Local(1), BTreeSet::from(["indie".to_string(), "roguelike".to_string()]));
    // Orphaned entries must never surface
    state
        .tags
        .insert(GameId::App(999), BTreeSet::from(["indie".to_string()]));
    state.statuses.insert(GameId::App(999), ManualStatus::Completed);

    state.statuses.insert(GameId::App(60), ManualStatus::Hold);

    LibraryView::build(&state, now)
}

fn ids(entries: &[backlog::LibraryEntry]) -> Vec<GameId> {
    entries.iter().map(|e| e.id()).collect()
}

#[test]
fn test_view_classifies_every_entry() {
    let view = library();
    let status = |id: GameId| view.get(&id).unwrap().status();

    assert_eq!(status(GameId::App(10)), Status::Backlog);
    assert_eq!(status(GameId::App(20)), Status::Playing);
    assert_eq!(status(GameId::App(30)), Status::Inactive);
    assert_eq!(status(GameId::App(40)), Status::Dropped);
    assert_eq!(status(GameId::App(50)), Status::Dropped);
    assert_eq!(status(GameId::App(60)), Status::Hold);
    assert_eq!(status(GameId::Local(1)), Status::Playing);
    assert_eq!(status(GameId::Local(2)), Status::Backlog);
}

#[test]
fn test_orphans_never_appear() {
    let view = library();
    let results = Query::new(FilterSpec::new().tag("indie")).run(&view).unwrap();
    assert_eq!(ids(&results), vec![GameId::App(20), GameId::App(30), GameId::Local(1)]);

    let results = Query::new(FilterSpec::new().status(Status::Completed))
        .run(&view)
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_playtime_presets() {
    let view = library();
    let run = |range: PlaytimeRange| {
        ids(&Query::new(FilterSpec::new().playtime(range))
            .sorted_by(SortKey::Name)
            .run(&view)
            .unwrap())
    };

    assert_eq!(run(PlaytimeRange::not_played()), vec![GameId::Local(2), GameId::App(10)]);
    assert_eq!(
        run(PlaytimeRange::started()),
        vec![GameId::App(50), GameId::App(40), GameId::Local(1)]
    );
    assert_eq!(run(PlaytimeRange::over(50.0).unwrap()), vec![GameId::App(60)]);
    assert_eq!(
        run(PlaytimeRange::between(2.0, 10.0).unwrap()),
        vec![GameId::App(20), GameId::Local(1)]
    );
    assert_eq!(
        run(PlaytimeRange::under(1.5).unwrap()),
        vec![GameId::Local(2), GameId::App(10)]
    );
}

#[test]
fn test_filters_compose_with_and() {
    let view = library();
    let filters = FilterSpec::new()
        .tag("indie")
        .recent()
        .source(Source::Catalog);

    let results = Query::new(filters).run(&view).unwrap();
    assert_eq!(ids(&results), vec![GameId::App(20)]);
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let view = library();
    let results = Query::new(FilterSpec::new().search("CELESTE"))
        .sorted_by(SortKey::Name)
        .run(&view)
        .unwrap();
    assert_eq!(ids(&results), vec![GameId::App(20), GameId::App(50)]);
}

#[test]
fn test_filters_are_idempotent() {
    let view = library();
    let filters = FilterSpec::new().playtime(PlaytimeRange::started());

    let first = query(&view.entries, &filters, None, None, view.as_of).unwrap();
    let second = query(&view.entries, &filters, None, None, view.as_of).unwrap();
    assert_eq!(first, second);

    let refiltered = query(&first, &filters, None, None, view.as_of).unwrap();
    assert_eq!(refiltered, first);
}

#[test]
fn test_limit_absorption() {
    let view = library();
    let filters = FilterSpec::new();

    for limit in 1..=10 {
        let once = query(&view.entries, &filters, Some(SortKey::Playtime), Some(limit), view.as_of)
            .unwrap();
        let twice = query(&once, &filters, Some(SortKey::Playtime), Some(limit), view.as_of).unwrap();
        assert_eq!(once, twice, "limit {}", limit);
        assert_eq!(once.len(), (limit as usize).min(view.len()));
    }
}

#[test]
fn test_sort_is_stable_across_calls() {
    let view = library();
    for key in [SortKey::Name, SortKey::Playtime, SortKey::PlaytimeAsc, SortKey::Recent] {
        let a = query(&view.entries, &FilterSpec::new(), Some(key), None, view.as_of).unwrap();
        let b = query(&view.entries, &FilterSpec::new(), Some(key), None, view.as_of).unwrap();
        assert_eq!(ids(&a), ids(&b), "sort {}", key);
    }
}

#[test]
fn test_playtime_ties_break_by_name() {
    let view = library();
    let results = query(
        &view.entries,
        &FilterSpec::new().playtime(PlaytimeRange::between(1.5, 1.5).unwrap()),
        Some(SortKey::Playtime),
        None,
        view.as_of,
    )
    .unwrap();
    assert_eq!(ids(&results), vec![GameId::App(50), GameId::App(40)]);
}

#[test]
fn test_recent_sort_puts_untimed_entries_last() {
    let view = library();
    let results = query(&view.entries, &FilterSpec::new(), Some(SortKey::Recent), None, view.as_of)
        .unwrap();
    let order = ids(&results);

    assert_eq!(&order[..2], &[GameId::App(60), GameId::App(20)]);
    let untimed: Vec<GameId> = order[order.len() - 3..].to_vec();
    assert_eq!(untimed, vec![GameId::App(50), GameId::Local(2), GameId::App(10)]);
}

#[test]
fn test_input_is_not_mutated() {
    let view = library();
    let before = view.entries.clone();
    query(&view.entries, &FilterSpec::new(), Some(SortKey::Playtime), Some(2), view.as_of).unwrap();
    assert_eq!(view.entries, before);
}

#[test]
fn test_invalid_queries() {
    let view = library();

    assert!(matches!(
        Query::new(FilterSpec::new()).limited_to(0).run(&view),
        Err(LibraryError::InvalidQuery(_))
    ));
    assert!(matches!(
        Query::new(FilterSpec::new()).limited_to(-1).run(&view),
        Err(LibraryError::InvalidQuery(_))
    ));
    assert!(matches!(
        PlaytimeRange::between(10.0, 2.0),
        Err(LibraryError::InvalidQuery(_))
    ));
}
