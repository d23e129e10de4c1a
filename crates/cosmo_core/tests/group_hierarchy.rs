use cosmo_core::db::open_db_in_memory;
use cosmo_core::{
    GalaxyDeleteSummary, Group, GroupKind, ModelValidationError, Planet, SqliteStore, StoreError,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn ids(groups: &[Group]) -> Vec<String> {
    groups.iter().map(|group| group.id.clone()).collect()
}

#[test]
fn store_starts_not_ready_and_loads_on_demand() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();
    assert!(!store.is_ready());

    store.load_all().unwrap();
    assert!(store.is_ready());
    assert!(store.groups().is_empty());
    assert!(store.planets().is_empty());
}

#[test]
fn bootstrap_seeds_demo_hierarchy() {
    let conn = setup();
    let store = SqliteStore::bootstrap(&conn).unwrap();

    assert!(store.is_ready());
    let names: Vec<&str> = store.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Diseño", "Trabajo", "Universidad Panamá"]);
    assert_eq!(store.galaxies().count(), 2);

    let university = store
        .groups()
        .iter()
        .find(|g| g.name == "Universidad Panamá")
        .unwrap();
    let systems: Vec<&Group> = store.systems_of(&university.id).collect();
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].name, "Diseño");

    assert_eq!(store.planets().len(), 1);
    assert_eq!(store.planets()[0].group_ids.len(), 2);
}

#[test]
fn groups_are_cached_in_name_order() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    store.create_group(&Group::galaxy("Zeta")).unwrap();
    store.create_group(&Group::galaxy("Alpha")).unwrap();
    store.create_group(&Group::galaxy("Mid")).unwrap();

    let names: Vec<&str> = store.groups().iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    assert!(store.is_ready());
}

#[test]
fn create_system_requires_existing_galaxy_parent() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    let orphan = Group::system("Orphan", "missing-galaxy");
    let err = store.create_group(&orphan).unwrap_err();
    assert!(matches!(err, StoreError::ParentNotFound(ref id) if id == "missing-galaxy"));

    let galaxy = Group::galaxy("Work");
    store.create_group(&galaxy).unwrap();
    let system = Group::system("Team", galaxy.id.clone());
    store.create_group(&system).unwrap();

    let third_level = Group::system("Too deep", system.id.clone());
    let err = store.create_group(&third_level).unwrap_err();
    assert!(matches!(err, StoreError::ParentMustBeGalaxy(ref id) if *id == system.id));

    assert_eq!(store.groups().len(), 2);
}

#[test]
fn create_group_rejects_blank_name() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    let err = store.create_group(&Group::galaxy("  ")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ModelValidationError::EmptyGroupName)
    ));
    assert!(store.groups().is_empty());
}

#[test]
fn rename_trims_and_ignores_unknown_ids() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();
    let galaxy = Group::galaxy("Work");
    store.create_group(&galaxy).unwrap();

    store.rename_group(&galaxy.id, "  Office  ").unwrap();
    let renamed = store.group(&galaxy.id).unwrap();
    assert_eq!(renamed.name, "Office");
    assert!(renamed.updated_at >= galaxy.updated_at);

    store.rename_group("no-such-group", "Ghost").unwrap();
    assert_eq!(store.groups().len(), 1);

    let err = store.rename_group(&galaxy.id, "   ").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.group(&galaxy.id).unwrap().name, "Office");
}

#[test]
fn update_style_sets_and_clears_independently() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();
    let galaxy = Group::galaxy("Work");
    store.create_group(&galaxy).unwrap();

    store
        .update_group_style(&galaxy.id, Some("#60A5FA"), Some("🛰️"))
        .unwrap();
    let styled = store.group(&galaxy.id).unwrap();
    assert_eq!(styled.color.as_deref(), Some("#60A5FA"));
    assert_eq!(styled.icon.as_deref(), Some("🛰️"));

    store
        .update_group_style(&galaxy.id, None, Some("📚"))
        .unwrap();
    let restyled = store.group(&galaxy.id).unwrap();
    assert_eq!(restyled.color, None);
    assert_eq!(restyled.icon.as_deref(), Some("📚"));

    store.update_group_style("missing", Some("#000"), None).unwrap();
}

#[test]
fn delete_galaxy_scenario_cascades_systems_and_keeps_planet() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    let work = Group::galaxy("Work");
    store.create_group(&work).unwrap();
    let team = Group::system("Team", work.id.clone());
    store.create_group(&team).unwrap();
    let planet = Planet::new("Ada Lovelace");
    store
        .create_planet(&planet, &[work.id.clone(), team.id.clone()])
        .unwrap();

    let summary = store.galaxy_delete_summary(&work.id).unwrap();
    assert_eq!(summary, GalaxyDeleteSummary { systems: 1, links: 2 });

    store.delete_group(&work.id).unwrap();

    assert!(store.group(&work.id).is_none());
    assert!(store.group(&team.id).is_none());
    let kept = store.planet(&planet.id).expect("planet must survive group deletion");
    assert!(kept.group_ids.is_empty());
    assert!(store.groups_by_planet(&planet.id).unwrap().is_empty());
}

#[test]
fn delete_galaxy_leaves_other_galaxies_and_their_links() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    let work = Group::galaxy("Work");
    let family = Group::galaxy("Family");
    store.create_group(&work).unwrap();
    store.create_group(&family).unwrap();
    let cousins = Group::system("Cousins", family.id.clone());
    store.create_group(&cousins).unwrap();

    let planet = Planet::new("Grace");
    store
        .create_planet(
            &planet,
            &[work.id.clone(), family.id.clone(), cousins.id.clone()],
        )
        .unwrap();

    store.delete_group(&work.id).unwrap();

    assert_eq!(ids(store.groups()), vec![cousins.id.clone(), family.id.clone()]);
    let linked = store.groups_by_planet(&planet.id).unwrap();
    assert_eq!(ids(&linked), vec![family.id.clone(), cousins.id.clone()]);
}

#[test]
fn delete_system_only_removes_its_links() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();

    let galaxy = Group::galaxy("Work");
    store.create_group(&galaxy).unwrap();
    let system = Group::system("Team", galaxy.id.clone());
    store.create_group(&system).unwrap();
    let planet = Planet::new("Linus");
    store
        .create_planet(&planet, &[galaxy.id.clone(), system.id.clone()])
        .unwrap();

    store.delete_group(&system.id).unwrap();

    assert!(store.group(&galaxy.id).is_some());
    assert!(store.group(&system.id).is_none());
    assert_eq!(store.planet(&planet.id).unwrap().group_ids, vec![galaxy.id.clone()]);
}

#[test]
fn delete_unknown_group_is_noop() {
    let conn = setup();
    let mut store = SqliteStore::bootstrap(&conn).unwrap();
    let before = store.groups().to_vec();

    store.delete_group("does-not-exist").unwrap();

    assert_eq!(store.groups(), before.as_slice());
}

#[test]
fn every_system_keeps_a_galaxy_parent_after_mixed_operations() {
    let conn = setup();
    let mut store = SqliteStore::bootstrap(&conn).unwrap();

    let extra = Group::galaxy("Sports");
    store.create_group(&extra).unwrap();
    store
        .create_group(&Group::system("Climbing", extra.id.clone()))
        .unwrap();
    store
        .create_group(&Group::system("Running", extra.id.clone()))
        .unwrap();
    let trabajo = store
        .groups()
        .iter()
        .find(|g| g.name == "Trabajo")
        .unwrap()
        .id
        .clone();
    store.delete_group(&trabajo).unwrap();
    store.delete_group(&extra.id).unwrap();

    for group in store.groups() {
        if let GroupKind::System { parent_id } = &group.kind {
            let parent = store.group(parent_id).expect("system parent must exist");
            assert!(parent.is_galaxy());
        }
    }
    assert_eq!(store.groups().len(), 2);
}

#[test]
fn summary_for_galaxy_without_children_counts_direct_links_only() {
    let conn = setup();
    let mut store = SqliteStore::open(&conn).unwrap();
    let galaxy = Group::galaxy("Solo");
    store.create_group(&galaxy).unwrap();
    store
        .create_planet(&Planet::new("A"), &[galaxy.id.clone()])
        .unwrap();

    let summary = store.galaxy_delete_summary(&galaxy.id).unwrap();
    assert_eq!(summary, GalaxyDeleteSummary { systems: 0, links: 1 });

    let missing = store.galaxy_delete_summary("missing").unwrap();
    assert_eq!(missing, GalaxyDeleteSummary::default());
}

#[test]
fn system_row_without_parent_is_skipped_and_store_still_loads() {
    let conn = setup();
    conn.execute(
        "INSERT INTO groups (id, name, type, parentId, createdAt, updatedAt)
         VALUES ('stray', 'Stray', 'system', NULL, 1, 1);",
        [],
    )
    .unwrap();
    let mut store = SqliteStore::open(&conn).unwrap();
    let galaxy = Group::galaxy("Work");
    store.create_group(&galaxy).unwrap();

    assert!(store.is_ready());
    assert_eq!(ids(store.groups()), vec![galaxy.id.clone()]);
    assert!(store.group("stray").is_none());

    store.delete_group("stray").unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM groups WHERE id = 'stray';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(remaining, 0);
}
