use cars_core::config::DB_URL;
use cars_core::db::migrations::latest_version;
use cars_core::db::open_db;
use cars_core::{
    Car, CarRepository, DbError, DbResult, RepoError, Repository, SqliteCarRepository,
    SqliteConnectionProvider, StoreProperties,
};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

fn setup() -> (TempDir, SqliteCarRepository<SqliteConnectionProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let provider = SqliteConnectionProvider::from_properties(&properties_for(dir.path())).unwrap();
    let repo = SqliteCarRepository::try_new(provider).unwrap();
    (dir, repo)
}

fn properties_for(dir: &Path) -> StoreProperties {
    let url = dir.join("cars.db");
    [(DB_URL, url.to_str().unwrap())].into_iter().collect()
}

/// Opens connections without running migrations.
fn raw_provider(path: &Path) -> impl Fn() -> DbResult<Connection> + '_ {
    move || Ok(Connection::open(path)?)
}

fn seed_dacia_and_ford(repo: &impl CarRepository) {
    repo.add(&Car::new("Dacia", "Logan", 2015)).unwrap();
    repo.add(&Car::new("Ford", "Focus", 2018)).unwrap();
}

fn without_id(cars: Vec<Car>) -> HashSet<(String, String, i32)> {
    cars.into_iter()
        .map(|car| (car.manufacturer, car.model, car.year))
        .collect()
}

#[test]
fn add_assigns_distinct_ids_and_is_visible_in_find_all() {
    let (_dir, repo) = setup();

    let input = Car::new("Dacia", "Logan", 2015);
    let first = repo.add(&input).unwrap();
    let second = repo.add(&Car::new("Dacia", "Sandero", 2019)).unwrap();

    assert!(input.id.is_none(), "input value must not be mutated");
    assert!(first.is_persisted());
    assert!(second.is_persisted());
    assert_ne!(first.id, second.id);
    assert_eq!(first.manufacturer, "Dacia");
    assert_eq!(first.model, "Logan");
    assert_eq!(first.year, 2015);

    let all = repo.find_all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.contains(&first));
    assert!(all.contains(&second));
}

#[test]
fn add_ignores_caller_supplied_id() {
    let (_dir, repo) = setup();

    let stored = repo.add(&Car::with_id(4242, "Skoda", "Octavia", 2012)).unwrap();

    assert_ne!(stored.id, Some(4242));
    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![stored]);
}

#[test]
fn find_by_manufacturer_matches_exactly() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);
    repo.add(&Car::new("dacia", "Duster", 2020)).unwrap();
    repo.add(&Car::new("Dacia ", "Spring", 2021)).unwrap();

    let dacias = repo.find_by_manufacturer("Dacia").unwrap();
    assert_eq!(dacias.len(), 1);
    assert_eq!(dacias[0].model, "Logan");
    assert_eq!(dacias[0].year, 2015);
    assert!(dacias[0].is_persisted());

    assert!(repo.find_by_manufacturer("Tesla").unwrap().is_empty());
}

#[test]
fn find_by_manufacturer_is_subset_of_find_all() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);
    repo.add(&Car::new("Ford", "Fiesta", 2010)).unwrap();
    repo.add(&Car::new("Opel", "Astra", 2016)).unwrap();

    let expected: HashSet<Car> = repo
        .find_all()
        .unwrap()
        .into_iter()
        .filter(|car| car.manufacturer == "Ford")
        .collect();
    let actual: HashSet<Car> = repo.find_by_manufacturer("Ford").unwrap().into_iter().collect();

    assert_eq!(actual.len(), 2);
    assert_eq!(actual, expected);
}

#[test]
fn find_between_years_is_inclusive() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);
    repo.add(&Car::new("Opel", "Astra", 2016)).unwrap();
    repo.add(&Car::new("Opel", "Corsa", 2020)).unwrap();
    repo.add(&Car::new("Opel", "Mokka", 2021)).unwrap();

    let in_range = without_id(repo.find_between_years(2016, 2020).unwrap());
    let expected = HashSet::from([
        ("Ford".to_string(), "Focus".to_string(), 2018),
        ("Opel".to_string(), "Astra".to_string(), 2016),
        ("Opel".to_string(), "Corsa".to_string(), 2020),
    ]);
    assert_eq!(in_range, expected);

    let single_year = repo.find_between_years(2015, 2015).unwrap();
    assert_eq!(single_year.len(), 1);
    assert_eq!(single_year[0].model, "Logan");
}

#[test]
fn find_between_years_scenario_returns_only_ford_focus() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);

    let cars = repo.find_between_years(2016, 2020).unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0].manufacturer, "Ford");
    assert_eq!(cars[0].model, "Focus");
    assert_eq!(cars[0].year, 2018);
}

#[test]
fn find_between_years_with_reversed_bounds_is_empty() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);

    assert!(repo.find_between_years(2020, 2010).unwrap().is_empty());
}

#[test]
fn find_all_on_empty_store_is_empty_and_repeatable() {
    let (_dir, repo) = setup();
    assert!(repo.find_all().unwrap().is_empty());

    seed_dacia_and_ford(&repo);
    let first: HashSet<Car> = repo.find_all().unwrap().into_iter().collect();
    let second: HashSet<Car> = repo.find_all().unwrap().into_iter().collect();
    assert_eq!(first, second);
}

#[test]
fn update_existing_row_changes_only_that_row() {
    let (_dir, repo) = setup();
    let dacia = repo.add(&Car::new("Dacia", "Logan", 2015)).unwrap();
    let ford = repo.add(&Car::new("Ford", "Focus", 2018)).unwrap();
    let dacia_id = dacia.id.unwrap();

    let changed = repo
        .update(dacia_id, &Car::new("Renault", "Clio", 2017))
        .unwrap();
    assert_eq!(changed, 1);

    let all: HashSet<Car> = repo.find_all().unwrap().into_iter().collect();
    let expected = HashSet::from([Car::with_id(dacia_id, "Renault", "Clio", 2017), ford]);
    assert_eq!(all, expected);
}

#[test]
fn update_uses_id_argument_over_car_id() {
    let (_dir, repo) = setup();
    let dacia = repo.add(&Car::new("Dacia", "Logan", 2015)).unwrap();
    let ford = repo.add(&Car::new("Ford", "Focus", 2018)).unwrap();

    let replacement = Car {
        model: "Mondeo".to_string(),
        ..ford.clone()
    };
    repo.update(dacia.id.unwrap(), &replacement).unwrap();

    let fords = repo.find_by_manufacturer("Ford").unwrap();
    assert_eq!(fords.len(), 2);
    assert!(fords.contains(&ford));
    assert!(fords.contains(&Car::with_id(dacia.id.unwrap(), "Ford", "Mondeo", 2018)));
}

#[test]
fn update_missing_id_is_a_silent_no_op() {
    let (_dir, repo) = setup();
    seed_dacia_and_ford(&repo);
    let before: HashSet<Car> = repo.find_all().unwrap().into_iter().collect();

    let changed = repo.update(9_999, &Car::new("Ghost", "Car", 1999)).unwrap();
    assert_eq!(changed, 0);

    let after: HashSet<Car> = repo.find_all().unwrap().into_iter().collect();
    assert_eq!(before, after);
}

#[test]
fn store_failure_is_reported_not_masked_as_empty() {
    let repo = SqliteCarRepository::new(|| -> DbResult<Connection> {
        Err(DbError::Sqlite(rusqlite::Error::InvalidQuery))
    });

    assert!(matches!(repo.find_all(), Err(RepoError::Db(_))));
    assert!(matches!(repo.find_by_manufacturer("Dacia"), Err(RepoError::Db(_))));
    assert!(matches!(repo.find_between_years(2000, 2020), Err(RepoError::Db(_))));
    assert!(matches!(
        repo.add(&Car::new("Dacia", "Logan", 2015)),
        Err(RepoError::Db(_))
    ));
    assert!(matches!(
        repo.update(1, &Car::new("Dacia", "Logan", 2015)),
        Err(RepoError::Db(_))
    ));
}

#[test]
fn unmappable_row_is_reported_as_invalid_data() {
    let (dir, repo) = setup();
    repo.add(&Car::new("Dacia", "Logan", 2015)).unwrap();

    let conn = open_db(dir.path().join("cars.db")).unwrap();
    conn.execute(
        "INSERT INTO cars (manufacturer, model, year) VALUES ('Trabant', '601', 'unknown');",
        [],
    )
    .unwrap();

    let err = repo.find_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("cars.year")));
    assert_eq!(repo.find_by_manufacturer("Dacia").unwrap().len(), 1);
}

#[test]
fn closure_provider_sees_writes_from_other_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let repo = SqliteCarRepository::try_new(|| open_db(&path)).unwrap();

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO cars (manufacturer, model, year) VALUES ('Volvo', 'V70', 2004);",
        [],
    )
    .unwrap();

    let volvos = repo.find_by_manufacturer("Volvo").unwrap();
    assert_eq!(volvos.len(), 1);
    assert_eq!(volvos[0].year, 2004);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.db");

    let result = SqliteCarRepository::try_new(raw_provider(&path));
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_cars_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_table.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteCarRepository::try_new(raw_provider(&path));
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("cars"))));
}

#[test]
fn repository_rejects_legacy_misspelled_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch(&format!(
            "CREATE TABLE cars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                manufacter TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL
            );
            PRAGMA user_version = {};",
            latest_version()
        ))
        .unwrap();

    let result = SqliteCarRepository::try_new(raw_provider(&path));
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "cars",
            column: "manufacturer"
        })
    ));
}
