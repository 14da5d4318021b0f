use menagerie::config::Config;
use menagerie::db::{count_rows, insert_row, last_row, ConnectionString, Database};
use menagerie::demo::{self, RunSummary};
use menagerie::models::{sample_insert_statements, Species};
use tempfile::TempDir;

const SPECIES_LAST: &str = "id='2', NAME='Zebra', num_acres='1.20'";
const ANIMAL_LAST: &str = "id='5', species_id='2', name='Zoe', date_born='2005-11-12 03:44:00'";

fn temp_config() -> (Config, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(dir.path().join("TestDB"));
    (config, dir)
}

fn run(config: &Config) -> (RunSummary, String) {
    let mut out = Vec::new();
    let summary = demo::run(config, &mut out).unwrap();
    (summary, String::from_utf8(out).unwrap())
}

#[test]
fn test_first_run_report() {
    let (config, _dir) = temp_config();
    let (summary, report) = run(&config);

    let expected = format!(
        "There are 2 rows in the 'species' table\n\
         There are 5 rows in the 'animal' table\n\
         The last row in the 'species' table is: {{{}}}\n\
         The last row in the 'animal' table is: {{{}}}\n",
        SPECIES_LAST, ANIMAL_LAST
    );
    assert_eq!(report, expected);
    assert_eq!(
        summary,
        RunSummary {
            species_count: Some(2),
            animal_count: Some(5),
            skipped_rows: 0,
            species_last_row: SPECIES_LAST.to_string(),
            animal_last_row: ANIMAL_LAST.to_string(),
        }
    );
}

#[test]
fn test_second_run_skips_everything() {
    let (config, _dir) = temp_config();
    run(&config);
    let (summary, report) = run(&config);

    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "table species already exists");
    assert_eq!(lines[1], "table animal already exists");

    let statements = sample_insert_statements().unwrap();
    for (line, statement) in lines[2..9].iter().zip(&statements) {
        assert_eq!(
            *line,
            format!(
                "The query '{}' was not executed because of duplicate key value.",
                statement
            )
        );
    }

    assert_eq!(summary.skipped_rows, 7);
    assert_eq!(summary.species_count, Some(2));
    assert_eq!(summary.animal_count, Some(5));
    assert_eq!(summary.species_last_row, SPECIES_LAST);
    assert_eq!(summary.animal_last_row, ANIMAL_LAST);
}

#[test]
fn test_rejected_rows_leave_counts_unchanged() {
    let (config, _dir) = temp_config();
    run(&config);

    let db = Database::open(&config.connection_string()).unwrap();
    db.with_conn(|conn| {
        for statement in [
            "INSERT INTO species VALUES (3, 'Okapi', 'plenty')",
            "INSERT INTO species VALUES (3, 'Okapi')",
            "INSERT INTO species VALUES (3, 'Okapi', 2.255)",
            "INSERT INTO species VALUES (3, 42, 2.25)",
            "INSERT INTO animal VALUES (6, '2', 'Zara', '2006-01-01 00:00:00')",
            "INSERT INTO animal VALUES (6, 2, 'Zara', '2006-01-01')",
            "INSERT INTO animal VALUES (1, 1, 'Elsa', '2001-05-06 02:15:00')",
        ] {
            assert!(!insert_row(conn, statement)?.is_inserted());
        }
        assert_eq!(count_rows(conn, "species")?, 2);
        assert_eq!(count_rows(conn, "animal")?, 5);

        assert!(Species::new(3, "Okapi", 2.25).insert(conn)?.is_inserted());
        Ok(())
    })
    .unwrap();
    db.close().unwrap();

    assert_eq!(
        last_row(&ConnectionString::open(&config.database_path), "species").unwrap(),
        "id='3', NAME='Okapi', num_acres='2.25'"
    );
}

#[test]
fn test_read_phase_needs_a_database() {
    let (config, _dir) = temp_config();
    let result = last_row(&config.read_connection_string(), "species");
    assert!(result.is_err());
    assert!(!config.database_path.exists());
}
