//! The fixed rows the demo inserts on every run

use super::{Animal, Species};

pub fn sample_species() -> Vec<Species> {
    vec![
        Species::new(1, "African Elephant", 7.5),
        Species::new(2, "Zebra", 1.2),
    ]
}

const ANIMALS: [(i64, i64, &str, &str); 5] = [
    (1, 1, "Elsa", "2001-05-06 02:15:00"),
    (2, 2, "Zelda", "2002-08-15 09:12:00"),
    (3, 1, "Ester", "2002-09-09 10:36:00"),
    (4, 1, "Eddie", "2010-06-08 01:24:00"),
    (5, 2, "Zoe", "2005-11-12 03:44:00"),
];

pub fn sample_animals() -> Result<Vec<Animal>, chrono::ParseError> {
    ANIMALS
        .iter()
        .map(|&(id, species_id, name, born)| Animal::parse(id, species_id, name, born))
        .collect()
}

/// Literal insert statements for every sample row, species first
pub fn sample_insert_statements() -> Result<Vec<String>, chrono::ParseError> {
    let animals = sample_animals()?;
    Ok(sample_species()
        .iter()
        .map(Species::insert_sql)
        .chain(animals.iter().map(Animal::insert_sql))
        .collect())
}
