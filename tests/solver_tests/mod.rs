mod pipeline_test;
mod session_test;

use std::io::Write;

use tempfile::NamedTempFile;

pub const FIXTURES: &str = r#"{
    "sw_planet": [
        {"name": "Tatooine", "diameter": "10465", "rotation_period": "23", "orbital_period": "304", "population": "200000"},
        {"name": "Hoth", "diameter": "7200", "rotation_period": "23", "orbital_period": "549", "population": "unknown"}
    ],
    "sw_character": [
        {"name": "Luke Skywalker", "height": "172", "mass": "77", "homeworld": "Tatooine"},
        {"name": "Jabba Desilijic Tiure", "height": "175", "mass": "1,358", "homeworld": "Nal Hutta"}
    ],
    "pokemon": [
        {"name": "pikachu", "height": 4, "weight": 60, "base_experience": 112},
        {"name": "bulbasaur", "height": 7, "weight": 69, "base_experience": 64}
    ]
}"#;

pub fn fixture_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FIXTURES.as_bytes()).unwrap();
    file
}
