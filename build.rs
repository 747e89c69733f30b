use std::fs;

const CONFIG_PATH: &str = "src/default_config.toml";

fn main() {
    println!("cargo:rerun-if-changed={CONFIG_PATH}");

    let content = fs::read_to_string(CONFIG_PATH).expect("Failed to read default_config.toml");
    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {e}"),
    };

    // The embedded config must spell out every section the binary relies on.
    for section in ["code", "batch"] {
        if !table.get(section).is_some_and(toml::Value::is_table) {
            panic!("default_config.toml is missing the [{section}] table");
        }
    }

    let code = &table["code"];
    for key in ["foreground", "background"] {
        let value = code.get(key).and_then(toml::Value::as_str).unwrap_or_default();
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            panic!("default_config.toml: code.{key} must be a #RRGGBB color, got '{value}'");
        }
    }
}
