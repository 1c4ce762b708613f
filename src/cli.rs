use configurate::{Configurable, ConfigError, DotenvSource, load_file, load_file_with_env};
use std::path::Path;

#[derive(Debug, Default, Configurable)]
struct AppConfig {
    /// Display name of the application
    #[config(env = "APP_NAME", default = "configurate")]
    app_name: String,

    /// How many times a failed request is retried
    #[config(env = "NUMBER_OF_RETRIES", default = 3)]
    number_of_retries: i32,

    /// Release identifier
    #[config(default = "1.0default")]
    version: String,

    /// Optional API token, only read from the document
    token: Option<String>,
}

fn main() {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(arg) => match arg.as_str() {
            "load" => match args.next() {
                Some(path) => load_config(&path),
                None => eprintln!("usage: util-cli load <path>"),
            },
            "fields" => show_fields(),
            "docs" => generate_docs(args.next().as_deref().unwrap_or("CONFIG.md")),
            "schema" => show_schema(),
            _ => println!(
                "unknown arg: {}. Available: load, fields, docs, schema",
                arg
            ),
        },
        None => {
            println!("Usage: util-cli [command]");
            println!("Commands:");
            println!("  load <path>  - Load a JSON file (plus ./.env if present) into the demo config");
            println!("  fields       - Show the demo config's field table");
            println!("  docs [path]  - Generate markdown documentation (default CONFIG.md)");
            println!("  schema       - Print the field table as JSON");
        }
    };
}

fn load_config(path: &str) {
    let mut config = AppConfig::default();

    let result = if Path::new(".env").exists() {
        DotenvSource::from_path(".env")
            .and_then(|source| load_file_with_env(path, &mut config, source))
    } else {
        load_file(path, &mut config)
    };

    match result {
        Ok(()) => {
            println!("Config loaded successfully!");
            println!("  app_name: {}", config.app_name);
            println!("  number_of_retries: {}", config.number_of_retries);
            println!("  version: {}", config.version);
            println!("  token: {}", if config.token.is_some() { "<set>" } else { "<unset>" });
        }
        Err(error) => report(&error),
    }
}

fn report(error: &ConfigError) {
    eprintln!("Failed to load config:");
    eprintln!("\t- {}", error);
}

fn show_fields() {
    println!("AppConfig fields:");
    for field in AppConfig::schema() {
        println!("  {}:", field.name);
        println!("    type: {} ({})", field.type_name, field.kind.label());
        println!("    key: {}", field.key);
        println!("    env: {}", field.env_var().unwrap_or("-"));
        println!("    default: {}", field.default_literal().unwrap_or("-"));
        println!("    required: {}", field.is_required());
    }
}

fn generate_docs(path: &str) {
    println!("Generating documentation for AppConfig...");
    match configurate::write_docs(AppConfig::schema(), path) {
        Ok(_) => println!("✓ Documentation written to {}", path),
        Err(e) => eprintln!("✗ Failed to write documentation: {}", e),
    }
}

#[cfg(feature = "serde")]
fn show_schema() {
    match serde_json::to_string_pretty(AppConfig::schema()) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("✗ Failed to serialize schema: {}", e),
    }
}

#[cfg(not(feature = "serde"))]
fn show_schema() {
    eprintln!("schema output requires the `serde` feature");
}
