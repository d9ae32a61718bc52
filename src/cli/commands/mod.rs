use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("modamint")
        .about("ModaMint storefront client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the storefront API")
                .default_value("http://localhost:8080/api/v1")
                .env("MODAMINT_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("auth-store")
                .long("auth-store")
                .help("Path of the credentials file")
                .default_value("authData.json")
                .env("MODAMINT_AUTH_STORE")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("MODAMINT_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Authenticate and persist the session")
                .arg(
                    Arg::new("username")
                        .help("Account username")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("MODAMINT_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("End the session and drop local credentials"))
        .subcommand(Command::new("whoami").about("Show the authenticated user's profile"))
        .subcommand(
            Command::new("introspect")
                .about("Ask the backend whether a token is still valid")
                .arg(
                    Arg::new("token")
                        .help("Token to check (defaults to the stored access token)"),
                ),
        )
        .subcommand(
            Command::new("products")
                .about("List, fetch or search products")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Fetch a single product")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("search")
                        .short('s')
                        .long("search")
                        .help("Search by keyword")
                        .conflicts_with("id"),
                ),
        )
        .subcommand(
            Command::new("orders")
                .about("Show order history")
                .arg(
                    Arg::new("customer")
                        .long("customer")
                        .help("List orders of a customer"),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Fetch a single order")
                        .value_parser(clap::value_parser!(u64))
                        .conflicts_with("customer"),
                ),
        )
        .subcommand(
            Command::new("session")
                .about("Keep the session alive, refreshing the token before it expires"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "modamint");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "ModaMint storefront client"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("MODAMINT_API_URL", None::<String>),
                ("MODAMINT_AUTH_STORE", None::<String>),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["modamint", "whoami"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::to_string),
                    Some("http://localhost:8080/api/v1".to_string())
                );
                assert_eq!(
                    matches.get_one::<PathBuf>("auth-store").cloned(),
                    Some(PathBuf::from("authData.json"))
                );
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("MODAMINT_API_URL", Some("https://shop.tld/api/v1")),
                ("MODAMINT_AUTH_STORE", Some("/tmp/auth.json")),
                ("MODAMINT_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["modamint", "whoami"]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::to_string),
                    Some("https://shop.tld/api/v1".to_string())
                );
                assert_eq!(
                    matches.get_one::<PathBuf>("auth-store").cloned(),
                    Some(PathBuf::from("/tmp/auth.json"))
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("MODAMINT_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(vec!["modamint", "whoami"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("MODAMINT_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["modamint".to_string(), "whoami".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_login_args() {
        temp_env::with_vars([("MODAMINT_PASSWORD", None::<String>)], || {
            let command = new();
            let matches = command.get_matches_from(vec![
                "modamint", "login", "ana", "--password", "secret",
            ]);
            let (name, sub) = matches.subcommand().unwrap();
            assert_eq!(name, "login");
            assert_eq!(
                sub.get_one::<String>("username").map(String::to_string),
                Some("ana".to_string())
            );
            assert_eq!(
                sub.get_one::<String>("password").map(String::to_string),
                Some("secret".to_string())
            );
        });
    }

    #[test]
    fn test_products_search_conflicts_with_id() {
        let command = new();
        let result = command.try_get_matches_from(vec![
            "modamint", "products", "--id", "3", "--search", "linen",
        ]);
        assert!(result.is_err());
    }
}
