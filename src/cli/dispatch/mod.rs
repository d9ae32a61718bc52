use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (subcommand, sub_matches) = matches
        .subcommand()
        .context("missing subcommand")?;

    let action = match subcommand {
        "login" => Action::Login {
            username: sub_matches
                .get_one::<String>("username")
                .map(String::to_string)
                .context("missing required argument: username")?,
            password: sub_matches
                .get_one::<String>("password")
                .map(|password| SecretString::from(password.to_string()))
                .context("missing required argument: --password")?,
        },
        "logout" => Action::Logout,
        "whoami" => Action::Whoami,
        "introspect" => Action::Introspect {
            token: sub_matches
                .get_one::<String>("token")
                .map(|token| SecretString::from(token.to_string())),
        },
        "products" => Action::Products {
            id: sub_matches.get_one::<u64>("id").copied(),
            search: sub_matches
                .get_one::<String>("search")
                .map(String::to_string),
        },
        "orders" => Action::Orders {
            id: sub_matches.get_one::<u64>("id").copied(),
            customer: sub_matches
                .get_one::<String>("customer")
                .map(String::to_string),
        },
        "session" => Action::Session,
        command => return Err(anyhow::anyhow!("unknown subcommand: {command}")),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_dispatch_login() {
        let matches = commands::new().get_matches_from(vec![
            "modamint", "login", "ana", "--password", "pw",
        ]);
        let action = handler(&matches).unwrap();
        match action {
            Action::Login { username, password } => {
                assert_eq!(username, "ana");
                assert_eq!(password.expose_secret(), "pw");
            }
            action => panic!("unexpected action: {action:?}"),
        }
    }

    #[test]
    fn test_dispatch_orders() {
        let matches = commands::new().get_matches_from(vec![
            "modamint", "orders", "--customer", "c-1",
        ]);
        let action = handler(&matches).unwrap();
        match action {
            Action::Orders { id, customer } => {
                assert_eq!(id, None);
                assert_eq!(customer.as_deref(), Some("c-1"));
            }
            action => panic!("unexpected action: {action:?}"),
        }
    }

    #[test]
    fn test_dispatch_session() {
        let matches = commands::new().get_matches_from(vec!["modamint", "session"]);
        let action = handler(&matches).unwrap();
        assert!(matches!(action, Action::Session));
    }
}
